//! 配置管理命令

use crate::modes::oneshot::ConnectionArgs;
use anyhow::{Context, Result, bail};
use clap::Subcommand;
use scara_sdk::{FleetConfig, JointSpec};
use std::path::Path;

/// 默认串口
const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// 配置管理命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 生成配置模板
    Init {
        /// 覆盖已有文件
        #[arg(long)]
        force: bool,

        /// 模板中的关节数
        #[arg(long, default_value_t = 3)]
        joints: u8,
    },

    /// 显示生效的配置（已应用命令行覆盖）
    Show,
}

impl ConfigCommand {
    pub fn execute(&self, path: &Path, connection: &ConnectionArgs) -> Result<()> {
        match self {
            ConfigCommand::Init { force, joints } => {
                if path.exists() && !force {
                    bail!("'{}' already exists (use --force to overwrite)", path.display());
                }
                let config = template(*joints, connection);
                config.save_to_file(path)?;
                println!("✅ 已写入 {}", path.display());
                Ok(())
            },
            ConfigCommand::Show => {
                let mut config = FleetConfig::load_from_file(path)?;
                connection.apply(&mut config);
                let text = toml::to_string_pretty(&config).context("Failed to render config")?;
                println!("{}", text);
                Ok(())
            },
        }
    }
}

/// 地址从 1 开始、减速比为 1 的配置模板
fn template(joints: u8, connection: &ConnectionArgs) -> FleetConfig {
    let mut config = FleetConfig::new(DEFAULT_PORT);
    connection.apply(&mut config);
    config.joints = (1..=joints)
        .map(|address| JointSpec::new(address, format!("joint{}", address)))
        .collect();
    config
}
