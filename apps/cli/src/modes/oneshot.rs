//! One-shot 模式
//!
//! 每个命令独立执行：
//! 1. 读取配置（命令行参数覆盖配置文件）
//! 2. 打开串口并检查全部关节
//! 3. 执行操作
//! 4. 释放关节并关闭串口（操作失败时同样执行）
//!
//! 关闭连接不会让电机断电：上电、运动、堵转保护等设置在命令结束后保持，
//! 断电需要显式执行 `disable`。

use anyhow::{Context, Result, bail};
use clap::Args;
use scara_sdk::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// 连接参数（覆盖配置文件）
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// 串口设备路径
    #[arg(short, long, global = true)]
    pub port: Option<String>,

    /// 波特率
    #[arg(short, long, global = true)]
    pub baud: Option<u32>,

    /// 普通交换超时（毫秒）
    #[arg(long, global = true)]
    pub exchange_timeout_ms: Option<u64>,
}

impl ConnectionArgs {
    /// 把命令行参数写入配置
    pub fn apply(&self, config: &mut FleetConfig) {
        if let Some(port) = &self.port {
            config.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        if let Some(timeout_ms) = self.exchange_timeout_ms {
            config.timeout_ms = timeout_ms;
        }
    }
}

/// One-shot 模式
pub struct OneShotMode {
    config: FleetConfig,
}

impl OneShotMode {
    /// 读取配置文件并应用命令行覆盖
    pub fn load(path: &Path, args: &ConnectionArgs) -> Result<Self> {
        let mut config = FleetConfig::load_from_file(path)
            .with_context(|| format!("Failed to load fleet config '{}'", path.display()))?;
        args.apply(&mut config);
        Self::new(config)
    }

    pub fn new(config: FleetConfig) -> Result<Self> {
        if config.joints.is_empty() {
            bail!("No joints configured");
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    fn connect(&self) -> Result<JointFleet<SerialPortTransport>> {
        println!(
            "🔌 连接 {} 个关节 ({} @ {} baud)...",
            self.config.joints.len(),
            self.config.port,
            self.config.baud()
        );
        let fleet = FleetBuilder::new()
            .config(&self.config)
            .connect()
            .context("Failed to connect to joints")?;
        Ok(fleet)
    }

    /// 连接检查
    pub fn ping(self) -> Result<()> {
        self.run(|fleet| {
            for joint in fleet.joints() {
                println!("  {} (0x{:02X}): OK", joint.name(), joint.address());
            }
            Ok(())
        })
    }

    /// 连接、执行 `op`、关闭
    pub fn run<F>(self, op: F) -> Result<()>
    where
        F: FnOnce(&mut JointFleet<SerialPortTransport>) -> Result<()>,
    {
        let fleet = self.connect()?;
        session(fleet, op)
    }
}

/// 在已初始化的 Fleet 上执行 `op`，然后关闭连接（不断电）
pub fn session<T, F>(mut fleet: JointFleet<T>, op: F) -> Result<()>
where
    T: Transport,
    F: FnOnce(&mut JointFleet<T>) -> Result<()>,
{
    let result = op(&mut fleet);
    if let Err(e) = &result {
        warn!("Command failed: {:#}", e);
    }
    fleet.close();
    info!("Session finished");
    result
}
