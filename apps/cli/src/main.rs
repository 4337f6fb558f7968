//! # SCARA CLI
//!
//! Command-line interface for SCARA joint fleets on one serial line.
//!
//! 每个命令独立执行：读取配置 → 打开串口并检查关节 → 执行一次操作 → 关闭串口。
//! 关闭串口不会让电机断电，上电状态和运动目标保持到执行 `disable` 为止。
//!
//! ```bash
//! # 生成配置模板
//! scara-cli config init --port /dev/ttyUSB0
//!
//! # 上电、自检、运动
//! scara-cli enable --drive 80 --hold 30
//! scara-cli check-orientation --angle 10
//! scara-cli position --set 45,-30,12.5
//!
//! # 读取位置
//! scara-cli position
//!
//! # 断电
//! scara-cli disable
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod modes;
mod utils;

use commands::{
    CalibrateCommand, ConfigCommand, EnableCommand, HomeCommand, MotionCommand, StallGuardCommand,
    StopCommand, power,
};
use modes::oneshot::{ConnectionArgs, OneShotMode};

/// SCARA CLI - 关节命令行工具
#[derive(Parser, Debug)]
#[command(name = "scara-cli")]
#[command(about = "Command-line interface for SCARA serial joint fleets", long_about = None)]
#[command(version)]
struct Cli {
    /// Fleet 配置文件
    #[arg(short, long, default_value = "scara.toml", global = true)]
    config: PathBuf,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 检查全部关节是否在线
    Ping,

    /// 读取或设置关节位置
    Position {
        #[command(flatten)]
        args: MotionCommand,
    },

    /// 读取或设置关节速度
    Velocity {
        #[command(flatten)]
        args: MotionCommand,
    },

    /// 上电并开启闭环
    Enable {
        #[command(flatten)]
        args: EnableCommand,
    },

    /// 断电（停止、关闭闭环、保持电流归零、自由轮）
    Disable,

    /// 停止电机
    Stop {
        #[command(flatten)]
        args: StopCommand,
    },

    /// 方向自检（上电后、运动前执行）
    CheckOrientation {
        #[command(flatten)]
        args: CalibrateCommand,
    },

    /// 单关节回零
    Home {
        #[command(flatten)]
        args: HomeCommand,
    },

    /// 开启堵转保护
    StallGuard {
        #[command(flatten)]
        args: StallGuardCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    scara_sdk::init_logger!("scara_cli=info,warn");

    let Cli {
        config,
        connection,
        command,
    } = Cli::parse();
    let mode = || OneShotMode::load(&config, &connection);

    match command {
        Commands::Config(cmd) => cmd.execute(&config, &connection),
        Commands::Ping => mode()?.ping(),
        Commands::Position { args } => mode()?.run(|fleet| args.position(fleet)),
        Commands::Velocity { args } => mode()?.run(|fleet| args.velocity(fleet)),
        Commands::Enable { args } => mode()?.run(|fleet| args.execute(fleet)),
        Commands::Disable => mode()?.run(power::disable),
        Commands::Stop { args } => mode()?.run(|fleet| args.execute(fleet)),
        Commands::CheckOrientation { args } => mode()?.run(|fleet| args.execute(fleet)),
        Commands::Home { args } => mode()?.run(|fleet| args.execute(fleet)),
        Commands::StallGuard { args } => mode()?.run(|fleet| args.execute(fleet)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position_set() {
        let cli = Cli::try_parse_from(["scara-cli", "position", "--set", "-10,20.5,0"]).unwrap();
        match cli.command {
            Commands::Position { args } => assert_eq!(args.set, Some(vec![-10.0, 20.5, 0.0])),
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.config, PathBuf::from("scara.toml"));
    }

    #[test]
    fn test_parse_connection_overrides() {
        let cli = Cli::try_parse_from([
            "scara-cli",
            "--port",
            "/dev/ttyACM1",
            "--baud",
            "57600",
            "-c",
            "arm.toml",
            "ping",
        ])
        .unwrap();
        assert_eq!(cli.connection.port.as_deref(), Some("/dev/ttyACM1"));
        assert_eq!(cli.connection.baud, Some(57600));
        assert_eq!(cli.config, PathBuf::from("arm.toml"));
        assert!(matches!(cli.command, Commands::Ping));
    }

    #[test]
    fn test_parse_home() {
        let cli = Cli::try_parse_from([
            "scara-cli",
            "home",
            "z",
            "--direction",
            "cw",
            "--rpm",
            "30",
            "--sensitivity",
            "-5",
            "--current",
            "40",
        ])
        .unwrap();
        match cli.command {
            Commands::Home { args } => {
                assert_eq!(args.joint, "z");
                assert_eq!(args.rpm, 30);
                assert_eq!(args.sensitivity, -5);
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_direction() {
        assert!(Cli::try_parse_from(["scara-cli", "home", "z", "--direction", "up"]).is_err());
        assert!(Cli::try_parse_from(["scara-cli", "home", "z", "--direction", "ccw"]).is_ok());
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
