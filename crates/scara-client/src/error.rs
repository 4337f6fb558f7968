//! 客户端层错误类型定义

use scara_driver::DriverError;
use scara_serial::SerialError;
use thiserror::Error;

/// Fleet 错误类型
#[derive(Error, Debug)]
pub enum FleetError {
    /// 按关节给出的参数数量与关节数不一致（未发送任何字节）
    #[error("Expected {expected} values (one per joint), got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// 某个关节的操作失败
    #[error("Joint '{joint}' failed to {operation}: {source}")]
    Joint {
        joint: String,
        operation: &'static str,
        #[source]
        source: DriverError,
    },

    #[error("Unknown joint '{0}'")]
    UnknownJoint(String),

    /// 重复的关节名称或地址
    #[error("Duplicate joint: {0}")]
    DuplicateJoint(String),

    #[error("Fleet is not initialized")]
    NotInitialized,

    #[error("Fleet is already initialized")]
    AlreadyInitialized,

    /// 打开串口失败
    #[error("Failed to open transport: {0}")]
    Open(#[source] SerialError),

    /// 部分关节释放失败（其余关节和传输均已释放）
    #[error("{} joint(s) failed to shut down cleanly", .failures.len())]
    Deinit { failures: Vec<(String, DriverError)> },

    /// 配置文件读取或解析失败
    #[error("Config error: {0}")]
    Config(String),
}

impl FleetError {
    /// 是否为调用方输入错误（未产生任何 IO）
    pub fn is_validation(&self) -> bool {
        match self {
            FleetError::LengthMismatch { .. } => true,
            FleetError::Joint { source, .. } => source.is_validation(),
            _ => false,
        }
    }

    /// 失败的关节名称
    pub fn joint(&self) -> Option<&str> {
        match self {
            FleetError::Joint { joint, .. } => Some(joint),
            FleetError::UnknownJoint(joint) => Some(joint),
            _ => None,
        }
    }
}
