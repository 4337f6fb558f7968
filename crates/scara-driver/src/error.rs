//! 驱动层错误类型定义

use scara_protocol::ProtocolError;
use scara_serial::SerialError;
use std::fmt;
use thiserror::Error;

/// 握手阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStage {
    /// 帧头确认（ACK1）
    Header,
    /// 数据块确认（ACK2，仅写交换）
    Payload,
}

impl fmt::Display for HandshakeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeStage::Header => write!(f, "header"),
            HandshakeStage::Payload => write!(f, "payload"),
        }
    }
}

/// 关节释放时的断电步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeinitStep {
    /// 硬停止
    Stop,
    /// 关闭闭环控制
    DisableClosedLoop,
    /// 保持电流归零
    ZeroHoldCurrent,
    /// 自由轮制动模式
    Freewheel,
}

impl DeinitStep {
    /// 执行顺序
    pub const ALL: [DeinitStep; 4] = [
        DeinitStep::Stop,
        DeinitStep::DisableClosedLoop,
        DeinitStep::ZeroHoldCurrent,
        DeinitStep::Freewheel,
    ];
}

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 串口读写失败或等待应答超时
    #[error("Transport error: {0}")]
    Transport(#[from] SerialError),

    /// 协议编码错误（如数值超出定点范围）
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 设备拒绝了帧头或数据块
    #[error("Device rejected {stage} (received 0x{received:02X})")]
    Nack {
        stage: HandshakeStage,
        received: u8,
    },

    /// 回复数据校验失败，数据已丢弃
    #[error("Checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    Checksum { expected: u8, actual: u8 },

    /// PING 检查失败
    #[error("Joint '{joint}' failed connection check{}", .reply.map(|r| format!(" (reply 0x{r:02X})")).unwrap_or_default())]
    Connection {
        joint: String,
        reply: Option<u8>,
        #[source]
        source: Option<Box<DriverError>>,
    },

    /// 关节尚未完成初始化
    #[error("Joint '{joint}' is not initialized")]
    NotInitialized { joint: String },

    /// 无效输入（在发送任何字节之前检出）
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 断电流程部分失败
    #[error("Joint '{joint}': {} of 4 shutdown steps failed", .failures.len())]
    Deinit {
        joint: String,
        failures: Vec<(DeinitStep, DriverError)>,
    },
}

impl DriverError {
    /// 是否为调用方输入错误（未产生任何 IO）
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DriverError::InvalidInput(_) | DriverError::Protocol(ProtocolError::OutOfRange { .. })
        )
    }

    /// 是否为传输层超时
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Transport(e) if e.is_timeout())
    }
}
