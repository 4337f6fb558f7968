//! 寄存器（命令码）定义
//!
//! 寄存器集合由关节控制器固件约定，运行时不会扩展。
//! 未知字节在构造阶段即被拒绝，不会被原样发送到总线上。

use crate::ProtocolError;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// 协议命令码
///
/// 每个值占一个字节，作为帧头第二个字节发送。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Register {
    /// 连通性检测，设备回复 `PING_REPLY`
    Ping = 0x0F,
    Setup = 0x10,
    SetRpm = 0x11,
    GetDriverRpm = 0x12,
    MoveSteps = 0x13,
    MoveAngle = 0x14,
    MoveToAngle = 0x15,
    GetMotorState = 0x16,
    RunContinuous = 0x17,
    /// 编码器累计转角（定点，1/100 度）
    AngleMoved = 0x18,
    SetCurrent = 0x19,
    SetHoldCurrent = 0x1A,
    SetMaxAcceleration = 0x1B,
    SetMaxDeceleration = 0x1C,
    SetMaxVelocity = 0x1D,
    EnableStallGuard = 0x1E,
    DisableStallGuard = 0x1F,
    ClearStall = 0x20,
    IsStalled = 0x21,
    SetBrakeMode = 0x22,
    EnablePid = 0x23,
    DisablePid = 0x24,
    EnableClosedLoop = 0x25,
    DisableClosedLoop = 0x26,
    SetControlThreshold = 0x27,
    MoveToEnd = 0x28,
    Stop = 0x29,
    GetPidError = 0x2A,
    /// 方向自检，设备在物理确认前阻塞应答
    CheckOrientation = 0x2B,
    GetEncoderRpm = 0x2C,
    Home = 0x2D,
}

impl Register {
    /// 命令码字节
    #[inline]
    pub fn code(self) -> u8 {
        self.into()
    }

    /// 从字节解析命令码
    pub fn from_code(code: u8) -> Result<Self, ProtocolError> {
        Self::try_from(code).map_err(|_| ProtocolError::UnknownRegister { code })
    }

    /// 读寄存器的回复负载长度；写寄存器返回 `None`
    pub const fn response_len(self) -> Option<usize> {
        match self {
            Register::Ping | Register::IsStalled | Register::GetMotorState => Some(1),
            Register::AngleMoved
            | Register::GetEncoderRpm
            | Register::GetDriverRpm
            | Register::GetPidError => Some(4),
            _ => None,
        }
    }

    /// 是否为读寄存器
    #[inline]
    pub const fn is_read(self) -> bool {
        self.response_len().is_some()
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}(0x{:02X})", self, self.code())
    }
}
