//! # SCARA Protocol
//!
//! 步进关节串口协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `register`: 寄存器（命令码）枚举
//! - `constants`: 协议常量定义
//! - `frame`: 帧头、数据块与校验和
//! - `units`: 物理单位与定点整数之间的转换
//!
//! ## 字节序
//!
//! 协议中所有多字节整数均使用小端字节序（低位在前）。
//! 本模块提供了字节序转换工具函数。

pub mod constants;
pub mod frame;
pub mod register;
pub mod units;

// 重新导出常用类型
pub use constants::*;
pub use frame::{DataBlock, Frame, FrameHeader, checksum, encode_block, verify_block};
pub use register::Register;
pub use units::*;

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Invalid data block length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Unknown register code: 0x{code:02X}")]
    UnknownRegister { code: u8 },

    #[error("Payload too long: {len} bytes (max {max})")]
    PayloadTooLong { len: usize, max: usize },

    #[error("Checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("Value out of range for {field}: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// 字节序转换工具函数
///
/// 协议使用小端字节序，设备端直接拷贝原生 32 位表示。
///
/// 小端字节序转 i32
pub fn bytes_to_i32_le(bytes: [u8; 4]) -> i32 {
    i32::from_le_bytes(bytes)
}

/// i32 转小端字节序
pub fn i32_to_bytes_le(value: i32) -> [u8; 4] {
    value.to_le_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_to_i32_le() {
        let bytes = [0x78, 0x56, 0x34, 0x12];
        assert_eq!(bytes_to_i32_le(bytes), 0x12345678);
    }

    #[test]
    fn test_bytes_to_i32_le_negative() {
        assert_eq!(bytes_to_i32_le([0xFF, 0xFF, 0xFF, 0xFF]), -1);
        assert_eq!(bytes_to_i32_le([0x9C, 0xFF, 0xFF, 0xFF]), -100);
    }

    #[test]
    fn test_i32_to_bytes_le() {
        assert_eq!(i32_to_bytes_le(0x12345678), [0x78, 0x56, 0x34, 0x12]);
        assert_eq!(i32_to_bytes_le(-1), [0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::ChecksumMismatch {
            expected: 0xAB,
            actual: 0x01,
        };
        assert_eq!(err.to_string(), "Checksum mismatch: expected 0xAB, got 0x01");

        let err = ProtocolError::UnknownRegister { code: 0x7F };
        assert!(err.to_string().contains("0x7F"));
    }
}
