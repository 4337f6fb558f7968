//! 帧构建与校验
//!
//! 一次交换由帧头 `[address, register, length]` 和一个数据块
//! `[data.., checksum]` 组成。写交换由主机发送数据块，读交换由设备回送数据块。
//!
//! ```text
//! Header:        [ address:u8 | register:u8 | length:u8 ]
//! ACK1:          [ ACK ]                      (device → host)
//! Data block:    [ data:length bytes | checksum:u8 ]
//! ACK2 (write):  [ ACK ]                      (device → host)
//! ```

use crate::ProtocolError;
use crate::constants::{HEADER_LEN, MAX_PAYLOAD_LEN};
use crate::register::Register;
use crc_any::CRCu8;
use smallvec::SmallVec;

/// 数据块缓冲区
///
/// 栈上预留 16 字节，覆盖全部固件命令（最长负载 4 字节 + 校验和），
/// 超长负载自动退化为堆分配。
pub type DataBlock = SmallVec<[u8; 16]>;

/// 计算负载校验和
///
/// CRC-8（多项式 0x07，初值 0x00，不反射，无输出异或），
/// 对字节顺序敏感。编码与解码两侧使用同一实现。
pub fn checksum(payload: &[u8]) -> u8 {
    let mut crc = CRCu8::crc8();
    crc.digest(payload);
    crc.get_crc()
}

/// 帧头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// 设备地址
    pub address: u8,
    /// 命令码
    pub register: Register,
    /// 负载长度（读请求固定为 0）
    pub length: u8,
}

impl FrameHeader {
    /// 序列化为线上字节
    #[inline]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        [self.address, self.register.code(), self.length]
    }

    /// 从线上字节解析（设备端/测试使用）
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() != HEADER_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            address: bytes[0],
            register: Register::from_code(bytes[1])?,
            length: bytes[2],
        })
    }
}

/// 协议帧
///
/// 每次交换新建，不做持久化。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    header: FrameHeader,
    payload: DataBlock,
}

impl Frame {
    /// 构建写交换帧
    ///
    /// # Errors
    /// - `ProtocolError::PayloadTooLong`: 负载超过 255 字节
    pub fn write(address: u8, register: Register, payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(ProtocolError::PayloadTooLong {
                len: payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }
        Ok(Self {
            header: FrameHeader {
                address,
                register,
                length: payload.len() as u8,
            },
            payload: SmallVec::from_slice(payload),
        })
    }

    /// 构建读请求帧（不携带负载）
    pub fn read_request(address: u8, register: Register) -> Self {
        Self {
            header: FrameHeader {
                address,
                register,
                length: 0,
            },
            payload: DataBlock::new(),
        }
    }

    /// 帧头
    #[inline]
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// 负载
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// 负载校验和
    #[inline]
    pub fn checksum(&self) -> u8 {
        checksum(&self.payload)
    }

    /// 写交换的数据块：`payload ++ [checksum]`
    pub fn data_block(&self) -> DataBlock {
        encode_block(&self.payload)
    }
}

/// 为负载附加校验和
pub fn encode_block(payload: &[u8]) -> DataBlock {
    let mut block = DataBlock::with_capacity(payload.len() + 1);
    block.extend_from_slice(payload);
    block.push(checksum(payload));
    block
}

/// 校验收到的数据块并返回其中的负载
///
/// `block` 必须恰好是 `expected_len + 1` 字节（负载 + 末尾校验字节）。
///
/// # Errors
/// - `ProtocolError::InvalidLength`: 长度不符
/// - `ProtocolError::ChecksumMismatch`: 校验失败（负载不可用）
pub fn verify_block(block: &[u8], expected_len: usize) -> Result<&[u8], ProtocolError> {
    if block.len() != expected_len + 1 {
        return Err(ProtocolError::InvalidLength {
            expected: expected_len + 1,
            actual: block.len(),
        });
    }
    let (payload, trailer) = block.split_at(expected_len);
    let expected = checksum(payload);
    let actual = trailer[0];
    if expected != actual {
        return Err(ProtocolError::ChecksumMismatch { expected, actual });
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_check_value() {
        // CRC-8/SMBUS 标准校验值
        assert_eq!(checksum(b"123456789"), 0xF4);
        assert_eq!(checksum(&[]), 0x00);
    }

    #[test]
    fn test_checksum_order_sensitive() {
        assert_ne!(checksum(&[0x01, 0x02]), checksum(&[0x02, 0x01]));
        assert_ne!(checksum(&[0x00, 0xFF, 0x10]), checksum(&[0x10, 0xFF, 0x00]));
    }

    #[test]
    fn test_header_bytes() {
        let frame = Frame::write(0x21, Register::SetCurrent, &[50]).unwrap();
        assert_eq!(frame.header().to_bytes(), [0x21, 0x19, 1]);

        let read = Frame::read_request(0x21, Register::AngleMoved);
        assert_eq!(read.header().to_bytes(), [0x21, 0x18, 0]);
        assert!(read.payload().is_empty());
    }

    #[test]
    fn test_header_from_bytes() {
        let header = FrameHeader::from_bytes(&[0x05, 0x29, 1]).unwrap();
        assert_eq!(header.address, 0x05);
        assert_eq!(header.register, Register::Stop);
        assert_eq!(header.length, 1);

        assert!(matches!(
            FrameHeader::from_bytes(&[0x05, 0x29]),
            Err(ProtocolError::InvalidLength { expected: 3, actual: 2 })
        ));
        assert!(matches!(
            FrameHeader::from_bytes(&[0x05, 0x01, 0]),
            Err(ProtocolError::UnknownRegister { code: 0x01 })
        ));
    }

    #[test]
    fn test_data_block_appends_checksum() {
        let frame = Frame::write(1, Register::MoveToAngle, &[0x10, 0x27, 0, 0]).unwrap();
        let block = frame.data_block();
        assert_eq!(block.len(), 5);
        assert_eq!(&block[..4], &[0x10, 0x27, 0, 0]);
        assert_eq!(block[4], frame.checksum());
    }

    #[test]
    fn test_payload_too_long() {
        let payload = vec![0u8; 256];
        assert_eq!(
            Frame::write(1, Register::Setup, &payload),
            Err(ProtocolError::PayloadTooLong { len: 256, max: 255 })
        );
        assert!(Frame::write(1, Register::Setup, &payload[..255]).is_ok());
    }

    #[test]
    fn test_verify_block() {
        let block = encode_block(&[1, 2, 3, 4]);
        assert_eq!(verify_block(&block, 4).unwrap(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_verify_block_bad_checksum() {
        let mut block = encode_block(&[1, 2, 3, 4]);
        block[4] ^= 0xFF;
        assert!(matches!(
            verify_block(&block, 4),
            Err(ProtocolError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_verify_block_wrong_length() {
        let block = encode_block(&[1, 2, 3]);
        assert_eq!(
            verify_block(&block, 4),
            Err(ProtocolError::InvalidLength {
                expected: 5,
                actual: 4
            })
        );
    }
}
