//! 握手交换
//!
//! 主机发起每次交换，设备在数据移动前逐步确认：
//!
//! ```text
//! write: flush → header → ACK1 → data block → ACK2
//! read:  flush → header(len=0) → ACK1 → data block
//! ```
//!
//! 先确认帧头再传输数据，主机可以在提交数据前发现地址错误或无响应的设备。
//! 协议没有重传：任何一步失败都会结束本次调用。

use crate::error::{DriverError, HandshakeStage};
use scara_protocol::{ACK, DataBlock, Frame, MAX_PAYLOAD_LEN, ProtocolError, Register, verify_block};
use scara_serial::Transport;
use smallvec::smallvec;
use std::time::Duration;
use tracing::{debug, trace};

/// 写交换：发送 `payload` 到设备的 `register`
///
/// # 错误
/// - `DriverError::Transport`: 读写失败或等待 ACK 超时
/// - `DriverError::Nack`: 设备拒绝帧头或数据块（拒绝帧头时不会发送数据块）
/// - `DriverError::Protocol`: 负载超过 255 字节（未发送任何字节）
pub fn write_exchange<T: Transport + ?Sized>(
    transport: &mut T,
    address: u8,
    register: Register,
    payload: &[u8],
    timeout: Duration,
) -> Result<(), DriverError> {
    let frame = Frame::write(address, register, payload)?;

    transport.flush()?;
    trace!("[0x{:02X}] write {} {:02X?}", address, register, payload);

    transport.write_all(&frame.header().to_bytes())?;
    await_ack(transport, HandshakeStage::Header, timeout)
        .inspect_err(|e| debug!("[0x{:02X}] {} header: {}", address, register, e))?;

    transport.write_all(&frame.data_block())?;
    await_ack(transport, HandshakeStage::Payload, timeout)
        .inspect_err(|e| debug!("[0x{:02X}] {} payload: {}", address, register, e))?;

    Ok(())
}

/// 读交换：从设备的 `register` 读取 `expected_len` 字节
///
/// 只有校验通过的负载才会返回给调用方。
///
/// # 错误
/// - `DriverError::Transport`: 读写失败、超时或回复不足 `expected_len + 1` 字节
/// - `DriverError::Nack`: 设备拒绝帧头
/// - `DriverError::Checksum`: 回复校验失败
/// - `DriverError::Protocol`: `expected_len` 超过 255 字节（未发送任何字节）
pub fn read_exchange<T: Transport + ?Sized>(
    transport: &mut T,
    address: u8,
    register: Register,
    expected_len: usize,
    timeout: Duration,
) -> Result<DataBlock, DriverError> {
    if expected_len > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLong {
            len: expected_len,
            max: MAX_PAYLOAD_LEN,
        }
        .into());
    }
    let frame = Frame::read_request(address, register);

    transport.flush()?;
    trace!("[0x{:02X}] read {} ({} bytes)", address, register, expected_len);

    transport.write_all(&frame.header().to_bytes())?;
    await_ack(transport, HandshakeStage::Header, timeout)
        .inspect_err(|e| debug!("[0x{:02X}] {} header: {}", address, register, e))?;

    let mut block: DataBlock = smallvec![0u8; expected_len + 1];
    transport
        .read_exact_timeout(&mut block, timeout)
        .inspect_err(|e| debug!("[0x{:02X}] {} reply: {}", address, register, e))?;

    match verify_block(&block, expected_len) {
        Ok(payload) => {
            trace!("[0x{:02X}] {} -> {:02X?}", address, register, payload);
            Ok(DataBlock::from_slice(payload))
        },
        Err(ProtocolError::ChecksumMismatch { expected, actual }) => {
            debug!(
                "[0x{:02X}] {} checksum mismatch: expected 0x{:02X}, got 0x{:02X}",
                address, register, expected, actual
            );
            Err(DriverError::Checksum { expected, actual })
        },
        Err(e) => Err(e.into()),
    }
}

/// 读交换，结果写入定长数组
pub fn read_array<const N: usize, T: Transport + ?Sized>(
    transport: &mut T,
    address: u8,
    register: Register,
    timeout: Duration,
) -> Result<[u8; N], DriverError> {
    let block = read_exchange(transport, address, register, N, timeout)?;
    let mut out = [0u8; N];
    out.copy_from_slice(&block);
    Ok(out)
}

/// 等待一个确认字节
fn await_ack<T: Transport + ?Sized>(
    transport: &mut T,
    stage: HandshakeStage,
    timeout: Duration,
) -> Result<(), DriverError> {
    let mut ack = [0u8; 1];
    transport.read_exact_timeout(&mut ack, timeout)?;
    if ack[0] != ACK {
        return Err(DriverError::Nack {
            stage,
            received: ack[0],
        });
    }
    Ok(())
}
