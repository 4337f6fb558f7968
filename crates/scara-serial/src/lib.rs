//! # SCARA Serial Transport Layer
//!
//! 串口传输抽象层，为帧编解码层提供统一的字节读写接口。
//!
//! - [`Transport`]: 带超时的字节级读写 + 缓冲区清空
//! - [`SerialPortTransport`]: 基于 `serialport` 的真实串口实现
//! - [`mock::MockTransport`]: 模拟总线（`mock` feature）

use std::time::Duration;
use thiserror::Error;

pub mod baud;
pub mod port;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use baud::BaudRate;
pub use port::SerialPortTransport;

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum SerialError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serial port error: {0}")]
    Port(#[from] serialport::Error),
    #[error("Read timeout")]
    Timeout,
    #[error("Short write: {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },
    #[error("Short read: {read} of {expected} bytes")]
    ShortRead { expected: usize, read: usize },
}

impl SerialError {
    /// 是否为等待超时（设备无应答）
    pub fn is_timeout(&self) -> bool {
        match self {
            SerialError::Timeout | SerialError::ShortRead { .. } => true,
            SerialError::Io(e) => e.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}

/// 字节级传输接口
///
/// 由已打开、已配置的串口句柄实现。关闭通过 `Drop` 完成，
/// 所有者保证只释放一次。
pub trait Transport {
    /// 写出全部字节，返回实际写出的字节数
    fn write(&mut self, data: &[u8]) -> Result<usize, SerialError>;

    /// 读取字节，直到 `buf` 填满或 `timeout` 耗尽
    ///
    /// 返回实际读到的字节数，0 表示超时内没有任何字节到达。
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, SerialError>;

    /// 丢弃输入/输出缓冲区中尚未处理的字节
    fn flush(&mut self) -> Result<(), SerialError>;

    /// 读满 `buf`，不足即视为超时
    fn read_exact_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<(), SerialError> {
        let n = self.read(buf, timeout)?;
        match n {
            0 => Err(SerialError::Timeout),
            n if n < buf.len() => Err(SerialError::ShortRead {
                expected: buf.len(),
                read: n,
            }),
            _ => Ok(()),
        }
    }

    /// 写出全部字节，不足即报错
    fn write_all(&mut self, data: &[u8]) -> Result<(), SerialError> {
        let written = self.write(data)?;
        if written != data.len() {
            return Err(SerialError::ShortWrite {
                expected: data.len(),
                written,
            });
        }
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<usize, SerialError> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, SerialError> {
        (**self).read(buf, timeout)
    }

    fn flush(&mut self) -> Result<(), SerialError> {
        (**self).flush()
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, data: &[u8]) -> Result<usize, SerialError> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, SerialError> {
        (**self).read(buf, timeout)
    }

    fn flush(&mut self) -> Result<(), SerialError> {
        (**self).flush()
    }
}
