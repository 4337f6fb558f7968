//! 基于 `serialport` 的串口实现

use crate::{BaudRate, SerialError, Transport};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// 打开后的默认读超时（每次读取前会按调用方超时重设）
const OPEN_TIMEOUT: Duration = Duration::from_millis(500);

/// 串口传输
///
/// 打开时配置为 8N1、无流控、原始模式。
///
/// # 示例
///
/// ```no_run
/// use scara_serial::{BaudRate, SerialPortTransport};
///
/// let port = SerialPortTransport::open("/dev/ttyUSB0", BaudRate::B115200).unwrap();
/// ```
pub struct SerialPortTransport {
    port: Box<dyn SerialPort>,
    port_name: String,
    baud_rate: BaudRate,
}

impl SerialPortTransport {
    /// 打开并配置串口
    ///
    /// # 错误
    /// - `SerialError::Port`: 设备不存在、权限不足或配置失败
    pub fn open(port_name: impl Into<String>, baud_rate: BaudRate) -> Result<Self, SerialError> {
        let port_name = port_name.into();
        let port = serialport::new(&port_name, baud_rate.bps())
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(OPEN_TIMEOUT)
            .open()?;

        debug!("Opened serial port '{}' at {} baud", port_name, baud_rate);

        Ok(Self {
            port,
            port_name,
            baud_rate,
        })
    }

    /// 串口名称
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// 波特率
    pub fn baud_rate(&self) -> BaudRate {
        self.baud_rate
    }
}

impl Transport for SerialPortTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize, SerialError> {
        self.port.write_all(data)?;
        self.port.flush()?;
        trace!("TX {:02X?}", data);
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, SerialError> {
        let deadline = Instant::now() + timeout;
        let mut filled = 0;

        while filled < buf.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            self.port.set_timeout(remaining)?;

            match self.port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        trace!("RX {:02X?}", &buf[..filled]);
        Ok(filled)
    }

    fn flush(&mut self) -> Result<(), SerialError> {
        self.port.clear(ClearBuffer::All)?;
        Ok(())
    }
}

impl Drop for SerialPortTransport {
    /// 离开作用域时自动关闭串口
    fn drop(&mut self) {
        debug!("Serial port '{}' closed", self.port_name);
    }
}
