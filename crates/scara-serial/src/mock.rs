//! Mock 总线
//!
//! 在内存中模拟挂在同一串口上的多个关节控制器，按协议应答帧头和数据块，
//! 并支持按寄存器注入故障。用于无硬件测试。
//!
//! `MockTransport` 的克隆共享同一份总线状态，测试可以在传输被 Fleet
//! 持有之后继续检查调用记录。

use crate::{SerialError, Transport};
use parking_lot::Mutex;
use scara_protocol::{
    ACK, FrameHeader, HEADER_LEN, NACK, PING_REPLY, Register, bytes_to_i32_le, checksum,
    encode_block, i32_to_bytes_le, verify_block,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// 注入的故障类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// 帧头无应答（超时）
    NoAck,
    /// 帧头被拒绝
    Nack,
    /// 数据块无应答（仅写交换）
    NoPayloadAck,
    /// 数据块被拒绝（仅写交换）
    NackPayload,
    /// 回复的校验字节错误（仅读交换）
    BadChecksum,
    /// 回复被截断（仅读交换）
    ShortReply,
}

/// 设备收到的一次交换
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub register: Register,
    /// 写交换的负载；读交换为空
    pub payload: Vec<u8>,
}

/// 模拟的关节控制器
#[derive(Debug, Clone)]
pub struct MockDevice {
    pub ping_reply: u8,
    pub position_raw: i32,
    pub rpm_raw: i32,
    pub stalled: bool,
    faults: HashMap<Register, Fault>,
    calls: Vec<MockCall>,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self {
            ping_reply: PING_REPLY,
            position_raw: 0,
            rpm_raw: 0,
            stalled: false,
            faults: HashMap::new(),
            calls: Vec::new(),
        }
    }
}

impl MockDevice {
    fn read_reply(&self, register: Register) -> Vec<u8> {
        match register {
            Register::Ping => vec![self.ping_reply],
            Register::AngleMoved => i32_to_bytes_le(self.position_raw).to_vec(),
            Register::GetEncoderRpm | Register::GetDriverRpm => {
                i32_to_bytes_le(self.rpm_raw).to_vec()
            },
            Register::IsStalled => vec![self.stalled as u8],
            _ => vec![0; register.response_len().unwrap_or(0)],
        }
    }

    fn apply_write(&mut self, register: Register, payload: &[u8]) {
        let as_i32 = || {
            payload
                .get(..4)
                .and_then(|b| b.try_into().ok())
                .map(bytes_to_i32_le)
        };
        match register {
            Register::MoveToAngle => {
                if let Some(raw) = as_i32() {
                    self.position_raw = raw;
                }
            },
            Register::SetRpm => {
                if let Some(raw) = as_i32() {
                    self.rpm_raw = raw;
                }
            },
            Register::Stop => self.rpm_raw = 0,
            Register::ClearStall => self.stalled = false,
            Register::Home => {
                self.position_raw = 0;
                self.stalled = false;
            },
            _ => {},
        }
    }
}

#[derive(Debug, Default)]
struct BusState {
    devices: BTreeMap<u8, MockDevice>,
    /// 设备 → 主机方向尚未读取的字节
    rx: VecDeque<u8>,
    /// 已确认帧头、等待数据块的写交换
    pending: Option<FrameHeader>,
    writes: Vec<Vec<u8>>,
    flushes: usize,
    fail_writes: bool,
}

impl BusState {
    fn on_header(&mut self, bytes: &[u8]) {
        let Ok(header) = FrameHeader::from_bytes(bytes) else {
            return;
        };
        let Some(device) = self.devices.get_mut(&header.address) else {
            return;
        };

        device.calls.push(MockCall {
            register: header.register,
            payload: Vec::new(),
        });
        let fault = device.faults.get(&header.register).copied();

        match fault {
            Some(Fault::NoAck) => return,
            Some(Fault::Nack) => {
                self.rx.push_back(NACK);
                return;
            },
            _ => {},
        }
        self.rx.push_back(ACK);

        if header.register.is_read() {
            let mut block = encode_block(&device.read_reply(header.register)).to_vec();
            match fault {
                Some(Fault::BadChecksum) => {
                    if let Some(last) = block.last_mut() {
                        *last ^= 0xA5;
                    }
                },
                Some(Fault::ShortReply) => block.truncate(block.len() / 2),
                _ => {},
            }
            self.rx.extend(block);
        } else {
            self.pending = Some(header);
        }
    }

    fn on_block(&mut self, header: FrameHeader, block: &[u8]) {
        let Some(device) = self.devices.get_mut(&header.address) else {
            return;
        };
        if let Some(call) = device.calls.last_mut() {
            call.payload = block[..block.len().saturating_sub(1)].to_vec();
        }

        match device.faults.get(&header.register) {
            Some(Fault::NoPayloadAck) => return,
            Some(Fault::NackPayload) => {
                self.rx.push_back(NACK);
                return;
            },
            _ => {},
        }

        match verify_block(block, header.length as usize) {
            Ok(payload) => {
                device.apply_write(header.register, payload);
                self.rx.push_back(ACK);
            },
            Err(_) => self.rx.push_back(NACK),
        }
    }
}

/// 模拟串口传输
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<BusState>>,
}

impl MockTransport {
    /// 创建空总线
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建挂有指定地址设备的总线
    pub fn with_devices(addresses: &[u8]) -> Self {
        let bus = Self::new();
        for &address in addresses {
            bus.add_device(address, MockDevice::default());
        }
        bus
    }

    /// 挂载设备（替换同地址的旧设备）
    pub fn add_device(&self, address: u8, device: MockDevice) {
        self.state.lock().devices.insert(address, device);
    }

    /// 对指定设备的某个寄存器注入故障
    pub fn inject_fault(&self, address: u8, register: Register, fault: Fault) {
        if let Some(device) = self.state.lock().devices.get_mut(&address) {
            device.faults.insert(register, fault);
        }
    }

    /// 清除指定设备的全部故障
    pub fn clear_faults(&self, address: u8) {
        if let Some(device) = self.state.lock().devices.get_mut(&address) {
            device.faults.clear();
        }
    }

    /// 让后续所有写操作失败
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// 在接收缓冲区中放入残留字节（模拟上一次交换的遗留数据）
    pub fn push_stale(&self, bytes: &[u8]) {
        self.state.lock().rx.extend(bytes.iter().copied());
    }

    /// 读取/修改设备状态
    pub fn with_device<R>(&self, address: u8, f: impl FnOnce(&mut MockDevice) -> R) -> Option<R> {
        self.state.lock().devices.get_mut(&address).map(f)
    }

    /// 设备收到的全部交换
    pub fn calls(&self, address: u8) -> Vec<MockCall> {
        self.with_device(address, |d| d.calls.clone()).unwrap_or_default()
    }

    /// 设备收到的某个寄存器的交换次数
    pub fn call_count(&self, address: u8, register: Register) -> usize {
        self.calls(address)
            .iter()
            .filter(|c| c.register == register)
            .count()
    }

    /// 主机写出的全部字节块（按调用顺序）
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().writes.clone()
    }

    /// 缓冲区清空次数
    pub fn flush_count(&self) -> usize {
        self.state.lock().flushes
    }

    /// 设备回复 `PING_REPLY` 以外的字节
    pub fn set_ping_reply(&self, address: u8, reply: u8) {
        self.with_device(address, |d| d.ping_reply = reply);
    }

    /// 标记设备堵转
    pub fn set_stalled(&self, address: u8, stalled: bool) {
        self.with_device(address, |d| d.stalled = stalled);
    }
}

impl Transport for MockTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize, SerialError> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(SerialError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }
        state.writes.push(data.to_vec());

        match state.pending.take() {
            Some(header) => state.on_block(header, data),
            None if data.len() == HEADER_LEN => state.on_header(data),
            None => {},
        }
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize, SerialError> {
        let mut state = self.state.lock();
        let n = buf.len().min(state.rx.len());
        for (slot, byte) in buf.iter_mut().zip(state.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), SerialError> {
        let mut state = self.state.lock();
        state.rx.clear();
        state.pending = None;
        state.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_exchange_ping() {
        let mut bus = MockTransport::with_devices(&[3]);
        bus.write(&[3, Register::Ping.code(), 0]).unwrap();

        let mut buf = [0u8; 3];
        assert_eq!(bus.read(&mut buf, Duration::ZERO).unwrap(), 3);
        assert_eq!(buf, [ACK, PING_REPLY, checksum(&[PING_REPLY])]);
        assert_eq!(bus.call_count(3, Register::Ping), 1);
    }

    #[test]
    fn test_write_exchange_updates_device() {
        let mut bus = MockTransport::with_devices(&[1]);
        bus.write(&[1, Register::MoveToAngle.code(), 4]).unwrap();
        bus.write(&encode_block(&i32_to_bytes_le(4500))).unwrap();

        let mut buf = [0u8; 2];
        assert_eq!(bus.read(&mut buf, Duration::ZERO).unwrap(), 2);
        assert_eq!(buf, [ACK, ACK]);
        assert_eq!(bus.with_device(1, |d| d.position_raw), Some(4500));
        assert_eq!(bus.calls(1)[0].payload, i32_to_bytes_le(4500).to_vec());
    }

    #[test]
    fn test_unknown_address_is_silent() {
        let mut bus = MockTransport::with_devices(&[1]);
        bus.write(&[9, Register::Ping.code(), 0]).unwrap();
        let mut buf = [0u8; 1];
        assert_eq!(bus.read(&mut buf, Duration::ZERO).unwrap(), 0);
    }

    #[test]
    fn test_fault_injection() {
        let mut bus = MockTransport::with_devices(&[1]);
        bus.inject_fault(1, Register::Stop, Fault::Nack);
        bus.write(&[1, Register::Stop.code(), 1]).unwrap();
        let mut buf = [0u8; 1];
        bus.read(&mut buf, Duration::ZERO).unwrap();
        assert_eq!(buf, [NACK]);

        bus.clear_faults(1);
        bus.flush().unwrap();
        bus.write(&[1, Register::Stop.code(), 1]).unwrap();
        bus.read(&mut buf, Duration::ZERO).unwrap();
        assert_eq!(buf, [ACK]);
    }

    #[test]
    fn test_bad_block_is_rejected() {
        let mut bus = MockTransport::with_devices(&[1]);
        bus.write(&[1, Register::SetCurrent.code(), 1]).unwrap();
        bus.write(&[50, 0x00]).unwrap();
        let mut buf = [0u8; 2];
        bus.read(&mut buf, Duration::ZERO).unwrap();
        assert_eq!(buf, [ACK, NACK]);
    }

    #[test]
    fn test_flush_discards_stale_bytes() {
        let mut bus = MockTransport::with_devices(&[1]);
        bus.push_stale(&[0xEE, 0xEE]);
        bus.flush().unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(bus.read(&mut buf, Duration::ZERO).unwrap(), 0);
        assert_eq!(bus.flush_count(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let bus = MockTransport::with_devices(&[1]);
        let mut handle = bus.clone();
        handle.write(&[1, Register::Ping.code(), 0]).unwrap();
        assert_eq!(bus.writes().len(), 1);
        assert_eq!(bus.call_count(1, Register::Ping), 1);
    }
}
