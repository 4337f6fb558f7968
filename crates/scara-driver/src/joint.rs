//! 单关节驱动
//!
//! [`Joint`] 把语义操作（位置、速度、电流、制动……）翻译为一次写/读交换，
//! 并在关节单位与设备定点整数之间换算。
//!
//! 关节不持有传输：每个操作借用调用方传入的 `&mut T`，传输的所有权和
//! 关闭时机由上层（通常是 `JointFleet`）决定。

use crate::codec::{read_array, write_exchange};
use crate::error::{DeinitStep, DriverError};
use crate::params::{
    BrakeMode, HomingParams, StopMode, check_orientation_timeout, check_percent, check_sensitivity,
};
use scara_protocol::{
    DEFAULT_TIMEOUT, JointScale, PING_REPLY, Register, bytes_to_i32_le, encode_fixed,
    i32_to_bytes_le,
};
use scara_serial::Transport;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 无参数命令的占位负载
const NO_ARG: [u8; 1] = [0x00];

/// 单个步进关节
///
/// # 示例
///
/// ```
/// use scara_driver::Joint;
///
/// let joint = Joint::new(1, "shoulder", 5.0, 0.0).unwrap();
/// assert_eq!(joint.address(), 1);
/// assert!(!joint.is_connected());
/// ```
#[derive(Debug, Clone)]
pub struct Joint {
    address: u8,
    name: String,
    scale: JointScale,
    timeout: Duration,
    connected: bool,
}

impl Joint {
    /// 创建关节（尚未连接）
    ///
    /// # 错误
    /// - `DriverError::Protocol`: `gear_ratio` 为 0 或非有限值，`offset` 非有限值
    pub fn new(
        address: u8,
        name: impl Into<String>,
        gear_ratio: f64,
        offset: f64,
    ) -> Result<Self, DriverError> {
        Ok(Self {
            address,
            name: name.into(),
            scale: JointScale::new(gear_ratio, offset)?,
            timeout: DEFAULT_TIMEOUT,
            connected: false,
        })
    }

    /// 设置普通交换的超时
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scale(&self) -> JointScale {
        self.scale
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 是否已通过连接检查
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// 标记为未连接，不发送任何字节
    ///
    /// 传输已经失效（例如初始化中途失败被关闭）时使用。
    pub fn release(&mut self) {
        self.connected = false;
    }

    // ==================== 生命周期 ====================

    /// 连接检查：PING 回复必须为 `PING_REPLY`
    ///
    /// 失败时关节保持不可用。
    ///
    /// # 错误
    /// - `DriverError::Connection`: 无应答、被拒绝或回复字节不符
    pub fn init<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<(), DriverError> {
        self.connected = false;

        let reply = read_array::<1, _>(transport, self.address, Register::Ping, self.timeout)
            .map_err(|e| DriverError::Connection {
                joint: self.name.clone(),
                reply: None,
                source: Some(Box::new(e)),
            })?;

        if reply[0] != PING_REPLY {
            return Err(DriverError::Connection {
                joint: self.name.clone(),
                reply: Some(reply[0]),
                source: None,
            });
        }

        self.connected = true;
        info!("Joint '{}' (0x{:02X}) connected", self.name, self.address);
        Ok(())
    }

    /// 释放关节：断电后标记为未连接
    ///
    /// 四个断电步骤总是全部执行，失败汇总为 `DriverError::Deinit`。
    /// 未连接的关节直接返回 `Ok(())`。
    pub fn deinit<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<(), DriverError> {
        if !self.connected {
            return Ok(());
        }
        let result = self.power_down(transport);
        self.connected = false;
        info!("Joint '{}' released", self.name);
        result
    }

    /// 执行与 `deinit` 相同的断电步骤，但关节保持可用
    pub fn disable<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<(), DriverError> {
        self.ensure_connected()?;
        self.power_down(transport)
    }

    /// 上电：SETUP，驱动电流，保持电流，开启闭环
    ///
    /// 两个电流值在发送任何字节之前校验。
    pub fn enable<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        drive_current: u8,
        hold_current: u8,
    ) -> Result<(), DriverError> {
        let drive = check_percent("drive current", drive_current)?;
        let hold = check_percent("hold current", hold_current)?;

        self.write(transport, Register::Setup, &NO_ARG)?;
        self.write(transport, Register::SetCurrent, &[drive])?;
        self.write(transport, Register::SetHoldCurrent, &[hold])?;
        self.write(transport, Register::EnableClosedLoop, &NO_ARG)?;
        debug!(
            "Joint '{}' enabled (drive {}%, hold {}%)",
            self.name, drive, hold
        );
        Ok(())
    }

    fn power_down<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<(), DriverError> {
        let mut failures = Vec::new();

        for step in DeinitStep::ALL {
            let result = match step {
                DeinitStep::Stop => self.stop(transport, StopMode::Hard),
                DeinitStep::DisableClosedLoop => self.disable_closed_loop(transport),
                DeinitStep::ZeroHoldCurrent => self.set_hold_current(transport, 0),
                DeinitStep::Freewheel => self.set_brake_mode(transport, BrakeMode::Freewheel),
            };
            if let Err(e) = result {
                warn!("Joint '{}': {:?} failed: {}", self.name, step, e);
                failures.push((step, e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DriverError::Deinit {
                joint: self.name.clone(),
                failures,
            })
        }
    }

    // ==================== 运动 ====================

    /// 读取关节位置（度或毫米）
    pub fn get_position<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
    ) -> Result<f64, DriverError> {
        let raw = self.angle_moved_raw(transport)?;
        Ok(self.scale.raw_to_position(raw))
    }

    /// 编码器累计转角原始值（1/100 度，未经减速比换算）
    pub fn angle_moved_raw<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
    ) -> Result<i32, DriverError> {
        let bytes = self.read::<4, _>(transport, Register::AngleMoved)?;
        Ok(bytes_to_i32_le(bytes))
    }

    /// 运动到关节位置
    pub fn set_position<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        position: f64,
    ) -> Result<(), DriverError> {
        self.ensure_connected()?;
        let raw = self.scale.position_to_raw(position)?;
        self.write(transport, Register::MoveToAngle, &i32_to_bytes_le(raw))
    }

    /// 读取关节速度（度/秒或毫米/秒）
    pub fn get_velocity<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
    ) -> Result<f64, DriverError> {
        let bytes = self.read::<4, _>(transport, Register::GetEncoderRpm)?;
        Ok(self.scale.raw_to_velocity(bytes_to_i32_le(bytes)))
    }

    /// 以关节速度持续运动
    pub fn set_velocity<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        velocity: f64,
    ) -> Result<(), DriverError> {
        self.ensure_connected()?;
        let raw = self.scale.velocity_to_raw(velocity)?;
        self.write(transport, Register::SetRpm, &i32_to_bytes_le(raw))
    }

    /// 方向自检：电机转动 `angle` 度（电机角，不经减速比换算）
    ///
    /// 设备在物理确认前不会应答，`timeout` 不能短于 `ORIENTATION_TIMEOUT`。
    /// 应在 `enable` 之后、任何运动命令之前调用；驱动层不检查这一顺序。
    pub fn check_orientation<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        angle: f64,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let timeout = check_orientation_timeout(timeout)?;
        self.ensure_connected()?;
        let raw = encode_fixed("angle", angle)?;
        write_exchange(
            transport,
            self.address,
            Register::CheckOrientation,
            &i32_to_bytes_le(raw),
            timeout,
        )
    }

    /// 停止电机
    pub fn stop<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        mode: StopMode,
    ) -> Result<(), DriverError> {
        self.write(transport, Register::Stop, &[mode.into()])
    }

    /// 按原始步数运动（不做单位换算，用于标定）
    pub fn move_steps<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        steps: i32,
    ) -> Result<(), DriverError> {
        self.write(transport, Register::MoveSteps, &i32_to_bytes_le(steps))
    }

    /// 回零：按给定方向和转速运动，直到编码器检测到堵转
    pub fn home<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        params: &HomingParams,
    ) -> Result<(), DriverError> {
        let payload = params.to_payload()?;
        self.write(transport, Register::Home, &payload)?;
        info!("Joint '{}' homing {:?} at {} rpm", self.name, params.direction, params.rpm);
        Ok(())
    }

    // ==================== 配置 ====================

    pub fn disable_closed_loop<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
    ) -> Result<(), DriverError> {
        self.write(transport, Register::DisableClosedLoop, &NO_ARG)
    }

    /// 设置驱动电流（0-100%）
    pub fn set_drive_current<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        percent: u8,
    ) -> Result<(), DriverError> {
        let percent = check_percent("drive current", percent)?;
        self.write(transport, Register::SetCurrent, &[percent])
    }

    /// 设置保持电流（0-100%）
    pub fn set_hold_current<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        percent: u8,
    ) -> Result<(), DriverError> {
        let percent = check_percent("hold current", percent)?;
        self.write(transport, Register::SetHoldCurrent, &[percent])
    }

    pub fn set_brake_mode<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        mode: BrakeMode,
    ) -> Result<(), DriverError> {
        self.write(transport, Register::SetBrakeMode, &[mode.into()])
    }

    /// 开启堵转保护
    ///
    /// `sensitivity` 取值 -100..=10，越小越不敏感。
    pub fn enable_stall_guard<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        sensitivity: i8,
    ) -> Result<(), DriverError> {
        let sensitivity = check_sensitivity(sensitivity)?;
        self.write(transport, Register::EnableStallGuard, &[sensitivity as u8])
    }

    pub fn disable_stall_guard<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
    ) -> Result<(), DriverError> {
        self.write(transport, Register::DisableStallGuard, &NO_ARG)
    }

    /// 清除堵转标志
    pub fn clear_stall<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<(), DriverError> {
        self.write(transport, Register::ClearStall, &NO_ARG)
    }

    pub fn is_stalled<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
    ) -> Result<bool, DriverError> {
        let [flag] = self.read::<1, _>(transport, Register::IsStalled)?;
        Ok(flag != 0)
    }

    // ==================== 内部 ====================

    fn ensure_connected(&self) -> Result<(), DriverError> {
        if !self.connected {
            return Err(DriverError::NotInitialized {
                joint: self.name.clone(),
            });
        }
        Ok(())
    }

    fn write<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        register: Register,
        payload: &[u8],
    ) -> Result<(), DriverError> {
        self.ensure_connected()?;
        write_exchange(transport, self.address, register, payload, self.timeout)
    }

    fn read<const N: usize, T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        register: Register,
    ) -> Result<[u8; N], DriverError> {
        self.ensure_connected()?;
        read_array::<N, _>(transport, self.address, register, self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::HomeDirection;
    use scara_protocol::ORIENTATION_TIMEOUT;
    use scara_serial::mock::{Fault, MockTransport};

    fn connected(bus: &mut MockTransport, address: u8, gear_ratio: f64, offset: f64) -> Joint {
        let mut joint = Joint::new(address, format!("j{address}"), gear_ratio, offset).unwrap();
        joint.init(bus).unwrap();
        joint
    }

    #[test]
    fn test_new_rejects_zero_gear_ratio() {
        assert!(Joint::new(1, "base", 0.0, 0.0).is_err());
        assert!(Joint::new(1, "base", f64::NAN, 0.0).is_err());
        assert!(Joint::new(1, "base", -3.0, 0.0).is_ok());
    }

    #[test]
    fn test_init_ping() {
        let mut bus = MockTransport::with_devices(&[4]);
        let mut joint = Joint::new(4, "elbow", 1.0, 0.0).unwrap();
        joint.init(&mut bus).unwrap();
        assert!(joint.is_connected());
        assert_eq!(bus.call_count(4, Register::Ping), 1);
    }

    #[test]
    fn test_init_wrong_reply() {
        let mut bus = MockTransport::with_devices(&[4]);
        bus.set_ping_reply(4, b'X');
        let mut joint = Joint::new(4, "elbow", 1.0, 0.0).unwrap();

        let err = joint.init(&mut bus).unwrap_err();
        assert!(matches!(
            err,
            DriverError::Connection { ref joint, reply: Some(b'X'), .. } if joint == "elbow"
        ));
        assert!(!joint.is_connected());
    }

    #[test]
    fn test_init_unresponsive() {
        let mut bus = MockTransport::with_devices(&[]);
        let mut joint = Joint::new(9, "wrist", 1.0, 0.0).unwrap();
        let err = joint.init(&mut bus).unwrap_err();
        assert!(matches!(err, DriverError::Connection { reply: None, source: Some(_), .. }));
        assert!(!joint.is_connected());
    }

    #[test]
    fn test_ops_require_init() {
        let mut bus = MockTransport::with_devices(&[1]);
        let joint = Joint::new(1, "base", 1.0, 0.0).unwrap();

        assert!(matches!(
            joint.set_position(&mut bus, 10.0),
            Err(DriverError::NotInitialized { .. })
        ));
        assert!(matches!(
            joint.get_velocity(&mut bus),
            Err(DriverError::NotInitialized { .. })
        ));
        assert!(bus.writes().is_empty());
    }

    #[test]
    fn test_position_with_gear_ratio_and_offset() {
        let mut bus = MockTransport::with_devices(&[1]);
        let joint = connected(&mut bus, 1, 5.0, 10.0);

        // (30 - 10) * 5 = 100 deg → 10000
        joint.set_position(&mut bus, 30.0).unwrap();
        assert_eq!(bus.with_device(1, |d| d.position_raw), Some(10000));
        assert_eq!(joint.get_position(&mut bus).unwrap(), 30.0);
        assert_eq!(joint.angle_moved_raw(&mut bus).unwrap(), 10000);
    }

    #[test]
    fn test_velocity_ignores_offset() {
        let mut bus = MockTransport::with_devices(&[1]);
        let joint = connected(&mut bus, 1, 2.0, 45.0);

        // 30 deg/s * 2 = 60 deg/s = 10 rpm → 1000
        joint.set_velocity(&mut bus, 30.0).unwrap();
        assert_eq!(bus.with_device(1, |d| d.rpm_raw), Some(1000));
        assert_eq!(joint.get_velocity(&mut bus).unwrap(), 30.0);
    }

    #[test]
    fn test_set_position_rejects_nan_before_io() {
        let mut bus = MockTransport::with_devices(&[1]);
        let joint = connected(&mut bus, 1, 1.0, 0.0);
        let before = bus.writes().len();

        let err = joint.set_position(&mut bus, f64::NAN).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(bus.writes().len(), before);
    }

    #[test]
    fn test_enable_sequence() {
        let mut bus = MockTransport::with_devices(&[2]);
        let joint = connected(&mut bus, 2, 1.0, 0.0);
        joint.enable(&mut bus, 80, 30).unwrap();

        let registers: Vec<_> = bus.calls(2).into_iter().skip(1).collect();
        assert_eq!(registers.len(), 4);
        assert_eq!(registers[0].register, Register::Setup);
        assert_eq!(registers[1].register, Register::SetCurrent);
        assert_eq!(registers[1].payload, vec![80]);
        assert_eq!(registers[2].register, Register::SetHoldCurrent);
        assert_eq!(registers[2].payload, vec![30]);
        assert_eq!(registers[3].register, Register::EnableClosedLoop);
    }

    #[test]
    fn test_enable_validates_before_io() {
        let mut bus = MockTransport::with_devices(&[2]);
        let joint = connected(&mut bus, 2, 1.0, 0.0);
        let before = bus.writes().len();

        assert!(joint.enable(&mut bus, 50, 120).unwrap_err().is_validation());
        assert_eq!(bus.writes().len(), before);
    }

    #[test]
    fn test_current_and_stall_guard_ranges() {
        let mut bus = MockTransport::with_devices(&[1]);
        let joint = connected(&mut bus, 1, 1.0, 0.0);

        assert!(joint.set_drive_current(&mut bus, 101).is_err());
        assert!(joint.enable_stall_guard(&mut bus, 20).is_err());
        assert_eq!(bus.calls(1).len(), 1);

        joint.set_drive_current(&mut bus, 100).unwrap();
        joint.enable_stall_guard(&mut bus, -100).unwrap();
        let calls = bus.calls(1);
        assert_eq!(calls[2].register, Register::EnableStallGuard);
        assert_eq!(calls[2].payload, vec![0x9C]);
    }

    #[test]
    fn test_check_orientation_timeout() {
        let mut bus = MockTransport::with_devices(&[1]);
        let joint = connected(&mut bus, 1, 8.0, 0.0);

        let err = joint
            .check_orientation(&mut bus, 10.0, Duration::from_millis(100))
            .unwrap_err();
        assert!(err.is_validation());

        joint
            .check_orientation(&mut bus, 10.0, ORIENTATION_TIMEOUT)
            .unwrap();
        let call = bus.calls(1).pop().unwrap();
        assert_eq!(call.register, Register::CheckOrientation);
        // 电机角度直接发送，不乘减速比
        assert_eq!(call.payload, i32_to_bytes_le(1000).to_vec());
    }

    #[test]
    fn test_stop_and_brake_payloads() {
        let mut bus = MockTransport::with_devices(&[1]);
        let joint = connected(&mut bus, 1, 1.0, 0.0);

        joint.stop(&mut bus, StopMode::Soft).unwrap();
        joint.set_brake_mode(&mut bus, BrakeMode::Hardbrake).unwrap();
        joint.move_steps(&mut bus, -200).unwrap();

        let calls = bus.calls(1);
        assert_eq!(calls[1].payload, vec![1]);
        assert_eq!(calls[2].payload, vec![2]);
        assert_eq!(calls[3].register, Register::MoveSteps);
        assert_eq!(calls[3].payload, i32_to_bytes_le(-200).to_vec());
    }

    #[test]
    fn test_stall_flag() {
        let mut bus = MockTransport::with_devices(&[1]);
        let joint = connected(&mut bus, 1, 1.0, 0.0);

        bus.set_stalled(1, true);
        assert!(joint.is_stalled(&mut bus).unwrap());
        joint.clear_stall(&mut bus).unwrap();
        assert!(!joint.is_stalled(&mut bus).unwrap());
    }

    #[test]
    fn test_home_payload() {
        let mut bus = MockTransport::with_devices(&[1]);
        let joint = connected(&mut bus, 1, 1.0, 0.0);
        let params = HomingParams {
            direction: HomeDirection::Cw,
            rpm: 20,
            sensitivity: -10,
            current: 50,
        };
        joint.home(&mut bus, &params).unwrap();

        let call = bus.calls(1).pop().unwrap();
        assert_eq!(call.register, Register::Home);
        assert_eq!(call.payload, vec![1, 20, 0xF6, 50]);
    }

    #[test]
    fn test_deinit_sequence() {
        let mut bus = MockTransport::with_devices(&[1]);
        let mut joint = connected(&mut bus, 1, 1.0, 0.0);
        joint.deinit(&mut bus).unwrap();
        assert!(!joint.is_connected());

        let calls: Vec<_> = bus.calls(1).into_iter().skip(1).collect();
        let registers: Vec<_> = calls.iter().map(|c| c.register).collect();
        assert_eq!(
            registers,
            vec![
                Register::Stop,
                Register::DisableClosedLoop,
                Register::SetHoldCurrent,
                Register::SetBrakeMode,
            ]
        );
        assert_eq!(calls[0].payload, vec![0]);
        assert_eq!(calls[2].payload, vec![0]);
        assert_eq!(calls[3].payload, vec![0]);
    }

    #[test]
    fn test_deinit_continues_after_failure() {
        let mut bus = MockTransport::with_devices(&[1]);
        let mut joint = connected(&mut bus, 1, 1.0, 0.0);
        bus.inject_fault(1, Register::Stop, Fault::NoAck);

        let err = joint.deinit(&mut bus).unwrap_err();
        match err {
            DriverError::Deinit { failures, .. } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].0, DeinitStep::Stop);
            },
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(bus.calls(1).len(), 5);
        assert_eq!(bus.call_count(1, Register::SetBrakeMode), 1);
        assert!(!joint.is_connected());
    }

    #[test]
    fn test_deinit_unconnected_is_noop() {
        let mut bus = MockTransport::with_devices(&[1]);
        let mut joint = Joint::new(1, "base", 1.0, 0.0).unwrap();
        joint.deinit(&mut bus).unwrap();
        assert!(bus.writes().is_empty());
    }

    #[test]
    fn test_disable_keeps_joint_usable() {
        let mut bus = MockTransport::with_devices(&[1]);
        let joint = connected(&mut bus, 1, 1.0, 0.0);
        joint.disable(&mut bus).unwrap();
        assert!(joint.is_connected());
        assert_eq!(bus.call_count(1, Register::SetBrakeMode), 1);
    }

    #[test]
    fn test_release() {
        let mut bus = MockTransport::with_devices(&[1]);
        let mut joint = connected(&mut bus, 1, 1.0, 0.0);
        let before = bus.writes().len();
        joint.release();
        assert!(!joint.is_connected());
        assert_eq!(bus.writes().len(), before);
    }

    #[test]
    fn test_custom_timeout() {
        let joint = Joint::new(1, "base", 1.0, 0.0)
            .unwrap()
            .with_timeout(Duration::from_millis(250));
        assert_eq!(joint.timeout(), Duration::from_millis(250));
    }
}
