//! 多关节协同
//!
//! [`JointFleet`] 独占共享串口，按注册顺序把一次逻辑操作分发给每个关节。
//!
//! 所有按关节取参数的操作遵循同一约定：
//!
//! 1. 参数数量必须等于关节数，否则立即返回 `LengthMismatch`，不发送任何字节
//! 2. 按注册顺序逐个调用关节操作
//! 3. 第一个失败的关节终止整个操作并返回其错误（附关节名）；
//!    之后的关节不会被访问，已成功的关节不回滚
//!
//! 参数的取值范围在发送任何字节之前对全部关节校验，越界时不会有关节被部分执行。
//! 读操作写入调用方提供的缓冲区，失败关节及其后的条目保持调用前的值。

use crate::error::FleetError;
use crate::types::{JointSpec, PerJoint};
use scara_driver::params::{check_orientation_timeout, check_percent, check_sensitivity};
use scara_driver::{BrakeMode, DriverError, HomingParams, Joint, StopMode};
use scara_protocol::{DEFAULT_TIMEOUT, encode_fixed};
use scara_serial::{SerialError, Transport};
use std::time::Duration;
use tracing::{error, info, warn};

/// 共享一条串口的关节集合
///
/// 注册顺序即参数顺序。Fleet 释放（`deinit` 或 drop）时只关闭传输一次。
pub struct JointFleet<T: Transport> {
    joints: Vec<Joint>,
    transport: Option<T>,
    timeout: Duration,
}

impl<T: Transport> Default for JointFleet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> JointFleet<T> {
    /// 创建空的 Fleet
    pub fn new() -> Self {
        Self {
            joints: Vec::new(),
            transport: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// 设置交换超时，作用于已注册和之后注册的全部关节
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.joints = std::mem::take(&mut self.joints)
            .into_iter()
            .map(|joint| joint.with_timeout(timeout))
            .collect();
        self
    }

    /// 注册关节
    ///
    /// # 错误
    /// - `FleetError::AlreadyInitialized`: Fleet 已初始化
    /// - `FleetError::DuplicateJoint`: 地址或名称已被占用
    /// - `FleetError::Joint`: 减速比或偏置无效
    pub fn add_joint(&mut self, spec: JointSpec) -> Result<(), FleetError> {
        if self.is_initialized() {
            return Err(FleetError::AlreadyInitialized);
        }
        if let Some(existing) = self.joints.iter().find(|j| j.address() == spec.address) {
            return Err(FleetError::DuplicateJoint(format!(
                "address 0x{:02X} already used by '{}'",
                spec.address,
                existing.name()
            )));
        }
        if self.joints.iter().any(|j| j.name() == spec.name) {
            return Err(FleetError::DuplicateJoint(format!("name '{}'", spec.name)));
        }

        let joint = Joint::new(spec.address, spec.name.as_str(), spec.gear_ratio, spec.offset)
            .map_err(|source| FleetError::Joint {
                joint: spec.name.clone(),
                operation: "register",
                source,
            })?
            .with_timeout(self.timeout);
        self.joints.push(joint);
        Ok(())
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// 按名称查找关节
    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.joints.iter().find(|j| j.name() == name)
    }

    pub fn joint_names(&self) -> Vec<&str> {
        self.joints.iter().map(Joint::name).collect()
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.transport.is_some()
    }

    // ==================== 生命周期 ====================

    /// 接管已打开的传输并按注册顺序检查每个关节
    ///
    /// 任一关节连接失败时关闭传输、释放全部关节并返回该关节的错误。
    pub fn init(&mut self, mut transport: T) -> Result<(), FleetError> {
        if self.is_initialized() {
            return Err(FleetError::AlreadyInitialized);
        }

        let mut failure = None;
        for joint in &mut self.joints {
            if let Err(source) = joint.init(&mut transport) {
                error!("Failed to connect to '{}': {}", joint.name(), source);
                failure = Some((joint.name().to_string(), source));
                break;
            }
        }

        if let Some((joint, source)) = failure {
            self.release_all();
            drop(transport);
            return Err(FleetError::Joint {
                joint,
                operation: "connect",
                source,
            });
        }

        self.transport = Some(transport);
        info!("Joint initialization successful ({} joints)", self.joints.len());
        Ok(())
    }

    /// 通过 `open` 打开传输后执行 `init`
    pub fn init_with<F>(&mut self, open: F) -> Result<(), FleetError>
    where
        F: FnOnce() -> Result<T, SerialError>,
    {
        if self.is_initialized() {
            return Err(FleetError::AlreadyInitialized);
        }
        let transport = open().map_err(|e| {
            error!("Failed to open serial port: {}", e);
            FleetError::Open(e)
        })?;
        self.init(transport)
    }

    /// 释放每个关节并关闭传输
    ///
    /// 单个关节失败不会中断其余关节，失败汇总为 `FleetError::Deinit`。
    /// 未初始化时直接返回 `Ok(())`。
    pub fn deinit(&mut self) -> Result<(), FleetError> {
        let Some(mut transport) = self.transport.take() else {
            return Ok(());
        };

        let mut failures = Vec::new();
        for joint in &mut self.joints {
            if let Err(e) = joint.deinit(&mut transport) {
                error!("Failed to deinit '{}': {}", joint.name(), e);
                failures.push((joint.name().to_string(), e));
            }
        }
        drop(transport);

        if failures.is_empty() {
            info!("Joint deinitialization successful");
            Ok(())
        } else {
            Err(FleetError::Deinit { failures })
        }
    }

    /// 释放每个关节并关闭传输，不执行断电步骤
    ///
    /// 电机保持当前的闭环、电流和运动状态。未初始化时不做任何事。
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            self.release_all();
            info!("Joint fleet closed, motors left in their current state");
        }
    }

    fn release_all(&mut self) {
        for joint in &mut self.joints {
            joint.release();
        }
    }

    // ==================== 位置 / 速度 ====================

    /// 读取全部关节位置到 `positions`
    pub fn get_positions(&mut self, positions: &mut [f64]) -> Result<(), FleetError> {
        self.check_len(positions.len())?;
        self.for_each("get position", |index, joint, transport| {
            positions[index] = joint.get_position(transport)?;
            Ok(())
        })
    }

    /// 逐个关节运动到目标位置
    pub fn set_positions(&mut self, positions: &[f64]) -> Result<(), FleetError> {
        self.check_len(positions.len())?;
        self.validate("set position", |index, joint| {
            joint.scale().position_to_raw(positions[index])?;
            Ok(())
        })?;
        self.for_each("set position", |index, joint, transport| {
            joint.set_position(transport, positions[index])
        })
    }

    /// 读取全部关节速度到 `velocities`
    pub fn get_velocities(&mut self, velocities: &mut [f64]) -> Result<(), FleetError> {
        self.check_len(velocities.len())?;
        self.for_each("get velocity", |index, joint, transport| {
            velocities[index] = joint.get_velocity(transport)?;
            Ok(())
        })
    }

    pub fn set_velocities(&mut self, velocities: &[f64]) -> Result<(), FleetError> {
        self.check_len(velocities.len())?;
        self.validate("set velocity", |index, joint| {
            joint.scale().velocity_to_raw(velocities[index])?;
            Ok(())
        })?;
        self.for_each("set velocity", |index, joint, transport| {
            joint.set_velocity(transport, velocities[index])
        })
    }

    // ==================== 上电 / 断电 ====================

    /// 方向自检
    ///
    /// `timeout` 作用于每个关节（设备在物理确认前阻塞应答），不能短于 500 ms。
    /// 应在 `enables` 之后、任何运动命令之前调用。
    pub fn check_orientations(
        &mut self,
        angles: PerJoint<f64>,
        timeout: Duration,
    ) -> Result<(), FleetError> {
        angles.check_len(self.len())?;
        self.validate("check orientation", |index, _| {
            check_orientation_timeout(timeout)?;
            encode_fixed("angle", per_joint(&angles, index)?)?;
            Ok(())
        })?;
        self.for_each("check orientation", |index, joint, transport| {
            joint.check_orientation(transport, per_joint(&angles, index)?, timeout)
        })
    }

    /// 上电并开启闭环
    pub fn enables(
        &mut self,
        drive_currents: PerJoint<u8>,
        hold_currents: PerJoint<u8>,
    ) -> Result<(), FleetError> {
        drive_currents.check_len(self.len())?;
        hold_currents.check_len(self.len())?;
        self.validate("enable", |index, _| {
            check_percent("drive current", per_joint(&drive_currents, index)?)?;
            check_percent("hold current", per_joint(&hold_currents, index)?)?;
            Ok(())
        })?;
        self.for_each("enable", |index, joint, transport| {
            joint.enable(
                transport,
                per_joint(&drive_currents, index)?,
                per_joint(&hold_currents, index)?,
            )
        })
    }

    /// 执行断电步骤，关节保持可用
    pub fn disables(&mut self) -> Result<(), FleetError> {
        self.for_each("disable", |_, joint, transport| joint.disable(transport))
    }

    pub fn stops(&mut self, mode: StopMode) -> Result<(), FleetError> {
        self.for_each("stop", |_, joint, transport| joint.stop(transport, mode))
    }

    pub fn disable_closed_loops(&mut self) -> Result<(), FleetError> {
        self.for_each("disable closed loop", |_, joint, transport| {
            joint.disable_closed_loop(transport)
        })
    }

    // ==================== 配置 ====================

    pub fn set_drive_currents(&mut self, currents: PerJoint<u8>) -> Result<(), FleetError> {
        currents.check_len(self.len())?;
        self.validate("set drive current", |index, _| {
            check_percent("drive current", per_joint(&currents, index)?)?;
            Ok(())
        })?;
        self.for_each("set drive current", |index, joint, transport| {
            joint.set_drive_current(transport, per_joint(&currents, index)?)
        })
    }

    pub fn set_hold_currents(&mut self, currents: PerJoint<u8>) -> Result<(), FleetError> {
        currents.check_len(self.len())?;
        self.validate("set hold current", |index, _| {
            check_percent("hold current", per_joint(&currents, index)?)?;
            Ok(())
        })?;
        self.for_each("set hold current", |index, joint, transport| {
            joint.set_hold_current(transport, per_joint(&currents, index)?)
        })
    }

    pub fn set_brake_modes(&mut self, modes: PerJoint<BrakeMode>) -> Result<(), FleetError> {
        modes.check_len(self.len())?;
        self.for_each("set brake mode", |index, joint, transport| {
            joint.set_brake_mode(transport, per_joint(&modes, index)?)
        })
    }

    /// 开启堵转保护（灵敏度 -100..=10）
    pub fn enable_stall_guards(&mut self, sensitivities: PerJoint<i8>) -> Result<(), FleetError> {
        sensitivities.check_len(self.len())?;
        self.validate("enable stall guard", |index, _| {
            check_sensitivity(per_joint(&sensitivities, index)?)?;
            Ok(())
        })?;
        self.for_each("enable stall guard", |index, joint, transport| {
            joint.enable_stall_guard(transport, per_joint(&sensitivities, index)?)
        })
    }

    /// 单个关节回零
    pub fn home(&mut self, name: &str, params: &HomingParams) -> Result<(), FleetError> {
        let transport = self.transport.as_mut().ok_or(FleetError::NotInitialized)?;
        let joint = self
            .joints
            .iter()
            .find(|j| j.name() == name)
            .ok_or_else(|| FleetError::UnknownJoint(name.to_string()))?;

        joint
            .home(transport, params)
            .map_err(|source| FleetError::Joint {
                joint: name.to_string(),
                operation: "home",
                source,
            })
    }

    // ==================== 内部 ====================

    fn check_len(&self, actual: usize) -> Result<(), FleetError> {
        if actual != self.joints.len() {
            return Err(FleetError::LengthMismatch {
                expected: self.joints.len(),
                actual,
            });
        }
        Ok(())
    }

    /// 在任何 IO 之前按注册顺序校验每个关节的参数
    fn validate<F>(&self, operation: &'static str, mut check: F) -> Result<(), FleetError>
    where
        F: FnMut(usize, &Joint) -> Result<(), DriverError>,
    {
        for (index, joint) in self.joints.iter().enumerate() {
            check(index, joint).map_err(|source| FleetError::Joint {
                joint: joint.name().to_string(),
                operation,
                source,
            })?;
        }
        Ok(())
    }

    /// 按注册顺序执行 `op`，遇到第一个错误即返回
    fn for_each<F>(&mut self, operation: &'static str, mut op: F) -> Result<(), FleetError>
    where
        F: FnMut(usize, &Joint, &mut T) -> Result<(), DriverError>,
    {
        let transport = self.transport.as_mut().ok_or(FleetError::NotInitialized)?;

        for (index, joint) in self.joints.iter().enumerate() {
            if let Err(source) = op(index, joint, transport) {
                warn!("Failed to {} for '{}': {}", operation, joint.name(), source);
                return Err(FleetError::Joint {
                    joint: joint.name().to_string(),
                    operation,
                    source,
                });
            }
        }
        Ok(())
    }
}

impl<T: Transport> Drop for JointFleet<T> {
    /// 仍处于初始化状态时尽力断电并关闭传输
    fn drop(&mut self) {
        if self.is_initialized() {
            let _ = self.deinit();
        }
    }
}

/// 取第 `index` 个关节的参数
fn per_joint<V: Copy>(values: &PerJoint<V>, index: usize) -> Result<V, DriverError> {
    values.get(index).ok_or_else(|| {
        DriverError::InvalidInput(format!("no value for joint index {}", index))
    })
}
