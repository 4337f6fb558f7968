//! 命令参数类型
//!
//! 闭集参数用枚举表示，数值参数在发送任何字节之前做范围检查。

use crate::error::DriverError;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use scara_protocol::ORIENTATION_TIMEOUT;
use std::time::Duration;

/// 停止模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum StopMode {
    /// 立即停止
    Hard = 0,
    /// 按减速度停止
    Soft = 1,
}

/// 制动模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum BrakeMode {
    Freewheel = 0,
    Coolbrake = 1,
    Hardbrake = 2,
}

/// 回零方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum HomeDirection {
    /// 逆时针
    Ccw = 0,
    /// 顺时针
    Cw = 1,
}

macro_rules! impl_from_raw {
    ($($ty:ident => $name:literal),+ $(,)?) => {
        $(
            impl $ty {
                /// 从原始字节解析，超出取值范围返回 `DriverError::InvalidInput`
                pub fn from_raw(raw: u8) -> Result<Self, DriverError> {
                    Self::try_from(raw).map_err(|_| {
                        DriverError::InvalidInput(format!("{} {} out of range", $name, raw))
                    })
                }
            }
        )+
    };
}

impl_from_raw!(
    StopMode => "stop mode",
    BrakeMode => "brake mode",
    HomeDirection => "home direction",
);

/// 电流百分比上限
pub const MAX_CURRENT_PERCENT: u8 = 100;

/// 堵转检测灵敏度范围（越小越不敏感）
pub const STALL_SENSITIVITY_MIN: i8 = -100;
pub const STALL_SENSITIVITY_MAX: i8 = 10;

/// 回零最低转速（RPM，不含）
pub const HOMING_MIN_RPM: u8 = 10;

/// 校验电流百分比（0-100）
pub fn check_percent(name: &str, value: u8) -> Result<u8, DriverError> {
    if value > MAX_CURRENT_PERCENT {
        return Err(DriverError::InvalidInput(format!(
            "{} {}% exceeds {}%",
            name, value, MAX_CURRENT_PERCENT
        )));
    }
    Ok(value)
}

/// 校验堵转检测灵敏度（-100..=10）
pub fn check_sensitivity(value: i8) -> Result<i8, DriverError> {
    if !(STALL_SENSITIVITY_MIN..=STALL_SENSITIVITY_MAX).contains(&value) {
        return Err(DriverError::InvalidInput(format!(
            "stall sensitivity {} outside [{}, {}]",
            value, STALL_SENSITIVITY_MIN, STALL_SENSITIVITY_MAX
        )));
    }
    Ok(value)
}

/// 校验方向自检超时（不短于 `ORIENTATION_TIMEOUT`）
pub fn check_orientation_timeout(timeout: Duration) -> Result<Duration, DriverError> {
    if timeout < ORIENTATION_TIMEOUT {
        return Err(DriverError::InvalidInput(format!(
            "orientation check timeout {:?} is shorter than {:?}",
            timeout, ORIENTATION_TIMEOUT
        )));
    }
    Ok(timeout)
}

/// 回零参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomingParams {
    pub direction: HomeDirection,
    /// 电机转速（RPM，> 10）
    pub rpm: u8,
    /// 编码器堵转检测灵敏度（-100..=10）
    pub sensitivity: i8,
    /// 回零电流（0-100%），决定触发堵转的难易程度
    pub current: u8,
}

impl HomingParams {
    /// 校验并编码为 4 字节负载 `[direction, rpm, sensitivity, current]`
    pub fn to_payload(&self) -> Result<[u8; 4], DriverError> {
        if self.rpm <= HOMING_MIN_RPM {
            return Err(DriverError::InvalidInput(format!(
                "homing rpm {} must be greater than {}",
                self.rpm, HOMING_MIN_RPM
            )));
        }
        let sensitivity = check_sensitivity(self.sensitivity)?;
        let current = check_percent("homing current", self.current)?;
        Ok([
            self.direction.into(),
            self.rpm,
            sensitivity as u8,
            current,
        ])
    }
}
