//! 单位转换
//!
//! 线上使用 1/100 分辨率的有符号 32 位定点整数：
//!
//! - 位置：`raw = round(deg * 100)`
//! - 速度：`raw = round(rpm * 100)`，`deg/s = 6 * rpm`
//!
//! 关节空间（度或毫米）与电机角度之间通过减速比和零点偏置换算，
//! 换算只依赖 `(gear_ratio, offset)` 与原始值，不携带其他状态。

use crate::ProtocolError;
use crate::constants::{FIXED_POINT_SCALE, RPM_TO_DEGPS};

/// 物理量转定点整数
///
/// # Errors
/// - `ProtocolError::OutOfRange`: NaN、无穷大或超出 i32 表示范围
pub fn encode_fixed(field: &'static str, value: f64) -> Result<i32, ProtocolError> {
    let scaled = (value * FIXED_POINT_SCALE).round();
    if !scaled.is_finite() || scaled < i32::MIN as f64 || scaled > i32::MAX as f64 {
        return Err(ProtocolError::OutOfRange { field, value });
    }
    Ok(scaled as i32)
}

/// 定点整数转物理量
#[inline]
pub fn decode_fixed(raw: i32) -> f64 {
    raw as f64 / FIXED_POINT_SCALE
}

/// 度/秒 转设备 RPM 定点值
pub fn degps_to_raw_rpm(degps: f64) -> Result<i32, ProtocolError> {
    encode_fixed("velocity", degps / RPM_TO_DEGPS)
}

/// 设备 RPM 定点值转 度/秒
#[inline]
pub fn raw_rpm_to_degps(raw: i32) -> f64 {
    RPM_TO_DEGPS * decode_fixed(raw)
}

/// 关节换算参数
///
/// `gear_ratio` 的符号同时约定了回零方向。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointScale {
    gear_ratio: f64,
    offset: f64,
}

impl JointScale {
    /// 创建换算参数
    ///
    /// # Errors
    /// - `ProtocolError::OutOfRange`: 减速比为 0 或非有限值，偏置非有限值
    pub fn new(gear_ratio: f64, offset: f64) -> Result<Self, ProtocolError> {
        if gear_ratio == 0.0 || !gear_ratio.is_finite() {
            return Err(ProtocolError::OutOfRange {
                field: "gear_ratio",
                value: gear_ratio,
            });
        }
        if !offset.is_finite() {
            return Err(ProtocolError::OutOfRange {
                field: "offset",
                value: offset,
            });
        }
        Ok(Self { gear_ratio, offset })
    }

    /// 单位换算（减速比 1，无偏置）
    pub const IDENTITY: Self = Self {
        gear_ratio: 1.0,
        offset: 0.0,
    };

    pub fn gear_ratio(&self) -> f64 {
        self.gear_ratio
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// 关节位置转设备定点角度
    pub fn position_to_raw(&self, position: f64) -> Result<i32, ProtocolError> {
        encode_fixed("position", (position - self.offset) * self.gear_ratio)
    }

    /// 设备定点角度转关节位置
    pub fn raw_to_position(&self, raw: i32) -> f64 {
        decode_fixed(raw) / self.gear_ratio + self.offset
    }

    /// 关节速度转设备 RPM 定点值（偏置不参与）
    pub fn velocity_to_raw(&self, velocity: f64) -> Result<i32, ProtocolError> {
        degps_to_raw_rpm(velocity * self.gear_ratio)
    }

    /// 设备 RPM 定点值转关节速度
    pub fn raw_to_velocity(&self, raw: i32) -> f64 {
        raw_rpm_to_degps(raw) / self.gear_ratio
    }
}

impl Default for JointScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_fixed() {
        assert_eq!(encode_fixed("position", 12.34).unwrap(), 1234);
        assert_eq!(encode_fixed("position", -0.016).unwrap(), -2);
        assert_eq!(encode_fixed("position", 0.0).unwrap(), 0);
    }

    #[test]
    fn test_encode_fixed_rejects_invalid() {
        assert!(encode_fixed("position", f64::NAN).is_err());
        assert!(encode_fixed("position", f64::INFINITY).is_err());
        assert!(encode_fixed("position", 3.0e7).is_err());
        assert!(encode_fixed("position", -3.0e7).is_err());
    }

    #[test]
    fn test_velocity_conversion() {
        // 60 deg/s = 10 rpm = 1000 raw
        assert_eq!(degps_to_raw_rpm(60.0).unwrap(), 1000);
        assert_eq!(raw_rpm_to_degps(1000), 60.0);
        assert_eq!(raw_rpm_to_degps(-150), -9.0);
    }

    #[test]
    fn test_joint_scale_rejects_zero_gear_ratio() {
        assert!(matches!(
            JointScale::new(0.0, 0.0),
            Err(ProtocolError::OutOfRange { field: "gear_ratio", .. })
        ));
        assert!(JointScale::new(f64::NAN, 0.0).is_err());
        assert!(JointScale::new(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_joint_scale_position() {
        let scale = JointScale::new(-5.0, 10.0).unwrap();
        // (30 - 10) * -5 = -100 deg
        assert_eq!(scale.position_to_raw(30.0).unwrap(), -10000);
        assert_eq!(scale.raw_to_position(-10000), 30.0);
    }

    #[test]
    fn test_joint_scale_velocity_ignores_offset() {
        let scale = JointScale::new(2.0, 45.0).unwrap();
        // 30 deg/s * 2 = 60 motor deg/s = 10 rpm
        assert_eq!(scale.velocity_to_raw(30.0).unwrap(), 1000);
        assert_eq!(scale.raw_to_velocity(1000), 30.0);
    }
}
