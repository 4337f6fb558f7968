//! Fleet 参数类型

use crate::error::FleetError;
use serde::{Deserialize, Serialize};

/// 关节注册信息
///
/// # Example
///
/// ```
/// use scara_client::JointSpec;
///
/// let spec = JointSpec::new(1, "shoulder").gear_ratio(5.0).offset(-90.0);
/// assert_eq!(spec.gear_ratio, 5.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointSpec {
    /// 总线地址
    pub address: u8,
    /// 诊断用名称
    pub name: String,
    /// 关节单位到电机角度的减速比（符号决定回零方向）
    #[serde(default = "default_gear_ratio")]
    pub gear_ratio: f64,
    /// 关节零点相对编码器零点的偏置（关节单位）
    #[serde(default)]
    pub offset: f64,
}

fn default_gear_ratio() -> f64 {
    1.0
}

impl JointSpec {
    /// 减速比 1、无偏置的关节
    pub fn new(address: u8, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
            gear_ratio: default_gear_ratio(),
            offset: 0.0,
        }
    }

    pub fn gear_ratio(mut self, gear_ratio: f64) -> Self {
        self.gear_ratio = gear_ratio;
        self
    }

    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }
}

/// 按关节给出的参数：所有关节同一个值，或者每个关节一个值
///
/// `Each` 的长度必须等于关节数，否则操作返回 `FleetError::LengthMismatch`。
#[derive(Debug, Clone, PartialEq)]
pub enum PerJoint<V> {
    Uniform(V),
    Each(Vec<V>),
}

impl<V: Copy> PerJoint<V> {
    /// 检查是否适用于 `joints` 个关节
    pub fn check_len(&self, joints: usize) -> Result<(), FleetError> {
        match self {
            PerJoint::Uniform(_) => Ok(()),
            PerJoint::Each(values) if values.len() == joints => Ok(()),
            PerJoint::Each(values) => Err(FleetError::LengthMismatch {
                expected: joints,
                actual: values.len(),
            }),
        }
    }

    /// 第 `index` 个关节的值
    ///
    /// 调用前应先通过 `check_len`。
    pub fn get(&self, index: usize) -> Option<V> {
        match self {
            PerJoint::Uniform(value) => Some(*value),
            PerJoint::Each(values) => values.get(index).copied(),
        }
    }
}

impl<V> From<Vec<V>> for PerJoint<V> {
    fn from(values: Vec<V>) -> Self {
        PerJoint::Each(values)
    }
}

impl<V: Copy> From<&[V]> for PerJoint<V> {
    fn from(values: &[V]) -> Self {
        PerJoint::Each(values.to_vec())
    }
}
