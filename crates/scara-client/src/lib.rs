//! # SCARA Client Layer
//!
//! 多关节协同接口：一条串口、多个关节、一次逻辑操作。
//!
//! - [`JointFleet`]: 按注册顺序分发操作，首个失败即终止（fail-fast）
//! - [`PerJoint`]: 所有关节同一个值，或者每个关节一个值
//! - [`FleetConfig`]: TOML 配置文件
//! - [`FleetBuilder`]: 链式构造并连接
//!
//! # 使用场景
//!
//! 这是大多数用户应该使用的层。需要直接访问单个关节或握手交换时，
//! 参见 `scara-driver`。

pub mod builder;
pub mod config;
mod error;
pub mod fleet;
pub mod types;

pub use builder::FleetBuilder;
pub use config::FleetConfig;
pub use error::FleetError;
pub use fleet::JointFleet;
pub use types::{JointSpec, PerJoint};
