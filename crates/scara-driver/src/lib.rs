//! # SCARA Driver Layer
//!
//! 握手交换与单关节驱动。
//!
//! - [`codec`]: 写/读交换的握手状态机（flush → header → ACK → data block → ACK）
//! - [`Joint`]: 单个关节的语义操作与单位换算
//! - [`params`]: 停止、制动、回零等命令参数及其范围检查
//!
//! 本层不持有传输：每个操作借用调用方的 [`Transport`](scara_serial::Transport)。
//! 多关节协同请使用 `scara-client` 提供的 `JointFleet`。

pub mod codec;
mod error;
mod joint;
pub mod params;

pub use codec::{read_exchange, write_exchange};
pub use error::{DeinitStep, DriverError, HandshakeStage};
pub use joint::Joint;
pub use params::{BrakeMode, HomeDirection, HomingParams, StopMode};
