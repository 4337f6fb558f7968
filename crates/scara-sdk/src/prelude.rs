//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use scara_sdk::prelude::*;
//! ```

// 客户端层（推荐使用）
pub use scara_client::{FleetBuilder, FleetConfig, JointFleet, JointSpec, PerJoint};

// 驱动层
pub use scara_driver::{BrakeMode, HomeDirection, HomingParams, Joint, StopMode};

// 协议常量
pub use scara_protocol::{DEFAULT_ORIENTATION_ANGLE, ORIENTATION_TIMEOUT};

// 传输层
pub use scara_serial::{BaudRate, SerialPortTransport, Transport};

// 错误类型
pub use scara_client::FleetError;
pub use scara_driver::DriverError;
pub use scara_protocol::ProtocolError;
pub use scara_serial::SerialError;
