//! SCARA SDK - 串口步进关节机械臂 Rust SDK
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 寄存器、帧格式、校验和、定点单位换算
//! - **传输层** (`serial`): 带超时的字节读写，真实串口与 Mock 总线
//! - **驱动层** (`driver`): ACK/NACK 握手交换、单关节操作
//! - **客户端层** (`client`): 多关节协同、配置文件、Builder
//!
//! 数据严格自上而下流动：Fleet → Joint → 握手交换 → Transport。
//!
//! # 快速开始
//!
//! ```no_run
//! use scara_sdk::prelude::*;
//!
//! scara_sdk::init_logger!();
//!
//! let mut fleet = FleetBuilder::new()
//!     .port("/dev/ttyUSB0")
//!     .joint(JointSpec::new(1, "shoulder").gear_ratio(5.0))
//!     .joint(JointSpec::new(2, "elbow").gear_ratio(3.0))
//!     .connect()?;
//!
//! fleet.enables(PerJoint::Uniform(80), PerJoint::Uniform(30))?;
//! fleet.set_positions(&[45.0, -30.0])?;
//!
//! let mut positions = [0.0; 2];
//! fleet.get_positions(&mut positions)?;
//! fleet.deinit()?;
//! # Ok::<(), FleetError>(())
//! ```

pub use scara_client as client;
pub use scara_driver as driver;
pub use scara_protocol as protocol;
pub use scara_serial as serial;

pub mod logging;
pub mod prelude;

// 常用类型
pub use scara_client::{FleetBuilder, FleetConfig, FleetError, JointFleet, JointSpec, PerJoint};
pub use scara_driver::{DriverError, Joint};
pub use scara_protocol::{ProtocolError, Register};
pub use scara_serial::{BaudRate, SerialError, SerialPortTransport, Transport};
