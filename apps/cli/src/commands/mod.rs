//! 命令定义和实现

pub mod calibrate;
pub mod config;
pub mod motion;
pub mod power;

pub use calibrate::{CalibrateCommand, HomeCommand, StallGuardCommand};
pub use config::ConfigCommand;
pub use motion::MotionCommand;
pub use power::{EnableCommand, StopCommand};
