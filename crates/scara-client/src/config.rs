//! Fleet 配置文件
//!
//! ```toml
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//! timeout_ms = 100
//!
//! [[joints]]
//! address = 1
//! name = "shoulder"
//! gear_ratio = 5.0
//! offset = 0.0
//! ```

use crate::error::FleetError;
use crate::types::JointSpec;
use scara_protocol::DEFAULT_TIMEOUT;
use scara_serial::BaudRate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Fleet 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetConfig {
    /// 串口设备路径
    pub port: String,

    /// 波特率（不支持的速率回退到 9600）
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// 普通交换超时（毫秒）
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// 按注册顺序排列的关节
    #[serde(default)]
    pub joints: Vec<JointSpec>,
}

fn default_baud_rate() -> u32 {
    BaudRate::default().bps()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

impl FleetConfig {
    /// 创建无关节的配置
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
            joints: Vec::new(),
        }
    }

    /// 从 TOML 文本解析
    pub fn from_toml_str(content: &str) -> Result<Self, FleetError> {
        toml::from_str(content).map_err(|e| FleetError::Config(e.to_string()))
    }

    /// 从文件加载
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, FleetError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| FleetError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// 保存到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), FleetError> {
        let content = toml::to_string_pretty(self).map_err(|e| FleetError::Config(e.to_string()))?;
        fs::write(path.as_ref(), content)
            .map_err(|e| FleetError::Config(format!("{}: {}", path.as_ref().display(), e)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn baud(&self) -> BaudRate {
        BaudRate::from_bps(self.baud_rate)
    }
}
