//! Builder 模式实现
//!
//! 提供链式构造 `JointFleet` 的便捷方式。

use crate::config::FleetConfig;
use crate::error::FleetError;
use crate::fleet::JointFleet;
use crate::types::JointSpec;
use scara_protocol::DEFAULT_TIMEOUT;
use scara_serial::{BaudRate, SerialPortTransport, Transport};
use std::time::Duration;
use tracing::debug;

/// Fleet Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use scara_client::{FleetBuilder, JointSpec};
/// use scara_serial::BaudRate;
///
/// let mut fleet = FleetBuilder::new()
///     .port("/dev/ttyUSB0")
///     .baud_rate(BaudRate::B115200)
///     .joint(JointSpec::new(1, "shoulder").gear_ratio(5.0))
///     .joint(JointSpec::new(2, "elbow").gear_ratio(3.0))
///     .connect()
///     .unwrap();
///
/// fleet.set_positions(&[10.0, -20.0]).unwrap();
/// fleet.deinit().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct FleetBuilder {
    /// 串口设备路径
    port: Option<String>,
    baud_rate: BaudRate,
    /// 普通交换超时
    timeout: Duration,
    joints: Vec<JointSpec>,
}

impl Default for FleetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FleetBuilder {
    pub fn new() -> Self {
        Self {
            port: None,
            baud_rate: BaudRate::default(),
            timeout: DEFAULT_TIMEOUT,
            joints: Vec::new(),
        }
    }

    /// 设置串口设备路径（`connect` 必需）
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// 设置波特率（可选，默认 115200）
    pub fn baud_rate(mut self, baud_rate: BaudRate) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// 设置普通交换超时（可选，默认 100 ms）
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 追加一个关节（按调用顺序注册）
    pub fn joint(mut self, spec: JointSpec) -> Self {
        self.joints.push(spec);
        self
    }

    /// 用配置文件的内容覆盖端口、波特率、超时，并追加其中的关节
    pub fn config(mut self, config: &FleetConfig) -> Self {
        self.port = Some(config.port.clone());
        self.baud_rate = config.baud();
        self.timeout = config.timeout();
        self.joints.extend(config.joints.iter().cloned());
        self
    }

    /// 构建未连接的 Fleet
    ///
    /// # Errors
    /// - `FleetError::DuplicateJoint`: 地址或名称重复
    /// - `FleetError::Joint`: 减速比或偏置无效
    pub fn build<T: Transport>(self) -> Result<JointFleet<T>, FleetError> {
        let mut fleet = JointFleet::new().with_timeout(self.timeout);
        for spec in self.joints {
            fleet.add_joint(spec)?;
        }
        Ok(fleet)
    }

    /// 打开串口并初始化全部关节
    ///
    /// # Errors
    /// - `FleetError::Config`: 未设置串口
    /// - `FleetError::Open`: 串口打开失败
    /// - `FleetError::Joint`: 某个关节连接失败（串口已关闭）
    pub fn connect(self) -> Result<JointFleet<SerialPortTransport>, FleetError> {
        let port = self
            .port
            .clone()
            .ok_or_else(|| FleetError::Config("serial port not set".to_string()))?;
        let baud_rate = self.baud_rate;

        debug!("Connecting to {} joints on '{}'", self.joints.len(), port);
        let mut fleet = self.build()?;
        fleet.init_with(|| SerialPortTransport::open(port, baud_rate))?;
        Ok(fleet)
    }
}
