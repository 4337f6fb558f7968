//! 协议常量定义
//!
//! 集中定义所有协议相关的常量，避免在代码中散落"魔法数"。

use std::time::Duration;

/// 设备确认字节（帧头确认与数据确认共用）
pub const ACK: u8 = 0x06;

/// 设备拒绝字节
///
/// 仅用于诊断输出：任何不等于 `ACK` 的应答都按拒绝处理。
pub const NACK: u8 = 0x15;

/// PING 命令的预期回复
pub const PING_REPLY: u8 = b'O';

/// 帧头长度：`[address, register, length]`
pub const HEADER_LEN: usize = 3;

/// 单帧负载的最大长度（长度字段为 1 字节）
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// 普通交换的默认超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

/// 方向自检的最小超时
///
/// 设备在完成物理确认前不会应答，至少需要等待 500ms。
pub const ORIENTATION_TIMEOUT: Duration = Duration::from_millis(500);

/// 方向自检的默认转角（度）
pub const DEFAULT_ORIENTATION_ANGLE: f64 = 10.0;

/// 定点比例尺（线上分辨率 1/100）
pub const FIXED_POINT_SCALE: f64 = 100.0;

/// RPM 到 度/秒 的换算系数（360° / 60s）
pub const RPM_TO_DEGPS: f64 = 6.0;
