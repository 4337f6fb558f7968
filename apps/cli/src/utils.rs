//! 参数解析工具

use scara_sdk::PerJoint;
use scara_sdk::protocol::ORIENTATION_TIMEOUT;
use std::time::Duration;

/// 单个值广播到全部关节，多个值按关节顺序对应
pub fn per_joint<V: Copy>(values: &[V]) -> PerJoint<V> {
    match values {
        [single] => PerJoint::Uniform(*single),
        many => PerJoint::Each(many.to_vec()),
    }
}

/// 方向自检超时，未指定时使用最小允许值
pub fn orientation_timeout(timeout_ms: Option<u64>) -> Duration {
    timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(ORIENTATION_TIMEOUT)
}

/// 格式化一组关节读数
pub fn format_readings(names: &[&str], values: &[f64], unit: &str) -> String {
    names
        .iter()
        .zip(values)
        .map(|(name, value)| format!("  {:<12} {:>10.2} {}", name, value, unit))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 在模拟总线上建立一个已初始化的 Fleet，关节名为 `j<地址>`
#[cfg(test)]
pub fn mock_fleet(
    bus: &scara_sdk::serial::mock::MockTransport,
    addresses: &[u8],
) -> scara_sdk::JointFleet<scara_sdk::serial::mock::MockTransport> {
    let mut fleet = scara_sdk::JointFleet::new();
    for &address in addresses {
        fleet
            .add_joint(scara_sdk::JointSpec::new(address, format!("j{address}")))
            .unwrap();
    }
    fleet.init(bus.clone()).unwrap();
    fleet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_joint() {
        assert_eq!(per_joint(&[50u8]), PerJoint::Uniform(50));
        assert_eq!(per_joint(&[1u8, 2, 3]), PerJoint::Each(vec![1, 2, 3]));
    }

    #[test]
    fn test_orientation_timeout_default() {
        assert_eq!(orientation_timeout(None), Duration::from_millis(500));
        assert_eq!(orientation_timeout(Some(800)), Duration::from_millis(800));
    }

    #[test]
    fn test_format_readings() {
        let text = format_readings(&["base", "z"], &[12.5, -3.0], "deg");
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("base"));
        assert!(text.contains("-3.00 deg"));
    }
}
