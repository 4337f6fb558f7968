//! 自检 / 回零 / 堵转保护命令

use crate::utils::{orientation_timeout, per_joint};
use anyhow::Result;
use clap::{Args, ValueEnum};
use scara_sdk::prelude::*;
use scara_sdk::protocol::DEFAULT_ORIENTATION_ANGLE;

/// 方向自检参数
#[derive(Args, Debug)]
pub struct CalibrateCommand {
    /// 自检转动角度（电机角），单个值或每个关节一个值
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub angle: Vec<f64>,

    /// 每个关节的超时（毫秒，≥ 500）
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl CalibrateCommand {
    pub fn execute<T: Transport>(&self, fleet: &mut JointFleet<T>) -> Result<()> {
        let angles = if self.angle.is_empty() {
            PerJoint::Uniform(DEFAULT_ORIENTATION_ANGLE)
        } else {
            per_joint(&self.angle)
        };

        println!("🧭 方向自检（请观察每个关节的转动方向）...");
        fleet.check_orientations(angles, orientation_timeout(self.timeout_ms))?;
        println!("✅ 方向自检完成");
        Ok(())
    }
}

/// 回零方向
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionArg {
    /// 顺时针
    Cw,
    /// 逆时针
    Ccw,
}

impl From<DirectionArg> for HomeDirection {
    fn from(direction: DirectionArg) -> Self {
        match direction {
            DirectionArg::Cw => HomeDirection::Cw,
            DirectionArg::Ccw => HomeDirection::Ccw,
        }
    }
}

/// 回零参数
#[derive(Args, Debug)]
pub struct HomeCommand {
    /// 关节名称
    pub joint: String,

    /// 回零方向
    #[arg(long, value_enum)]
    pub direction: DirectionArg,

    /// 电机转速（RPM，> 10）
    #[arg(long, default_value_t = 30)]
    pub rpm: u8,

    /// 堵转检测灵敏度（-100..=10）
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub sensitivity: i8,

    /// 回零电流（0-100%）
    #[arg(long, default_value_t = 40)]
    pub current: u8,
}

impl HomeCommand {
    pub fn params(&self) -> HomingParams {
        HomingParams {
            direction: self.direction.into(),
            rpm: self.rpm,
            sensitivity: self.sensitivity,
            current: self.current,
        }
    }

    pub fn execute<T: Transport>(&self, fleet: &mut JointFleet<T>) -> Result<()> {
        println!("🏠 关节 '{}' 回零...", self.joint);
        fleet.home(&self.joint, &self.params())?;
        println!("✅ 回零命令已发送");
        Ok(())
    }
}

/// 堵转保护参数
#[derive(Args, Debug)]
pub struct StallGuardCommand {
    /// 灵敏度（-100..=10，越小越不敏感），单个值或每个关节一个值
    #[arg(value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub sensitivity: Vec<i8>,
}

impl StallGuardCommand {
    pub fn execute<T: Transport>(&self, fleet: &mut JointFleet<T>) -> Result<()> {
        fleet.enable_stall_guards(per_joint(&self.sensitivity))?;
        println!("✅ 堵转保护已开启");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::mock_fleet;
    use scara_sdk::protocol::Register;
    use scara_sdk::serial::mock::MockTransport;

    #[test]
    fn test_check_orientation_defaults() {
        let bus = MockTransport::with_devices(&[1, 2]);
        let mut fleet = mock_fleet(&bus, &[1, 2]);
        let cmd = CalibrateCommand {
            angle: vec![],
            timeout_ms: None,
        };
        cmd.execute(&mut fleet).unwrap();
        assert_eq!(bus.call_count(1, Register::CheckOrientation), 1);
        assert_eq!(bus.call_count(2, Register::CheckOrientation), 1);

        let short = CalibrateCommand {
            angle: vec![10.0],
            timeout_ms: Some(100),
        };
        assert!(short.execute(&mut fleet).is_err());
        assert_eq!(bus.call_count(1, Register::CheckOrientation), 1);
    }

    #[test]
    fn test_home_and_stall_guard() {
        let bus = MockTransport::with_devices(&[1, 2]);
        let mut fleet = mock_fleet(&bus, &[1, 2]);
        let home = HomeCommand {
            joint: "j2".into(),
            direction: DirectionArg::Cw,
            rpm: 30,
            sensitivity: 0,
            current: 40,
        };
        home.execute(&mut fleet).unwrap();
        assert_eq!(bus.call_count(2, Register::Home), 1);
        assert_eq!(bus.call_count(1, Register::Home), 0);

        let guard = StallGuardCommand {
            sensitivity: vec![-10],
        };
        guard.execute(&mut fleet).unwrap();
        assert_eq!(bus.call_count(1, Register::EnableStallGuard), 1);
        assert_eq!(bus.call_count(2, Register::EnableStallGuard), 1);
    }

    #[test]
    fn test_home_params() {
        let cmd = HomeCommand {
            joint: "z".into(),
            direction: DirectionArg::Ccw,
            rpm: 25,
            sensitivity: -8,
            current: 35,
        };
        let params = cmd.params();
        assert_eq!(params.direction, HomeDirection::Ccw);
        assert_eq!(params.to_payload().unwrap(), [0, 25, 0xF8, 35]);
    }
}
