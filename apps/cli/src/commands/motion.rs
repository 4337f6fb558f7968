//! 位置 / 速度命令

use crate::utils::format_readings;
use anyhow::Result;
use clap::Args;
use scara_sdk::prelude::*;

/// 位置 / 速度命令参数
#[derive(Args, Debug)]
pub struct MotionCommand {
    /// 每个关节的目标值，逗号分隔（省略则读取当前值）
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub set: Option<Vec<f64>>,
}

impl MotionCommand {
    /// 读取或设置关节位置（度或毫米）
    pub fn position<T: Transport>(&self, fleet: &mut JointFleet<T>) -> Result<()> {
        match &self.set {
            Some(targets) => {
                fleet.set_positions(targets)?;
                println!("✅ 已发送 {} 个目标位置", targets.len());
            },
            None => {
                let mut positions = vec![0.0; fleet.len()];
                fleet.get_positions(&mut positions)?;
                println!("📊 关节位置:");
                println!("{}", format_readings(&fleet.joint_names(), &positions, "deg"));
            },
        }
        Ok(())
    }

    /// 读取或设置关节速度（度/秒或毫米/秒）
    pub fn velocity<T: Transport>(&self, fleet: &mut JointFleet<T>) -> Result<()> {
        match &self.set {
            Some(targets) => {
                fleet.set_velocities(targets)?;
                println!("✅ 已发送 {} 个目标速度", targets.len());
            },
            None => {
                let mut velocities = vec![0.0; fleet.len()];
                fleet.get_velocities(&mut velocities)?;
                println!("📊 关节速度:");
                println!("{}", format_readings(&fleet.joint_names(), &velocities, "deg/s"));
            },
        }
        Ok(())
    }
}
