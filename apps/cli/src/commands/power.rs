//! 上电 / 停止命令

use crate::utils::per_joint;
use anyhow::Result;
use clap::Args;
use scara_sdk::prelude::*;

/// 上电命令参数
#[derive(Args, Debug)]
pub struct EnableCommand {
    /// 驱动电流（0-100%），单个值或每个关节一个值
    #[arg(long, value_delimiter = ',', required = true)]
    pub drive: Vec<u8>,

    /// 保持电流（0-100%），单个值或每个关节一个值
    #[arg(long, value_delimiter = ',', required = true)]
    pub hold: Vec<u8>,
}

impl EnableCommand {
    pub fn execute<T: Transport>(&self, fleet: &mut JointFleet<T>) -> Result<()> {
        fleet.enables(per_joint(&self.drive), per_joint(&self.hold))?;
        println!("✅ 全部关节已上电（闭环）");
        Ok(())
    }
}

/// 断电：停止、关闭闭环、保持电流归零、自由轮
pub fn disable<T: Transport>(fleet: &mut JointFleet<T>) -> Result<()> {
    fleet.disables()?;
    println!("✅ 全部关节已断电");
    Ok(())
}

/// 停止命令参数
#[derive(Args, Debug)]
pub struct StopCommand {
    /// 按减速度停止（默认立即停止）
    #[arg(long)]
    pub soft: bool,
}

impl StopCommand {
    pub fn mode(&self) -> StopMode {
        if self.soft {
            StopMode::Soft
        } else {
            StopMode::Hard
        }
    }

    pub fn execute<T: Transport>(&self, fleet: &mut JointFleet<T>) -> Result<()> {
        println!("🛑 停止全部关节...");
        fleet.stops(self.mode())?;
        println!("✅ 已停止");
        Ok(())
    }
}
