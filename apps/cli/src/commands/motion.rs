//! 运动与位姿查询命令

use super::{RobotCommand, parse_values, print_report};
use anyhow::Result;
use clap::Args;
use labarm_sdk::{CartesianPose, JointPose, Robot};

/// 移动到工位
#[derive(Args, Debug)]
pub struct StationCommand {
    /// 工位索引（从 1 开始）
    pub station: i64,

    /// 运动参数档位
    #[arg(short, long, default_value_t = 1)]
    pub profile: i64,
}

impl RobotCommand for StationCommand {
    async fn execute(&self, robot: &Robot) -> Result<()> {
        println!("⏳ 移动到工位 {}...", self.station);
        let report = robot.go_to_station(self.station, self.profile).await?;
        print_report(&report);
        Ok(())
    }
}

/// 移动到笛卡尔位姿
#[derive(Args, Debug)]
pub struct MoveCartCommand {
    /// 目标位姿 x,y,z,yaw,pitch,roll（mm / 度），逗号分隔
    #[arg(long, allow_hyphen_values = true)]
    pub pose: String,

    /// 运动参数档位
    #[arg(short, long, default_value_t = 1)]
    pub profile: i64,
}

impl MoveCartCommand {
    pub fn parse_pose(&self) -> Result<CartesianPose> {
        let values = parse_values(&self.pose)?;
        Ok(CartesianPose::from_slice(&values)?)
    }
}

impl RobotCommand for MoveCartCommand {
    async fn execute(&self, robot: &Robot) -> Result<()> {
        let pose = self.parse_pose()?;
        println!("⏳ 移动到 {:?}...", pose.to_array());
        let report = robot.move_cart(self.profile, pose).await?;
        print_report(&report);
        Ok(())
    }
}

/// 移动到关节位姿
#[derive(Args, Debug)]
pub struct MoveJointsCommand {
    /// 目标关节角度（度），逗号分隔
    #[arg(short, long, allow_hyphen_values = true)]
    pub joints: String,

    /// 运动参数档位
    #[arg(short, long, default_value_t = 1)]
    pub profile: i64,
}

impl MoveJointsCommand {
    pub fn parse_joints(&self) -> Result<JointPose> {
        Ok(JointPose::new(parse_values(&self.joints)?)?)
    }
}

impl RobotCommand for MoveJointsCommand {
    async fn execute(&self, robot: &Robot) -> Result<()> {
        let pose = self.parse_joints()?;
        println!("⏳ 移动关节...");
        for (i, angle) in pose.iter().enumerate() {
            println!("  J{}: {:.3}°", i + 1, angle);
        }
        let report = robot.move_joints(self.profile, pose).await?;
        print_report(&report);
        Ok(())
    }
}

/// 查询位姿
#[derive(Args, Debug)]
pub struct WhereCommand {
    /// 查询关节角度（默认查询笛卡尔位姿）
    #[arg(long)]
    pub joints: bool,

    /// 查询目标位姿（默认查询当前位姿）
    #[arg(long)]
    pub goal: bool,
}

impl RobotCommand for WhereCommand {
    async fn execute(&self, robot: &Robot) -> Result<()> {
        let label = if self.goal { "目标" } else { "当前" };

        if self.joints {
            let pose = if self.goal {
                robot.goal_pose_joints().await?
            } else {
                robot.current_pose_joints().await?
            };
            println!("📊 {}关节角度:", label);
            for (i, angle) in pose.iter().enumerate() {
                println!("  J{}: {:.3}°", i + 1, angle);
            }
        } else {
            let pose = if self.goal {
                robot.goal_pose_cartesian().await?
            } else {
                robot.current_pose_cartesian().await?
            };
            println!("📊 {}笛卡尔位姿:", label);
            println!("  x: {:.3} mm  y: {:.3} mm  z: {:.3} mm", pose.x(), pose.y(), pose.z());
            println!(
                "  yaw: {:.3}°  pitch: {:.3}°  roll: {:.3}°",
                pose.yaw(),
                pose.pitch(),
                pose.roll()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cartesian_pose() {
        let cmd = MoveCartCommand {
            pose: "100,0,200,0,90,-45".to_string(),
            profile: 1,
        };
        let pose = cmd.parse_pose().unwrap();
        assert_eq!(pose.roll(), -45.0);
    }

    #[test]
    fn test_cartesian_pose_needs_six_values() {
        let cmd = MoveCartCommand {
            pose: "100,0,200".to_string(),
            profile: 1,
        };
        assert!(cmd.parse_pose().is_err());
    }

    #[test]
    fn test_parse_joints() {
        let cmd = MoveJointsCommand {
            joints: "0,-45,90,0,45,0,10".to_string(),
            profile: 2,
        };
        assert_eq!(cmd.parse_joints().unwrap().len(), 7);
    }
}
