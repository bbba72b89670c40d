//! 命令编码 / 应答解析的属性测试
//!
//! 使用 proptest 验证编码规则与往返一致性。

use labarm_sdk::protocol::{
    CartesianPose, Clearance, Command, JointPose, ProfileIndex, Reply, StationIndex,
    format_number,
};
use proptest::prelude::*;

fn finite() -> impl Strategy<Value = f64> {
    -10_000.0..10_000.0f64
}

proptest! {
    /// 退让量 <= 0 时省略参数，> 0 时附加参数
    #[test]
    fn teach_plate_clearance_encoding(station in 1i64..10_000, clearance in -100.0..100.0f64) {
        let cmd = Command::TeachPlate {
            station: StationIndex::new(station).unwrap(),
            clearance: Clearance::from_raw(clearance).unwrap(),
        };
        let expected = if clearance <= 0.0 {
            format!("TeachPlate {station}")
        } else {
            format!("TeachPlate {station} {}", format_number(clearance))
        };
        prop_assert_eq!(cmd.encode(), expected);
    }

    /// 工位索引 < 1 在构造时被拒绝
    #[test]
    fn station_below_one_rejected(station in -10_000i64..1) {
        prop_assert!(StationIndex::new(station).is_err());
    }

    /// MoveC 编码后可以解析回相同的命令
    #[test]
    fn move_c_roundtrip(
        profile in 1i64..100,
        values in prop::array::uniform6(finite()),
    ) {
        let cmd = Command::MoveC {
            profile: ProfileIndex::new(profile).unwrap(),
            pose: CartesianPose::from_array(values).unwrap(),
        };
        prop_assert_eq!(Command::parse(&cmd.encode()).unwrap(), cmd);
    }

    /// 位姿经过线格式后完全一致
    #[test]
    fn cartesian_reply_roundtrip(values in prop::array::uniform6(finite())) {
        let pose = CartesianPose::from_array(values).unwrap();
        let line = std::iter::once("0".to_string())
            .chain(pose.to_array().map(format_number))
            .collect::<Vec<_>>()
            .join(" ");
        let decoded = Reply::parse(&line).unwrap().cartesian_pose().unwrap().unwrap();
        prop_assert_eq!(decoded, pose);
    }

    /// MoveJ 编码后可以解析回相同的命令
    #[test]
    fn move_j_roundtrip(
        profile in 1i64..100,
        angles in prop::collection::vec(-360.0..360.0f64, 1..10),
    ) {
        let cmd = Command::MoveJ {
            profile: ProfileIndex::new(profile).unwrap(),
            pose: JointPose::new(angles).unwrap(),
        };
        prop_assert_eq!(Command::parse(&cmd.encode()).unwrap(), cmd);
    }

    /// 字段数不是 6 的笛卡尔应答一律是解码错误，不会截断或补齐
    #[test]
    fn cartesian_reply_wrong_arity_rejected(
        values in prop::collection::vec(finite(), 0..12)
            .prop_filter("exactly six is valid", |v| v.len() != 6),
    ) {
        let mut line = "0".to_string();
        for v in &values {
            line.push(' ');
            line.push_str(&format_number(*v));
        }
        let reply = Reply::parse(&line).unwrap();
        let err = reply.cartesian_pose().unwrap_err();
        prop_assert_eq!(err.line, line);
    }

    /// 关节应答的字段数必须等于配置的关节数
    #[test]
    fn joint_reply_arity(count in 1usize..10, configured in 1usize..10) {
        let line = std::iter::once("0".to_string())
            .chain((0..count).map(|i| format_number(i as f64)))
            .collect::<Vec<_>>()
            .join(" ");
        let result = Reply::parse(&line).unwrap().joint_pose(configured);
        prop_assert_eq!(result.is_ok(), count == configured);
    }
}
