//! 工作流场景测试
//!
//! 使用模拟控制器（通过 mock 传输）验证完整的抓取 / 放置序列和线上命令顺序。

use labarm_sdk::client::{MockTransport, SimulatedController};
use labarm_sdk::control::{FailureCause, Step};
use labarm_sdk::prelude::*;
use labarm_sdk::ProtocolClient;

fn robot(sim: &SimulatedController) -> Robot<MockTransport> {
    let (transport, _handle) = MockTransport::simulated(sim.clone());
    Robot::new(ProtocolClient::new(transport), WorkflowConfig::default())
}

fn pick(station: i64, teach: bool) -> PickRequest {
    PickRequest {
        station,
        enable_compliance: true,
        percent_torque: 20,
        teach,
        clearance: 10.0,
    }
}

fn place(station: i64, teach: bool) -> PlaceRequest {
    PlaceRequest {
        station,
        enable_compliance: true,
        percent_torque: 20,
        open_width: 20.0,
        percent_speed: 10,
        teach,
        clearance: 10.0,
    }
}

/// 典型序列：从工位 4 抓取，放到工位 8 并示教
#[tokio::test]
async fn test_pick_then_place_with_teach() {
    let sim = SimulatedController::new().with_plate(4);
    let robot = robot(&sim);

    let report = robot.pick_tray(&pick(4, false)).await.unwrap();
    assert_eq!(report.grasp, Some(GraspOutcome::Success));
    assert_eq!(report.state, WorkflowState::Completed);

    let report = robot.place_tray(&place(8, true)).await.unwrap();
    assert_eq!(report.state, WorkflowState::Completed);
    assert_eq!(
        report.steps,
        vec![Step::Placed, Step::Taught, Step::Released]
    );

    assert_eq!(
        sim.history(),
        vec![
            "PickPlate 4 1 20",
            "PlacePlate 8 1 20",
            "TeachPlate 8 10",
            "ReleasePlate 20 10",
        ]
    );
    assert!(sim.has_plate(8));
    assert!(!sim.is_gripper_closed());
    assert_eq!(sim.taught(8).unwrap().clearance, Some(10.0));
}

/// 空工位抓取：CompletedWithWarning，不示教
#[tokio::test]
async fn test_pick_from_empty_station_warns() {
    let sim = SimulatedController::new();
    let robot = robot(&sim);

    let report = robot.pick_tray(&pick(4, true)).await.unwrap();
    assert_eq!(report.state, WorkflowState::CompletedWithWarning);
    assert_eq!(report.grasp, Some(GraspOutcome::NoObjectDetected));
    assert_eq!(sim.history(), vec!["PickPlate 4 1 20"]);
    assert!(sim.taught(4).is_none());
}

/// 放置时示教失败：不释放，报告 "placed but not taught"
#[tokio::test]
async fn test_teach_failure_during_place_keeps_gripper_closed() {
    let sim = SimulatedController::new().with_plate(4);
    let robot = robot(&sim);
    robot.pick_tray(&pick(4, false)).await.unwrap();

    sim.fail_next("TeachPlate", -2800, "Teach failed");
    let err = robot.place_tray(&place(8, true)).await.unwrap_err();

    assert_eq!(err.failed_in, WorkflowState::Teaching);
    assert_eq!(err.last_completed(), Some(Step::Placed));
    assert_eq!(
        err.partial_completion().as_deref(),
        Some("placed but not taught")
    );
    match &err.cause {
        FailureCause::Robot(RobotError::Controller(fault)) => assert_eq!(fault.code, -2800),
        other => panic!("Expected controller fault, got {:?}", other),
    }
    assert!(sim.is_gripper_closed());
    assert!(format!("{}", err).contains("placed but not taught"));
}

/// 移动后查询当前 / 目标位姿
#[tokio::test]
async fn test_move_then_query() {
    let sim = SimulatedController::new();
    let robot = robot(&sim);

    let target = CartesianPose::new(150.0, -25.5, 300.0, 0.0, 90.0, 45.0).unwrap();
    robot.move_cart(1, target).await.unwrap();
    assert_eq!(robot.current_pose_cartesian().await.unwrap(), target);
    assert_eq!(robot.goal_pose_cartesian().await.unwrap(), target);

    let joints = JointPose::new(vec![0.0, -45.0, 90.0, 0.0, 45.0, 0.0]).unwrap();
    robot.move_joints(2, joints.clone()).await.unwrap();
    assert_eq!(robot.current_pose_joints().await.unwrap(), joints);
    assert_eq!(robot.goal_pose_joints().await.unwrap(), joints);
}

/// 示教后移动到工位会回到示教位置
#[tokio::test]
async fn test_teach_then_go_to_station() {
    let sim = SimulatedController::new();
    let robot = robot(&sim);

    let taught = CartesianPose::new(10.0, 20.0, 30.0, 0.0, 90.0, 0.0).unwrap();
    robot.move_cart(1, taught).await.unwrap();
    robot.teach_plate_pos(5, 0.0).await.unwrap();
    robot.go_to_station(1, 1).await.unwrap();
    robot.go_to_station(5, 1).await.unwrap();

    assert_eq!(robot.current_pose_cartesian().await.unwrap(), taught);
    assert!(sim.history().contains(&"TeachPlate 5".to_string()));
}

/// 7 轴机器人：关节查询按配置的关节数解码
#[tokio::test]
async fn test_seven_axis_robot() {
    let sim = SimulatedController::with_joint_count(7);
    let (transport, _handle) = MockTransport::simulated(sim.clone());
    let robot = Robot::new(
        ProtocolClient::new(transport),
        WorkflowConfig {
            joint_count: 7,
            max_stations: None,
        },
    );

    assert_eq!(robot.current_pose_joints().await.unwrap().len(), 7);

    let six = JointPose::new(vec![0.0; 6]).unwrap();
    let err = robot.move_joints(1, six).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(sim.history(), vec!["wherej"]);
}
