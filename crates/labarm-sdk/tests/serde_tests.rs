//! 位姿类型的 serde 支持（`serde` 特性）
//!
//! 位姿序列化为数值数组，反序列化时重新做有限值与长度校验。

use labarm_sdk::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct SavedPoses {
    home: CartesianPose,
    ready: JointPose,
}

#[test]
fn test_poses_load_from_toml_arrays() {
    let saved: SavedPoses = toml::from_str(
        "home = [100.0, 0.0, 200.5, 0.0, 90.0, 0.0]\nready = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0]\n",
    )
    .unwrap();

    assert_eq!(saved.home.to_array(), [100.0, 0.0, 200.5, 0.0, 90.0, 0.0]);
    assert_eq!(saved.ready.len(), 7);

    let text = toml::to_string(&saved).unwrap();
    assert!(text.contains("home = [100.0, 0.0, 200.5, 0.0, 90.0, 0.0]"), "{}", text);
    assert_eq!(toml::from_str::<SavedPoses>(&text).unwrap(), saved);
}

#[test]
fn test_invalid_poses_are_rejected_on_load() {
    // 笛卡尔位姿少一个分量
    let err = toml::from_str::<SavedPoses>("home = [1.0, 2.0, 3.0, 4.0, 5.0]\nready = [0.0]\n");
    assert!(err.is_err());

    // 非有限值
    let err = toml::from_str::<SavedPoses>(
        "home = [1.0, 2.0, 3.0, 4.0, 5.0, nan]\nready = [0.0]\n",
    );
    assert!(err.is_err());

    // 空关节列表
    let err = toml::from_str::<SavedPoses>("home = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]\nready = []\n");
    assert!(err.is_err());
}
