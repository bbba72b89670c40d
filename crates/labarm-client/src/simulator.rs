//! 模拟控制器
//!
//! 按线协议应答请求，维护最小的控制器状态：当前/目标位姿、工位示教数据、
//! 工位上是否有料板、夹爪状态。不模拟运动学，`MoveC` 与 `MoveJ` 互不影响。
//!
//! 可以直接作为 [`MockTransport`](crate::mock::MockTransport) 的应答方，
//! 也可以通过 [`SimulatedController::serve`] 挂在真实 TCP 监听上。

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io;
use std::sync::Arc;

use labarm_protocol::{Command, DEFAULT_JOINT_COUNT, StationIndex, format_number};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

/// 工位示教记录
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaughtStation {
    /// 示教时的笛卡尔位姿 `[x, y, z, yaw, pitch, roll]`
    pub pose: [f64; 6],
    /// 最近一次示教时指定的退让量
    pub clearance: Option<f64>,
}

#[derive(Debug)]
struct SimState {
    cartesian: [f64; 6],
    joints: Vec<f64>,
    stations: BTreeMap<u32, TaughtStation>,
    plates: BTreeSet<u32>,
    holding: bool,
    gripper_closed: bool,
    loaded_file: Option<String>,
    stored_files: Vec<String>,
    faults: VecDeque<(String, i32, String)>,
    history: Vec<String>,
}

/// 模拟控制器（可克隆，克隆体共享状态）
#[derive(Debug, Clone)]
pub struct SimulatedController {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimulatedController {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedController {
    /// 6 轴、无料板、夹爪张开
    pub fn new() -> Self {
        Self::with_joint_count(DEFAULT_JOINT_COUNT)
    }

    pub fn with_joint_count(joint_count: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                cartesian: station_pose(0),
                joints: vec![0.0; joint_count],
                stations: BTreeMap::new(),
                plates: BTreeSet::new(),
                holding: false,
                gripper_closed: false,
                loaded_file: None,
                stored_files: Vec::new(),
                faults: VecDeque::new(),
                history: Vec::new(),
            })),
        }
    }

    /// 在工位上放一块料板
    pub fn with_plate(self, station: u32) -> Self {
        self.state.lock().plates.insert(station);
        self
    }

    /// 下一条匹配动词（大小写不敏感）的命令返回错误
    pub fn fail_next(&self, verb: &str, code: i32, message: &str) {
        self.state
            .lock()
            .faults
            .push_back((verb.to_ascii_lowercase(), code, message.to_string()));
    }

    pub fn has_plate(&self, station: u32) -> bool {
        self.state.lock().plates.contains(&station)
    }

    pub fn is_holding(&self) -> bool {
        self.state.lock().holding
    }

    pub fn is_gripper_closed(&self) -> bool {
        self.state.lock().gripper_closed
    }

    pub fn taught(&self, station: u32) -> Option<TaughtStation> {
        self.state.lock().stations.get(&station).copied()
    }

    pub fn current_cartesian(&self) -> [f64; 6] {
        self.state.lock().cartesian
    }

    pub fn loaded_file(&self) -> Option<String> {
        self.state.lock().loaded_file.clone()
    }

    pub fn stored_files(&self) -> Vec<String> {
        self.state.lock().stored_files.clone()
    }

    /// 收到的所有请求行
    pub fn history(&self) -> Vec<String> {
        self.state.lock().history.clone()
    }

    /// 处理一行请求，返回应答行
    pub fn handle_line(&self, line: &str) -> String {
        let mut state = self.state.lock();
        state.history.push(line.to_string());

        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(e) => return error_reply(-1, &e.reason),
        };

        let verb = command.verb().to_ascii_lowercase();
        if let Some(pos) = state.faults.iter().position(|(v, _, _)| *v == verb) {
            if let Some((_, code, message)) = state.faults.remove(pos) {
                return error_reply(code, &message);
            }
        }

        state.apply(command)
    }

    /// 在 TCP 监听上依次服务连接，直到监听出错
    pub async fn serve(self, listener: TcpListener) -> io::Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            info!("Simulated controller accepted {}", peer);
            if let Err(e) = self.serve_connection(stream).await {
                debug!("Connection from {} ended: {}", peer, e);
            }
        }
    }

    /// 服务单个连接，直到对端关闭
    pub async fn serve_connection(&self, stream: TcpStream) -> io::Result<()> {
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();
        while let Some(line) = lines.next_line().await? {
            let reply = self.handle_line(line.trim_end_matches('\r'));
            write_half.write_all(reply.as_bytes()).await?;
            write_half.write_all(b"\n").await?;
        }
        Ok(())
    }
}

impl SimState {
    fn apply(&mut self, command: Command) -> String {
        match command {
            Command::LoadFile { path } => {
                self.loaded_file = Some(path);
                ok_reply(&[])
            },
            Command::StoreFile { path } => {
                self.stored_files.push(path);
                ok_reply(&[])
            },
            Command::TeachPlate { station, clearance } => {
                let previous = self.stations.get(&station.get()).and_then(|t| t.clearance);
                self.stations.insert(
                    station.get(),
                    TaughtStation {
                        pose: self.cartesian,
                        clearance: clearance.map(|c| c.get()).or(previous),
                    },
                );
                ok_reply(&[])
            },
            Command::Move { station, .. } => {
                self.move_to_station(station);
                ok_reply(&[])
            },
            Command::MoveC { pose, .. } => {
                self.cartesian = pose.to_array();
                ok_reply(&[])
            },
            Command::MoveJ { pose, .. } => {
                if pose.len() != self.joints.len() {
                    return error_reply(-1, "Joint count mismatch");
                }
                self.joints = pose.into_vec();
                ok_reply(&[])
            },
            Command::WhereC | Command::DestC => values_reply(&self.cartesian),
            Command::WhereJ | Command::DestJ => values_reply(&self.joints),
            Command::PickPlate { station, .. } => {
                if self.gripper_closed {
                    return error_reply(-3102, "Gripper closed");
                }
                self.move_to_station(station);
                if self.plates.remove(&station.get()) {
                    self.gripper_closed = true;
                    self.holding = true;
                    ok_reply(&["-1"])
                } else {
                    ok_reply(&["0"])
                }
            },
            Command::PlacePlate { station, .. } => {
                if self.holding && self.plates.contains(&station.get()) {
                    return error_reply(-3101, "Station occupied");
                }
                self.move_to_station(station);
                if self.holding {
                    self.holding = false;
                    self.plates.insert(station.get());
                    ok_reply(&["-1"])
                } else {
                    ok_reply(&["0"])
                }
            },
            Command::ReleasePlate { .. } => {
                self.gripper_closed = false;
                if self.holding {
                    // 在半空中张开夹爪，料板掉落
                    self.holding = false;
                }
                ok_reply(&[])
            },
            Command::Nop => ok_reply(&[]),
        }
    }

    fn move_to_station(&mut self, station: StationIndex) {
        self.cartesian = self
            .stations
            .get(&station.get())
            .map(|t| t.pose)
            .unwrap_or_else(|| station_pose(station.get()));
    }
}

/// 未示教工位的位姿：沿 x 轴每 100mm 一个
fn station_pose(station: u32) -> [f64; 6] {
    [f64::from(station) * 100.0, 0.0, 200.0, 0.0, 90.0, 0.0]
}

fn ok_reply(fields: &[&str]) -> String {
    let mut line = String::from("0");
    for field in fields {
        line.push(' ');
        line.push_str(field);
    }
    line
}

fn error_reply(code: i32, message: &str) -> String {
    format!("{code} *{message}*")
}

fn values_reply(values: &[f64]) -> String {
    let mut line = String::from("0");
    for &value in values {
        line.push(' ');
        line.push_str(&format_number(value));
    }
    line
}
