//! # LabArm CLI
//!
//! 文本行协议机械臂的命令行工具。
//!
//! 每个命令独立执行：读取配置 -> 连接控制器 -> 执行操作 -> 关闭会话。
//!
//! ```bash
//! # 写入默认配置，之后可以直接编辑 host / port
//! labarm-cli config init --host 192.168.0.1
//!
//! # 从工位 4 抓取，放到工位 8 并示教
//! labarm-cli pick 4 --compliance --torque 20
//! labarm-cli place 8 --compliance --torque 20 --width 20 --speed 10 --teach --clearance 10
//!
//! # 没有硬件时，在另一个终端运行模拟控制器
//! labarm-cli simulate --listen 127.0.0.1:10100 --plates 4
//! labarm-cli --host 127.0.0.1 where --joints
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use labarm_sdk::Robot;
use std::path::PathBuf;
use tracing::{info, warn};

mod commands;
mod settings;

use commands::{
    ConfigCommand, LoadFileCommand, MoveCartCommand, MoveJointsCommand, PickCommand, PlaceCommand,
    PositionsCommand, RobotCommand, SimulateCommand, StationCommand, StoreFileCommand,
    TeachCommand, WhereCommand,
};
use settings::ConnectionArgs;

/// LabArm CLI - 机械臂命令行工具
#[derive(Parser, Debug)]
#[command(name = "labarm-cli")]
#[command(about = "Command-line interface for line-protocol robot arm controllers", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件（默认 <config_dir>/labarm/config.toml）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 控制器地址（覆盖配置）
    #[arg(long, global = true)]
    host: Option<String>,

    /// 控制器端口（覆盖配置）
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 移动到工位
    Station(StationCommand),

    /// 移动到笛卡尔位姿
    MoveCart(MoveCartCommand),

    /// 移动到关节位姿
    MoveJoints(MoveJointsCommand),

    /// 查询当前 / 目标位姿
    Where(WhereCommand),

    /// 从工位抓取料板
    Pick(PickCommand),

    /// 把料板放到工位
    Place(PlaceCommand),

    /// 示教工位
    Teach(TeachCommand),

    /// 加载控制器上的工位文件
    LoadFile(LoadFileCommand),

    /// 保存工位数据到控制器上的文件
    StoreFile(StoreFileCommand),

    /// 离线检查本地位置文件
    Positions(PositionsCommand),

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 运行本地模拟控制器
    Simulate(SimulateCommand),
}

impl Cli {
    fn connection(&self) -> ConnectionArgs {
        ConnectionArgs {
            config: self.config.clone(),
            host: self.host.clone(),
            port: self.port,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志（RUST_LOG 优先）
    labarm_sdk::init_logger_with_default("warn,labarm_cli=info");

    let cli = Cli::parse();
    let connection = cli.connection();

    match &cli.command {
        // 不需要连接控制器的命令
        Commands::Config(cmd) => cmd.execute(&connection),
        Commands::Positions(cmd) => {
            let config = connection.resolve()?;
            cmd.execute(config.joint_count)
        },
        Commands::Simulate(cmd) => cmd.execute().await,

        // One-shot：连接 -> 执行 -> 关闭
        Commands::Station(cmd) => run_once(&connection, cmd).await,
        Commands::MoveCart(cmd) => run_once(&connection, cmd).await,
        Commands::MoveJoints(cmd) => run_once(&connection, cmd).await,
        Commands::Where(cmd) => run_once(&connection, cmd).await,
        Commands::Pick(cmd) => run_once(&connection, cmd).await,
        Commands::Place(cmd) => run_once(&connection, cmd).await,
        Commands::Teach(cmd) => run_once(&connection, cmd).await,
        Commands::LoadFile(cmd) => run_once(&connection, cmd).await,
        Commands::StoreFile(cmd) => run_once(&connection, cmd).await,
    }
}

async fn run_once(connection: &ConnectionArgs, command: &impl RobotCommand) -> Result<()> {
    let robot = connect(connection).await?;
    let result = command.execute(&robot).await;
    if let Err(e) = robot.close().await {
        warn!("Failed to close session: {}", e);
    }
    result
}

async fn connect(connection: &ConnectionArgs) -> Result<Robot> {
    let config = connection.resolve()?;
    println!("🔌 连接到 {}:{}...", config.host, config.port);
    let robot = Robot::connect(&config)
        .await
        .with_context(|| format!("连接控制器失败: {}:{}", config.host, config.port))?;

    // Ctrl+C 只阻止后续命令发出，已发出的命令仍等待应答
    let cancel = robot.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, remaining steps will not be sent");
            cancel.cancel();
        }
    });

    Ok(robot)
}
