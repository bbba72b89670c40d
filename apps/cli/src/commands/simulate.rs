//! 本地模拟控制器
//!
//! 在 TCP 端口上运行一个模拟控制器，便于在没有真实硬件时试用其他命令。

use anyhow::{Context, Result};
use clap::Args;
use labarm_sdk::client::SimulatedController;
use tokio::net::TcpListener;
use tracing::info;

/// 模拟控制器参数
#[derive(Args, Debug)]
pub struct SimulateCommand {
    /// 监听地址
    #[arg(long, default_value = "127.0.0.1:10100")]
    pub listen: String,

    /// 关节数
    #[arg(long, default_value_t = 6)]
    pub joint_count: usize,

    /// 初始放有料板的工位，逗号分隔
    #[arg(long, value_delimiter = ',')]
    pub plates: Vec<u32>,
}

impl SimulateCommand {
    pub fn controller(&self) -> SimulatedController {
        self.plates
            .iter()
            .fold(SimulatedController::with_joint_count(self.joint_count), |sim, &station| {
                sim.with_plate(station)
            })
    }

    pub async fn execute(&self) -> Result<()> {
        let listener = TcpListener::bind(self.listen.as_str())
            .await
            .with_context(|| format!("无法监听 {}", self.listen))?;
        info!("Simulated controller listening on {}", listener.local_addr()?);
        println!("🤖 模拟控制器已启动: {}（Ctrl+C 退出）", listener.local_addr()?);

        tokio::select! {
            result = self.controller().serve(listener) => {
                result.context("模拟控制器异常退出")?;
            },
            _ = tokio::signal::ctrl_c() => {
                println!("\n👋 已停止");
            },
        }
        Ok(())
    }
}
