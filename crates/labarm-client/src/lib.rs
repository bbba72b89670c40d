//! # LabArm Client
//!
//! 机械臂控制器的会话与请求/应答客户端
//!
//! ## 模块
//!
//! - `transport`: 行传输接口 [`LineTransport`] 与 TCP 实现
//! - `client`: [`ProtocolClient`]，同一会话上最多一个未完成请求
//! - `builder`: [`ClientBuilder`]，链式建立 TCP 会话
//! - `config`: [`RobotConfig`]，TOML 配置
//! - `mock` / `simulator`: 无硬件测试（feature `mock`）
//!
//! # Example
//!
//! ```no_run
//! use labarm_client::ClientBuilder;
//! use labarm_protocol::Command;
//!
//! # async fn run() -> Result<(), labarm_client::RobotError> {
//! let client = ClientBuilder::new().host("192.168.0.1").connect().await?;
//! let pose = client.request_cartesian(&Command::WhereC).await?;
//! println!("x = {}", pose.x());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
#[cfg(any(test, feature = "mock"))]
pub mod simulator;

pub use builder::ClientBuilder;
pub use client::{ClientConfig, ProtocolClient};
pub use config::{ConfigError, RobotConfig};
pub use error::RobotError;
pub use transport::{LineTransport, TcpTransport, TransportError};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockHandle, MockReply, MockTransport};
#[cfg(any(test, feature = "mock"))]
pub use simulator::{SimulatedController, TaughtStation};
