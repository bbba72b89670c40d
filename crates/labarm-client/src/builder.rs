//! Builder 模式实现
//!
//! 提供链式构造 `ProtocolClient<TcpTransport>` 的便捷方式。

use std::time::Duration;

use tracing::info;

use crate::client::{ClientConfig, ProtocolClient};
use crate::config::RobotConfig;
use crate::error::RobotError;
use crate::transport::{TcpTransport, TransportError};

/// 客户端 Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use labarm_client::ClientBuilder;
/// use std::time::Duration;
///
/// # async fn run() -> Result<(), labarm_client::RobotError> {
/// let client = ClientBuilder::new()
///     .host("192.168.0.1")
///     .port(10100)
///     .reply_timeout(Duration::from_secs(30))
///     .connect()
///     .await?;
/// client.ping().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    host: String,
    port: u16,
    connect_timeout: Duration,
    client_config: ClientConfig,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// 使用 [`RobotConfig::default`] 的地址和超时
    pub fn new() -> Self {
        Self::from_config(&RobotConfig::default())
    }

    pub fn from_config(config: &RobotConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            connect_timeout: config.connect_timeout(),
            client_config: config.client_config(),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// 单条命令等待应答的超时
    pub fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.client_config.reply_timeout = timeout;
        self
    }

    /// 存活探测时等待迟到应答的时间
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.client_config.drain_timeout = timeout;
        self
    }

    /// 建立连接
    ///
    /// # Errors
    /// - `RobotError::Timeout`: 连接超时
    /// - `RobotError::Disconnected` / `RobotError::Io`: 连接失败
    pub async fn connect(self) -> Result<ProtocolClient<TcpTransport>, RobotError> {
        let transport = TcpTransport::connect(&self.host, self.port, self.connect_timeout)
            .await
            .map_err(|e| match e {
                TransportError::Timeout => RobotError::Timeout {
                    verb: "connect",
                    timeout: self.connect_timeout,
                },
                TransportError::Disconnected => RobotError::Disconnected,
                TransportError::Io(e) => RobotError::Io(e),
            })?;
        info!("Connected to robot controller at {}", transport.peer_addr());
        Ok(ProtocolClient::with_config(transport, self.client_config))
    }
}
