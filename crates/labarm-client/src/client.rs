//! 协议客户端
//!
//! 在传输会话之上实现请求/应答关联：
//!
//! - **同一时刻最多一个未完成请求**：协议没有请求 ID，交错写入会破坏关联。
//!   第二个 `send` 会立即得到 [`RobotError::Busy`]，不会写出任何字节。
//! - **超时降级**：超时（或已发送的 `send` future 被丢弃）后会话被标记为 degraded，
//!   下一次操作必须先丢弃迟到的应答并用 `nop` 确认会话存活；
//!   `nop` 应答之后仍有多余的行到达，说明读到的是迟到的应答，需要重新探测。
//! - **断开**：返回 [`RobotError::Disconnected`]，不自动重连。

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use labarm_protocol::{CartesianPose, Command, GraspOutcome, JointPose, Reply, ReplyKind};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::RobotError;
use crate::transport::{LineTransport, TransportError};

/// 存活探测时最多丢弃的迟到应答行数
const MAX_STALE_LINES: usize = 32;

/// 重新对齐时最多发送的 `nop` 次数
const MAX_RESYNC_ATTEMPTS: usize = 3;

/// 客户端配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// 每条命令等待应答的超时时间
    ///
    /// 运动命令在动作完成后才应答，所以默认值较长。
    pub reply_timeout: Duration,
    /// 存活探测时等待迟到应答的时间
    pub drain_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            reply_timeout: Duration::from_secs(60),
            drain_timeout: Duration::from_millis(200),
        }
    }
}

/// 协议客户端
///
/// 独占一个传输会话。所有方法都只需要 `&self`，
/// 不同机器人的客户端之间没有共享状态，可以在同一个任务里并发驱动。
pub struct ProtocolClient<T: LineTransport> {
    transport: Mutex<T>,
    config: ClientConfig,
    degraded: AtomicBool,
    disconnected: AtomicBool,
}

impl<T: LineTransport> ProtocolClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    pub fn with_config(transport: T, config: ClientConfig) -> Self {
        Self {
            transport: Mutex::new(transport),
            config,
            degraded: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 上一次请求没有收到应答，下一次操作前会先做存活探测
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Acquire)
    }

    /// 发送一条命令并等待它的应答
    ///
    /// # Errors
    /// - `RobotError::Busy`: 已有请求在等待应答（没有写出任何字节）
    /// - `RobotError::Timeout`: 超时，会话被标记为 degraded
    /// - `RobotError::Disconnected`: 连接已断开
    /// - `RobotError::Decode`: 应答行无法解析
    ///
    /// 控制器返回的负状态码不在这里报错，由调用方通过 [`Reply::check`] 处理。
    pub async fn send(&self, command: &Command) -> Result<Reply, RobotError> {
        let mut transport = self.transport.try_lock().map_err(|_| {
            debug!("Rejecting {}: another request is outstanding", command.verb());
            RobotError::Busy
        })?;
        if self.is_disconnected() {
            return Err(RobotError::Disconnected);
        }
        if self.is_degraded() {
            self.recover(&mut *transport).await?;
        }
        self.exchange(&mut *transport, command).await
    }

    /// 显式存活探测（`nop`，要求状态码为 0）
    pub async fn ping(&self) -> Result<(), RobotError> {
        self.request_ack(&Command::Nop).await
    }

    /// 发送只需确认的命令
    pub async fn request_ack(&self, command: &Command) -> Result<(), RobotError> {
        debug_assert_eq!(command.reply_kind(), ReplyKind::Ack);
        let reply = self.send(command).await?;
        reply.check()?;
        Ok(())
    }

    /// 发送笛卡尔位姿查询
    pub async fn request_cartesian(&self, command: &Command) -> Result<CartesianPose, RobotError> {
        debug_assert_eq!(command.reply_kind(), ReplyKind::Cartesian);
        let reply = self.send(command).await?;
        Ok(reply.cartesian_pose()??)
    }

    /// 发送关节位姿查询，应答必须恰好包含 `joint_count` 个关节
    pub async fn request_joints(
        &self,
        command: &Command,
        joint_count: usize,
    ) -> Result<JointPose, RobotError> {
        debug_assert_eq!(command.reply_kind(), ReplyKind::Joints);
        let reply = self.send(command).await?;
        Ok(reply.joint_pose(joint_count)??)
    }

    /// 发送抓取/放置命令，返回三态结果
    ///
    /// 控制器的负状态码作为 `GraspOutcome::ProtocolError` 返回，而不是错误。
    pub async fn request_grasp(&self, command: &Command) -> Result<GraspOutcome, RobotError> {
        debug_assert_eq!(command.reply_kind(), ReplyKind::Grasp);
        let reply = self.send(command).await?;
        Ok(reply.grasp_outcome()?)
    }

    /// 关闭会话，之后的所有请求都返回 `Disconnected`
    pub async fn close(&self) -> Result<(), RobotError> {
        let mut transport = self.transport.try_lock().map_err(|_| RobotError::Busy)?;
        if self.disconnected.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        info!("Closing robot session");
        transport
            .close()
            .await
            .map_err(|e| self.transport_failure(e, "close"))
    }

    // ===== 内部实现 =====

    /// 写请求并读取应答
    async fn exchange(&self, transport: &mut T, command: &Command) -> Result<Reply, RobotError> {
        let verb = command.verb();
        let line = command.encode();
        debug!(">> {}", line);

        let pending = PendingReply::arm(&self.degraded);
        transport
            .write_line(&line)
            .await
            .map_err(|e| self.transport_failure(e, verb))?;
        let raw = transport
            .read_line(self.config.reply_timeout)
            .await
            .map_err(|e| self.transport_failure(e, verb))?;
        pending.disarm();

        debug!("<< {}", raw);
        Ok(Reply::parse(&raw)?)
    }

    /// 存活探测：丢弃迟到的应答，再用 `nop` 确认请求/应答重新对齐
    ///
    /// `nop` 的应答之后不能再有任何行到达，否则刚才读到的 `0` 可能是
    /// 超时命令的迟到应答，真正的 `nop` 应答会被下一条命令当成自己的。
    async fn recover(&self, transport: &mut T) -> Result<(), RobotError> {
        warn!("Session degraded, confirming liveness before next command");

        for attempt in 1..=MAX_RESYNC_ATTEMPTS {
            self.drain_stale(transport).await?;

            let reply = self.exchange(transport, &Command::Nop).await?;
            reply.check()?;

            let extra = self.drain_stale(transport).await?;
            if extra == 0 {
                self.degraded.store(false, Ordering::Release);
                info!("Session liveness confirmed");
                return Ok(());
            }
            warn!(
                "{} extra line(s) after nop, reply stream misaligned (attempt {}/{})",
                extra, attempt, MAX_RESYNC_ATTEMPTS
            );
        }

        error!("Could not realign replies after {} nop attempts", MAX_RESYNC_ATTEMPTS);
        Err(RobotError::Misaligned {
            attempts: MAX_RESYNC_ATTEMPTS,
        })
    }

    /// 在 `drain_timeout` 内丢弃已到达的行，返回丢弃的行数
    async fn drain_stale(&self, transport: &mut T) -> Result<usize, RobotError> {
        let mut drained = 0;
        while drained < MAX_STALE_LINES {
            match transport.read_line(self.config.drain_timeout).await {
                Ok(stale) => {
                    debug!("Discarding stale reply: {}", stale);
                    drained += 1;
                },
                Err(TransportError::Timeout) => break,
                Err(e) => return Err(self.transport_failure(e, "nop")),
            }
        }
        Ok(drained)
    }

    fn transport_failure(&self, err: TransportError, verb: &'static str) -> RobotError {
        match err {
            TransportError::Timeout => {
                warn!(
                    "No reply to {} within {:?}, session marked degraded",
                    verb, self.config.reply_timeout
                );
                RobotError::Timeout {
                    verb,
                    timeout: self.config.reply_timeout,
                }
            },
            TransportError::Disconnected => {
                error!("Controller disconnected during {}", verb);
                self.disconnected.store(true, Ordering::Release);
                RobotError::Disconnected
            },
            TransportError::Io(e) => {
                error!("IO error during {}: {}", verb, e);
                RobotError::Io(e)
            },
        }
    }
}

/// 已写出请求、尚未收到应答
///
/// 在 `disarm` 之前被丢弃（超时、IO 错误或 future 被取消）会把会话标记为 degraded。
struct PendingReply<'a> {
    degraded: &'a AtomicBool,
    armed: bool,
}

impl<'a> PendingReply<'a> {
    fn arm(degraded: &'a AtomicBool) -> Self {
        Self {
            degraded,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.degraded.store(true, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockReply, MockTransport};
    use labarm_protocol::{Percent, ProfileIndex, StationIndex};

    fn move_cmd() -> Command {
        Command::Move {
            station: StationIndex::new(1).unwrap(),
            profile: ProfileIndex::new(1).unwrap(),
        }
    }

    fn fast_config() -> ClientConfig {
        ClientConfig {
            reply_timeout: Duration::from_millis(50),
            drain_timeout: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_send_writes_line_and_parses_reply() {
        let (transport, handle) = MockTransport::new();
        handle.push_reply("0 1 2 3 4 5 6");
        let client = ProtocolClient::new(transport);

        let pose = client.request_cartesian(&Command::WhereC).await.unwrap();
        assert_eq!(pose.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(handle.written(), vec!["wherec"]);
    }

    #[tokio::test]
    async fn test_second_send_while_pending_is_busy() {
        let (transport, handle) = MockTransport::new();
        handle.push(MockReply::Delayed(Duration::from_millis(30), "0".to_string()));
        let client = ProtocolClient::new(transport);

        let cmd = move_cmd();
        let first = client.send(&cmd);
        let second = async {
            tokio::task::yield_now().await;
            client.send(&Command::WhereC).await
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert!(matches!(second, Err(RobotError::Busy)));
        // 第二条命令没有写出任何字节
        assert_eq!(handle.written(), vec!["Move 1 1"]);
    }

    #[tokio::test]
    async fn test_timeout_degrades_and_next_call_checks_liveness() {
        let (transport, handle) = MockTransport::new();
        handle.push(MockReply::Timeout);
        let client = ProtocolClient::with_config(transport, fast_config());

        let err = client.send(&move_cmd()).await.unwrap_err();
        assert!(matches!(err, RobotError::Timeout { verb: "Move", .. }));
        assert!(client.is_degraded());

        handle.push_reply("0");
        handle.push_reply("0 1 2 3 4 5 6");
        client.request_cartesian(&Command::WhereC).await.unwrap();

        assert!(!client.is_degraded());
        assert_eq!(handle.written(), vec!["Move 1 1", "nop", "wherec"]);
    }

    #[tokio::test]
    async fn test_stale_reply_is_drained_before_nop() {
        let (transport, handle) = MockTransport::new();
        // 应答在超时之后、下一次请求之前到达
        handle.push(MockReply::Delayed(
            Duration::from_millis(100),
            "0".to_string(),
        ));
        let config = ClientConfig {
            reply_timeout: Duration::from_millis(30),
            drain_timeout: Duration::from_millis(200),
        };
        let client = ProtocolClient::with_config(transport, config);

        assert!(client.send(&move_cmd()).await.is_err());

        handle.push_reply("0");
        handle.push_reply("0 9 9 9 9 9 9");
        let pose = client.request_cartesian(&Command::WhereC).await.unwrap();
        assert_eq!(pose.x(), 9.0);
        assert_eq!(handle.written(), vec!["Move 1 1", "nop", "wherec"]);
    }

    /// 迟到的应答在排空窗口之后、`nop` 应答之前到达
    #[tokio::test]
    async fn test_late_reply_after_drain_does_not_shift_replies() {
        let (transport, handle) = MockTransport::new();
        handle.push(MockReply::Delayed(
            Duration::from_millis(260),
            "0".to_string(),
        ));
        let config = ClientConfig {
            reply_timeout: Duration::from_millis(200),
            drain_timeout: Duration::from_millis(10),
        };
        let client = ProtocolClient::with_config(transport, config);
        assert!(client.send(&move_cmd()).await.is_err());

        // 两次 nop，然后是空工位上的抓取
        handle.push_reply("0");
        handle.push_reply("0");
        handle.push_reply("0 0");
        let pick = Command::PickPlate {
            station: StationIndex::new(4).unwrap(),
            compliance: true,
            torque: Percent::new("torque", 20).unwrap(),
        };
        let outcome = client.request_grasp(&pick).await.unwrap();

        assert_eq!(outcome, GraspOutcome::NoObjectDetected);
        assert!(!client.is_degraded());
        assert_eq!(
            handle.written(),
            vec!["Move 1 1", "nop", "nop", "PickPlate 4 1 20"]
        );
    }

    #[tokio::test]
    async fn test_persistent_extra_lines_fail_realignment() {
        let (transport, handle) = MockTransport::new();
        handle.push(MockReply::Timeout);
        let client = ProtocolClient::with_config(transport, fast_config());
        assert!(client.send(&move_cmd()).await.is_err());

        // 每个 nop 之后都多出一行
        for _ in 0..MAX_RESYNC_ATTEMPTS {
            handle.push(MockReply::Lines(vec!["0".to_string(), "0".to_string()]));
        }
        let err = client.send(&Command::WhereC).await.unwrap_err();
        assert!(matches!(err, RobotError::Misaligned { attempts: 3 }));
        assert!(client.is_degraded());
        assert!(!handle.written().contains(&"wherec".to_string()));
    }

    #[tokio::test]
    async fn test_failed_liveness_check_keeps_session_degraded() {
        let (transport, handle) = MockTransport::new();
        handle.push(MockReply::Timeout);
        let client = ProtocolClient::with_config(transport, fast_config());
        assert!(client.send(&move_cmd()).await.is_err());

        handle.push_reply("-1 *Not ready*");
        let err = client.send(&Command::WhereC).await.unwrap_err();
        assert!(matches!(err, RobotError::Controller(_)));
        assert!(client.is_degraded());
        assert_eq!(handle.written(), vec!["Move 1 1", "nop"]);
    }

    #[tokio::test]
    async fn test_dropped_send_after_write_degrades_session() {
        let (transport, handle) = MockTransport::new();
        handle.push(MockReply::Delayed(Duration::from_secs(5), "0".to_string()));
        let client = ProtocolClient::new(transport);

        let result = tokio::time::timeout(Duration::from_millis(20), client.send(&move_cmd())).await;
        assert!(result.is_err());
        assert!(client.is_degraded());
    }

    #[tokio::test]
    async fn test_disconnect_is_sticky() {
        let (transport, handle) = MockTransport::new();
        handle.push(MockReply::Disconnect);
        let client = ProtocolClient::new(transport);

        let err = client.send(&move_cmd()).await.unwrap_err();
        assert!(matches!(err, RobotError::Disconnected));
        assert!(client.is_disconnected());

        let err = client.send(&Command::WhereC).await.unwrap_err();
        assert!(matches!(err, RobotError::Disconnected));
        assert_eq!(handle.written(), vec!["Move 1 1"]);
    }

    #[tokio::test]
    async fn test_peer_disconnect_while_idle() {
        let (transport, handle) = MockTransport::new();
        handle.push_reply("0");
        let client = ProtocolClient::new(transport);
        client.ping().await.unwrap();

        handle.disconnect();
        assert!(matches!(client.ping().await, Err(RobotError::Disconnected)));
        assert!(client.is_disconnected());
        assert_eq!(handle.written(), vec!["nop"]);
    }

    #[tokio::test]
    async fn test_decode_error_keeps_session_healthy() {
        let (transport, handle) = MockTransport::new();
        handle.push_reply("0 1 2 3 4 5");
        let client = ProtocolClient::new(transport);

        let err = client.request_cartesian(&Command::WhereC).await.unwrap_err();
        match err {
            RobotError::Decode(e) => assert_eq!(e.line, "0 1 2 3 4 5"),
            other => panic!("Expected Decode, got {:?}", other),
        }
        assert!(!client.is_degraded());
    }

    #[tokio::test]
    async fn test_controller_error_on_ack() {
        let (transport, handle) = MockTransport::new();
        handle.push_reply("-1012 *Joint out-of-range*");
        let client = ProtocolClient::new(transport);

        let err = client.request_ack(&move_cmd()).await.unwrap_err();
        match err {
            RobotError::Controller(fault) => assert_eq!(fault.code, -1012),
            other => panic!("Expected Controller, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_close_then_send_is_disconnected() {
        let (transport, handle) = MockTransport::new();
        let client = ProtocolClient::new(transport);

        client.close().await.unwrap();
        assert!(handle.is_closed());
        assert!(matches!(
            client.ping().await,
            Err(RobotError::Disconnected)
        ));
    }
}
