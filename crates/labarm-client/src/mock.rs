//! Mock 传输（用于无硬件测试）
//!
//! 行为模拟真实控制器：每次 `write_line` 时按脚本（或 [`SimulatedController`]）
//! 产生应答，放入收件箱；`read_line` 按真实时间从收件箱取出。
//! 所以迟到的应答会在超时之后、下一次请求之前"到达"。
//!
//! 共享状态使用 `parking_lot::Mutex`，锁从不跨越 `.await`。

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::simulator::SimulatedController;
use crate::transport::{LineTransport, TransportError};

/// 脚本化的应答
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// 立即应答
    Line(String),
    /// 延迟应答
    Delayed(Duration, String),
    /// 一次请求产生多行（多出的行模拟错位的应答流）
    Lines(Vec<String>),
    /// 永远不应答
    Timeout,
    /// 应答前断开连接
    Disconnect,
}

#[derive(Debug)]
enum Inbound {
    Line { ready_at: Instant, line: String },
    Disconnect,
}

#[derive(Default)]
struct MockState {
    script: VecDeque<MockReply>,
    inbox: VecDeque<Inbound>,
    written: Vec<String>,
    simulator: Option<SimulatedController>,
    disconnected: bool,
    closed: bool,
}

/// Mock 传输
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

/// 测试侧句柄：预置应答、检查写出的行
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// 脚本模式：没有预置应答的请求不会收到应答
    pub fn new() -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: state.clone(),
            },
            MockHandle { state },
        )
    }

    /// 模拟控制器模式：脚本为空时由模拟控制器应答
    pub fn simulated(simulator: SimulatedController) -> (Self, MockHandle) {
        let (transport, handle) = Self::new();
        transport.state.lock().simulator = Some(simulator);
        (transport, handle)
    }
}

impl MockHandle {
    /// 追加一条立即应答
    pub fn push_reply(&self, line: impl Into<String>) {
        self.push(MockReply::Line(line.into()));
    }

    pub fn push(&self, reply: MockReply) {
        self.state.lock().script.push_back(reply);
    }

    /// 到目前为止写出的所有行
    pub fn written(&self) -> Vec<String> {
        self.state.lock().written.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// 模拟对端断开（之后的读写都返回 `Disconnected`）
    pub fn disconnect(&self) {
        self.state.lock().disconnected = true;
    }
}

impl LineTransport for MockTransport {
    async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if state.disconnected || state.closed {
            return Err(TransportError::Disconnected);
        }
        state.written.push(line.to_string());

        let now = Instant::now();
        let reply = match state.script.pop_front() {
            Some(reply) => Some(reply),
            None => state
                .simulator
                .as_ref()
                .map(|sim| MockReply::Line(sim.handle_line(line))),
        };
        match reply {
            Some(MockReply::Line(line)) => state.inbox.push_back(Inbound::Line {
                ready_at: now,
                line,
            }),
            Some(MockReply::Delayed(delay, line)) => state.inbox.push_back(Inbound::Line {
                ready_at: now + delay,
                line,
            }),
            Some(MockReply::Lines(lines)) => state.inbox.extend(
                lines
                    .into_iter()
                    .map(|line| Inbound::Line { ready_at: now, line }),
            ),
            Some(MockReply::Disconnect) => state.inbox.push_back(Inbound::Disconnect),
            Some(MockReply::Timeout) | None => {},
        }
        Ok(())
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<String, TransportError> {
        let deadline = Instant::now() + timeout;
        let ready_at = {
            let mut state = self.state.lock();
            if state.disconnected {
                return Err(TransportError::Disconnected);
            }
            let front = state.inbox.front().map(|inbound| match inbound {
                Inbound::Line { ready_at, .. } => Some(*ready_at),
                Inbound::Disconnect => None,
            });
            match front {
                Some(Some(ready_at)) => Some(ready_at),
                Some(None) => {
                    state.inbox.pop_front();
                    state.disconnected = true;
                    return Err(TransportError::Disconnected);
                },
                None => None,
            }
        };

        match ready_at {
            Some(ready_at) if ready_at <= deadline => {
                tokio::time::sleep_until(ready_at).await;
                let mut state = self.state.lock();
                match state.inbox.pop_front() {
                    Some(Inbound::Line { line, .. }) => Ok(line),
                    _ => Err(TransportError::Disconnected),
                }
            },
            _ => {
                tokio::time::sleep_until(deadline).await;
                Err(TransportError::Timeout)
            },
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.state.lock().closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reply_only_after_write() {
        let (mut transport, handle) = MockTransport::new();
        handle.push_reply("0");

        // 还没有写请求，没有应答
        let err = transport
            .read_line(Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout));

        transport.write_line("nop").await.unwrap();
        let line = transport.read_line(Duration::from_millis(10)).await.unwrap();
        assert_eq!(line, "0");
        assert_eq!(handle.written(), vec!["nop"]);
    }

    #[tokio::test]
    async fn test_delayed_reply_arrives_late() {
        let (mut transport, handle) = MockTransport::new();
        handle.push(MockReply::Delayed(Duration::from_millis(50), "0".into()));

        transport.write_line("Move 1 1").await.unwrap();
        assert!(transport.read_line(Duration::from_millis(10)).await.is_err());
        let line = transport.read_line(Duration::from_millis(200)).await.unwrap();
        assert_eq!(line, "0");
    }

    #[tokio::test]
    async fn test_disconnect_is_sticky() {
        let (mut transport, handle) = MockTransport::new();
        handle.push(MockReply::Disconnect);

        transport.write_line("wherec").await.unwrap();
        assert!(matches!(
            transport.read_line(Duration::from_millis(10)).await,
            Err(TransportError::Disconnected)
        ));
        assert!(matches!(
            transport.write_line("wherec").await,
            Err(TransportError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_simulated_mode_answers_from_controller() {
        let (mut transport, _handle) = MockTransport::simulated(SimulatedController::new());
        transport.write_line("nop").await.unwrap();
        assert_eq!(
            transport.read_line(Duration::from_millis(10)).await.unwrap(),
            "0"
        );
    }
}
