//! 取消令牌
//!
//! 协议没有中止命令：取消只在下一条命令发送之前生效，
//! 已发出的命令总是等到应答或超时。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 取消令牌（可克隆，克隆体共享状态）
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消，工作流在发送下一条命令前停止
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// 清除取消请求，令牌可以复用
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }
}
