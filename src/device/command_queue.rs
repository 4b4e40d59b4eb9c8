//! 命令队列 - 每种命令最多保留一条待发命令，外加一条在途命令。
//! Command queue - holds at most one pending command per kind, plus a single
//! in-flight command.
//!
//! 这是会话中唯一会被执行流之外的生产者直接访问的数据结构，因此它自带
//! 互斥锁；状态机的其余部分归单一执行流独占。
//!
//! This is the only data structure in a session touched directly by producers
//! outside the execution stream, hence its internal lock; the rest of the
//! state machine is owned exclusively by the single execution stream.

use crate::message::command::SendMessage;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Thread-safe holder of the commands awaiting transmission.
/// 等待发送的命令的线程安全容器。
#[derive(Debug, Default)]
pub struct CommandQueue {
    inner: Mutex<QueueInner>,
}

#[derive(Debug, Default)]
struct QueueInner {
    /// Commands not yet claimed for transmission, oldest first.
    /// 尚未被认领发送的命令，最旧的在前。
    queued: VecDeque<SendMessage>,
    /// The command currently being transmitted and awaited, if any.
    /// 当前正在发送并等待应答的命令（如有）。
    in_flight: Option<SendMessage>,
}

impl CommandQueue {
    /// Creates an empty queue.
    /// 创建空队列。
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a command, replacing any queued command of the same kind
    /// (latest wins). The in-flight command is never touched.
    ///
    /// 追加一条命令，并替换任何同种类的已排队命令（后来者胜出）。
    /// 在途命令绝不受影响。
    pub fn enqueue(&self, message: SendMessage) {
        let mut inner = self.lock();
        inner.queued.retain(|queued| queued.kind() != message.kind());
        inner.queued.push_back(message);
    }

    /// Whether any not-yet-claimed command is waiting. A command already
    /// claimed as in-flight no longer counts.
    ///
    /// 是否还有尚未被认领的命令在等待。已被认领为在途的命令不再计入。
    pub fn has_pending(&self) -> bool {
        !self.lock().queued.is_empty()
    }

    /// Claims the head of the queue as in-flight and returns it. While a
    /// command is in-flight, repeated calls return that same command without
    /// consuming further queue entries.
    ///
    /// 将队首认领为在途命令并返回。存在在途命令期间，重复调用返回同一
    /// 条命令，不会消耗更多队列条目。
    pub fn peek(&self) -> Option<SendMessage> {
        let mut inner = self.lock();
        if inner.in_flight.is_none() {
            inner.in_flight = inner.queued.pop_front();
        }
        inner.in_flight.clone()
    }

    /// Clears the in-flight marker, letting the next `peek` claim a new head.
    /// 清除在途标记，使下一次 `peek` 可以认领新的队首。
    pub fn pop(&self) {
        self.lock().in_flight = None;
    }

    /// Number of not-yet-claimed commands.
    /// 尚未被认领的命令数量。
    pub fn queued_len(&self) -> usize {
        self.lock().queued.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueInner> {
        // A poisoned lock only means another producer panicked mid-update;
        // the queue state itself is always consistent between operations.
        // 锁中毒只意味着另一个生产者在更新途中崩溃；
        // 队列状态在各操作之间始终是一致的。
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
