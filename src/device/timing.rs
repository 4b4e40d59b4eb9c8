//! 定时器管理 - 将可取消的定时器作为事件馈入会话的执行流。
//! Timer management - feeds cancelable timers into the session's execution
//! stream as events.
//!
//! 每个布设的定时器携带单调递增的ID。到期事件只有在其ID仍与当前布设的
//! 槽位匹配时才被接受，因此在取消与送达竞争时，过期的回调绝不会作用于
//! 已被替换的状态。
//!
//! Every armed timer carries a monotonically increasing id. A fired event is
//! only honored while its id still matches the currently armed slot, so a
//! stale callback racing its own cancellation can never act on a superseded
//! state.

use crate::device::event::DeviceEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::trace;

/// The phase a timer watches over.
/// 定时器监视的阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutKind {
    /// Waiting for the connection-established callback.
    /// 等待连接建立回调。
    Connection,
    /// Waiting for the services-discovered callback.
    /// 等待服务发现完成回调。
    ServiceDiscovery,
    /// Waiting for the write acknowledgement.
    /// 等待写确认。
    Transmission,
    /// Waiting for the device's notification.
    /// 等待设备通知。
    Response,
    /// Waiting before re-attempting a rejected request.
    /// 在重新尝试被拒绝的请求之前等待。
    RetryDelay,
}

/// Identifies a single arming of a timer.
/// 标识定时器的一次布设。
pub type TimerId = u64;

/// The payload of a `DeviceEvent::TimerFired`.
/// `DeviceEvent::TimerFired` 的载荷。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFire {
    /// Which phase the timer watched.
    /// 定时器监视的阶段。
    pub kind: TimeoutKind,
    /// The arming this fire belongs to.
    /// 此次到期所属的布设。
    pub id: TimerId,
}

/// An owned, cancelable timer. Dropping the handle aborts the underlying
/// sleep task, so release is guaranteed on every exit path.
///
/// 拥有所有权、可取消的定时器。丢弃句柄会中止底层的睡眠任务，因此在
/// 每条退出路径上都保证释放。
#[derive(Debug)]
struct ArmedTimer {
    kind: TimeoutKind,
    id: TimerId,
    task: JoinHandle<()>,
}

impl Drop for ArmedTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Owns the session's two timer slots: the phase timeout and the retry
/// delay. The phase timeout is authoritative; state exit cancels both.
///
/// 持有会话的两个定时器槽位：阶段超时与重试延迟。阶段超时具有权威性；
/// 状态退出时两者一并取消。
#[derive(Debug)]
pub struct TimerManager {
    events_tx: mpsc::Sender<DeviceEvent>,
    next_id: TimerId,
    phase: Option<ArmedTimer>,
    retry: Option<ArmedTimer>,
}

impl TimerManager {
    /// Creates a manager feeding fired timers into `events_tx`.
    /// 创建一个将到期定时器馈入 `events_tx` 的管理器。
    pub fn new(events_tx: mpsc::Sender<DeviceEvent>) -> Self {
        Self {
            events_tx,
            next_id: 0,
            phase: None,
            retry: None,
        }
    }

    /// Arms the phase timeout, replacing (and thereby cancelling) any
    /// previously armed phase timer.
    ///
    /// 布设阶段超时，替换（并因此取消）之前布设的阶段定时器。
    pub fn arm_phase(&mut self, kind: TimeoutKind, delay: Duration) {
        self.phase = Some(self.arm(kind, delay));
    }

    /// Arms the retry delay.
    /// 布设重试延迟。
    pub fn arm_retry(&mut self, delay: Duration) {
        self.retry = Some(self.arm(TimeoutKind::RetryDelay, delay));
    }

    /// Cancels both slots. Invoked on every state exit.
    /// 取消两个槽位。在每次状态退出时调用。
    pub fn cancel_all(&mut self) {
        self.phase = None;
        self.retry = None;
    }

    /// Accepts a fired timer if it belongs to the currently armed slot,
    /// clearing that slot. Returns `false` for stale fires.
    ///
    /// 若到期定时器属于当前布设的槽位则接受并清除该槽位。过期的到期
    /// 返回 `false`。
    pub fn claim(&mut self, fire: TimerFire) -> bool {
        let slot = if fire.kind == TimeoutKind::RetryDelay {
            &mut self.retry
        } else {
            &mut self.phase
        };
        match slot {
            Some(armed) if armed.kind == fire.kind && armed.id == fire.id => {
                *slot = None;
                true
            }
            _ => {
                trace!(kind = ?fire.kind, id = fire.id, "discarding stale timer fire");
                false
            }
        }
    }

    /// Whether a phase timer is currently armed.
    /// 当前是否布设有阶段定时器。
    pub fn phase_armed(&self) -> bool {
        self.phase.is_some()
    }

    /// Whether a retry-delay timer is currently armed.
    /// 当前是否布设有重试延迟定时器。
    pub fn retry_armed(&self) -> bool {
        self.retry.is_some()
    }

    fn arm(&mut self, kind: TimeoutKind, delay: Duration) -> ArmedTimer {
        self.next_id += 1;
        let id = self.next_id;
        let events_tx = self.events_tx.clone();
        trace!(?kind, id, ?delay, "arming timer");
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // 会话关闭后发送失败是正常的，丢弃即可。
            // A send failure after session shutdown is normal, just drop it.
            let _ = events_tx
                .send(DeviceEvent::TimerFired(TimerFire { kind, id }))
                .await;
        });
        ArmedTimer { kind, id, task }
    }
}
