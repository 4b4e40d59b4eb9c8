//! 设备连接状态机 - 统一处理事件分发、状态转换与阶段动作。
//! The device connection state machine - event dispatch, state transitions,
//! and phase actions in one place.
//!
//! 所有入站事件都已由会话任务串行化；处理器独占持有当前状态、定时器
//! 槽位与在途命令标记。命令队列是唯一由外部生产者并发写入的结构。
//!
//! All inbound events are already serialized by the session task; the handler
//! exclusively owns the current state, the timer slots, and the in-flight
//! marker. The command queue is the only structure written concurrently by
//! outside producers.

use crate::config::Config;
use crate::device::command_queue::CommandQueue;
use crate::device::event::DeviceEvent;
use crate::device::port::{ThermostatPort, ThermostatUpdateListener};
use crate::device::retry::{PhaseBudgets, RetryBudget, RetryVerdict};
use crate::device::state::{ConnectionState, DeviceStatus};
use crate::device::timing::{TimeoutKind, TimerFire, TimerManager};
use crate::message::status::ReceiveMessage;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

/// The finite-state controller for one device session.
/// 单个设备会话的有限状态控制器。
pub struct DeviceHandler<P: ThermostatPort> {
    port: Arc<P>,
    listener: Arc<dyn ThermostatUpdateListener>,
    queue: Arc<CommandQueue>,
    config: Config,
    state: ConnectionState,
    timers: TimerManager,
    /// Counts immediate rejections of the current phase's request.
    /// 统计当前阶段请求被立即拒绝的次数。
    reject_budget: RetryBudget,
    /// Counts successive timeouts, one counter per phase.
    /// 统计连续超时，每个阶段一个计数器。
    phase_budgets: PhaseBudgets,
    /// Counts successive disconnects during service discovery.
    /// 统计服务发现期间连续断连的次数。
    disconnect_budget: RetryBudget,
    last_status: DeviceStatus,
}

impl<P: ThermostatPort> DeviceHandler<P> {
    /// Creates the controller in its initial `NoSignal` state and reports
    /// the initial status to the listener.
    ///
    /// 以初始 `NoSignal` 状态创建控制器，并向监听器报告初始状态。
    pub fn new(
        port: Arc<P>,
        listener: Arc<dyn ThermostatUpdateListener>,
        queue: Arc<CommandQueue>,
        config: Config,
        events_tx: mpsc::Sender<DeviceEvent>,
    ) -> Self {
        let max_attempts = config.retry.max_attempts;
        let mut handler = Self {
            port,
            listener,
            queue,
            timers: TimerManager::new(events_tx),
            reject_budget: RetryBudget::new(max_attempts),
            phase_budgets: PhaseBudgets::new(max_attempts),
            disconnect_budget: RetryBudget::new(max_attempts),
            config,
            state: ConnectionState::NoSignal,
            last_status: DeviceStatus::Unknown,
        };
        handler.publish_status();
        handler
    }

    /// The current state.
    /// 当前状态。
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The timer slots, for inspection in tests.
    /// 定时器槽位，供测试检视。
    #[cfg(test)]
    pub(crate) fn timers(&self) -> &TimerManager {
        &self.timers
    }

    /// Forwards one serialized event to the current state's handling.
    /// 将一个已串行化的事件转发给当前状态处理。
    pub async fn handle_event(&mut self, event: DeviceEvent) {
        trace!(state = ?self.state, ?event, "dispatching event");
        match event {
            DeviceEvent::SignalStrength(rssi) => {
                if rssi >= self.config.signal.admission_threshold_dbm {
                    self.on_signal_detected(rssi).await;
                } else {
                    trace!(rssi, "signal below admission threshold");
                }
            }
            DeviceEvent::ConnectionEstablished => self.on_connection_established().await,
            DeviceEvent::ConnectionClosed => self.on_connection_closed().await,
            DeviceEvent::ServicesDiscovered => self.on_services_discovered().await,
            DeviceEvent::CharacteristicWritten => self.on_characteristic_written().await,
            DeviceEvent::CharacteristicUpdated(raw) => self.on_characteristic_updated(raw).await,
            DeviceEvent::CommandProcessingRequested => {
                self.on_command_processing_requested().await
            }
            DeviceEvent::TimerFired(fire) => self.on_timer_fired(fire).await,
            DeviceEvent::Shutdown => {
                // 由会话任务在循环中处理；到达这里只需取消定时器。
                // Handled by the session task's loop; reaching here only
                // needs the timers cancelled.
                self.timers.cancel_all();
            }
        }
    }

    async fn on_signal_detected(&mut self, rssi: i16) {
        match self.state {
            ConnectionState::NoSignal => {
                debug!(rssi, "device in range");
                if self.port.characteristics_available() {
                    self.transition_to(ConnectionState::Idle).await;
                } else {
                    self.transition_to(ConnectionState::ConnectingForServiceDiscovery)
                        .await;
                }
            }
            _ => trace!(rssi, "signal sample ignored"),
        }
    }

    async fn on_connection_established(&mut self) {
        match self.state {
            ConnectionState::ConnectingForServiceDiscovery => {
                self.phase_budgets.connection.reset();
                self.transition_to(ConnectionState::DiscoveringServices).await;
            }
            ConnectionState::ConnectingForCommandProcessing => {
                self.phase_budgets.connection.reset();
                self.transition_to(ConnectionState::TransmittingMessage).await;
            }
            _ => trace!("connection-established ignored"),
        }
    }

    async fn on_connection_closed(&mut self) {
        match self.state {
            ConnectionState::DiscoveringServices => match self.disconnect_budget.record_failure() {
                RetryVerdict::Retry => {
                    debug!("connection lost during discovery, reconnecting");
                    self.transition_to(ConnectionState::ConnectingForServiceDiscovery)
                        .await;
                }
                RetryVerdict::Exhausted => {
                    warn!("connection lost during discovery too often, giving up");
                    self.transition_to(ConnectionState::Failure).await;
                }
            },
            ConnectionState::WaitingForDisconnect
            | ConnectionState::ConnectingForCommandProcessing
            | ConnectionState::TransmittingMessage
            | ConnectionState::WaitingForResponse
            | ConnectionState::Failure => {
                if self.queue.has_pending() {
                    self.transition_to(ConnectionState::ConnectingForCommandProcessing)
                        .await;
                } else {
                    self.transition_to(ConnectionState::Idle).await;
                }
            }
            _ => trace!("connection-closed ignored"),
        }
    }

    async fn on_services_discovered(&mut self) {
        match self.state {
            ConnectionState::DiscoveringServices => {
                self.phase_budgets.service_discovery.reset();
                self.disconnect_budget.reset();
                self.transition_to(ConnectionState::RetrievingCharacteristics)
                    .await;
            }
            _ => trace!("services-discovered ignored"),
        }
    }

    async fn on_characteristic_written(&mut self) {
        match self.state {
            ConnectionState::TransmittingMessage => {
                self.phase_budgets.transmission.reset();
                self.transition_to(ConnectionState::WaitingForResponse).await;
            }
            _ => trace!("write acknowledgement ignored"),
        }
    }

    async fn on_characteristic_updated(&mut self, raw: Bytes) {
        match self.state {
            ConnectionState::WaitingForResponse => {
                self.phase_budgets.response.reset();
                self.queue.pop();
                self.handle_notification(&raw);
                if self.queue.has_pending() {
                    self.transition_to(ConnectionState::TransmittingMessage).await;
                } else {
                    self.transition_to(ConnectionState::WaitingForDisconnect).await;
                }
            }
            _ => {
                // 设备也会推送非请求的通知，解码它们但不改变状态。
                // The device also pushes unsolicited notifications; decode
                // them without a state change.
                self.handle_notification(&raw);
            }
        }
    }

    async fn on_command_processing_requested(&mut self) {
        match self.state {
            ConnectionState::Idle => {
                self.transition_to(ConnectionState::ConnectingForCommandProcessing)
                    .await;
            }
            _ => trace!("command-processing request ignored"),
        }
    }

    async fn on_timer_fired(&mut self, fire: TimerFire) {
        if !self.timers.claim(fire) {
            return;
        }
        match fire.kind {
            TimeoutKind::RetryDelay => {
                if let Some(next) = self.issue_phase_request().await {
                    self.transition_to(next).await;
                }
            }
            _ => self.on_phase_timeout(fire.kind).await,
        }
    }

    async fn on_phase_timeout(&mut self, kind: TimeoutKind) {
        let next = match (self.state, kind) {
            (ConnectionState::ConnectingForServiceDiscovery, TimeoutKind::Connection)
            | (ConnectionState::ConnectingForCommandProcessing, TimeoutKind::Connection)
            | (ConnectionState::TransmittingMessage, TimeoutKind::Transmission) => {
                // 超时重试 = 重新进入当前阶段。
                // A timeout retry re-enters the current phase.
                self.escalate_or(kind, self.state)
            }
            (ConnectionState::DiscoveringServices, TimeoutKind::ServiceDiscovery) => {
                let next =
                    self.escalate_or(kind, ConnectionState::ConnectingForServiceDiscovery);
                if next != ConnectionState::Failure {
                    // The stuck connection is torn down before the next
                    // discovery cycle.
                    // 在下一个发现周期前拆除卡住的连接。
                    self.port.request_disconnect().await;
                }
                next
            }
            (ConnectionState::WaitingForResponse, TimeoutKind::Response) => {
                self.escalate_or(kind, ConnectionState::TransmittingMessage)
            }
            (state, kind) => {
                // claim()已过滤过期定时器，这里只剩真正的不一致。
                // claim() filtered stale timers; only real inconsistencies
                // remain here.
                warn!(?state, ?kind, "timeout does not match the current phase");
                return;
            }
        };
        self.transition_to(next).await;
    }

    /// Records a timeout against the phase's own budget and picks the retry
    /// target, or `Failure` once the budget is exhausted.
    ///
    /// 向该阶段自己的预算记录一次超时并选择重试目标；预算用尽则为
    /// `Failure`。
    fn escalate_or(&mut self, kind: TimeoutKind, retry_target: ConnectionState) -> ConnectionState {
        let budget = match kind {
            TimeoutKind::Connection => &mut self.phase_budgets.connection,
            TimeoutKind::ServiceDiscovery => &mut self.phase_budgets.service_discovery,
            TimeoutKind::Transmission => &mut self.phase_budgets.transmission,
            TimeoutKind::Response => &mut self.phase_budgets.response,
            // The retry delay is not a phase timeout; it cannot reach here.
            // 重试延迟不是阶段超时，不会到达这里。
            TimeoutKind::RetryDelay => return retry_target,
        };
        match budget.record_failure() {
            RetryVerdict::Retry => {
                debug!(state = ?self.state, attempts = budget.attempts(), "phase timed out, retrying");
                retry_target
            }
            RetryVerdict::Exhausted => {
                warn!(state = ?self.state, "phase timed out too often, giving up");
                ConnectionState::Failure
            }
        }
    }

    /// Performs transitions until the machine settles: exit (cancel timers),
    /// swap, enter (arm timers, issue requests), publish the status change.
    /// Entry actions may demand an immediate follow-up transition; a loop
    /// drives those, never recursion.
    ///
    /// 执行转换直至状态机稳定：退出（取消定时器）、替换、进入（布设
    /// 定时器、发出请求）、发布状态变化。进入动作可能要求立即的后续
    /// 转换；由循环驱动，绝不递归。
    async fn transition_to(&mut self, target: ConnectionState) {
        let mut next = Some(target);
        while let Some(target) = next.take() {
            let previous = self.state;
            // Exit: every state relinquishes its timers, whichever
            // transition fired.
            // 退出：无论哪个转换被触发，每个状态都交出其定时器。
            self.timers.cancel_all();
            self.state = target;
            debug!(from = ?previous, to = ?target, "state transition");
            next = self.enter_state().await;
            self.publish_status();
        }
    }

    /// Runs the entry behavior of the current state. Returns the follow-up
    /// state when entry resolves immediately.
    ///
    /// 运行当前状态的进入行为。当进入行为立即得出结论时返回后续状态。
    async fn enter_state(&mut self) -> Option<ConnectionState> {
        match self.state {
            ConnectionState::NoSignal | ConnectionState::Idle => None,
            ConnectionState::Failure => {
                // 任何残留计数都不得泄漏到下一个恢复周期。
                // No leftover counts may leak into the next recovery cycle.
                self.phase_budgets.reset_all();
                self.disconnect_budget.reset();
                None
            }
            ConnectionState::ConnectingForServiceDiscovery
            | ConnectionState::ConnectingForCommandProcessing => {
                self.reject_budget.reset();
                self.timers
                    .arm_phase(TimeoutKind::Connection, self.config.timeouts.connection);
                self.issue_phase_request().await
            }
            ConnectionState::DiscoveringServices => {
                self.reject_budget.reset();
                self.timers.arm_phase(
                    TimeoutKind::ServiceDiscovery,
                    self.config.timeouts.service_discovery,
                );
                self.issue_phase_request().await
            }
            ConnectionState::RetrievingCharacteristics => {
                if self.port.fetch_characteristics().await {
                    if self.queue.has_pending() {
                        Some(ConnectionState::TransmittingMessage)
                    } else {
                        Some(ConnectionState::WaitingForDisconnect)
                    }
                } else {
                    // 发现完成后特征值缺失是协议错误，不重试。
                    // Missing characteristics after discovery is a protocol
                    // error, never retried.
                    warn!("control or notification characteristic missing");
                    Some(ConnectionState::Failure)
                }
            }
            ConnectionState::WaitingForDisconnect => {
                debug!("requesting disconnect");
                self.port.request_disconnect().await;
                None
            }
            ConnectionState::TransmittingMessage => {
                if self.queue.peek().is_none() {
                    error!("no command available for transmission");
                    return Some(ConnectionState::Failure);
                }
                self.reject_budget.reset();
                self.timers.arm_phase(
                    TimeoutKind::Transmission,
                    self.config.timeouts.transmission,
                );
                self.issue_phase_request().await
            }
            ConnectionState::WaitingForResponse => {
                self.timers
                    .arm_phase(TimeoutKind::Response, self.config.timeouts.response);
                None
            }
        }
    }

    /// Issues the current phase's request against the port. A rejection
    /// consumes rejection budget and arms the retry delay; exhaustion yields
    /// `Failure`.
    ///
    /// 针对端口发出当前阶段的请求。拒绝消耗拒绝预算并布设重试延迟；
    /// 预算用尽得出 `Failure`。
    async fn issue_phase_request(&mut self) -> Option<ConnectionState> {
        let accepted = match self.state {
            ConnectionState::ConnectingForServiceDiscovery
            | ConnectionState::ConnectingForCommandProcessing => {
                debug!("requesting connection");
                self.port.request_connection().await
            }
            ConnectionState::DiscoveringServices => {
                debug!("requesting service discovery");
                self.port.request_discover_services().await
            }
            ConnectionState::TransmittingMessage => match self.queue.peek() {
                Some(message) => {
                    debug!(command = %message, "transmitting command");
                    self.port.transmit(&message).await
                }
                None => {
                    error!("no command available for transmission");
                    return Some(ConnectionState::Failure);
                }
            },
            _ => return None,
        };

        if accepted {
            self.reject_budget.reset();
            None
        } else {
            match self.reject_budget.record_failure() {
                RetryVerdict::Retry => {
                    debug!(
                        state = ?self.state,
                        attempts = self.reject_budget.attempts(),
                        "request rejected, delaying re-attempt"
                    );
                    self.timers.arm_retry(self.config.retry.retry_delay);
                    None
                }
                RetryVerdict::Exhausted => {
                    warn!(state = ?self.state, "request rejected too often, giving up");
                    Some(ConnectionState::Failure)
                }
            }
        }
    }

    fn handle_notification(&self, raw: &[u8]) {
        match ReceiveMessage::decode(raw) {
            Ok(message) => self.publish_update(&message),
            Err(e) => warn!(error = %e, "discarding undecodable notification"),
        }
    }

    fn publish_update(&self, message: &ReceiveMessage) {
        match message {
            ReceiveMessage::Status(status) => {
                debug!(
                    temperature = f64::from(status.target_temperature),
                    mode = ?status.operating_mode,
                    valve = status.valve_percent,
                    boost = status.boost_mode,
                    "device status update"
                );
                self.listener
                    .on_target_temperature_updated(status.target_temperature);
                self.listener.on_operating_mode_updated(status.operating_mode);
                self.listener.on_vacation_mode_changed(status.vacation_mode);
                self.listener.on_vacation_end_updated(status.vacation_end);
                self.listener.on_window_mode_changed(status.window_mode);
                self.listener.on_boost_mode_changed(status.boost_mode);
                self.listener
                    .on_daylight_saving_time_changed(status.daylight_saving_time);
                self.listener.on_user_lock_changed(status.user_lock);
                self.listener.on_low_battery_changed(status.low_battery);
                self.listener.on_valve_status_updated(status.valve_percent);
            }
            ReceiveMessage::Schedule(schedule) => {
                self.listener.on_schedule_updated(schedule);
            }
        }
    }

    fn publish_status(&mut self) {
        let status = self.state.status();
        if status != self.last_status {
            self.last_status = status;
            debug!(?status, "device status changed");
            self.listener.on_device_status_changed(status);
        }
    }
}
