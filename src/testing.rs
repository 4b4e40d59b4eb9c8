//! 测试辅助工具模块
//! Test utilities module

#![cfg(test)]

use crate::config::Config;
use crate::device::command_queue::CommandQueue;
use crate::device::event::DeviceEvent;
use crate::device::handler::DeviceHandler;
use crate::device::port::{ThermostatPort, ThermostatUpdateListener};
use crate::device::state::DeviceStatus;
use crate::message::command::{OperatingMode, SendMessage};
use crate::message::schedule::DaySchedule;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Scripted results for one port operation: queued verdicts are served
/// first, then the fallback repeats.
///
/// 单个端口操作的脚本化结果：先按队列给出裁决，然后重复回退值。
#[derive(Debug)]
pub struct ResponseScript {
    queued: Mutex<VecDeque<bool>>,
    fallback: AtomicBool,
}

impl ResponseScript {
    fn new(fallback: bool) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback: AtomicBool::new(fallback),
        }
    }

    pub fn push_results(&self, results: &[bool]) {
        self.queued.lock().unwrap().extend(results.iter().copied());
    }

    pub fn set_fallback(&self, value: bool) {
        self.fallback.store(value, Ordering::SeqCst);
    }

    fn next(&self) -> bool {
        self.queued
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.load(Ordering::SeqCst))
    }
}

/// A mock transport port recording every request and answering from
/// per-operation scripts.
///
/// 记录每个请求并按操作脚本作答的模拟传输端口。
#[derive(Debug)]
pub struct MockPort {
    pub connection_requests: AtomicU32,
    pub disconnect_requests: AtomicU32,
    pub discovery_requests: AtomicU32,
    pub fetch_requests: AtomicU32,
    pub connection_results: ResponseScript,
    pub disconnect_results: ResponseScript,
    pub discovery_results: ResponseScript,
    pub fetch_results: ResponseScript,
    pub transmit_results: ResponseScript,
    pub characteristics_known: AtomicBool,
    transmitted: Mutex<Vec<SendMessage>>,
}

impl Default for MockPort {
    fn default() -> Self {
        Self {
            connection_requests: AtomicU32::new(0),
            disconnect_requests: AtomicU32::new(0),
            discovery_requests: AtomicU32::new(0),
            fetch_requests: AtomicU32::new(0),
            connection_results: ResponseScript::new(true),
            disconnect_results: ResponseScript::new(true),
            discovery_results: ResponseScript::new(true),
            fetch_results: ResponseScript::new(true),
            transmit_results: ResponseScript::new(true),
            characteristics_known: AtomicBool::new(false),
            transmitted: Mutex::new(Vec::new()),
        }
    }
}

impl MockPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_request_count(&self) -> u32 {
        self.connection_requests.load(Ordering::SeqCst)
    }

    pub fn disconnect_request_count(&self) -> u32 {
        self.disconnect_requests.load(Ordering::SeqCst)
    }

    pub fn discovery_request_count(&self) -> u32 {
        self.discovery_requests.load(Ordering::SeqCst)
    }

    pub fn fetch_request_count(&self) -> u32 {
        self.fetch_requests.load(Ordering::SeqCst)
    }

    pub fn transmitted(&self) -> Vec<SendMessage> {
        self.transmitted.lock().unwrap().clone()
    }

    pub fn transmission_count(&self) -> u32 {
        self.transmitted.lock().unwrap().len() as u32
    }
}

#[async_trait]
impl ThermostatPort for MockPort {
    async fn request_connection(&self) -> bool {
        self.connection_requests.fetch_add(1, Ordering::SeqCst);
        self.connection_results.next()
    }

    async fn request_disconnect(&self) -> bool {
        self.disconnect_requests.fetch_add(1, Ordering::SeqCst);
        self.disconnect_results.next()
    }

    async fn request_discover_services(&self) -> bool {
        self.discovery_requests.fetch_add(1, Ordering::SeqCst);
        self.discovery_results.next()
    }

    async fn fetch_characteristics(&self) -> bool {
        self.fetch_requests.fetch_add(1, Ordering::SeqCst);
        let available = self.fetch_results.next();
        if available {
            self.characteristics_known.store(true, Ordering::SeqCst);
        }
        available
    }

    fn characteristics_available(&self) -> bool {
        self.characteristics_known.load(Ordering::SeqCst)
    }

    async fn transmit(&self, message: &SendMessage) -> bool {
        self.transmitted.lock().unwrap().push(message.clone());
        self.transmit_results.next()
    }
}

/// A listener recording everything it is told.
/// 记录收到的一切的监听器。
#[derive(Debug, Default)]
pub struct RecordingListener {
    statuses: Mutex<Vec<DeviceStatus>>,
    temperatures: Mutex<Vec<f32>>,
    modes: Mutex<Vec<OperatingMode>>,
    valve_percents: Mutex<Vec<u8>>,
    schedules: Mutex<Vec<DaySchedule>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<DeviceStatus> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn last_status(&self) -> Option<DeviceStatus> {
        self.statuses.lock().unwrap().last().copied()
    }

    pub fn temperatures(&self) -> Vec<f32> {
        self.temperatures.lock().unwrap().clone()
    }

    pub fn modes(&self) -> Vec<OperatingMode> {
        self.modes.lock().unwrap().clone()
    }

    pub fn valve_percents(&self) -> Vec<u8> {
        self.valve_percents.lock().unwrap().clone()
    }

    pub fn schedules(&self) -> Vec<DaySchedule> {
        self.schedules.lock().unwrap().clone()
    }
}

impl ThermostatUpdateListener for RecordingListener {
    fn on_device_status_changed(&self, status: DeviceStatus) {
        self.statuses.lock().unwrap().push(status);
    }

    fn on_target_temperature_updated(&self, temperature: f32) {
        self.temperatures.lock().unwrap().push(temperature);
    }

    fn on_operating_mode_updated(&self, mode: OperatingMode) {
        self.modes.lock().unwrap().push(mode);
    }

    fn on_valve_status_updated(&self, percent: u8) {
        self.valve_percents.lock().unwrap().push(percent);
    }

    fn on_schedule_updated(&self, schedule: &DaySchedule) {
        self.schedules.lock().unwrap().push(schedule.clone());
    }
}

/// A harness driving a `DeviceHandler` directly, without the session task.
///
/// Events the handler produces for itself (timer fires) land in `events_rx`;
/// tests pump them back in explicitly, so every interleaving is under test
/// control. Run under `start_paused` so armed timers elapse on virtual time.
///
/// 直接驱动 `DeviceHandler` 的测试支架，不经过会话任务。
///
/// 处理器为自己产生的事件（定时器到期）落入 `events_rx`；测试显式地将
/// 其泵回，因此所有交错都在测试控制之下。在 `start_paused` 下运行，
/// 使布设的定时器按虚拟时间到期。
pub struct Harness {
    pub handler: DeviceHandler<MockPort>,
    pub events_rx: mpsc::Receiver<DeviceEvent>,
    pub port: Arc<MockPort>,
    pub listener: Arc<RecordingListener>,
    pub queue: Arc<CommandQueue>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let (events_tx, events_rx) = mpsc::channel(64);
        let port = Arc::new(MockPort::new());
        let listener = Arc::new(RecordingListener::new());
        let queue = Arc::new(CommandQueue::new());
        let handler = DeviceHandler::new(
            port.clone(),
            listener.clone(),
            queue.clone(),
            config,
            events_tx,
        );
        Self {
            handler,
            events_rx,
            port,
            listener,
            queue,
        }
    }

    /// Feeds one external event to the handler.
    /// 向处理器馈入一个外部事件。
    pub async fn dispatch(&mut self, event: DeviceEvent) {
        self.handler.handle_event(event).await;
    }

    /// Waits (on virtual time) for the next self-produced event and feeds it
    /// back to the handler. Panics if no timer is armed, since nothing could
    /// ever arrive.
    ///
    /// （按虚拟时间）等待下一个自产事件并将其泵回处理器。若没有布设
    /// 定时器则恐慌，因为不会有事件到达。
    pub async fn pump_next_timer(&mut self) {
        let event = self.events_rx.recv().await.expect("event channel closed");
        self.handler.handle_event(event).await;
    }
}
