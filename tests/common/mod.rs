//! Shared harness for the integration tests: a scriptable fake transport
//! port, a recording listener, and virtual-time helpers.
//! 集成测试的共享支架：可脚本化的假传输端口、记录型监听器与虚拟时间辅助。

use async_trait::async_trait;
use eqiva_blue::device::{DeviceStatus, ThermostatPort, ThermostatUpdateListener};
use eqiva_blue::message::{DaySchedule, OperatingMode, SendMessage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;

/// Helper to initialize tracing for tests.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "debug".into()),
            )
            .with_test_writer()
            .init();
    });
}

/// Scripted verdicts for one port operation; queued verdicts first, then the
/// fallback repeats.
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

    fn next(&self) -> bool {
        self.queued
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.load(Ordering::SeqCst))
    }
}

/// A fake thermostat port counting every request.
/// 统计每个请求的假恒温器端口。
#[derive(Debug)]
pub struct MockPort {
    connection_requests: AtomicU32,
    disconnect_requests: AtomicU32,
    discovery_requests: AtomicU32,
    pub connection_results: ResponseScript,
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
            connection_results: ResponseScript::new(true),
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

    pub fn transmission_count(&self) -> u32 {
        self.transmitted.lock().unwrap().len() as u32
    }

    pub fn transmitted(&self) -> Vec<SendMessage> {
        self.transmitted.lock().unwrap().clone()
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
        true
    }

    async fn request_discover_services(&self) -> bool {
        self.discovery_requests.fetch_add(1, Ordering::SeqCst);
        self.discovery_results.next()
    }

    async fn fetch_characteristics(&self) -> bool {
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

/// A listener recording every callback it receives.
/// 记录收到的每个回调的监听器。
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

/// Polls `condition` on virtual time until it holds. Panics after a bounded
/// wait so a broken flow fails instead of hanging.
///
/// 在虚拟时间上轮询 `condition` 直至成立。等待有上界，流程损坏时测试
/// 失败而不是挂起。
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(120), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

/// Lets the session drain everything already enqueued. Short enough that no
/// phase timer can elapse meanwhile.
///
/// 让会话清空已入队的全部事件。时间足够短，期间不会有阶段定时器到期。
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
