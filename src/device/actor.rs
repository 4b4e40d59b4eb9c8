//! The session actor and its user-facing handle.
//! 会话actor及其面向用户的句柄。
//!
//! 一个设备会话是一个独立任务：它从单一通道按到达顺序取出事件并交给
//! 状态机处理，因此状态转换之间绝不竞争。生产者通过可克隆的句柄从任意
//! 线程入队事件。
//!
//! A device session is a dedicated task: it pulls events off a single channel
//! in arrival order and hands them to the state machine, so state transitions
//! never race. Producers enqueue events from any thread through the cloneable
//! handle.

use crate::config::Config;
use crate::device::command_queue::CommandQueue;
use crate::device::event::DeviceEvent;
use crate::device::handler::DeviceHandler;
use crate::device::port::{ThermostatPort, ThermostatUpdateListener};
use crate::error::{Error, Result};
use crate::message::command::SendMessage;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Capacity of the session's event channel. Producers back off (await) when
/// the state machine falls this far behind.
/// 会话事件通道的容量。状态机落后到这个程度时，生产者将等待。
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The session actor owning the state machine and its event stream.
/// 拥有状态机及其事件流的会话actor。
pub struct DeviceSession<P: ThermostatPort> {
    handler: DeviceHandler<P>,
    events_rx: mpsc::Receiver<DeviceEvent>,
}

impl<P: ThermostatPort> DeviceSession<P> {
    /// Spawns a session for one device onto the current tokio runtime and
    /// returns the handle used to feed it.
    ///
    /// 在当前tokio运行时上为一个设备生成会话，并返回用于馈送事件的句柄。
    pub fn spawn(
        port: Arc<P>,
        listener: Arc<dyn ThermostatUpdateListener>,
        config: Config,
    ) -> DeviceHandle {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let queue = Arc::new(CommandQueue::new());
        let handler = DeviceHandler::new(
            port,
            listener,
            queue.clone(),
            config,
            events_tx.clone(),
        );
        let session = Self { handler, events_rx };
        tokio::spawn(session.run());
        DeviceHandle { events_tx, queue }
    }

    /// The session's event loop. Ends on `Shutdown`; outstanding timers are
    /// cancelled when the state machine drops.
    ///
    /// 会话的事件循环。收到 `Shutdown` 时结束；状态机销毁时未决定时器
    /// 随之取消。
    async fn run(mut self) {
        while let Some(event) = self.events_rx.recv().await {
            if matches!(event, DeviceEvent::Shutdown) {
                break;
            }
            self.handler.handle_event(event).await;
        }
        debug!("device session terminated");
    }
}

/// A cloneable handle to a running device session. All methods merely
/// enqueue an event; processing happens on the session task.
///
/// 指向运行中设备会话的可克隆句柄。所有方法仅入队事件；
/// 处理发生在会话任务上。
#[derive(Clone)]
pub struct DeviceHandle {
    events_tx: mpsc::Sender<DeviceEvent>,
    queue: Arc<CommandQueue>,
}

impl DeviceHandle {
    /// Feeds a signal-strength sample (dBm) from the scanner.
    /// 馈入来自扫描器的信号强度采样（dBm）。
    pub async fn notify_signal_strength(&self, rssi: i16) -> Result<()> {
        self.send(DeviceEvent::SignalStrength(rssi)).await
    }

    /// The transport reports an established connection.
    /// 传输层报告连接已建立。
    pub async fn notify_connection_established(&self) -> Result<()> {
        self.send(DeviceEvent::ConnectionEstablished).await
    }

    /// The transport reports the connection closed.
    /// 传输层报告连接已关闭。
    pub async fn notify_connection_closed(&self) -> Result<()> {
        self.send(DeviceEvent::ConnectionClosed).await
    }

    /// The transport reports completed service discovery.
    /// 传输层报告服务发现已完成。
    pub async fn notify_services_discovered(&self) -> Result<()> {
        self.send(DeviceEvent::ServicesDiscovered).await
    }

    /// The transport acknowledges the characteristic write.
    /// 传输层确认特征值写入。
    pub async fn notify_characteristic_written(&self) -> Result<()> {
        self.send(DeviceEvent::CharacteristicWritten).await
    }

    /// The notification characteristic delivered `raw`.
    /// 通知特征值送达了 `raw`。
    pub async fn notify_characteristic_updated(&self, raw: Bytes) -> Result<()> {
        self.send(DeviceEvent::CharacteristicUpdated(raw)).await
    }

    /// Enqueues a command (coalescing by kind) and signals the session that
    /// work is available.
    ///
    /// 入队一条命令（按种类合并），并向会话发出有工作可做的信号。
    pub async fn enqueue_command(&self, message: SendMessage) -> Result<()> {
        self.queue.enqueue(message);
        self.request_command_processing().await
    }

    /// Asks the session to start processing queued commands.
    /// 请求会话开始处理排队的命令。
    pub async fn request_command_processing(&self) -> Result<()> {
        self.send(DeviceEvent::CommandProcessingRequested).await
    }

    /// Terminates the session task. Queued events ahead of the shutdown are
    /// still processed.
    ///
    /// 终止会话任务。排在关闭之前的事件仍会被处理。
    pub async fn shutdown(&self) -> Result<()> {
        self.send(DeviceEvent::Shutdown).await
    }

    async fn send(&self, event: DeviceEvent) -> Result<()> {
        self.events_tx
            .send(event)
            .await
            .map_err(|_| Error::SessionClosed)
    }
}
