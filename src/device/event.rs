//! Defines the inbound events funneled into a device session's single
//! execution stream.
//! 定义汇入设备会话单一执行流的入站事件。

use crate::device::timing::TimerFire;
use bytes::Bytes;

/// An inbound event. Producers (transport callbacks, command issuers,
/// timers) may run on arbitrary threads; they only enqueue events, and the
/// session task processes them strictly in arrival order.
///
/// 入站事件。生产者（传输回调、命令发起方、定时器）可以运行在任意线程上；
/// 它们只入队事件，会话任务严格按到达顺序处理。
#[derive(Debug)]
pub enum DeviceEvent {
    /// A signal-strength sample from the advertisement scanner, in dBm.
    /// 来自广播扫描器的信号强度采样（dBm）。
    SignalStrength(i16),

    /// The transport reports an established connection.
    /// 传输层报告连接已建立。
    ConnectionEstablished,

    /// The transport reports the connection closed, requested or not.
    /// 传输层报告连接已关闭，无论是否为主动请求。
    ConnectionClosed,

    /// GATT service discovery completed.
    /// GATT服务发现已完成。
    ServicesDiscovered,

    /// The write of the in-flight command was acknowledged.
    /// 在途命令的写入已被确认。
    CharacteristicWritten,

    /// The notification characteristic delivered a raw message.
    /// 通知特征值送达了一条原始消息。
    CharacteristicUpdated(Bytes),

    /// A producer asks for queued commands to be processed.
    /// 生产者请求处理排队的命令。
    CommandProcessingRequested,

    /// An armed timer elapsed.
    /// 某个已布设的定时器到期。
    TimerFired(TimerFire),

    /// Terminate the session's event loop.
    /// 终止会话的事件循环。
    Shutdown,
}
