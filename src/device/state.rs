//! Defines the connection state machine's states and the status projection
//! derived from them.
//!
//! 定义连接状态机的各状态，以及由其派生的状态投影。

/// One phase of the device connection lifecycle. Exactly one state is
/// current at any instant; the handler owns the current-state reference
/// exclusively.
///
/// 设备连接生命周期中的一个阶段。任意时刻恰有一个状态是当前状态；
/// 处理器独占持有当前状态引用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No usable advertisement has been seen yet, or the signal dropped
    /// below the admission threshold. The initial state.
    /// 尚未见到可用的广播，或信号降到准入阈值以下。初始状态。
    NoSignal,

    /// Connecting so the GATT table can be discovered.
    /// 正在建立连接以便发现GATT表。
    ConnectingForServiceDiscovery,

    /// Connected, waiting for service discovery to complete.
    /// 已连接，等待服务发现完成。
    DiscoveringServices,

    /// Resolving the control and notification characteristic handles.
    /// 正在解析控制与通知特征值句柄。
    RetrievingCharacteristics,

    /// Work is done; waiting for the requested disconnect to complete so the
    /// low-power device is not kept in connection.
    /// 工作完成；等待已请求的断开完成，避免让低功耗设备保持连接。
    WaitingForDisconnect,

    /// Disconnected and ready; waiting for a command to process.
    /// 已断开并就绪，等待要处理的命令。
    Idle,

    /// Connecting in order to transmit queued commands.
    /// 正在建立连接以发送排队的命令。
    ConnectingForCommandProcessing,

    /// Writing the in-flight command to the control characteristic.
    /// 正在将在途命令写入控制特征值。
    TransmittingMessage,

    /// The write was acknowledged; waiting for the device's notification.
    /// 写入已确认；等待设备的通知。
    WaitingForResponse,

    /// A retry budget was exhausted or a protocol error occurred. Only an
    /// external trigger restarts the cycle.
    /// 某个重试预算已用尽或发生了协议错误。只有外部触发才会重启周期。
    Failure,
}

/// The status projection reported to the listener. Derived from the current
/// state, emitted only on change.
///
/// 上报给监听器的状态投影。由当前状态派生，仅在变化时发出。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    /// No connection cycle has succeeded yet for the current signal episode.
    /// 当前信号周期内尚无成功的连接周期。
    Offline,
    /// The device is reachable and commands can be processed.
    /// 设备可达，可以处理命令。
    Online,
    /// A connection cycle failed and awaits an external trigger.
    /// 连接周期失败，等待外部触发。
    Failure,
    /// No projection has been derived yet.
    /// 尚未派生出投影。
    Unknown,
}

impl ConnectionState {
    /// The status this state projects to.
    /// 此状态投影出的设备状态。
    pub fn status(&self) -> DeviceStatus {
        match self {
            ConnectionState::NoSignal
            | ConnectionState::ConnectingForServiceDiscovery
            | ConnectionState::DiscoveringServices
            | ConnectionState::RetrievingCharacteristics => DeviceStatus::Offline,
            ConnectionState::WaitingForDisconnect
            | ConnectionState::Idle
            | ConnectionState::ConnectingForCommandProcessing
            | ConnectionState::TransmittingMessage
            | ConnectionState::WaitingForResponse => DeviceStatus::Online,
            ConnectionState::Failure => DeviceStatus::Failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_projection() {
        assert_eq!(ConnectionState::NoSignal.status(), DeviceStatus::Offline);
        assert_eq!(
            ConnectionState::ConnectingForServiceDiscovery.status(),
            DeviceStatus::Offline
        );
        assert_eq!(
            ConnectionState::RetrievingCharacteristics.status(),
            DeviceStatus::Offline
        );
        assert_eq!(ConnectionState::Idle.status(), DeviceStatus::Online);
        assert_eq!(
            ConnectionState::WaitingForResponse.status(),
            DeviceStatus::Online
        );
        assert_eq!(ConnectionState::Failure.status(), DeviceStatus::Failure);
    }

    #[test]
    fn test_state_equality_and_debug() {
        let state = ConnectionState::TransmittingMessage;
        assert_eq!(state, state.clone());
        assert_eq!(format!("{:?}", state), "TransmittingMessage");
    }
}
