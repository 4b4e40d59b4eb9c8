//! 定义了设备会话的可配置参数。
//! Defines configurable parameters for a device session.

use std::time::Duration;

/// A structure containing all configurable parameters for a device session.
///
/// 包含设备会话所有可配置参数的结构体。
#[derive(Debug, Clone)]
pub struct Config {
    /// Signal-strength admission parameters.
    /// 信号强度准入参数。
    pub signal: SignalConfig,

    /// Bounded-retry parameters.
    /// 有界重试参数。
    pub retry: RetryConfig,

    /// Per-phase timeout durations.
    /// 各阶段的超时时长。
    pub timeouts: TimeoutConfig,
}

/// Signal-strength admission parameters.
///
/// 信号强度准入参数。
#[derive(Debug, Clone)]
pub struct SignalConfig {
    /// The minimum RSSI (dBm) at which communication with the device is
    /// attempted at all. Samples below this are treated as signal loss.
    ///
    /// 尝试与设备通信所需的最低RSSI（dBm）。低于此值的采样被视为信号丢失。
    pub admission_threshold_dbm: i16,
}

/// Bounded-retry parameters.
///
/// 有界重试参数。
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// The maximum number of attempts for a single phase, for both immediate
    /// rejections and successive timeouts. Exhausting it escalates to failure.
    ///
    /// 单个阶段的最大尝试次数，对立即拒绝和连续超时同样适用。
    /// 用尽后升级为失败。
    pub max_attempts: u32,

    /// The fixed delay between re-attempts after a rejected request.
    /// 请求被拒绝后，重新尝试之间的固定延迟。
    pub retry_delay: Duration,
}

/// Per-phase timeout durations.
///
/// 各阶段的超时时长。
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// How long to wait for the transport to report an established connection.
    /// 等待传输层报告连接建立的时长。
    pub connection: Duration,

    /// How long to wait for service discovery to complete. Discovery walks the
    /// whole GATT table on a low-duty-cycle link, so this is the longest phase.
    ///
    /// 等待服务发现完成的时长。发现过程要在低占空比链路上遍历整个GATT表，
    /// 因此是最长的阶段。
    pub service_discovery: Duration,

    /// How long to wait for the write acknowledgement of a transmitted command.
    /// 等待已发送命令的写确认的时长。
    pub transmission: Duration,

    /// How long to wait for the device's status notification after a command
    /// was acknowledged.
    /// 命令确认后等待设备状态通知的时长。
    pub response: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            signal: SignalConfig::default(),
            retry: RetryConfig::default(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            admission_threshold_dbm: -90,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connection: Duration::from_secs(5),
            service_discovery: Duration::from_secs(10),
            transmission: Duration::from_secs(5),
            response: Duration::from_secs(5),
        }
    }
}
