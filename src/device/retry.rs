//! 有界重试预算 - 对单个阶段的尝试次数计数并在用尽时升级。
//! Bounded retry budget - counts attempts for a single phase and escalates
//! when exhausted.

/// The verdict after recording a failed attempt.
/// 记录一次失败尝试后的裁决。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryVerdict {
    /// Budget remains, the attempt may be repeated.
    /// 预算尚存，可以重复尝试。
    Retry,
    /// The budget is exhausted; the caller must escalate to failure.
    /// 预算已用尽，调用方必须升级为失败。
    Exhausted,
}

/// A bounded attempt counter. One instance covers one failure concern
/// (rejections, timeouts, or disconnects); the concerns count independently.
///
/// 有界尝试计数器。一个实例覆盖一种失败情形（拒绝、超时或断连）；
/// 各情形独立计数。
#[derive(Debug)]
pub struct RetryBudget {
    max_attempts: u32,
    attempts: u32,
}

impl RetryBudget {
    /// Creates a budget allowing `max_attempts` attempts in total.
    /// 创建总共允许 `max_attempts` 次尝试的预算。
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            attempts: 0,
        }
    }

    /// Records a failed attempt. Returns `Exhausted` when the configured
    /// maximum is reached, resetting the counter for the next cycle.
    ///
    /// 记录一次失败尝试。达到配置的上限时返回 `Exhausted`，并为下一个
    /// 周期重置计数器。
    pub fn record_failure(&mut self) -> RetryVerdict {
        self.attempts += 1;
        if self.attempts < self.max_attempts {
            RetryVerdict::Retry
        } else {
            self.attempts = 0;
            RetryVerdict::Exhausted
        }
    }

    /// Resets the counter. Called on every success so intermittent failures
    /// never accumulate toward escalation.
    ///
    /// 重置计数器。每次成功时调用，使间歇性失败不会向升级累积。
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Attempts recorded since the last reset.
    /// 自上次重置以来记录的尝试次数。
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// One timeout budget per phase. A phase's counter persists across
/// excursions into other states and resets only when that phase succeeds
/// (or when the machine escalates to failure), so successive timeouts of the
/// same phase accumulate even with progress in between.
///
/// 每个阶段一个超时预算。某阶段的计数器在进出其他状态期间保持不变，
/// 只有该阶段成功（或状态机升级为失败）时才重置，因此同一阶段的连续
/// 超时即使中间有进展也会累积。
#[derive(Debug)]
pub struct PhaseBudgets {
    /// Connection-established wait, for both connecting phases.
    /// 连接建立等待，两个连接阶段共用。
    pub connection: RetryBudget,
    /// Services-discovered wait.
    /// 服务发现完成等待。
    pub service_discovery: RetryBudget,
    /// Write-acknowledgement wait.
    /// 写确认等待。
    pub transmission: RetryBudget,
    /// Device-notification wait.
    /// 设备通知等待。
    pub response: RetryBudget,
}

impl PhaseBudgets {
    /// Creates the budget set, each phase allowing `max_attempts` attempts.
    /// 创建预算集合，每个阶段允许 `max_attempts` 次尝试。
    pub fn new(max_attempts: u32) -> Self {
        Self {
            connection: RetryBudget::new(max_attempts),
            service_discovery: RetryBudget::new(max_attempts),
            transmission: RetryBudget::new(max_attempts),
            response: RetryBudget::new(max_attempts),
        }
    }

    /// Resets every phase counter. Used when escalating to failure so no
    /// stale count leaks into the next recovery cycle.
    ///
    /// 重置所有阶段计数器。升级为失败时使用，避免过期计数泄漏到下一个
    /// 恢复周期。
    pub fn reset_all(&mut self) {
        self.connection.reset();
        self.service_discovery.reset();
        self.transmission.reset();
        self.response.reset();
    }
}
