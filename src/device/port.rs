//! Traits for abstracting over the platform Bluetooth transport and for
//! receiving decoded device updates.
//!
//! 对平台蓝牙传输进行抽象、以及接收解码后设备更新的trait。

use crate::device::state::DeviceStatus;
use crate::message::command::{OperatingMode, SendMessage};
use crate::message::schedule::DaySchedule;
use async_trait::async_trait;
use chrono::NaiveDateTime;

/// The transport port to one thermostat peripheral.
///
/// Implementations wrap the operating system's Bluetooth stack. Every request
/// returns whether the stack *accepted* the request; completion is reported
/// asynchronously through the session's event feed. All methods are invoked
/// from the session's single execution stream only.
///
/// 通往单个恒温器外设的传输端口。
///
/// 实现包装操作系统的蓝牙栈。每个请求返回蓝牙栈是否*接受*了该请求；
/// 完成情况通过会话的事件通道异步上报。所有方法只会从会话的单一执行流
/// 中调用。
#[async_trait]
pub trait ThermostatPort: Send + Sync + 'static {
    /// Asks the stack to open a transport connection to the device.
    /// 请求蓝牙栈打开到设备的传输连接。
    async fn request_connection(&self) -> bool;

    /// Asks the stack to close the transport connection.
    /// 请求蓝牙栈关闭传输连接。
    async fn request_disconnect(&self) -> bool;

    /// Asks the stack to discover the device's GATT services.
    /// 请求蓝牙栈发现设备的GATT服务。
    async fn request_discover_services(&self) -> bool;

    /// Resolves the control and notification characteristic handles from the
    /// discovered services. Returns whether both are present.
    ///
    /// 从已发现的服务中解析控制与通知特征值句柄。返回两者是否都存在。
    async fn fetch_characteristics(&self) -> bool;

    /// Whether the characteristic handles are already known from an earlier
    /// discovery, making a fresh discovery connection unnecessary.
    ///
    /// 特征值句柄是否已从先前的发现中得知，从而无需再建立发现连接。
    fn characteristics_available(&self) -> bool;

    /// Writes an encoded command to the control characteristic.
    /// 将编码后的命令写入控制特征值。
    async fn transmit(&self, message: &SendMessage) -> bool;
}

/// Listener for device status and decoded field updates.
///
/// All methods default to no-ops so implementors only override what they
/// consume. Callbacks run on the session's execution stream and must not
/// block.
///
/// 设备状态与解码字段更新的监听器。
///
/// 所有方法默认为空操作，实现者只需覆盖其消费的部分。回调在会话的执行流
/// 上运行，不得阻塞。
pub trait ThermostatUpdateListener: Send + Sync + 'static {
    /// The derived connection status changed. Emitted only on change.
    /// 派生的连接状态发生了变化。仅在变化时发出。
    fn on_device_status_changed(&self, _status: DeviceStatus) {}

    /// 目标温度已更新。
    fn on_target_temperature_updated(&self, _temperature: f32) {}

    /// 运行模式已更新。
    fn on_operating_mode_updated(&self, _mode: OperatingMode) {}

    /// 假期模式开关状态。
    fn on_vacation_mode_changed(&self, _active: bool) {}

    /// The end of the vacation period, when vacation mode is active.
    /// 假期模式激活时的假期结束时间。
    fn on_vacation_end_updated(&self, _end: Option<NaiveDateTime>) {}

    /// 开窗模式开关状态。
    fn on_window_mode_changed(&self, _active: bool) {}

    /// 快速加热模式开关状态。
    fn on_boost_mode_changed(&self, _active: bool) {}

    /// 夏令时开关状态。
    fn on_daylight_saving_time_changed(&self, _active: bool) {}

    /// 按键锁开关状态。
    fn on_user_lock_changed(&self, _active: bool) {}

    /// 低电量标志。
    fn on_low_battery_changed(&self, _low: bool) {}

    /// 阀门开度百分比已更新。
    fn on_valve_status_updated(&self, _percent: u8) {}

    /// One day of the weekly schedule was reported.
    /// 上报了每周计划中的一天。
    fn on_schedule_updated(&self, _schedule: &DaySchedule) {}
}
