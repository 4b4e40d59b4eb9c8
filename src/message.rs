//! The message module, containing the wire codec for outgoing commands and
//! incoming notifications.
//! message 模块，包含发出命令和收到通知的线路编解码。

pub mod command;
pub mod schedule;
pub mod status;

pub use command::{CommandKind, OperatingMode, PresetTemperature, SendMessage};
pub use schedule::{DaySchedule, ScheduleEntry};
pub use status::{ReceiveMessage, ThermostatStatus};
