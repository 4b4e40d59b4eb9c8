//! 定义了可以写入控制特征值的所有命令及其编码。
//! Defines all commands that can be written to the control characteristic,
//! and their encoding.

use bytes::Bytes;
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::fmt;

/// Command opcodes. The first byte on the wire.
/// 命令操作码，线路上的第一个字节。
const OP_SET_DATETIME: u8 = 0x03;
const OP_SET_ECO_AND_COMFORT_TEMPERATURE: u8 = 0x11;
const OP_SET_OPERATING_MODE: u8 = 0x40;
const OP_SET_TARGET_TEMPERATURE: u8 = 0x41;
const OP_SWITCH_TO_COMFORT_TEMPERATURE: u8 = 0x43;
const OP_SWITCH_TO_ECO_TEMPERATURE: u8 = 0x44;
const OP_SET_BOOST_MODE: u8 = 0x45;

const PRIMITIVE_OPERATING_MODE_MANUAL: u8 = 0x40;
const PRIMITIVE_OPERATING_MODE_SCHEDULED: u8 = 0x00;
const PRIMITIVE_BOOST_MODE_ON: u8 = 0xFF;
const PRIMITIVE_BOOST_MODE_OFF: u8 = 0x00;

/// The valve is fully open below this target temperature ("always on").
/// 目标温度达到此值时阀门完全打开（"常开"）。
pub const ALWAYS_ON_TEMPERATURE: f32 = 30.0;

/// The valve is fully closed at this target temperature ("always off").
/// 目标温度为此值时阀门完全关闭（"常关"）。
pub const ALWAYS_OFF_TEMPERATURE: f32 = 4.5;

/// The operating mode of the thermostat.
/// 恒温器的运行模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    /// The device follows its weekly schedule.
    /// 设备遵循其每周计划。
    Scheduled,
    /// The device holds the manually set target temperature.
    /// 设备保持手动设定的目标温度。
    Manual,
}

/// Preset temperature selections offered by the device.
/// 设备提供的预设温度选项。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetTemperature {
    /// Valve permanently open.
    /// 阀门常开。
    On,
    /// Valve permanently closed.
    /// 阀门常关。
    Off,
    /// The stored eco temperature.
    /// 存储的节能温度。
    Eco,
    /// The stored comfort temperature.
    /// 存储的舒适温度。
    Comfort,
}

/// The kind of a command. The queue coalesces commands by kind: a newly
/// enqueued command replaces any queued (not yet in-flight) command of the
/// same kind.
///
/// 命令的种类。队列按种类合并命令：新入队的命令会替换任何同种类的
/// 已排队（尚未在途）命令。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Pushes the current time to the device, which answers with a full
    /// status notification.
    /// 向设备推送当前时间，设备会以完整的状态通知作答。
    QueryStatus,
    /// Sets the target temperature.
    /// 设置目标温度。
    SetTargetTemperature,
    /// Stores the eco and comfort temperature pair.
    /// 存储节能与舒适温度对。
    SetEcoAndComfortTemperature,
    /// Switches between scheduled and manual operation.
    /// 在计划运行和手动运行之间切换。
    SetOperatingMode,
    /// Turns boost mode on or off.
    /// 打开或关闭快速加热模式。
    SetBoostMode,
    /// Switches to one of the stored preset temperatures.
    /// 切换到存储的预设温度之一。
    SwitchToPresetTemperature,
}

/// A fully encoded command, ready to be written to the control
/// characteristic.
///
/// 完整编码的命令，可直接写入控制特征值。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessage {
    kind: CommandKind,
    payload: Bytes,
}

impl SendMessage {
    fn new(kind: CommandKind, sequence: Vec<u8>) -> Self {
        Self {
            kind,
            payload: Bytes::from(sequence),
        }
    }

    /// Queries the device status. The device has no dedicated status-read
    /// command; writing the current time makes it answer with a full status
    /// notification.
    ///
    /// 查询设备状态。设备没有专门的状态读取命令；写入当前时间会使其
    /// 以完整的状态通知作答。
    pub fn query_status(now: NaiveDateTime) -> Self {
        Self::update_current_time(now)
    }

    /// Pushes the current time to the device clock.
    /// 向设备时钟推送当前时间。
    pub fn update_current_time(now: NaiveDateTime) -> Self {
        Self::new(
            CommandKind::QueryStatus,
            vec![
                OP_SET_DATETIME,
                (now.year().rem_euclid(100)) as u8,
                now.month() as u8,
                now.day() as u8,
                now.hour() as u8,
                now.minute() as u8,
                now.second() as u8,
            ],
        )
    }

    /// Sets the target temperature, encoded in 0.5 degree steps.
    /// 设置目标温度，以0.5度为步长编码。
    pub fn set_target_temperature(temperature: f32) -> Self {
        Self::new(
            CommandKind::SetTargetTemperature,
            vec![OP_SET_TARGET_TEMPERATURE, half_degrees(temperature)],
        )
    }

    /// Stores the comfort and eco temperature pair on the device.
    /// 在设备上存储舒适与节能温度对。
    pub fn set_eco_and_comfort_temperature(comfort: f32, eco: f32) -> Self {
        Self::new(
            CommandKind::SetEcoAndComfortTemperature,
            vec![
                OP_SET_ECO_AND_COMFORT_TEMPERATURE,
                half_degrees(comfort),
                half_degrees(eco),
            ],
        )
    }

    /// Switches between scheduled and manual operation.
    /// 在计划运行和手动运行之间切换。
    pub fn set_operating_mode(mode: OperatingMode) -> Self {
        let primitive = match mode {
            OperatingMode::Manual => PRIMITIVE_OPERATING_MODE_MANUAL,
            OperatingMode::Scheduled => PRIMITIVE_OPERATING_MODE_SCHEDULED,
        };
        Self::new(
            CommandKind::SetOperatingMode,
            vec![OP_SET_OPERATING_MODE, primitive],
        )
    }

    /// Turns boost mode on or off.
    /// 打开或关闭快速加热模式。
    pub fn set_boost_mode(on: bool) -> Self {
        let primitive = if on {
            PRIMITIVE_BOOST_MODE_ON
        } else {
            PRIMITIVE_BOOST_MODE_OFF
        };
        Self::new(CommandKind::SetBoostMode, vec![OP_SET_BOOST_MODE, primitive])
    }

    /// Switches to one of the preset temperatures. `On` and `Off` are plain
    /// target-temperature writes at the device's limit values; `Eco` and
    /// `Comfort` use dedicated single-byte commands.
    ///
    /// 切换到预设温度之一。`On` 和 `Off` 是以设备极限值进行的普通目标温度
    /// 写入；`Eco` 和 `Comfort` 使用专用的单字节命令。
    pub fn set_preset_temperature(preset: PresetTemperature) -> Self {
        match preset {
            PresetTemperature::On => Self::set_target_temperature(ALWAYS_ON_TEMPERATURE),
            PresetTemperature::Off => Self::set_target_temperature(ALWAYS_OFF_TEMPERATURE),
            PresetTemperature::Eco => Self::new(
                CommandKind::SwitchToPresetTemperature,
                vec![OP_SWITCH_TO_ECO_TEMPERATURE],
            ),
            PresetTemperature::Comfort => Self::new(
                CommandKind::SwitchToPresetTemperature,
                vec![OP_SWITCH_TO_COMFORT_TEMPERATURE],
            ),
        }
    }

    /// The kind this command coalesces under.
    /// 此命令用于合并的种类。
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// The encoded byte sequence to write to the control characteristic.
    /// 要写入控制特征值的已编码字节序列。
    pub fn encode(&self) -> Bytes {
        self.payload.clone()
    }
}

impl fmt::Display for SendMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} [", self.kind)?;
        for (i, byte) in self.payload.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "]")
    }
}

/// Temperatures travel as whole half-degree counts.
/// 温度以半度计数的整数传输。
fn half_degrees(temperature: f32) -> u8 {
    (temperature * 2.0).round() as u8
}
