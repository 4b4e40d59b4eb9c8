//! 定义了通知特征值上收到的消息的解码。
//! Defines the decoding of messages received on the notification
//! characteristic.

use super::command::OperatingMode;
use super::schedule::DaySchedule;
use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};

/// Notification opcodes. The first byte of a received message.
/// 通知操作码，收到消息的第一个字节。
const OP_STATUS: u8 = 0x02;
const OP_TIME_SCHEDULE: u8 = 0x21;

/// The second byte of a status notification is a fixed marker.
/// 状态通知的第二个字节是固定标记。
const STATUS_MARKER: u8 = 0x01;

const MODE_MASK: u8 = 0x01;
const VACATION_MASK: u8 = 0x02;
const BOOST_MASK: u8 = 0x04;
const DST_MASK: u8 = 0x08;
const WINDOW_MASK: u8 = 0x10;
const LOCK_MASK: u8 = 0x20;
const BATTERY_MASK: u8 = 0x80;

/// A decoded message from the notification characteristic.
/// 从通知特征值解码出的消息。
#[derive(Debug, Clone, PartialEq)]
pub enum ReceiveMessage {
    /// A full device status report.
    /// 完整的设备状态报告。
    Status(ThermostatStatus),
    /// One day of the weekly heating schedule.
    /// 每周加热计划中的一天。
    Schedule(DaySchedule),
}

/// The decoded general status of the thermostat.
/// 解码出的恒温器总体状态。
#[derive(Debug, Clone, PartialEq)]
pub struct ThermostatStatus {
    /// Scheduled or manual operation.
    /// 计划运行或手动运行。
    pub operating_mode: OperatingMode,
    /// Vacation mode is active.
    /// 假期模式已激活。
    pub vacation_mode: bool,
    /// Boost mode is active.
    /// 快速加热模式已激活。
    pub boost_mode: bool,
    /// The device clock applies daylight saving time.
    /// 设备时钟应用夏令时。
    pub daylight_saving_time: bool,
    /// The open-window drop is active.
    /// 开窗降温已激活。
    pub window_mode: bool,
    /// The physical buttons are locked.
    /// 物理按键已锁定。
    pub user_lock: bool,
    /// The battery is low.
    /// 电池电量低。
    pub low_battery: bool,
    /// Valve opening in percent, 0 to 100.
    /// 阀门开度百分比，0到100。
    pub valve_percent: u8,
    /// The current target temperature in degrees, 0.5 degree resolution.
    /// 当前目标温度（度），分辨率0.5度。
    pub target_temperature: f32,
    /// When vacation mode is active, the time it ends.
    /// 假期模式激活时，其结束时间。
    pub vacation_end: Option<NaiveDateTime>,
}

impl ReceiveMessage {
    /// Decodes a raw notification. The opcode in the first byte selects the
    /// message layout.
    ///
    /// 解码原始通知。第一个字节中的操作码决定消息布局。
    pub fn decode(raw: &[u8]) -> Result<Self> {
        let (&opcode, value) = raw.split_first().ok_or(Error::TruncatedMessage {
            expected: 1,
            got: 0,
        })?;
        match opcode {
            OP_STATUS => Ok(Self::Status(decode_status(value)?)),
            OP_TIME_SCHEDULE => Ok(Self::Schedule(DaySchedule::decode(value)?)),
            other => Err(Error::UnexpectedMessage(other)),
        }
    }
}

/// Decodes the body of a status notification (everything after the opcode).
///
/// Layout: marker, status flags, valve percent, one unused byte, target
/// temperature in half degrees; when the vacation flag is set, four more
/// bytes follow: day, year since 2000, month, half-hours since midnight.
///
/// 解码状态通知的主体（操作码之后的所有内容）。
/// 布局：标记、状态标志、阀门百分比、一个未使用字节、以半度表示的目标
/// 温度；假期标志置位时再跟四个字节：日、2000年起的年、月、自午夜起的
/// 半小时数。
fn decode_status(value: &[u8]) -> Result<ThermostatStatus> {
    if value.len() < 5 {
        return Err(Error::TruncatedMessage {
            expected: 5,
            got: value.len(),
        });
    }
    if value[0] != STATUS_MARKER {
        return Err(Error::UnexpectedStatusMarker(value[0]));
    }

    let status_byte = value[1];
    let valve_byte = value[2];
    let temperature_byte = value[4];

    let operating_mode = if status_byte & MODE_MASK == 0 {
        OperatingMode::Scheduled
    } else {
        OperatingMode::Manual
    };
    let vacation_mode = status_byte & VACATION_MASK != 0;

    let vacation_end = if vacation_mode {
        if value.len() < 9 {
            return Err(Error::TruncatedMessage {
                expected: 9,
                got: value.len(),
            });
        }
        Some(decode_vacation_end(value[5], value[6], value[7], value[8])?)
    } else {
        None
    };

    Ok(ThermostatStatus {
        operating_mode,
        vacation_mode,
        boost_mode: status_byte & BOOST_MASK != 0,
        daylight_saving_time: status_byte & DST_MASK != 0,
        window_mode: status_byte & WINDOW_MASK != 0,
        user_lock: status_byte & LOCK_MASK != 0,
        low_battery: status_byte & BATTERY_MASK != 0,
        valve_percent: valve_byte,
        target_temperature: f32::from(temperature_byte) / 2.0,
        vacation_end,
    })
}

/// The vacation end travels as day, year since 2000, month, and half-hours
/// since midnight.
/// 假期结束时间以日、2000年起的年、月、自午夜起的半小时数传输。
fn decode_vacation_end(day: u8, year: u8, month: u8, half_hours: u8) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2000 + i32::from(year), u32::from(month), u32::from(day))
        .and_then(|date| {
            date.and_hms_opt(u32::from(half_hours / 2), u32::from(half_hours % 2) * 30, 0)
        })
        .ok_or(Error::InvalidDateTime)
}
