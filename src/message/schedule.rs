//! 定义了每周加热计划中一天的解码。
//! Defines the decoding of one day of the weekly heating schedule.

use crate::error::{Error, Result};
use chrono::{NaiveTime, Weekday};

/// One switching point of the daily schedule.
/// 每日计划中的一个切换点。
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    /// When this entry's temperature takes effect.
    /// 此条目的温度开始生效的时间。
    pub start: NaiveTime,
    /// The target temperature from `start` on, in degrees.
    /// 从 `start` 起的目标温度（度）。
    pub temperature: f32,
}

impl ScheduleEntry {
    /// Builds an entry from raw device units: time in 10-minute steps since
    /// midnight, temperature in half degrees.
    ///
    /// 从设备原始单位构建条目：时间为自午夜起的10分钟步数，温度为半度计数。
    pub fn from_raw(time: u8, temperature: u8) -> Result<Self> {
        let start = NaiveTime::from_num_seconds_from_midnight_opt(u32::from(time) * 600, 0)
            .ok_or(Error::InvalidDateTime)?;
        Ok(Self {
            start,
            temperature: f32::from(temperature) / 2.0,
        })
    }
}

/// The heating schedule of a single weekday.
/// 单个工作日的加热计划。
#[derive(Debug, Clone, PartialEq)]
pub struct DaySchedule {
    /// The day this schedule applies to.
    /// 此计划适用的日期。
    pub day: Weekday,
    /// The switching points, in wire order. Slots the device leaves unused
    /// (temperature zero) are omitted.
    /// 按线路顺序排列的切换点。设备未使用的槽位（温度为零）被省略。
    pub entries: Vec<ScheduleEntry>,
}

impl DaySchedule {
    /// Decodes the body of a schedule notification (everything after the
    /// opcode): the day index followed by seven time/temperature pairs.
    ///
    /// 解码计划通知的主体（操作码之后的所有内容）：日索引后跟七个
    /// 时间/温度对。
    pub fn decode(value: &[u8]) -> Result<Self> {
        if value.len() < 15 {
            return Err(Error::TruncatedMessage {
                expected: 15,
                got: value.len(),
            });
        }

        let day = decode_day(value[0])?;
        let mut entries = Vec::new();
        for pair in value[1..15].chunks_exact(2) {
            let (time, temperature) = (pair[0], pair[1]);
            if temperature != 0 {
                entries.push(ScheduleEntry::from_raw(time, temperature)?);
            }
        }
        Ok(Self { day, entries })
    }
}

/// The device numbers its week starting at Saturday.
/// 设备的一周从星期六开始编号。
fn decode_day(raw: u8) -> Result<Weekday> {
    match raw {
        0 => Ok(Weekday::Sat),
        1 => Ok(Weekday::Sun),
        2 => Ok(Weekday::Mon),
        3 => Ok(Weekday::Tue),
        4 => Ok(Weekday::Wed),
        5 => Ok(Weekday::Thu),
        6 => Ok(Weekday::Fri),
        other => Err(Error::UnexpectedMessage(other)),
    }
}
