use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// A time of day as an offset from midnight, in seconds.
///
/// Unlike `NaiveTime` this can hold out-of-range values such as `24:00` or
/// `-01:30`, so callers can receive them unchanged and reject them during
/// validation instead of failing at deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(i64);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    pub const fn hm(hours: i64, minutes: i64) -> Self {
        Self(hours * 3600 + minutes * 60)
    }

    pub fn seconds(&self) -> i64 {
        self.0
    }

    /// `[00:00:00, 24:00:00)`
    pub fn is_within_day(&self) -> bool {
        (0..SECONDS_PER_DAY).contains(&self.0)
    }

    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        if !self.is_within_day() {
            return None;
        }
        NaiveTime::from_num_seconds_from_midnight_opt(self.0 as u32, 0)
    }

    /// `HHMM`, used in template codes.
    pub fn compact(&self) -> String {
        let minutes = self.0.rem_euclid(SECONDS_PER_DAY) / 60;
        format!("{:02}{:02}", minutes / 60, minutes % 60)
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(time: NaiveTime) -> Self {
        Self(time.num_seconds_from_midnight() as i64)
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(
            f,
            "{}{:02}:{:02}:{:02}",
            sign,
            abs / 3600,
            (abs % 3600) / 60,
            abs % 60
        )
    }
}

impl std::str::FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let parts: Vec<&str> = body.split(':').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(format!("Invalid time of day: {}", s));
        }

        let parse = |part: &str| {
            part.parse::<i64>()
                .map_err(|_| format!("Invalid time of day: {}", s))
        };
        let hours = parse(parts[0])?;
        let minutes = parse(parts[1])?;
        let seconds = match parts.get(2) {
            Some(part) => parse(part)?,
            None => 0,
        };
        if !(0..60).contains(&minutes) || !(0..60).contains(&seconds) || hours < 0 {
            return Err(format!("Invalid time of day: {}", s));
        }

        let total = hours
            .checked_mul(3600)
            .and_then(|h| h.checked_add(minutes * 60 + seconds))
            .ok_or_else(|| format!("Invalid time of day: {}", s))?;
        Ok(Self(if negative { -total } else { total }))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Day-of-week applicability flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DayFlags {
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
}

impl DayFlags {
    pub fn weekdays() -> Self {
        Self {
            monday: true,
            tuesday: true,
            wednesday: true,
            thursday: true,
            friday: true,
            saturday: false,
            sunday: false,
        }
    }

    pub fn any(&self) -> bool {
        self.monday
            || self.tuesday
            || self.wednesday
            || self.thursday
            || self.friday
            || self.saturday
            || self.sunday
    }
}
