//! TimeValue - 単位付きの符号付き期間
//!
//! ワイヤ上では `i64` + 単位タグ（1 byte）で表現します。
//! 負の値も表現できますが、リクエストの validate() で弾きます。

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Unit of a [`TimeValue`]. The discriminant is the wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TimeUnit {
    Nanoseconds = 0,
    Microseconds = 1,
    Milliseconds = 2,
    Seconds = 3,
    Minutes = 4,
    Hours = 5,
    Days = 6,
}

impl TimeUnit {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => TimeUnit::Nanoseconds,
            1 => TimeUnit::Microseconds,
            2 => TimeUnit::Milliseconds,
            3 => TimeUnit::Seconds,
            4 => TimeUnit::Minutes,
            5 => TimeUnit::Hours,
            6 => TimeUnit::Days,
            _ => return None,
        })
    }

    fn nanos_per_unit(self) -> i128 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Minutes => 60 * 1_000_000_000,
            TimeUnit::Hours => 3_600 * 1_000_000_000,
            TimeUnit::Days => 86_400 * 1_000_000_000,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "nanos",
            TimeUnit::Microseconds => "micros",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "m",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
        }
    }
}

/// A signed duration tagged with the unit it was expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeValue {
    duration: i64,
    unit: TimeUnit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeValueError {
    #[error("failed to parse time value [{0}]: expected <number><unit> with unit one of nanos, micros, ms, s, m, h, d")]
    Unparsable(String),
}

impl TimeValue {
    pub const ZERO: TimeValue = TimeValue::new(0, TimeUnit::Milliseconds);
    /// `-1` の慣用表現。
    pub const MINUS_ONE: TimeValue = TimeValue::new(-1, TimeUnit::Milliseconds);

    pub const fn new(duration: i64, unit: TimeUnit) -> Self {
        Self { duration, unit }
    }

    pub const fn from_millis(ms: i64) -> Self {
        Self::new(ms, TimeUnit::Milliseconds)
    }

    pub const fn from_secs(secs: i64) -> Self {
        Self::new(secs, TimeUnit::Seconds)
    }

    pub const fn from_minutes(minutes: i64) -> Self {
        Self::new(minutes, TimeUnit::Minutes)
    }

    pub const fn from_days(days: i64) -> Self {
        Self::new(days, TimeUnit::Days)
    }

    pub fn duration(&self) -> i64 {
        self.duration
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn is_negative(&self) -> bool {
        self.duration < 0
    }

    pub fn as_nanos(&self) -> i128 {
        self.duration as i128 * self.unit.nanos_per_unit()
    }

    /// `None` for negative values; saturates at `u64::MAX` nanoseconds.
    pub fn to_std(&self) -> Option<Duration> {
        let nanos = self.as_nanos();
        if nanos < 0 {
            return None;
        }
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.duration, self.unit.suffix())
    }
}

impl FromStr for TimeValue {
    type Err = TimeValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        match raw {
            "-1" => return Ok(TimeValue::MINUS_ONE),
            "0" => return Ok(TimeValue::ZERO),
            _ => {}
        }
        // 長いサフィックスから先に試す（"ms" と "s" / "m" の曖昧さ回避）
        const SUFFIXES: [(&str, TimeUnit); 7] = [
            ("nanos", TimeUnit::Nanoseconds),
            ("micros", TimeUnit::Microseconds),
            ("ms", TimeUnit::Milliseconds),
            ("s", TimeUnit::Seconds),
            ("m", TimeUnit::Minutes),
            ("h", TimeUnit::Hours),
            ("d", TimeUnit::Days),
        ];
        let lower = raw.to_ascii_lowercase();
        for (suffix, unit) in SUFFIXES {
            if let Some(number) = lower.strip_suffix(suffix) {
                return number
                    .trim()
                    .parse::<i64>()
                    .map(|duration| TimeValue::new(duration, unit))
                    .map_err(|_| TimeValueError::Unparsable(s.to_string()));
            }
        }
        Err(TimeValueError::Unparsable(s.to_string()))
    }
}

impl TryFrom<String> for TimeValue {
    type Error = TimeValueError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeValue> for String {
    fn from(tv: TimeValue) -> Self {
        tv.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("5s", TimeValue::from_secs(5))]
    #[case("100ms", TimeValue::from_millis(100))]
    #[case("2m", TimeValue::from_minutes(2))]
    #[case("3h", TimeValue::new(3, TimeUnit::Hours))]
    #[case("5d", TimeValue::from_days(5))]
    #[case("7micros", TimeValue::new(7, TimeUnit::Microseconds))]
    #[case("9nanos", TimeValue::new(9, TimeUnit::Nanoseconds))]
    #[case(" 10S ", TimeValue::from_secs(10))]
    #[case("-1", TimeValue::MINUS_ONE)]
    #[case("0", TimeValue::ZERO)]
    #[case("-5s", TimeValue::from_secs(-5))]
    fn parses(#[case] raw: &str, #[case] expected: TimeValue) {
        assert_eq!(raw.parse::<TimeValue>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("5")]
    #[case("fives")]
    #[case("5y")]
    #[case("1.5s")]
    fn rejects(#[case] raw: &str) {
        assert_eq!(
            raw.parse::<TimeValue>(),
            Err(TimeValueError::Unparsable(raw.to_string()))
        );
    }

    #[test]
    fn display_uses_unit_suffix() {
        assert_eq!(TimeValue::from_millis(250).to_string(), "250ms");
        assert_eq!(TimeValue::from_days(5).to_string(), "5d");
    }

    #[test]
    fn to_std_is_none_for_negative() {
        assert_eq!(TimeValue::from_secs(-1).to_std(), None);
        assert_eq!(
            TimeValue::from_minutes(2).to_std(),
            Some(Duration::from_secs(120))
        );
    }

    #[test]
    fn as_nanos_normalises_units() {
        assert!(TimeValue::from_secs(1).as_nanos() > TimeValue::from_millis(999).as_nanos());
        assert_eq!(
            TimeValue::from_secs(60).as_nanos(),
            TimeValue::from_minutes(1).as_nanos()
        );
    }

    #[test]
    fn tags_are_stable() {
        for tag in 0..=6u8 {
            assert_eq!(TimeUnit::from_tag(tag).unwrap().tag(), tag);
        }
        assert_eq!(TimeUnit::from_tag(7), None);
    }
}
