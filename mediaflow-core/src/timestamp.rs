//! Timestamp and time base handling.
//!
//! Timestamps are integers in stream time base units with an explicit
//! unknown sentinel; rescaling between bases preserves unknownness.

use crate::rational::Rational;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

/// A time base: the fraction of a second represented by one timestamp tick.
///
/// Common bases:
/// - 1/90000 for MPEG transport streams
/// - 1/48000 for 48 kHz audio
/// - 1/1000 for milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeBase(pub Rational);

impl TimeBase {
    /// Standard MPEG time base (1/90000).
    pub const MPEG: Self = Self(Rational { num: 1, den: 90000 });

    /// Millisecond time base (1/1000).
    pub const MILLIS: Self = Self(Rational { num: 1, den: 1000 });

    /// Microsecond time base (1/1000000).
    pub const MICROS: Self = Self(Rational {
        num: 1,
        den: 1_000_000,
    });

    /// Create a new time base from numerator and denominator.
    pub fn new(num: i64, den: i64) -> Self {
        Self(Rational::new(num, den))
    }

    /// Time base for a sample rate in Hz (1/rate).
    pub fn for_sample_rate(rate: u32) -> Self {
        Self::new(1, rate as i64)
    }

    /// Convert a tick count from this base into `target` ticks.
    pub fn convert(&self, value: i64, target: TimeBase) -> i64 {
        self.0.rescale(value, target.0)
    }

    /// Convert a tick count to seconds.
    pub fn to_seconds(&self, value: i64) -> f64 {
        value as f64 * self.0.to_f64()
    }

    /// Get the underlying rational.
    pub fn as_rational(&self) -> Rational {
        self.0
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::MPEG
    }
}

impl From<Rational> for TimeBase {
    fn from(r: Rational) -> Self {
        Self(r)
    }
}

impl From<(i64, i64)> for TimeBase {
    fn from((num, den): (i64, i64)) -> Self {
        Self::new(num, den)
    }
}

/// A timestamp with an associated time base.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    /// The raw tick value, or [`Timestamp::UNKNOWN`].
    pub value: i64,
    /// The time base interpreting the value.
    pub time_base: TimeBase,
}

impl Timestamp {
    /// Sentinel tick value for an unknown timestamp.
    pub const UNKNOWN: i64 = i64::MIN;

    /// Create a new timestamp.
    pub fn new(value: i64, time_base: TimeBase) -> Self {
        Self { value, time_base }
    }

    /// Create an unknown timestamp.
    pub fn unknown() -> Self {
        Self {
            value: Self::UNKNOWN,
            time_base: TimeBase::default(),
        }
    }

    /// Check if this timestamp carries a defined value.
    pub fn is_known(&self) -> bool {
        self.value != Self::UNKNOWN
    }

    /// Rescale to another time base. Unknown stays unknown.
    pub fn rescale(&self, target: TimeBase) -> Self {
        if !self.is_known() {
            return Self::unknown();
        }
        Self {
            value: self.time_base.convert(self.value, target),
            time_base: target,
        }
    }

    /// Convert to seconds, if known.
    pub fn to_seconds(&self) -> Option<f64> {
        self.is_known().then(|| self.time_base.to_seconds(self.value))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::unknown()
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        if !self.is_known() || !other.is_known() {
            return !self.is_known() && !other.is_known();
        }
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_known(), other.is_known()) {
            (false, false) => return Ordering::Equal,
            (false, true) => return Ordering::Less,
            (true, false) => return Ordering::Greater,
            (true, true) => {}
        }
        // Compare in the finer of the two bases to avoid precision loss.
        let tb = if self.time_base.0.den > other.time_base.0.den {
            self.time_base
        } else {
            other.time_base
        };
        self.rescale(tb).value.cmp(&other.rescale(tb).value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(secs) = self.to_seconds() {
            let hours = (secs / 3600.0) as u32;
            let mins = ((secs % 3600.0) / 60.0) as u32;
            let secs = secs % 60.0;
            write!(f, "{:02}:{:02}:{:06.3}", hours, mins, secs)
        } else {
            write!(f, "UNKNOWN")
        }
    }
}

/// A duration with an associated time base. Always non-negative in
/// well-formed streams; zero doubles as "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration {
    /// The raw tick count.
    pub value: i64,
    /// The time base interpreting the value.
    pub time_base: TimeBase,
}

impl Duration {
    /// Create a new duration.
    pub fn new(value: i64, time_base: TimeBase) -> Self {
        Self { value, time_base }
    }

    /// The zero duration.
    pub fn zero() -> Self {
        Self {
            value: 0,
            time_base: TimeBase::default(),
        }
    }

    /// Check if this duration is zero.
    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Rescale to another time base.
    pub fn rescale(&self, target: TimeBase) -> Self {
        Self {
            value: self.time_base.convert(self.value, target),
            time_base: target,
        }
    }

    /// Convert to seconds.
    pub fn to_seconds(&self) -> f64 {
        self.time_base.to_seconds(self.value)
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for Duration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        let rhs = rhs.rescale(self.time_base);
        Self {
            value: self.value + rhs.value,
            time_base: self.time_base,
        }
    }
}

impl Sub for Duration {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        let rhs = rhs.rescale(self.time_base);
        Self {
            value: self.value - rhs.value,
            time_base: self.time_base,
        }
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Self::Output {
        if !self.is_known() {
            return self;
        }
        let rhs = rhs.rescale(self.time_base);
        Timestamp {
            value: self.value + rhs.value,
            time_base: self.time_base,
        }
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: Duration) -> Self::Output {
        if !self.is_known() {
            return self;
        }
        let rhs = rhs.rescale(self.time_base);
        Timestamp {
            value: self.value - rhs.value,
            time_base: self.time_base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_base_convert() {
        assert_eq!(TimeBase::MILLIS.convert(1000, TimeBase::MPEG), 90000);
        assert_eq!(TimeBase::for_sample_rate(48000).convert(48000, TimeBase::MILLIS), 1000);
    }

    #[test]
    fn test_unknown_propagates() {
        let ts = Timestamp::unknown();
        assert!(!ts.is_known());
        assert!(!ts.rescale(TimeBase::MPEG).is_known());
        assert!(ts.to_seconds().is_none());
    }

    #[test]
    fn test_cross_base_equality() {
        let a = Timestamp::new(90000, TimeBase::MPEG);
        let b = Timestamp::new(1000, TimeBase::MILLIS);
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_sorts_first() {
        let mut v = vec![
            Timestamp::new(5, TimeBase::MILLIS),
            Timestamp::unknown(),
            Timestamp::new(1, TimeBase::MILLIS),
        ];
        v.sort();
        assert!(!v[0].is_known());
        assert_eq!(v[1].value, 1);
    }

    #[test]
    fn test_timestamp_duration_arithmetic() {
        let ts = Timestamp::new(100, TimeBase::MILLIS);
        let d = Duration::new(900, TimeBase::MILLIS);
        assert_eq!((ts + d).value, 1000);
        assert_eq!((ts - d).value, -800);
        assert!((Timestamp::unknown() + d).value == Timestamp::UNKNOWN);
    }

    #[test]
    fn test_display() {
        let ts = Timestamp::new(3_723_500, TimeBase::MILLIS);
        assert_eq!(format!("{}", ts), "01:02:03.500");
        assert_eq!(format!("{}", Timestamp::unknown()), "UNKNOWN");
    }
}
