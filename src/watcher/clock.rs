//! Clock domains and time-point normalization.
//!
//! Modification times are stamped by the clock the filesystem uses for
//! metadata, while "now" comes from the wall clock. Every idle-time
//! comparison first moves the modification time into the wall-clock domain
//! and then compares whole seconds since the Unix epoch.

use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Signed distance between two readings of the same clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Offset {
    nanos: i128,
}

impl Offset {
    pub const ZERO: Offset = Offset { nanos: 0 };

    /// Offset pointing `d` into the future.
    pub fn forward(d: Duration) -> Self {
        Self {
            nanos: d.as_nanos() as i128,
        }
    }

    /// Offset pointing `d` into the past.
    pub fn backward(d: Duration) -> Self {
        Self {
            nanos: -(d.as_nanos() as i128),
        }
    }

    /// `to - from` for two wall-clock style time points.
    pub fn between(from: SystemTime, to: SystemTime) -> Self {
        match to.duration_since(from) {
            Ok(d) => Self::forward(d),
            Err(e) => Self::backward(e.duration()),
        }
    }

    pub fn is_negative(&self) -> bool {
        self.nanos < 0
    }

    /// Absolute length of the offset.
    pub fn magnitude(&self) -> Duration {
        let nanos = self.nanos.unsigned_abs();
        let secs = u64::try_from(nanos / 1_000_000_000).unwrap_or(u64::MAX);
        Duration::new(secs, (nanos % 1_000_000_000) as u32)
    }
}

/// A source of time points that can be differenced and shifted.
pub trait Clock {
    type TimePoint: Copy + Debug;

    /// Current reading of this clock.
    fn now(&self) -> Self::TimePoint;

    /// Signed distance `to - from`.
    fn offset(from: Self::TimePoint, to: Self::TimePoint) -> Offset;

    /// `at` moved by `by`. Left unshifted if the result is out of range.
    fn shift(at: Self::TimePoint, by: Offset) -> Self::TimePoint;
}

/// Clock whose readings live in the wall-clock domain.
///
/// The sweep loop is generic over this so tests can drive "now" by hand.
pub trait WallClock: Clock<TimePoint = SystemTime> + Send + Sync {}

impl<C> WallClock for C where C: Clock<TimePoint = SystemTime> + Send + Sync {}

fn shift_system_time(at: SystemTime, by: Offset) -> SystemTime {
    let magnitude = by.magnitude();
    let shifted = if by.is_negative() {
        at.checked_sub(magnitude)
    } else {
        at.checked_add(magnitude)
    };
    shifted.unwrap_or(at)
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type TimePoint = SystemTime;

    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn offset(from: SystemTime, to: SystemTime) -> Offset {
        Offset::between(from, to)
    }

    fn shift(at: SystemTime, by: Offset) -> SystemTime {
        shift_system_time(at, by)
    }
}

/// The clock filesystem metadata is stamped with.
///
/// On Linux this reads the same realtime source as [`SystemClock`], so
/// converting from it is an identity up to the time between the two samples.
/// It is kept as a separate domain so the conversion stays explicit.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileClock;

impl Clock for FileClock {
    type TimePoint = SystemTime;

    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn offset(from: SystemTime, to: SystemTime) -> Offset {
        Offset::between(from, to)
    }

    fn shift(at: SystemTime, by: Offset) -> SystemTime {
        shift_system_time(at, by)
    }
}

/// Wall clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: SystemTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = shift_system_time(*now, Offset::forward(by));
    }
}

impl Clock for ManualClock {
    type TimePoint = SystemTime;

    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn offset(from: SystemTime, to: SystemTime) -> Offset {
        Offset::between(from, to)
    }

    fn shift(at: SystemTime, by: Offset) -> SystemTime {
        shift_system_time(at, by)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    type TimePoint = C::TimePoint;

    fn now(&self) -> Self::TimePoint {
        (**self).now()
    }

    fn offset(from: Self::TimePoint, to: Self::TimePoint) -> Offset {
        C::offset(from, to)
    }

    fn shift(at: Self::TimePoint, by: Offset) -> Self::TimePoint {
        C::shift(at, by)
    }
}

/// Approximate conversion of `timepoint` from the `source` clock domain to
/// the `dest` clock domain.
///
/// Both clocks are sampled now; the distance between `timepoint` and the
/// source's current reading is applied to the destination's current reading.
/// Assumes both clocks advanced at the same rate since `timepoint` was taken.
pub fn convert_timepoint<S, D>(timepoint: S::TimePoint, source: &S, dest: &D) -> D::TimePoint
where
    S: Clock,
    D: Clock,
{
    let offset = S::offset(source.now(), timepoint);
    D::shift(dest.now(), offset)
}

/// Whole seconds since the Unix epoch, truncated toward zero.
pub fn epoch_secs(timepoint: SystemTime) -> i64 {
    match timepoint.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_secs()).unwrap_or(i64::MAX),
    }
}

/// Seconds since `modified` (a filesystem time point), measured on `wall`.
///
/// Negative when the modification time lies in the future.
pub fn idle_secs<C: WallClock>(modified: SystemTime, wall: &C) -> i64 {
    let last_modified = epoch_secs(convert_timepoint(modified, &FileClock, wall));
    epoch_secs(wall.now()).saturating_sub(last_modified)
}

/// True when `idle_secs` is strictly past `threshold`.
pub fn exceeds_threshold(idle_secs: i64, threshold: Duration) -> bool {
    idle_secs > i64::try_from(threshold.as_secs()).unwrap_or(i64::MAX)
}
