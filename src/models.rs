use crate::error::{Result, WorkoutError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantityKind {
    HeartRate,
    Distance,
    Energy,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct QuantitySample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub kind: QuantityKind,
}

impl QuantitySample {
    pub fn new(kind: QuantityKind, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            value,
            kind,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active,
    Rest,
}

impl Phase {
    pub fn next(self) -> Self {
        match self {
            Phase::Active => Phase::Rest,
            Phase::Rest => Phase::Active,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Active => f.write_str("active"),
            Phase::Rest => f.write_str("rest"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Interval {
    pub index: u32,
    pub phase: Phase,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl Interval {
    pub fn open_at(index: u32, phase: Phase, at: DateTime<Utc>) -> Self {
        Self {
            index,
            phase,
            start: at,
            end: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// Two intervals per cycle, and interval indices are `u32`.
pub const MAX_CYCLES: u32 = u32::MAX / 2;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkoutConfiguration {
    #[serde(with = "duration_parts")]
    active_duration: Duration,
    #[serde(with = "duration_parts")]
    rest_duration: Duration,
    cycle_count: u32,
}

impl WorkoutConfiguration {
    pub fn new(active_duration: Duration, rest_duration: Duration, cycle_count: u32) -> Result<Self> {
        if active_duration <= Duration::zero() {
            return Err(WorkoutError::InvalidConfiguration(
                "active duration must be positive".into(),
            ));
        }
        if rest_duration <= Duration::zero() {
            return Err(WorkoutError::InvalidConfiguration(
                "rest duration must be positive".into(),
            ));
        }
        if cycle_count == 0 {
            return Err(WorkoutError::InvalidConfiguration(
                "cycle count must be at least 1".into(),
            ));
        }
        if cycle_count > MAX_CYCLES {
            return Err(WorkoutError::InvalidConfiguration(format!(
                "cycle count must be at most {}",
                MAX_CYCLES
            )));
        }
        Ok(Self {
            active_duration,
            rest_duration,
            cycle_count,
        })
    }

    pub fn active_duration(&self) -> Duration {
        self.active_duration
    }

    pub fn rest_duration(&self) -> Duration {
        self.rest_duration
    }

    pub fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    pub fn duration_of(&self, phase: Phase) -> Duration {
        match phase {
            Phase::Active => self.active_duration,
            Phase::Rest => self.rest_duration,
        }
    }

    /// Total intervals the workout will produce.
    pub fn interval_count(&self) -> u64 {
        u64::from(self.cycle_count) * 2
    }

    /// Nominal length of the whole workout if every tick lands on a boundary.
    /// `None` when it does not fit in a `Duration`.
    pub fn planned_duration(&self) -> Option<Duration> {
        let cycle = self.active_duration.checked_add(&self.rest_duration)?;
        cycle.checked_mul(i32::try_from(self.cycle_count).ok()?)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Active,
    Rest,
    Completed,
    Aborted,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Aborted)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::NotStarted => "not started",
            SessionState::Active => "active",
            SessionState::Rest => "rest",
            SessionState::Completed => "completed",
            SessionState::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IntervalStatistics {
    pub interval_index: u32,
    pub phase: Phase,
    #[serde(with = "duration_parts")]
    pub duration: Duration,
    pub total_distance: f64,
    pub total_energy: f64,
    /// `None` when the interval has no heart rate samples.
    pub average_heart_rate: Option<f64>,
    pub max_heart_rate: Option<f64>,
    pub heart_rate_samples: usize,
}

/// Finalized output of a completed workout. Fields are only reachable through
/// accessors so a record cannot change after it has been built.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkoutRecord {
    id: Uuid,
    configuration: WorkoutConfiguration,
    started_at: DateTime<Utc>,
    #[serde(with = "duration_parts")]
    total_duration: Duration,
    interval_statistics: Vec<IntervalStatistics>,
    created_at: DateTime<Utc>,
}

impl WorkoutRecord {
    pub(crate) fn new(
        configuration: WorkoutConfiguration,
        started_at: DateTime<Utc>,
        total_duration: Duration,
        interval_statistics: Vec<IntervalStatistics>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            configuration,
            started_at,
            total_duration,
            interval_statistics,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn configuration(&self) -> &WorkoutConfiguration {
        &self.configuration
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    pub fn interval_statistics(&self) -> &[IntervalStatistics] {
        &self.interval_statistics
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Database {
    pub records: Vec<WorkoutRecord>,
}

/// Durations as whole seconds plus nanoseconds, so nothing is lost on a
/// save/load round trip.
mod duration_parts {
    use chrono::Duration;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Parts {
        secs: i64,
        nanos: i32,
    }

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        Parts {
            secs: value.num_seconds(),
            nanos: value.subsec_nanos(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let parts = Parts::deserialize(deserializer)?;
        Duration::try_seconds(parts.secs)
            .and_then(|secs| secs.checked_add(&Duration::nanoseconds(i64::from(parts.nanos))))
            .ok_or_else(|| de::Error::custom("duration out of range"))
    }
}
