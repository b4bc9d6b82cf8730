use crate::error::{Result, WorkoutError};
use crate::models::{QuantityKind, QuantitySample};
use chrono::{DateTime, Duration, Utc};
use std::sync::{PoisonError, RwLock};

pub const DEFAULT_CLOCK_SKEW_TOLERANCE_SECS: i64 = 2;

#[derive(Debug, Default)]
struct Inner {
    samples: Vec<QuantitySample>,
    earliest: Option<DateTime<Utc>>,
    sealed: bool,
}

/// Append-only log of quantity samples for one workout session.
///
/// Writers are expected to be serialized by the caller (one sensor thread, or
/// a lock around it); readers may run alongside them and see whatever was
/// appended before their snapshot was taken.
#[derive(Debug)]
pub struct SampleBuffer {
    inner: RwLock<Inner>,
    clock_skew_tolerance: Duration,
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_CLOCK_SKEW_TOLERANCE_SECS))
    }
}

impl SampleBuffer {
    pub fn new(clock_skew_tolerance: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock_skew_tolerance,
        }
    }

    pub fn append(&self, sample: QuantitySample) -> Result<()> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if inner.sealed {
            return Err(WorkoutError::SessionFinalized);
        }

        if !sample.value.is_finite() {
            tracing::warn!(kind = ?sample.kind, value = sample.value, "rejecting non-finite sample");
            return Err(WorkoutError::InvalidSample {
                timestamp: sample.timestamp,
                reason: format!("value {} is not finite", sample.value),
            });
        }

        if let Some(earliest) = inner.earliest {
            if sample.timestamp < earliest - self.clock_skew_tolerance {
                tracing::warn!(
                    kind = ?sample.kind,
                    timestamp = %sample.timestamp,
                    earliest = %earliest,
                    "rejecting sample older than the buffer"
                );
                return Err(WorkoutError::InvalidSample {
                    timestamp: sample.timestamp,
                    reason: format!(
                        "precedes earliest recorded sample {} by more than {}s",
                        earliest,
                        self.clock_skew_tolerance.num_seconds()
                    ),
                });
            }
        }

        inner.earliest = Some(match inner.earliest {
            Some(earliest) => earliest.min(sample.timestamp),
            None => sample.timestamp,
        });
        inner.samples.push(sample);
        tracing::debug!(kind = ?sample.kind, value = sample.value, "sample appended");
        Ok(())
    }

    /// Samples of `kind` with a timestamp in `[from, to)`, copied out so the
    /// query never holds the lock.
    pub fn query(
        &self,
        kind: QuantityKind,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> SampleQuery {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let samples = inner
            .samples
            .iter()
            .filter(|s| in_window(s, kind, from, to))
            .copied()
            .collect();
        SampleQuery { samples }
    }

    /// Copy of everything appended so far.
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Snapshot {
            samples: inner.samples.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .samples
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refuse any further appends.
    pub fn seal(&self) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.sealed = true;
    }
}

fn in_window(
    sample: &QuantitySample,
    kind: QuantityKind,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> bool {
    sample.kind == kind && sample.timestamp >= from && sample.timestamp < to
}

/// Samples as of the moment it was taken; later appends are not visible.
#[derive(Debug, Clone)]
pub struct Snapshot {
    samples: Vec<QuantitySample>,
}

impl Snapshot {
    pub fn query(
        &self,
        kind: QuantityKind,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Iterator<Item = &QuantitySample> + '_ {
        self.samples
            .iter()
            .filter(move |s| in_window(s, kind, from, to))
    }
}

/// Result of [`SampleBuffer::query`]. Iterating is lazy and can be repeated.
#[derive(Debug, Clone)]
pub struct SampleQuery {
    samples: Vec<QuantitySample>,
}

impl SampleQuery {
    pub fn iter(&self) -> impl Iterator<Item = &QuantitySample> + '_ {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::Duration as StdDuration;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        base() + Duration::seconds(secs)
    }

    #[test]
    fn test_query_filters_kind_and_half_open_window() {
        let buffer = SampleBuffer::default();
        buffer
            .append(QuantitySample::new(QuantityKind::HeartRate, 120.0, at(0)))
            .unwrap();
        buffer
            .append(QuantitySample::new(QuantityKind::Distance, 5.0, at(1)))
            .unwrap();
        buffer
            .append(QuantitySample::new(QuantityKind::HeartRate, 130.0, at(9)))
            .unwrap();
        buffer
            .append(QuantitySample::new(QuantityKind::HeartRate, 140.0, at(10)))
            .unwrap();

        let query = buffer.query(QuantityKind::HeartRate, at(0), at(10));
        let values: Vec<f64> = query.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![120.0, 130.0]);
        // restartable
        assert_eq!(query.iter().count(), 2);
    }

    #[test]
    fn test_append_keeps_arrival_order() {
        let buffer = SampleBuffer::default();
        buffer
            .append(QuantitySample::new(QuantityKind::Energy, 1.0, at(5)))
            .unwrap();
        buffer
            .append(QuantitySample::new(QuantityKind::Energy, 2.0, at(4)))
            .unwrap();

        let snapshot = buffer.snapshot();
        let stamps: Vec<_> = snapshot
            .query(QuantityKind::Energy, at(0), at(10))
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(stamps, vec![at(5), at(4)]);

        // the earliest timestamp is now at(4), so at(1) is out of tolerance
        assert!(buffer
            .append(QuantitySample::new(QuantityKind::Energy, 3.0, at(1)))
            .is_err());
    }

    #[test]
    fn test_append_rejects_samples_beyond_skew_tolerance() {
        let buffer = SampleBuffer::new(Duration::seconds(2));
        buffer
            .append(QuantitySample::new(QuantityKind::HeartRate, 100.0, at(10)))
            .unwrap();

        // exactly at the tolerance is still accepted
        assert!(buffer
            .append(QuantitySample::new(QuantityKind::HeartRate, 101.0, at(8)))
            .is_ok());

        let err = buffer
            .append(QuantitySample::new(QuantityKind::HeartRate, 102.0, at(5)))
            .unwrap_err();
        assert!(matches!(err, WorkoutError::InvalidSample { .. }));
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_append_rejects_non_finite_values() {
        let buffer = SampleBuffer::default();
        let err = buffer
            .append(QuantitySample::new(QuantityKind::Distance, f64::NAN, at(0)))
            .unwrap_err();
        assert!(matches!(err, WorkoutError::InvalidSample { .. }));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_sealed_buffer_refuses_appends() {
        let buffer = SampleBuffer::default();
        buffer.seal();
        assert!(matches!(
            buffer.append(QuantitySample::new(QuantityKind::Energy, 1.0, at(0))),
            Err(WorkoutError::SessionFinalized)
        ));
    }

    #[test]
    fn test_concurrent_writer_and_reader() {
        let buffer = Arc::new(SampleBuffer::default());
        let writer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                for i in 0..200 {
                    buffer
                        .append(QuantitySample::new(QuantityKind::Distance, 1.0, at(i)))
                        .unwrap();
                }
            })
        };

        for _ in 0..50 {
            let snapshot = buffer.snapshot();
            let seen = snapshot
                .query(QuantityKind::Distance, at(0), at(1000))
                .count();
            thread::yield_now();
            // a snapshot never changes under the reader
            assert_eq!(
                snapshot
                    .query(QuantityKind::Distance, at(0), at(1000))
                    .count(),
                seen
            );
            assert!(seen <= 200);
        }

        writer.join().unwrap();
        assert_eq!(buffer.len(), 200);
    }

    #[test]
    fn test_append_proceeds_while_query_is_held() {
        let buffer = Arc::new(SampleBuffer::default());
        buffer
            .append(QuantitySample::new(QuantityKind::HeartRate, 100.0, at(0)))
            .unwrap();

        let query = buffer.query(QuantityKind::HeartRate, at(0), at(1000));
        let snapshot = buffer.snapshot();

        let (done_tx, done_rx) = mpsc::channel();
        let writer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                for i in 1..=100 {
                    buffer
                        .append(QuantitySample::new(QuantityKind::HeartRate, 120.0, at(i)))
                        .unwrap();
                }
                done_tx.send(()).unwrap();
            })
        };

        done_rx
            .recv_timeout(StdDuration::from_secs(5))
            .expect("appends finished while the query was alive");
        writer.join().unwrap();

        assert_eq!(query.iter().count(), 1);
        assert_eq!(
            snapshot
                .query(QuantityKind::HeartRate, at(0), at(1000))
                .count(),
            1
        );
        assert_eq!(
            buffer
                .query(QuantityKind::HeartRate, at(0), at(1000))
                .iter()
                .count(),
            101
        );
    }

    #[test]
    fn test_same_thread_append_after_query() {
        let buffer = SampleBuffer::default();
        let query = buffer.query(QuantityKind::Energy, at(0), at(10));
        buffer
            .append(QuantitySample::new(QuantityKind::Energy, 1.0, at(0)))
            .unwrap();
        assert_eq!(query.iter().count(), 0);
    }
}
