use crate::buffer::SampleBuffer;
use crate::error::{Result, WorkoutError};
use crate::models::{QuantitySample, SessionState, WorkoutConfiguration, WorkoutRecord};
use crate::record::build_record;
use crate::scheduler::{IntervalScheduler, Transition};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// One interval workout: the scheduler driving its phases plus the samples
/// collected while it runs.
pub struct WorkoutSession {
    scheduler: IntervalScheduler,
    samples: Arc<SampleBuffer>,
    finalized: bool,
}

impl WorkoutSession {
    pub fn new(configuration: WorkoutConfiguration, clock_skew_tolerance: Duration) -> Self {
        Self {
            scheduler: IntervalScheduler::new(configuration),
            samples: Arc::new(SampleBuffer::new(clock_skew_tolerance)),
            finalized: false,
        }
    }

    pub fn configuration(&self) -> &WorkoutConfiguration {
        self.scheduler.configuration()
    }

    pub fn state(&self) -> SessionState {
        self.scheduler.state()
    }

    pub fn scheduler(&self) -> &IntervalScheduler {
        &self.scheduler
    }

    /// Shared handle for a data-acquisition thread to append into.
    pub fn sample_sink(&self) -> Arc<SampleBuffer> {
        Arc::clone(&self.samples)
    }

    pub fn record_sample(&self, sample: QuantitySample) -> Result<()> {
        self.samples.append(sample)
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.scheduler.start(now)
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Transition> {
        self.scheduler.tick(now)
    }

    pub fn abort(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.scheduler.abort(now)
    }

    /// Turns a completed session into its record. The session is sealed
    /// afterwards: its buffer refuses samples and it cannot be finalized twice.
    pub fn finalize(&mut self, created_at: DateTime<Utc>) -> Result<WorkoutRecord> {
        if self.finalized {
            return Err(WorkoutError::SessionFinalized);
        }
        let state = self.state();
        if state != SessionState::Completed {
            return Err(WorkoutError::SessionNotCompleted(state.to_string()));
        }

        self.samples.seal();
        let record = build_record(
            *self.configuration(),
            self.scheduler.intervals(),
            &self.samples,
            created_at,
        )?;
        self.finalized = true;

        tracing::info!(
            record = %record.id(),
            intervals = record.interval_statistics().len(),
            total_secs = record.total_duration().num_seconds(),
            "workout finalized"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Phase, QuantityKind};
    use crate::storage::{MemoryStorage, PersistenceGateway};
    use chrono::TimeZone;
    use std::thread;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn session() -> WorkoutSession {
        let config =
            WorkoutConfiguration::new(Duration::seconds(30), Duration::seconds(10), 2).unwrap();
        WorkoutSession::new(config, Duration::seconds(2))
    }

    fn run(session: &mut WorkoutSession) {
        session.start(at(0)).unwrap();
        for t in 1..=80 {
            let hr = if (t - 1) % 40 < 30 { 150.0 } else { 110.0 };
            session
                .record_sample(QuantitySample::new(QuantityKind::HeartRate, hr, at(t - 1)))
                .unwrap();
            session
                .record_sample(QuantitySample::new(QuantityKind::Distance, 3.0, at(t - 1)))
                .unwrap();
            session.tick(at(t));
        }
    }

    #[test]
    fn test_finalize_full_workout() {
        let mut session = session();
        run(&mut session);
        assert_eq!(session.state(), SessionState::Completed);

        let record = session.finalize(at(81)).unwrap();
        let stats = record.interval_statistics();
        assert_eq!(stats.len(), 4);
        assert_eq!(record.total_duration(), Duration::seconds(80));

        assert_eq!(stats[0].phase, Phase::Active);
        assert_eq!(stats[0].total_distance, 90.0);
        assert_eq!(stats[0].average_heart_rate, Some(150.0));
        assert_eq!(stats[1].phase, Phase::Rest);
        assert_eq!(stats[1].total_distance, 30.0);
        assert_eq!(stats[1].average_heart_rate, Some(110.0));
    }

    #[test]
    fn test_finalize_while_active_fails() {
        let mut session = session();
        session.start(at(0)).unwrap();
        session.tick(at(5));

        assert!(matches!(
            session.finalize(at(6)),
            Err(WorkoutError::SessionNotCompleted(_))
        ));
        // still usable afterwards
        assert_eq!(session.state(), SessionState::Active);
        assert!(session
            .record_sample(QuantitySample::new(QuantityKind::Energy, 1.0, at(6)))
            .is_ok());
    }

    #[test]
    fn test_finalize_aborted_fails() {
        let mut session = session();
        session.start(at(0)).unwrap();
        session.abort(at(12)).unwrap();
        assert!(matches!(
            session.finalize(at(13)),
            Err(WorkoutError::SessionNotCompleted(_))
        ));
    }

    #[test]
    fn test_finalize_consumes_session() {
        let mut session = session();
        run(&mut session);
        session.finalize(at(81)).unwrap();

        assert!(matches!(
            session.finalize(at(82)),
            Err(WorkoutError::SessionFinalized)
        ));
        assert!(matches!(
            session.record_sample(QuantitySample::new(QuantityKind::Energy, 1.0, at(79))),
            Err(WorkoutError::SessionFinalized)
        ));
    }

    #[test]
    fn test_samples_from_sensor_thread() {
        let mut session = session();
        session.start(at(0)).unwrap();

        let sink = session.sample_sink();
        let sensor = thread::spawn(move || {
            for t in 0..80 {
                sink.append(QuantitySample::new(QuantityKind::Energy, 0.5, at(t)))
                    .unwrap();
            }
        });
        sensor.join().unwrap();

        for t in 1..=80 {
            session.tick(at(t));
        }
        let record = session.finalize(at(80)).unwrap();
        let energy: f64 = record
            .interval_statistics()
            .iter()
            .map(|s| s.total_energy)
            .sum();
        assert_eq!(energy, 40.0);
    }

    #[test]
    fn test_record_round_trips_through_gateway() {
        let mut session = session();
        run(&mut session);
        let record = session.finalize(at(81)).unwrap();

        let storage = MemoryStorage::default();
        storage.save(&record).unwrap();
        let loaded = storage.load_all().unwrap();
        assert_eq!(loaded, vec![record]);
    }
}
