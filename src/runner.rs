use crate::models::{Phase, WorkoutRecord};
use crate::scheduler::Transition;
use crate::sensor::{self, SensorControl};
use crate::session::WorkoutSession;
use crate::storage::PersistenceGateway;
use crate::utils::format_duration;
use anyhow::Result;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;

/// Drives a session in real time with the simulated sensor attached.
///
/// Returns the saved record, or `None` when `interrupted` was raised and the
/// workout was aborted.
pub fn run_workout<G: PersistenceGateway>(
    mut session: WorkoutSession,
    gateway: &G,
    tick_interval: StdDuration,
    interrupted: Arc<AtomicBool>,
) -> Result<Option<WorkoutRecord>> {
    session.start(Utc::now())?;
    match session.configuration().planned_duration() {
        Some(planned) => println!("Workout planned for {}.", format_duration(planned)),
        None => println!("Workout planned for longer than can be shown."),
    }
    announce(1, Phase::Active, &session);

    let control = SensorControl::default();
    let sensor = sensor::spawn(session.sample_sink(), control.clone(), tick_interval);

    let finished = loop {
        thread::sleep(tick_interval);

        if interrupted.load(Ordering::Relaxed) {
            session.abort(Utc::now())?;
            break false;
        }

        let now = Utc::now();
        match session.tick(now) {
            Some(Transition::PhaseChanged { opened, phase, .. }) => {
                control.set_phase(phase);
                announce(u64::from(opened) + 1, phase, &session);
            }
            Some(Transition::Completed { .. }) => break true,
            None => {
                if let Some(left) = session.scheduler().remaining(now) {
                    tracing::trace!(remaining_ms = left.num_milliseconds(), "tick");
                }
            }
        }
    };

    control.stop();
    if sensor.join().is_err() {
        tracing::warn!("sensor thread panicked");
    }

    if !finished {
        println!(
            "Workout aborted after {} of {} cycles, nothing saved.",
            session.scheduler().completed_cycles(),
            session.configuration().cycle_count()
        );
        return Ok(None);
    }

    let record = session.finalize(Utc::now())?;
    gateway.save(&record)?;
    Ok(Some(record))
}

fn announce(number: u64, phase: Phase, session: &WorkoutSession) {
    let config = session.configuration();
    let label = match phase {
        Phase::Active => "GO",
        Phase::Rest => "REST",
    };
    println!(
        "{:>4}  interval {} of {}  ({}, {} cycles done)",
        label,
        number,
        config.interval_count(),
        format_duration(config.duration_of(phase)),
        session.scheduler().completed_cycles()
    );
}
