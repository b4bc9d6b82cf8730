use crate::error::{Result, WorkoutError};
use crate::models::{Interval, Phase, SessionState, WorkoutConfiguration};
use chrono::{DateTime, Duration, Utc};

/// Phase change produced by a call to [`IntervalScheduler::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Closed interval `closed` and opened `opened` in the given phase.
    PhaseChanged {
        closed: u32,
        opened: u32,
        phase: Phase,
    },
    /// Closed the final interval; the workout is complete.
    Completed { closed: u32 },
}

/// Active/rest state machine. Time only advances through `tick`.
#[derive(Debug, Clone)]
pub struct IntervalScheduler {
    config: WorkoutConfiguration,
    state: SessionState,
    intervals: Vec<Interval>,
    completed_active: u32,
}

impl IntervalScheduler {
    pub fn new(config: WorkoutConfiguration) -> Self {
        Self {
            config,
            state: SessionState::NotStarted,
            intervals: Vec::new(),
            completed_active: 0,
        }
    }

    pub fn configuration(&self) -> &WorkoutConfiguration {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// The interval currently open, if the workout is running.
    pub fn current(&self) -> Option<&Interval> {
        self.intervals.last().filter(|i| i.is_open())
    }

    pub fn completed_cycles(&self) -> u32 {
        self.completed_active
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state != SessionState::NotStarted {
            return Err(WorkoutError::AlreadyStarted);
        }
        self.intervals.push(Interval::open_at(0, Phase::Active, now));
        self.state = SessionState::Active;
        tracing::info!(
            cycles = self.config.cycle_count(),
            active_secs = self.config.active_duration().num_seconds(),
            rest_secs = self.config.rest_duration().num_seconds(),
            "workout started"
        );
        Ok(())
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Transition> {
        if !matches!(self.state, SessionState::Active | SessionState::Rest) {
            return None;
        }

        let current = self.intervals.last_mut()?;
        if now < current.start {
            tracing::debug!(%now, start = %current.start, "ignoring tick from before the open interval");
            return None;
        }

        let elapsed = now - current.start;
        if elapsed < self.config.duration_of(current.phase) {
            return None;
        }

        // Elapsed time at or past the phase length closes the interval.
        current.end = Some(now);
        let closed = current.index;
        let phase = current.phase;

        if phase == Phase::Active {
            self.completed_active += 1;
        }

        if phase == Phase::Rest && self.completed_active >= self.config.cycle_count() {
            self.state = SessionState::Completed;
            tracing::info!(intervals = self.intervals.len(), "workout completed");
            return Some(Transition::Completed { closed });
        }

        let next = phase.next();
        let opened = closed + 1;
        self.intervals.push(Interval::open_at(opened, next, now));
        self.state = match next {
            Phase::Active => SessionState::Active,
            Phase::Rest => SessionState::Rest,
        };
        tracing::info!(interval = opened, phase = %next, "phase changed");
        Some(Transition::PhaseChanged {
            closed,
            opened,
            phase: next,
        })
    }

    pub fn abort(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state.is_terminal() {
            return Err(WorkoutError::SessionFinished);
        }

        if let Some(start) = self.current().map(|i| i.start) {
            if now > start {
                if let Some(current) = self.intervals.last_mut() {
                    current.end = Some(now);
                }
            } else {
                // A zero-length interval cannot satisfy start < end.
                self.intervals.pop();
            }
        }
        self.state = SessionState::Aborted;
        tracing::info!(intervals = self.intervals.len(), "workout aborted");
        Ok(())
    }

    /// Time left in the current phase, clamped at zero.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let current = self.current()?;
        let left = self.config.duration_of(current.phase) - (now - current.start);
        Some(left.max(Duration::zero()))
    }
}
