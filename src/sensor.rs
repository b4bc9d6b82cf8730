use crate::buffer::SampleBuffer;
use crate::error::WorkoutError;
use crate::models::{Phase, QuantityKind, QuantitySample};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration as StdDuration;

const RESTING_BPM: f64 = 72.0;
const ACTIVE_BPM: f64 = 165.0;
const RECOVERY_BPM: f64 = 110.0;
/// Fraction of the gap to the target heart rate closed every second.
const HEART_RATE_RESPONSE: f64 = 0.15;

/// Synthetic readings standing in for a real heart rate monitor and pedometer.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    heart_rate: f64,
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self {
            heart_rate: RESTING_BPM,
        }
    }
}

impl SimulatedSensor {
    /// One reading per kind, covering `elapsed_secs` spent in `phase`.
    pub fn read(
        &mut self,
        phase: Phase,
        elapsed_secs: f64,
        at: DateTime<Utc>,
    ) -> [QuantitySample; 3] {
        let (target, metres_per_sec, kcal_per_sec) = match phase {
            Phase::Active => (ACTIVE_BPM, 3.5, 0.22),
            Phase::Rest => (RECOVERY_BPM, 1.2, 0.07),
        };
        let response = (HEART_RATE_RESPONSE * elapsed_secs).min(1.0);
        self.heart_rate += (target - self.heart_rate) * response;

        [
            QuantitySample::new(QuantityKind::HeartRate, self.heart_rate.round(), at),
            QuantitySample::new(QuantityKind::Distance, metres_per_sec * elapsed_secs, at),
            QuantitySample::new(QuantityKind::Energy, kcal_per_sec * elapsed_secs, at),
        ]
    }
}

/// Flags shared between the workout loop and the sensor thread.
#[derive(Debug, Clone, Default)]
pub struct SensorControl {
    resting: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
}

impl SensorControl {
    pub fn set_phase(&self, phase: Phase) {
        self.resting.store(phase == Phase::Rest, Ordering::Relaxed);
    }

    pub fn phase(&self) -> Phase {
        if self.resting.load(Ordering::Relaxed) {
            Phase::Rest
        } else {
            Phase::Active
        }
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

/// Feeds `buffer` from its own thread every `period` until stopped or the
/// buffer is sealed.
pub fn spawn(
    buffer: Arc<SampleBuffer>,
    control: SensorControl,
    period: StdDuration,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut sensor = SimulatedSensor::default();
        let elapsed_secs = period.as_secs_f64();

        while !control.is_stopped() {
            thread::sleep(period);
            let readings = sensor.read(control.phase(), elapsed_secs, Utc::now());
            for sample in readings {
                match buffer.append(sample) {
                    Ok(()) => {}
                    Err(WorkoutError::SessionFinalized) => return,
                    Err(err) => tracing::warn!(error = %err, "sensor sample rejected"),
                }
            }
        }
        tracing::debug!("sensor stopped");
    })
}
