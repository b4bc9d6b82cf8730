use crate::buffer::{SampleBuffer, Snapshot};
use crate::error::{Result, WorkoutError};
use crate::models::{Interval, IntervalStatistics, Phase, QuantityKind, WorkoutRecord};
use chrono::Duration;

#[derive(Default, Clone, Debug, PartialEq)]
pub struct WorkoutSummary {
    pub total_active: Duration,
    pub total_rest: Duration,
    pub active_count: u32,
    pub rest_count: u32,
    pub total_distance: f64,
    pub total_energy: f64,
    pub average_heart_rate: Option<f64>,
    pub max_heart_rate: Option<f64>,
    pub longest_active: Option<Duration>,
    pub shortest_active: Option<Duration>,
}

/// Statistics for one closed interval over the half-open range `[start, end)`.
pub fn compute(interval: &Interval, buffer: &SampleBuffer) -> Result<IntervalStatistics> {
    compute_in(interval, &buffer.snapshot())
}

pub(crate) fn compute_in(interval: &Interval, snapshot: &Snapshot) -> Result<IntervalStatistics> {
    let end = interval
        .end
        .ok_or(WorkoutError::IncompleteInterval(interval.index))?;
    let start = interval.start;

    let total_distance = ordered_sum(
        snapshot
            .query(QuantityKind::Distance, start, end)
            .map(|s| s.value)
            .collect(),
    );
    let total_energy = ordered_sum(
        snapshot
            .query(QuantityKind::Energy, start, end)
            .map(|s| s.value)
            .collect(),
    );

    let heart_rate: Vec<f64> = snapshot
        .query(QuantityKind::HeartRate, start, end)
        .map(|s| s.value)
        .collect();
    let hr_count = heart_rate.len();
    let hr_max = heart_rate.iter().copied().reduce(f64::max);
    let average_heart_rate = if hr_count > 0 {
        Some(ordered_sum(heart_rate) / hr_count as f64)
    } else {
        None
    };

    Ok(IntervalStatistics {
        interval_index: interval.index,
        phase: interval.phase,
        duration: end - start,
        total_distance,
        total_energy,
        average_heart_rate,
        max_heart_rate: hr_max,
        heart_rate_samples: hr_count,
    })
}

/// Sums in ascending order so the result does not depend on arrival order.
fn ordered_sum(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    values.into_iter().sum()
}

pub fn summarize(record: &WorkoutRecord) -> WorkoutSummary {
    let mut summary = WorkoutSummary::default();
    let mut weighted_hr = 0.0;
    let mut hr_samples = 0usize;

    for stats in record.interval_statistics() {
        match stats.phase {
            Phase::Active => {
                summary.total_active += stats.duration;
                summary.active_count += 1;
                summary.longest_active = Some(
                    summary
                        .longest_active
                        .map_or(stats.duration, |m| m.max(stats.duration)),
                );
                summary.shortest_active = Some(
                    summary
                        .shortest_active
                        .map_or(stats.duration, |m| m.min(stats.duration)),
                );
            }
            Phase::Rest => {
                summary.total_rest += stats.duration;
                summary.rest_count += 1;
            }
        }

        summary.total_distance += stats.total_distance;
        summary.total_energy += stats.total_energy;

        if let Some(avg) = stats.average_heart_rate {
            weighted_hr += avg * stats.heart_rate_samples as f64;
            hr_samples += stats.heart_rate_samples;
        }
        if let Some(max) = stats.max_heart_rate {
            summary.max_heart_rate = Some(summary.max_heart_rate.map_or(max, |m| m.max(max)));
        }
    }

    if hr_samples > 0 {
        summary.average_heart_rate = Some(weighted_hr / hr_samples as f64);
    }

    summary
}
