use crate::buffer::SampleBuffer;
use crate::error::{Result, WorkoutError};
use crate::models::{Interval, WorkoutConfiguration, WorkoutRecord};
use crate::stats::compute_in;
use chrono::{DateTime, Utc};

/// Builds the record for a finished run of intervals. Every interval must be
/// closed; statistics keep the interval index order.
pub(crate) fn build_record(
    configuration: WorkoutConfiguration,
    intervals: &[Interval],
    buffer: &SampleBuffer,
    created_at: DateTime<Utc>,
) -> Result<WorkoutRecord> {
    let (first, last) = match (intervals.first(), intervals.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(WorkoutError::SessionNotCompleted(
                "no intervals recorded".into(),
            ))
        }
    };
    let finished_at = last.end.ok_or(WorkoutError::IncompleteInterval(last.index))?;

    // One snapshot for the whole record so every interval sees the same samples.
    let snapshot = buffer.snapshot();
    let interval_statistics = intervals
        .iter()
        .map(|interval| compute_in(interval, &snapshot))
        .collect::<Result<Vec<_>>>()?;

    Ok(WorkoutRecord::new(
        configuration,
        first.start,
        finished_at - first.start,
        interval_statistics,
        created_at,
    ))
}
