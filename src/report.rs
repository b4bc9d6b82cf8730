use crate::models::WorkoutRecord;
use crate::stats::summarize;
use crate::storage::PersistenceGateway;
use crate::utils::{format_bpm, format_distance, format_duration};
use anyhow::Result;
use chrono::Local;

pub struct Reporter<G> {
    gateway: G,
}

impl<G: PersistenceGateway> Reporter<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Prints the most recent `last` workouts, oldest first.
    pub fn report(&self, last: Option<usize>) -> Result<()> {
        let records = self.gateway.load_all()?;
        if records.is_empty() {
            println!("No workouts recorded yet.");
            return Ok(());
        }

        let skip = last.map_or(0, |n| records.len().saturating_sub(n));
        println!("Groundhog Report");
        println!("================");
        for record in &records[skip..] {
            print!("{}", render_record(record));
        }
        Ok(())
    }
}

pub fn render_record(record: &WorkoutRecord) -> String {
    let summary = summarize(record);
    let config = record.configuration();

    let mut lines = vec![
        String::new(),
        format!(
            "Workout {} ({})",
            record.started_at().with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            record.id()
        ),
        format!(
            "  Plan:           {} x ({} active / {} rest)",
            config.cycle_count(),
            format_duration(config.active_duration()),
            format_duration(config.rest_duration())
        ),
        format!("  Total Time:     {}", format_duration(record.total_duration())),
        format!("  Active Time:    {}", format_duration(summary.total_active)),
        format!("  Rest Time:      {}", format_duration(summary.total_rest)),
        format!("  Distance:       {}", format_distance(summary.total_distance)),
        format!("  Energy:         {:.1} kcal", summary.total_energy),
        format!("  Avg Heart Rate: {}", format_bpm(summary.average_heart_rate)),
        format!("  Max Heart Rate: {}", format_bpm(summary.max_heart_rate)),
        String::new(),
        "  #   Phase   Time      Distance   Energy     Avg HR".to_string(),
    ];

    for stats in record.interval_statistics() {
        lines.push(format!(
            "  {:<3} {:<7} {:<9} {:<10} {:<10} {}",
            stats.interval_index + 1,
            stats.phase.to_string(),
            format_duration(stats.duration),
            format_distance(stats.total_distance),
            format!("{:.1} kcal", stats.total_energy),
            format_bpm(stats.average_heart_rate)
        ));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
