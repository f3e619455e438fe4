use chrono::{DateTime, Utc};

use leadline_core::{DEFAULT_RECENT_LIMIT, DashboardStats, RequestStore};

use super::request_line;
use crate::OutputFormat;

pub fn run(store: &RequestStore, now: DateTime<Utc>, format: &OutputFormat) -> anyhow::Result<()> {
    let stats = DashboardStats::compute(store.all(), now);
    let recent = store.recent(DEFAULT_RECENT_LIMIT);
    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "stats": stats,
                "pipeline": stats
                    .pipeline_counts()
                    .into_iter()
                    .map(|(stage, count)| serde_json::json!({ "stage": stage, "count": count }))
                    .collect::<Vec<_>>(),
                "recent": recent,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => {
            println!("Total requests: {}", stats.total);
            println!("Active:         {}", stats.active);
            println!("New this week:  {}", stats.new_this_week);
            println!(
                "Won / lost:     {} / {} (win rate {}%)",
                stats.won, stats.lost, stats.win_rate
            );
            println!("By stage:");
            for (stage, count) in &stats.by_stage {
                println!("  {:<16} {count}", stage.label());
            }
            println!("Recent requests:");
            for request in recent {
                println!("  {}", request_line(request));
            }
        }
    }
    Ok(())
}
