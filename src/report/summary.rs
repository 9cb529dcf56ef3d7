//! Daily plain-text summary across the standard reports.

use crate::core::SweepResult;
use crate::report::writer::report_path;

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// The file prefixes of the four standard governance reports.
pub const STANDARD_REPORT_PREFIXES: [&str; 4] = [
    "inactive_users",
    "stale_content",
    "stale_sites",
    "extract_tasks",
];

/// Composes the day's reports into `daily_summary_<date>.txt`.
///
/// One line per standard report: its summary text and item count, or a
/// "no report found" note when that scan did not run. Returns the path of
/// the summary file written.
pub async fn compose_daily_summary(log_dir: &Path, date: NaiveDate) -> SweepResult<PathBuf> {
    let mut lines = Vec::with_capacity(STANDARD_REPORT_PREFIXES.len());

    for prefix in STANDARD_REPORT_PREFIXES {
        let title = title_case(prefix);
        match load_report(log_dir, prefix, date).await? {
            Some((summary, count)) => {
                lines.push(format!("{title}: {summary} (count: {count})"));
            }
            None => lines.push(format!("{title}: no report found")),
        }
    }

    let mut body = format!("Governance sweep summary - {date}\n\n");
    for line in &lines {
        body.push_str(line);
        body.push('\n');
    }

    let path = log_dir.join(format!("daily_summary_{date}.txt"));
    tokio::fs::create_dir_all(log_dir).await?;
    tokio::fs::write(&path, body).await?;

    tracing::info!(path = %path.display(), "daily summary written");
    Ok(path)
}

/// Reads a report document's summary line and item count, if present.
async fn load_report(
    log_dir: &Path,
    prefix: &str,
    date: NaiveDate,
) -> SweepResult<Option<(String, u64)>> {
    let path = report_path(log_dir, prefix, date);
    if !path.exists() {
        return Ok(None);
    }

    let raw = tokio::fs::read_to_string(&path).await?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;

    let summary = value
        .get("summary")
        .and_then(|s| s.as_str())
        .unwrap_or("no summary")
        .to_string();
    let count = value
        .get("total_count")
        .and_then(|c| c.as_u64())
        .unwrap_or(0);

    Ok(Some((summary, count)))
}

fn title_case(prefix: &str) -> String {
    prefix
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
