//! Chat replies.

use chrono::{DateTime, TimeDelta};

use crate::JobInPlan;

/// Zero-width space between workstation and job stream. Keeps chat clients
/// from turning `WS#JS` into a channel link.
const ZWSP: char = '\u{200b}';

/// Renders a UTC timestamp from the API as `HH:MM on YYYY-MM-DD`, shifted
/// by `offset_hours`. `None` when the timestamp is unreadable or the
/// shifted time is out of range.
pub fn format_start_time(utc: &str, offset_hours: i64) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(utc).ok()?;
    let local = parsed
        .naive_utc()
        .checked_add_signed(TimeDelta::try_hours(offset_hours)?)?;
    Some(local.format("%H:%M on %Y-%m-%d").to_string())
}

/// One line per job, or `None` when the start time is unreadable.
pub fn job_line(job: &JobInPlan, offset_hours: i64) -> Option<String> {
    let start = format_start_time(&job.start_time, offset_hours)?;
    Some(format!(
        "{}#{ZWSP}{}.{}   State: {}   Start Time: {start}",
        job.workstation, job.job_stream, job.name, job.internal_status
    ))
}

pub fn loaded_reply(filter: &str, jobs: &[JobInPlan], offset_hours: i64) -> String {
    let lines: Vec<String> = jobs
        .iter()
        .filter_map(|job| {
            let line = job_line(job, offset_hours);
            #[cfg(feature = "tracing")]
            {
                if line.is_none() {
                    tracing::warn!(job = %job.name, start_time = %job.start_time, "unreadable start time");
                }
            }
            line
        })
        .collect();

    if lines.is_empty() {
        return no_jobs(filter);
    }
    format!("Jobs loaded:\n{}", lines.join("\n"))
}

pub fn no_jobs(filter: &str) -> String {
    format!("No jobs found for '{filter}'.")
}

/// Block for one evaluated job stream.
pub fn rc_block(id: &str, selected: &[&str]) -> String {
    if selected.is_empty() {
        format!("Job Stream ID: {id}\nNo SELECTED dates found.")
    } else {
        format!("Job Stream ID: {id}\nSelected Dates:\n{}", selected.join("\n"))
    }
}

pub fn willrun_reply(blocks: &[String]) -> String {
    format!("Job Streams RC Evaluation:\n\n{}", blocks.join("\n\n"))
}

pub fn no_jobstreams(name: &str) -> String {
    format!("No job streams found for '{name}'.")
}

pub fn no_jobstreams_after_parsing(name: &str) -> String {
    format!("No job streams found for '{name}' after parsing.")
}
