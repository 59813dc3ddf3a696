//! Chat commands answered by the bots.
//!
//! - `!loaded <job filter>` lists matching jobs in the current plan.
//! - `!willrun <job stream> <YYYY-MM-DD>` lists the dates, from today up to
//!   the given one, on which the job stream's run calendar selects it.
//!
//! Platform front ends (see the `webex` module) feed message text to a
//! [`Responder`] and post back whatever it returns.

pub mod command;
pub mod format;

use chrono::NaiveDate;

pub use command::{parse_command, strip_mention, Command, UsageError};

use crate::WaConn;

/// Turns chat messages into replies by querying the scheduler.
#[derive(Clone, Debug)]
pub struct Responder {
    conn: WaConn,
    /// Hours added to UTC start times before display.
    timezone_offset: i64,
}

impl Responder {
    pub fn new(conn: WaConn) -> Self {
        Self {
            conn,
            timezone_offset: 0,
        }
    }

    pub fn with_timezone_offset(mut self, hours: i64) -> Self {
        self.timezone_offset = hours;
        self
    }

    pub fn conn(&self) -> &WaConn {
        &self.conn
    }

    /// Answers `text`, or returns `None` when the message is not a command.
    ///
    /// `today` is the first day of `!willrun` evaluations. Failures from the
    /// API are reported in the reply rather than returned.
    pub async fn respond(&self, text: &str, today: NaiveDate) -> Option<String> {
        let reply = match parse_command(text)? {
            Err(usage) => usage.to_string(),
            Ok(Command::Loaded { filter }) => self.loaded(&filter).await,
            Ok(Command::WillRun { job_stream, until }) => {
                self.will_run(&job_stream, today, until).await
            }
        };
        Some(reply)
    }

    async fn loaded(&self, filter: &str) -> String {
        match self.conn.query_jobs_in_plan(filter).await {
            Ok(jobs) => {
                #[cfg(feature = "tracing")]
                tracing::info!(filter, found = jobs.len(), "job query");
                format::loaded_reply(filter, &jobs, self.timezone_offset)
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::error!(filter, error = %err, "error querying job");
                format!("Error querying job: {err}")
            }
        }
    }

    async fn will_run(&self, name: &str, from: NaiveDate, until: NaiveDate) -> String {
        let streams = match self.conn.find_jobstreams(name).await {
            Ok(streams) => streams,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::error!(job_stream = name, error = %err, "error querying job stream");
                return format!("Error querying job stream: {err}");
            }
        };
        if streams.is_empty() {
            return format::no_jobstreams(name);
        }

        let mut blocks = Vec::with_capacity(streams.len());
        for stream in &streams {
            match self.conn.rc_evaluation(&stream.id, from, until).await {
                Ok(eval) => {
                    let selected = eval.selected_dates();
                    #[cfg(feature = "tracing")]
                    tracing::info!(id = %stream.id, ?selected, "run-calendar evaluation");
                    blocks.push(format::rc_block(&stream.id, &selected));
                }
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(id = %stream.id, error = %err, "skipping job stream");
                    #[cfg(not(feature = "tracing"))]
                    let _ = err;
                }
            }
        }

        if blocks.is_empty() {
            return format::no_jobstreams_after_parsing(name);
        }
        format::willrun_reply(&blocks)
    }
}
