use std::fmt;

use chrono::NaiveDate;

/// Name the bot answers to when addressed at the start of a message.
pub const MENTION: &str = "maestro";

pub const LOADED_USAGE: &str = "Usage: !loaded JOBNAME";
pub const WILLRUN_USAGE: &str = "Usage: !willrun JOBSTREAMNAME YYYY-MM-DD";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `!loaded <filter>`: is the job in today's plan?
    Loaded { filter: String },
    /// `!willrun <job stream> <date>`: on which dates up to `until` will the
    /// job stream run?
    WillRun { job_stream: String, until: NaiveDate },
}

/// A recognised command with bad arguments. Displays as the usage line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UsageError(pub &'static str);

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for UsageError {}

/// Removes a leading bot mention (`Maestro:`, `maestro ` ...) from `text`.
pub fn strip_mention(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.get(..MENTION.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(MENTION) => trimmed[MENTION.len()..]
            .trim_start_matches([' ', ':'])
            .trim_start(),
        _ => trimmed,
    }
}

/// Parses a chat message.
///
/// Returns `None` for messages that are not addressed to the bot, and
/// `Some(Err(_))` for a known command with wrong arguments.
pub fn parse_command(text: &str) -> Option<Result<Command, UsageError>> {
    let text = strip_mention(text);
    let (word, rest) = match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    };

    match word {
        "!loaded" => Some(parse_loaded(rest)),
        "!willrun" => Some(parse_willrun(rest)),
        _ => None,
    }
}

fn parse_loaded(args: &str) -> Result<Command, UsageError> {
    if args.is_empty() {
        return Err(UsageError(LOADED_USAGE));
    }
    Ok(Command::Loaded {
        filter: args.to_owned(),
    })
}

fn parse_willrun(args: &str) -> Result<Command, UsageError> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let [job_stream, until] = parts.as_slice() else {
        return Err(UsageError(WILLRUN_USAGE));
    };
    let until =
        NaiveDate::parse_from_str(until, "%Y-%m-%d").map_err(|_| UsageError(WILLRUN_USAGE))?;
    Ok(Command::WillRun {
        job_stream: (*job_stream).to_owned(),
        until,
    })
}
