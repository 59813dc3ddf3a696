/// A job instance in the current plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobInPlan {
    pub workstation: String,
    pub job_stream: String,
    pub name: String,
    /// Internal status such as `SUCC`, `HOLD` or `EXEC`.
    pub internal_status: String,
    /// Start time of the owning job stream, as sent by the server (UTC).
    pub start_time: String,
}

/// A job stream definition from the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobStream {
    pub id: String,
}

/// Run-calendar evaluation of a job stream over a date range.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RcEvaluation {
    pub results: Vec<RcDate>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RcDate {
    pub date: String,
    pub kinds: Vec<String>,
}

impl RcEvaluation {
    /// Dates selected for execution by the run calendar, in server order.
    pub fn selected_dates(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|entry| entry.kinds.iter().any(|kind| kind == "SELECTED"))
            .map(|entry| entry.date.as_str())
            .collect()
    }
}
