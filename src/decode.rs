use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::{wire, JobInPlan, JobStream, RcDate, RcEvaluation, Result, WaError};

pub(crate) async fn read_json(response: Response) -> Result<serde_json::Value> {
    let body = response.text().await.map_err(WaError::Transport)?;
    serde_json::from_str(&body)
        .map_err(|err| WaError::Decode(format!("invalid response JSON: {err}; body: {body}")))
}

/// Decodes every entry of a JSON array (or a lone object) that matches the
/// wire shape `W`. Entries that do not match are skipped.
pub(crate) fn decode_entries<W, T>(value: serde_json::Value, what: &str) -> Vec<T>
where
    W: DeserializeOwned,
    T: From<W>,
{
    let entries = match value {
        serde_json::Value::Array(entries) => entries,
        serde_json::Value::Null => Vec::new(),
        other => vec![other],
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<W>(entry) {
            Ok(decoded) => Some(T::from(decoded)),
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(index, error = %err, "skipping malformed {what} entry");
                #[cfg(not(feature = "tracing"))]
                let _ = (index, err, what);
                None
            }
        })
        .collect()
}

pub(crate) fn decode_rc_evaluation(value: serde_json::Value) -> Result<RcEvaluation> {
    let eval: wire::RcEvaluation = serde_json::from_value(value)
        .map_err(|err| WaError::Decode(format!("invalid rc-evaluation response: {err}")))?;
    Ok(eval.into())
}

impl From<wire::JobInPlan> for JobInPlan {
    fn from(job: wire::JobInPlan) -> Self {
        Self {
            workstation: job
                .job_definition
                .job_definition_in_plan_key
                .workstation_in_plan_key
                .name,
            job_stream: job.job_stream_in_plan.name,
            name: job.name,
            internal_status: job.status.internal_status,
            start_time: job.job_stream_in_plan.start_time,
        }
    }
}

impl From<wire::JobStream> for JobStream {
    fn from(stream: wire::JobStream) -> Self {
        Self {
            id: stream.header.id,
        }
    }
}

impl From<wire::RcEvaluation> for RcEvaluation {
    fn from(eval: wire::RcEvaluation) -> Self {
        Self {
            results: eval
                .results
                .into_iter()
                .map(|entry| RcDate {
                    date: entry.date,
                    kinds: entry.kinds,
                })
                .collect(),
        }
    }
}
