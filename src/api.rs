//! Scheduler queries used by the bots, built on [`WaConn::request`].

use chrono::NaiveDate;

use crate::{
    decode::{decode_entries, decode_rc_evaluation, read_json},
    wire::{self, JobInPlanFilter, JobQueryFilters, JobQueryRequest},
    ApiRequest, JobInPlan, JobStream, RcEvaluation, Result, WaConn,
};

pub const JOB_QUERY_PATH: &str = "/plan/current/job/query";
pub const JOBSTREAM_PATH: &str = "/model/jobstream";

const DATE_FORMAT: &str = "%Y-%m-%d";

impl WaConn {
    /// Lists jobs in the current plan whose name matches `job_name`.
    ///
    /// The filter is passed to the server as is, so wildcards follow the
    /// server's rules. Entries with an unexpected shape are skipped.
    pub async fn query_jobs_in_plan(&self, job_name: &str) -> Result<Vec<JobInPlan>> {
        let payload = JobQueryRequest {
            filters: JobQueryFilters {
                job_in_plan_filter: JobInPlanFilter { job_name },
            },
        };
        let response = self
            .request(ApiRequest::post(JOB_QUERY_PATH).json(&payload)?)
            .await?;
        let body = read_json(response).await?;
        Ok(decode_entries::<wire::JobInPlan, _>(body, "job"))
    }

    /// Looks up job stream definitions by key.
    pub async fn find_jobstreams(&self, name: &str) -> Result<Vec<JobStream>> {
        let response = self
            .request(ApiRequest::get(JOBSTREAM_PATH).query("key", name))
            .await?;
        let body = read_json(response).await?;
        Ok(decode_entries::<wire::JobStream, _>(body, "job stream"))
    }

    /// Evaluates the run calendar of job stream `id` between `from` and `to`,
    /// both inclusive.
    pub async fn rc_evaluation(
        &self,
        id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<RcEvaluation> {
        let req = ApiRequest::get(format!("{JOBSTREAM_PATH}/{id}/rc-evaluation"))
            .query("from", from.format(DATE_FORMAT).to_string())
            .query("to", to.format(DATE_FORMAT).to_string());
        let response = self.request(req).await?;
        decode_rc_evaluation(read_json(response).await?)
    }
}
