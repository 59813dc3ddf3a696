use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobQueryRequest<'a> {
    pub filters: JobQueryFilters<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobQueryFilters<'a> {
    pub job_in_plan_filter: JobInPlanFilter<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInPlanFilter<'a> {
    pub job_name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInPlan {
    pub name: String,
    pub job_definition: JobDefinition,
    pub job_stream_in_plan: JobStreamInPlan,
    pub status: JobStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDefinition {
    pub job_definition_in_plan_key: JobDefinitionInPlanKey,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDefinitionInPlanKey {
    pub workstation_in_plan_key: NamedKey,
}

#[derive(Debug, Deserialize)]
pub struct NamedKey {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStreamInPlan {
    pub name: String,
    pub start_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub internal_status: String,
}

#[derive(Debug, Deserialize)]
pub struct JobStream {
    pub header: JobStreamHeader,
}

#[derive(Debug, Deserialize)]
pub struct JobStreamHeader {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RcEvaluation {
    #[serde(default)]
    pub results: Vec<RcEvaluationEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RcEvaluationEntry {
    pub date: String,
    #[serde(default, rename = "type")]
    pub kinds: Vec<String>,
}
