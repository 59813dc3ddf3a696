use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use waconn::WaConn;

/// Lists jobs in the current plan whose name matches a filter.
#[derive(Parser, Debug)]
#[command(name = "wa-query-job", version, about)]
struct Cli {
    /// Job name filter
    #[arg(short = 'j', long = "jname", value_name = "J_FILTER")]
    job_name: String,

    /// Connection properties file
    #[arg(long, env = "WACONN_CONFIG", default_value = "waconn.ini")]
    config: PathBuf,

    /// API path prefix on every host
    #[arg(long, env = "WACONN_PREFIX", default_value = "/twsd")]
    prefix: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let conn = WaConn::from_config_file(&cli.config, cli.prefix)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let jobs = conn
        .query_jobs_in_plan(&cli.job_name)
        .await
        .context("job query failed")?;
    for job in jobs {
        println!(
            "{}#{}.{}({})",
            job.workstation, job.job_stream, job.name, job.start_time
        );
    }
    Ok(())
}
