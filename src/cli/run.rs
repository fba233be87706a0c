use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;
use window_orchestrator::PageSource;

use crate::cli::output::{emit, OutputFormat};
use crate::config::Config;
use crate::page_source::{load_fixture_pages, HttpPageSource};
use crate::runner::{Plan, PlanRunner, RunReport};

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Plan file (YAML)
    #[arg(long, value_name = "FILE")]
    pub plan: PathBuf,

    /// Fixture directory with a pages.yaml manifest; pages come from HTTP otherwise
    #[arg(long, value_name = "DIR")]
    pub pages: Option<PathBuf>,
}

pub async fn cmd_run(args: RunArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let content = tokio::fs::read_to_string(&args.plan)
        .await
        .with_context(|| format!("Failed to read plan {}", args.plan.display()))?;
    let plan = Plan::from_yaml(&content)?;

    let source: Arc<dyn PageSource> = match &args.pages {
        Some(dir) => Arc::new(load_fixture_pages(dir).await?),
        None => Arc::new(HttpPageSource::new(&config.http)?),
    };
    let runner = PlanRunner::new(source, config);
    info!(steps = plan.steps.len(), "running plan");
    let report = runner.run(&plan).await;

    emit(format, &report, summary)?;
    if !report.completed {
        bail!("plan stopped at a failed step");
    }
    Ok(())
}

fn summary(report: &RunReport) -> String {
    let mut lines = vec![format!("task {}", report.task_id)];
    for step in &report.steps {
        let status = if step.success { "ok" } else { "FAILED" };
        let detail = step.error.as_deref().unwrap_or_default();
        lines.push(format!("  {:>2}. {:<9} {status} {detail}", step.index + 1, step.action));
    }
    lines.push(format!("{} actions recorded", report.history.len()));
    lines.join("\n")
}
