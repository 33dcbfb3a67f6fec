//! Run — drive one analysis and hand the report to the reporter.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};

use crate::conf::AnalysisConfig;
use crate::diag::TracingSink;
use crate::pipeline::Pipeline;
use crate::report::{Reporter, SummaryReporter};

pub async fn run(config: AnalysisConfig, root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = Pipeline::new(config, Arc::new(TracingSink))?;

    let started = std::time::Instant::now();
    let report = pipeline.run(&root).await.map_err(|e| {
        error!("Analysis failed: {}", e);
        e
    })?;
    info!("Analysis finished in {:.2?}", started.elapsed());

    SummaryReporter.report(&report);
    Ok(())
}
