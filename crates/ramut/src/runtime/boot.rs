//! Boot — logging init, config load, scan root resolution.

use std::path::PathBuf;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::AnalysisConfig;

/// Initialise the tracing / logging subsystem.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ramut=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load and validate config, then resolve the directory to scan.
///
/// The first command-line argument wins over `root` from the config.
pub async fn boot() -> Result<(AnalysisConfig, PathBuf), Box<dyn std::error::Error>> {
    info!("Starting ramut v{}", env!("CARGO_PKG_VERSION"));

    let config = AnalysisConfig::load()?;
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    info!(
        "Thresholds: ref_cov={}, ref_diff={}KB, parse_date={}, workers={}",
        config.ref_cov, config.ref_diff, config.parse_date, config.max_workers
    );

    let root = resolve_root(std::env::args().nth(1), config.root.as_deref()).ok_or_else(|| {
        error!("No scan root given (argument or RAMUT_ROOT)");
        "no scan root given"
    })?;
    info!("Scan root: {}", root.display());

    Ok((config, root))
}

fn resolve_root(arg: Option<String>, configured: Option<&str>) -> Option<PathBuf> {
    arg.filter(|a| !a.is_empty())
        .map(PathBuf::from)
        .or_else(|| configured.map(PathBuf::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_wins_over_config() {
        assert_eq!(
            resolve_root(Some("/data/logs".into()), Some("/etc/logs")),
            Some(PathBuf::from("/data/logs"))
        );
    }

    #[test]
    fn test_config_root_fallback() {
        assert_eq!(resolve_root(None, Some("/etc/logs")), Some(PathBuf::from("/etc/logs")));
        assert_eq!(resolve_root(Some(String::new()), Some("/etc/logs")), Some(PathBuf::from("/etc/logs")));
        assert_eq!(resolve_root(None, None), None);
    }
}
