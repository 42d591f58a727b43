use anyhow::Result;
use catalog_harness::{client, config, conformance, telemetry};
use client::CatalogClient;
use config::Config;
use conformance::Suite;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cfg = Config::load()?;
    init_tracing(cfg.run.log_format);

    if cfg.target.base_url.starts_with("http://") {
        warn!(base_url = %cfg.target.base_url, "target is plain HTTP");
    }

    let suites = Suite::resolve(cfg.run.suite.as_deref());
    info!(
        target = %cfg.target.products_url(),
        suites = ?suites.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "starting catalog harness"
    );

    let client = CatalogClient::new(&cfg.target)?;

    let report = tokio::select! {
        report = conformance::run_suites(&suites, &client, &cfg) => report?,
        _ = telemetry::shutdown_signal() => {
            warn!("run interrupted before completion");
            std::process::exit(130);
        }
    };

    println!("{report}");
    info!(passed = report.passed(), "harness finished");
    std::process::exit(report.exit_code());
}
