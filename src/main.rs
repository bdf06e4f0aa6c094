//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `seo_poison_scanner` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Writing the JSON result
//!
//! All core functionality is implemented in the library crate.

use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;

use seo_poison_scanner::config::Opt;
use seo_poison_scanner::dns::HostResolver;
use seo_poison_scanner::initialization::{init_client, init_logger_with, init_resolver};
use seo_poison_scanner::progress::{FanOut, LogProgress, ProgressSink, ProgressStore};
use seo_poison_scanner::status_server::start_status_server;
use seo_poison_scanner::verify::ChromeLauncher;
use seo_poison_scanner::{ScanRequest, Scanner};

#[tokio::main]
async fn main() -> Result<()> {
    // Load SERPAPI_KEY and friends from .env, current directory first, then
    // next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();
    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    if let Err(e) = run(opt).await {
        eprintln!("seo_poison_scanner error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn run(opt: Opt) -> Result<()> {
    let config = opt.scan_config()?;
    let keys = opt.api_keys();
    if !keys.is_configured() {
        warn!("No SerpAPI key given (--api-key or SERPAPI_KEY); search will be skipped");
    }

    let client = init_client(config.http_timeout_secs).context("Failed to initialize HTTP client")?;
    let resolver: Arc<dyn HostResolver> = init_resolver().context("Failed to initialize DNS resolver")?;

    let mut sinks: Vec<Arc<dyn ProgressSink>> = vec![Arc::new(LogProgress)];
    if let Some(port) = opt.status_port {
        let store = ProgressStore::new();
        sinks.push(Arc::new(store.clone()));
        tokio::spawn(async move {
            if let Err(e) = start_status_server(port, store).await {
                warn!("Status server error: {:#}", e);
            }
        });
    }

    let mut scanner = Scanner::new(client, resolver).with_progress(Arc::new(FanOut::new(sinks)));
    if !opt.no_browser {
        scanner = scanner.with_browser(Arc::new(ChromeLauncher::new(opt.chrome_path.clone())));
    }

    let mut request = ScanRequest::new(opt.domain.clone(), keys, opt.scan_type);
    if let Some(scan_id) = &opt.scan_id {
        request = request.with_scan_id(scan_id.clone());
    }
    let result = scanner.perform_scan(&request, &config).await;

    let json = serde_json::to_string_pretty(&result).context("Failed to serialize scan result")?;
    match &opt.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write result to {}", path.display()))?;
            println!(
                "{}: {:?} (risk score {}), result saved in {}",
                result.domain,
                result.final_conclusion.status,
                result.final_conclusion.risk_score,
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}
