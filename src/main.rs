use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use proxy_probe::{
    input::load_request,
    proxy::{CheckSummary, CheckerConfig, ProxyChecker, ProxyParser, ProxyType},
    report::{ChannelSink, ConsoleSink, Tee, TracingSink},
    tui::{run_alongside, ProxyCheckerApp},
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// A concurrent proxy checker
#[derive(Parser)]
#[command(name = "proxy-probe")]
#[command(about = "Checks proxies concurrently and sorts them into working and failed lists")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check proxies and save results
    Check {
        /// Input file containing proxies (ip:port or ip:port:user:pass)
        input: PathBuf,
        /// URL to test proxies against, must start with https://; prompted for if omitted
        #[arg(short, long)]
        url: Option<String>,
        /// Output file for working and suspect proxies
        #[arg(short, long, default_value = "working.txt")]
        good: PathBuf,
        /// Output file for failed proxies
        #[arg(short, long, default_value = "failed.txt")]
        bad: PathBuf,
        /// Proxy type (http, https, socks4, socks5)
        #[arg(short = 't', long, default_value = "http")]
        proxy_type: String,
        /// Timeout in seconds for each probe
        #[arg(long, default_value = "10")]
        timeout: u64,
        /// Maximum probes in flight; every proxy at once when omitted
        #[arg(short = 'n', long)]
        concurrency: Option<usize>,
        /// Extra PEM root certificate to trust for the test URL
        #[arg(long)]
        ca_cert: Option<PathBuf>,
        /// Show a live terminal UI instead of line output
        #[arg(long)]
        tui: bool,
    },
    /// Parse a proxy file and print the proxies it contains
    Parse {
        /// Input file containing proxies
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let quiet = matches!(cli.command, Commands::Check { tui: true, .. });
    init_tracing(quiet)?;

    match cli.command {
        Commands::Check {
            input,
            url,
            good,
            bad,
            proxy_type,
            timeout,
            concurrency,
            ca_cert,
            tui,
        } => {
            let ptype = parse_proxy_type(&proxy_type)?;
            let request = load_request(url, &input, ptype)?;

            println!("Loaded {} proxies from {:?}", request.records.len(), input);
            println!("Test URL: {}", request.target_url);
            println!();

            let mut config = CheckerConfig::new()
                .with_timeout(Duration::from_secs(timeout))
                .with_test_url(request.target_url);
            if let Some(limit) = concurrency {
                config = config.with_concurrency(limit);
            }
            if let Some(path) = ca_cert {
                let pem = std::fs::read(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                config = config.with_root_certificate(pem);
            }

            let checker = ProxyChecker::with_config(config);
            let total = request.records.len();

            let (summary, tui_result) = if tui {
                let (sink, events) = ChannelSink::new();
                let batch =
                    tokio::spawn(async move { checker.run(request.records, sink).await });

                let mut app = ProxyCheckerApp::new(events, total);
                let (summary, tui_result) = run_alongside(batch, async {
                    let shown = app.run().await;
                    println!("Waiting for remaining probes...");
                    shown
                })
                .await;
                if let Err(e) = &tui_result {
                    error!("terminal UI failed: {:#}", e);
                }

                (summary?, tui_result)
            } else {
                let summary = checker
                    .run(request.records, Tee(ConsoleSink::stdout(), TracingSink))
                    .await?;
                (summary, Ok(()))
            };

            println!();
            println!(
                "Results: {} working, {} suspect, {} failed",
                summary.working, summary.suspect, summary.failed
            );

            save_results(&summary, &good, &bad)?;
            tui_result?;
            println!("{}", "----- FINISHED -----".cyan());
        }
        Commands::Parse { input } => {
            let proxies = ProxyParser::parse_file(&input, ProxyType::Http)?;

            for proxy in &proxies {
                println!("{}", proxy.raw_form());
            }
            println!("Parsed {} proxies from {:?}", proxies.len(), input);
        }
    }

    Ok(())
}

/// Logs go to stderr; the TUI only wants warnings so the screen stays clean
fn init_tracing(quiet: bool) -> Result<()> {
    let default = if quiet { "proxy_probe=warn" } else { "proxy_probe=info" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Write both lists, reporting each file separately
fn save_results(summary: &CheckSummary, good: &Path, bad: &Path) -> Result<()> {
    let mut failures = 0;

    for (lines, path, label) in [
        (&summary.good, good, "working"),
        (&summary.bad, bad, "failed"),
    ] {
        match ProxyParser::append_to_file(lines, path) {
            Ok(()) => {
                info!(count = lines.len(), path = %path.display(), "saved {} proxies", label);
                println!(
                    "{}",
                    format!("Wrote {} proxies to {:?}", label, path).green()
                );
            }
            Err(e) => {
                error!("{}", e);
                println!(
                    "{}",
                    format!("Failed to write {} proxies to {:?}", label, path).red()
                );
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{} result file(s) could not be written", failures);
    }
    Ok(())
}

fn parse_proxy_type(s: &str) -> Result<ProxyType> {
    match s.to_lowercase().as_str() {
        "http" => Ok(ProxyType::Http),
        "https" => Ok(ProxyType::Https),
        "socks4" => Ok(ProxyType::Socks4),
        "socks5" => Ok(ProxyType::Socks5),
        _ => Err(anyhow!(
            "Invalid proxy type: {}. Use: http, https, socks4, socks5",
            s
        )),
    }
}
