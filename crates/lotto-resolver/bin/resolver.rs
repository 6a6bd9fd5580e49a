use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use lotto_resolver::{HttpServer, ResolverConfig, SystemClock, validate_seed};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let matches = Command::new("lotto-resolver")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Lotto draw resolver service")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(clap::ArgAction::Count)
                .help("Set verbose output level"),
        )
        .subcommand(Command::new("serve").about("Run the HTTP service"))
        .subcommand(
            Command::new("validate-seed")
                .about("Check a bootstrap snapshot for bad records and gaps")
                .arg(
                    Arg::new("path")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Snapshot to check (defaults to the configured seed path)"),
                ),
        )
        .subcommand(Command::new("config-check").about("Print the effective configuration and exit"))
        .get_matches();

    let log_level = match matches.get_count("verbose") {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    lotto_resolver::setup(Some(log_level));

    let config = ResolverConfig::load()?;
    match matches.subcommand() {
        Some(("validate-seed", args)) => Ok(run_validate_seed(&config, args)),
        Some(("config-check", _)) => config_check(&config),
        _ => serve(&config).await,
    }
}

async fn serve(config: &ResolverConfig) -> Result<ExitCode> {
    let state = lotto_resolver::build_state(config, Arc::new(SystemClock))?;
    let server = HttpServer::with_config(state, &config.http)?;
    server.run().await?;
    Ok(ExitCode::SUCCESS)
}

fn run_validate_seed(config: &ResolverConfig, args: &ArgMatches) -> ExitCode {
    let path = args
        .get_one::<PathBuf>("path")
        .cloned()
        .unwrap_or_else(|| config.seed_path.clone());
    let report = validate_seed(&path);
    report.log(&path);
    report.exit_code()
}

fn config_check(config: &ResolverConfig) -> Result<ExitCode> {
    log::info!("Checking configuration...");
    let addr = config.http.socket_addr()?;
    log::info!("HTTP address: {addr}");

    if config.seed_path.exists() {
        log::info!("Seed snapshot: {}", config.seed_path.display());
    } else {
        log::warn!("Seed snapshot {} does not exist", config.seed_path.display());
    }
    if config.upstream.qps == 0 {
        log::warn!("Upstream rate limiting is disabled");
    }

    println!("{}", config.to_toml_string()?);
    log::info!("Configuration check: OK");
    Ok(ExitCode::SUCCESS)
}
