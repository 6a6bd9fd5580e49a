use std::process::ExitCode;

use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use lotto::report;
use lotto_client::{ClientConfig, Datastore, SyncError};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let matches = Command::new("lotto")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Keep a local copy of the lotto draw history")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(clap::ArgAction::Count)
                .help("Set verbose output level"),
        )
        .subcommand(Command::new("sync").about("Fetch new draws from the resolver"))
        .subcommand(Command::new("status").about("Show what is stored locally"))
        .subcommand(
            Command::new("history").about("Print the newest draws").arg(
                Arg::new("count")
                    .short('n')
                    .long("count")
                    .value_parser(clap::value_parser!(i64).range(1..))
                    .default_value("10")
                    .help("How many draws to print"),
            ),
        )
        .subcommand(Command::new("stats").about("Winning-number frequencies"))
        .subcommand(
            Command::new("search")
                .about("Draws containing all of the given numbers")
                .arg(
                    Arg::new("numbers")
                        .required(true)
                        .num_args(1..=6)
                        .value_parser(clap::value_parser!(u8).range(1..=45)),
                ),
        )
        .get_matches();

    let log_level = match matches.get_count("verbose") {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    lotto_client::setup(Some(log_level));

    let config = ClientConfig::from_env();
    match matches.subcommand() {
        Some(("sync", _)) => sync(&config).await,
        Some(("status", _)) => status(&config),
        Some(("history", args)) => history(&config, args),
        Some(("stats", _)) => stats(&config),
        Some(("search", args)) => search(&config, args),
        _ => Ok(ExitCode::FAILURE),
    }
}

async fn sync(config: &ClientConfig) -> Result<ExitCode> {
    let orchestrator = config.orchestrator()?;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling sync");
            trigger.cancel();
        }
    });

    match orchestrator.sync(&cancel).await {
        Ok(outcome) => {
            println!("{}", report::sync_summary(&outcome));
            Ok(ExitCode::SUCCESS)
        }
        Err(SyncError::Cancelled) => {
            eprintln!("Sync cancelled; nothing was stored");
            Ok(ExitCode::from(130))
        }
        Err(e) => {
            eprintln!("Sync failed: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn status(config: &ClientConfig) -> Result<ExitCode> {
    let store = Datastore::open(&config.database_url)?;
    let lines = report::status_lines(
        store.draw_count()?,
        store.local_latest_draw_no()?,
        &store.sync_state()?,
    );
    println!("Database     : {}", config.database_url);
    println!("Resolver     : {}", config.resolver_url);
    for line in lines {
        println!("{line}");
    }
    Ok(ExitCode::SUCCESS)
}

fn history(config: &ClientConfig, args: &ArgMatches) -> Result<ExitCode> {
    let count = args.get_one::<i64>("count").copied().unwrap_or(10);
    let store = Datastore::open(&config.database_url)?;
    let draws = store.latest_draws(count)?;
    if draws.is_empty() {
        println!("No draws stored yet; run `lotto sync` first");
    }
    for draw in &draws {
        println!("{}", report::draw_line(draw));
    }
    Ok(ExitCode::SUCCESS)
}

fn stats(config: &ClientConfig) -> Result<ExitCode> {
    let store = Datastore::open(&config.database_url)?;
    println!("Over {} draws", store.draw_count()?);
    for line in report::frequency_lines(store.number_frequencies()?) {
        println!("{line}");
    }
    Ok(ExitCode::SUCCESS)
}

fn search(config: &ClientConfig, args: &ArgMatches) -> Result<ExitCode> {
    let numbers: Vec<u8> = args
        .get_many::<u8>("numbers")
        .map(|values| values.copied().collect())
        .unwrap_or_default();
    let store = Datastore::open(&config.database_url)?;
    let draws = store.search_by_numbers(&numbers)?;
    println!("{} draws contain {numbers:?}", draws.len());
    for draw in &draws {
        println!("{}", report::draw_line(draw));
    }
    Ok(ExitCode::SUCCESS)
}
