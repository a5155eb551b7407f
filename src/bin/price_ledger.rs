use price_ledger::config::{Config, DEFAULT_TIMEZONE};
use price_ledger::ledger::{Ledger, LedgerSchema};
use price_ledger::services::price_service::{PriceService, RunOutcome};
use price_ledger::SourceFormat;

use anyhow::{Context, Result};
use clap::{App, Arg, ArgMatches, SubCommand};
use log::{error, info};
use std::time::Duration;

fn global_arg<'a>(name: &'a str, env: &'a str, help: &'a str) -> Arg<'a> {
    Arg::with_name(name)
        .long(name)
        .env(env)
        .help(help)
        .takes_value(true)
        .global(true)
}

fn flag<'a>(name: &'a str, env: &'a str, help: &'a str) -> Arg<'a> {
    Arg::with_name(name)
        .long(name)
        .env(env)
        .help(help)
        .takes_value(false)
        .global(true)
}

fn app() -> App<'static> {
    App::new("price_ledger")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Append the latest daily price of one listing to a CSV ledger")
        .arg(global_arg("url", "PRICE_LEDGER_URL", "Source page or feed URL"))
        .arg(global_arg("ledger", "PRICE_LEDGER_FILE", "Ledger file path"))
        .arg(global_arg("symbol", "PRICE_LEDGER_SYMBOL", "Stock code to look up in JSON feeds"))
        .arg(global_arg(
            "format",
            "PRICE_LEDGER_FORMAT",
            "Source format (html-label, html-position, json)",
        ))
        .arg(
            global_arg("timezone", "PRICE_LEDGER_TZ", "Time zone for the weekend check")
                .default_value(DEFAULT_TIMEZONE),
        )
        .arg(global_arg("timeout", "PRICE_LEDGER_TIMEOUT", "Request timeout in seconds"))
        .arg(global_arg("retries", "PRICE_LEDGER_RETRIES", "Maximum request attempts"))
        .arg(global_arg("retry-delay", "PRICE_LEDGER_RETRY_DELAY", "Seconds between attempts"))
        .arg(global_arg("table-selector", "PRICE_LEDGER_TABLE_SELECTOR", "CSS selector of the price table"))
        .arg(global_arg("user-agent", "PRICE_LEDGER_USER_AGENT", "User-Agent header sent to the source"))
        .arg(global_arg("referer", "PRICE_LEDGER_REFERER", "Referer header sent to the source"))
        .arg(global_arg("accept-language", "PRICE_LEDGER_ACCEPT_LANGUAGE", "Accept-Language header sent to the source"))
        .arg(global_arg("json-rows", "PRICE_LEDGER_JSON_ROWS", "JSON pointer to the row array"))
        .arg(global_arg("json-symbol-key", "PRICE_LEDGER_JSON_SYMBOL_KEY", "Row key holding the stock code"))
        .arg(global_arg("json-date-key", "PRICE_LEDGER_JSON_DATE_KEY", "Key holding the trading date"))
        .arg(flag("no-lacp", "PRICE_LEDGER_NO_LACP", "Ledger without the LACP column"))
        .arg(flag("ignore-weekend", "PRICE_LEDGER_IGNORE_WEEKEND", "Run on Saturdays and Sundays too"))
        .subcommand(SubCommand::with_name("run").about("Fetch today's price and update the ledger (default)"))
        .subcommand(
            SubCommand::with_name("show")
                .about("Print the newest ledger records")
                .arg(
                    Arg::with_name("limit")
                        .short('l')
                        .long("limit")
                        .value_name("LIMIT")
                        .help("Number of records to display")
                        .takes_value(true)
                        .default_value("10"),
                )
                .arg(
                    Arg::with_name("json")
                        .long("json")
                        .help("Print records as JSON")
                        .takes_value(false),
                ),
        )
}

fn parse_secs(matches: &ArgMatches, name: &str) -> Result<Option<Duration>> {
    matches
        .value_of(name)
        .map(|v| {
            v.parse::<u64>()
                .map(Duration::from_secs)
                .with_context(|| format!("--{} expects whole seconds, got {}", name, v))
        })
        .transpose()
}

/// 由命令行和环境变量组装配置
fn build_config(matches: &ArgMatches) -> Result<Config> {
    let mut config = Config::new();

    if let Some(url) = matches.value_of("url") {
        config = config.with_url(url);
    }
    if let Some(path) = matches.value_of("ledger") {
        config = config.with_ledger_path(path);
    }
    if let Some(symbol) = matches.value_of("symbol") {
        config = config.with_symbol(symbol);
    }
    if let Some(format) = matches.value_of("format") {
        config = config.with_source_format(format.parse::<SourceFormat>()?);
    }
    if let Some(tz) = matches.value_of("timezone") {
        config = config.with_timezone_name(tz)?;
    }
    if let Some(timeout) = parse_secs(matches, "timeout")? {
        config = config.with_timeout(timeout);
    }
    if let Some(retries) = matches.value_of("retries") {
        let attempts = retries
            .parse::<usize>()
            .with_context(|| format!("--retries expects a number, got {}", retries))?;
        config = config.with_max_attempts(attempts);
    }
    if let Some(delay) = parse_secs(matches, "retry-delay")? {
        config = config.with_retry_delay(delay);
    }
    if let Some(css) = matches.value_of("table-selector") {
        config = config.with_table_selector(css);
    }
    if let Some(user_agent) = matches.value_of("user-agent") {
        config = config.with_user_agent(user_agent);
    }
    if let Some(referer) = matches.value_of("referer") {
        config = config.with_referer(Some(referer));
    }
    if let Some(language) = matches.value_of("accept-language") {
        config = config.with_accept_language(Some(language));
    }
    if matches.is_present("json-rows")
        || matches.is_present("json-symbol-key")
        || matches.is_present("json-date-key")
    {
        let rows = matches.value_of("json-rows").unwrap_or(&config.json_rows_pointer).to_string();
        let symbol_key = matches.value_of("json-symbol-key").unwrap_or(&config.json_symbol_key).to_string();
        let date_key = matches.value_of("json-date-key").unwrap_or(&config.json_date_key).to_string();
        config = config.with_json_keys(&rows, &symbol_key, &date_key);
    }
    if matches.is_present("no-lacp") {
        config = config.with_schema(LedgerSchema::WithoutLacp);
    }
    if matches.is_present("ignore-weekend") {
        config = config.with_skip_weekends(false);
    }

    Ok(config)
}

async fn run(config: Config) -> Result<()> {
    let service = PriceService::from_config(config)?;

    match service.run().await? {
        RunOutcome::Added(record) => info!("Update completed successfully ({})", record.date),
        RunOutcome::SkippedDuplicate(date) => info!("{} already exists, nothing to do", date),
        RunOutcome::SkippedWeekend(date) => info!("Market closed on {}, nothing to do", date),
    }
    Ok(())
}

fn parse_limit(matches: &ArgMatches) -> Result<usize> {
    let limit = matches.value_of("limit").unwrap_or("10");
    limit
        .parse::<usize>()
        .with_context(|| format!("--limit expects a number, got {}", limit))
}

fn show(config: &Config, matches: &ArgMatches) -> Result<()> {
    let limit = parse_limit(matches)?;

    let ledger = Ledger::new(config.ledger_path.clone(), config.schema);
    if !ledger.path().exists() {
        info!("Ledger {} does not exist yet", ledger.path().display());
        return Ok(());
    }

    let records = ledger.records()?;
    info!("Found {} records in {}", records.len(), ledger.path().display());

    if matches.is_present("json") {
        let shown: Vec<_> = records.iter().take(limit).collect();
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    println!(
        "{:<12} {:<10} {:<10} {:<10} {:<10} {:<12} {:<10} {:<10}",
        "Date", "Open", "High", "Low", "Close", "Volume", "Change", "%Change"
    );
    println!("{:-<90}", "");
    for record in records.iter().take(limit) {
        println!(
            "{:<12} {:<10} {:<10} {:<10} {:<10} {:<12} {:<10} {:<10}",
            record.date,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
            record.change,
            record.percentage_change
        );
    }
    if records.len() > limit {
        println!("... and {} more records", records.len() - limit);
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = app().get_matches();

    let result = match matches.subcommand() {
        Some(("show", sub)) => build_config(sub).and_then(|config| show(&config, sub)),
        Some((_, sub)) => match build_config(sub) {
            Ok(config) => run(config).await,
            Err(e) => Err(e),
        },
        None => match build_config(&matches) {
            Ok(config) => run(config).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
