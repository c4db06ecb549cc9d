use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pozole::config::{BacktestConfiguration, StrategyType};
use pozole::data::{load_csv, save_csv, PriceSeries, YahooClient};
use pozole::engine::{BacktestConfig, BacktestEngine, BacktestResult};
use pozole::metrics::{EquityPoint, Trade};
use pozole::strategy::build_strategy;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pozole")]
#[command(about = "A strategy-driven backtesting engine for daily stock bars", long_about = None)]
struct Cli {
    //debug logging (RUST_LOG still wins when set)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    //run a backtest
    Run {
        //strategy name (sma_crossover, momentum, momentum_v2)
        #[arg(long)]
        strategy: String,

        //symbols to test, each in its own run; defaults to the config symbols
        #[arg(long)]
        symbol: Vec<String>,

        //csv data file; fetched from yahoo when omitted
        #[arg(long)]
        data: Option<PathBuf>,

        //json configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        //starting cash
        #[arg(long)]
        cash: Option<f64>,

        //commission as a fraction of traded value
        #[arg(long)]
        commission: Option<f64>,

        //fixed order size for sma_crossover and momentum
        #[arg(long)]
        stake: Option<u32>,

        //first date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        //last date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        //output options
        //output path for equity curve csv
        #[arg(long)]
        output_equity_csv: Option<PathBuf>,

        //output path for trades csv
        #[arg(long)]
        output_trades_csv: Option<PathBuf>,
    },

    //download daily bars from yahoo and save them as csv
    Fetch {
        #[arg(long)]
        symbol: String,

        #[arg(long)]
        from: NaiveDate,

        #[arg(long)]
        to: NaiveDate,

        #[arg(long)]
        out: PathBuf,
    },

    //write the default configuration as json
    InitConfig {
        #[arg(long, default_value = "backtest_config.json")]
        out: PathBuf,
    },
}

struct RunOptions {
    config: BacktestConfiguration,
    strategy: StrategyType,
    data: Option<PathBuf>,
    //only set when the user restricted the range explicitly
    csv_range: Option<(NaiveDate, NaiveDate)>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            strategy,
            symbol,
            data,
            config,
            cash,
            commission,
            stake,
            from,
            to,
            output_equity_csv,
            output_trades_csv,
        } => {
            let mut configuration = match &config {
                Some(path) => BacktestConfiguration::from_json_file(path)
                    .with_context(|| format!("Failed to load config from {:?}", path))?,
                None => BacktestConfiguration::default(),
            };

            if let Some(cash) = cash {
                configuration.cash = cash;
            }
            if let Some(commission) = commission {
                configuration.commission = commission;
            }
            if let Some(stake) = stake {
                configuration.stake = stake;
            }
            if let Some(from) = from {
                configuration.fromdate = from;
            }
            if let Some(to) = to {
                configuration.todate = to;
            }
            if !symbol.is_empty() {
                configuration.symbols = symbol;
            } else if let Some(path) = &data {
                configuration.symbols = vec![symbol_from_path(path, &configuration.symbols)];
            }
            configuration.validate()?;

            //unknown names fail here, before any data is touched
            let strategy = StrategyType::parse(&strategy)?;

            if data.is_some() && configuration.symbols.len() > 1 {
                anyhow::bail!("--data holds a single series; pass exactly one --symbol with it");
            }

            let csv_range = (from.is_some() || to.is_some())
                .then_some((configuration.fromdate, configuration.todate));

            let options = RunOptions {
                config: configuration,
                strategy,
                data,
                csv_range,
            };

            run_backtests(&options, output_equity_csv, output_trades_csv)?;
        }
        Commands::Fetch {
            symbol,
            from,
            to,
            out,
        } => {
            let client = YahooClient::new()?;
            let series = client
                .fetch(&symbol, from, to)
                .with_context(|| format!("Failed to fetch {} from yahoo", symbol))?;
            save_csv(&series, &out)?;
            println!("Saved {} bars for {} to {:?}", series.len(), symbol, out);
        }
        Commands::InitConfig { out } => {
            BacktestConfiguration::default().to_json_file(&out)?;
            println!("Default configuration written to {:?}", out);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .init();
}

fn run_backtests(
    options: &RunOptions,
    output_equity_csv: Option<PathBuf>,
    output_trades_csv: Option<PathBuf>,
) -> Result<()> {
    println!("Pozole Backtesting Engine");
    println!("=========================\n");
    println!("Strategy: {}", options.strategy);
    println!("Symbols: {}", options.config.symbols.join(", "));
    println!("Starting Portfolio Value: {:.2}\n", options.config.cash);

    //each symbol is an independent run
    let results: Vec<Result<BacktestResult>> = options
        .config
        .symbols
        .par_iter()
        .map(|symbol| run_symbol(options, symbol))
        .collect();

    let multiple = options.config.symbols.len() > 1;

    for (symbol, result) in options.config.symbols.iter().zip(results) {
        let result = result.with_context(|| format!("Backtest failed for {}", symbol))?;

        println!("Backtest Results: {} ({})", result.symbol, result.strategy);
        println!("================\n");
        println!("Final Portfolio Value: {:.2}", result.final_value);
        println!("Profit/Loss: {:.2}\n", result.pnl);
        result.analysis.pretty_print_table(&options.config.analyzers);
        println!();

        //save outputs if requested
        if let Some(path) = &output_equity_csv {
            let path = output_path(path, symbol, multiple);
            save_equity_csv(&result.equity_curve, &path)?;
            println!("Equity curve saved to {:?}", path);
        }

        if let Some(path) = &output_trades_csv {
            let path = output_path(path, symbol, multiple);
            save_trades_csv(&result.analysis.trades, &path)?;
            println!("Trades saved to {:?}", path);
        }
    }

    Ok(())
}

fn run_symbol(options: &RunOptions, symbol: &str) -> Result<BacktestResult> {
    let config = &options.config;
    let series = load_series(options, symbol)?;

    tracing::info!(
        symbol,
        bars = series.len(),
        from = %series.first().date,
        to = %series.last().date,
        "data loaded"
    );

    let params = config.strategies.params_for(options.strategy);
    let mut strategy = build_strategy(&params, config.stake);

    let engine = BacktestEngine::new(BacktestConfig::from(config), series)?;
    Ok(engine.run(strategy.as_mut())?)
}

fn load_series(options: &RunOptions, symbol: &str) -> Result<PriceSeries> {
    let config = &options.config;
    match &options.data {
        Some(path) => {
            let series = load_csv(path, symbol)
                .with_context(|| format!("Failed to load data from {:?}", path))?;
            match options.csv_range {
                Some((from, to)) => Ok(series.between(from, to)?),
                None => Ok(series),
            }
        }
        None => {
            let client = YahooClient::new()?;
            Ok(client.fetch(symbol, config.fromdate, config.todate)?)
        }
    }
}

//symbol for a csv given without --symbol: the file stem, else the first configured symbol
fn symbol_from_path(path: &Path, configured: &[String]) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_uppercase())
        .filter(|stem| !stem.is_empty())
        .or_else(|| configured.first().cloned())
        .unwrap_or_else(|| "DATA".to_string())
}

//with several symbols every output file gets the symbol appended to its stem
fn output_path(path: &Path, symbol: &str, multiple: bool) -> PathBuf {
    if !multiple {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, symbol, ext.to_string_lossy()),
        None => format!("{}_{}", stem, symbol),
    };
    path.with_file_name(name)
}

fn save_equity_csv(equity_curve: &[EquityPoint], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for point in equity_curve {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

fn save_trades_csv(trades: &[Trade], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for trade in trades {
        writer.serialize(trade)?;
    }
    writer.flush()?;
    Ok(())
}
