use {
    crate::{
        cli,
        config::{self, Exact, Scenario, Side, Trade},
        snapshot::Snapshot,
    },
    amm::SwapParams,
    anyhow::{Context, Result},
    clap::Parser,
    dutch_auction::{DutchAuctionInitializer, ExitReport, PoolInitializer},
    number::tick_math::{MAX_SQRT_PRICE, MIN_SQRT_PRICE},
    std::{
        fs::File,
        io::{BufWriter, Write},
    },
};

pub fn start(args: impl Iterator<Item = String>) -> Result<()> {
    let args = cli::Args::parse_from(args);
    let obs_config = observe::Config::new(&args.log, args.stderr_threshold, args.use_json_logs);
    observe::tracing::initialize(&obs_config);
    tracing::info!("running auction-sim with {args:#?}");

    let scenario = config::load(&args.config);
    let summary = match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {path:?}"))?;
            let mut out = BufWriter::new(file);
            let summary = run(&scenario, &mut out)?;
            out.flush()?;
            summary
        }
        None => run(&scenario, &mut std::io::stdout().lock())?,
    };

    tracing::info!(
        executed = summary.executed,
        rejected = summary.rejected,
        "replayed scenario"
    );
    if let Some(report) = &summary.exit {
        tracing::info!(report = %serde_json::to_string(report)?, "exit report");
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct Summary {
    pub executed: usize,
    pub rejected: usize,
    pub exit: Option<ExitReport>,
}

/// Replays the scenario, writing a slug snapshot after the pool is created
/// and after every executed trade.
pub fn run(scenario: &Scenario, out: &mut impl Write) -> Result<Summary> {
    let config = &scenario.auction;
    let mut initializer = DutchAuctionInitializer::default();
    let handle = initializer
        .initialize(
            scenario.asset,
            scenario.numeraire,
            config.num_tokens_to_sell,
            scenario.salt,
            &config.to_init_data()?,
            config.starting_time,
        )
        .context("creating the auction pool")?;
    write_snapshot(&initializer, &handle, config.starting_time, out)?;

    let mut summary = Summary::default();
    for trade in &scenario.trades {
        let params = swap_params(trade, config.is_token0)?;
        match initializer.swap(&handle, trade.at, params) {
            Ok(result) => {
                tracing::info!(at = trade.at, side = ?trade.side, delta = ?result.delta, "executed trade");
                summary.executed += 1;
                write_snapshot(&initializer, &handle, trade.at, out)?;
            }
            Err(err) => {
                tracing::warn!(at = trade.at, side = ?trade.side, %err, "trade rejected");
                summary.rejected += 1;
            }
        }
    }

    if scenario.exit {
        let now = scenario
            .trades
            .last()
            .map_or(config.ending_time, |trade| trade.at)
            .max(config.ending_time);
        let report = initializer
            .exit_liquidity(handle, now)
            .context("exiting the auction pool")?;
        summary.exit = Some(report);
    }
    Ok(summary)
}

fn swap_params(trade: &Trade, is_token0: bool) -> Result<SwapParams> {
    let zero_for_one = match trade.side {
        Side::Buy => !is_token0,
        Side::Sell => is_token0,
    };
    let amount = i128::try_from(trade.amount).context("trade amount too large")?;
    Ok(SwapParams {
        zero_for_one,
        amount_specified: match trade.exact {
            Exact::In => amount,
            Exact::Out => -amount,
        },
        sqrt_price_limit: if zero_for_one {
            MIN_SQRT_PRICE
        } else {
            MAX_SQRT_PRICE
        },
    })
}

fn write_snapshot(
    initializer: &DutchAuctionInitializer,
    handle: &alloy::primitives::Address,
    timestamp: u64,
    out: &mut impl Write,
) -> Result<()> {
    let pool = initializer
        .pool(handle)
        .context("auction pool disappeared")?;
    let snapshot = Snapshot::new(pool.hook(), pool.pool().slot0()?.tick, timestamp);
    serde_json::to_writer(&mut *out, &snapshot)?;
    writeln!(out)?;
    Ok(())
}
