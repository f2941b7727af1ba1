//! Scenario files: the parameters of one sale and the trades replayed
//! against it.

use {
    alloy::primitives::{Address, B256, U256},
    dutch_auction::AuctionConfig,
    number::serialization::HexOrDecimalU256,
    serde::Deserialize,
    serde_with::serde_as,
    std::{path::Path, time::Duration},
};

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct File {
    asset: Address,
    numeraire: Address,
    #[serde(default)]
    salt: B256,
    #[serde_as(as = "HexOrDecimalU256")]
    num_tokens_to_sell: U256,
    /// Unix timestamp of the start of the sale.
    starting_time: u64,
    #[serde(with = "humantime_serde")]
    duration: Duration,
    #[serde(with = "humantime_serde")]
    epoch_length: Duration,
    starting_tick: i32,
    ending_tick: i32,
    gamma: i32,
    #[serde_as(as = "HexOrDecimalU256")]
    minimum_proceeds: U256,
    #[serde_as(as = "HexOrDecimalU256")]
    maximum_proceeds: U256,
    #[serde(default = "default_price_discovery_slugs")]
    price_discovery_slugs: usize,
    #[serde(default = "default_swap_fee")]
    swap_fee: u32,
    #[serde(default = "default_tick_spacing")]
    tick_spacing: i32,
    /// Whether to exit the pool's liquidity once the last trade ran.
    #[serde(default = "default_exit")]
    exit: bool,
    #[serde(default, rename = "trade")]
    trades: Vec<TradeFile>,
}

fn default_price_discovery_slugs() -> usize {
    3
}

fn default_swap_fee() -> u32 {
    3_000
}

fn default_tick_spacing() -> i32 {
    8
}

fn default_exit() -> bool {
    true
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct TradeFile {
    /// Time of the trade relative to the start of the sale.
    #[serde(with = "humantime_serde")]
    at: Duration,
    side: Side,
    #[serde_as(as = "HexOrDecimalU256")]
    amount: U256,
    #[serde(default)]
    exact: Exact,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Pay numeraire for asset.
    Buy,
    /// Pay asset for numeraire.
    Sell,
}

/// Which side of the trade `amount` fixes.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Exact {
    #[default]
    In,
    Out,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trade {
    /// Unix timestamp.
    pub at: u64,
    pub side: Side,
    pub amount: U256,
    pub exact: Exact,
}

#[derive(Clone, Debug)]
pub struct Scenario {
    pub asset: Address,
    pub numeraire: Address,
    pub salt: B256,
    pub auction: AuctionConfig,
    pub exit: bool,
    /// Sorted by time.
    pub trades: Vec<Trade>,
}

/// Load a scenario from a TOML file.
///
/// # Panics
///
/// This method panics if the scenario is invalid or on I/O errors.
pub fn load(path: &Path) -> Scenario {
    let data = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("I/O error while reading {path:?}: {e:?}"));
    let file: File = toml::de::from_str(&data)
        .unwrap_or_else(|e| panic!("TOML syntax error while reading {path:?}: {e}"));

    let starting_time = file.starting_time;
    let auction = AuctionConfig {
        starting_time,
        ending_time: starting_time + file.duration.as_secs(),
        epoch_length: file.epoch_length.as_secs(),
        starting_tick: file.starting_tick,
        ending_tick: file.ending_tick,
        gamma: file.gamma,
        num_tokens_to_sell: file.num_tokens_to_sell,
        minimum_proceeds: file.minimum_proceeds,
        maximum_proceeds: file.maximum_proceeds,
        num_price_discovery_slugs: file.price_discovery_slugs,
        is_token0: file.asset < file.numeraire,
        swap_fee: file.swap_fee,
        tick_spacing: file.tick_spacing,
    };
    auction
        .validate()
        .unwrap_or_else(|e| panic!("invalid auction parameters in {path:?}: {e}"));

    let mut trades: Vec<_> = file
        .trades
        .into_iter()
        .map(|trade| Trade {
            at: starting_time + trade.at.as_secs(),
            side: trade.side,
            amount: trade.amount,
            exact: trade.exact,
        })
        .collect();
    trades.sort_by_key(|trade| trade.at);

    Scenario {
        asset: file.asset,
        numeraire: file.numeraire,
        salt: file.salt,
        auction,
        exit: file.exit,
        trades,
    }
}
