//! A continuous Dutch auction selling a fixed supply of an asset through the
//! liquidity of an AMM pool.
//!
//! The sale window is divided into epochs. At every epoch boundary the price
//! curve moves depending on how actual sales compare to a linear schedule and
//! the auction's liquidity ("slugs") is placed anew around the curve. The
//! [`Auction`] is attached to its pool as a [`amm::Hook`] and checks every
//! trade. Once the sale is over [`PoolInitializer::exit_liquidity`] releases
//! the pool's liquidity for migration or refunds.

mod auction;
pub mod clock;
pub mod config;
mod error;
pub mod exit;
mod guard;
mod hook;
pub mod initializer;
pub mod rebalance;
pub mod slug;
pub mod state;

pub use {
    auction::Auction,
    config::{AuctionConfig, InitData},
    error::Error,
    exit::{ExitReport, Outcome},
    initializer::{DutchAuctionInitializer, PoolInitializer, pool_handle},
    slug::{Slug, SlugId, SlugSet},
    state::{AuctionState, Phase},
};
