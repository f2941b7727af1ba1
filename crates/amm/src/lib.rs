//! A minimal in-process concentrated liquidity pool with lifecycle hooks.
//!
//! The pool follows the Uniswap V3 tick and position model: liquidity is
//! placed in ranges between two ticks and swaps walk the price across those
//! ranges. A [`Hook`] can be attached through [`HookedPool`] to observe and
//! veto pool operations.
//!
//! All token amounts reported by the pool are signed from the pool's point
//! of view: a positive amount is paid into the pool, a negative amount is
//! paid out of it.

pub mod hook;
pub mod pool;

pub use {
    hook::{Hook, HookedPool},
    pool::{BalanceDelta, Pool, PoolKey, Slot0, SwapParams, SwapResult, TickRange, TokenPair},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("pool is already initialized")]
    AlreadyInitialized,
    #[error("pool is not initialized")]
    NotInitialized,
    #[error("invalid tick range [{lower}, {upper})")]
    InvalidTickRange { lower: i32, upper: i32 },
    #[error("tick {tick} is not a multiple of the tick spacing {spacing}")]
    TickMisaligned { tick: i32, spacing: i32 },
    #[error("invalid tick spacing {0}")]
    InvalidTickSpacing(i32),
    #[error("position does not hold enough liquidity")]
    InsufficientPositionLiquidity,
    #[error("sqrt price limit is on the wrong side of the current price or out of range")]
    InvalidSqrtPriceLimit,
    #[error("swap amount must not be zero")]
    ZeroAmount,
    #[error("swap did not converge within {0} steps")]
    TooManySteps(u32),
    #[error("amount does not fit into a signed 128 bit delta")]
    AmountOverflow,
    #[error(transparent)]
    Math(#[from] number::Error),
}
