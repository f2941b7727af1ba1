//! Checked fixed-point arithmetic for concentrated liquidity.
//!
//! Prices are square roots encoded as Q64.96 numbers stored in a `U256`,
//! liquidity is a `u128` and token amounts are `U256`. Every conversion in
//! here rounds in a documented direction and reports overflow instead of
//! wrapping.

pub mod liquidity_amounts;
pub mod serialization;
pub mod sqrt_price_math;
pub mod swap_math;
pub mod tick_math;
pub mod u256_ext;

pub use alloy::primitives::U256;

/// 2^96, the fixed-point scale of a sqrt price.
pub const Q96: U256 = U256::from_limbs([0, 1 << 32, 0, 0]);

/// Denominator of fee rates expressed in hundredths of a basis point.
pub const FEE_DENOMINATOR: u32 = 1_000_000;

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("overflow")]
    Overflow,
    #[error("division by zero")]
    DivisionByZero,
    #[error("tick {0} outside of the supported range")]
    TickOutOfBounds(i32),
    #[error("sqrt price {0} outside of the supported range")]
    SqrtPriceOutOfBounds(U256),
    #[error("not enough liquidity to move the price by the requested amount")]
    InsufficientLiquidity,
}

pub type Result<T> = std::result::Result<T, Error>;
