use alloy::primitives::Address;

/// Everything that can make an auction operation revert. A failed operation
/// never leaves partial changes behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    // Configuration.
    #[error("number of tokens to sell must be positive and fit a pool delta")]
    InvalidNumTokensToSell,
    #[error("starting time must be before ending time")]
    InvalidTimeRange,
    #[error("epoch length must be positive and divide the sale window")]
    InvalidEpochLength,
    #[error("tick spacing must be in (0, 30]")]
    InvalidTickSpacing,
    #[error("gamma must be a positive multiple of the tick spacing")]
    InvalidGamma,
    #[error("starting and ending tick are out of bounds or ordered against the asset side")]
    InvalidTickRange,
    #[error("at most 15 price discovery slugs are supported")]
    InvalidNumPriceDiscoverySlugs,
    #[error("minimum proceeds exceed maximum proceeds")]
    InvalidProceedsLimits,
    #[error("swap fee must be below the fee denominator")]
    InvalidSwapFee,
    #[error("malformed initialization data: {0}")]
    InvalidInitData(String),
    #[error("pool key does not match the auction configuration")]
    PoolMismatch,

    // Timing.
    #[error("the sale has not started yet")]
    BeforeStartTime,
    #[error("purchases are closed, the sale matured without reaching its minimum proceeds")]
    InvalidSwapAfterMaturityInsufficientProceeds,
    #[error("the sale is still active")]
    SaleStillActive,

    // Bounds.
    #[error("swap would move the price past the lower slug")]
    SwapBelowRange,
    #[error("invalid sqrt price limit")]
    InvalidSqrtPriceLimit,
    #[error("sell-back exceeds the number of tokens sold")]
    SellBackExceedsSold,
    #[error("sell-back exceeds the proceeds collected")]
    SellBackExceedsProceeds,
    #[error("more tokens sold than offered")]
    SupplyExceeded,
    #[error("two slugs share the range [{lower}, {upper})")]
    DuplicateSlugRange { lower: i32, upper: i32 },

    // Capacity.
    #[error("maximum proceeds reached, only sell-backs are accepted")]
    MaximumProceedsReached,

    // Lifecycle.
    #[error("auction is already initialized")]
    AlreadyInitialized,
    #[error("auction is not initialized")]
    NotInitialized,
    #[error("pool already exited")]
    PoolAlreadyExited,
    #[error("hook re-entered while a swap is in flight")]
    Reentrant,
    #[error("{0} may not add liquidity to an auction pool")]
    Unauthorized(Address),
    #[error("asset and numeraire order does not match the configured asset side")]
    InvalidTokenOrder,
    #[error("unknown pool {0}")]
    UnknownPool(Address),

    // Arithmetic and host failures.
    #[error("engine balance of token{0} is insufficient")]
    InsufficientBalance(usize),
    #[error(transparent)]
    Math(#[from] number::Error),
    #[error(transparent)]
    Pool(#[from] amm::Error),
}
