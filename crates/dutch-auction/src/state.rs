use {
    crate::AuctionConfig,
    alloy::primitives::U256,
    number::serialization::HexOrDecimalU256,
    serde::Serialize,
    serde_with::serde_as,
};

/// Lifecycle of a sale.
///
/// ```text
/// Uninitialized -> Active -> Matured -----> Exited
///                        \-> EarlyExited -/
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Phase {
    #[default]
    Uninitialized,
    /// Trading within the sale window.
    Active,
    /// The sale window is over.
    Matured,
    /// The maximum proceeds were reached before the end of the window.
    EarlyExited,
    /// Liquidity has been handed off. Terminal.
    Exited,
}

/// Running totals of a sale.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionState {
    /// Asset sold so far, net of sell-backs.
    #[serde_as(as = "HexOrDecimalU256")]
    pub total_tokens_sold: U256,
    /// Numeraire received net of swap fees, minus numeraire paid out for
    /// sell-backs.
    #[serde_as(as = "HexOrDecimalU256")]
    pub total_proceeds: U256,
    /// Swap fees collected per pool token.
    #[serde_as(as = "[HexOrDecimalU256; 2]")]
    pub fees_accrued: [U256; 2],
    /// Offset of the price curve from the starting tick, in ticks towards a
    /// higher asset price. Never positive.
    pub tick_accumulator: i32,
    pub last_synced_epoch: u64,
    /// `total_tokens_sold` when the last rebalance ran.
    #[serde_as(as = "HexOrDecimalU256")]
    pub total_tokens_sold_last_epoch: U256,
    pub early_exit_triggered: bool,
    /// Set once the refund slug of a failed sale is in place.
    pub insufficient_proceeds: bool,
}

impl AuctionState {
    /// The tick the slugs are anchored at: the starting tick moved by the
    /// accumulator and aligned towards the cheaper side.
    pub fn anchor(&self, config: &AuctionConfig) -> i32 {
        config.align_cheaper(config.pricier(config.starting_tick, self.tick_accumulator))
    }

    /// Asset not sold yet.
    pub fn remaining(&self, config: &AuctionConfig) -> U256 {
        config
            .num_tokens_to_sell
            .saturating_sub(self.total_tokens_sold)
    }

    pub fn minimum_proceeds_met(&self, config: &AuctionConfig) -> bool {
        self.total_proceeds >= config.minimum_proceeds
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::config::tests::example};

    #[test]
    fn anchor_follows_the_accumulator() {
        let token0 = example(true);
        let mut state = AuctionState::default();
        assert_eq!(state.anchor(&token0), 1_600);
        state.tick_accumulator = -805;
        assert_eq!(state.anchor(&token0), 792);

        let token1 = example(false);
        assert_eq!(state.anchor(&token1), -792);
        state.tick_accumulator = -1_603;
        assert_eq!(state.anchor(&token1), 8);
    }
}
