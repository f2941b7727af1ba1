//! Hand-off of the pool's liquidity once the sale is over.

use {
    crate::{Auction, Error, Phase},
    alloy::primitives::{Address, U256},
    amm::Pool,
    number::serialization::HexOrDecimalU256,
    serde::Serialize,
    serde_with::serde_as,
};

/// What the receiver of the liquidity should do with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    /// The minimum proceeds were raised. Liquidity moves to a permanent
    /// market.
    Migrate,
    /// The sale failed. Proceeds go back to the buyers.
    Refund,
}

/// Everything released by an exit, by pool token.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitReport {
    #[serde_as(as = "HexOrDecimalU256")]
    pub sqrt_price: U256,
    pub token0: Address,
    #[serde_as(as = "HexOrDecimalU256")]
    pub fees0: U256,
    #[serde_as(as = "HexOrDecimalU256")]
    pub balance0: U256,
    pub token1: Address,
    #[serde_as(as = "HexOrDecimalU256")]
    pub fees1: U256,
    #[serde_as(as = "HexOrDecimalU256")]
    pub balance1: U256,
    pub outcome: Outcome,
}

impl Auction {
    /// Withdraws every slug and hands the auction's tokens off.
    ///
    /// Allowed once the sale window is over or the maximum proceeds were
    /// reached. The auction cannot trade afterwards.
    pub(crate) fn exit(&mut self, pool: &mut Pool, now: u64) -> Result<ExitReport, Error> {
        match self.phase {
            Phase::Uninitialized => return Err(Error::NotInitialized),
            Phase::Exited => return Err(Error::PoolAlreadyExited),
            Phase::EarlyExited => (),
            Phase::Active | Phase::Matured => {
                if !self.config.has_ended(now) {
                    return Err(Error::SaleStillActive);
                }
            }
        }

        self.withdraw_slugs(pool)?;
        let (token0, token1) = pool.key().tokens.get();
        let outcome = if self.state.minimum_proceeds_met(&self.config) {
            Outcome::Migrate
        } else {
            Outcome::Refund
        };
        let report = ExitReport {
            sqrt_price: pool.slot0()?.sqrt_price,
            token0,
            fees0: self.state.fees_accrued[0],
            balance0: self.balances[0],
            token1,
            fees1: self.state.fees_accrued[1],
            balance1: self.balances[1],
            outcome,
        };

        self.balances = [U256::ZERO; 2];
        self.phase = Phase::Exited;
        self.exit_report = Some(report.clone());
        tracing::info!(
            address = ?self.address,
            now,
            ?outcome,
            balance0 = %report.balance0,
            balance1 = %report.balance1,
            "exited liquidity"
        );
        Ok(report)
    }
}
