//! Epoch arithmetic and the linear sale schedule.

use {crate::AuctionConfig, alloy::primitives::U256};

impl AuctionConfig {
    /// Number of epochs in the sale window.
    pub fn total_epochs(&self) -> u64 {
        (self.ending_time - self.starting_time) / self.epoch_length
    }

    /// Epoch containing `now`. Times before the start map to epoch 0, times
    /// after the end to [`Self::total_epochs`].
    pub fn epoch_at(&self, now: u64) -> u64 {
        let elapsed = now.saturating_sub(self.starting_time);
        (elapsed / self.epoch_length).min(self.total_epochs())
    }

    /// Timestamp at which `epoch` closes.
    pub fn epoch_end(&self, epoch: u64) -> u64 {
        let epoch = (epoch + 1).min(self.total_epochs());
        self.starting_time + epoch * self.epoch_length
    }

    /// Cumulative amount the linear schedule expects to be sold when `epoch`
    /// closes.
    pub fn expected_sold_at_epoch_end(&self, epoch: u64) -> Result<U256, number::Error> {
        let total = self.total_epochs();
        let closed = (epoch + 1).min(total);
        self.num_tokens_to_sell
            .checked_mul(U256::from(closed))
            .map(|scheduled| scheduled / U256::from(total))
            .ok_or(number::Error::Overflow)
    }

    pub fn has_started(&self, now: u64) -> bool {
        now >= self.starting_time
    }

    pub fn has_ended(&self, now: u64) -> bool {
        now >= self.ending_time
    }
}
