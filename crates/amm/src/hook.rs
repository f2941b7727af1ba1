use {
    crate::{
        Error,
        pool::{BalanceDelta, Pool, PoolKey, Slot0, SwapParams, SwapResult, TickRange},
    },
    alloy::primitives::{Address, U256},
};

/// Callbacks invoked around pool operations. Returning an error from any
/// callback aborts the operation and rolls back every change made to the
/// pool and the hook during it.
///
/// Timestamps are unix seconds supplied by the caller.
pub trait Hook: Clone {
    type Error: From<Error>;

    fn after_initialize(&mut self, _pool: &mut Pool, _now: u64) -> Result<(), Self::Error> {
        Ok(())
    }

    fn before_add_liquidity(
        &mut self,
        _sender: Address,
        _range: TickRange,
        _pool: &Pool,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// May rewrite the swap parameters before the swap executes.
    fn before_swap(
        &mut self,
        _pool: &mut Pool,
        _now: u64,
        _params: &mut SwapParams,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn after_swap(
        &mut self,
        _pool: &mut Pool,
        _now: u64,
        _params: &SwapParams,
        _result: &SwapResult,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// A pool with a hook attached. Every operation is atomic.
#[derive(Clone, Debug)]
pub struct HookedPool<H> {
    pool: Pool,
    hook: H,
}

impl<H: Hook> HookedPool<H> {
    pub fn new(key: PoolKey, hook: H) -> Result<Self, Error> {
        Ok(Self {
            pool: Pool::new(key)?,
            hook,
        })
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    fn atomically<T>(
        &mut self,
        operation: impl FnOnce(&mut H, &mut Pool) -> Result<T, H::Error>,
    ) -> Result<T, H::Error> {
        let snapshot = (self.pool.clone(), self.hook.clone());
        let result = operation(&mut self.hook, &mut self.pool);
        if result.is_err() {
            (self.pool, self.hook) = snapshot;
        }
        result
    }

    pub fn initialize(&mut self, sqrt_price: U256, now: u64) -> Result<Slot0, H::Error> {
        self.atomically(|hook, pool| {
            pool.initialize(sqrt_price)?;
            hook.after_initialize(pool, now)?;
            Ok(pool.slot0()?)
        })
    }

    /// Modifies `sender`'s liquidity. Additions are subject to the hook's
    /// approval.
    pub fn modify_liquidity(
        &mut self,
        sender: Address,
        range: TickRange,
        liquidity_delta: i128,
    ) -> Result<BalanceDelta, H::Error> {
        self.atomically(|hook, pool| {
            if liquidity_delta > 0 {
                hook.before_add_liquidity(sender, range, pool)?;
            }
            Ok(pool.modify_liquidity(sender, range, liquidity_delta)?)
        })
    }

    pub fn swap(&mut self, now: u64, params: SwapParams) -> Result<SwapResult, H::Error> {
        self.atomically(|hook, pool| {
            let mut params = params;
            hook.before_swap(pool, now, &mut params)?;
            let result = pool.swap(&params)?;
            hook.after_swap(pool, now, &params, &result)?;
            Ok(result)
        })
    }

    /// Runs an operation of the hook itself with the same all-or-nothing
    /// guarantee as pool operations.
    pub fn with_hook<T>(
        &mut self,
        operation: impl FnOnce(&mut H, &mut Pool) -> Result<T, H::Error>,
    ) -> Result<T, H::Error> {
        self.atomically(operation)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::pool::TokenPair,
        number::tick_math::sqrt_price_at_tick,
    };

    #[derive(Debug, PartialEq, thiserror::Error)]
    enum TestError {
        #[error("vetoed")]
        Vetoed,
        #[error(transparent)]
        Pool(#[from] Error),
    }

    #[derive(Clone, Debug, Default)]
    struct Recorder {
        swaps: u32,
        reject_after_swap: bool,
        owner: Address,
    }

    impl Hook for Recorder {
        type Error = TestError;

        fn after_initialize(&mut self, pool: &mut Pool, _: u64) -> Result<(), TestError> {
            pool.modify_liquidity(self.owner, TickRange::new(-600, 600), 10i128.pow(20))?;
            Ok(())
        }

        fn before_add_liquidity(
            &mut self,
            sender: Address,
            _: TickRange,
            _: &Pool,
        ) -> Result<(), TestError> {
            if sender == self.owner {
                Ok(())
            } else {
                Err(TestError::Vetoed)
            }
        }

        fn after_swap(
            &mut self,
            _: &mut Pool,
            _: u64,
            _: &SwapParams,
            _: &SwapResult,
        ) -> Result<(), TestError> {
            self.swaps += 1;
            if self.reject_after_swap {
                return Err(TestError::Vetoed);
            }
            Ok(())
        }
    }

    fn hooked(reject_after_swap: bool) -> HookedPool<Recorder> {
        let tokens = TokenPair::new(Address::repeat_byte(1), Address::repeat_byte(2)).unwrap();
        let key = PoolKey {
            tokens,
            fee: 3_000,
            tick_spacing: 60,
        };
        let hook = Recorder {
            reject_after_swap,
            owner: Address::repeat_byte(0xaa),
            ..Default::default()
        };
        let mut pool = HookedPool::new(key, hook).unwrap();
        pool.initialize(sqrt_price_at_tick(0).unwrap(), 0).unwrap();
        pool
    }

    fn sell_token0() -> SwapParams {
        SwapParams {
            zero_for_one: true,
            amount_specified: 10i128.pow(18),
            sqrt_price_limit: sqrt_price_at_tick(-600).unwrap(),
        }
    }

    #[test]
    fn hook_places_liquidity_on_initialize() {
        let pool = hooked(false);
        assert_eq!(pool.pool().liquidity(), 10u128.pow(20));
    }

    #[test]
    fn vetoed_liquidity_is_not_added() {
        let mut pool = hooked(false);
        let range = TickRange::new(-60, 60);
        let stranger = Address::repeat_byte(0xbb);
        assert_eq!(
            pool.modify_liquidity(stranger, range, 1_000),
            Err(TestError::Vetoed)
        );
        assert_eq!(pool.pool().position(stranger, range), 0);
    }

    #[test]
    fn failing_after_swap_rolls_back_everything() {
        let mut pool = hooked(true);
        let before = pool.pool().slot0().unwrap();
        assert_eq!(pool.swap(1, sell_token0()), Err(TestError::Vetoed));
        assert_eq!(pool.pool().slot0().unwrap(), before);
        assert_eq!(pool.hook().swaps, 0);
        assert_eq!(pool.pool().fees(), (U256::ZERO, U256::ZERO));
    }

    #[test]
    fn successful_swap_is_recorded() {
        let mut pool = hooked(false);
        let result = pool.swap(1, sell_token0()).unwrap();
        assert!(result.slot0.tick < 0);
        assert_eq!(pool.hook().swaps, 1);
    }

    #[test]
    fn with_hook_restores_on_error() {
        let mut pool = hooked(false);
        let result: Result<(), _> = pool.with_hook(|hook, pool| {
            hook.swaps = 42;
            pool.collect_fees();
            Err(TestError::Vetoed)
        });
        assert_eq!(result, Err(TestError::Vetoed));
        assert_eq!(pool.hook().swaps, 0);
    }
}
