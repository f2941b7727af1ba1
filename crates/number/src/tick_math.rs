//! Conversions between ticks and Q64.96 sqrt prices.
//!
//! A tick `t` corresponds to the price `1.0001^t` and therefore to the sqrt
//! price `sqrt(1.0001^t) * 2^96`.

use {
    crate::{Error, Result},
    alloy::primitives::U256,
};

/// The minimum tick that can be converted into a sqrt price.
pub const MIN_TICK: i32 = -887_272;
/// The maximum tick that can be converted into a sqrt price.
pub const MAX_TICK: i32 = -MIN_TICK;

/// The sqrt price at [`MIN_TICK`].
pub const MIN_SQRT_PRICE: U256 = U256::from_limbs([4_295_128_739, 0, 0, 0]);
/// The sqrt price at [`MAX_TICK`].
pub const MAX_SQRT_PRICE: U256 =
    U256::from_limbs([0x5d95_1d52_6398_8d26, 0xefd1_fc6a_5064_8849, 0xfffd_8963, 0]);

/// `2^128 / sqrt(1.0001^(2^i))` for every bit `i` of the absolute tick.
const RATIOS: [(u32, u128); 19] = [
    (0x2, 0xfff97272373d413259a46990580e213a),
    (0x4, 0xfff2e50f5f656932ef12357cf3c7fdcc),
    (0x8, 0xffe5caca7e10e4e61c3624eaa0941cd0),
    (0x10, 0xffcb9843d60f6159c9db58835c926644),
    (0x20, 0xff973b41fa98c081472e6896dfb254c0),
    (0x40, 0xff2ea16466c96a3843ec78b326b52861),
    (0x80, 0xfe5dee046a99a2a811c461f1969c3053),
    (0x100, 0xfcbe86c7900a88aedcffc83b479aa3a4),
    (0x200, 0xf987a7253ac413176f2b074cf7815e54),
    (0x400, 0xf3392b0822b70005940c7a398e4b70f3),
    (0x800, 0xe7159475a2c29b7443b29c7fa6e889d9),
    (0x1000, 0xd097f3bdfd2022b8845ad8f792aa5825),
    (0x2000, 0xa9f746462d870fdf8a65dc1f90e061e5),
    (0x4000, 0x70d869a156d2a1b890bb3df62baf32f7),
    (0x8000, 0x31be135f97d08fd981231505542fcfa6),
    (0x10000, 0x9aa508b5b7a84e1c677de54f3e99bc9),
    (0x20000, 0x5d6af8dedb81196699c329225ee604),
    (0x40000, 0x2216e584f5fa1ea926041bedfe98),
    (0x80000, 0x48a170391f7dc42444e8fa2),
];

/// Returns the sqrt price at the given tick, rounded up.
pub fn sqrt_price_at_tick(tick: i32) -> Result<U256> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(Error::TickOutOfBounds(tick));
    }
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(0xfffcb933bd6fad37aa2d162d1a594001u128)
    } else {
        U256::from(1u64) << 128usize
    };
    for (bit, factor) in RATIOS {
        if abs_tick & bit != 0 {
            // Both factors are below 2^129 so the product fits.
            ratio = (ratio * U256::from(factor)) >> 128usize;
        }
    }
    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 to Q64.96, rounding up so that the price never undershoots the
    // tick it was derived from.
    let shifted = ratio >> 32usize;
    if (ratio & U256::from(u32::MAX)).is_zero() {
        Ok(shifted)
    } else {
        Ok(shifted + U256::from(1u64))
    }
}

/// Returns the greatest tick whose sqrt price is less than or equal to
/// `sqrt_price`.
pub fn tick_at_sqrt_price(sqrt_price: U256) -> Result<i32> {
    if sqrt_price < MIN_SQRT_PRICE || sqrt_price >= MAX_SQRT_PRICE {
        return Err(Error::SqrtPriceOutOfBounds(sqrt_price));
    }
    let (mut low, mut high) = (MIN_TICK, MAX_TICK);
    while low < high {
        let mid = low + (high - low + 1) / 2;
        if sqrt_price_at_tick(mid)? <= sqrt_price {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    Ok(low)
}

/// Rounds a tick down to the closest multiple of `spacing`.
pub fn floor_to_spacing(tick: i32, spacing: i32) -> i32 {
    tick.div_euclid(spacing) * spacing
}

/// Rounds a tick up to the closest multiple of `spacing`.
pub fn ceil_to_spacing(tick: i32, spacing: i32) -> i32 {
    let floor = floor_to_spacing(tick, spacing);
    if floor == tick { floor } else { floor + spacing }
}

/// The smallest tick aligned to `spacing` that is still a valid tick.
pub fn min_usable_tick(spacing: i32) -> i32 {
    ceil_to_spacing(MIN_TICK, spacing)
}

/// The largest tick aligned to `spacing` that is still a valid tick.
pub fn max_usable_tick(spacing: i32) -> i32 {
    floor_to_spacing(MAX_TICK, spacing)
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn bounds() {
        assert_eq!(sqrt_price_at_tick(MIN_TICK).unwrap(), MIN_SQRT_PRICE);
        assert_eq!(sqrt_price_at_tick(MAX_TICK).unwrap(), MAX_SQRT_PRICE);
        assert_eq!(
            sqrt_price_at_tick(MIN_TICK - 1),
            Err(Error::TickOutOfBounds(MIN_TICK - 1))
        );
        assert_eq!(
            sqrt_price_at_tick(MAX_TICK + 1),
            Err(Error::TickOutOfBounds(MAX_TICK + 1))
        );
    }

    #[rstest]
    #[case(0, "79228162514264337593543950336")]
    #[case(1, "79232123823359799118286999568")]
    #[case(-1, "79224201403219477170569942574")]
    fn known_sqrt_prices(#[case] tick: i32, #[case] expected: &str) {
        assert_eq!(
            sqrt_price_at_tick(tick).unwrap(),
            expected.parse::<U256>().unwrap()
        );
    }

    #[rstest]
    #[case(-887_272)]
    #[case(-200_000)]
    #[case(-60)]
    #[case(0)]
    #[case(17)]
    #[case(92_108)]
    #[case(887_271)]
    fn tick_round_trip(#[case] tick: i32) {
        let sqrt_price = sqrt_price_at_tick(tick).unwrap();
        assert_eq!(tick_at_sqrt_price(sqrt_price).unwrap(), tick);
        // Just below the tick's price belongs to the previous tick.
        if tick > MIN_TICK {
            assert_eq!(
                tick_at_sqrt_price(sqrt_price - U256::from(1u64)).unwrap(),
                tick - 1
            );
        }
    }

    #[test]
    fn matches_floating_point_approximation() {
        for tick in [-500_000, -12_345, -1, 2, 9_999, 400_000] {
            let sqrt_price: f64 = sqrt_price_at_tick(tick).unwrap().to_string().parse().unwrap();
            let expected = 1.0001f64.powf(tick as f64 / 2.) * 2f64.powi(96);
            assert!(((sqrt_price - expected) / expected).abs() < 1e-9, "{tick}");
        }
    }

    #[test]
    fn sqrt_price_out_of_bounds() {
        assert!(tick_at_sqrt_price(MIN_SQRT_PRICE - U256::from(1u64)).is_err());
        assert!(tick_at_sqrt_price(MAX_SQRT_PRICE).is_err());
        assert_eq!(
            tick_at_sqrt_price(MAX_SQRT_PRICE - U256::from(1u64)).unwrap(),
            MAX_TICK - 1
        );
    }

    #[rstest]
    #[case(7, 5, 5, 10)]
    #[case(-7, 5, -10, -5)]
    #[case(10, 5, 10, 10)]
    #[case(-10, 5, -10, -10)]
    fn spacing_alignment(
        #[case] tick: i32,
        #[case] spacing: i32,
        #[case] floor: i32,
        #[case] ceil: i32,
    ) {
        assert_eq!(floor_to_spacing(tick, spacing), floor);
        assert_eq!(ceil_to_spacing(tick, spacing), ceil);
    }

    #[test]
    fn usable_ticks() {
        assert_eq!(min_usable_tick(60), -887_220);
        assert_eq!(max_usable_tick(60), 887_220);
    }
}
