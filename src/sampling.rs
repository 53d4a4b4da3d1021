// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Methods to turn raw random bits into exactly uniform values.
//!
//! The floating point samplers never pick a representable value with
//! higher probability than any other in the requested range. Scaling
//! tricks like `(to - from) * unit + from` cannot guarantee that, so
//! everything here works on the integer grid of representable doubles
//! and only converts to f64 once the grid point is chosen.

use crate::source::RandomSource;

/// Mantissa width of an IEEE-754 binary64.
pub const MANTISSA_BITS: u32 = 52;
/// Low 52 bits.
pub const MANTISSA_MASK: u64 = (1 << MANTISSA_BITS) - 1;
/// Exponent bias of binary64.
pub const EXP_BIAS: u64 = 1023;
/// Number of representable doubles in [0, 1).
pub const UNIT_RANGE_COUNT: u64 = 1 << 53;

/// Draw `width` unbiased random bits, 1 to 64.
/// All bits above `width` are zero.
pub fn bits(source: &mut impl RandomSource, width: u32) -> u64 {
    assert!((1..=64).contains(&width), "bit width {} out of range", width);
    let block = source.next();
    // Shifting a u64 by 64 is undefined, return the full block as is.
    if width == 64 {
        block
    } else {
        block & ((1 << width) - 1)
    }
}

/// Generate an integer uniformly distributed in [0, bound).
/// Bounds below 2 leave nothing to choose, 0 is returned without
/// consuming entropy.
///
/// Rejection sampling keeps the result free of modulo bias: draws in
/// [0, 2^64 mod bound) are thrown away so that the surviving interval
/// has a length that is an exact multiple of `bound`. Each draw is
/// accepted with p > 0.5, so the loop is theoretically unbounded but
/// short in practice.
pub fn uniform_below(source: &mut impl RandomSource, bound: u64) -> u64 {
    if bound < 2 {
        return 0;
    }
    // 2^64 mod bound == (2^64 - bound) mod bound, computed in
    // wraparound arithmetic since 2^64 itself does not fit.
    let min = bound.wrapping_neg() % bound;
    loop {
        let r = source.next();
        if r >= min {
            return r % bound;
        }
    }
}

/// Count the representable doubles in the half-open range [from, to).
/// Only non-negative ranges are supported.
///
/// The count is (to - from) / step where step is the ULP just below
/// `to`. That division is only meaningful while the step is constant
/// over the whole range, which holds within a single binade and for
/// ranges like [0, 2^k) whose finer low bands still divide out
/// exactly. Any range that breaks the assumption produces a fractional
/// count and trips the conversion assert instead of returning a
/// silently wrong answer.
pub fn count_between(from: f64, to: f64) -> u64 {
    assert!(
        from >= 0.0 && to > 0.0 && from < to,
        "invalid range [{}, {})",
        from,
        to
    );
    // Largest representable double below `to`.
    let nxt = to.next_down();
    let step = to - nxt;
    let count = (to - from) / step;
    let r = count as u64;
    assert!(
        r as f64 == count,
        "range [{}, {}) has no constant step",
        from,
        to
    );
    r
}

/// Generate a double uniformly distributed over the representable
/// values in [from, to], for positive ranges.
///
/// Every representable value in the range is picked with equal
/// probability by drawing its index on the grid. The top end is
/// deliberately inclusive: adjacent ranges chain so that the highest
/// value of one is the lowest of the next.
pub fn uniform_double(source: &mut impl RandomSource, from: f64, to: f64) -> f64 {
    let count = count_between(from, to);
    // Indexing beyond 2^53 would not survive the trip through f64.
    assert!(count <= UNIT_RANGE_COUNT, "range too wide to index");
    let step = to - to.next_down();
    let k = uniform_below(source, count + 1);
    // k <= 2^53 so the conversion and the multiply are both exact.
    from + k as f64 * step
}

/// Generate a double uniformly distributed over the representable
/// values in [0, 1), consuming exactly 53 bits of entropy.
///
/// A uniform draw must land in [2^-e, 2^-(e-1)) with probability 2^-e.
/// The position of the lowest set bit in a block of fair coin flips is
/// geometrically distributed with exactly those weights, so it selects
/// the exponent; once that bit is removed the remaining bits are still
/// independent and fill the mantissa. Every operation is exact bit
/// placement, no rounding happens anywhere.
pub fn uniform_unit(source: &mut impl RandomSource) -> f64 {
    let r = bits(source, 53);
    if r == 0 {
        // All 53 coins came up tails: probability 2^-53, same mass as
        // every other representable outcome.
        return 0.0;
    }
    let e = r.trailing_zeros() + 1;
    if e > MANTISSA_BITS {
        // Only the 53rd bit set. It was spent selecting the exponent
        // and carries no mantissa information, round to zero.
        return 0.0;
    }
    // Clear the locating bit (it is implied by the exponent) and
    // realign the remaining 52 bits as the mantissa.
    let m = (r ^ (1 << (e - 1))) >> 1;
    // (2^52 + m) * 2^(-52-e), assembled directly from the fields.
    f64::from_bits((EXP_BIAS - e as u64) << MANTISSA_BITS | m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{testgens, ScriptedSource, SeededSource};
    use crate::utils;

    #[test]
    fn bits_masks_to_width() {
        let mut ones = testgens::AllOnes {};
        assert_eq!(bits(&mut ones, 1), 1);
        assert_eq!(bits(&mut ones, 5), 0x1f);
        assert_eq!(bits(&mut ones, 53), (1 << 53) - 1);
        assert_eq!(bits(&mut ones, 64), u64::MAX);
    }

    #[test]
    #[should_panic]
    fn bits_rejects_zero_width() {
        let mut ones = testgens::AllOnes {};
        bits(&mut ones, 0);
    }

    #[test]
    #[should_panic]
    fn bits_rejects_overwide() {
        let mut ones = testgens::AllOnes {};
        bits(&mut ones, 65);
    }

    #[test]
    fn count_anchors() {
        // 2^52 values in [0.5, 1) plus as many again across all the
        // finer bands below.
        assert_eq!(count_between(0.0, 1.0), 1 << 53);
        // Integer precision band: step is exactly 1.
        let base = (1u64 << 52) as f64;
        assert_eq!(count_between(base, base + 3.0), 3);
        // Step grows with the binade: 8 apart at 2^55.
        let base = (1u64 << 55) as f64;
        assert_eq!(count_between(base, base + 25.0), 3);
    }

    #[test]
    #[should_panic]
    fn count_rejects_reversed_range() {
        count_between(2.0, 1.0);
    }

    #[test]
    #[should_panic]
    fn count_rejects_negative_from() {
        count_between(-1.0, 1.0);
    }

    #[test]
    #[should_panic]
    fn count_rejects_empty_range() {
        count_between(1.0, 1.0);
    }

    #[test]
    #[should_panic]
    fn count_rejects_non_constant_step() {
        // Crosses from the [1,2) binade into [2,4) with an offset that
        // is not a multiple of the coarser step.
        count_between(1.0 + f64::EPSILON, 2.0 + 2.0 * f64::EPSILON);
    }

    #[test]
    fn uniform_below_degenerate_bounds_draw_nothing() {
        let mut src = ScriptedSource::new(&[]);
        assert_eq!(uniform_below(&mut src, 0), 0);
        assert_eq!(uniform_below(&mut src, 1), 0);
        assert_eq!(src.consumed(), 0);
    }

    #[test]
    fn uniform_below_rejects_biased_low_draws() {
        // 2^64 mod 3 == 1, so the single value 0 must be rejected.
        let mut src = ScriptedSource::new(&[0, 5]);
        assert_eq!(uniform_below(&mut src, 3), 2);
        assert_eq!(src.consumed(), 2);
    }

    #[test]
    fn uniform_below_stays_in_bound() {
        let mut src = SeededSource::new(0xfa15);
        let mut counts = [0u32; 5];
        for _ in 0..50_000 {
            let v = uniform_below(&mut src, 5);
            assert!(v < 5);
            counts[v as usize] += 1;
        }
        // 10_000 expected per cell, sigma is about 90.
        for &c in &counts {
            assert!((9_500..=10_500).contains(&c), "skewed cell: {}", c);
        }
    }

    #[test]
    fn uniform_double_lands_on_grid() {
        let from = (1u64 << 52) as f64;
        let to = from + 3.0;
        let mut src = SeededSource::new(0xd0b1e);
        let mut seen = [false; 4];
        for _ in 0..1_000 {
            let r = uniform_double(&mut src, from, to);
            assert!(r >= from && r <= to);
            let idx = r - from;
            assert_eq!(idx.fract(), 0.0);
            seen[idx as usize] = true;
        }
        // Inclusive top: all four grid points reachable.
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn uniform_double_unit_range_matches_grid() {
        let mut src = SeededSource::new(0x0123);
        for _ in 0..1_000 {
            let r = uniform_double(&mut src, 0.0, 1.0);
            assert!((0.0..=1.0).contains(&r));
            // Step in [0, 1] is 2^-53; every result is a multiple.
            let scaled = r * UNIT_RANGE_COUNT as f64;
            assert_eq!(scaled.fract(), 0.0);
        }
    }

    #[test]
    fn unit_zero_draw_flushes_to_zero() {
        let mut zeros = testgens::AllZeros {};
        assert_eq!(uniform_unit(&mut zeros), 0.0);
        // Only bit 53 set: exponent coin with no mantissa left.
        let mut src = ScriptedSource::new(&[1 << 52]);
        assert_eq!(uniform_unit(&mut src), 0.0);
    }

    #[test]
    fn unit_assembles_exact_bit_patterns() {
        // Lowest bit set, nothing else: top of the exponent ladder.
        let mut src = ScriptedSource::new(&[1, 2, 3]);
        assert_eq!(uniform_unit(&mut src), 0.5);
        assert_eq!(uniform_unit(&mut src), 0.25);
        // Locating bit cleared, remaining bit becomes mantissa lsb.
        assert_eq!(uniform_unit(&mut src), 0.5 + f64::EPSILON / 2.0);
    }

    #[test]
    fn unit_respects_binade_structure() {
        let mut src = SeededSource::new(0xbead);
        let mut top_binade = 0u32;
        const DRAWS: u32 = 40_000;
        for _ in 0..DRAWS {
            let r = uniform_unit(&mut src);
            assert!((0.0..1.0).contains(&r));
            if r == 0.0 {
                continue;
            }
            let (exp, mantissa) = utils::split_fields(r);
            // Bands run from [0.5, 1) down to [2^-52, 2^-51).
            assert!((EXP_BIAS - 52..=EXP_BIAS - 1).contains(&exp));
            let e = (EXP_BIAS - exp) as u32;
            // The low e-1 mantissa bits are consumed by alignment and
            // can never be set.
            assert_eq!(mantissa & ((1 << (e - 1)) - 1), 0);
            if r >= 0.5 {
                top_binade += 1;
            }
        }
        // Half the mass sits in [0.5, 1); sigma is about 100 draws.
        let expected = DRAWS / 2;
        assert!(top_binade.abs_diff(expected) < 1_000);
    }

    #[test]
    fn samplers_are_pure_in_the_bit_sequence() {
        let mut a = SeededSource::new(42);
        let mut b = SeededSource::new(42);
        for _ in 0..256 {
            assert_eq!(uniform_unit(&mut a).to_bits(), uniform_unit(&mut b).to_bits());
        }
        a.reseed(9);
        b.reseed(9);
        for _ in 0..256 {
            assert_eq!(
                uniform_double(&mut a, 0.25, 0.5).to_bits(),
                uniform_double(&mut b, 0.25, 0.5).to_bits()
            );
            assert_eq!(uniform_below(&mut a, 97), uniform_below(&mut b, 97));
        }
    }
}
