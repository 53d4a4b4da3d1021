// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Collection of methods for statistical analysis of the samplers.
//!
//! These are consumers of the core, not part of it: they draw large
//! samples, tabulate where the values land and report chi-squared
//! p-values so a skewed distribution shows up as a failed suite line
//! rather than needing an eyeball on a histogram.

use crate::sampling::{self, MANTISSA_BITS, MANTISSA_MASK};
use crate::source::RandomSource;
use crate::utils;
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Exponent bands tracked by the unit interval census,
/// [0.5, 1) down to [2^-52, 2^-51).
pub const CENSUS_BANDS: usize = MANTISSA_BITS as usize;

/// Bands included individually in the band frequency statistic.
/// Deeper bands hold too few draws for a chi-squared cell and are
/// lumped into one remainder cell.
const FREQ_BANDS: usize = 10;

/// Get p value for given degrees of freedom and chi squared value.
fn chi_squared_p_value(df: u64, chi_squared: f64) -> f64 {
    let chi_squared_dist = ChiSquared::new(df as f64).unwrap();
    chi_squared_dist.cdf(chi_squared)
}

/// Chi-squared statistic and upper-tail p for observed counts against
/// per-cell expectations.
fn chi_squared_test(counts: &[u64], expected: &[f64]) -> (f64, f64) {
    let mut chi_squared: f64 = 0.0;
    for (&value, &exp) in counts.iter().zip(expected.iter()) {
        chi_squared += (value as f64 - exp).powi(2) / exp;
    }
    let p = 1.0 - chi_squared_p_value(counts.len() as u64 - 1, chi_squared);
    (chi_squared, p)
}

/// Tabulate `uniform_below(bound)` outcomes.
///     -> consumes at least 'sample_size' blocks.
/// Returns chi2 statistic, p value.
pub fn bounded_draw_test(
    source: &mut impl RandomSource,
    bound: u64,
    sample_size: usize,
) -> (f64, f64) {
    let mut counts = vec![0u64; bound as usize];
    for _ in 0..sample_size {
        let v = sampling::uniform_below(source, bound);
        assert!(v < bound, "draw {} escaped bound {}", v, bound);
        counts[v as usize] += 1;
    }
    let expected = vec![sample_size as f64 / bound as f64; bound as usize];
    chi_squared_test(&counts, &expected)
}

/// Bucket `uniform_double(from, to)` outputs by grid index.
/// Every output must land on the representable grid, the buckets must
/// fill evenly, and the inclusive top bucket is counted like any other.
/// Returns chi2 statistic, p value.
pub fn range_bucket_test(
    source: &mut impl RandomSource,
    from: f64,
    to: f64,
    sample_size: usize,
) -> (f64, f64) {
    let buckets = sampling::count_between(from, to) + 1;
    let step = to - to.next_down();
    let mut counts = vec![0u64; buckets as usize];
    for _ in 0..sample_size {
        let r = sampling::uniform_double(source, from, to);
        assert!(r >= from && r <= to, "draw {} escaped [{}, {}]", r, from, to);
        let idx = (r - from) / step;
        assert!(idx.fract() == 0.0, "draw {} off the grid", r);
        counts[idx as usize] += 1;
    }
    let expected = vec![sample_size as f64 / buckets as f64; buckets as usize];
    chi_squared_test(&counts, &expected)
}

/// The textbook-but-wrong scaling construction, kept as a reference
/// point: bucketed the same way as `range_bucket_test` it reliably
/// produces a vanishing p value on integer-precision ranges.
/// Returns chi2 statistic, p value.
pub fn naive_scaling_test(
    source: &mut impl RandomSource,
    buckets: usize,
    sample_size: usize,
) -> (f64, f64) {
    let from = (1u64 << MANTISSA_BITS) as f64;
    let to = from + (buckets - 1) as f64;
    let mut counts = vec![0u64; buckets];
    for _ in 0..sample_size {
        let r = (to - from) * sampling::uniform_unit(source) + from;
        counts[(r - from) as usize] += 1;
    }
    let expected = vec![sample_size as f64 / buckets as f64; buckets];
    chi_squared_test(&counts, &expected)
}

/// Per-binade bookkeeping for `uniform_unit` outputs: how often each
/// exponent band was hit, which mantissa bits ever varied in it and
/// the extreme values observed.
pub struct UnitCensus {
    pub sample_size: usize,
    pub zero_draws: u64,
    pub band_counts: [u64; CENSUS_BANDS],
    pub bits_seen: [u64; CENSUS_BANDS],
    pub band_min: [f64; CENSUS_BANDS],
    pub band_max: [f64; CENSUS_BANDS],
}

impl UnitCensus {
    /// Mantissa bits allowed to vary in band `o` (0-indexed): the low
    /// `o` bits are consumed by mantissa realignment and stay clear.
    fn expected_bits(band: usize) -> u64 {
        MANTISSA_MASK ^ ((1 << band) - 1)
    }

    /// First band where a mantissa bit outside the predicted set was
    /// observed. Any hit is a correctness bug, not a statistical blip.
    pub fn stray_bits(&self) -> Option<usize> {
        (0..CENSUS_BANDS).find(|&o| self.bits_seen[o] & !Self::expected_bits(o) != 0)
    }

    /// First band with at least `min_samples` draws where some
    /// predicted mantissa bit never varied.
    pub fn unused_bits(&self, min_samples: u64) -> Option<usize> {
        (0..CENSUS_BANDS).find(|&o| {
            self.band_counts[o] >= min_samples && self.bits_seen[o] != Self::expected_bits(o)
        })
    }

    /// Chi-squared over band occupancy against the geometric weights
    /// 2^-1, 2^-2, ... with everything below band `FREQ_BANDS` (and
    /// the zero draws) lumped into a remainder cell.
    /// Returns chi2 statistic, p value.
    pub fn band_frequency_test(&self) -> (f64, f64) {
        let mut counts = [0u64; FREQ_BANDS + 1];
        let mut expected = [0.0f64; FREQ_BANDS + 1];
        let mut tail = self.zero_draws;
        for o in 0..CENSUS_BANDS {
            if o < FREQ_BANDS {
                counts[o] = self.band_counts[o];
                expected[o] = self.sample_size as f64 / (1u64 << (o + 1)) as f64;
            } else {
                tail += self.band_counts[o];
            }
        }
        counts[FREQ_BANDS] = tail;
        expected[FREQ_BANDS] = self.sample_size as f64 / (1u64 << FREQ_BANDS) as f64;
        chi_squared_test(&counts, &expected)
    }
}

/// Draw `uniform_unit` 'sample_size' times and record the per-binade
/// census. Traps immediately on any value outside [0, 1) or outside
/// its band.
pub fn unit_interval_census(source: &mut impl RandomSource, sample_size: usize) -> UnitCensus {
    let mut census = UnitCensus {
        sample_size,
        zero_draws: 0,
        band_counts: [0; CENSUS_BANDS],
        bits_seen: [0; CENSUS_BANDS],
        band_min: [2.0; CENSUS_BANDS],
        band_max: [-1.0; CENSUS_BANDS],
    };
    for _ in 0..sample_size {
        let r = sampling::uniform_unit(source);
        assert!((0.0..1.0).contains(&r), "draw {} escaped [0, 1)", r);
        if r == 0.0 {
            census.zero_draws += 1;
            continue;
        }
        let (exp, mantissa) = utils::split_fields(r);
        // Band o covers [2^-(o+1), 2^-o), biased exponent 1022 - o.
        let o = (1022 - exp) as usize;
        assert!(o < CENSUS_BANDS, "draw {} below the band range", r);
        census.band_counts[o] += 1;
        census.bits_seen[o] |= mantissa;
        if r < census.band_min[o] {
            census.band_min[o] = r;
        }
        if r > census.band_max[o] {
            census.band_max[o] = r;
        }
    }
    census
}
