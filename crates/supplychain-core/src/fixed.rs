use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Used for derived averages (cycle times, mean demand) so that repeated runs
/// with the same seed report bit-identical figures.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert Fixed64 to f64. Use only for display, never in the sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Mean of a set of signed tick differences, or `None` when there is no data.
///
/// A mean outside the `Fixed64` range saturates to `Fixed64::MIN`/`MAX`.
pub fn mean_ticks(values: &[i64]) -> Option<Fixed64> {
    if values.is_empty() {
        return None;
    }
    let sum: i128 = values.iter().map(|&v| v as i128).sum();
    Some(mean_of_sum(sum, values.len()))
}

/// Mean of unsigned quantities, or `None` when there is no data.
pub fn mean_u32(values: &[u32]) -> Option<Fixed64> {
    if values.is_empty() {
        return None;
    }
    let sum: i128 = values.iter().map(|&v| v as i128).sum();
    Some(mean_of_sum(sum, values.len()))
}

/// `sum / len` as Fixed64 bits, truncated toward zero.
fn mean_of_sum(sum: i128, len: usize) -> Fixed64 {
    let len = len as i128;
    let (quot, rem) = (sum / len, sum % len);
    // |quot| < 2^64 and |rem| < len, so neither shift leaves i128.
    let bits = (quot << Fixed64::FRAC_NBITS) + (rem << Fixed64::FRAC_NBITS) / len;
    match i64::try_from(bits) {
        Ok(bits) => Fixed64::from_bits(bits),
        Err(_) if sum < 0 => Fixed64::MIN,
        Err(_) => Fixed64::MAX,
    }
}
