use ffmpeg_next::Rational;

/// Rescales `ts` from `from` ticks to `to` ticks, rounding to the nearest
/// tick with halves away from zero (the av_rescale_q default). Exact: all
/// intermediate products are 128-bit.
pub fn rescale(ts: i64, from: Rational, to: Rational) -> i64 {
    let num = ts as i128 * from.numerator() as i128 * to.denominator() as i128;
    let den = from.denominator() as i128 * to.numerator() as i128;
    div_round_nearest(num, den) as i64
}

fn div_round_nearest(num: i128, den: i128) -> i128 {
    let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
    if num >= 0 {
        (num + den / 2) / den
    } else {
        -((-num + den / 2) / den)
    }
}

#[cfg(test)]
#[path = "timestamp_test.rs"]
mod timestamp_test;
