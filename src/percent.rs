//! Recovers integer counts from fields the sites only publish as percentages.
//!
//! Percentages are printed with at most one decimal, so the inverse is lossy.
//! Cells are read as exact hundredths of a percent and every reconstruction
//! rounds half away from zero in integer arithmetic, which is round-half-up
//! for the non-negative values this mostly sees.

use crate::error::{ExtractError, ExtractResult};

/// Glyphs the sites print for "nothing happened".
const NO_DATA: &[&str] = &["-", "–", "—"];

/// Hundredths of a percent in 100%.
const FULL: i64 = 10_000;
const MAX_DECIMALS: usize = 2;

pub fn is_no_data(cell: &str) -> bool {
    NO_DATA.contains(&cell)
}

/// Percentage in hundredths of a percent, bounded to ±100%. A no-data
/// placeholder reads as 0%.
pub fn parse_hundredths(raw: &str) -> ExtractResult<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || NO_DATA.contains(&trimmed) {
        return Ok(0);
    }
    let malformed =
        || ExtractError::structural("percentage cell", format!("not a percentage: {raw:?}"));

    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    let (negative, unsigned) = match number.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, number.strip_prefix('+').unwrap_or(number)),
    };
    let (whole, fraction) = unsigned
        .split_once([',', '.'])
        .unwrap_or((unsigned, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty())
        || !all_digits(whole)
        || !all_digits(fraction)
        || fraction.len() > MAX_DECIMALS
        || whole.len() > 3
    {
        return Err(malformed());
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| malformed())?
    };
    let mut fraction_hundredths = 0;
    for (i, digit) in fraction.bytes().enumerate() {
        fraction_hundredths += i64::from(digit - b'0') * if i == 0 { 10 } else { 1 };
    }
    let magnitude = whole * 100 + fraction_hundredths;
    if magnitude > FULL {
        return Err(ExtractError::structural(
            "percentage cell",
            format!("outside -100%..=100%: {raw:?}"),
        ));
    }
    Ok(if negative { -magnitude } else { magnitude })
}

/// Percentage as a fraction. A no-data placeholder reads as 0%.
pub fn parse_percentage(raw: &str) -> ExtractResult<f64> {
    Ok(parse_hundredths(raw)? as f64 / FULL as f64)
}

/// `round(pct × total)` without clamping; efficiency ratios can be negative.
pub fn scaled_signed(raw_pct: &str, total: u32) -> ExtractResult<i64> {
    let product = parse_hundredths(raw_pct)? * i64::from(total);
    // |product| <= 10^4 * u32::MAX, far inside i64
    let rounded = (product.abs() * 2 + FULL) / (2 * FULL);
    Ok(if product < 0 { -rounded } else { rounded })
}

/// Nearest-integer count for a share of `total`, clamped to `0..=total`.
pub fn reconstruct_count(raw_pct: &str, total: u32) -> ExtractResult<u32> {
    let scaled = scaled_signed(raw_pct, total)?;
    Ok(scaled.clamp(0, i64::from(total)) as u32)
}

/// Serves that landed without an ace or an error ("slashes"), backed out of
/// the published serve efficiency `(aces + slashes - errors) / total`.
pub fn serve_slashes(
    raw_efficiency: &str,
    total: u32,
    aces: u32,
    errors: u32,
) -> ExtractResult<u32> {
    let net = scaled_signed(raw_efficiency, total)?;
    let slashes = net
        .saturating_sub(i64::from(aces))
        .saturating_add(i64::from(errors));
    Ok(slashes.clamp(0, i64::from(total)) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_zero_for_any_total() {
        for total in [0, 1, 8, 250] {
            assert_eq!(reconstruct_count("-", total).unwrap(), 0);
        }
    }

    #[test]
    fn reception_positive_from_placeholder() {
        assert_eq!(reconstruct_count("-", 8).unwrap(), 0);
    }

    #[test]
    fn serve_slashes_worked_example() {
        assert_eq!(serve_slashes("50%", 10, 2, 1).unwrap(), 4);
    }

    #[test]
    fn rounding_is_half_up() {
        // 12.5% of 4 is exactly 0.5
        assert_eq!(reconstruct_count("12.5%", 4).unwrap(), 1);
        assert_eq!(reconstruct_count("37,5%", 4).unwrap(), 2);
        assert_eq!(reconstruct_count("33%", 3).unwrap(), 1);
    }

    #[test]
    fn counts_stay_within_total() {
        let pcts = ["0%", "0.1%", "49.9%", "50%", "66.7%", "99.9%", "100%", "-35%"];
        for total in 0..=60u32 {
            for pct in pcts {
                let n = reconstruct_count(pct, total).unwrap();
                assert!(n <= total, "{pct} of {total} gave {n}");
            }
        }
    }

    #[test]
    fn negative_efficiency_is_kept_signed() {
        assert_eq!(scaled_signed("-20%", 10).unwrap(), -2);
        assert_eq!(serve_slashes("-20%", 10, 0, 3).unwrap(), 1);
    }

    #[test]
    fn exact_halves_round_up() {
        // each of these is exactly x.5 but lands below it in binary floating point
        assert_eq!(reconstruct_count("29%", 50).unwrap(), 15);
        assert_eq!(reconstruct_count("58%", 25).unwrap(), 15);
        assert_eq!(reconstruct_count("70%", 45).unwrap(), 32);
        assert_eq!(reconstruct_count("57%", 50).unwrap(), 29);
        assert_eq!(scaled_signed("-29%", 50).unwrap(), -15);
    }

    #[test]
    fn hundredths_are_exact() {
        assert_eq!(parse_hundredths("21,4%").unwrap(), 2140);
        assert_eq!(parse_hundredths("+7.25%").unwrap(), 725);
        assert_eq!(parse_hundredths("-100%").unwrap(), -10_000);
        assert_eq!(parse_hundredths(" – ").unwrap(), 0);
        assert_eq!(parse_percentage("50,0%").unwrap(), 0.5);
    }

    #[test]
    fn out_of_range_percentages_are_structural() {
        for raw in ["1e300%", "100.01%", "-140%", "140%", "99999999999999999999%"] {
            assert!(
                matches!(parse_hundredths(raw), Err(ExtractError::Structural { .. })),
                "{raw} accepted"
            );
        }
        assert!(serve_slashes("1e300%", 10, 0, 3).is_err());
    }

    #[test]
    fn slashes_saturate_at_the_edges() {
        assert_eq!(serve_slashes("100%", u32::MAX, 0, u32::MAX).unwrap(), u32::MAX);
        assert_eq!(serve_slashes("-100%", 10, u32::MAX, 0).unwrap(), 0);
    }

    #[test]
    fn garbage_is_structural() {
        assert!(matches!(
            parse_percentage("n/a"),
            Err(ExtractError::Structural { .. })
        ));
        for raw in ["%", "12.345%", "1.2.3%", "--5%", ",%"] {
            assert!(parse_hundredths(raw).is_err(), "{raw} accepted");
        }
    }
}
