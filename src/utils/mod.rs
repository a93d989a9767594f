//! Utility functions for formatting numbers in reports
//!
//! Report cells use English conventions: `,` for thousands and `.` for the
//! decimal point, always with two decimals.

use rust_decimal::Decimal;

/// Core formatting function with full control over output.
///
/// # Arguments
/// * `value` - The decimal value to format
/// * `width` - Minimum width for padding (0 for no padding, right-aligned)
///
/// # Examples
/// ```
/// use ledger_holdings::utils::format_number_with_width;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_number_with_width(dec!(1234.56), 0), "1,234.56");
/// assert_eq!(format_number_with_width(dec!(1234), 12), "    1,234.00");
/// ```
pub fn format_number_with_width(value: Decimal, width: usize) -> String {
    let rounded = value.round_dp(2);
    let is_negative = rounded < Decimal::ZERO;

    let formatted = format!("{:.2}", rounded.abs());
    let (integer_part, decimal_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    // Add thousands separators (,) to integer part
    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    let result = format!("{}{}.{}", sign, with_separators, decimal_part);

    if width > 0 && result.len() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

/// Format a number with thousands separators: "1,234.56"
///
/// # Examples
/// ```
/// use ledger_holdings::utils::format_number;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_number(dec!(-500)), "-500.00");
/// ```
pub fn format_number(value: Decimal) -> String {
    format_number_with_width(value, 0)
}

/// Format a fraction as a percentage: 0.1234 -> "12.34%"
pub fn format_percent(fraction: Decimal) -> String {
    format!("{}%", format_number(fraction * Decimal::ONE_HUNDRED))
}

/// Absent values render as empty cells.
pub fn format_optional(value: Option<Decimal>, format: fn(Decimal) -> String) -> String {
    value.map(format).unwrap_or_default()
}
