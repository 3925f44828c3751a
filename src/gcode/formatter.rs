/// Decimal places used when rendering rewritten words.
///
/// X and Y carry the corrected geometry and get their own precision; every
/// other numeric word (Z, E, F, I, J, ...) uses `other_decimals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    pub xy_decimals: u32,
    pub other_decimals: u32,
}

impl Default for Precision {
    fn default() -> Self {
        Precision {
            xy_decimals: 3,
            other_decimals: 5,
        }
    }
}

impl Precision {
    /// Decimal places for a word with the given letter.
    pub fn decimals_for(&self, letter: char) -> u32 {
        match letter.to_ascii_uppercase() {
            'X' | 'Y' => self.xy_decimals,
            _ => self.other_decimals,
        }
    }
}

/// Formats a numeric word value for G-code output.
///
/// * `decimal_places`: number of digits after the decimal point.
/// * Trailing zeros in the fractional part are removed, and the decimal point
///   itself when no fractional digits remain.
/// * A value that rounds to zero renders as `0`, never `-0`.
pub fn format_number(value: f64, decimal_places: u32) -> String {
    let mut s = format!("{:.prec$}", value, prec = decimal_places as usize);

    if s.contains('.') {
        s = s.trim_end_matches('0').trim_end_matches('.').to_string();
    }

    if s == "-0" {
        s = "0".to_string();
    }

    s
}

/// Formats `value` for the word `letter` using the matching precision.
pub fn format_word_value(letter: char, value: f64, precision: &Precision) -> String {
    format_number(value, precision.decimals_for(letter))
}

/// Rounds `value` to `decimal_places` the same way [`format_number`] prints it.
pub fn round_to(value: f64, decimal_places: u32) -> f64 {
    format!("{:.prec$}", value, prec = decimal_places as usize)
        .parse()
        .unwrap_or(value)
}
