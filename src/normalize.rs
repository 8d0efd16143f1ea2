//! Price string normalization.

/// Reduce a raw price label to digits and decimal points.
///
/// `"₹1,299.00"` becomes `"1299.00"`. A period directly after a letter ends
/// an abbreviation (`"Rs. 499"`), not a number, and is dropped before
/// filtering. Trailing periods left by separator removal (`"1,999."`) are
/// dropped too; a leading one is kept, so `"$.99"` stays `".99"`. Returns
/// `None` when nothing numeric remains; that means "price unknown", never zero.
pub fn normalize_price(raw: &str) -> Option<String> {
    let mut cleaned = String::with_capacity(raw.len());
    let mut previous: Option<char> = None;
    for c in raw.chars() {
        let abbreviation_dot = c == '.' && previous.is_some_and(char::is_alphabetic);
        if c.is_ascii_digit() || (c == '.' && !abbreviation_dot) {
            cleaned.push(c);
        }
        previous = Some(c);
    }

    let trimmed = cleaned.trim_end_matches('.');
    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// Whether a raw label carries any price information at all.
pub(crate) fn looks_like_price(raw: &str) -> bool {
    raw.chars().any(|c| c.is_ascii_digit())
}
