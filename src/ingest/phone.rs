//! Phone number canonicalization.
//!
//! Two call-sites need two different shapes: the directed messaging API
//! takes bare digits in its `to` field, the relay webhook takes a
//! `+`-prefixed E.164 `recipient`. These are deliberately two functions,
//! not one with a flag — collapsing them has silently broken one channel
//! before.

/// Country-code prefixes the upstream lists accept as already dialable.
const KNOWN_COUNTRY_PREFIXES: &[&str] = &["1", "61", "27"];

/// Bare-digit dialable form for the messaging API `to` field.
///
/// Strips everything but digits. Input without a `+` and without a known
/// country prefix is assumed North American and gets a leading `1`.
/// Empty input stays empty.
pub fn dialable(raw: &str) -> String {
    let had_plus = raw.trim_start().starts_with('+');
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return digits;
    }
    if had_plus
        || KNOWN_COUNTRY_PREFIXES
            .iter()
            .any(|prefix| digits.starts_with(prefix))
    {
        digits
    } else {
        format!("1{digits}")
    }
}

/// `+`-prefixed E.164 form for the relay webhook `recipient` field.
pub fn e164(raw: &str) -> String {
    let digits = dialable(raw);
    if digits.is_empty() {
        digits
    } else {
        format!("+{digits}")
    }
}
