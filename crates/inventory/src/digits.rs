//! Digits-only projection of inventory codes.

/// Strip every character that is not an ASCII digit (`0-9`).
///
/// Returns `None` when no digit remains. Classification is fixed to ASCII, so
/// the result never depends on locale or on Unicode numeral scripts.
pub fn project_digits(code: &str) -> Option<String> {
    let digits: String = code.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() { None } else { Some(digits) }
}
