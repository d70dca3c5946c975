//! String constants helpers.

/// Strings longer than this are replaced by their hash in fact identifiers.
pub const MAX_STRING_CONSTANT_LEN: usize = 256;

/// Computes the hash of a string the way `java.lang.String::hashCode` does,
/// over UTF-16 code units with wrapping 32 bits arithmetic.
#[must_use]
pub fn java_hash_code(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Returns the raw form of a string constant.
///
/// Empty strings and strings with leading or trailing whitespace are wrapped
/// in `<<"` and `">>` so that they survive column trimming downstream.
#[must_use]
pub fn encode_string_constant(constant: &str) -> String {
    if !constant.is_empty() && constant.trim() == constant {
        constant.to_string()
    } else {
        format!("<<\"{constant}\">>")
    }
}

/// Returns the identifier of a string constant: its raw form, or a hash
/// placeholder when the raw form is too long.
#[must_use]
pub fn string_constant_id(raw: &str) -> String {
    if raw.encode_utf16().count() <= MAX_STRING_CONSTANT_LEN {
        raw.to_string()
    } else {
        format!("<<HASH:{}>>", java_hash_code(raw))
    }
}
