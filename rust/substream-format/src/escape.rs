//! Escaping of arbitrary names into storage-location-safe identifiers.
//!
//! The output of [`escape_for_file_name`] is part of the persisted layout:
//! stream names are derived from it, so the mapping must never change.

/// Escapes a name for use as a storage-location identifier.
///
/// ASCII alphanumerics and `_` are kept as is; any other byte is written as
/// `%XX` with two uppercase hex digits.
pub fn escape_for_file_name(name: &str) -> String {
    let mut res = String::with_capacity(name.len());
    for &b in name.as_bytes() {
        if is_word_char(b) {
            res.push(b as char);
        } else {
            res.push('%');
            res.push(hex_digit_upper(b >> 4));
            res.push(hex_digit_upper(b & 0x0F));
        }
    }
    res
}

/// Reverses [`escape_for_file_name`].
///
/// A `%` that is not followed by two hex digits is copied literally.
pub fn unescape_for_file_name(name: &str) -> String {
    let bytes = name.as_bytes();
    let mut res = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        let b = bytes[pos];
        if b == b'%' && pos + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[pos + 1]), hex_value(bytes[pos + 2])) {
                res.push((hi << 4) | lo);
                pos += 3;
                continue;
            }
        }
        res.push(b);
        pos += 1;
    }
    String::from_utf8_lossy(&res).into_owned()
}

#[inline]
fn is_word_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[inline]
fn hex_digit_upper(nibble: u8) -> char {
    b"0123456789ABCDEF"[nibble as usize] as char
}

#[inline]
fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{escape_for_file_name, unescape_for_file_name};

    #[test]
    fn test_escape_keeps_word_chars() {
        assert_eq!(escape_for_file_name("abc_XYZ_019"), "abc_XYZ_019");
    }

    #[test]
    fn test_escape_special_chars() {
        assert_eq!(escape_for_file_name("."), "%2E");
        assert_eq!(escape_for_file_name("a.b"), "a%2Eb");
        assert_eq!(escape_for_file_name("x y/z"), "x%20y%2Fz");
        assert_eq!(escape_for_file_name("%"), "%25");
        // Multi-byte characters are escaped byte by byte.
        assert_eq!(escape_for_file_name("é"), "%C3%A9");
    }

    #[test]
    fn test_unescape() {
        for name in ["a.b", "x y/z", "%", "é", "plain", ""] {
            assert_eq!(unescape_for_file_name(&escape_for_file_name(name)), name);
        }
        assert_eq!(unescape_for_file_name("a%2e"), "a.");
        assert_eq!(unescape_for_file_name("bad%zz"), "bad%zz");
        assert_eq!(unescape_for_file_name("end%2"), "end%2");
    }
}
