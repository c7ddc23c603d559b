//! Code-load input parsing.
//!
//! The load field is free text holding whitespace-separated two-digit hex
//! byte pairs ("A9 00 8D ..."). Tokens that are not exactly two hex digits
//! fall out of the match silently: malformed input is never reported, it
//! just loads fewer bytes. Empty input is a valid zero-length load.

/// Parse a free-text hex field into the byte sequence it denotes.
pub fn parse_bytes(input: &str) -> Vec<u8> {
    input
        .split_whitespace()
        .filter_map(|token| {
            let byte = if token.len() == 2 && token.bytes().all(|b| b.is_ascii_hexdigit()) {
                u8::from_str_radix(token, 16).ok()
            } else {
                None
            };
            if byte.is_none() {
                log::trace!("skipping malformed code token {:?}", token);
            }
            byte
        })
        .collect()
}
