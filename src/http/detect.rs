/// Header fragment whose presence keeps the connection open.
const KEEP_ALIVE_TOKEN: &[u8] = b"Connection: Keep-Alive";

/// Scans a raw request chunk for a keep-alive hint.
///
/// Matches any newline immediately followed by the token, compared
/// case-insensitively and only up to the token's length. This is a loose
/// heuristic rather than a header parser: the token counts wherever it
/// appears in the chunk, and anything may follow it. A token split across
/// two read chunks is not matched.
pub fn wants_keep_alive(buf: &[u8]) -> bool {
    buf.windows(KEEP_ALIVE_TOKEN.len() + 1)
        .any(|w| w[0] == b'\n' && w[1..].eq_ignore_ascii_case(KEEP_ALIVE_TOKEN))
}
