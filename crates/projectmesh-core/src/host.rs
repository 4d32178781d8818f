//! Host normalization for externally observed URLs.

/// Strips an `http://` or `https://` scheme and any subsequent path from
/// the given string, keeping the host only. Useful when a value observed
/// from routing metadata (such as an origin header or a route host) needs
/// to be embedded where a bare host is expected.
///
/// Strings that do not start with exactly `http://` or `https://` are
/// returned unchanged, including other scheme-like prefixes.
///
/// ```
/// use projectmesh_core::normalize_host;
///
/// assert_eq!(normalize_host("https://gateway.dev/api?limit=5"), "gateway.dev");
/// assert_eq!(normalize_host("gopher://gateway.dev"), "gopher://gateway.dev");
/// ```
pub fn normalize_host(s: &str) -> String {
    let without_scheme = s
        .strip_prefix("http://")
        .or_else(|| s.strip_prefix("https://"));

    match without_scheme {
        None => s.to_string(),
        Some(rest) => match rest.find('/') {
            None => rest.to_string(),
            Some(idx) => rest[..idx].to_string(),
        },
    }
}
