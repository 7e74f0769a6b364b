use url::Url;

/// Canonical domain key for per-site shield settings.
///
/// Lowercases the host, strips a single leading `www.` label and any
/// trailing dot. Returns `None` for URLs without a host (about:, data:,
/// file: and friends).
pub fn normalized_host(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}
