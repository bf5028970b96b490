use url::Url;

/// Turn what a user typed into something loadable: web and file URLs pass
/// through, bare hosts get `https://`, anything else becomes a search.
pub fn resolve_address(input: &str) -> String {
    let input = input.trim();
    if let Ok(url) = Url::parse(input) {
        if matches!(url.scheme(), "http" | "https" | "file") {
            return url.into();
        }
    }
    if input.contains('.') && !input.contains(' ') {
        format!("https://{}", input)
    } else {
        format!("https://www.google.com/search?q={}", urlencoding::encode(input))
    }
}

/// Short form of a loaded page for the log. Query strings can carry
/// tokens, so only the origin and path are kept.
pub fn page_label(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => format!("{}://{}{}", parsed.scheme(), host, parsed.path()),
            None => parsed.scheme().to_string(),
        },
        Err(_) => "<unparseable url>".to_string(),
    }
}
