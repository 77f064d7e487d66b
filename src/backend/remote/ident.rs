/// Provider video ids are exactly 11 characters of this alphabet.
const ID_LEN: usize = 11;

fn is_canonical(s: &str) -> bool {
    s.len() == ID_LEN
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Reduce whatever identifier a search result or share link carries down to
/// the bare 11-character video id.
///
/// Total and idempotent: never panics, a canonical id maps to itself, and
/// anything unrecognizable maps to the empty string, which marks the track
/// unplayable without ever reaching the device.
pub fn canonicalize(raw: &str) -> String {
    let s = raw.trim();
    let s = s.strip_prefix("youtube-").unwrap_or(s);

    if is_canonical(s) {
        return s.to_string();
    }

    let candidate = extract_from_url(s).unwrap_or(s);
    if is_canonical(candidate) {
        candidate.to_string()
    } else {
        String::new()
    }
}

fn extract_from_url(s: &str) -> Option<&str> {
    if let Some(rest) = after(s, "youtu.be/") {
        return Some(head(rest));
    }
    if let Some(rest) = after(s, "/embed/") {
        return Some(head(rest));
    }
    if let Some(rest) = after(s, "/shorts/") {
        return Some(head(rest));
    }
    if s.contains("watch") {
        // The id lives in the v= query parameter.
        let query = s.split_once('?').map(|(_, q)| q).unwrap_or(s);
        for pair in query.split('&') {
            if let Some(v) = pair.strip_prefix("v=") {
                return Some(head(v));
            }
        }
    }
    None
}

fn after<'a>(s: &'a str, marker: &str) -> Option<&'a str> {
    s.find(marker).map(|i| &s[i + marker.len()..])
}

/// Cut the candidate at the first character that cannot be part of an id.
fn head(s: &str) -> &str {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(s.len());
    &s[..end]
}
