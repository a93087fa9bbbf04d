use std::fmt;

use url::Url;

/// Host used for every canonical link.
pub const PRIMARY_HOST: &str = "www.youtube.com";

const PRIMARY_DOMAINS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
];
const SHORT_LINK_DOMAINS: &[&str] = &["youtu.be", "www.youtu.be"];

/// Canonical URL identifying one video regardless of the input URL's surface form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedIdentity(String);

impl NormalizedIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonicalize a raw link, or return `None` if it is not a supported video link.
///
/// Recognized forms, checked in order:
/// - `/shorts/<id>` on any supported host -> `https://www.youtube.com/shorts/<id>`
/// - `youtu.be/<id>` -> `https://www.youtube.com/watch?v=<id>`
/// - any supported host with a non-empty `v` query parameter -> the watch form
///
/// Playlist-only, embed and channel links are not recognized.
pub fn normalize(raw: &str) -> Option<NormalizedIdentity> {
    let parsed = Url::parse(raw.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    let host = parsed.host_str()?;
    let short_link = SHORT_LINK_DOMAINS.contains(&host);
    if !short_link && !PRIMARY_DOMAINS.contains(&host) {
        return None;
    }

    let path = parsed.path();
    if let Some(rest) = path.strip_prefix("/shorts/") {
        let id = rest.split('/').next().unwrap_or_default();
        return non_empty(id).map(shorts_identity);
    }

    if short_link {
        // The `v` query value below arrives decoded, so the path id must too.
        let encoded = path.strip_prefix('/').unwrap_or(path);
        let id = urlencoding::decode(encoded).ok()?;
        return non_empty(&id).map(watch_identity);
    }

    let id = parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())?;
    non_empty(&id).map(watch_identity)
}

fn non_empty(id: &str) -> Option<&str> {
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

fn shorts_identity(id: &str) -> NormalizedIdentity {
    NormalizedIdentity(format!("https://{PRIMARY_HOST}/shorts/{id}"))
}

fn watch_identity(id: &str) -> NormalizedIdentity {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("v", id)
        .finish();
    NormalizedIdentity(format!("https://{PRIMARY_HOST}/watch?{query}"))
}
