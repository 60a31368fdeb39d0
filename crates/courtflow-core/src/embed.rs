//! Video link → embeddable player URL.

use reqwest::Url;

const EMBED_BASE: &str = "https://www.youtube.com/embed/";

/// Embeddable player URL for a YouTube watch link or a `youtu.be` short
/// link. Anything else, including unparsable input, yields `None`.
pub fn youtube_embed_url(link: &str) -> Option<String> {
    let url = Url::parse(link.trim()).ok()?;
    let host = url.host_str()?;

    if host.contains("youtube.com") {
        let video = url
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())?;
        return Some(format!("{EMBED_BASE}{video}"));
    }

    if host.contains("youtu.be") {
        let path = url.path();
        if path.len() > 1 {
            return Some(format!("{EMBED_BASE}{}", &path[1..]));
        }
    }

    None
}
