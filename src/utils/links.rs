use regex::Regex;
use std::sync::OnceLock;

fn drive_file_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/file/d/([a-zA-Z0-9_-]+)").expect("valid drive id regex"))
}

/// Turns a Google Drive sharing link into a direct image link Telegram can fetch.
///
/// Links that are not Drive links, or Drive links without a `/file/d/<id>` segment,
/// come back unchanged.
pub fn convert_drive_url(url: &str) -> String {
    if url.is_empty() || !url.contains("drive.google.com") {
        return url.to_string();
    }

    match drive_file_id_pattern().captures(url) {
        Some(caps) => {
            let direct = format!("https://drive.google.com/uc?export=view&id={}", &caps[1]);
            tracing::info!("🔄 Converted Google Drive link: {} → {}", url, direct);
            direct
        }
        None => {
            tracing::warn!("⚠️ Could not extract a file id from Google Drive link: {}", url);
            url.to_string()
        }
    }
}

/// Escapes text for Telegram's HTML parse mode (also safe inside single-quoted attributes).
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
