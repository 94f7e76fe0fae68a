//! Content type assignment for uploaded assets

const TEXT_HTML: &str = "text/html; charset=utf-8";
const TEXT_XML: &str = "text/xml; charset=utf-8";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const IMAGE_SVG: &str = "image/svg+xml";
const APPLICATION_JSON: &str = "application/json";
const OCTET_STREAM: &str = "application/octet-stream";

/// Leading tags that mark a document as HTML (WHATWG mime sniffing table)
const HTML_TAGS: [&str; 17] = [
    "<!doctype html",
    "<html",
    "<head",
    "<script",
    "<iframe",
    "<h1",
    "<div",
    "<font",
    "<table",
    "<a",
    "<style",
    "<title",
    "<b",
    "<body",
    "<br",
    "<p",
    "<meta",
];

/// Bytes inspected when looking for the root element
const SNIFF_LEN: usize = 512;

/// Extensions whose type is fixed regardless of content
const OVERRIDES: [(&str, &str); 3] = [
    (".css", "text/css"),
    (".js", "application/javascript"),
    (".map", "binary/octet-stream"),
];

/// Fixed content type for a file name, if any
pub fn override_for(name: &str) -> Option<&'static str> {
    OVERRIDES
        .iter()
        .find(|(ext, _)| name.ends_with(ext))
        .map(|(_, content_type)| *content_type)
}

/// Content type for an object: extension overrides first, then the bytes
pub fn detect(name: &str, bytes: &[u8]) -> &'static str {
    override_for(name).unwrap_or_else(|| sniff(bytes))
}

/// Classify file contents
pub fn sniff(bytes: &[u8]) -> &'static str {
    if bytes.is_empty() {
        return TEXT_PLAIN;
    }

    // Binary formats by magic number; text matchers are handled below
    if let Some(kind) = infer::get(bytes)
        && !matches!(kind.matcher_type(), infer::MatcherType::Text)
    {
        return kind.mime_type();
    }

    let Ok(text) = std::str::from_utf8(bytes) else {
        return OCTET_STREAM;
    };
    let text = text.trim_start_matches('\u{feff}').trim_start();
    let head = lowercase_prefix(text, SNIFF_LEN);

    if starts_with_tag(root_element(&head), "<svg") {
        return IMAGE_SVG;
    }
    if head.starts_with("<!--") || HTML_TAGS.iter().any(|tag| starts_with_tag(&head, tag)) {
        return TEXT_HTML;
    }
    if head.starts_with("<?xml") {
        return TEXT_XML;
    }
    if (text.starts_with('{') || text.starts_with('['))
        && serde_json::from_str::<serde_json::Value>(text).is_ok()
    {
        return APPLICATION_JSON;
    }

    TEXT_PLAIN
}

fn lowercase_prefix(text: &str, max_bytes: usize) -> String {
    let mut end = text.len().min(max_bytes);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_ascii_lowercase()
}

/// `text` starts with `tag` followed by a space or `>`
fn starts_with_tag(text: &str, tag: &str) -> bool {
    text.strip_prefix(tag).is_some_and(|rest| {
        rest.is_empty() || rest.starts_with(|c: char| c == '>' || c.is_ascii_whitespace())
    })
}

/// Skip the XML prolog, processing instructions, comments and a non-HTML
/// doctype in front of the first element
fn root_element(text: &str) -> &str {
    let mut rest = text.trim_start();
    loop {
        let skipped = if rest.starts_with("<?") {
            rest.find("?>").map(|i| &rest[i + 2..])
        } else if rest.starts_with("<!--") {
            rest.find("-->").map(|i| &rest[i + 3..])
        } else if rest.starts_with("<!doctype") && !rest.starts_with("<!doctype html") {
            rest.find('>').map(|i| &rest[i + 1..])
        } else {
            return rest;
        };
        match skipped {
            Some(next) => rest = next.trim_start(),
            None => return "",
        }
    }
}
