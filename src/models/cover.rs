//! Cover cells are stored as `=IMAGE("<url>")` so the sheet renders a thumbnail.
//! Everything outside the record store sees a plain URL.

const IMAGE_PREFIX: &str = "=IMAGE(";

/// Plain URL -> formula cell. Blank input yields an empty cell.
pub fn encode_cover_cell(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }
    format!("=IMAGE(\"{}\")", url.replace('"', "\"\""))
}

/// Cell text -> plain URL.
///
/// Plain text passes through unchanged. An `=IMAGE(...)` formula yields its first string
/// argument; a formula without one yields `None`.
pub fn decode_cover_cell(cell: &str) -> Option<String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }

    let is_image = cell
        .get(..IMAGE_PREFIX.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(IMAGE_PREFIX));
    if !is_image {
        return Some(cell.to_string());
    }

    let args = cell[IMAGE_PREFIX.len()..].trim_start();
    let body = args.strip_prefix('"')?;

    let mut url = String::new();
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                url.push('"');
                chars.next();
                continue;
            }
            return if url.is_empty() { None } else { Some(url) };
        }
        url.push(c);
    }

    None
}
