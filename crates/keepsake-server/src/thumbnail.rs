//! Video thumbnail placeholders.
//!
//! No frame extraction happens on this server.  A video's thumbnail is a
//! fixed-size SVG card with a play glyph and the file name, regenerated on
//! every request; image thumbnails are served as the original bytes.

/// Placeholder dimensions, matching the gallery's thumbnail tiles.
const WIDTH: u32 = 320;
const HEIGHT: u32 = 180;

/// Render the placeholder SVG for a video file.
///
/// Deterministic: the same name always yields the same bytes.
pub fn video_placeholder(file_name: &str) -> String {
    let label = escape_xml(file_name);
    format!(
        concat!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"##,
            "\n",
            r##"  <rect width="{w}" height="{h}" fill="#2b2b33"/>"##,
            "\n",
            r##"  <polygon points="134,60 134,120 190,90" fill="#f5f5f7"/>"##,
            "\n",
            r##"  <text x="160" y="158" text-anchor="middle" font-family="sans-serif" font-size="14" fill="#f5f5f7">{label}</text>"##,
            "\n",
            "</svg>\n",
        ),
        w = WIDTH,
        h = HEIGHT,
        label = label,
    )
}

/// Escape the XML special characters so arbitrary file names cannot break
/// out of the text node.
fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
