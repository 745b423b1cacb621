//! Schematic slide rendering. Produces fixed-size SVG documents: a gradient
//! background, a title banner, word-wrapped body text, and any embedded
//! images tiled three per row. This is the last-resort rendering path when
//! no external converter is available; it makes no attempt at visual
//! fidelity beyond "a reasonable image exists per slide".

pub const SLIDE_WIDTH: u32 = 1280;
pub const SLIDE_HEIGHT: u32 = 720;

const MARGIN: u32 = 80;
const TITLE_FONT_SIZE: u32 = 40;
const BODY_FONT_SIZE: u32 = 26;
const LINE_HEIGHT: u32 = 38;
const THUMB_WIDTH: u32 = 320;
const THUMB_HEIGHT: u32 = 180;
const THUMB_GAP: u32 = 24;
const THUMBS_PER_ROW: u32 = 3;

/// An image resolved out of the archive, ready to embed as a data URI.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub mime: &'static str,
    pub base64: String,
}

/// Declared embed type from the leading byte signature. Defaults to PNG
/// when the signature is unrecognized.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        "image/png"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else {
        "image/png"
    }
}

/// Content type for serving stored slide bytes. Same signatures as
/// `sniff_mime` plus SVG, which the schematic renderer produces.
pub fn content_type_for(bytes: &[u8]) -> &'static str {
    let trimmed = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map(|i| &bytes[i..])
        .unwrap_or(bytes);
    if trimmed.starts_with(b"<svg") || trimmed.starts_with(b"<?xml") {
        "image/svg+xml"
    } else {
        sniff_mime(bytes)
    }
}

/// Naive word wrap: greedy fill up to `max_chars` per line. Words longer
/// than a line get a line of their own.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Characters per line derived from a fixed width estimate for the body
/// font. Crude, but this renderer only promises legibility.
pub fn body_wrap_width() -> usize {
    ((SLIDE_WIDTH - 2 * MARGIN) as f32 / (BODY_FONT_SIZE as f32 * 0.55)) as usize
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

fn svg_open(seq: u32, total: u32) -> String {
    format!(
        concat!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" ",
            "xmlns:xlink=\"http://www.w3.org/1999/xlink\" ",
            "width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            "<defs><linearGradient id=\"bg\" x1=\"0\" y1=\"0\" x2=\"0\" y2=\"1\">",
            "<stop offset=\"0%\" stop-color=\"#1e3a5f\"/>",
            "<stop offset=\"100%\" stop-color=\"#0b1929\"/>",
            "</linearGradient></defs>\n",
            "<rect width=\"{w}\" height=\"{h}\" fill=\"url(#bg)\"/>\n",
            "<text x=\"{fx}\" y=\"{fy}\" font-family=\"sans-serif\" font-size=\"20\" ",
            "fill=\"#8aa4c0\" text-anchor=\"end\">Slide {seq} of {total}</text>\n",
        ),
        w = SLIDE_WIDTH,
        h = SLIDE_HEIGHT,
        fx = SLIDE_WIDTH - 40,
        fy = SLIDE_HEIGHT - 32,
        seq = seq,
        total = total,
    )
}

/// Render one schematic slide with extracted content.
pub fn render_slide_svg(
    seq: u32,
    total: u32,
    title: &str,
    lines: &[String],
    images: &[EmbeddedImage],
) -> String {
    let mut svg = svg_open(seq, total);

    // Title banner
    svg.push_str(&format!(
        "<rect x=\"0\" y=\"{y}\" width=\"{w}\" height=\"96\" fill=\"#ffffff\" fill-opacity=\"0.08\"/>\n",
        y = MARGIN - 20,
        w = SLIDE_WIDTH,
    ));
    svg.push_str(&format!(
        "<text x=\"{x}\" y=\"{y}\" font-family=\"sans-serif\" font-size=\"{fs}\" \
         font-weight=\"bold\" fill=\"#ffffff\">{t}</text>\n",
        x = MARGIN,
        y = MARGIN + 44,
        fs = TITLE_FONT_SIZE,
        t = xml_escape(title),
    ));

    // Body text, top to bottom
    let mut y = MARGIN + 140;
    for line in lines {
        if y > SLIDE_HEIGHT - MARGIN {
            break;
        }
        svg.push_str(&format!(
            "<text x=\"{x}\" y=\"{y}\" font-family=\"sans-serif\" font-size=\"{fs}\" \
             fill=\"#d7e3f0\">{t}</text>\n",
            x = MARGIN,
            y = y,
            fs = BODY_FONT_SIZE,
            t = xml_escape(line),
        ));
        y += LINE_HEIGHT;
    }

    // Embedded images tiled below the text, three per row
    let images_top = y + 20;
    for (idx, image) in images.iter().enumerate() {
        let col = idx as u32 % THUMBS_PER_ROW;
        let row = idx as u32 / THUMBS_PER_ROW;
        let ix = MARGIN + col * (THUMB_WIDTH + THUMB_GAP);
        let iy = images_top + row * (THUMB_HEIGHT + THUMB_GAP);
        if iy + THUMB_HEIGHT > SLIDE_HEIGHT - 16 {
            break;
        }
        svg.push_str(&format!(
            "<image x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" \
             preserveAspectRatio=\"xMidYMid meet\" \
             xlink:href=\"data:{mime};base64,{data}\"/>\n",
            x = ix,
            y = iy,
            w = THUMB_WIDTH,
            h = THUMB_HEIGHT,
            mime = image.mime,
            data = image.base64,
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

/// Last-resort placeholder: gradient background and a "Slide N of Total"
/// label, no extracted content. Deterministic, no I/O.
pub fn placeholder_svg(seq: u32, total: u32) -> String {
    let mut svg = svg_open(seq, total);
    svg.push_str(&format!(
        "<text x=\"{x}\" y=\"{y}\" font-family=\"sans-serif\" font-size=\"56\" \
         font-weight=\"bold\" fill=\"#ffffff\" text-anchor=\"middle\">Slide {seq}</text>\n",
        x = SLIDE_WIDTH / 2,
        y = SLIDE_HEIGHT / 2,
        seq = seq,
    ));
    svg.push_str(&format!(
        "<text x=\"{x}\" y=\"{y}\" font-family=\"sans-serif\" font-size=\"24\" \
         fill=\"#8aa4c0\" text-anchor=\"middle\">No preview available</text>\n",
        x = SLIDE_WIDTH / 2,
        y = SLIDE_HEIGHT / 2 + 48,
    ));
    svg.push_str("</svg>\n");
    svg
}
