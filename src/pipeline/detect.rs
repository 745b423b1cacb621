//! Slide-count detection. Advisory only: the result seeds the fallback
//! extractor's placeholder count, it is never a hard constraint on output.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

pub const DEFAULT_SLIDE_COUNT: u32 = 10;

static SLIDE_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ppt/slides/slide\d+\.xml$").unwrap());

/// True for exactly the archive members that hold one slide's markup.
/// Shared with the fallback extractor so the detected count and the
/// extracted entries can never disagree about what counts as a slide.
pub fn is_slide_entry(name: &str) -> bool {
    SLIDE_ENTRY.is_match(name)
}

/// Estimate the number of slides in a presentation archive. Counts
/// slide-XML entries, then falls back to slide-id markers in the
/// presentation manifest, then to a fixed default. Never fails: every
/// internal error degrades to the default.
pub fn detect_slide_count(path: &Path) -> u32 {
    let is_pptx = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pptx"))
        .unwrap_or(false);
    if !is_pptx {
        return DEFAULT_SLIDE_COUNT;
    }
    match count_in_archive(path) {
        Some(n) if n > 0 => n,
        _ => DEFAULT_SLIDE_COUNT,
    }
}

fn count_in_archive(path: &Path) -> Option<u32> {
    let file = File::open(path).ok()?;
    let mut archive = zip::ZipArchive::new(file).ok()?;

    let mut count = 0u32;
    for i in 0..archive.len() {
        let entry = archive.by_index(i).ok()?;
        if is_slide_entry(entry.name()) {
            count += 1;
        }
    }
    if count > 0 {
        return Some(count);
    }

    // No slide entries; count slide-id markers in the manifest instead.
    let mut manifest = String::new();
    archive
        .by_name("ppt/presentation.xml")
        .ok()?
        .read_to_string(&mut manifest)
        .ok()?;
    Some(manifest.matches("<p:sldId ").count() as u32)
}
