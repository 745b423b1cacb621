//! Archive-based fallback extraction. When no external converter produced
//! anything, read the presentation archive directly: pull text runs and
//! embedded images out of each slide's XML and relationship files, and
//! synthesize a schematic SVG per slide. Slide markup is scanned with
//! pattern matching over the inline text tags; no document model is built.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use uuid::Uuid;

use crate::errors::AppError;

use super::detect;
use super::render::{self, EmbeddedImage};
use super::store::SlideStore;

static TEXT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<a:t>(.*?)</a:t>").unwrap());
static EMBED_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"r:embed="([^"]+)""#).unwrap());
static SLIDE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"slide(\d+)\.xml$").unwrap());

/// Synthesize one schematic slide per slide-XML entry. Any error mid-way
/// discards partial progress and backfills one placeholder per
/// detected-or-default count; no partial credit.
pub fn extract_fallback(
    archive_path: &Path,
    store: &dyn SlideStore,
    presentation_id: &str,
    detected_count: u32,
) -> Result<usize, AppError> {
    match extract_slides(archive_path, store, presentation_id, detected_count) {
        Ok(n) => Ok(n),
        Err(e) => {
            log::warn!("archive extraction failed for {presentation_id}, backfilling placeholders: {e}");
            store.discard_slides(presentation_id)?;
            let total = detected_count.max(1);
            for seq in 1..=total {
                persist_svg(store, presentation_id, seq, &render::placeholder_svg(seq, total))?;
            }
            Ok(total as usize)
        }
    }
}

fn extract_slides(
    archive_path: &Path,
    store: &dyn SlideStore,
    presentation_id: &str,
    detected_count: u32,
) -> Result<usize, AppError> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| AppError::Pipeline(format!("unreadable archive: {e}")))?;

    // Slide entries ordered by numeric suffix, stable zero on parse failure.
    let mut entries: Vec<(u32, String)> = Vec::new();
    for i in 0..archive.len() {
        let name = archive
            .by_index(i)
            .map_err(|e| AppError::Pipeline(format!("unreadable archive entry: {e}")))?
            .name()
            .to_string();
        if detect::is_slide_entry(&name) {
            entries.push((slide_suffix(&name), name));
        }
    }
    entries.sort_by_key(|(suffix, _)| *suffix);

    if entries.is_empty() {
        let total = detected_count.max(1);
        persist_svg(store, presentation_id, 1, &render::placeholder_svg(1, total))?;
        return Ok(1);
    }

    let total = entries.len() as u32;
    for (position, (_, entry_name)) in entries.iter().enumerate() {
        let seq = (position + 1) as u32;
        let xml = read_entry_string(&mut archive, entry_name)?;

        // First run is the title; the rest become body lines.
        let mut runs = TEXT_RUN
            .captures_iter(&xml)
            .map(|caps| xml_unescape(&caps[1]));
        let title = runs.next().unwrap_or_else(|| format!("Slide {seq}"));
        let body: Vec<String> = runs
            .map(|run| run.trim().to_string())
            .filter(|run| !run.is_empty())
            .collect();

        let images = resolve_images(&mut archive, entry_name, &xml);

        let wrap = render::body_wrap_width();
        let mut lines = Vec::new();
        for run in &body {
            lines.extend(render::wrap_text(run, wrap));
        }

        let svg = render::render_slide_svg(seq, total, &title, &lines, &images);
        persist_svg(store, presentation_id, seq, &svg)?;
    }

    Ok(entries.len())
}

/// Resolve the slide's embedded-image relationship ids to media payloads.
/// Unresolvable ids are skipped; a slide may legitimately end up with no
/// images.
fn resolve_images(
    archive: &mut zip::ZipArchive<File>,
    slide_entry: &str,
    slide_xml: &str,
) -> Vec<EmbeddedImage> {
    let rel_ids: Vec<String> = EMBED_ID
        .captures_iter(slide_xml)
        .map(|caps| caps[1].to_string())
        .collect();
    if rel_ids.is_empty() {
        return Vec::new();
    }

    let rels_entry = rels_path(slide_entry);
    let rels_xml = match read_entry_string(archive, &rels_entry) {
        Ok(xml) => xml,
        Err(_) => {
            log::debug!("no relationship file at {rels_entry}");
            return Vec::new();
        }
    };
    let doc = match roxmltree::Document::parse(&rels_xml) {
        Ok(doc) => doc,
        Err(e) => {
            log::debug!("malformed relationship file {rels_entry}: {e}");
            return Vec::new();
        }
    };

    let mut images = Vec::new();
    for rel_id in &rel_ids {
        let target = doc
            .root_element()
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "Relationship")
            .find(|n| n.attribute("Id") == Some(rel_id.as_str()))
            .and_then(|n| n.attribute("Target"));
        let Some(target) = target else {
            log::debug!("relationship {rel_id} not found in {rels_entry}");
            continue;
        };
        let media_path = resolve_target(slide_entry, target);
        match read_entry_bytes(archive, &media_path) {
            Ok(bytes) => images.push(EmbeddedImage {
                mime: render::sniff_mime(&bytes),
                base64: STANDARD.encode(&bytes),
            }),
            Err(_) => log::debug!("media entry {media_path} missing"),
        }
    }
    images
}

fn persist_svg(
    store: &dyn SlideStore,
    presentation_id: &str,
    seq: u32,
    svg: &str,
) -> Result<(), AppError> {
    let slide_id = Uuid::new_v4().to_string();
    let encoded = STANDARD.encode(svg.as_bytes());
    let outcome = store.persist_slide(presentation_id, seq, &slide_id, &encoded)?;
    if !outcome.mirrored {
        log::warn!("slide {seq} of {presentation_id} not mirrored");
    }
    Ok(())
}

fn slide_suffix(entry_name: &str) -> u32 {
    SLIDE_SUFFIX
        .captures(entry_name)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

/// "ppt/slides/slide3.xml" -> "ppt/slides/_rels/slide3.xml.rels"
fn rels_path(slide_entry: &str) -> String {
    let mut path = slide_entry.to_string();
    if let Some(pos) = path.rfind('/') {
        path.insert_str(pos + 1, "_rels/");
    }
    path.push_str(".rels");
    path
}

/// Relationship targets are relative to the slide directory; a `../`
/// prefix maps into the package's shared resource tree under `ppt/`.
fn resolve_target(slide_entry: &str, target: &str) -> String {
    if let Some(stripped) = target.strip_prefix("../") {
        format!("ppt/{stripped}")
    } else {
        let dir = slide_entry.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
        format!("{dir}/{target}")
    }
}

fn read_entry_bytes(archive: &mut zip::ZipArchive<File>, name: &str) -> Result<Vec<u8>, AppError> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| AppError::Pipeline(format!("archive entry {name}: {e}")))?;
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn read_entry_string(archive: &mut zip::ZipArchive<File>, name: &str) -> Result<String, AppError> {
    let bytes = read_entry_bytes(archive, name)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn xml_unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
