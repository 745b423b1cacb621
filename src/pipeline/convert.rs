//! Conversion strategy chain. External toolchains are tried in fixed
//! priority order; the chain stops at the first strategy whose sorted image
//! list is non-empty. All strategies rasterize the same intermediate PDF,
//! exported once per chain run; if the export fails every strategy is
//! skipped and the chain falls through to the archive extractor.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use tempfile::TempDir;
use uuid::Uuid;

use crate::errors::AppError;

use super::store::SlideStore;
use super::tool::ToolRunner;

/// Slide index embedded in a produced filename. Three patterns of
/// decreasing specificity: dash-delimited before the extension,
/// digits concatenated before the extension, any digits at all.
/// No match sorts as 0, so unnumbered files tie for first; callers must
/// not treat that case as a strict order.
pub fn slide_index(path: &Path) -> u32 {
    static DASH: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"-(\d+)\.[A-Za-z0-9]+$").unwrap());
    static TAIL: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(\d+)\.[A-Za-z0-9]+$").unwrap());
    static ANY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").unwrap());

    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return 0,
    };
    for pattern in [&*DASH, &*TAIL, &*ANY] {
        if let Some(caps) = pattern.captures(name) {
            if let Ok(n) = caps[1].parse() {
                return n;
            }
        }
    }
    0
}

trait ConversionStrategy {
    fn name(&self) -> &'static str;
    /// Rasterize `pdf` into `out_dir`. Returns the produced image files;
    /// empty means the strategy failed and the next tier is tried.
    fn attempt(&self, pdf: &Path, out_dir: &Path, runner: &dyn ToolRunner) -> Vec<PathBuf>;
}

struct Pdftoppm {
    label: &'static str,
    dpi: u32,
}

impl ConversionStrategy for Pdftoppm {
    fn name(&self) -> &'static str {
        self.label
    }

    fn attempt(&self, pdf: &Path, out_dir: &Path, runner: &dyn ToolRunner) -> Vec<PathBuf> {
        let mut cmd = Command::new("pdftoppm");
        cmd.arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(pdf)
            .arg(out_dir.join("slide"));
        match runner.run(cmd) {
            Ok(()) => collect_images(out_dir),
            Err(e) => {
                log::info!("pdftoppm ({} dpi) unavailable: {e}", self.dpi);
                Vec::new()
            }
        }
    }
}

struct MagickConvert;

impl ConversionStrategy for MagickConvert {
    fn name(&self) -> &'static str {
        "imagemagick"
    }

    fn attempt(&self, pdf: &Path, out_dir: &Path, runner: &dyn ToolRunner) -> Vec<PathBuf> {
        let mut cmd = Command::new("convert");
        cmd.arg("-density")
            .arg("150")
            .arg("-background")
            .arg("white")
            .arg("-alpha")
            .arg("remove")
            .arg(pdf)
            .arg(out_dir.join("slide-%02d.png"));
        match runner.run(cmd) {
            Ok(()) => collect_images(out_dir),
            Err(e) => {
                log::info!("imagemagick convert unavailable: {e}");
                Vec::new()
            }
        }
    }
}

fn collect_images(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return files,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
            .unwrap_or(false);
        if is_image {
            files.push(path);
        }
    }
    files
}

/// Export the source document to PDF once for the whole chain. Returns
/// None on any tool failure; the chain then falls through.
fn export_pdf(source: &Path, scratch: &Path, runner: &dyn ToolRunner) -> Option<PathBuf> {
    let mut cmd = Command::new("soffice");
    cmd.arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(scratch)
        .arg(source);
    if let Err(e) = runner.run(cmd) {
        log::info!("pdf export unavailable: {e}");
        return None;
    }
    let stem = source.file_stem()?;
    let pdf = scratch.join(stem).with_extension("pdf");
    if pdf.is_file() {
        Some(pdf)
    } else {
        log::warn!("pdf export reported success but produced no file");
        None
    }
}

/// Run the strategy chain. Returns the number of slides persisted, zero
/// when every strategy fell through. Tool failures never escape; only
/// store and scratch-directory errors do.
pub fn run_chain(
    source: &Path,
    store: &dyn SlideStore,
    presentation_id: &str,
    runner: &dyn ToolRunner,
) -> Result<usize, AppError> {
    // Scoped scratch directory: released on every exit path.
    let scratch = TempDir::new()?;

    let pdf = match export_pdf(source, scratch.path(), runner) {
        Some(pdf) => pdf,
        None => return Ok(0),
    };

    let strategies: [&dyn ConversionStrategy; 3] = [
        &Pdftoppm { label: "pdftoppm-hires", dpi: 300 },
        &Pdftoppm { label: "pdftoppm-lores", dpi: 150 },
        &MagickConvert,
    ];

    for strategy in strategies {
        let out_dir = scratch.path().join(strategy.name());
        fs::create_dir_all(&out_dir)?;

        let mut files = strategy.attempt(&pdf, &out_dir, runner);
        if files.is_empty() {
            continue;
        }
        // Stable sort: entries without an extractable index keep their
        // enumeration order at rank 0.
        files.sort_by_key(|p| slide_index(p));

        for (rank, file) in files.iter().enumerate() {
            let bytes = fs::read(file)?;
            let encoded = STANDARD.encode(&bytes);
            let slide_id = Uuid::new_v4().to_string();
            let outcome =
                store.persist_slide(presentation_id, (rank + 1) as u32, &slide_id, &encoded)?;
            if !outcome.mirrored {
                log::warn!("slide {} of {presentation_id} not mirrored", rank + 1);
            }
            if let Err(e) = fs::remove_file(file) {
                log::warn!("could not remove scratch image {}: {e}", file.display());
            }
        }
        log::info!(
            "strategy {} produced {} slides for {presentation_id}",
            strategy.name(),
            files.len()
        );
        return Ok(files.len());
    }

    Ok(0)
}
