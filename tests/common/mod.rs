//! Shared test infrastructure: temp-file SQLite databases, fixture
//! presentation archives, and fakes for the tool runner and slide store.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rusqlite::Connection;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use deckmark::db::{self, DbPool, MIGRATIONS};
use deckmark::errors::AppError;
use deckmark::mirror;
use deckmark::pipeline::store::{PersistOutcome, SlideStore};
use deckmark::pipeline::tool::{ToolError, ToolRunner};

// ============================================================================
// DATABASE SETUP
// ============================================================================

/// Temporary SQLite database with the primary schema applied. The TempDir
/// must be kept alive for the Connection to remain valid.
pub fn setup_test_db() -> (TempDir, Connection) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.db");
    let conn = Connection::open(&db_path).expect("Failed to open test DB");

    conn.execute_batch("PRAGMA foreign_keys=ON; PRAGMA journal_mode=WAL;")
        .expect("Failed to set pragmas");
    conn.execute_batch(MIGRATIONS)
        .expect("Failed to run migrations");

    (dir, conn)
}

/// Primary + mirror pools over temp files, for end-to-end pipeline tests.
pub fn setup_pools() -> (TempDir, DbPool, DbPool) {
    let dir = TempDir::new().expect("Failed to create temp dir");

    let pool = db::init_pool(dir.path().join("app.db").to_str().unwrap());
    db::run_migrations(&pool);

    let mirror_pool = mirror::init_pool(dir.path().join("mirror.db").to_str().unwrap());
    mirror::run_migrations(&mirror_pool);

    (dir, pool, mirror_pool)
}

// ============================================================================
// FIXTURE ARCHIVES
// ============================================================================

pub const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

fn slide_xml(title: &str, lines: &[&str], with_embed: bool) -> String {
    let mut body = String::new();
    body.push_str(&format!("<a:p><a:r><a:t>{title}</a:t></a:r></a:p>"));
    for line in lines {
        body.push_str(&format!("<a:p><a:r><a:t>{line}</a:t></a:r></a:p>"));
    }
    if with_embed {
        body.push_str("<p:pic><p:blipFill><a:blip r:embed=\"rId2\"/></p:blipFill></p:pic>");
    }
    format!(
        "<p:sld xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" \
         xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
         xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
         <p:cSld><p:spTree>{body}</p:spTree></p:cSld></p:sld>"
    )
}

fn manifest_xml(slide_count: usize) -> String {
    let mut ids = String::new();
    for i in 0..slide_count {
        ids.push_str(&format!("<p:sldId id=\"{}\" r:id=\"rId{}\"/>", 256 + i, 2 + i));
    }
    format!(
        "<p:presentation xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" \
         xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
         <p:sldIdLst>{ids}</p:sldIdLst></p:presentation>"
    )
}

/// One slide of a fixture archive: entry number, title, body lines.
pub struct SlideFixture<'a> {
    pub number: u32,
    pub title: &'a str,
    pub lines: &'a [&'a str],
    pub with_image: bool,
}

impl<'a> SlideFixture<'a> {
    pub fn text(number: u32, title: &'a str, lines: &'a [&'a str]) -> Self {
        Self {
            number,
            title,
            lines,
            with_image: false,
        }
    }
}

/// Build a minimal pptx archive at `path`.
pub fn build_pptx(path: &Path, slides: &[SlideFixture]) {
    build_pptx_with_entries(path, slides, &[]);
}

/// Like `build_pptx`, with arbitrary extra archive members appended.
pub fn build_pptx_with_entries(path: &Path, slides: &[SlideFixture], extra: &[(&str, &str)]) {
    let file = File::create(path).expect("Failed to create fixture archive");
    let mut archive = zip::ZipWriter::new(file);
    let opts = SimpleFileOptions::default();

    archive
        .start_file("ppt/presentation.xml", opts)
        .expect("start manifest");
    archive
        .write_all(manifest_xml(slides.len()).as_bytes())
        .expect("write manifest");

    for slide in slides {
        archive
            .start_file(format!("ppt/slides/slide{}.xml", slide.number), opts)
            .expect("start slide");
        archive
            .write_all(slide_xml(slide.title, slide.lines, slide.with_image).as_bytes())
            .expect("write slide");

        if slide.with_image {
            archive
                .start_file(
                    format!("ppt/slides/_rels/slide{}.xml.rels", slide.number),
                    opts,
                )
                .expect("start rels");
            archive
                .write_all(
                    b"<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
                      <Relationship Id=\"rId2\" \
                       Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/image\" \
                       Target=\"../media/image1.png\"/></Relationships>",
                )
                .expect("write rels");
        }
    }

    if slides.iter().any(|s| s.with_image) {
        archive
            .start_file("ppt/media/image1.png", opts)
            .expect("start media");
        archive.write_all(&PNG_MAGIC).expect("write media");
        archive.write_all(&[1, 2, 3, 4]).expect("write media body");
    }

    for (name, content) in extra {
        archive
            .start_file(*name, opts)
            .expect("start extra entry");
        archive
            .write_all(content.as_bytes())
            .expect("write extra entry");
    }

    archive.finish().expect("finish archive");
}

/// Archive with no slide-XML entries, only a manifest carrying
/// `manifest_slides` slide-id markers.
pub fn build_empty_pptx(path: &Path, manifest_slides: usize) {
    let file = File::create(path).expect("Failed to create fixture archive");
    let mut archive = zip::ZipWriter::new(file);
    let opts = SimpleFileOptions::default();

    archive
        .start_file("ppt/presentation.xml", opts)
        .expect("start manifest");
    archive
        .write_all(manifest_xml(manifest_slides).as_bytes())
        .expect("write manifest");
    archive.finish().expect("finish archive");
}

// ============================================================================
// FAKES
// ============================================================================

/// In-memory slide store. `fail_on` injects a single failure on the nth
/// persist call (1-based), then recovers.
#[derive(Default)]
pub struct RecordingStore {
    pub slides: RefCell<Vec<RecordedSlide>>,
    pub fail_on: Cell<Option<usize>>,
    calls: Cell<usize>,
}

#[derive(Debug, Clone)]
pub struct RecordedSlide {
    pub seq: u32,
    pub slide_id: String,
    pub bytes: Vec<u8>,
}

impl RecordedSlide {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl SlideStore for RecordingStore {
    fn persist_slide(
        &self,
        _presentation_id: &str,
        seq: u32,
        slide_id: &str,
        image_base64: &str,
    ) -> Result<PersistOutcome, AppError> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if self.fail_on.get() == Some(call) {
            self.fail_on.set(None);
            return Err(AppError::Pipeline("injected store failure".to_string()));
        }
        let bytes = STANDARD
            .decode(image_base64)
            .expect("store received invalid base64");
        self.slides.borrow_mut().push(RecordedSlide {
            seq,
            slide_id: slide_id.to_string(),
            bytes,
        });
        Ok(PersistOutcome { mirrored: true })
    }

    fn discard_slides(&self, _presentation_id: &str) -> Result<(), AppError> {
        self.slides.borrow_mut().clear();
        Ok(())
    }
}

/// Fake external-tool runner. With an empty file list every tool "is not
/// installed"; otherwise `soffice` writes a stub PDF and the rasterizers
/// drop the configured files into the strategy's output directory.
/// `fail_dpi` makes the pdftoppm invocation at that resolution exit
/// non-zero so individual chain tiers can be knocked out. Every invocation
/// is appended to `calls` for order assertions.
pub struct FakeRunner {
    pub raster_files: Vec<(String, Vec<u8>)>,
    pub calls: RefCell<Vec<String>>,
    fail_dpis: Vec<String>,
}

impl FakeRunner {
    /// Every tool fails to launch.
    pub fn unavailable() -> Self {
        Self {
            raster_files: Vec::new(),
            calls: RefCell::new(Vec::new()),
            fail_dpis: Vec::new(),
        }
    }

    /// Produces `pages` files named `slide-01.png`, `slide-02.png`, ...
    /// whose payload carries the page number after a PNG signature.
    pub fn pages(pages: usize) -> Self {
        let raster_files = (1..=pages)
            .map(|i| {
                let mut bytes = PNG_MAGIC.to_vec();
                bytes.push(i as u8);
                (format!("slide-{i:02}.png"), bytes)
            })
            .collect();
        Self {
            raster_files,
            calls: RefCell::new(Vec::new()),
            fail_dpis: Vec::new(),
        }
    }

    pub fn named(files: Vec<(String, Vec<u8>)>) -> Self {
        Self {
            raster_files: files,
            calls: RefCell::new(Vec::new()),
            fail_dpis: Vec::new(),
        }
    }

    /// The pdftoppm invocation at `dpi` exits non-zero instead of
    /// producing files.
    pub fn fail_dpi(mut self, dpi: u32) -> Self {
        self.fail_dpis.push(dpi.to_string());
        self
    }

    fn write_rasters(&self, dir: &Path) {
        for (name, bytes) in &self.raster_files {
            std::fs::write(dir.join(name), bytes).expect("write raster file");
        }
    }
}

impl ToolRunner for FakeRunner {
    fn run(&self, cmd: Command) -> Result<(), ToolError> {
        let program = cmd.get_program().to_string_lossy().into_owned();
        let args: Vec<PathBuf> = cmd.get_args().map(PathBuf::from).collect();
        let not_installed = || {
            ToolError::Spawn(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "not installed",
            ))
        };

        if self.raster_files.is_empty() {
            return Err(not_installed());
        }
        match program.as_str() {
            "soffice" => {
                self.calls.borrow_mut().push("soffice".to_string());
                // --headless --convert-to pdf --outdir <dir> <source>
                let outdir = &args[4];
                let stem = args[5].file_stem().expect("source has a file stem");
                std::fs::write(outdir.join(stem).with_extension("pdf"), b"%PDF-1.4 stub")
                    .expect("write stub pdf");
                Ok(())
            }
            "pdftoppm" => {
                // -png -r <dpi> <pdf> <prefix>
                let dpi = args[2].to_string_lossy().into_owned();
                self.calls.borrow_mut().push(format!("pdftoppm -r {dpi}"));
                if self.fail_dpis.contains(&dpi) {
                    return Err(ToolError::Exit(Some(1)));
                }
                let prefix = args.last().expect("pdftoppm prefix argument");
                self.write_rasters(prefix.parent().expect("prefix has a parent"));
                Ok(())
            }
            "convert" => {
                self.calls.borrow_mut().push("convert".to_string());
                let pattern = args.last().expect("convert output pattern");
                self.write_rasters(pattern.parent().expect("pattern has a parent"));
                Ok(())
            }
            _ => Err(not_installed()),
        }
    }
}
