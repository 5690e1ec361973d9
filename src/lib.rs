//! Wireframe Converter
//!
//! Converts wireframe project stores (the SQLite files a mockup tool saves
//! as `.bmpr`) into a canonical JSON document and from there into `.ui`
//! widget-tree markup that UI toolkits can compile.
//!
//! # Basic Usage
//!
//! ```no_run
//! use wirec::{convert_store_to_markup, Result};
//!
//! fn main() -> Result<()> {
//!     let stats = convert_store_to_markup("project.bmpr", "forms/")?;
//!     println!("{} forms written", stats.documents_written);
//!     Ok(())
//! }
//! ```
//!
//! # Conversion Pipeline
//!
//! 1. **Extract**: read the six store tables into raw rows
//! 2. **Normalize**: decode JSON columns and repair mangled text
//! 3. **Build**: map each mockup screen onto a widget tree
//! 4. **Export**: write one markup file per screen, never overwriting
//!
//! The reverse direction loads a canonical document file and upserts it
//! into a store.

pub mod types;
pub mod error;
pub mod encoding;
pub mod extractor;
pub mod normalizer;
pub mod widget_tree;
pub mod markup;
pub mod persistence;
pub mod cli;

use serde::Serialize;
use std::path::Path;
use std::time::Instant;

// Re-export commonly used types and functions
pub use error::{ConverterError, RecordDecodeError, Result};
pub use types::*;
pub use encoding::{EncodingRepair, DetectedEncoding, Detection};
pub use extractor::{extract, RawRecordSet};
pub use normalizer::{Normalized, Normalizer};
pub use widget_tree::{widget_class_for, WidgetTreeBuilder};
pub use markup::{export_forms, write_markup, ExportReport};
pub use persistence::{load_document, save_document, store_upsert, UpsertStats};
pub use cli::EnhancedCli;

/// Converter version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Conversion options and settings
#[derive(Debug, Clone)]
pub struct ConverterOptions {
    /// Enable debug mode with extra logging
    pub debug_mode: bool,

    /// Documents whose name contains any of these are left out of markup
    /// conversion
    pub skip_name_patterns: Vec<String>,

    /// Extension of the markup files written
    pub markup_extension: String,

    /// Form name used when a screen has no window frame control
    pub default_form_name: String,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            debug_mode: false,
            skip_name_patterns: vec![SCRATCH_DOCUMENT_SENTINEL.to_string()],
            markup_extension: MARKUP_EXTENSION.to_string(),
            default_form_name: DEFAULT_FORM_NAME.to_string(),
        }
    }
}

impl ConverterOptions {
    /// Whether a document with this name is a scratch screen to leave out.
    pub fn is_skipped_document(&self, name: &str) -> bool {
        self.skip_name_patterns
            .iter()
            .any(|pattern| !pattern.is_empty() && name.contains(pattern.as_str()))
    }
}

/// Conversion statistics and metrics
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    pub branch_count: usize,
    pub resource_count: usize,
    pub comment_count: usize,
    pub user_count: usize,
    pub thumbnail_count: usize,
    pub info_count: usize,

    /// Forms built from mockup screens
    pub documents_built: usize,

    /// Screens left out by name
    pub documents_filtered: usize,

    /// Markup files written
    pub documents_written: usize,

    /// Screens or files skipped after an error
    pub documents_skipped: usize,

    /// Names of the screens left out by name
    pub filtered_documents: Vec<String>,

    /// Store rows that could not be decoded
    pub record_errors: Vec<String>,

    /// Per-document problems (malformed mockups, write conflicts)
    pub document_errors: Vec<String>,

    /// Conversion time in milliseconds
    pub convert_time_ms: u64,
}

impl ConversionStats {
    fn count_records(&mut self, document: &CanonicalDocument) {
        self.branch_count = document.branches.len();
        self.resource_count = document.resources.len();
        self.comment_count = document.comments.len();
        self.user_count = document.users.len();
        self.thumbnail_count = document.thumbnails.len();
        self.info_count = document.info.len();
    }

    fn record_skip(&mut self, error: &ConverterError) {
        self.documents_skipped += 1;
        self.document_errors.push(error.to_string());
    }
}

/// Forms built from a canonical document.
#[derive(Debug, Default)]
pub struct FormSet {
    pub forms: Vec<NamedTree>,
    /// Names of screens left out by [`ConverterOptions::skip_name_patterns`]
    pub filtered: Vec<String>,
    /// Screens whose mockup could not be read
    pub errors: Vec<ConverterError>,
}

/// Extract and normalize a store.
pub fn read_store(store_path: impl AsRef<Path>) -> Result<Normalized> {
    let raw = extractor::extract(store_path)?;
    Ok(Normalizer::new().normalize(&raw))
}

/// Build one form per mockup screen in `document`, in resource order.
///
/// Resources without a mockup are ignored. Screens are filtered by name
/// before they are built; a screen whose mockup is malformed is reported in
/// [`FormSet::errors`] and the rest are still built.
pub fn build_forms(document: &CanonicalDocument, options: &ConverterOptions) -> FormSet {
    let builder = WidgetTreeBuilder::with_form_name(options.default_form_name.as_str());
    let mut set = FormSet::default();

    for resource in &document.resources {
        let parsed = match resource.mockup() {
            Some(parsed) => parsed,
            None => {
                log::debug!("Resource {} has no mockup, skipping", resource.id);
                continue;
            }
        };
        let name = if resource.name().is_empty() {
            resource.id.clone()
        } else {
            resource.name().to_string()
        };
        if options.is_skipped_document(&name) {
            log::warn!("Leaving out scratch document '{}'", name);
            set.filtered.push(name);
            continue;
        }
        match parsed {
            Ok(mockup) => {
                let tree = builder.build(&mockup);
                set.forms.push(NamedTree { name, tree });
            }
            Err(e) => {
                let error = ConverterError::document(name, e.to_string());
                log::warn!("{}", error);
                set.errors.push(error);
            }
        }
    }
    set
}

/// Store to markup with default options
pub fn convert_store_to_markup(
    store_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
) -> Result<ConversionStats> {
    convert_store_to_markup_with_options(store_path, output_dir, &ConverterOptions::default())
}

/// Store to markup: one file per mockup screen in `output_dir`.
pub fn convert_store_to_markup_with_options(
    store_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    options: &ConverterOptions,
) -> Result<ConversionStats> {
    let start_time = Instant::now();
    let store_path = store_path.as_ref();
    if options.debug_mode {
        log::info!("{} v{}", NAME, VERSION);
        log::info!("Converting '{}' to markup in '{}'", store_path.display(), output_dir.as_ref().display());
        log::debug!("Converter options: {:?}", options);
    }

    let normalized = read_store(store_path)?;
    let mut stats = ConversionStats::default();
    stats.record_errors = normalized.errors.iter().map(ToString::to_string).collect();

    markup_from_document(&normalized.document, output_dir.as_ref(), options, &mut stats)?;
    stats.convert_time_ms = start_time.elapsed().as_millis() as u64;
    Ok(stats)
}

/// Store to canonical document file.
pub fn convert_store_to_document(
    store_path: impl AsRef<Path>,
    document_path: impl AsRef<Path>,
    options: &ConverterOptions,
) -> Result<ConversionStats> {
    let start_time = Instant::now();
    if options.debug_mode {
        log::info!("Converting '{}' to '{}'", store_path.as_ref().display(), document_path.as_ref().display());
    }

    let normalized = read_store(store_path)?;
    save_document(&normalized.document, document_path)?;

    let mut stats = ConversionStats::default();
    stats.count_records(&normalized.document);
    stats.record_errors = normalized.errors.iter().map(ToString::to_string).collect();
    stats.convert_time_ms = start_time.elapsed().as_millis() as u64;
    Ok(stats)
}

/// Canonical document file to store (insert-or-update).
pub fn convert_document_to_store(
    document_path: impl AsRef<Path>,
    store_path: impl AsRef<Path>,
    options: &ConverterOptions,
) -> Result<ConversionStats> {
    let start_time = Instant::now();
    if options.debug_mode {
        log::info!("Upserting '{}' into '{}'", document_path.as_ref().display(), store_path.as_ref().display());
    }

    let document = load_document(document_path)?;
    let upserted = store_upsert(&document, store_path)?;
    log::debug!("Upsert breakdown: {:?}", upserted);

    let mut stats = ConversionStats::default();
    stats.count_records(&document);
    stats.convert_time_ms = start_time.elapsed().as_millis() as u64;
    Ok(stats)
}

/// Canonical document file to markup.
pub fn convert_document_to_markup(
    document_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    options: &ConverterOptions,
) -> Result<ConversionStats> {
    let start_time = Instant::now();
    let document = load_document(document_path)?;
    let mut stats = ConversionStats::default();
    markup_from_document(&document, output_dir.as_ref(), options, &mut stats)?;
    stats.convert_time_ms = start_time.elapsed().as_millis() as u64;
    Ok(stats)
}

fn markup_from_document(
    document: &CanonicalDocument,
    output_dir: &Path,
    options: &ConverterOptions,
    stats: &mut ConversionStats,
) -> Result<()> {
    stats.count_records(document);

    let set = build_forms(document, options);
    stats.documents_built = set.forms.len();
    stats.documents_filtered = set.filtered.len();
    stats.filtered_documents = set.filtered.clone();
    for error in &set.errors {
        stats.record_skip(error);
    }

    let report = export_forms(&set.forms, output_dir, &options.markup_extension)?;
    stats.documents_written = report.written.len();
    for error in &report.skipped {
        stats.record_skip(error);
    }

    if options.debug_mode {
        log::info!(
            "Built {} forms, wrote {}, filtered {}, skipped {}",
            stats.documents_built,
            stats.documents_written,
            stats.documents_filtered,
            stats.documents_skipped
        );
    }
    Ok(())
}
