//! Widget-tree markup output
//!
//! Forms are written as `.ui` XML: a `<ui version="4.0">` root holding the
//! form `<class>` and one nested `<widget>` element per node.

use crate::error::{ConverterError, Result};
use crate::types::*;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Serialize one form to markup text.
pub fn write_markup(tree: &WidgetTree) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!("<ui version=\"{}\">\n", UI_FORMAT_VERSION));

    let mut builder = MarkupBuilder {
        out: &mut out,
        indent: 1,
    };
    builder.line(&format!("<class>{}</class>", escape_xml(&tree.form_class)));
    builder.widget(&tree.root);
    builder.line("<resources/>");
    builder.line("<connections/>");

    out.push_str("</ui>\n");
    out
}

struct MarkupBuilder<'a> {
    out: &'a mut String,
    indent: usize,
}

impl<'a> MarkupBuilder<'a> {
    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push(' ');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn open(&mut self, tag: &str) {
        self.line(tag);
        self.indent += 1;
    }

    fn close(&mut self, tag: &str) {
        self.indent -= 1;
        self.line(tag);
    }

    fn widget(&mut self, node: &WidgetNode) {
        self.open(&format!(
            "<widget class=\"{}\" name=\"{}\">",
            escape_xml(&node.class),
            escape_xml(&node.name)
        ));

        self.open("<property name=\"geometry\">");
        self.open("<rect>");
        let g = &node.geometry;
        self.line(&format!("<x>{}</x>", escape_xml(&g.x)));
        self.line(&format!("<y>{}</y>", escape_xml(&g.y)));
        self.line(&format!("<width>{}</width>", escape_xml(&g.width)));
        self.line(&format!("<height>{}</height>", escape_xml(&g.height)));
        self.close("</rect>");
        self.close("</property>");

        if let Some(title) = &node.window_title {
            self.string_property("windowTitle", title);
        }
        if let Some(orientation) = node.orientation {
            self.open("<property name=\"orientation\">");
            self.line(&format!("<enum>{}</enum>", orientation.as_enum()));
            self.close("</property>");
        }
        if let Some(text) = &node.text {
            self.string_property("text", text);
        }

        for child in &node.children {
            self.widget(child);
        }
        self.close("</widget>");
    }

    fn string_property(&mut self, name: &str, value: &str) {
        self.open(&format!("<property name=\"{}\">", name));
        self.line(&format!("<string>{}</string>", escape_xml(value)));
        self.close("</property>");
    }
}

pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\n' | '\t' | '\r' => escaped.push(ch),
            c if (c as u32) < 0x20 => {}
            c => escaped.push(c),
        }
    }
    escaped
}

/// Turn a document name into a file stem: path separators and characters
/// most filesystems reject become `_`.
pub fn file_stem_for(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        DEFAULT_FORM_NAME.to_string()
    } else {
        stem
    }
}

/// Result of writing a set of forms to a directory.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    /// Forms that were not written. `WriteConflict` for existing files.
    pub skipped: Vec<ConverterError>,
}

/// Write one `<name>.<extension>` file per form into `target_dir`.
///
/// Existing files are never replaced: the form is skipped and the conflict
/// is recorded in the report. A second form with the same file name in one
/// call is reported as a duplicate `Document` error. A failure on one file
/// does not stop the rest.
pub fn export_forms(forms: &[NamedTree], target_dir: &Path, extension: &str) -> Result<ExportReport> {
    fs::create_dir_all(target_dir)?;
    let mut report = ExportReport::default();
    let mut claimed: HashSet<PathBuf> = HashSet::new();

    for form in forms {
        let path = target_dir.join(format!("{}.{}", file_stem_for(&form.name), extension));
        if !claimed.insert(path.clone()) {
            let error = ConverterError::document(
                form.name.as_str(),
                format!("duplicate document name, {} is already used in this run", path.display()),
            );
            log::warn!("Skipped form '{}': {}", form.name, error);
            report.skipped.push(error);
            continue;
        }
        match write_new_file(&path, write_markup(&form.tree).as_bytes()) {
            Ok(()) => {
                log::info!("Wrote form '{}' to {}", form.name, path.display());
                report.written.push(path);
            }
            Err(e) => {
                log::warn!("Skipped form '{}': {}", form.name, e);
                report.skipped.push(e);
            }
        }
    }
    Ok(report)
}

fn write_new_file(path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(ConverterError::write_conflict(path.display().to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    file.write_all(contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget_tree::WidgetTreeBuilder;
    use tempfile::TempDir;

    fn sample_tree() -> WidgetTree {
        let doc: MockupDocument = serde_json::from_value(serde_json::json!({
            "mockup": {
                "attributes": {"name": "Sign in"},
                "controls": {"control": [
                    {"ID": "1", "typeID": "HSlider", "x": "10", "y": "20", "w": "100", "measuredH": "21"},
                    {"ID": "2", "typeID": "Button", "x": "0", "y": "0", "measuredW": "80",
                     "measuredH": "24", "properties": {"text": "Save & <close>"}}
                ]},
                "mockupW": "400",
                "mockupH": "300"
            }
        }))
        .unwrap();
        WidgetTreeBuilder::new().build(&doc)
    }

    #[test]
    fn test_markup_structure() {
        let xml = write_markup(&sample_tree());
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<ui version=\"4.0\">\n"));
        assert!(xml.contains(" <class>Form</class>\n"));
        assert!(xml.contains(" <widget class=\"QWidget\" name=\"Form\">\n"));
        assert!(xml.contains("<width>400</width>"));
        assert!(xml.contains("<string>Sign in</string>"));
        assert!(xml.contains("<widget class=\"QSlider\" name=\"HSlider_1\">"));
        assert!(xml.contains("<enum>Qt::Horizontal</enum>"));
        assert!(xml.contains("<string>Save &amp; &lt;close&gt;</string>"));
        assert!(xml.trim_end().ends_with("</ui>"));

        // The slider comes before the button, as in the control list.
        let slider = xml.find("HSlider_1").unwrap();
        let button = xml.find("Button_2").unwrap();
        assert!(slider < button);
        assert_eq!(xml.matches("<widget ").count(), xml.matches("</widget>").count());
    }

    #[test]
    fn test_file_stem_sanitizing() {
        assert_eq!(file_stem_for("Login"), "Login");
        assert_eq!(file_stem_for("Home/Settings"), "Home_Settings");
        assert_eq!(file_stem_for("  "), DEFAULT_FORM_NAME);
        assert_eq!(file_stem_for(".."), DEFAULT_FORM_NAME);
        assert_eq!(file_stem_for("Главная"), "Главная");
    }

    #[test]
    fn test_export_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let forms = vec![
            NamedTree { name: "Login".to_string(), tree: sample_tree() },
            NamedTree { name: "Main".to_string(), tree: sample_tree() },
        ];
        fs::write(dir.path().join("Main.ui"), "keep me").unwrap();

        let report = export_forms(&forms, dir.path(), MARKUP_EXTENSION).unwrap();
        assert_eq!(report.written, vec![dir.path().join("Login.ui")]);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(report.skipped[0], ConverterError::WriteConflict { .. }));
        assert_eq!(fs::read_to_string(dir.path().join("Main.ui")).unwrap(), "keep me");

        let again = export_forms(&forms, dir.path(), MARKUP_EXTENSION).unwrap();
        assert!(again.written.is_empty());
        assert_eq!(again.skipped.len(), 2);
    }

    #[test]
    fn test_duplicate_names_in_one_run() {
        let dir = TempDir::new().unwrap();
        let forms = vec![
            NamedTree { name: "Home".to_string(), tree: sample_tree() },
            NamedTree { name: "Home".to_string(), tree: sample_tree() },
        ];
        let report = export_forms(&forms, dir.path(), MARKUP_EXTENSION).unwrap();
        assert_eq!(report.written, vec![dir.path().join("Home.ui")]);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(&report.skipped[0], ConverterError::Document { name, .. } if name == "Home"));
        assert!(!report.skipped[0].to_string().contains("overwrite"));
    }

    #[test]
    fn test_export_creates_target_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("ui");
        let forms = vec![NamedTree { name: "Only".to_string(), tree: sample_tree() }];
        let report = export_forms(&forms, &target, "ui").unwrap();
        assert_eq!(report.written.len(), 1);
        let xml = fs::read_to_string(target.join("Only.ui")).unwrap();
        assert_eq!(xml, write_markup(&forms[0].tree));
    }
}
