// FILE: src/cli/handlers.rs
use crate::{
    cli::OutputFormat, // Import from the `cli` module
    convert_document_to_markup, convert_document_to_store, convert_store_to_document,
    convert_store_to_markup_with_options, read_store, ConversionStats, ConverterError,
    ConverterOptions, Result,
};

use serde::Serialize;
use std::path::{Path, PathBuf};

// --- TO-UI ---
pub fn handle_to_ui_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = required(matches, "input")?;
    let options = cli.build_converter_options(matches);
    let output_dir = matches
        .get_one::<String>("output")
        .map(String::as_str)
        .or_else(|| cli.output_directory())
        .map(PathBuf::from);

    if Path::new(input_path).is_dir() {
        if !matches.get_flag("recursive") {
            return Err(ConverterError::InvalidFormat {
                message: format!("'{}' is a directory; pass --recursive to convert every store in it", input_path),
            });
        }
        convert_directory_recursive(input_path, output_dir.as_deref(), &options, matches)
    } else {
        let output_dir = output_dir.unwrap_or_else(|| parent_dir(Path::new(input_path)));
        convert_single_store(Path::new(input_path), &output_dir, &options, matches)
    }
}

fn convert_single_store(
    input_path: &Path,
    output_dir: &Path,
    options: &ConverterOptions,
    matches: &clap::ArgMatches,
) -> Result<()> {
    println!("🔨 Converting {} -> {}", input_path.display(), output_dir.display());

    let stats = convert_store_to_markup_with_options(input_path, output_dir, options)?;

    println!("✅ Conversion finished");
    println!("   Forms written: {}", stats.documents_written);
    println!("   Time: {}ms", stats.convert_time_ms);
    print_problems(&stats);

    if matches.get_flag("stats") {
        print_detailed_stats(&stats);
    }
    Ok(())
}

fn convert_directory_recursive(
    dir_path: &str,
    output_dir: Option<&Path>,
    options: &ConverterOptions,
    matches: &clap::ArgMatches,
) -> Result<()> {
    let mut total_stores = 0;
    let mut failed_stores = 0;

    for entry in walkdir::WalkDir::new(dir_path) {
        let entry = entry.map_err(|e| {
            ConverterError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Directory traversal error: {}", e),
            ))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().map_or(false, |ext| ext == "bmpr") {
            total_stores += 1;
            let target = output_dir
                .map(Path::to_path_buf)
                .unwrap_or_else(|| parent_dir(entry.path()));
            // One broken store does not stop the batch.
            if let Err(e) = convert_single_store(entry.path(), &target, options, matches) {
                eprintln!("❌ {} - {}", entry.path().display(), e);
                failed_stores += 1;
            }
        }
    }

    println!("\n📊 Batch Summary:");
    println!("   Total stores: {}", total_stores);
    println!("   Stores with errors: {}", failed_stores);

    if failed_stores > 0 {
        Err(ConverterError::InvalidFormat {
            message: format!("{} of {} stores failed to convert", failed_stores, total_stores),
        })
    } else {
        Ok(())
    }
}

// --- TO-JSON ---
pub fn handle_to_json_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = required(matches, "input")?;
    let output_path = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(input_path).with_extension("json"));
    let options = cli.build_converter_options(matches);

    println!("🔨 Converting {} -> {}", input_path, output_path.display());
    let stats = convert_store_to_document(input_path, &output_path, &options)?;
    println!("✅ Document written ({} resources)", stats.resource_count);
    print_problems(&stats);

    if matches.get_flag("stats") {
        print_detailed_stats(&stats);
    }
    Ok(())
}

// --- FROM-JSON ---
pub fn handle_from_json_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = required(matches, "input")?;
    let store_path = required(matches, "store")?;
    let options = cli.build_converter_options(matches);

    println!("🔨 Upserting {} -> {}", input_path, store_path);
    let stats = convert_document_to_store(input_path, store_path, &options)?;
    println!("✅ Store updated ({} resources)", stats.resource_count);

    if matches.get_flag("stats") {
        print_detailed_stats(&stats);
    }
    Ok(())
}

// --- JSON-TO-UI ---
pub fn handle_json_to_ui_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = required(matches, "input")?;
    let output_dir = matches
        .get_one::<String>("output")
        .map(String::as_str)
        .or_else(|| cli.output_directory())
        .map(PathBuf::from)
        .unwrap_or_else(|| parent_dir(Path::new(input_path)));
    let options = cli.build_converter_options(matches);

    println!("🔨 Converting {} -> {}", input_path, output_dir.display());
    let stats = convert_document_to_markup(input_path, &output_dir, &options)?;
    println!("✅ Conversion finished");
    println!("   Forms written: {}", stats.documents_written);
    print_problems(&stats);

    if matches.get_flag("stats") {
        print_detailed_stats(&stats);
    }
    Ok(())
}

// --- INSPECT ---
#[derive(Debug, Serialize)]
struct InspectReport {
    store: String,
    branches: usize,
    resources: usize,
    comments: usize,
    users: usize,
    thumbnails: usize,
    info: serde_json::Map<String, serde_json::Value>,
    screens: Vec<ScreenSummary>,
    record_errors: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ScreenSummary {
    id: String,
    name: String,
    controls: Option<usize>,
    skipped: bool,
}

pub fn handle_inspect_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = required(matches, "input")?;
    let output_path = matches.get_one::<String>("output");
    let format = matches
        .get_one::<OutputFormat>("format")
        .cloned()
        .unwrap_or(OutputFormat::Debug);
    let options = cli.build_converter_options(matches);

    println!("🔬 Inspecting {}", input_path);
    let normalized = read_store(input_path)?;
    let document = &normalized.document;

    let screens = document
        .resources
        .iter()
        .filter_map(|resource| {
            let mockup = resource.mockup()?;
            Some(ScreenSummary {
                id: resource.id.clone(),
                name: resource.name().to_string(),
                controls: mockup.ok().map(|m| m.mockup.controls.len()),
                skipped: options.is_skipped_document(resource.name()),
            })
        })
        .collect();

    let report = InspectReport {
        store: input_path.to_string(),
        branches: document.branches.len(),
        resources: document.resources.len(),
        comments: document.comments.len(),
        users: document.users.len(),
        thumbnails: document.thumbnails.len(),
        info: document.info.clone(),
        screens,
        record_errors: normalized.errors.iter().map(ToString::to_string).collect(),
    };

    let analysis = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report).map_err(|e| {
            ConverterError::InvalidFormat {
                message: format!("JSON serialization error: {}", e),
            }
        })?,
        OutputFormat::Debug => format_report(&report),
    };
    if let Some(output_file) = output_path {
        std::fs::write(output_file, analysis)?;
        println!("✅ Report saved to {}", output_file);
    } else {
        println!("{}", analysis);
    }
    Ok(())
}

fn format_report(report: &InspectReport) -> String {
    let mut text = format!("Store: {}\n\n", report.store);
    text.push_str(&format!(
        "Records: {} branches, {} resources, {} comments, {} users, {} thumbnails\n",
        report.branches, report.resources, report.comments, report.users, report.thumbnails
    ));
    for (name, value) in &report.info {
        text.push_str(&format!("  {} = {}\n", name, value));
    }
    text.push_str(&format!("\nScreens ({}):\n", report.screens.len()));
    for screen in &report.screens {
        let controls = screen
            .controls
            .map(|n| format!("{} controls", n))
            .unwrap_or_else(|| "malformed mockup".to_string());
        let marker = if screen.skipped { " (skipped)" } else { "" };
        text.push_str(&format!("  [{}] {} - {}{}\n", screen.id, screen.name, controls, marker));
    }
    if !report.record_errors.is_empty() {
        text.push_str(&format!("\nRecord errors ({}):\n", report.record_errors.len()));
        for error in &report.record_errors {
            text.push_str(&format!("  {}\n", error));
        }
    }
    text
}

// --- HELPERS ---
fn required<'a>(matches: &'a clap::ArgMatches, id: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .ok_or_else(|| ConverterError::InvalidFormat {
            message: format!("Missing required argument '{}'", id),
        })
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn print_problems(stats: &ConversionStats) {
    for name in &stats.filtered_documents {
        println!("   ⏭️  Left out scratch document '{}'", name);
    }
    for error in &stats.record_errors {
        println!("   ⚠️  {}", error);
    }
    for error in &stats.document_errors {
        println!("   ⚠️  {}", error);
    }
}

fn print_detailed_stats(stats: &ConversionStats) {
    println!("\n📊 Detailed Conversion Statistics:");
    println!("   Convert time: {}ms", stats.convert_time_ms);
    println!("\n   Record breakdown:");
    println!("     Branches: {}", stats.branch_count);
    println!("     Resources: {}", stats.resource_count);
    println!("     Comments: {}", stats.comment_count);
    println!("     Users: {}", stats.user_count);
    println!("     Thumbnails: {}", stats.thumbnail_count);
    println!("     Info entries: {}", stats.info_count);
    println!("     Undecodable records: {}", stats.record_errors.len());
    if stats.documents_built > 0 || stats.documents_filtered > 0 || stats.documents_skipped > 0 {
        println!("\n   Form breakdown:");
        println!("     Built: {}", stats.documents_built);
        println!("     Written: {}", stats.documents_written);
        println!("     Filtered: {}", stats.documents_filtered);
        println!("     Skipped: {}", stats.documents_skipped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::EnhancedCli;
    use crate::persistence::ensure_schema;
    use rusqlite::{params, Connection};
    use std::fs;
    use tempfile::TempDir;

    fn write_fixture_store(path: &Path) {
        let conn = Connection::open(path).unwrap();
        ensure_schema(&conn).unwrap();
        let data = serde_json::json!({"mockup": {
            "attributes": {"name": "Login"},
            "controls": {"control": [{"ID": "1", "typeID": "Button", "measuredW": "80", "measuredH": "24"}]},
            "mockupW": "200", "mockupH": "100"
        }});
        conn.execute(
            "INSERT INTO RESOURCES (ID, BRANCHID, ATTRIBUTES, DATA) VALUES (?1, ?2, ?3, ?4)",
            params!["r1", "Master", r#"{"name":"Login"}"#, data.to_string()],
        )
        .unwrap();
    }

    #[test]
    fn test_recursive_batch_continues_past_broken_store() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("good")).unwrap();
        fs::create_dir_all(dir.path().join("bad")).unwrap();
        write_fixture_store(&dir.path().join("good").join("project.bmpr"));
        fs::write(
            dir.path().join("bad").join("broken.bmpr"),
            b"this is certainly not an sqlite database file at all",
        )
        .unwrap();

        let cli = EnhancedCli::new();
        let root = dir.path().to_str().unwrap();
        let matches = cli
            .build_cli()
            .get_matches_from(["wirec", "to-ui", root, "-r"]);
        let (_, sub_matches) = matches.subcommand().unwrap();

        let result = handle_to_ui_command(&cli, sub_matches);
        assert!(matches!(result, Err(ConverterError::InvalidFormat { .. })));
        assert!(dir.path().join("good").join("Login.ui").exists());
        assert!(!dir.path().join("bad").join("Login.ui").exists());
    }

    #[test]
    fn test_directory_without_recursive_flag_is_rejected() {
        let dir = TempDir::new().unwrap();
        let cli = EnhancedCli::new();
        let matches = cli
            .build_cli()
            .get_matches_from(["wirec", "to-ui", dir.path().to_str().unwrap()]);
        let (_, sub_matches) = matches.subcommand().unwrap();
        assert!(matches!(
            handle_to_ui_command(&cli, sub_matches),
            Err(ConverterError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir(Path::new("project.bmpr")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("a/b/project.bmpr")), PathBuf::from("a/b"));
    }

    #[test]
    fn test_format_report_marks_skipped_screens() {
        let report = InspectReport {
            store: "p.bmpr".to_string(),
            branches: 1,
            resources: 2,
            comments: 0,
            users: 0,
            thumbnails: 0,
            info: serde_json::Map::new(),
            screens: vec![
                ScreenSummary { id: "r1".into(), name: "Login".into(), controls: Some(3), skipped: false },
                ScreenSummary { id: "r2".into(), name: "New Wireframe 1".into(), controls: None, skipped: true },
            ],
            record_errors: vec![],
        };
        let text = format_report(&report);
        assert!(text.contains("[r1] Login - 3 controls\n"));
        assert!(text.contains("[r2] New Wireframe 1 - malformed mockup (skipped)\n"));
        assert!(!text.contains("Record errors"));
    }
}
