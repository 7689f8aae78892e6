use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde_json::json;
use similar::{ChangeTag, TextDiff};
use xwikifs_model::{
    reformat, DirectoryAssembler, DocumentModel, DocumentReference, Layout, ReformatMode,
    ReformatReport, TracingObserver,
};
use xwikifs_refmap::{RefMap, ValueRef};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let layout = load_layout(cli.config.as_deref())?;
    match cli.command {
        Command::Check(_) => cmd_check(&cli.root, layout, cli.format),
        Command::Show(args) => cmd_show(&cli.root, layout, cli.format, args),
        Command::Reformat(args) => cmd_reformat(&cli.root, &layout, cli.format, args),
    }
}

fn load_layout(config: Option<&Path>) -> anyhow::Result<Layout> {
    match config {
        Some(path) => Layout::from_toml_file(path)
            .with_context(|| format!("loading layout from {}", path.display())),
        None => Ok(Layout::default()),
    }
}

fn assembler(root: &Path, layout: Layout) -> anyhow::Result<DirectoryAssembler> {
    Ok(DirectoryAssembler::new(root)
        .with_context(|| format!("opening wiki root {}", root.display()))?
        .with_layout(layout)
        .with_observer(Arc::new(TracingObserver)))
}

fn cmd_check(root: &Path, layout: Layout, format: OutputFormat) -> anyhow::Result<()> {
    let documents = assembler(root, layout)?
        .assemble()
        .with_context(|| format!("assembling {}", root.display()))?;
    let objects: usize = documents.iter().map(|d| d.objects().len()).sum();
    let attachments: usize = documents.iter().map(|d| d.attachments().len()).sum();
    let classes = documents.iter().filter(|d| d.class().is_some()).count();

    match format {
        OutputFormat::Json => {
            let summary = json!({
                "root": root,
                "documents": documents.len(),
                "classes": classes,
                "objects": objects,
                "attachments": attachments,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text => {
            println!(
                "{} {} documents loaded from {}",
                "✓".green().bold(),
                documents.len().to_string().bold(),
                root.display()
            );
            println!("  Classes: {classes}");
            println!("  Objects: {objects}");
            println!("  Attachments: {attachments}");
        }
    }
    Ok(())
}

fn cmd_show(
    root: &Path,
    layout: Layout,
    format: OutputFormat,
    args: ShowArgs,
) -> anyhow::Result<()> {
    let reference: DocumentReference = args
        .document
        .parse()
        .with_context(|| format!("invalid document name {:?}", args.document))?;
    let document = assembler(root, layout)?
        .load_document(&reference)
        .with_context(|| format!("loading {reference}"))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&document_json(&document))?);
        }
        OutputFormat::Text => print_document(&document, args.content),
    }
    Ok(())
}

fn cmd_reformat(
    root: &Path,
    layout: &Layout,
    format: OutputFormat,
    args: ReformatArgs,
) -> anyhow::Result<()> {
    let mode = if args.check { ReformatMode::Check } else { ReformatMode::Write };
    let report = reformat(root, layout, mode)
        .with_context(|| format!("reformatting {}", root.display()))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_reformat(&report, mode, args.diff),
    }

    if mode == ReformatMode::Check && !report.is_clean() {
        bail!("{} file(s) are not in canonical form", report.changed.len());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn print_document(document: &DocumentModel, content: bool) {
    println!("{} {}", "Document".bold(), document.reference().to_string().yellow().bold());
    println!("  Directory: {}", document.directory().display());
    println!("  Modified: {}", format_timestamp(document.last_modified()));

    if !document.data().is_empty() {
        println!("\n{}", "Data".bold());
        print_map(document.data(), 1, content);
    }

    if let Some(class) = document.class() {
        println!("\n{}", "Class".bold());
        for (name, definition) in class.properties() {
            let pretty = definition.get_str("prettyName").unwrap_or(name);
            println!("  {} ({})", name.cyan(), pretty);
        }
    }

    if !document.objects().is_empty() {
        println!("\n{}", "Objects".bold());
        for object in document.objects() {
            println!("  {}", object.reference().to_string().cyan());
            print_map(object.properties(), 2, content);
        }
    }

    if !document.attachments().is_empty() {
        println!("\n{}", "Attachments".bold());
        for attachment in document.attachments() {
            let size = attachment
                .size()
                .map(|s| format!("{s} bytes"))
                .unwrap_or_else(|e| format!("unreadable: {e}").red().to_string());
            println!("  {} ({size})", attachment.file_name());
        }
    }
}

fn print_map(map: &RefMap, depth: usize, content: bool) {
    let indent = "  ".repeat(depth);
    for (key, value) in map.iter() {
        if let Some(marker) = map.marker(key) {
            let text = value.as_str().unwrap_or_default();
            if content {
                println!("{indent}{key}: {}", marker.id().dimmed());
                for line in text.lines() {
                    println!("{indent}  | {line}");
                }
            } else {
                println!("{indent}{key}: {} ({} bytes)", marker.id().dimmed(), text.len());
            }
            continue;
        }
        match value {
            ValueRef::Nested(nested) => {
                println!("{indent}{key}:");
                print_map(nested, depth + 1, content);
            }
            other => {
                let text = other.to_canonical_string().unwrap_or_else(|| "~".into());
                println!("{indent}{key}: {text}");
            }
        }
    }
}

fn print_reformat(report: &ReformatReport, mode: ReformatMode, diff: bool) {
    let verb = match mode {
        ReformatMode::Write => "reformatted",
        ReformatMode::Check => "would reformat",
    };
    for file in &report.changed {
        println!("  {} {}", format!("{verb}:").yellow(), file.path.display());
        if diff {
            for line in render_diff(&file.original, &file.canonical) {
                println!("{line}");
            }
        }
    }
    if report.is_clean() {
        println!(
            "{} {} files already canonical",
            "✓".green().bold(),
            report.examined.len()
        );
    } else {
        println!(
            "{} of {} files {}",
            report.changed.len().to_string().bold(),
            report.examined.len(),
            verb
        );
    }
}

/// Unified-style diff lines, three lines of context per hunk.
fn render_diff(original: &str, canonical: &str) -> Vec<String> {
    let diff = TextDiff::from_lines(original, canonical);
    let mut out = Vec::new();
    for hunk in diff.grouped_ops(3) {
        if let (Some(first), Some(last)) = (hunk.first(), hunk.last()) {
            let old = first.old_range().start..last.old_range().end;
            let new = first.new_range().start..last.new_range().end;
            out.push(
                format!("@@ -{},{} +{},{} @@", old.start + 1, old.len(), new.start + 1, new.len())
                    .cyan()
                    .to_string(),
            );
        }
        for op in &hunk {
            for change in diff.iter_changes(op) {
                let text = change.value().trim_end_matches('\n');
                let line = match change.tag() {
                    ChangeTag::Equal => format!(" {text}"),
                    ChangeTag::Delete => format!("-{text}").red().to_string(),
                    ChangeTag::Insert => format!("+{text}").green().to_string(),
                };
                out.push(line);
            }
        }
    }
    out
}

fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn document_json(document: &DocumentModel) -> serde_json::Value {
    let objects: Vec<serde_json::Value> = document
        .objects()
        .iter()
        .map(|object| {
            json!({
                "class": object.class_name(),
                "number": object.number(),
                "properties": object.properties().to_resolved_value(),
            })
        })
        .collect();
    let attachments: Vec<serde_json::Value> = document
        .attachments()
        .iter()
        .map(|attachment| {
            json!({
                "name": attachment.file_name(),
                "size": attachment.size().ok(),
            })
        })
        .collect();
    let class = document.class().map(|class| {
        json!({
            "name": class.name(),
            "properties": class.properties().map(|(name, _)| name).collect::<Vec<_>>(),
        })
    });

    json!({
        "reference": document.reference(),
        "space": document.space(),
        "name": document.name(),
        "modified": DateTime::<Utc>::from(document.last_modified()).to_rfc3339(),
        "data": document.data().to_resolved_value(),
        "class": class,
        "objects": objects,
        "attachments": attachments,
    })
}
