use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde_json::{json, Value};

use vdelta_diff::Differ;
use vdelta_patch::{encode, LiveTree, PatchReader};
use vdelta_types::{Instruction, Node};

use crate::cli::{ApplyArgs, Cli, Command, DiffArgs, DumpArgs, OutputFormat};
use crate::config::CliConfig;
use crate::document::Document;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("resolving working directory")?;
    let config = CliConfig::load(cli.config.as_deref(), &cwd)?;
    let format = cli.format.unwrap_or(config.output.format);
    match cli.command {
        Command::Diff(args) => cmd_diff(args, &config, format),
        Command::Dump(args) => cmd_dump(args, format),
        Command::Apply(args) => cmd_apply(args),
    }
}

fn read_document(path: &Path) -> anyhow::Result<Node> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let doc: Document =
        serde_json::from_str(&text).with_context(|| format!("parsing document {}", path.display()))?;
    Ok(doc.into_node())
}

fn read_patch(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading patch {}", path.display()))
}

fn cmd_diff(args: DiffArgs, config: &CliConfig, format: OutputFormat) -> anyhow::Result<()> {
    let last = read_document(&args.last)?;
    let next = read_document(&args.next)?;
    let log = Differ::new(config.diff.clone()).diff(&last, &next);
    let patch = encode(&log);

    if let Some(out) = &args.output {
        std::fs::write(out, patch.as_bytes()).with_context(|| format!("writing {}", out.display()))?;
    }

    match format {
        OutputFormat::Json => {
            let summary = json!({
                "instructions": log.len(),
                "mutations": log.mutations(),
                "bytes": patch.len(),
                "output": args.output.as_ref().map(|p| p.display().to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text => {
            if log.is_empty() {
                println!("{} Documents are identical.", "✓".green().bold());
            } else {
                println!(
                    "{} {} instructions ({} mutations), {} bytes",
                    "✓".green().bold(),
                    log.len().to_string().bold(),
                    log.mutations(),
                    patch.len().to_string().bold()
                );
            }
            if let Some(out) = &args.output {
                println!("  Patch: {}", out.display().to_string().cyan());
            }
        }
    }
    Ok(())
}

fn cmd_dump(args: DumpArgs, format: OutputFormat) -> anyhow::Result<()> {
    let bytes = read_patch(&args.patch)?;
    let log = PatchReader::new(&bytes)
        .decode()
        .with_context(|| format!("decoding {}", args.patch.display()))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&log)?),
        OutputFormat::Text => {
            println!(
                "Patch {}: {} instructions, {} bytes",
                args.patch.display().to_string().bold(),
                log.len(),
                bytes.len()
            );
            for (i, instruction) in log.iter().enumerate() {
                let name = if instruction.is_navigation() {
                    instruction.name().dimmed()
                } else if instruction.is_reorder() {
                    instruction.name().yellow()
                } else {
                    instruction.name().cyan()
                };
                println!("{:>5}  {} {}", i, name, describe(instruction));
            }
        }
    }
    Ok(())
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let base = read_document(&args.base)?;
    let bytes = read_patch(&args.patch)?;

    let mut tree = LiveTree::render(&base);
    tree.apply_patch(&bytes)
        .with_context(|| format!("applying {} to {}", args.patch.display(), args.base.display()))?;

    let result = Document::from_roots(&tree.snapshot());
    let text = serde_json::to_string_pretty(&result)?;
    match &args.output {
        Some(out) => {
            std::fs::write(out, text).with_context(|| format!("writing {}", out.display()))?;
            eprintln!("{} Wrote {}", "✓".green().bold(), out.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

/// Instruction fields as compact JSON, without the opcode tag.
fn describe(instruction: &Instruction) -> String {
    match serde_json::to_value(instruction) {
        Ok(Value::Object(mut fields)) => {
            fields.remove("op");
            if fields.is_empty() {
                String::new()
            } else {
                Value::Object(fields).to_string()
            }
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdelta_types::Address;

    #[test]
    fn describe_drops_the_tag() {
        assert_eq!(describe(&Instruction::SelectParent), "");
        assert_eq!(
            describe(&Instruction::SelectSibling { offset: -2 }),
            r#"{"offset":-2}"#
        );
        assert_eq!(
            describe(&Instruction::StashNextSibling { address: Address::new(4) }),
            r#"{"address":4}"#
        );
    }

    #[test]
    fn read_document_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = read_document(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }
}
