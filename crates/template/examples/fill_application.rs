//! Fill a template from the command line
//! Run with: cargo run --example fill_application -- <template.pdf> <template_name> <data.json> <output.pdf> [mapping_dir] [font.ttf]
//!
//! Uses the saved mapping in `mapping_dir` (a FileStore directory) when one
//! exists for the template, otherwise the built-in registry.

use mapping::{FileStore, MappingStore};
use pdf_core::FontData;
use std::fs;
use template::{ApplicationData, AutoFiller, Registry};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 4 {
        eprintln!(
            "usage: fill_application <template.pdf> <template_name> <data.json> <output.pdf> [mapping_dir] [font.ttf]"
        );
        std::process::exit(2);
    }

    let template_bytes = fs::read(&args[0])?;
    let template_name = &args[1];
    let data = ApplicationData::from_json(&fs::read_to_string(&args[2])?)?;
    let mapping_dir = args.get(4).map(String::as_str).unwrap_or("mappings");

    let store = MappingStore::new(FileStore::new(mapping_dir)?);
    let mut filler = AutoFiller::new(store, Registry::builtin()?);
    if let Some(font_path) = args.get(5) {
        filler = filler.with_font(FontData::from_ttf("AppFont", &fs::read(font_path)?)?);
    }

    let filled = filler.fill(&template_bytes, template_name, &data)?;
    fs::write(&args[3], &filled.bytes)?;

    println!(
        "{} -> {} ({:?} mapping, {} filled, {} skipped)",
        args[0],
        args[3],
        filled.source,
        filled.filled.len(),
        filled.skipped.len()
    );
    for error in &filled.errors {
        println!("  warning: {error}");
    }

    Ok(())
}
