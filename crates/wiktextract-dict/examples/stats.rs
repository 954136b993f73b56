use std::path::PathBuf;

use anyhow::{Context, Result};
use wiktextract_dict::Dictionary;

fn main() -> Result<()> {
    let dump = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: cargo run -p wiktextract-dict --example stats -- <dump.jsonl>")?;

    let dict = Dictionary::build_from_file(&dump)
        .with_context(|| format!("building dictionary from {}", dump.display()))?;
    let stats = dict.stats();

    println!("Dump: {}", dump.display());
    println!("Lines read     : {}", stats.lines);
    println!("Malformed lines: {}", stats.malformed);
    println!("Empty records  : {}", stats.empty_records);
    println!("Base entries   : {}", stats.base_entries);
    println!("Forms collected: {}", stats.forms_collected);
    println!("Form entries   : {}", stats.form_entries);
    println!("Total entries  : {}", dict.len());

    let with_gender = dict
        .entries()
        .values()
        .filter(|e| e.gender.is_some())
        .count();
    let redirects = dict.entries().values().filter(|e| e.is_form()).count();
    println!("With gender    : {with_gender}");
    println!("Redirects      : {redirects}");

    Ok(())
}
