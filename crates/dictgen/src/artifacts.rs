use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;
use wiktextract_dict::Dictionary;
use wiktextract_types::{Entry, Pos};

const MAX_DEF_LEN: usize = 60;
const MAX_KEY_LEN: usize = 30;

fn obscure(pos: &Pos) -> bool {
    matches!(pos, Pos::Name | Pos::Suffix | Pos::Prefix)
}

/// Size-trimmed projection for bundling: obscure categories and unwieldy
/// keys are dropped, every definition is truncated for display.
pub fn bundled(dict: &Dictionary) -> BTreeMap<&str, Entry> {
    let mut out = BTreeMap::new();
    for (word, entry) in dict.entries() {
        if obscure(&entry.pos) || word.contains(' ') || word.chars().count() > MAX_KEY_LEN {
            continue;
        }
        let compact = Entry {
            pos: entry.pos.clone(),
            def: truncate(&entry.def),
            gender: entry.gender,
            defs: entry
                .defs
                .as_ref()
                .filter(|defs| defs.len() > 1)
                .map(|defs| defs.iter().map(|def| truncate(def)).collect()),
            base: entry.base.clone(),
        };
        out.insert(word.as_str(), compact);
    }
    out
}

/// Multi-word phrases (2 to 4 tokens) with a usable primary definition,
/// stripped down to `{pos, def}`.
pub fn phrases(dict: &Dictionary) -> BTreeMap<&str, Entry> {
    let mut out = BTreeMap::new();
    for (word, entry) in dict.entries() {
        let tokens = word.split_whitespace().count();
        if !(2..=4).contains(&tokens) || word.chars().count() > MAX_KEY_LEN {
            continue;
        }
        if obscure(&entry.pos) || entry.def.is_empty() {
            continue;
        }
        let compact = Entry {
            pos: entry.pos.clone(),
            def: truncate(&entry.def),
            gender: None,
            defs: None,
            base: None,
        };
        out.insert(word.as_str(), compact);
    }
    out
}

/// Serialize an artifact to a temp file and rename it into place, so a
/// failed run never leaves a truncated artifact behind.
pub fn write_artifact<T: Serialize>(value: &T, count: usize, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    let mut writer = BufWriter::new(temp.as_file());
    serde_json::to_writer(&mut writer, value)
        .with_context(|| format!("serialize {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    drop(writer);
    temp.persist(path)
        .with_context(|| format!("persist {}", path.display()))?;

    let size = fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    if size >= 1024 * 1024 {
        info!(
            "wrote {count} entries to {} ({:.1} MB)",
            path.display(),
            size as f64 / (1024.0 * 1024.0)
        );
    } else {
        info!(
            "wrote {count} entries to {} ({:.1} KB)",
            path.display(),
            size as f64 / 1024.0
        );
    }
    Ok(())
}

fn truncate(def: &str) -> String {
    if def.chars().count() <= MAX_DEF_LEN {
        return def.to_string();
    }
    let mut cut: String = def.chars().take(MAX_DEF_LEN - 3).collect();
    cut.push_str("...");
    cut
}
