//! Collapse wiktextract word records into a canonical dictionary.
//!
//! The input is the raw dump format published by kaikki.org: one JSON object
//! per line, each describing a single (word, part-of-speech) record with its
//! senses and inflected forms. Many records share a spelling; this crate
//! folds them into exactly one [`Entry`] per lowercased headword, ranking
//! competing parts of speech by the fixed priority table in
//! [`wiktextract_types::Pos`] and merging definition lists up to
//! [`MAX_DEFS`]. A second pass resolves collected inflected forms against
//! the finished entry table and synthesizes redirect entries for them.
//!
//! Bad input never aborts a build: malformed lines and records without
//! usable definitions are counted in [`BuildStats`] and dropped.
//!
//! # Example
//! ```
//! use wiktextract_dict::DictionaryBuilder;
//!
//! let mut builder = DictionaryBuilder::new();
//! builder.add_line(r#"{"word":"chat","pos":"noun","senses":[{"glosses":["cat"]}]}"#);
//! builder.add_line(r#"{"word":"chat","pos":"verb","senses":[{"glosses":["to chat"]}]}"#);
//! let dict = builder.finish();
//!
//! let entry = dict.get("chat").expect("merged entry");
//! assert_eq!(entry.pos.code(), "n");
//! assert_eq!(entry.def, "cat");
//! ```
//!
//! For a runnable demo, see `cargo run -p wiktextract-dict --example stats -- <dump.jsonl>`.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;
use wiktextract_types::{Entry, Gender, Pos};

/// Hard cap on definitions retained per entry.
pub const MAX_DEFS: usize = 4;

/// Gloss prefixes marking cross-reference senses rather than definitions.
const CROSS_REFERENCE_PREFIXES: [&str; 2] = ["Alternative", "Obsolete spelling"];

const PROGRESS_INTERVAL: usize = 10_000;

/// One line of the dump, decoded. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub pos: String,
    #[serde(default)]
    pub senses: Vec<Sense>,
    #[serde(default)]
    pub forms: Vec<FormRef>,
    #[serde(default)]
    pub head_templates: Vec<HeadTemplate>,
}

/// One meaning of a record, carrying candidate gloss strings.
#[derive(Debug, Deserialize)]
pub struct Sense {
    #[serde(default)]
    pub glosses: Vec<String>,
}

/// An inflected surface form named by the owning record.
#[derive(Debug, Deserialize)]
pub struct FormRef {
    #[serde(default)]
    pub form: String,
}

/// Headword template; only its argument values are inspected, for gender.
#[derive(Debug, Deserialize)]
pub struct HeadTemplate {
    #[serde(default)]
    pub args: BTreeMap<String, serde_json::Value>,
}

/// Counters describing one build pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuildStats {
    /// Input lines seen, including blank and malformed ones.
    pub lines: usize,
    /// Lines that failed to decode or lacked a headword.
    pub malformed: usize,
    /// Records with a headword but no usable definitions.
    pub empty_records: usize,
    /// Entries produced by the merge fold, before form reconciliation.
    pub base_entries: usize,
    /// Distinct inflected forms collected during the fold.
    pub forms_collected: usize,
    /// Redirect entries synthesized during reconciliation.
    pub form_entries: usize,
}

#[derive(Clone, Debug)]
struct FormTarget {
    base: String,
    pos: Pos,
}

/// Accumulates records and produces the final [`Dictionary`].
///
/// Records may arrive in any order; replaying the same stream yields the
/// same result. For competing records of equal part-of-speech priority the
/// first one seen stays representative, so representative selection is
/// stable but order-dependent across *different* orderings of the stream.
#[derive(Debug, Default)]
pub struct DictionaryBuilder {
    entries: BTreeMap<String, Entry>,
    forms: BTreeMap<String, FormTarget>,
    stats: BuildStats,
}

impl DictionaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Feed one raw line of the dump. Never fails; bad lines are counted.
    pub fn add_line(&mut self, line: &str) {
        self.stats.lines += 1;
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        match serde_json::from_str::<RawRecord>(line) {
            Ok(record) => self.add_record(record),
            Err(_) => self.stats.malformed += 1,
        }
    }

    /// Fold one decoded record into the entry and forms tables.
    pub fn add_record(&mut self, record: RawRecord) {
        let word = record.word.trim();
        if word.is_empty() {
            self.stats.malformed += 1;
            return;
        }
        if record.senses.is_empty() {
            self.stats.empty_records += 1;
            return;
        }
        let defs = extract_definitions(&record.senses);
        if defs.is_empty() {
            self.stats.empty_records += 1;
            return;
        }

        let pos = Pos::from_tag(&record.pos);
        // Gender is only harvested for the source "noun" tag, not for every
        // noun-ranked code.
        let gender = if record.pos == "noun" {
            gender_from_templates(&record.head_templates)
        } else {
            None
        };

        let key = word.to_lowercase();
        self.merge(key.clone(), pos.clone(), defs, gender);
        self.collect_forms(&key, &pos, &record.forms);
    }

    /// Resolve collected forms against the finished entry table.
    pub fn finish(mut self) -> Dictionary {
        self.stats.base_entries = self.entries.len();
        self.stats.forms_collected = self.forms.len();

        // Reconciliation checks run against the merged table as a snapshot:
        // a form whose base never produced a real entry is dropped even if
        // another form would later occupy that key.
        let synthesized: Vec<(String, Entry)> = self
            .forms
            .iter()
            .filter(|(form, target)| {
                !self.entries.contains_key(*form) && self.entries.contains_key(&target.base)
            })
            .map(|(form, target)| {
                let entry = Entry {
                    pos: target.pos.clone(),
                    def: String::new(),
                    gender: None,
                    defs: None,
                    base: Some(target.base.clone()),
                };
                (form.clone(), entry)
            })
            .collect();

        for (form, entry) in synthesized {
            self.entries.insert(form, entry);
            self.stats.form_entries += 1;
        }

        Dictionary {
            entries: self.entries,
            stats: self.stats,
        }
    }

    fn merge(&mut self, key: String, pos: Pos, defs: Vec<String>, gender: Option<Gender>) {
        let Some(existing) = self.entries.get_mut(&key) else {
            self.entries.insert(key, make_entry(pos, defs, gender));
            return;
        };

        if pos.priority() < existing.pos.priority() {
            // Better part of speech: the incoming record becomes
            // representative, keeping the old definitions that still fit.
            let old_defs = existing
                .defs
                .take()
                .unwrap_or_else(|| vec![existing.def.clone()]);
            let mut merged: Vec<String> = defs.into_iter().take(MAX_DEFS).collect();
            for def in old_defs {
                if merged.len() >= MAX_DEFS {
                    break;
                }
                if !merged.contains(&def) {
                    merged.push(def);
                }
            }
            *existing = make_entry(pos, merged, gender);
        } else {
            // Existing entry stays representative; only extend its
            // definition list with anything new.
            let mut merged = existing
                .defs
                .take()
                .unwrap_or_else(|| vec![existing.def.clone()]);
            for def in defs {
                if merged.len() >= MAX_DEFS {
                    break;
                }
                if !merged.contains(&def) {
                    merged.push(def);
                }
            }
            if merged.len() > 1 {
                existing.defs = Some(merged);
            }
        }
    }

    fn collect_forms(&mut self, key: &str, pos: &Pos, forms: &[FormRef]) {
        for form_ref in forms {
            let form = form_ref.form.trim();
            if form.chars().count() <= 1 {
                continue;
            }
            let lower = form.to_lowercase();
            if lower == key || self.forms.contains_key(&lower) {
                continue;
            }
            self.forms.insert(
                lower,
                FormTarget {
                    base: key.to_string(),
                    pos: pos.clone(),
                },
            );
        }
    }
}

/// The finished, immutable entry table plus its build statistics.
#[derive(Clone, Debug)]
pub struct Dictionary {
    entries: BTreeMap<String, Entry>,
    stats: BuildStats,
}

impl Dictionary {
    /// Build from a dump file on disk, reading it line by line.
    pub fn build_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        Self::read_from(BufReader::new(file))
    }

    /// Build from any line-oriented reader. IO errors are fatal; parse
    /// errors are not.
    pub fn read_from(reader: impl BufRead) -> Result<Self> {
        let mut builder = DictionaryBuilder::new();
        for line in reader.lines() {
            let line = line.context("read dump line")?;
            builder.add_line(&line);
            let stats = builder.stats();
            if stats.lines % PROGRESS_INTERVAL == 0 {
                info!(
                    "{} lines, {} entries, {} forms",
                    stats.lines,
                    builder.entries.len(),
                    builder.forms.len()
                );
            }
        }
        Ok(builder.finish())
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> &BTreeMap<String, Entry> {
        &self.entries
    }

    pub fn into_entries(self) -> BTreeMap<String, Entry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }
}

/// Extract the unique, ordered definitions of one record.
///
/// Each sense contributes its first gloss, except that cross-reference
/// glosses ("Alternative ...", "Obsolete spelling ...") defer to the
/// sense's second gloss and are skipped outright when none exists.
pub fn extract_definitions(senses: &[Sense]) -> Vec<String> {
    let mut defs: Vec<String> = Vec::new();
    for sense in senses {
        let Some(first) = sense.glosses.first() else {
            continue;
        };
        let gloss = if is_cross_reference(first) {
            match sense.glosses.get(1) {
                Some(second) => second,
                None => continue,
            }
        } else {
            first
        };
        if !gloss.is_empty() && !defs.contains(gloss) {
            defs.push(gloss.clone());
        }
    }
    defs
}

fn is_cross_reference(gloss: &str) -> bool {
    CROSS_REFERENCE_PREFIXES
        .iter()
        .any(|prefix| gloss.starts_with(prefix))
}

fn gender_from_templates(templates: &[HeadTemplate]) -> Option<Gender> {
    templates.iter().find_map(|template| {
        template
            .args
            .values()
            .filter_map(|value| value.as_str())
            .find_map(Gender::from_code)
    })
}

fn make_entry(pos: Pos, mut defs: Vec<String>, gender: Option<Gender>) -> Entry {
    defs.truncate(MAX_DEFS);
    let def = defs.first().cloned().unwrap_or_default();
    Entry {
        pos,
        def,
        gender,
        defs: (defs.len() > 1).then_some(defs),
        base: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sense(glosses: &[&str]) -> Sense {
        Sense {
            glosses: glosses.iter().map(|g| g.to_string()).collect(),
        }
    }

    fn build(lines: &[&str]) -> Dictionary {
        let mut builder = DictionaryBuilder::new();
        for line in lines {
            builder.add_line(line);
        }
        builder.finish()
    }

    #[test]
    fn extracts_first_glosses_in_order() {
        let defs = extract_definitions(&[
            sense(&["cat", "feline"]),
            sense(&["chat (conversation)"]),
            sense(&["cat"]),
        ]);
        assert_eq!(defs, vec!["cat", "chat (conversation)"]);
    }

    #[test]
    fn cross_reference_defers_to_second_gloss() {
        let defs = extract_definitions(&[sense(&["Alternative spelling of chien", "dog"])]);
        assert_eq!(defs, vec!["dog"]);

        let defs = extract_definitions(&[sense(&["Obsolete spelling of roy", "king"])]);
        assert_eq!(defs, vec!["king"]);
    }

    #[test]
    fn cross_reference_without_fallback_contributes_nothing() {
        let defs = extract_definitions(&[sense(&["Alternative spelling of chien"])]);
        assert!(defs.is_empty());

        // A record consisting only of such senses is dropped entirely.
        let dict = build(&[
            r#"{"word":"roy","pos":"noun","senses":[{"glosses":["Obsolete spelling of roi"]}]}"#,
        ]);
        assert!(dict.is_empty());
        assert_eq!(dict.stats().empty_records, 1);
    }

    #[test]
    fn noun_beats_verb_but_keeps_its_definition() {
        let dict = build(&[
            r#"{"word":"chat","pos":"noun","senses":[{"glosses":["cat"]}],"head_templates":[{"args":{"1":"m"}}]}"#,
            r#"{"word":"chat","pos":"verb","senses":[{"glosses":["to chat"]}]}"#,
        ]);
        let entry = dict.get("chat").expect("chat entry");
        assert_eq!(entry.pos, Pos::Noun);
        assert_eq!(entry.def, "cat");
        assert_eq!(entry.gender, Some(Gender::Masculine));
        assert_eq!(
            entry.defs.as_deref(),
            Some(["cat".to_string(), "to chat".to_string()].as_slice())
        );
    }

    #[test]
    fn better_pos_replaces_representative_and_merges_defs() {
        let dict = build(&[
            r#"{"word":"chat","pos":"verb","senses":[{"glosses":["to chat"]}]}"#,
            r#"{"word":"chat","pos":"noun","senses":[{"glosses":["cat"]}],"head_templates":[{"args":{"1":"m"}}]}"#,
        ]);
        let entry = dict.get("chat").expect("chat entry");
        assert_eq!(entry.pos, Pos::Noun);
        assert_eq!(entry.def, "cat");
        assert_eq!(entry.gender, Some(Gender::Masculine));
        assert_eq!(
            entry.defs.as_deref(),
            Some(["cat".to_string(), "to chat".to_string()].as_slice())
        );
    }

    #[test]
    fn equal_priority_keeps_first_seen_representative() {
        let dict = build(&[
            r#"{"word":"voile","pos":"noun","senses":[{"glosses":["veil"]}],"head_templates":[{"args":{"1":"m"}}]}"#,
            r#"{"word":"voile","pos":"noun","senses":[{"glosses":["sail"]}],"head_templates":[{"args":{"1":"f"}}]}"#,
        ]);
        let entry = dict.get("voile").expect("voile entry");
        assert_eq!(entry.def, "veil");
        assert_eq!(entry.gender, Some(Gender::Masculine));
        assert_eq!(
            entry.defs.as_deref(),
            Some(["veil".to_string(), "sail".to_string()].as_slice())
        );
    }

    #[test]
    fn losing_record_never_contributes_gender() {
        let dict = build(&[
            r#"{"word":"ferme","pos":"adj","senses":[{"glosses":["firm"]}]}"#,
            r#"{"word":"ferme","pos":"noun","senses":[{"glosses":["farm"]}],"head_templates":[{"args":{"1":"f"}}]}"#,
        ]);
        let entry = dict.get("ferme").expect("ferme entry");
        assert_eq!(entry.pos, Pos::Adj);
        assert_eq!(entry.gender, None);
    }

    #[test]
    fn definitions_are_capped() {
        let dict = build(&[
            r#"{"word":"faire","pos":"verb","senses":[{"glosses":["to do"]},{"glosses":["to make"]},{"glosses":["to act"]},{"glosses":["to form"]},{"glosses":["to cause"]},{"glosses":["to equal"]}]}"#,
        ]);
        let entry = dict.get("faire").expect("faire entry");
        let defs = entry.defs.as_deref().expect("defs present");
        assert_eq!(defs.len(), MAX_DEFS);
        assert_eq!(entry.def, "to do");
        assert_eq!(defs[0], "to do");
        assert_eq!(defs[3], "to form");
    }

    #[test]
    fn duplicate_definitions_never_materialize_defs() {
        let dict = build(&[
            r#"{"word":"sel","pos":"noun","senses":[{"glosses":["salt"]}]}"#,
            r#"{"word":"sel","pos":"noun","senses":[{"glosses":["salt"]}]}"#,
        ]);
        let entry = dict.get("sel").expect("sel entry");
        assert_eq!(entry.def, "salt");
        assert_eq!(entry.defs, None);
    }

    #[test]
    fn headwords_collapse_case_insensitively() {
        let dict = build(&[
            r#"{"word":"Chat","pos":"noun","senses":[{"glosses":["cat"]}]}"#,
        ]);
        assert!(dict.get("chat").is_some());
        assert!(dict.get("Chat").is_none());
    }

    #[test]
    fn forms_become_redirect_entries() {
        let dict = build(&[
            r#"{"word":"chat","pos":"noun","senses":[{"glosses":["cat"]}],"forms":[{"form":"Chats"}]}"#,
        ]);
        let entry = dict.get("chats").expect("synthesized form entry");
        assert_eq!(entry.pos, Pos::Noun);
        assert_eq!(entry.def, "");
        assert_eq!(entry.base.as_deref(), Some("chat"));
        assert!(entry.is_form());
        assert_eq!(dict.stats().form_entries, 1);
    }

    #[test]
    fn forms_matching_the_headword_or_too_short_are_skipped() {
        let dict = build(&[
            r#"{"word":"chat","pos":"noun","senses":[{"glosses":["cat"]}],"forms":[{"form":"Chat"},{"form":"x"},{"form":" "}]}"#,
        ]);
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.stats().forms_collected, 0);
    }

    #[test]
    fn first_record_wins_a_contested_form() {
        let dict = build(&[
            r#"{"word":"fort","pos":"adj","senses":[{"glosses":["strong"]}],"forms":[{"form":"fortes"}]}"#,
            r#"{"word":"forte","pos":"noun","senses":[{"glosses":["forte"]}],"forms":[{"form":"fortes"}]}"#,
        ]);
        let entry = dict.get("fortes").expect("contested form");
        assert_eq!(entry.base.as_deref(), Some("fort"));
        assert_eq!(entry.pos, Pos::Adj);
    }

    #[test]
    fn form_never_shadows_a_real_entry() {
        let dict = build(&[
            r#"{"word":"suis","pos":"verb","senses":[{"glosses":["first-person of être"]}]}"#,
            r#"{"word":"être","pos":"verb","senses":[{"glosses":["to be"]}],"forms":[{"form":"suis"}]}"#,
        ]);
        let entry = dict.get("suis").expect("real entry");
        assert_eq!(entry.base, None);
        assert_eq!(entry.def, "first-person of être");
    }

    #[test]
    fn forms_with_missing_base_are_dropped() {
        // The base record contributes no definitions, so its forms resolve
        // to nothing.
        let dict = build(&[
            r#"{"word":"roy","pos":"noun","senses":[{"glosses":["Obsolete spelling of roi"]}],"forms":[{"form":"roys"}]}"#,
        ]);
        assert!(dict.is_empty());
        assert_eq!(dict.stats().forms_collected, 0);
    }

    #[test]
    fn malformed_and_empty_lines_are_counted_not_fatal() {
        let mut builder = DictionaryBuilder::new();
        builder.add_line("");
        builder.add_line("not json");
        builder.add_line(r#"{"word":"","pos":"noun","senses":[{"glosses":["x"]}]}"#);
        builder.add_line(r#"{"word":"vide","pos":"noun","senses":[]}"#);
        builder.add_line(r#"{"word":"chat","pos":"noun","senses":[{"glosses":["cat"]}]}"#);
        let dict = builder.finish();

        assert_eq!(dict.len(), 1);
        let stats = dict.stats();
        assert_eq!(stats.lines, 5);
        assert_eq!(stats.malformed, 2);
        assert_eq!(stats.empty_records, 1);
    }

    #[test]
    fn gender_requires_the_noun_source_tag() {
        let dict = build(&[
            r#"{"word":"beau","pos":"adj","senses":[{"glosses":["beautiful"]}],"head_templates":[{"args":{"1":"m"}}]}"#,
        ]);
        assert_eq!(dict.get("beau").expect("beau").gender, None);
    }

    #[test]
    fn unmapped_pos_ranks_below_mapped_ones() {
        let dict = build(&[
            r#"{"word":"zut","pos":"postp","senses":[{"glosses":["whatever"]}]}"#,
            r#"{"word":"zut","pos":"intj","senses":[{"glosses":["darn"]}]}"#,
        ]);
        let entry = dict.get("zut").expect("zut entry");
        assert_eq!(entry.pos, Pos::Intj);
        assert_eq!(entry.def, "darn");
    }
}
