//! Shared types for dictionaries built from wiktextract dumps.
//!
//! The goal is to keep the wire format of the generated artifacts stable
//! while giving higher-level tooling real types to work with: [`Pos`] and
//! [`Gender`] serialize to the exact short codes found in the JSON output,
//! and [`Entry`] is the one persistent record shape shared by the builder
//! and every projection of its result.
//!
//! ```rust
//! use wiktextract_types::{Gender, Pos};
//!
//! let pos = Pos::from_tag("noun");
//! assert_eq!(pos.code(), "n");
//! assert!(pos.priority() < Pos::from_tag("verb").priority());
//! assert_eq!(Gender::from_code("m-p"), Some(Gender::MasculinePlural));
//! ```

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Normalized part-of-speech code as it appears in dictionary artifacts.
///
/// Source tags without a short code pass through unchanged as [`Pos::Other`].
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Pos {
    Det,
    Pron,
    Prep,
    Conj,
    Article,
    Adj,
    Noun,
    Verb,
    Adv,
    Contraction,
    Intj,
    Num,
    Particle,
    Phrase,
    Name,
    Suffix,
    Prefix,
    Character,
    Symbol,
    Punct,
    Other(String),
}

/// Rank assigned to tags absent from the priority table.
pub const DEFAULT_PRIORITY: u8 = 30;

impl Pos {
    /// Normalize a wiktextract source tag. Unknown tags pass through as-is.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "noun" => Pos::Noun,
            "verb" => Pos::Verb,
            "adj" => Pos::Adj,
            "adv" => Pos::Adv,
            "prep" => Pos::Prep,
            "conj" => Pos::Conj,
            "pron" => Pos::Pron,
            "det" => Pos::Det,
            "intj" => Pos::Intj,
            "num" => Pos::Num,
            "particle" => Pos::Particle,
            "phrase" | "proverb" => Pos::Phrase,
            "suffix" => Pos::Suffix,
            "prefix" => Pos::Prefix,
            "article" => Pos::Article,
            "name" => Pos::Name,
            "contraction" => Pos::Contraction,
            "character" => Pos::Character,
            "symbol" => Pos::Symbol,
            "punct" => Pos::Punct,
            other => Pos::Other(other.to_string()),
        }
    }

    /// Parse a short code back into the enum, e.g. when re-reading artifacts.
    pub fn from_code(code: &str) -> Self {
        match code {
            "n" => Pos::Noun,
            "v" => Pos::Verb,
            "adj" => Pos::Adj,
            "adv" => Pos::Adv,
            "prep" => Pos::Prep,
            "conj" => Pos::Conj,
            "pron" => Pos::Pron,
            "det" => Pos::Det,
            "intj" => Pos::Intj,
            "num" => Pos::Num,
            "part" => Pos::Particle,
            "phrase" => Pos::Phrase,
            "suffix" => Pos::Suffix,
            "prefix" => Pos::Prefix,
            "art" => Pos::Article,
            "name" => Pos::Name,
            "contr" => Pos::Contraction,
            "character" => Pos::Character,
            "symbol" => Pos::Symbol,
            "punct" => Pos::Punct,
            other => Pos::Other(other.to_string()),
        }
    }

    /// Short code emitted in artifacts.
    pub fn code(&self) -> &str {
        match self {
            Pos::Det => "det",
            Pos::Pron => "pron",
            Pos::Prep => "prep",
            Pos::Conj => "conj",
            Pos::Article => "art",
            Pos::Adj => "adj",
            Pos::Noun => "n",
            Pos::Verb => "v",
            Pos::Adv => "adv",
            Pos::Contraction => "contr",
            Pos::Intj => "intj",
            Pos::Num => "num",
            Pos::Particle => "part",
            Pos::Phrase => "phrase",
            Pos::Name => "name",
            Pos::Suffix => "suffix",
            Pos::Prefix => "prefix",
            Pos::Character => "character",
            Pos::Symbol => "symbol",
            Pos::Punct => "punct",
            Pos::Other(code) => code,
        }
    }

    /// Fixed rank deciding which record represents a headword; lower wins.
    pub fn priority(&self) -> u8 {
        match self {
            Pos::Det => 1,
            Pos::Pron => 2,
            Pos::Prep => 3,
            Pos::Conj => 4,
            Pos::Article => 5,
            Pos::Adj => 6,
            Pos::Noun => 7,
            Pos::Verb => 8,
            Pos::Adv => 9,
            Pos::Contraction => 10,
            Pos::Intj => 11,
            Pos::Num => 12,
            Pos::Particle => 13,
            Pos::Phrase => 14,
            Pos::Name
            | Pos::Suffix
            | Pos::Prefix
            | Pos::Character
            | Pos::Symbol
            | Pos::Punct => 50,
            Pos::Other(_) => DEFAULT_PRIORITY,
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Pos {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Pos {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Pos::from_code(&code))
    }
}

/// Grammatical gender annotation harvested from noun head templates.
///
/// The codes round-trip to the exact strings used by the source data,
/// including the spelled-out `m or f`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Gender {
    Masculine,
    Feminine,
    MasculinePlural,
    FemininePlural,
    Common,
    MasculineOrFeminine,
}

impl Gender {
    /// Parse a head-template argument value; anything else is not a gender.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "m" => Some(Gender::Masculine),
            "f" => Some(Gender::Feminine),
            "m-p" => Some(Gender::MasculinePlural),
            "f-p" => Some(Gender::FemininePlural),
            "mf" => Some(Gender::Common),
            "m or f" => Some(Gender::MasculineOrFeminine),
            _ => None,
        }
    }

    /// Code emitted in artifacts, identical to the accepted source value.
    pub fn code(self) -> &'static str {
        match self {
            Gender::Masculine => "m",
            Gender::Feminine => "f",
            Gender::MasculinePlural => "m-p",
            Gender::FemininePlural => "f-p",
            Gender::Common => "mf",
            Gender::MasculineOrFeminine => "m or f",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Gender {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Gender {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Gender::from_code(&code)
            .ok_or_else(|| de::Error::custom(format!("unknown gender code: {code}")))
    }
}

/// One dictionary entry, keyed externally by its lowercased headword.
///
/// Regular entries carry a primary definition in `def` and, when more than
/// one definition was retained, the full ordered list in `defs` (which then
/// starts with `def` itself). Synthesized form-entries instead point at
/// their base headword through `base` and keep `def` empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub pos: Pos,
    pub def: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
}

impl Entry {
    /// Whether this entry only redirects an inflected form to its base.
    pub fn is_form(&self) -> bool {
        self.base.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_tags_to_short_codes() {
        assert_eq!(Pos::from_tag("noun").code(), "n");
        assert_eq!(Pos::from_tag("particle").code(), "part");
        assert_eq!(Pos::from_tag("proverb"), Pos::Phrase);
        assert_eq!(Pos::from_tag("article").code(), "art");
    }

    #[test]
    fn unknown_tags_pass_through() {
        let pos = Pos::from_tag("postp");
        assert_eq!(pos, Pos::Other("postp".to_string()));
        assert_eq!(pos.code(), "postp");
        assert_eq!(pos.priority(), DEFAULT_PRIORITY);
    }

    #[test]
    fn priority_table_orders_determiners_before_verbs() {
        assert!(Pos::Det.priority() < Pos::Pron.priority());
        assert!(Pos::Noun.priority() < Pos::Verb.priority());
        assert_eq!(Pos::Name.priority(), 50);
        assert_eq!(Pos::Suffix.priority(), Pos::Prefix.priority());
    }

    #[test]
    fn gender_codes_round_trip() {
        for code in ["m", "f", "m-p", "f-p", "mf", "m or f"] {
            let gender = Gender::from_code(code).expect("accepted code");
            assert_eq!(gender.code(), code);
        }
        assert_eq!(Gender::from_code("n"), None);
        assert_eq!(Gender::from_code(""), None);
    }

    #[test]
    fn entry_serializes_without_absent_fields() {
        let entry = Entry {
            pos: Pos::Noun,
            def: "cat".to_string(),
            gender: Some(Gender::Masculine),
            defs: None,
            base: None,
        };
        let json = serde_json::to_string(&entry).expect("serialize entry");
        assert_eq!(json, r#"{"pos":"n","def":"cat","gender":"m"}"#);

        let back: Entry = serde_json::from_str(&json).expect("deserialize entry");
        assert_eq!(back, entry);
    }

    #[test]
    fn form_entry_round_trips_base() {
        let entry = Entry {
            pos: Pos::Verb,
            def: String::new(),
            gender: None,
            defs: None,
            base: Some("chat".to_string()),
        };
        assert!(entry.is_form());
        let json = serde_json::to_string(&entry).expect("serialize form entry");
        assert_eq!(json, r#"{"pos":"v","def":"","base":"chat"}"#);
    }
}
