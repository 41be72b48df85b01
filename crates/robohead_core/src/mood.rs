//! Mood vocabulary
//!
//! `Mood` is the closed set of expressive requests the engine can make.
//! `MoodCatalog` is the dispatch table a sink builds once at startup from the
//! ids its renderer actually supports; lookups outside the table are rejected
//! instead of falling back to a default.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Neutral,
    Happy,
    Sad,
    Surprised,
    Tired,
    Sleepy,
    Excited,
    Confused,
    Mischievous,
    Wink,
    Star,
    Love,
    Celebrating,
}

impl Mood {
    pub const ALL: [Mood; 13] = [
        Mood::Neutral,
        Mood::Happy,
        Mood::Sad,
        Mood::Surprised,
        Mood::Tired,
        Mood::Sleepy,
        Mood::Excited,
        Mood::Confused,
        Mood::Mischievous,
        Mood::Wink,
        Mood::Star,
        Mood::Love,
        Mood::Celebrating,
    ];

    /// Wire id understood by mood sinks.
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Neutral => "neutral",
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Surprised => "surprised",
            Mood::Tired => "tired",
            Mood::Sleepy => "sleepy",
            Mood::Excited => "excited",
            Mood::Confused => "confused",
            Mood::Mischievous => "mischievous",
            Mood::Wink => "wink",
            Mood::Star => "star",
            Mood::Love => "love",
            Mood::Celebrating => "celebrating",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownMood(s.to_string()))
    }
}

/// Id -> mood lookup table, built once.
#[derive(Debug, Clone)]
pub struct MoodCatalog {
    entries: HashMap<&'static str, Mood>,
}

impl MoodCatalog {
    /// Catalog accepting every mood the engine can emit.
    pub fn full() -> Self {
        Self {
            entries: Mood::ALL.iter().map(|m| (m.as_str(), *m)).collect(),
        }
    }

    /// Catalog restricted to the given ids (e.g. what one eye style supports).
    pub fn from_ids<S: AsRef<str>>(ids: &[S]) -> Result<Self, ConfigError> {
        let mut entries = HashMap::with_capacity(ids.len());
        for id in ids {
            let mood: Mood = id.as_ref().parse()?;
            entries.insert(mood.as_str(), mood);
        }
        Ok(Self { entries })
    }

    pub fn resolve(&self, id: &str) -> Result<Mood, ConfigError> {
        self.entries
            .get(id)
            .copied()
            .ok_or_else(|| ConfigError::UnknownMood(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MoodCatalog {
    fn default() -> Self {
        Self::full()
    }
}
