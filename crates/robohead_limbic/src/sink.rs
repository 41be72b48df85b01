//! Reference mood sink backed by a [`MoodCatalog`].

use robohead_core::{Mood, MoodCatalog, MoodSink};

/// Accepts only ids present in its catalog and remembers the active mood.
///
/// Stands in for the renderer-side style manager: a real one would swap the
/// eye artwork where this one just records and logs the change.
#[derive(Debug, Clone)]
pub struct CatalogSink {
    catalog: MoodCatalog,
    active: Mood,
    changes: u64,
    rejections: u64,
}

impl CatalogSink {
    pub fn new(catalog: MoodCatalog) -> Self {
        Self {
            catalog,
            active: Mood::Neutral,
            changes: 0,
            rejections: 0,
        }
    }

    pub fn active(&self) -> Mood {
        self.active
    }

    /// Number of accepted requests
    pub fn changes(&self) -> u64 {
        self.changes
    }

    pub fn rejections(&self) -> u64 {
        self.rejections
    }
}

impl Default for CatalogSink {
    fn default() -> Self {
        Self::new(MoodCatalog::full())
    }
}

impl MoodSink for CatalogSink {
    fn set_mood(&mut self, id: &str) -> bool {
        match self.catalog.resolve(id) {
            Ok(mood) => {
                if mood != self.active {
                    tracing::info!("Mood: {} -> {}", self.active, mood);
                }
                self.active = mood;
                self.changes += 1;
                true
            }
            Err(e) => {
                self.rejections += 1;
                tracing::debug!("Sink rejected mood: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_catalog_ids() {
        let mut sink = CatalogSink::default();
        assert!(sink.set_mood("happy"));
        assert_eq!(sink.active(), Mood::Happy);
        assert_eq!(sink.changes(), 1);
    }

    #[test]
    fn test_rejects_unknown_ids() {
        let mut sink = CatalogSink::new(MoodCatalog::from_ids(&["neutral", "sad"]).unwrap());
        assert!(!sink.set_mood("celebrating"));
        assert!(!sink.set_mood("not-a-mood"));
        assert_eq!(sink.active(), Mood::Neutral);
        assert_eq!(sink.rejections(), 2);
    }
}
