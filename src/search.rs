//! Search-hit location aggregation.
//!
//! A search hit reports where its matched terms occur. `HitLocations` indexes
//! those occurrences by field and term so highlighting and faceting code can
//! look them up without rescanning the raw decoded tree.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// One occurrence of a matched term inside a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitLocation {
    pub field: String,
    pub term: String,
    /// 1-based term position within the field.
    pub position: u64,
    /// Byte offset where the occurrence starts.
    pub start: u64,
    /// Byte offset just past the occurrence.
    pub end: u64,
    /// Positions within array-valued fields, when applicable.
    pub array_positions: Option<Vec<u64>>,
}

#[derive(Deserialize)]
struct RawLocation {
    pos: u64,
    start: u64,
    end: u64,
    array_positions: Option<Vec<u64>>,
}

/// Two-level index: field → term → occurrences in insertion order.
///
/// `count()` always equals the total number of records added, which equals
/// the sum of `get_all(field).len()` over all fields.
#[derive(Debug, Clone, Default)]
pub struct HitLocations {
    locations: HashMap<String, HashMap<String, Vec<HitLocation>>>,
    count: usize,
}

impl HitLocations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the index from a raw decoded tree shaped
    /// `{field: {term: [location, ...]}}`. A location record missing a
    /// required numeric field is a hard decode failure, not a skipped entry.
    pub fn from_value(raw: &Value) -> Result<Self> {
        let fields = raw
            .as_object()
            .ok_or_else(|| Error::Transcoding("locations root must be an object".into()))?;
        let mut result = Self::new();
        for (field, terms) in fields {
            let terms = terms.as_object().ok_or_else(|| {
                Error::Transcoding(format!("locations for field {} must be an object", field))
            })?;
            for (term, entries) in terms {
                let entries = entries.as_array().ok_or_else(|| {
                    Error::Transcoding(format!("locations for term {} must be an array", term))
                })?;
                for entry in entries {
                    let raw: RawLocation = serde_json::from_value(entry.clone())?;
                    result.add(HitLocation {
                        field: field.clone(),
                        term: term.clone(),
                        position: raw.pos,
                        start: raw.start,
                        end: raw.end,
                        array_positions: raw.array_positions,
                    });
                }
            }
        }
        Ok(result)
    }

    /// Append one occurrence. O(1) amortized.
    pub fn add(&mut self, location: HitLocation) {
        self.locations
            .entry(location.field.clone())
            .or_default()
            .entry(location.term.clone())
            .or_default()
            .push(location);
        self.count += 1;
    }

    /// All occurrences for a field, in insertion order per term. Returns a
    /// defensive copy.
    pub fn get_all(&self, field: &str) -> Vec<HitLocation> {
        self.locations
            .get(field)
            .map(|terms| terms.values().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// Occurrences of one term within one field, in insertion order.
    /// Returns a defensive copy.
    pub fn get(&self, field: &str, term: &str) -> Vec<HitLocation> {
        self.locations
            .get(field)
            .and_then(|terms| terms.get(term))
            .cloned()
            .unwrap_or_default()
    }

    /// Every occurrence across all fields and terms.
    pub fn all(&self) -> Vec<HitLocation> {
        self.locations
            .values()
            .flat_map(|terms| terms.values().flatten())
            .cloned()
            .collect()
    }

    /// Fields with at least one occurrence.
    pub fn fields(&self) -> Vec<String> {
        self.locations.keys().cloned().collect()
    }

    /// Terms across all fields, deduplicated.
    pub fn terms(&self) -> HashSet<String> {
        self.locations
            .values()
            .flat_map(|terms| terms.keys().cloned())
            .collect()
    }

    /// Terms occurring within one field.
    pub fn terms_for(&self, field: &str) -> Vec<String> {
        self.locations
            .get(field)
            .map(|terms| terms.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Running total of occurrences added.
    pub fn count(&self) -> usize {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loc(field: &str, term: &str, position: u64) -> HitLocation {
        HitLocation {
            field: field.into(),
            term: term.into(),
            position,
            start: position * 10,
            end: position * 10 + term.len() as u64,
            array_positions: None,
        }
    }

    #[test]
    fn test_count_matches_additions() {
        let mut hits = HitLocations::new();
        hits.add(loc("name", "amber", 1));
        hits.add(loc("name", "amber", 4));
        hits.add(loc("style", "ale", 2));
        assert_eq!(hits.count(), 3);

        let per_field: usize = hits.fields().iter().map(|f| hits.get_all(f).len()).sum();
        assert_eq!(per_field, hits.count());
    }

    #[test]
    fn test_get_preserves_insertion_order() {
        let mut hits = HitLocations::new();
        hits.add(loc("name", "amber", 3));
        hits.add(loc("name", "amber", 1));
        let positions: Vec<u64> = hits
            .get("name", "amber")
            .iter()
            .map(|l| l.position)
            .collect();
        assert_eq!(positions, vec![3, 1]);
    }

    #[test]
    fn test_views_are_defensive_copies() {
        let mut hits = HitLocations::new();
        hits.add(loc("name", "amber", 1));
        let mut view = hits.get("name", "amber");
        view.clear();
        assert_eq!(hits.get("name", "amber").len(), 1);
    }

    #[test]
    fn test_terms_deduplicate_across_fields() {
        let mut hits = HitLocations::new();
        hits.add(loc("name", "ale", 1));
        hits.add(loc("style", "ale", 2));
        hits.add(loc("style", "pale", 1));
        assert_eq!(hits.terms(), HashSet::from(["ale".into(), "pale".into()]));
        assert_eq!(hits.terms_for("name"), vec!["ale".to_string()]);
    }

    #[test]
    fn test_from_value_reconstructs_index() {
        let raw = json!({
            "name": {
                "amber": [
                    {"pos": 1, "start": 0, "end": 5},
                    {"pos": 7, "start": 40, "end": 45, "array_positions": [2]}
                ]
            }
        });
        let hits = HitLocations::from_value(&raw).unwrap();
        assert_eq!(hits.count(), 2);
        let records = hits.get("name", "amber");
        assert_eq!(records[0].position, 1);
        assert_eq!(records[1].array_positions, Some(vec![2]));
    }

    #[test]
    fn test_from_value_missing_numeric_field_is_hard_failure() {
        let raw = json!({
            "name": {"amber": [{"start": 0, "end": 5}]}
        });
        assert!(matches!(
            HitLocations::from_value(&raw),
            Err(Error::Transcoding(_))
        ));
    }

    #[test]
    fn test_unknown_field_yields_empty_views() {
        let hits = HitLocations::new();
        assert!(hits.get_all("missing").is_empty());
        assert!(hits.get("missing", "term").is_empty());
        assert!(hits.terms_for("missing").is_empty());
    }
}
