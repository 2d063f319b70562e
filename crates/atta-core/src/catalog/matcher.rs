//! Resolves loosely formatted (category, type) strings to canonical catalog entries.

use crate::shared::{CatalogMatch, ServiceCatalog};
use std::collections::HashMap;

type PairKey = (String, String);

/// Index entry for a normalized pair.
#[derive(Debug, Clone)]
enum Slot {
    Canonical(CatalogMatch),
    /// Two or more distinct catalog entries normalize to this key; never resolves.
    Ambiguous(Vec<CatalogMatch>),
}

/// Normalized lookup index over a [`ServiceCatalog`].
///
/// Keys are trimmed, whitespace-collapsed and lower-cased. Values are the pair
/// exactly as the catalog stores it, so callers always get catalog casing back.
#[derive(Debug, Clone)]
pub struct CatalogMatcher {
    pairs: HashMap<PairKey, Slot>,
}

/// Trims, collapses internal whitespace runs to one space and case-folds.
pub fn normalize_key(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl CatalogMatcher {
    pub fn new(catalog: &ServiceCatalog) -> Self {
        let mut pairs: HashMap<PairKey, Slot> = HashMap::new();
        for (category, request_type) in catalog.entries() {
            let key = (normalize_key(&category.name), normalize_key(&request_type.name));
            let canonical = CatalogMatch {
                request_category: category.name.clone(),
                request_type: request_type.name.clone(),
            };
            let slot = pairs
                .entry(key)
                .or_insert_with(|| Slot::Canonical(canonical.clone()));
            match slot {
                Slot::Canonical(existing) if *existing != canonical => {
                    let existing = existing.clone();
                    *slot = Slot::Ambiguous(vec![existing, canonical]);
                }
                Slot::Ambiguous(candidates) if !candidates.contains(&canonical) => {
                    candidates.push(canonical);
                }
                _ => {}
            }
        }
        Self { pairs }
    }

    /// Returns the canonical catalog pair for the given strings, or `None` when either
    /// input is blank, the pair is unknown, or the normalized key is ambiguous.
    pub fn resolve(&self, category: Option<&str>, request_type: Option<&str>) -> Option<CatalogMatch> {
        let category = category.filter(|s| !s.trim().is_empty())?;
        let request_type = request_type.filter(|s| !s.trim().is_empty())?;
        let key = (normalize_key(category), normalize_key(request_type));
        match self.pairs.get(&key)? {
            Slot::Canonical(m) => Some(m.clone()),
            Slot::Ambiguous(_) => None,
        }
    }

    /// Catalog entries that collide after normalization, grouped per key.
    /// Exposed so callers can flag catalog data quality problems.
    pub fn collisions(&self) -> Vec<Vec<CatalogMatch>> {
        let mut out: Vec<Vec<CatalogMatch>> = self
            .pairs
            .values()
            .filter_map(|slot| match slot {
                Slot::Ambiguous(candidates) => Some(candidates.clone()),
                Slot::Canonical(_) => None,
            })
            .collect();
        out.sort_by(|a, b| {
            (&a[0].request_category, &a[0].request_type)
                .cmp(&(&b[0].request_category, &b[0].request_type))
        });
        out
    }
}
