//! Catalog-driven enrichment: canonical pair resolution and SLA derivation.

mod matcher;
mod sla;

pub use matcher::{normalize_key, CatalogMatcher};
pub use sla::{derive_sla, SlaSummary};
