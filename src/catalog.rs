// 📦 Catalog - barcode → price mapping for the current session
// List and Delete are the only operations the shell needs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Text shown when listing an empty catalog
pub const NO_DATA: &str = "No data available.";

/// Header shown above a non-empty listing
pub const LISTING_HEADER: &str = "Here are all the products imported:";

// ============================================================================
// CORE TYPES
// ============================================================================

/// Entry - one (barcode, price) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub barcode: String,
    pub price: f64,
}

impl Entry {
    pub fn new(barcode: impl Into<String>, price: f64) -> Self {
        Entry {
            barcode: barcode.into(),
            price,
        }
    }
}

impl fmt::Display for Entry {
    /// Renders as "barcode - price"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.barcode, format_price(self.price))
    }
}

/// Format a price the way the listing shows it.
///
/// Whole numbers keep one decimal ("3.0"), everything else uses the
/// shortest representation that round-trips ("9.99").
pub fn format_price(price: f64) -> String {
    if price.is_finite() && price.fract() == 0.0 && price.abs() < 1e16 {
        format!("{:.1}", price)
    } else {
        format!("{}", price)
    }
}

/// Listing - result of listing a catalog
///
/// An empty catalog yields `NoData`, never an empty `Entries`.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    NoData,
    Entries(Vec<Entry>),
}

impl Listing {
    /// Lines for the text panel (header + blank line + one line per entry)
    pub fn lines(&self) -> Vec<String> {
        match self {
            Listing::NoData => vec![NO_DATA.to_string()],
            Listing::Entries(entries) => {
                let mut lines = Vec::with_capacity(entries.len() + 2);
                lines.push(LISTING_HEADER.to_string());
                lines.push(String::new());
                lines.extend(entries.iter().map(|e| e.to_string()));
                lines
            }
        }
    }
}

/// DeleteOutcome - what happened when removing a key
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeleteOutcome {
    Deleted { price: f64 },
    NotFound,
}

impl DeleteOutcome {
    pub fn found(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted { .. })
    }

    /// Message shown to the user
    pub fn message(&self) -> &'static str {
        match self {
            DeleteOutcome::Deleted { .. } => "Entry deleted.",
            DeleteOutcome::NotFound => "Barcode not found.",
        }
    }
}

// ============================================================================
// CATALOG
// ============================================================================

/// Catalog - mapping from barcode (unique) to price
///
/// Serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: HashMap<String, f64>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, barcode: &str) -> Option<f64> {
        self.entries.get(barcode).copied()
    }

    pub fn contains(&self, barcode: &str) -> bool {
        self.entries.contains_key(barcode)
    }

    /// Insert or overwrite. Returns the previous price, if any.
    pub fn insert(&mut self, barcode: impl Into<String>, price: f64) -> Option<f64> {
        self.entries.insert(barcode.into(), price)
    }

    pub fn listing(&self) -> Listing {
        if self.entries.is_empty() {
            return Listing::NoData;
        }

        Listing::Entries(
            self.entries
                .iter()
                .map(|(barcode, price)| Entry::new(barcode.clone(), *price))
                .collect(),
        )
    }

    /// Remove `key` if present. Exact match: no trimming, no case folding.
    pub fn remove(&mut self, key: &str) -> DeleteOutcome {
        match self.entries.remove(key) {
            Some(price) => DeleteOutcome::Deleted { price },
            None => DeleteOutcome::NotFound,
        }
    }
}

impl FromIterator<(String, f64)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Catalog {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Pure form of Delete: consumes the catalog, returns it with `key` removed
/// and whether the key was found.
pub fn delete(mut catalog: Catalog, key: &str) -> (Catalog, bool) {
    let found = catalog.remove(key).found();
    (catalog, found)
}
