//! Scalar normalization helpers for external records.
//!
//! External sources are loose about types: booleans arrive as text in a
//! handful of truthy spellings, names carry stray whitespace, and blank
//! names are handled differently per entity kind.

use crate::models::{NewEquipment, RawEquipmentRecord};

/// How a record with a blank/missing name is accounted for.
///
/// Equipment CSV import counts the row as skipped, the Wger equipment feed
/// drops it without counting, and exercise import records a per-row error.
/// The asymmetry is deliberate domain policy, not something to unify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlankNamePolicy {
    /// Count the row as skipped and move on.
    CountSkipped,
    /// Drop the row without touching any counter.
    Ignore,
    /// Record a per-row error.
    RecordError,
}

/// Parses a loose textual enabled flag. Absent or blank means enabled.
pub fn parse_enabled(raw: Option<&str>) -> bool {
    match raw {
        None => true,
        Some(s) => {
            let s = s.trim();
            if s.is_empty() {
                true
            } else {
                matches!(
                    s.to_lowercase().as_str(),
                    "true" | "1" | "yes" | "enabled" | "y"
                )
            }
        }
    }
}

/// Returns the trimmed name, or `None` when blank.
pub fn clean_name(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Trims a free-text field, mapping empty to `None`.
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    raw.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Normalizes one raw equipment record into a canonical candidate.
/// Returns `None` when the name is blank; the caller applies the
/// per-kind blank-name policy.
pub fn normalize_equipment(record: &RawEquipmentRecord) -> Option<NewEquipment> {
    let name = clean_name(&record.name)?;
    Some(NewEquipment {
        name: name.to_string(),
        description: clean_text(record.description.as_deref()),
        enabled: parse_enabled(record.enabled.as_deref()),
    })
}

/// Label identifying a record in error messages: CSV rows by line number,
/// API records by name.
pub fn row_label(line: Option<usize>, name: &str) -> String {
    match line {
        Some(n) => format!("Row {}", n),
        None => format!("'{}'", name),
    }
}
