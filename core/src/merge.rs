//! Recursive merging of YAML mappings with configurable conflict resolution.
//!
//! Config trees are combined in two places: caller-supplied overrides are
//! laid over the loaded file, and built-in defaults are laid under it. Both
//! go through [`merge_mappings`], with a [`MergeStrategy`] deciding which
//! side wins when the same key holds a scalar on both sides.
//!
//! # Example
//!
//! ```
//! use bbconf_core::{MergeStrategy, merge_mappings};
//! use serde_yaml::Mapping;
//!
//! let base: Mapping = serde_yaml::from_str("database: {host: db, port: 5432}").unwrap();
//! let overlay: Mapping = serde_yaml::from_str("database: {host: localhost}").unwrap();
//!
//! let merged = merge_mappings(&base, &overlay, MergeStrategy::PreferOverlay);
//! assert_eq!(merged["database"]["host"].as_str(), Some("localhost"));
//! assert_eq!(merged["database"]["port"].as_u64(), Some(5432));
//! ```

use serde_yaml::{Mapping, Value};

/// Mapping merge behavior.
///
/// Nested mappings present on both sides are always merged recursively; the
/// strategy only matters for keys that hold a non-mapping value on at least
/// one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Keep base values when conflicts occur. Used to fill in defaults.
    PreferBase,
    /// Keep overlay values when conflicts occur. Used for overrides.
    PreferOverlay,
}

/// Merges two mappings into a new mapping.
///
/// Keys present only in `base` are preserved, keys present only in
/// `overlay` are added, and keys present in both are resolved by `strategy`
/// unless both values are mappings, in which case they merge recursively.
/// Key order follows `base`, with overlay-only keys appended.
pub fn merge_mappings(base: &Mapping, overlay: &Mapping, strategy: MergeStrategy) -> Mapping {
    let mut merged = base.clone();

    for (key, overlay_value) in overlay {
        match merged.get_mut(key) {
            Some(existing) => {
                *existing = merge_values(existing, overlay_value, strategy);
            }
            None => {
                merged.insert(key.clone(), overlay_value.clone());
            }
        }
    }

    merged
}

fn merge_values(base: &Value, overlay: &Value, strategy: MergeStrategy) -> Value {
    match (base, overlay) {
        (Value::Mapping(b), Value::Mapping(o)) => Value::Mapping(merge_mappings(b, o, strategy)),
        // An explicit `~` under a section in the file should not block defaults.
        (Value::Null, _) if strategy == MergeStrategy::PreferBase => overlay.clone(),
        _ => match strategy {
            MergeStrategy::PreferBase => base.clone(),
            MergeStrategy::PreferOverlay => overlay.clone(),
        },
    }
}
