use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetalRef {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityPair {
    pub metal: MetalRef,
    pub is_compatible: bool,
}

/// One chemical with its metal verdicts, metal references resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityEntry {
    pub id: i32,
    pub chemical_name: String,
    pub compatibilities: Vec<CompatibilityPair>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairInput {
    pub metal_id: i32,
    pub is_compatible: bool,
}

#[derive(Debug, Clone)]
pub struct NewCompatibility {
    pub chemical_name: String,
    pub compatibilities: Vec<PairInput>,
}

#[derive(Debug, Clone, Default)]
pub struct CompatibilityPatch {
    pub chemical_name: Option<String>,
    /// Replaces every stored pair when present.
    pub compatibilities: Option<Vec<PairInput>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionedMatrix {
    pub data: Vec<CompatibilityEntry>,
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixRow {
    pub chemical_name: String,
    /// Metal name to verdict; `None` marks an untested combination.
    #[serde(flatten)]
    pub cells: BTreeMap<String, Option<bool>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixView {
    pub chemicals: Vec<String>,
    pub metals: Vec<String>,
    pub matrix: Vec<MatrixRow>,
}

impl MatrixView {
    /// Pivots entries into chemical rows and metal columns. Rows keep the
    /// order of `entries`; columns are every metal seen in any entry, sorted.
    #[must_use]
    pub fn from_entries(entries: &[CompatibilityEntry]) -> Self {
        let metals = unique_metal_names(entries);

        let matrix = entries
            .iter()
            .map(|entry| {
                let mut cells: BTreeMap<String, Option<bool>> =
                    metals.iter().map(|m| (m.clone(), None)).collect();
                for pair in &entry.compatibilities {
                    cells.insert(pair.metal.name.clone(), Some(pair.is_compatible));
                }
                MatrixRow {
                    chemical_name: entry.chemical_name.clone(),
                    cells,
                }
            })
            .collect();

        Self {
            chemicals: entries.iter().map(|e| e.chemical_name.clone()).collect(),
            metals,
            matrix,
        }
    }
}

#[must_use]
pub fn unique_metal_names(entries: &[CompatibilityEntry]) -> Vec<String> {
    entries
        .iter()
        .flat_map(|e| e.compatibilities.iter().map(|p| p.metal.name.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Chemical names are stored trimmed and uppercased.
#[must_use]
pub fn normalize_chemical_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// First metal id listed more than once, if any.
#[must_use]
pub fn first_duplicate_metal(pairs: &[PairInput]) -> Option<i32> {
    let mut seen = HashSet::with_capacity(pairs.len());
    pairs
        .iter()
        .find(|p| !seen.insert(p.metal_id))
        .map(|p| p.metal_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, pairs: &[(i32, &str, bool)]) -> CompatibilityEntry {
        CompatibilityEntry {
            id: 1,
            chemical_name: name.to_string(),
            compatibilities: pairs
                .iter()
                .map(|(id, metal, ok)| CompatibilityPair {
                    metal: MetalRef {
                        id: *id,
                        name: (*metal).to_string(),
                    },
                    is_compatible: *ok,
                })
                .collect(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_matrix_view_marks_untested_as_none() {
        let entries = vec![
            entry("ACETONE", &[(1, "ALUMINUM", true)]),
            entry("BLEACH", &[(2, "STEEL", false), (1, "ALUMINUM", false)]),
        ];

        let view = MatrixView::from_entries(&entries);

        assert_eq!(view.chemicals, vec!["ACETONE", "BLEACH"]);
        assert_eq!(view.metals, vec!["ALUMINUM", "STEEL"]);
        assert_eq!(view.matrix[0].cells["ALUMINUM"], Some(true));
        assert_eq!(view.matrix[0].cells["STEEL"], None);
        assert_eq!(view.matrix[1].cells["ALUMINUM"], Some(false));
        assert_eq!(view.matrix[1].cells["STEEL"], Some(false));
    }

    #[test]
    fn test_matrix_row_serializes_flat() {
        let view = MatrixView::from_entries(&[entry("ACETONE", &[(1, "ALUMINUM", true)])]);
        let json = serde_json::to_value(&view.matrix[0]).unwrap();

        assert_eq!(json["chemicalName"], "ACETONE");
        assert_eq!(json["ALUMINUM"], true);
    }

    #[test]
    fn test_matrix_view_empty() {
        let view = MatrixView::from_entries(&[]);
        assert!(view.chemicals.is_empty());
        assert!(view.metals.is_empty());
        assert!(view.matrix.is_empty());
    }

    #[test]
    fn test_normalize_chemical_name() {
        assert_eq!(normalize_chemical_name("  acetone "), "ACETONE");
        assert_eq!(normalize_chemical_name("Acetic Acid"), "ACETIC ACID");
    }

    #[test]
    fn test_first_duplicate_metal() {
        let pairs = [
            PairInput {
                metal_id: 1,
                is_compatible: true,
            },
            PairInput {
                metal_id: 2,
                is_compatible: true,
            },
            PairInput {
                metal_id: 1,
                is_compatible: false,
            },
        ];
        assert_eq!(first_duplicate_metal(&pairs), Some(1));
        assert_eq!(first_duplicate_metal(&pairs[..2]), None);
    }
}
