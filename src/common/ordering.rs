use serde_json::{Map, Value};

/// A synthesized property waiting to be placed among its siblings.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub index: Option<usize>,
    pub name: String,
    pub node: Value,
}

/// Splice synthesized properties into an ordered property list.
///
/// Placements are taken in ascending `index` order (a missing index sorts
/// last, ties keep their input order). Each one is inserted at its index
/// in the list as it stands at that moment, or appended when the index is
/// missing or past the end. A placement whose name already exists replaces
/// that entry in place.
pub fn splice_by_index(
    properties: Map<String, Value>,
    mut placements: Vec<Placement>,
) -> Map<String, Value> {
    let mut ordered: Vec<(String, Value)> = properties.into_iter().collect();
    placements.sort_by_key(|p| p.index.unwrap_or(usize::MAX));

    for placement in placements {
        if let Some(existing) = ordered.iter_mut().find(|(name, _)| *name == placement.name) {
            existing.1 = placement.node;
            continue;
        }
        match placement.index {
            Some(index) if index <= ordered.len() => {
                ordered.insert(index, (placement.name, placement.node))
            }
            _ => ordered.push((placement.name, placement.node)),
        }
    }

    ordered.into_iter().collect()
}
