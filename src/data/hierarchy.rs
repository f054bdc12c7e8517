use std::collections::HashSet;

use serde::Serialize;

use super::error::{CatalogError, Result};
use super::model::{CatalogRecordSet, Field};

/// `parent_id` value marking a halo with no parent.
pub const ROOT_PARENT: i64 = -1;

/// One halo in a level of the parent/child tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    pub id: i64,
    pub mass: f64,
    pub has_children: bool,
}

/// One level of the halo tree, heaviest first.
///
/// With `root_id == None` the level is the top-level halos (`parent_id ==
/// -1`); otherwise it is the direct children of `root_id`. A halo has
/// children when its id appears anywhere in the catalog's `parent_id`
/// column. Halos of equal mass keep catalog order.
pub fn hierarchy(records: &CatalogRecordSet, root_id: Option<i64>) -> Result<Vec<HierarchyNode>> {
    let parents = match records.parent_id() {
        Some(p) if !p.is_empty() => p,
        _ => return Ok(Vec::new()),
    };
    let ids = records
        .id()
        .ok_or(CatalogError::FieldNotFound(Field::Id))?;
    let mass = records.mass();

    let wanted = root_id.unwrap_or(ROOT_PARENT);
    let has_parent_role: HashSet<i64> = parents.iter().copied().collect();

    let mut level: Vec<HierarchyNode> = parents
        .iter()
        .enumerate()
        .filter(|&(_, &p)| p == wanted)
        .map(|(i, _)| HierarchyNode {
            id: ids[i],
            mass: mass[i],
            has_children: has_parent_role.contains(&ids[i]),
        })
        .collect();

    level.sort_by(|a, b| b.mass.total_cmp(&a.mass));
    Ok(level)
}
