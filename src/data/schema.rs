//! Heuristic schema detection: which stored array plays which semantic role.
//!
//! Position is picked structurally (first rank-2 array with an axis of
//! length 3, no scoring). The scalar roles are picked by name: every
//! eligible array whose basename matches one of the role's patterns becomes
//! a candidate, candidates are scored, and the best score wins with ties
//! going to the earliest array in scan order. An array may be a candidate
//! for several scalar roles at once.
//!
//! The heuristic is deterministic, not guaranteed correct: adversarial
//! naming can steer it to the wrong array, which is why front ends let the
//! user override the result.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::model::{DatasetDescriptor, Role, SchemaMap};

fn role_patterns() -> &'static [(Role, Vec<Regex>)] {
    static PATTERNS: OnceLock<Vec<(Role, Vec<Regex>)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let table: [(Role, &[&str]); 4] = [
            (Role::Mass, &["mass", "mvir", "m200", "weight"]),
            (Role::Id, &["id", "index", "number", "track"]),
            (Role::ParentId, &["parent", "host", "group"]),
            (Role::Radius, &["rad", "r200", "rvir", "size"]),
        ];
        table
            .iter()
            .map(|(role, pats)| {
                let compiled = pats
                    .iter()
                    .map(|p| Regex::new(p).expect("role patterns are valid regexes"))
                    .collect();
                (*role, compiled)
            })
            .collect()
    })
}

/// A scored candidate for one scalar role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub path: String,
    pub score: f64,
}

/// Every candidate the detector considered, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaCandidates {
    /// Position candidates in scan order; the first one is selected.
    pub pos: Vec<String>,
    /// Scalar-role candidates sorted by descending score, scan order on ties.
    pub scalar: BTreeMap<Role, Vec<Candidate>>,
}

impl SchemaCandidates {
    /// Candidate paths for `role`, best first.
    pub fn paths(&self, role: Role) -> Vec<&str> {
        match role {
            Role::Pos => self.pos.iter().map(String::as_str).collect(),
            _ => self
                .scalar
                .get(&role)
                .map(|c| c.iter().map(|c| c.path.as_str()).collect())
                .unwrap_or_default(),
        }
    }

    /// The winning path of every role.
    pub fn best(&self) -> SchemaMap {
        let mut map = SchemaMap::default();
        for role in Role::ALL {
            map.set(role, self.paths(role).first().map(|p| p.to_string()));
        }
        map
    }
}

// Decided from `shape` alone; `rank` is a convenience copy and may disagree.
fn is_position_shape(d: &DatasetDescriptor) -> bool {
    matches!(d.shape.as_slice(), [3, _] | [_, 3])
}

fn is_column_shape(d: &DatasetDescriptor) -> bool {
    matches!(d.shape.as_slice(), [_] | [1, _] | [_, 1])
}

/// Score a candidate path (lowercased) for a scalar role. Higher is better.
pub fn score(role: Role, path: &str) -> f64 {
    let basename = path.rsplit('/').next().unwrap_or(path);
    // Shorter names win: "id" over "particle_ids_long_name".
    let mut score = -0.5 * basename.chars().count() as f64;

    match role {
        Role::Id => {
            if path.contains("parent") || path.contains("host") || path.contains("group") {
                score -= 50.0;
            }
            if basename == "id" {
                score += 20.0;
            } else if basename.contains("id") {
                score += 10.0;
            } else if basename.contains("index") {
                score += 5.0;
            }
        }
        Role::ParentId => {
            if basename.contains("parent") {
                score += 20.0;
            } else if basename.contains("host") {
                score += 10.0;
            } else if basename.contains("group") {
                score += 5.0;
            }
        }
        Role::Mass => {
            if basename == "mass" {
                score += 20.0;
            } else if basename.contains("mass") {
                score += 10.0;
            }
        }
        Role::Radius => {
            if basename.contains("radius") {
                score += 20.0;
            } else if basename.contains("r200") {
                score += 15.0;
            } else if basename.contains("vir") {
                score += 10.0;
            }
        }
        Role::Pos => {}
    }
    score
}

/// Collect and rank candidates for every role.
pub fn detect_candidates(descriptors: &[DatasetDescriptor]) -> SchemaCandidates {
    let mut pos = Vec::new();
    let mut ranked: BTreeMap<Role, Vec<(usize, Candidate)>> = BTreeMap::new();

    for (idx, d) in descriptors.iter().enumerate() {
        if is_position_shape(d) {
            pos.push(d.path.clone());
            continue;
        }
        if !is_column_shape(d) {
            continue;
        }
        let path = d.path.to_lowercase();
        let basename = path.rsplit('/').next().unwrap_or(&path);
        for (role, patterns) in role_patterns() {
            if patterns.iter().any(|re| re.is_match(basename)) {
                ranked.entry(*role).or_default().push((
                    idx,
                    Candidate {
                        path: d.path.clone(),
                        score: score(*role, &path),
                    },
                ));
            }
        }
    }

    let scalar = ranked
        .into_iter()
        .map(|(role, mut cands)| {
            cands.sort_by(|(ia, a), (ib, b)| b.score.total_cmp(&a.score).then(ia.cmp(ib)));
            (role, cands.into_iter().map(|(_, c)| c).collect())
        })
        .collect();

    SchemaCandidates { pos, scalar }
}

/// Assign each role to at most one dataset path. Never fails: roles without
/// candidates stay `None`.
pub fn detect(descriptors: &[DatasetDescriptor]) -> SchemaMap {
    let schema = detect_candidates(descriptors).best();
    log::debug!("detected schema {schema:?}");
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ElementKind;

    fn ds(path: &str, shape: &[usize]) -> DatasetDescriptor {
        DatasetDescriptor::new(path, shape.to_vec(), ElementKind::Float64)
    }

    #[test]
    fn unusual_names_still_resolve() {
        let schema = detect(&[
            ds("Group/UnknownMass", &[10]),
            ds("Hidden/SecretCoords", &[10, 3]),
        ]);
        assert_eq!(schema.mass.as_deref(), Some("Group/UnknownMass"));
        assert_eq!(schema.pos.as_deref(), Some("Hidden/SecretCoords"));
        assert_eq!(schema.id, None);
        assert_eq!(schema.parent_id, None);
        assert_eq!(schema.radius, None);
    }

    #[test]
    fn parent_links_are_not_taken_as_primary_ids() {
        let schema = detect(&[
            ds("Catalog/ParentID", &[5]),
            ds("Catalog/ParticleIDs", &[5]),
            ds("Catalog/Mass", &[5]),
            ds("Catalog/Position", &[5, 3]),
            ds("Catalog/Radius", &[5]),
        ]);
        assert_eq!(schema.id.as_deref(), Some("Catalog/ParticleIDs"));
        assert_eq!(schema.parent_id.as_deref(), Some("Catalog/ParentID"));
        assert_eq!(schema.mass.as_deref(), Some("Catalog/Mass"));
        assert_eq!(schema.radius.as_deref(), Some("Catalog/Radius"));
        assert_eq!(schema.pos.as_deref(), Some("Catalog/Position"));
    }

    #[test]
    fn first_position_shaped_array_wins() {
        let schema = detect(&[
            ds("a/Velocities", &[100, 3]),
            ds("a/Coordinates", &[3, 100]),
        ]);
        assert_eq!(schema.pos.as_deref(), Some("a/Velocities"));
    }

    #[test]
    fn position_shaped_arrays_are_not_scalar_candidates() {
        let c = detect_candidates(&[ds("halo_mass", &[1, 3])]);
        assert_eq!(c.pos, ["halo_mass"]);
        assert!(c.scalar.get(&Role::Mass).is_none());
    }

    #[test]
    fn shorter_names_and_exact_matches_score_higher() {
        let c = detect_candidates(&[
            ds("h/halo_mass_fof", &[4]),
            ds("h/mass", &[4]),
            ds("h/mvir", &[4]),
        ]);
        let paths = c.paths(Role::Mass);
        assert_eq!(paths, ["h/mass", "h/halo_mass_fof", "h/mvir"]);
        assert_eq!(score(Role::Mass, "h/mass"), 18.0);
    }

    #[test]
    fn ties_keep_scan_order() {
        let c = detect_candidates(&[ds("a/rvir", &[4]), ds("b/rvir", &[4])]);
        assert_eq!(c.best().radius.as_deref(), Some("a/rvir"));
    }

    #[test]
    fn one_array_can_serve_several_roles() {
        let c = detect_candidates(&[ds("h/host_index", &[4])]);
        assert_eq!(c.paths(Role::Id), ["h/host_index"]);
        assert_eq!(c.paths(Role::ParentId), ["h/host_index"]);
        // The id penalty for host-like paths applies: 5 - 50 - 5
        assert_eq!(c.scalar[&Role::Id][0].score, -50.0);
    }

    #[test]
    fn role_words_in_group_names_do_not_make_candidates() {
        let c = detect_candidates(&[
            ds("Mass/values", &[10]),
            ds("Halo/RVir/data", &[10]),
            ds("HostGroup/Mvir", &[10]),
            ds("p", &[10, 3]),
        ]);
        assert_eq!(c.paths(Role::Mass), ["HostGroup/Mvir"]);
        assert!(c.paths(Role::Radius).is_empty());
        assert!(c.paths(Role::ParentId).is_empty());
        assert_eq!(c.best().pos.as_deref(), Some("p"));
    }

    #[test]
    fn inconsistent_rank_and_shape_never_panic() {
        let broken = |shape: Vec<usize>, rank: usize| DatasetDescriptor {
            path: "h/mass".into(),
            shape,
            element_kind: ElementKind::Float64,
            rank,
        };
        let schema = detect(&[broken(vec![], 2), broken(vec![4], 2), broken(vec![5, 5], 1)]);
        assert_eq!(schema.pos, None);
        assert_eq!(schema.mass.as_deref(), Some("h/mass"));
    }

    #[test]
    fn wide_tables_are_ignored() {
        let schema = detect(&[ds("table/mass", &[10, 4])]);
        assert_eq!(schema, SchemaMap::default());
    }
}
