//! Property tests for the analysis engine
//!
//! 1. Filtering is idempotent, order independent and only keeps in-bound halos
//! 2. Histograms count every halo with the expected bin layout
//! 3. Hierarchy levels come out heaviest first

use halo_viewer::data::filter::Side;
use halo_viewer::data::stats::{LINEAR_MASS_BINS, LOG_MASS_EDGES};
use halo_viewer::data::{filter, hierarchy, stats, BoundKey, CatalogRecordSet, FilterBounds};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// (x, y, z, mass) rows with strictly positive masses.
fn positive_rows() -> impl Strategy<Value = Vec<(f64, f64, f64, f64)>> {
    prop::collection::vec(
        (-50.0f64..50.0, -50.0f64..50.0, -50.0f64..50.0, 1e10f64..1e15),
        1..80,
    )
}

/// Rows whose masses may be zero or negative.
fn mixed_rows() -> impl Strategy<Value = Vec<(f64, f64, f64, f64)>> {
    prop::collection::vec(
        (-50.0f64..50.0, -50.0f64..50.0, -50.0f64..50.0, -10.0f64..10.0),
        1..80,
    )
}

fn records_from(rows: &[(f64, f64, f64, f64)]) -> CatalogRecordSet {
    let radius: Vec<f64> = rows.iter().map(|r| r.3.abs().cbrt()).collect();
    CatalogRecordSet::new(
        rows.iter().map(|r| r.0).collect(),
        rows.iter().map(|r| r.1).collect(),
        rows.iter().map(|r| r.2).collect(),
        rows.iter().map(|r| r.3).collect(),
    )
    .and_then(|r| r.with_radius(radius))
    .unwrap()
}

fn bounds_strategy() -> impl Strategy<Value = FilterBounds> {
    (
        prop::option::of(-60.0f64..60.0),
        prop::option::of(-60.0f64..60.0),
        prop::option::of(-60.0f64..60.0),
        prop::option::of(1e10f64..1e15),
        prop::option::of(1e10f64..1e15),
    )
        .prop_map(|(x_min, x_max, z_max, min_mass, max_mass)| FilterBounds {
            x_min,
            x_max,
            z_max,
            min_mass,
            max_mass,
            ..Default::default()
        })
}

/// One bound set holding both sets' constraints; the tighter limit wins
/// where both bound the same key.
fn combine(a: &FilterBounds, b: &FilterBounds) -> FilterBounds {
    let mut out = *a;
    for (key, limit) in b.active() {
        let merged = match (out.get(key), key.side()) {
            (None, _) => limit,
            (Some(prev), Side::Min) => prev.max(limit),
            (Some(prev), Side::Max) => prev.min(limit),
        };
        out.set(key, Some(merged));
    }
    out
}

// ============================================================================
// Filtering
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn filter_is_idempotent(rows in positive_rows(), bounds in bounds_strategy()) {
        let records = records_from(&rows);
        let once = filter(&records, &bounds);
        let twice = filter(&once, &bounds);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn filter_order_does_not_matter(
        rows in positive_rows(),
        a in bounds_strategy(),
        b in bounds_strategy(),
    ) {
        let records = records_from(&rows);
        let ab = filter(&filter(&records, &a), &b);
        let ba = filter(&filter(&records, &b), &a);
        prop_assert_eq!(&ab, &ba);
        prop_assert_eq!(ab, filter(&records, &combine(&a, &b)));
    }

    #[test]
    fn filter_keeps_only_in_bound_halos(rows in positive_rows(), bounds in bounds_strategy()) {
        let records = records_from(&rows);
        let kept = filter(&records, &bounds);
        prop_assert!(kept.len() <= records.len());
        for (key, limit) in bounds.active() {
            let values = match key {
                BoundKey::XMin | BoundKey::XMax => kept.x(),
                BoundKey::ZMax => kept.z(),
                BoundKey::MinMass | BoundKey::MaxMass => kept.mass(),
                _ => continue,
            };
            for &v in values {
                match key {
                    BoundKey::XMin | BoundKey::MinMass => prop_assert!(v >= limit),
                    _ => prop_assert!(v <= limit),
                }
            }
        }
    }

    #[test]
    fn empty_bounds_keep_everything(rows in mixed_rows()) {
        let records = records_from(&rows);
        prop_assert_eq!(filter(&records, &FilterBounds::default()), records);
    }
}

// ============================================================================
// Statistics
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn log_mass_function_counts_every_halo(rows in positive_rows()) {
        let records = records_from(&rows);
        let report = stats(&records).unwrap();
        let summary = report.summary.as_ref().unwrap();

        let mf = &summary.mass_function;
        prop_assert_eq!(mf.counts.len(), LOG_MASS_EDGES - 1);
        prop_assert_eq!(mf.bin_centers.len(), LOG_MASS_EDGES - 1);
        prop_assert_eq!(mf.bin_edges.len(), LOG_MASS_EDGES);
        prop_assert_eq!(mf.counts.iter().sum::<u64>(), records.len() as u64);

        let cumulative = summary.cumulative_mass_function.as_ref().unwrap();
        prop_assert_eq!(cumulative.counts[0], records.len() as u64);
        prop_assert!(cumulative.counts.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn linear_fallback_without_positive_masses(rows in mixed_rows()) {
        let records = records_from(&rows);
        let report = stats(&records).unwrap();
        let summary = report.summary.as_ref().unwrap();
        if summary.min_mass <= 0.0 {
            prop_assert_eq!(summary.mass_function.counts.len(), LINEAR_MASS_BINS);
            prop_assert_eq!(summary.mass_function.bin_centers.len(), LINEAR_MASS_BINS);
            prop_assert!(summary.cumulative_mass_function.is_none());
        }
        prop_assert_eq!(
            summary.mass_function.counts.iter().sum::<u64>(),
            records.len() as u64
        );
    }

    #[test]
    fn summary_bounds_enclose_every_halo(rows in positive_rows()) {
        let records = records_from(&rows);
        let report = stats(&records).unwrap();
        let s = report.summary.as_ref().unwrap();
        prop_assert!(records.x().iter().all(|&x| s.bbox.x_min <= x && x <= s.bbox.x_max));
        prop_assert!(records.mass().iter().all(|&m| s.min_mass <= m && m <= s.max_mass));
        prop_assert!(s.avg_mass >= s.min_mass * (1.0 - 1e-12) && s.avg_mass <= s.max_mass * (1.0 + 1e-12));
    }
}

// ============================================================================
// Hierarchy
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn hierarchy_levels_are_sorted_by_mass(
        masses in prop::collection::vec(1e10f64..1e15, 1..60),
        parent_picks in prop::collection::vec(0usize..60, 60),
    ) {
        let n = masses.len();
        let ids: Vec<i64> = (0..n as i64).collect();
        // Each halo's parent is an earlier halo or the root.
        let parents: Vec<i64> = (0..n)
            .map(|i| if i == 0 { -1 } else { (parent_picks[i] % (i + 1)) as i64 - 1 })
            .collect();
        let records = CatalogRecordSet::new(vec![0.0; n], vec![0.0; n], vec![0.0; n], masses)
            .and_then(|r| r.with_id(ids.clone()))
            .and_then(|r| r.with_parent_id(parents.clone()))
            .unwrap();

        let top = hierarchy(&records, None).unwrap();
        prop_assert!(!top.is_empty());
        prop_assert!(top.windows(2).all(|w| w[0].mass >= w[1].mass));

        for node in &top {
            let children = hierarchy(&records, Some(node.id)).unwrap();
            prop_assert_eq!(node.has_children, !children.is_empty());
            prop_assert!(children.windows(2).all(|w| w[0].mass >= w[1].mass));
        }
    }
}
