//! Descriptive statistics: totals, bounding box and mass/radius histograms.

use serde::Serialize;

use super::error::{CatalogError, Result};
use super::model::{CatalogRecordSet, Column, Field};

/// Edges of the logarithmic mass function (24 bins).
pub const LOG_MASS_EDGES: usize = 25;
/// Bins of the linear mass-function fallback.
pub const LINEAR_MASS_BINS: usize = 20;
/// Edges of the radius histogram (19 bins).
pub const RADIUS_EDGES: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

/// Counts per bin with the bin edges (`counts.len() + 1` of them) and centers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub counts: Vec<u64>,
    pub bin_edges: Vec<f64>,
    pub bin_centers: Vec<f64>,
}

/// `counts[i]` = number of halos with mass at or above bin `i`'s lower edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativeHistogram {
    pub counts: Vec<u64>,
    pub bin_centers: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub total_particles: usize,
    pub total_mass: f64,
    pub min_mass: f64,
    pub max_mass: f64,
    pub avg_mass: f64,
    pub bbox: BoundingBox,
    pub mass_function: Histogram,
    /// `None` (serialized as `null`) when masses are not all positive.
    pub cumulative_mass_function: Option<CumulativeHistogram>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_histogram: Option<Histogram>,
}

/// Result of [`stats`]; empty for an empty catalog (serializes as `{}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsReport {
    #[serde(flatten)]
    pub summary: Option<CatalogSummary>,
}

impl StatsReport {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
    }
}

/// Summarise a record set.
///
/// Non-finite values (NaN cells from tables) are left out of every
/// reduction. A column with no finite value at all fails with
/// [`CatalogError::EmptyReduction`].
pub fn stats(records: &CatalogRecordSet) -> Result<StatsReport> {
    let mass = records.mass();
    if mass.is_empty() {
        return Ok(StatsReport::default());
    }

    let (min_mass, max_mass) = finite_range(mass, Field::Mass)?;
    let (finite_count, total_mass) = mass
        .iter()
        .filter(|m| m.is_finite())
        .fold((0usize, 0.0), |(n, sum), &m| (n + 1, sum + m));
    let (x_min, x_max) = finite_range(records.x(), Field::X)?;
    let (y_min, y_max) = finite_range(records.y(), Field::Y)?;
    let (z_min, z_max) = finite_range(records.z(), Field::Z)?;

    let (mass_function, cumulative_mass_function) = if min_mass > 0.0 {
        let edges = log_edges(min_mass, max_mass, LOG_MASS_EDGES);
        let hist = histogram(mass, edges, geometric_centers);
        let cumulative = CumulativeHistogram {
            counts: reverse_cumsum(&hist.counts),
            bin_centers: hist.bin_centers.clone(),
        };
        (hist, Some(cumulative))
    } else {
        let (lo, hi) = widen_if_flat(min_mass, max_mass);
        let edges = linear_edges(lo, hi, LINEAR_MASS_BINS + 1);
        (histogram(mass, edges, arithmetic_centers), None)
    };

    let radius_histogram = records
        .radius()
        .filter(|r| !r.is_empty())
        .and_then(|radius| {
            let (r_min, r_max) = min_max(radius)?;
            (r_max > r_min).then(|| {
                histogram(
                    radius,
                    linear_edges(r_min, r_max, RADIUS_EDGES),
                    arithmetic_centers,
                )
            })
        });

    Ok(StatsReport {
        summary: Some(CatalogSummary {
            total_particles: mass.len(),
            total_mass,
            min_mass,
            max_mass,
            avg_mass: total_mass / finite_count as f64,
            bbox: BoundingBox {
                x_min,
                x_max,
                y_min,
                y_max,
                z_min,
                z_max,
            },
            mass_function,
            cumulative_mass_function,
            radius_histogram,
        }),
    })
}

/// `(min, max)` of a column.
///
/// Fails with [`CatalogError::FieldNotFound`] for an absent optional column
/// and [`CatalogError::EmptyReduction`] for an empty catalog.
pub fn field_range(records: &CatalogRecordSet, field: Field) -> Result<(f64, f64)> {
    let empty = CatalogError::EmptyReduction {
        op: "range",
        field,
    };
    match records.column(field)? {
        Column::Float([]) | Column::Int([]) => Err(empty),
        Column::Float(values) => min_max(values).ok_or(empty),
        Column::Int(values) => {
            let lo = values.iter().min().copied().ok_or(empty)?;
            let hi = values.iter().max().copied().unwrap_or(lo);
            Ok((lo as f64, hi as f64))
        }
    }
}

// ---------------------------------------------------------------------------
// Binning helpers
// ---------------------------------------------------------------------------

/// Min/max over the finite values; `None` when there are none.
fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn finite_range(values: &[f64], field: Field) -> Result<(f64, f64)> {
    min_max(values).ok_or(CatalogError::EmptyReduction { op: "min", field })
}

/// A zero-width range is widened by half a unit on each side.
fn widen_if_flat(lo: f64, hi: f64) -> (f64, f64) {
    if lo == hi {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

/// `n` evenly spaced edges from `lo` to `hi`, both ends exact.
fn linear_edges(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let step = (hi - lo) / (n - 1) as f64;
    let mut edges: Vec<f64> = (0..n).map(|i| lo + step * i as f64).collect();
    edges[n - 1] = hi;
    edges
}

/// `n` logarithmically spaced edges from `lo` to `hi`, both ends exact.
fn log_edges(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let mut edges: Vec<f64> = linear_edges(lo.log10(), hi.log10(), n)
        .into_iter()
        .map(|e| 10f64.powf(e))
        .collect();
    edges[0] = lo;
    edges[n - 1] = hi;
    edges
}

fn geometric_centers(edges: &[f64]) -> Vec<f64> {
    edges
        .windows(2)
        .map(|w| 10f64.powf((w[0].log10() + w[1].log10()) / 2.0))
        .collect()
}

fn arithmetic_centers(edges: &[f64]) -> Vec<f64> {
    edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
}

/// Count values into `[e_i, e_i+1)` bins, the last bin closed on the right.
/// Values outside the edges, and NaN, are not counted.
fn histogram(values: &[f64], edges: Vec<f64>, centers: fn(&[f64]) -> Vec<f64>) -> Histogram {
    let bins = edges.len() - 1;
    let (first, last) = (edges[0], edges[bins]);
    let mut counts = vec![0u64; bins];

    for &v in values {
        if !(v >= first && v <= last) {
            continue;
        }
        let bin = if v == last {
            bins - 1
        } else {
            // Number of edges <= v, minus one.
            edges.partition_point(|&e| e <= v).saturating_sub(1).min(bins - 1)
        };
        counts[bin] += 1;
    }

    Histogram {
        bin_centers: centers(&edges),
        counts,
        bin_edges: edges,
    }
}

fn reverse_cumsum(counts: &[u64]) -> Vec<u64> {
    let mut out = vec![0u64; counts.len()];
    let mut running = 0;
    for (slot, &c) in out.iter_mut().zip(counts).rev() {
        running += c;
        *slot = running;
    }
    out
}
