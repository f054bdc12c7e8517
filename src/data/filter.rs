use serde::{Deserialize, Serialize};

use super::model::{CatalogRecordSet, Field};

// ---------------------------------------------------------------------------
// Filter bounds: sparse per-field range limits
// ---------------------------------------------------------------------------

/// Optional inclusive range limits. `None` means "no limit", never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterBounds {
    pub min_mass: Option<f64>,
    pub max_mass: Option<f64>,
    pub min_radius: Option<f64>,
    pub max_radius: Option<f64>,
    pub x_min: Option<f64>,
    pub x_max: Option<f64>,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
    pub z_min: Option<f64>,
    pub z_max: Option<f64>,
}

/// Which side of a range a bound limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Min,
    Max,
}

/// One named bound of [`FilterBounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKey {
    MinMass,
    MaxMass,
    MinRadius,
    MaxRadius,
    XMin,
    XMax,
    YMin,
    YMax,
    ZMin,
    ZMax,
}

impl BoundKey {
    pub const ALL: [BoundKey; 10] = [
        BoundKey::MinMass,
        BoundKey::MaxMass,
        BoundKey::MinRadius,
        BoundKey::MaxRadius,
        BoundKey::XMin,
        BoundKey::XMax,
        BoundKey::YMin,
        BoundKey::YMax,
        BoundKey::ZMin,
        BoundKey::ZMax,
    ];

    pub fn field(self) -> Field {
        match self {
            BoundKey::MinMass | BoundKey::MaxMass => Field::Mass,
            BoundKey::MinRadius | BoundKey::MaxRadius => Field::Radius,
            BoundKey::XMin | BoundKey::XMax => Field::X,
            BoundKey::YMin | BoundKey::YMax => Field::Y,
            BoundKey::ZMin | BoundKey::ZMax => Field::Z,
        }
    }

    pub fn side(self) -> Side {
        match self {
            BoundKey::MinMass
            | BoundKey::MinRadius
            | BoundKey::XMin
            | BoundKey::YMin
            | BoundKey::ZMin => Side::Min,
            _ => Side::Max,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BoundKey::MinMass => "min_mass",
            BoundKey::MaxMass => "max_mass",
            BoundKey::MinRadius => "min_radius",
            BoundKey::MaxRadius => "max_radius",
            BoundKey::XMin => "x_min",
            BoundKey::XMax => "x_max",
            BoundKey::YMin => "y_min",
            BoundKey::YMax => "y_max",
            BoundKey::ZMin => "z_min",
            BoundKey::ZMax => "z_max",
        }
    }
}

impl FilterBounds {
    pub fn get(&self, key: BoundKey) -> Option<f64> {
        *self.slot(key)
    }

    pub fn set(&mut self, key: BoundKey, value: Option<f64>) {
        *self.slot_mut(key) = value;
    }

    /// Builder form of [`FilterBounds::set`].
    pub fn with(mut self, key: BoundKey, value: f64) -> Self {
        self.set(key, Some(value));
        self
    }

    /// Bounds that are set, in [`BoundKey::ALL`] order.
    pub fn active(&self) -> impl Iterator<Item = (BoundKey, f64)> + '_ {
        BoundKey::ALL
            .into_iter()
            .filter_map(|key| self.get(key).map(|v| (key, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }

    fn slot(&self, key: BoundKey) -> &Option<f64> {
        match key {
            BoundKey::MinMass => &self.min_mass,
            BoundKey::MaxMass => &self.max_mass,
            BoundKey::MinRadius => &self.min_radius,
            BoundKey::MaxRadius => &self.max_radius,
            BoundKey::XMin => &self.x_min,
            BoundKey::XMax => &self.x_max,
            BoundKey::YMin => &self.y_min,
            BoundKey::YMax => &self.y_max,
            BoundKey::ZMin => &self.z_min,
            BoundKey::ZMax => &self.z_max,
        }
    }

    fn slot_mut(&mut self, key: BoundKey) -> &mut Option<f64> {
        match key {
            BoundKey::MinMass => &mut self.min_mass,
            BoundKey::MaxMass => &mut self.max_mass,
            BoundKey::MinRadius => &mut self.min_radius,
            BoundKey::MaxRadius => &mut self.max_radius,
            BoundKey::XMin => &mut self.x_min,
            BoundKey::XMax => &mut self.x_max,
            BoundKey::YMin => &mut self.y_min,
            BoundKey::YMax => &mut self.y_max,
            BoundKey::ZMin => &mut self.z_min,
            BoundKey::ZMax => &mut self.z_max,
        }
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Return a new record set holding the records inside every set bound.
///
/// Bounds are inclusive (`>=` for minimums, `<=` for maximums). Radius
/// bounds are skipped when the catalog has no radius column. Record order
/// and the set of present columns are preserved.
pub fn filter(records: &CatalogRecordSet, bounds: &FilterBounds) -> CatalogRecordSet {
    let mut mask = vec![true; records.len()];

    for (key, limit) in bounds.active() {
        let values = match key.field() {
            Field::X => records.x(),
            Field::Y => records.y(),
            Field::Z => records.z(),
            Field::Mass => records.mass(),
            Field::Radius => match records.radius() {
                Some(radius) => radius,
                None => continue,
            },
            Field::Id | Field::ParentId => continue,
        };
        let side = key.side();
        for (keep, &v) in mask.iter_mut().zip(values) {
            *keep &= match side {
                Side::Min => v >= limit,
                Side::Max => v <= limit,
            };
        }
    }

    let filtered = records.select(&mask);
    log::debug!("filter kept {} of {} halos", filtered.len(), records.len());
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CatalogRecordSet {
        CatalogRecordSet::new(
            vec![0.0, 10.0, 20.0, 30.0],
            vec![5.0, 5.0, 50.0, 50.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![1.0, 2.0, 3.0, 4.0],
        )
        .unwrap()
        .with_id(vec![1, 2, 3, 4])
        .unwrap()
    }

    #[test]
    fn min_mass_keeps_heavier_halos() {
        let rs = CatalogRecordSet::new(vec![0.0; 3], vec![0.0; 3], vec![0.0; 3], vec![1.0, 2.0, 3.0])
            .unwrap();
        let out = filter(&rs, &FilterBounds::default().with(BoundKey::MinMass, 2.0));
        assert_eq!(out.len(), 2);
        assert_eq!(out.mass(), [2.0, 3.0]);
        assert_eq!(out.x(), [0.0, 0.0]);
    }

    #[test]
    fn zero_is_a_real_threshold() {
        let rs = CatalogRecordSet::new(vec![-1.0, 1.0], vec![0.0; 2], vec![0.0; 2], vec![1.0; 2])
            .unwrap();
        let out = filter(&rs, &FilterBounds::default().with(BoundKey::XMin, 0.0));
        assert_eq!(out.x(), [1.0]);
        assert_eq!(filter(&rs, &FilterBounds::default()).len(), 2);
    }

    #[test]
    fn spatial_box_is_inclusive_and_keeps_columns_aligned() {
        let bounds = FilterBounds::default()
            .with(BoundKey::XMin, 10.0)
            .with(BoundKey::XMax, 30.0)
            .with(BoundKey::YMax, 50.0);
        let out = filter(&sample(), &bounds);
        assert_eq!(out.x(), [10.0, 20.0, 30.0]);
        assert_eq!(out.id(), Some(&[2, 3, 4][..]));
        assert!(out.radius().is_none());
    }

    #[test]
    fn radius_bounds_are_ignored_without_radius() {
        let bounds = FilterBounds::default().with(BoundKey::MinRadius, 100.0);
        assert_eq!(filter(&sample(), &bounds), sample());
    }

    #[test]
    fn radius_bounds_apply_when_present() {
        let rs = sample().with_radius(vec![0.5, 1.0, 1.5, 2.0]).unwrap();
        let bounds = FilterBounds::default()
            .with(BoundKey::MinRadius, 1.0)
            .with(BoundKey::MaxRadius, 1.5);
        let out = filter(&rs, &bounds);
        assert_eq!(out.radius(), Some(&[1.0, 1.5][..]));
        assert_eq!(out.mass(), [2.0, 3.0]);
    }

    #[test]
    fn bounds_deserialize_sparsely() {
        let b: FilterBounds = serde_json::from_str(r#"{"min_mass": 2.5, "z_max": 0}"#).unwrap();
        assert_eq!(b.min_mass, Some(2.5));
        assert_eq!(b.z_max, Some(0.0));
        assert_eq!(b.active().count(), 2);
        assert!(FilterBounds::default().is_empty());
    }
}
