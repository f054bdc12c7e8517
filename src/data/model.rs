use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{CatalogError, Result};

// ---------------------------------------------------------------------------
// Field – a named column of the canonical record set
// ---------------------------------------------------------------------------

/// Columns of a [`CatalogRecordSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    X,
    Y,
    Z,
    Mass,
    Radius,
    Id,
    ParentId,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::X => "x",
            Field::Y => "y",
            Field::Z => "z",
            Field::Mass => "mass",
            Field::Radius => "radius",
            Field::Id => "id",
            Field::ParentId => "parent_id",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Role – a semantic slot the schema detector fills
// ---------------------------------------------------------------------------

/// Semantic roles a stored dataset can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Mass,
    Pos,
    Id,
    ParentId,
    Radius,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Mass, Role::Pos, Role::Id, Role::ParentId, Role::Radius];

    /// Roles that resolve to a single-column dataset.
    pub const SCALAR: [Role; 4] = [Role::Mass, Role::Id, Role::ParentId, Role::Radius];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Mass => "mass",
            Role::Pos => "pos",
            Role::Id => "id",
            Role::ParentId => "parent_id",
            Role::Radius => "radius",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DatasetDescriptor – one leaf array found by the scanner
// ---------------------------------------------------------------------------

/// Stored element type of a dataset, named the way numpy names dtypes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementKind {
    Float64,
    Float32,
    Int64,
    Int32,
    /// Any other stored type by name: narrower or unsigned integers
    /// (`int16`, `uint64`) as well as strings, compounds and the like.
    Other(String),
}

impl ElementKind {
    pub fn is_numeric(&self) -> bool {
        match self {
            ElementKind::Other(name) => ["int", "uint", "float"].iter().any(|prefix| {
                name.strip_prefix(prefix)
                    .is_some_and(|bits| !bits.is_empty() && bits.bytes().all(|b| b.is_ascii_digit()))
            }),
            _ => true,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Float64 => f.write_str("float64"),
            ElementKind::Float32 => f.write_str("float32"),
            ElementKind::Int64 => f.write_str("int64"),
            ElementKind::Int32 => f.write_str("int32"),
            ElementKind::Other(name) => f.write_str(name),
        }
    }
}

impl From<String> for ElementKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "float64" => ElementKind::Float64,
            "float32" => ElementKind::Float32,
            "int64" => ElementKind::Int64,
            "int32" => ElementKind::Int32,
            _ => ElementKind::Other(s),
        }
    }
}

impl From<ElementKind> for String {
    fn from(kind: ElementKind) -> Self {
        kind.to_string()
    }
}

/// Path, shape and type of a leaf array inside a hierarchical container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    /// Slash-separated path relative to the container root, e.g. `Catalog/Mass`.
    pub path: String,
    pub shape: Vec<usize>,
    pub element_kind: ElementKind,
    pub rank: usize,
}

impl DatasetDescriptor {
    pub fn new(path: impl Into<String>, shape: Vec<usize>, element_kind: ElementKind) -> Self {
        let rank = shape.len();
        DatasetDescriptor {
            path: path.into(),
            shape,
            element_kind,
            rank,
        }
    }

    /// Last path segment.
    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

// ---------------------------------------------------------------------------
// SchemaMap – role → dataset path
// ---------------------------------------------------------------------------

/// Resolved assignment of semantic roles to dataset paths.
///
/// `None` means "not detected"; it never stands for a zero-filled column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMap {
    pub mass: Option<String>,
    pub pos: Option<String>,
    pub id: Option<String>,
    pub parent_id: Option<String>,
    pub radius: Option<String>,
}

impl SchemaMap {
    pub fn get(&self, role: Role) -> Option<&str> {
        match role {
            Role::Mass => self.mass.as_deref(),
            Role::Pos => self.pos.as_deref(),
            Role::Id => self.id.as_deref(),
            Role::ParentId => self.parent_id.as_deref(),
            Role::Radius => self.radius.as_deref(),
        }
    }

    pub fn set(&mut self, role: Role, path: Option<String>) {
        let slot = match role {
            Role::Mass => &mut self.mass,
            Role::Pos => &mut self.pos,
            Role::Id => &mut self.id,
            Role::ParentId => &mut self.parent_id,
            Role::Radius => &mut self.radius,
        };
        *slot = path;
    }
}

// ---------------------------------------------------------------------------
// CatalogRecordSet – canonical struct-of-arrays
// ---------------------------------------------------------------------------

/// Borrowed view of one record-set column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Column<'a> {
    Float(&'a [f64]),
    Int(&'a [i64]),
}

/// Canonical halo catalog: parallel arrays of equal length.
///
/// Constructed once by the loader and never mutated; filtering builds a new
/// value. `id`/`parent_id` consistency (unique ids, parents that exist or
/// `-1`) is assumed, not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogRecordSet {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    mass: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    radius: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<Vec<i64>>,
}

fn check_len(field: Field, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(CatalogError::LengthMismatch {
            field,
            expected,
            found,
        })
    }
}

impl CatalogRecordSet {
    /// Build a record set from the mandatory columns.
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>, mass: Vec<f64>) -> Result<Self> {
        let n = x.len();
        check_len(Field::Y, n, y.len())?;
        check_len(Field::Z, n, z.len())?;
        check_len(Field::Mass, n, mass.len())?;
        Ok(CatalogRecordSet {
            x,
            y,
            z,
            mass,
            ..Default::default()
        })
    }

    pub fn with_radius(mut self, radius: Vec<f64>) -> Result<Self> {
        check_len(Field::Radius, self.len(), radius.len())?;
        self.radius = Some(radius);
        Ok(self)
    }

    pub fn with_id(mut self, id: Vec<i64>) -> Result<Self> {
        check_len(Field::Id, self.len(), id.len())?;
        self.id = Some(id);
        Ok(self)
    }

    pub fn with_parent_id(mut self, parent_id: Vec<i64>) -> Result<Self> {
        check_len(Field::ParentId, self.len(), parent_id.len())?;
        self.parent_id = Some(parent_id);
        Ok(self)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn z(&self) -> &[f64] {
        &self.z
    }

    pub fn mass(&self) -> &[f64] {
        &self.mass
    }

    pub fn radius(&self) -> Option<&[f64]> {
        self.radius.as_deref()
    }

    pub fn id(&self) -> Option<&[i64]> {
        self.id.as_deref()
    }

    pub fn parent_id(&self) -> Option<&[i64]> {
        self.parent_id.as_deref()
    }

    /// Look up a column by name; optional columns that are absent fail with
    /// [`CatalogError::FieldNotFound`].
    pub fn column(&self, field: Field) -> Result<Column<'_>> {
        let col = match field {
            Field::X => Some(Column::Float(&self.x)),
            Field::Y => Some(Column::Float(&self.y)),
            Field::Z => Some(Column::Float(&self.z)),
            Field::Mass => Some(Column::Float(&self.mass)),
            Field::Radius => self.radius.as_deref().map(Column::Float),
            Field::Id => self.id.as_deref().map(Column::Int),
            Field::ParentId => self.parent_id.as_deref().map(Column::Int),
        };
        col.ok_or(CatalogError::FieldNotFound(field))
    }

    /// Keep the records whose mask entry is `true`, preserving order and the
    /// set of present columns.
    pub(crate) fn select(&self, mask: &[bool]) -> CatalogRecordSet {
        fn pick<T: Copy>(values: &[T], mask: &[bool]) -> Vec<T> {
            values
                .iter()
                .zip(mask)
                .filter(|(_, keep)| **keep)
                .map(|(v, _)| *v)
                .collect()
        }
        CatalogRecordSet {
            x: pick(&self.x, mask),
            y: pick(&self.y, mask),
            z: pick(&self.z, mask),
            mass: pick(&self.mass, mask),
            radius: self.radius.as_deref().map(|r| pick(r, mask)),
            id: self.id.as_deref().map(|v| pick(v, mask)),
            parent_id: self.parent_id.as_deref().map(|v| pick(v, mask)),
        }
    }
}
