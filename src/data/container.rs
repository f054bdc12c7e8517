use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{CatalogError, Result};
use super::model::ElementKind;

// ---------------------------------------------------------------------------
// Numeric arrays
// ---------------------------------------------------------------------------

/// Flat storage of a dataset's elements, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "values", rename_all = "lowercase")]
pub enum ArrayData {
    Float64(Vec<f64>),
    Float32(Vec<f32>),
    Int64(Vec<i64>),
    Int32(Vec<i32>),
}

impl ArrayData {
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Float64(v) => v.len(),
            ArrayData::Float32(v) => v.len(),
            ArrayData::Int64(v) => v.len(),
            ArrayData::Int32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            ArrayData::Float64(_) => ElementKind::Float64,
            ArrayData::Float32(_) => ElementKind::Float32,
            ArrayData::Int64(_) => ElementKind::Int64,
            ArrayData::Int32(_) => ElementKind::Int32,
        }
    }

    /// Coerce to the engine's floating-point representation.
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            ArrayData::Float64(v) => v.clone(),
            ArrayData::Float32(v) => v.iter().map(|&x| x as f64).collect(),
            ArrayData::Int64(v) => v.iter().map(|&x| x as f64).collect(),
            ArrayData::Int32(v) => v.iter().map(|&x| x as f64).collect(),
        }
    }

    /// Coerce to the engine's integer representation (floats truncate).
    pub fn to_i64(&self) -> Vec<i64> {
        match self {
            ArrayData::Float64(v) => v.iter().map(|&x| x as i64).collect(),
            ArrayData::Float32(v) => v.iter().map(|&x| x as i64).collect(),
            ArrayData::Int64(v) => v.clone(),
            ArrayData::Int32(v) => v.iter().map(|&x| x as i64).collect(),
        }
    }
}

/// An n-dimensional array read out of a container.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    pub shape: Vec<usize>,
    pub data: ArrayData,
}

impl NdArray {
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(CatalogError::ContainerRead(format!(
                "shape {shape:?} needs {expected} elements, found {}",
                data.len()
            )));
        }
        Ok(NdArray { shape, data })
    }

    /// One-dimensional float array.
    pub fn vector(values: Vec<f64>) -> Self {
        NdArray {
            shape: vec![values.len()],
            data: ArrayData::Float64(values),
        }
    }

    /// `(N, 3)` float array from rows.
    pub fn rows3(rows: &[[f64; 3]]) -> Self {
        NdArray {
            shape: vec![rows.len(), 3],
            data: ArrayData::Float64(rows.iter().flatten().copied().collect()),
        }
    }

    /// Split a position array into x, y, z columns.
    ///
    /// `(N, 3)` is read row-wise and `(3, N)` column-wise; either way column 0
    /// becomes x.
    pub fn into_xyz(self, path: &str) -> Result<[Vec<f64>; 3]> {
        let values = self.data.to_f64();
        match self.shape.as_slice() {
            [n, 3] => {
                let mut cols = [
                    Vec::with_capacity(*n),
                    Vec::with_capacity(*n),
                    Vec::with_capacity(*n),
                ];
                for row in values.chunks_exact(3) {
                    for (col, v) in cols.iter_mut().zip(row) {
                        col.push(*v);
                    }
                }
                Ok(cols)
            }
            [3, n] => Ok([
                values[..*n].to_vec(),
                values[*n..2 * n].to_vec(),
                values[2 * n..].to_vec(),
            ]),
            _ => Err(CatalogError::ShapeMismatch {
                path: path.to_string(),
                shape: self.shape,
                expected: "(N, 3) or (3, N)",
            }),
        }
    }

    fn check_column(&self, path: &str) -> Result<()> {
        match self.shape.as_slice() {
            [_] | [_, 1] | [1, _] => Ok(()),
            _ => Err(CatalogError::ShapeMismatch {
                path: path.to_string(),
                shape: self.shape.clone(),
                expected: "(N,), (N, 1) or (1, N)",
            }),
        }
    }

    /// Flatten a single-column array to floats.
    pub fn into_f64_column(self, path: &str) -> Result<Vec<f64>> {
        self.check_column(path)?;
        Ok(self.data.to_f64())
    }

    /// Flatten a single-column array to integers.
    pub fn into_i64_column(self, path: &str) -> Result<Vec<i64>> {
        self.check_column(path)?;
        Ok(self.data.to_i64())
    }
}

// ---------------------------------------------------------------------------
// Container abstraction
// ---------------------------------------------------------------------------

/// A direct member of a group.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Group(String),
    Dataset {
        name: String,
        shape: Vec<usize>,
        element_kind: ElementKind,
    },
}

/// A hierarchical container of named groups holding numeric arrays.
///
/// Paths are slash separated and relative to the root; `""` names the root.
pub trait ArrayContainer {
    /// Human-readable name used in error messages.
    fn name(&self) -> &str;

    /// Members of the group at `group`, in the container's own iteration order.
    fn entries(&self, group: &str) -> Result<Vec<Entry>>;

    /// Whether `path` names a group.
    fn is_group(&self, path: &str) -> bool;

    /// Read the dataset at `path`; `Ok(None)` when there is no dataset there.
    fn read(&self, path: &str) -> Result<Option<NdArray>>;
}

/// Join a group path and a member name.
pub fn join_path(group: &str, name: &str) -> String {
    if group.is_empty() {
        name.to_string()
    } else {
        format!("{group}/{name}")
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// MemoryContainer – ordered in-memory tree, also the `.json` container format
// ---------------------------------------------------------------------------

/// A group or dataset inside a [`MemoryContainer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Group {
        name: String,
        members: Vec<Node>,
    },
    Dataset {
        name: String,
        shape: Vec<usize>,
        data: ArrayData,
    },
}

impl Node {
    fn name(&self) -> &str {
        match self {
            Node::Group { name, .. } | Node::Dataset { name, .. } => name,
        }
    }
}

/// In-memory container. Member order is insertion (or file) order.
///
/// On disk it is a JSON document:
///
/// ```json
/// { "members": [
///     { "kind": "group", "name": "Catalog", "members": [
///         { "kind": "dataset", "name": "Mass", "shape": [2],
///           "data": { "dtype": "float64", "values": [1e12, 3e11] } } ] } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryContainer {
    #[serde(skip)]
    label: String,
    members: Vec<Node>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        MemoryContainer {
            label: "<memory>".to_string(),
            members: Vec::new(),
        }
    }

    /// Parse a JSON container document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let mut container: MemoryContainer = serde_json::from_str(text)?;
        container.label = "<memory>".to_string();
        validate_nodes(&container.members, "")?;
        Ok(container)
    }

    /// Load a `.json` container from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::ContainerRead(format!("{}: {e}", path.display()))
        })?;
        let mut container = Self::from_json_str(&text)
            .map_err(|e| CatalogError::ContainerRead(format!("{}: {e}", path.display())))?;
        container.label = path.display().to_string();
        Ok(container)
    }

    /// Write the container as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    /// Builder form of [`MemoryContainer::insert`].
    pub fn with_dataset(mut self, path: &str, array: NdArray) -> Result<Self> {
        self.insert(path, array)?;
        Ok(self)
    }

    /// Store `array` at `path`, creating intermediate groups. An existing
    /// dataset at `path` is replaced.
    pub fn insert(&mut self, path: &str, array: NdArray) -> Result<()> {
        let parts: Vec<&str> = segments(path).collect();
        let Some((leaf, groups)) = parts.split_last() else {
            return Err(CatalogError::ContainerRead("empty dataset path".into()));
        };

        let mut members = &mut self.members;
        for group in groups {
            let idx = match members.iter().position(|m| m.name() == *group) {
                Some(idx) => idx,
                None => {
                    members.push(Node::Group {
                        name: group.to_string(),
                        members: Vec::new(),
                    });
                    members.len() - 1
                }
            };
            members = match &mut members[idx] {
                Node::Group { members, .. } => members,
                Node::Dataset { .. } => {
                    return Err(CatalogError::ContainerRead(format!(
                        "'{group}' in '{path}' is a dataset, not a group"
                    )))
                }
            };
        }

        let node = Node::Dataset {
            name: leaf.to_string(),
            shape: array.shape,
            data: array.data,
        };
        match members.iter().position(|m| m.name() == *leaf) {
            Some(idx) => members[idx] = node,
            None => members.push(node),
        }
        Ok(())
    }

    fn lookup(&self, path: &str) -> Option<&Node> {
        let mut members = &self.members;
        let mut found = None;
        for seg in segments(path) {
            let node = members.iter().find(|m| m.name() == seg)?;
            members = match node {
                Node::Group { members, .. } => members,
                Node::Dataset { .. } => &EMPTY,
            };
            found = Some(node);
        }
        found
    }
}

static EMPTY: Vec<Node> = Vec::new();

fn validate_nodes(nodes: &[Node], group: &str) -> Result<()> {
    for node in nodes {
        match node {
            Node::Group { name, members } => validate_nodes(members, &join_path(group, name))?,
            Node::Dataset { name, shape, data } => {
                let expected: usize = shape.iter().product();
                if expected != data.len() {
                    return Err(CatalogError::ContainerRead(format!(
                        "dataset '{}' declares shape {shape:?} but holds {} values",
                        join_path(group, name),
                        data.len()
                    )));
                }
            }
        }
    }
    Ok(())
}

impl ArrayContainer for MemoryContainer {
    fn name(&self) -> &str {
        &self.label
    }

    fn entries(&self, group: &str) -> Result<Vec<Entry>> {
        let members = if segments(group).next().is_none() {
            &self.members
        } else {
            match self.lookup(group) {
                Some(Node::Group { members, .. }) => members,
                _ => {
                    return Err(CatalogError::ContainerRead(format!(
                        "no group '{group}' in {}",
                        self.label
                    )))
                }
            }
        };
        Ok(members
            .iter()
            .map(|node| match node {
                Node::Group { name, .. } => Entry::Group(name.clone()),
                Node::Dataset { name, shape, data } => Entry::Dataset {
                    name: name.clone(),
                    shape: shape.clone(),
                    element_kind: data.kind(),
                },
            })
            .collect())
    }

    fn is_group(&self, path: &str) -> bool {
        matches!(self.lookup(path), Some(Node::Group { .. }))
    }

    fn read(&self, path: &str) -> Result<Option<NdArray>> {
        match self.lookup(path) {
            Some(Node::Dataset { shape, data, .. }) => Ok(Some(NdArray {
                shape: shape.clone(),
                data: data.clone(),
            })),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_creates_groups_in_order() {
        let c = MemoryContainer::new()
            .with_dataset("Catalog/Mass", NdArray::vector(vec![1.0, 2.0]))
            .unwrap()
            .with_dataset("Catalog/Radius", NdArray::vector(vec![0.1, 0.2]))
            .unwrap()
            .with_dataset("Header", NdArray::vector(vec![0.0]))
            .unwrap();

        let root = c.entries("").unwrap();
        assert_eq!(root.len(), 2);
        assert_eq!(root[0], Entry::Group("Catalog".into()));
        assert!(c.is_group("Catalog"));
        assert!(!c.is_group("Catalog/Mass"));

        let names: Vec<String> = c
            .entries("Catalog")
            .unwrap()
            .into_iter()
            .map(|e| match e {
                Entry::Dataset { name, .. } => name,
                Entry::Group(name) => name,
            })
            .collect();
        assert_eq!(names, ["Mass", "Radius"]);
        assert!(c.read("Catalog/Missing").unwrap().is_none());
    }

    #[test]
    fn dataset_cannot_be_used_as_group() {
        let mut c = MemoryContainer::new();
        c.insert("a", NdArray::vector(vec![1.0])).unwrap();
        assert!(c.insert("a/b", NdArray::vector(vec![1.0])).is_err());
    }

    #[test]
    fn json_document_loads_and_validates_shapes() {
        let text = r#"{"members":[{"kind":"group","name":"G","members":[
            {"kind":"dataset","name":"ids","shape":[3],"data":{"dtype":"int64","values":[1,2,3]}}]}]}"#;
        let c = MemoryContainer::from_json_str(text).unwrap();
        let arr = c.read("G/ids").unwrap().unwrap();
        assert_eq!(arr.data.kind(), ElementKind::Int64);
        assert_eq!(arr.into_i64_column("G/ids").unwrap(), vec![1, 2, 3]);

        let bad = r#"{"members":[{"kind":"dataset","name":"m","shape":[4],"data":{"dtype":"float64","values":[1.0]}}]}"#;
        assert!(matches!(
            MemoryContainer::from_json_str(bad),
            Err(CatalogError::ContainerRead(_))
        ));
    }

    #[test]
    fn positions_split_from_either_orientation() {
        let rows = NdArray::rows3(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let [x, y, z] = rows.into_xyz("p").unwrap();
        assert_eq!((x, y, z), (vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]));

        let cols = NdArray::new(
            vec![3, 2],
            ArrayData::Float32(vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]),
        )
        .unwrap();
        let [x, y, z] = cols.into_xyz("p").unwrap();
        assert_eq!((x, y, z), (vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]));

        let flat = NdArray::vector(vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            flat.into_xyz("p"),
            Err(CatalogError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn column_arrays_accept_singleton_axis() {
        let arr = NdArray::new(vec![3, 1], ArrayData::Int32(vec![7, 8, 9])).unwrap();
        assert_eq!(arr.into_f64_column("c").unwrap(), vec![7.0, 8.0, 9.0]);

        let wide = NdArray::new(vec![2, 2], ArrayData::Int32(vec![1, 2, 3, 4])).unwrap();
        assert!(wide.into_i64_column("c").is_err());
    }
}
