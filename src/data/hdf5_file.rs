//! HDF5 containers (cargo feature `hdf5`).

use std::path::Path;

use hdf5::types::{FloatSize, IntSize, TypeDescriptor};

use super::container::{ArrayContainer, ArrayData, Entry, NdArray};
use super::error::{CatalogError, Result};
use super::model::ElementKind;

/// An open HDF5 file. Members are listed in the library's name order.
pub struct Hdf5Container {
    file: hdf5::File,
    label: String,
}

fn read_err(e: hdf5::Error) -> CatalogError {
    CatalogError::ContainerRead(e.to_string())
}

/// The stored type, named the way numpy names dtypes.
fn element_kind(descriptor: &TypeDescriptor) -> ElementKind {
    match descriptor {
        TypeDescriptor::Float(FloatSize::U8) => ElementKind::Float64,
        TypeDescriptor::Float(FloatSize::U4) => ElementKind::Float32,
        TypeDescriptor::Integer(IntSize::U8) => ElementKind::Int64,
        TypeDescriptor::Integer(IntSize::U4) => ElementKind::Int32,
        TypeDescriptor::Integer(size) => ElementKind::Other(format!("int{}", *size as usize * 8)),
        TypeDescriptor::Unsigned(size) => ElementKind::Other(format!("uint{}", *size as usize * 8)),
        other => ElementKind::Other(other.to_string()),
    }
}

/// In-memory type a dataset is read as; narrower and unsigned integers are
/// widened by the library on read.
fn read_as(descriptor: &TypeDescriptor) -> Option<ElementKind> {
    match descriptor {
        TypeDescriptor::Float(FloatSize::U8) => Some(ElementKind::Float64),
        TypeDescriptor::Float(_) => Some(ElementKind::Float32),
        TypeDescriptor::Integer(IntSize::U8) | TypeDescriptor::Unsigned(IntSize::U8) => {
            Some(ElementKind::Int64)
        }
        TypeDescriptor::Unsigned(IntSize::U4) => Some(ElementKind::Int64),
        TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => Some(ElementKind::Int32),
        _ => None,
    }
}

impl Hdf5Container {
    pub fn open(path: &Path) -> Result<Self> {
        let file = hdf5::File::open(path)
            .map_err(|e| CatalogError::ContainerRead(format!("{}: {e}", path.display())))?;
        Ok(Hdf5Container {
            file,
            label: path.display().to_string(),
        })
    }

    fn group_at(&self, path: &str) -> hdf5::Result<hdf5::Group> {
        if path.is_empty() {
            self.file.group("/")
        } else {
            self.file.group(path)
        }
    }
}

impl ArrayContainer for Hdf5Container {
    fn name(&self) -> &str {
        &self.label
    }

    fn entries(&self, group: &str) -> Result<Vec<Entry>> {
        let g = self.group_at(group).map_err(read_err)?;
        let mut entries = Vec::new();
        for name in g.member_names().map_err(read_err)? {
            if let Ok(ds) = g.dataset(&name) {
                let kind = ds
                    .dtype()
                    .and_then(|t| t.to_descriptor())
                    .map(|d| element_kind(&d))
                    .unwrap_or_else(|_| ElementKind::Other("unknown".into()));
                entries.push(Entry::Dataset {
                    name,
                    shape: ds.shape(),
                    element_kind: kind,
                });
            } else if g.group(&name).is_ok() {
                entries.push(Entry::Group(name));
            }
        }
        Ok(entries)
    }

    fn is_group(&self, path: &str) -> bool {
        self.group_at(path).is_ok()
    }

    fn read(&self, path: &str) -> Result<Option<NdArray>> {
        let Ok(ds) = self.file.dataset(path) else {
            return Ok(None);
        };
        let descriptor = ds.dtype().and_then(|t| t.to_descriptor()).map_err(read_err)?;
        let data = match read_as(&descriptor) {
            Some(ElementKind::Float64) => ArrayData::Float64(ds.read_raw::<f64>().map_err(read_err)?),
            Some(ElementKind::Float32) => ArrayData::Float32(ds.read_raw::<f32>().map_err(read_err)?),
            Some(ElementKind::Int64) => ArrayData::Int64(ds.read_raw::<i64>().map_err(read_err)?),
            Some(ElementKind::Int32) => ArrayData::Int32(ds.read_raw::<i32>().map_err(read_err)?),
            _ => {
                return Err(CatalogError::ContainerRead(format!(
                    "dataset '{path}' has non-numeric type {descriptor}"
                )))
            }
        };
        NdArray::new(ds.shape(), data).map(Some)
    }
}
