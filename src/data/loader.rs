use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::container::{join_path, ArrayContainer, MemoryContainer, NdArray};
use super::error::{CatalogError, Result};
use super::model::{CatalogRecordSet, DatasetDescriptor, Role, SchemaMap};
use super::scanner::scan;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Flat table formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Parquet,
}

/// An opened catalog file: either a hierarchical container or a flat table.
pub enum CatalogFile {
    Hierarchical(Box<dyn ArrayContainer>),
    Tabular { path: PathBuf, format: TableFormat },
}

/// Open a catalog file.  Dispatch by extension.
///
/// Supported formats:
/// * `.h5` / `.hdf5` – HDF5 container (requires the `hdf5` feature)
/// * `.json`         – JSON container, see [`MemoryContainer`]
/// * `.csv`          – header row plus one halo per line
/// * `.parquet`      – one halo per row
pub fn open_catalog(path: &Path) -> Result<CatalogFile> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "h5" | "hdf5" => open_hdf5(path),
        "json" => Ok(CatalogFile::Hierarchical(Box::new(MemoryContainer::open(
            path,
        )?))),
        "csv" => Ok(CatalogFile::Tabular {
            path: path.to_path_buf(),
            format: TableFormat::Csv,
        }),
        "parquet" | "pq" => Ok(CatalogFile::Tabular {
            path: path.to_path_buf(),
            format: TableFormat::Parquet,
        }),
        other => Err(CatalogError::UnsupportedFormat(format!(".{other}"))),
    }
}

#[cfg(feature = "hdf5")]
fn open_hdf5(path: &Path) -> Result<CatalogFile> {
    Ok(CatalogFile::Hierarchical(Box::new(
        super::hdf5_file::Hdf5Container::open(path)?,
    )))
}

#[cfg(not(feature = "hdf5"))]
fn open_hdf5(path: &Path) -> Result<CatalogFile> {
    Err(CatalogError::UnsupportedFormat(format!(
        "{}: built without HDF5 support (enable the `hdf5` feature)",
        path.display()
    )))
}

impl CatalogFile {
    pub fn is_hierarchical(&self) -> bool {
        matches!(self, CatalogFile::Hierarchical(_))
    }

    /// Leaf arrays of a hierarchical container; flat tables have none.
    pub fn descriptors(&self) -> Result<Vec<DatasetDescriptor>> {
        match self {
            CatalogFile::Hierarchical(container) => scan(container.as_ref()),
            CatalogFile::Tabular { .. } => Ok(Vec::new()),
        }
    }

    /// Read the canonical record set. The schema map only applies to
    /// hierarchical containers.
    pub fn read(&self, schema: Option<&SchemaMap>) -> Result<CatalogRecordSet> {
        let records = match self {
            CatalogFile::Hierarchical(container) => read(container.as_ref(), schema)?,
            CatalogFile::Tabular { path, format } => read_table(path, *format)?,
        };
        log::info!("loaded {} halos", records.len());
        Ok(records)
    }
}

/// Read a hierarchical container into a record set.
///
/// With a schema map every mapped role is loaded from exactly that path;
/// without one the built-in default layout is tried.
pub fn read(container: &dyn ArrayContainer, schema: Option<&SchemaMap>) -> Result<CatalogRecordSet> {
    let columns = match schema {
        Some(map) => read_mapped(container, map)?,
        None => read_default_layout(container)?,
    };
    columns.assemble(container.name())
}

/// Read a flat table into a record set.
pub fn read_table(path: &Path, format: TableFormat) -> Result<CatalogRecordSet> {
    let columns = match format {
        TableFormat::Csv => read_csv(path)?,
        TableFormat::Parquet => read_parquet(path)?,
    };
    columns.assemble(&path.display().to_string())
}

// ---------------------------------------------------------------------------
// Column assembly shared by every adapter
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RawColumns {
    xyz: Option<[Vec<f64>; 3]>,
    mass: Option<Vec<f64>>,
    radius: Option<Vec<f64>>,
    id: Option<Vec<i64>>,
    parent_id: Option<Vec<i64>>,
}

impl RawColumns {
    fn assemble(self, source: &str) -> Result<CatalogRecordSet> {
        let [x, y, z] = match self.xyz {
            Some(xyz) if !xyz[0].is_empty() => xyz,
            _ => return Err(CatalogError::MissingCoordinates(source.to_string())),
        };
        let mass = self.mass.unwrap_or_else(|| {
            log::warn!("{source}: no mass array, using unit masses");
            vec![1.0; x.len()]
        });

        let mut records = CatalogRecordSet::new(x, y, z, mass)?;
        if let Some(radius) = self.radius {
            records = records.with_radius(radius)?;
        }
        if let Some(id) = self.id {
            records = records.with_id(id)?;
        }
        if let Some(parent_id) = self.parent_id {
            records = records.with_parent_id(parent_id)?;
        }
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Hierarchical containers
// ---------------------------------------------------------------------------

fn require(container: &dyn ArrayContainer, path: &str) -> Result<NdArray> {
    container
        .read(path)?
        .ok_or_else(|| CatalogError::DatasetNotFound(path.to_string()))
}

fn read_mapped(container: &dyn ArrayContainer, schema: &SchemaMap) -> Result<RawColumns> {
    let mut cols = RawColumns::default();
    if let Some(path) = schema.get(Role::Pos) {
        cols.xyz = Some(require(container, path)?.into_xyz(path)?);
    }
    if let Some(path) = schema.get(Role::Mass) {
        cols.mass = Some(require(container, path)?.into_f64_column(path)?);
    }
    if let Some(path) = schema.get(Role::Radius) {
        cols.radius = Some(require(container, path)?.into_f64_column(path)?);
    }
    if let Some(path) = schema.get(Role::Id) {
        cols.id = Some(require(container, path)?.into_i64_column(path)?);
    }
    if let Some(path) = schema.get(Role::ParentId) {
        cols.parent_id = Some(require(container, path)?.into_i64_column(path)?);
    }
    Ok(cols)
}

/// Group holding the particles in simulation snapshots; the root otherwise.
const DEFAULT_GROUP: &str = "PartType1";
const MASS_NAMES: &[&str] = &["Masses", "Mass", "mass"];
const RADIUS_NAMES: &[&str] = &["Radius", "radius", "r"];

/// A way of finding coordinates under a base group; `Ok(None)` means "not
/// here, try the next one".
type CoordinateAdapter = fn(&dyn ArrayContainer, &str) -> Result<Option<[Vec<f64>; 3]>>;

const COORDINATE_ADAPTERS: &[CoordinateAdapter] = &[coordinates_array, separate_axes];

fn coordinates_array(container: &dyn ArrayContainer, base: &str) -> Result<Option<[Vec<f64>; 3]>> {
    let path = join_path(base, "Coordinates");
    match container.read(&path)? {
        Some(arr) => arr.into_xyz(&path).map(Some),
        None => Ok(None),
    }
}

fn separate_axes(container: &dyn ArrayContainer, base: &str) -> Result<Option<[Vec<f64>; 3]>> {
    let mut axes = Vec::with_capacity(3);
    for axis in ["x", "y", "z"] {
        let path = join_path(base, axis);
        match container.read(&path)? {
            Some(arr) => axes.push(arr.into_f64_column(&path)?),
            None => return Ok(None),
        }
    }
    let z = axes.pop().unwrap_or_default();
    let y = axes.pop().unwrap_or_default();
    let x = axes.pop().unwrap_or_default();
    Ok(Some([x, y, z]))
}

fn first_present(
    container: &dyn ArrayContainer,
    base: &str,
    names: &[&str],
) -> Result<Option<Vec<f64>>> {
    for name in names {
        let path = join_path(base, name);
        if let Some(arr) = container.read(&path)? {
            return arr.into_f64_column(&path).map(Some);
        }
    }
    Ok(None)
}

fn read_default_layout(container: &dyn ArrayContainer) -> Result<RawColumns> {
    let base = if container.is_group(DEFAULT_GROUP) {
        DEFAULT_GROUP
    } else {
        ""
    };

    let mut cols = RawColumns::default();
    for adapter in COORDINATE_ADAPTERS {
        if let Some(xyz) = adapter(container, base)? {
            cols.xyz = Some(xyz);
            break;
        }
    }
    cols.mass = first_present(container, base, MASS_NAMES)?;
    cols.radius = first_present(container, base, RADIUS_NAMES)?;
    Ok(cols)
}

// ---------------------------------------------------------------------------
// Flat tables
// ---------------------------------------------------------------------------

const MASS_ALIASES: &[&str] = &["mass", "m", "masses"];
const RADIUS_ALIASES: &[&str] = &["radius", "r"];
const ID_ALIASES: &[&str] = &["id"];
const PARENT_ALIASES: &[&str] = &["parent_id", "parentid", "parent"];

/// Column indices resolved from a header row.
struct ColumnPlan {
    xyz: [usize; 3],
    mass: Option<usize>,
    radius: Option<usize>,
    id: Option<usize>,
    parent_id: Option<usize>,
}

impl ColumnPlan {
    /// Match header names case-insensitively (after trimming) against the
    /// alias lists; the first alias present wins.
    fn resolve<S: AsRef<str>>(headers: &[S], source: &str) -> Result<Self> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| h.as_ref().trim().to_lowercase())
            .collect();
        let find = |aliases: &[&str]| {
            aliases
                .iter()
                .find_map(|alias| names.iter().position(|n| n == alias))
        };

        let (Some(x), Some(y), Some(z)) = (find(&["x"]), find(&["y"]), find(&["z"])) else {
            return Err(CatalogError::MissingCoordinates(source.to_string()));
        };
        Ok(ColumnPlan {
            xyz: [x, y, z],
            mass: find(MASS_ALIASES),
            radius: find(RADIUS_ALIASES),
            id: find(ID_ALIASES),
            parent_id: find(PARENT_ALIASES),
        })
    }
}

fn parse_float(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Some(f64::NAN);
    }
    cell.parse().ok()
}

fn parse_int(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    cell.parse::<i64>().ok().or_else(|| {
        let f = cell.parse::<f64>().ok()?;
        (f.fract() == 0.0).then_some(f as i64)
    })
}

fn read_csv(path: &Path) -> Result<RawColumns> {
    let source = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let plan = ColumnPlan::resolve(&headers, &source)?;

    let mut xyz = [Vec::new(), Vec::new(), Vec::new()];
    let mut mass = plan.mass.map(|_| Vec::new());
    let mut radius = plan.radius.map(|_| Vec::new());
    let mut id = plan.id.map(|_| Vec::new());
    let mut parent_id = plan.parent_id.map(|_| Vec::new());

    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let float_at = |idx: usize| -> Result<f64> {
            let cell = record.get(idx).unwrap_or("");
            parse_float(cell).ok_or_else(|| {
                CatalogError::Parse(format!(
                    "{source} row {row_no}, column '{}': '{cell}' is not a number",
                    headers[idx]
                ))
            })
        };
        let int_at = |idx: usize| -> Result<i64> {
            let cell = record.get(idx).unwrap_or("");
            parse_int(cell).ok_or_else(|| {
                CatalogError::Parse(format!(
                    "{source} row {row_no}, column '{}': '{cell}' is not an integer",
                    headers[idx]
                ))
            })
        };

        for (col, idx) in xyz.iter_mut().zip(plan.xyz) {
            col.push(float_at(idx)?);
        }
        if let (Some(col), Some(idx)) = (mass.as_mut(), plan.mass) {
            col.push(float_at(idx)?);
        }
        if let (Some(col), Some(idx)) = (radius.as_mut(), plan.radius) {
            col.push(float_at(idx)?);
        }
        if let (Some(col), Some(idx)) = (id.as_mut(), plan.id) {
            col.push(int_at(idx)?);
        }
        if let (Some(col), Some(idx)) = (parent_id.as_mut(), plan.parent_id) {
            col.push(int_at(idx)?);
        }
    }

    Ok(RawColumns {
        xyz: Some(xyz),
        mass,
        radius,
        id,
        parent_id,
    })
}

fn read_parquet(path: &Path) -> Result<RawColumns> {
    let source = path.display().to_string();
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let field_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let plan = ColumnPlan::resolve(&field_names, &source)?;
    let reader = builder.build()?;

    let mut xyz = [Vec::new(), Vec::new(), Vec::new()];
    let mut mass = plan.mass.map(|_| Vec::new());
    let mut radius = plan.radius.map(|_| Vec::new());
    let mut id = plan.id.map(|_| Vec::new());
    let mut parent_id = plan.parent_id.map(|_| Vec::new());

    for batch in reader {
        let batch = batch?;
        for (col, idx) in xyz.iter_mut().zip(plan.xyz) {
            col.extend(float_values(batch.column(idx))?);
        }
        if let (Some(col), Some(idx)) = (mass.as_mut(), plan.mass) {
            col.extend(float_values(batch.column(idx))?);
        }
        if let (Some(col), Some(idx)) = (radius.as_mut(), plan.radius) {
            col.extend(float_values(batch.column(idx))?);
        }
        if let (Some(col), Some(idx)) = (id.as_mut(), plan.id) {
            col.extend(int_values(batch.column(idx), &field_names[idx])?);
        }
        if let (Some(col), Some(idx)) = (parent_id.as_mut(), plan.parent_id) {
            col.extend(int_values(batch.column(idx), &field_names[idx])?);
        }
    }

    Ok(RawColumns {
        xyz: Some(xyz),
        mass,
        radius,
        id,
        parent_id,
    })
}

// -- Arrow helpers --

/// Any numeric Arrow column as floats; nulls become NaN.
fn float_values(col: &ArrayRef) -> Result<Vec<f64>> {
    let cast_col = cast(col, &DataType::Float64)?;
    let values = cast_col.as_primitive::<Float64Type>();
    Ok(values.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// Any numeric Arrow column as integers; nulls are an error.
fn int_values(col: &ArrayRef, name: &str) -> Result<Vec<i64>> {
    let cast_col = cast(col, &DataType::Int64)?;
    let values = cast_col.as_primitive::<Int64Type>();
    if values.null_count() > 0 {
        return Err(CatalogError::Parse(format!(
            "column '{name}' has {} null identifiers",
            values.null_count()
        )));
    }
    Ok(values.values().to_vec())
}
