/// Data layer: containers, schema detection, loading and analysis.
///
/// Architecture:
/// ```text
///  .h5 / .json container            .csv / .parquet table
///        │                                  │
///        ▼                                  │
///   ┌──────────┐                            │
///   │ scanner   │  leaf arrays → DatasetDescriptor
///   └──────────┘                            │
///        │                                  │
///        ▼                                  │
///   ┌──────────┐                            │
///   │ schema    │  descriptors → SchemaMap  │
///   └──────────┘  (user may edit)           │
///        │                                  │
///        ▼                                  ▼
///   ┌─────────────────────────────────────────┐
///   │ loader    container + SchemaMap / table │ → CatalogRecordSet
///   └─────────────────────────────────────────┘
///        │
///        ├──► filter     range bounds → new CatalogRecordSet
///        ├──► stats      totals, bbox, mass function, radius histogram
///        └──► hierarchy  one level of the parent/child tree
/// ```

pub mod container;
pub mod error;
pub mod export;
pub mod filter;
#[cfg(feature = "hdf5")]
pub mod hdf5_file;
pub mod hierarchy;
pub mod loader;
pub mod model;
pub mod scanner;
pub mod schema;
pub mod stats;

pub use container::{ArrayContainer, ArrayData, MemoryContainer, NdArray};
pub use error::{CatalogError, Result};
pub use filter::{filter, BoundKey, FilterBounds};
pub use hierarchy::{hierarchy, HierarchyNode};
pub use loader::{open_catalog, read, CatalogFile};
pub use model::{CatalogRecordSet, DatasetDescriptor, ElementKind, Field, Role, SchemaMap};
pub use scanner::scan;
pub use schema::{detect, detect_candidates, SchemaCandidates};
pub use stats::{field_range, stats, StatsReport};
