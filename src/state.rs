use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use halo_viewer::config::{SchemaCache, ViewerConfig};
use halo_viewer::data::filter::Side;
use halo_viewer::data::{
    detect_candidates, export, field_range, filter, hierarchy, open_catalog, stats, BoundKey,
    CatalogFile, CatalogRecordSet, DatasetDescriptor, FilterBounds, HierarchyNode,
    SchemaCandidates, SchemaMap, StatsReport,
};

use crate::color::MassColorMap;

// ---------------------------------------------------------------------------
// Loaded catalog
// ---------------------------------------------------------------------------

/// Which tab the central panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Scatter,
    MassFunction,
    Radius,
    Hierarchy,
    Datasets,
}

/// Axis pair of the scatter projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Xy,
    Xz,
    Yz,
}

impl Projection {
    pub fn label(self) -> &'static str {
        match self {
            Projection::Xy => "X–Y",
            Projection::Xz => "X–Z",
            Projection::Yz => "Y–Z",
        }
    }
}

/// A catalog file together with everything derived from it.
pub struct LoadedCatalog {
    pub path: PathBuf,
    pub file: CatalogFile,
    pub descriptors: Vec<DatasetDescriptor>,
    pub candidates: SchemaCandidates,
    /// Schema used for the current read; `None` = built-in default layout.
    pub schema: Option<SchemaMap>,
    /// Every halo in the file.
    pub records: CatalogRecordSet,
    /// Halos passing the applied filters.
    pub visible: CatalogRecordSet,
    /// Statistics of `visible`.
    pub stats: StatsReport,
    pub color_map: Option<MassColorMap>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ViewerConfig,
    pub schema_cache: SchemaCache,

    /// Loaded catalog (None until user opens a file).
    pub catalog: Option<LoadedCatalog>,

    /// Schema being edited in the side panel.
    pub schema_draft: SchemaMap,

    /// Bounds being edited / bounds currently applied.
    pub draft_bounds: FilterBounds,
    pub bounds: FilterBounds,

    pub view: View,
    pub projection: Projection,

    /// Halo ids walked into, outermost first; empty = top level.
    pub hierarchy_path: Vec<i64>,
    pub hierarchy_level: Vec<HierarchyNode>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        let schema_cache = match &config.schema_cache_path {
            Some(path) => SchemaCache::load(path).unwrap_or_else(|e| {
                log::warn!("ignoring schema cache: {e:#}");
                SchemaCache::default()
            }),
            None => SchemaCache::default(),
        };
        Self {
            config,
            schema_cache,
            catalog: None,
            schema_draft: SchemaMap::default(),
            draft_bounds: FilterBounds::default(),
            bounds: FilterBounds::default(),
            view: View::Scatter,
            projection: Projection::Xy,
            hierarchy_path: Vec::new(),
            hierarchy_level: Vec::new(),
            status_message: None,
        }
    }

    /// Open a catalog: scan, detect (or reuse the cached schema), read.
    pub fn open(&mut self, path: PathBuf) -> Result<()> {
        let file = open_catalog(&path).with_context(|| format!("opening {}", path.display()))?;
        let descriptors = file.descriptors().context("scanning container")?;
        let candidates = detect_candidates(&descriptors);

        let schema = if file.is_hierarchical() {
            let schema = self
                .schema_cache
                .get(&path)
                .cloned()
                .unwrap_or_else(|| candidates.best());
            // Without a detected position only the default layout can work.
            schema.pos.is_some().then_some(schema)
        } else {
            None
        };

        let records = file
            .read(schema.as_ref())
            .with_context(|| format!("reading {}", path.display()))?;
        log::info!(
            "opened {} ({} datasets, {} halos)",
            path.display(),
            descriptors.len(),
            records.len()
        );

        self.schema_draft = schema.clone().unwrap_or_else(|| candidates.best());
        self.catalog = Some(LoadedCatalog {
            path,
            file,
            descriptors,
            candidates,
            schema,
            visible: records.clone(),
            records,
            stats: StatsReport::default(),
            color_map: None,
        });
        self.draft_bounds = FilterBounds::default();
        self.bounds = FilterBounds::default();
        self.hierarchy_path.clear();
        self.status_message = None;
        self.refilter();
        Ok(())
    }

    /// Re-read the catalog with `schema` (or the default layout) and keep the
    /// result only if it loads.
    pub fn reload_with(&mut self, schema: Option<SchemaMap>) -> Result<()> {
        let Some(cat) = self.catalog.as_mut() else {
            return Ok(());
        };
        let records = cat
            .file
            .read(schema.as_ref())
            .with_context(|| format!("reading {}", cat.path.display()))?;

        match &schema {
            Some(map) => self.schema_cache.insert(cat.path.clone(), map.clone()),
            None => {
                self.schema_cache.remove(&cat.path);
            }
        }
        if let Some(cache_path) = &self.config.schema_cache_path {
            self.schema_cache.save(cache_path)?;
        }

        cat.schema = schema;
        cat.records = records;
        self.hierarchy_path.clear();
        self.refilter();
        Ok(())
    }

    /// Apply the draft bounds and recompute everything derived from them.
    pub fn apply_filters(&mut self) {
        self.bounds = self.draft_bounds;
        self.refilter();
    }

    pub fn reset_filters(&mut self) {
        self.draft_bounds = FilterBounds::default();
        self.apply_filters();
    }

    /// Recompute visible halos, stats and colours after a change.
    pub fn refilter(&mut self) {
        if let Some(cat) = self.catalog.as_mut() {
            cat.visible = filter(&cat.records, &self.bounds);
            cat.stats = match stats(&cat.visible) {
                Ok(report) => report,
                Err(e) => {
                    log::warn!("no statistics for {}: {e}", cat.path.display());
                    self.status_message = Some(format!("Statistics: {e}"));
                    StatsReport::default()
                }
            };
            cat.color_map = cat.stats.summary.as_ref().map(|s| {
                MassColorMap::new(s.min_mass, s.max_mass, self.config.mass_color_bins)
            });
        }
        self.refresh_hierarchy();
    }

    /// Starting value when a bound is switched on: the edge of the data.
    pub fn seed_bound(&self, key: BoundKey) -> Option<f64> {
        let cat = self.catalog.as_ref()?;
        let (lo, hi) = field_range(&cat.records, key.field()).ok()?;
        Some(match key.side() {
            Side::Min => lo,
            Side::Max => hi,
        })
    }

    // ---- hierarchy browsing ----

    pub fn refresh_hierarchy(&mut self) {
        self.hierarchy_level = match &self.catalog {
            Some(cat) => match hierarchy(&cat.records, self.hierarchy_path.last().copied()) {
                Ok(level) => level,
                Err(e) => {
                    self.status_message = Some(format!("Hierarchy: {e}"));
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
    }

    pub fn enter_halo(&mut self, id: i64) {
        self.hierarchy_path.push(id);
        self.refresh_hierarchy();
    }

    /// Go back to the level at breadcrumb depth `depth` (0 = top level).
    pub fn hierarchy_back_to(&mut self, depth: usize) {
        self.hierarchy_path.truncate(depth);
        self.refresh_hierarchy();
    }

    // ---- export ----

    /// Write the visible halos; `.json` gets parallel arrays, anything else CSV.
    pub fn export_visible(&self, path: &Path) -> Result<()> {
        let Some(cat) = &self.catalog else {
            return Ok(());
        };
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            export::write_json(&cat.visible, path)?;
        } else {
            export::write_csv(&cat.visible, path)?;
        }
        log::info!("exported {} halos to {}", cat.visible.len(), path.display());
        Ok(())
    }
}
