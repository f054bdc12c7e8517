//! Halo catalog ingestion and analysis.
//!
//! [`data`] holds the engine: it scans hierarchical containers, guesses
//! which arrays hold mass, position, ids, parent ids and radius, reads them
//! (or a flat CSV/Parquet table) into a [`data::CatalogRecordSet`], and
//! filters, summarises and walks the halo hierarchy. [`config`] carries the
//! viewer settings and the per-catalog schema cache.

pub mod config;
pub mod data;
