//! End-to-end reads of catalog files on disk: JSON containers through
//! scan → detect → read, and flat CSV / Parquet tables.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, Float64Array, Int32Array};
use arrow::datatypes::{DataType, Field as ArrowField, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use halo_viewer::data::{
    detect, export, hierarchy, open_catalog, stats, ArrayData, CatalogError, CatalogFile,
    CatalogRecordSet, Field, MemoryContainer, NdArray,
};

fn ints(values: Vec<i64>) -> NdArray {
    NdArray::new(vec![values.len()], ArrayData::Int64(values)).unwrap()
}

/// Host 10 with two satellites, one of which hosts a sub-halo, plus a
/// lone host 20.
fn group_catalog(path: &Path) {
    MemoryContainer::new()
        .with_dataset("Catalog/Mass", NdArray::vector(vec![1e14, 2e12, 5e12, 1e11, 3e13]))
        .unwrap()
        .with_dataset("Catalog/Radius", NdArray::vector(vec![1.0, 0.2, 0.3, 0.05, 0.6]))
        .unwrap()
        .with_dataset(
            "Catalog/Position",
            NdArray::rows3(&[
                [0.0, 0.0, 0.0],
                [0.5, 0.1, 0.0],
                [-0.4, 0.2, 0.1],
                [-0.41, 0.21, 0.1],
                [40.0, 1.0, -2.0],
            ]),
        )
        .unwrap()
        .with_dataset("Catalog/ParticleIDs", ints(vec![10, 11, 12, 13, 20]))
        .unwrap()
        .with_dataset("Catalog/ParentID", ints(vec![-1, 10, 10, 12, -1]))
        .unwrap()
        .save(path)
        .unwrap();
}

#[test]
fn json_container_is_detected_and_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("groups.json");
    group_catalog(&path);

    let file = open_catalog(&path).unwrap();
    assert!(file.is_hierarchical());
    let descriptors = file.descriptors().unwrap();
    assert_eq!(descriptors.len(), 5);

    let schema = detect(&descriptors);
    assert_eq!(schema.mass.as_deref(), Some("Catalog/Mass"));
    assert_eq!(schema.pos.as_deref(), Some("Catalog/Position"));
    assert_eq!(schema.id.as_deref(), Some("Catalog/ParticleIDs"));
    assert_eq!(schema.parent_id.as_deref(), Some("Catalog/ParentID"));
    assert_eq!(schema.radius.as_deref(), Some("Catalog/Radius"));

    let records = file.read(Some(&schema)).unwrap();
    assert_eq!(records.len(), 5);
    assert_eq!(records.x()[4], 40.0);
    assert_eq!(records.z()[2], 0.1);
    assert_eq!(records.id(), Some(&[10, 11, 12, 13, 20][..]));

    let top: Vec<i64> = hierarchy(&records, None).unwrap().iter().map(|n| n.id).collect();
    assert_eq!(top, [10, 20]);
    let satellites = hierarchy(&records, Some(10)).unwrap();
    assert_eq!(satellites.iter().map(|n| n.id).collect::<Vec<_>>(), [12, 11]);
    assert!(satellites[0].has_children);
    assert!(!satellites[1].has_children);
}

#[test]
fn mapped_path_that_does_not_exist_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("groups.json");
    group_catalog(&path);

    let file = open_catalog(&path).unwrap();
    let mut schema = detect(&file.descriptors().unwrap());
    schema.radius = Some("Catalog/Rvir".into());
    let err = file.read(Some(&schema)).unwrap_err();
    assert!(matches!(err, CatalogError::DatasetNotFound(p) if p == "Catalog/Rvir"));
}

#[test]
fn particle_type_layout_reads_without_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snap.json");
    MemoryContainer::new()
        .with_dataset(
            "PartType1/Coordinates",
            NdArray::rows3(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]),
        )
        .unwrap()
        .with_dataset(
            "PartType1/Masses",
            NdArray::new(vec![2], ArrayData::Float32(vec![2.5, 0.5])).unwrap(),
        )
        .unwrap()
        .save(&path)
        .unwrap();

    let records = open_catalog(&path).unwrap().read(None).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records.y(), &[2.0, 5.0]);
    assert_eq!(records.mass(), &[2.5, 0.5]);
    assert!(records.radius().is_none());
}

#[test]
fn csv_export_reads_back_as_a_table() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("groups.json");
    group_catalog(&source);
    let file = open_catalog(&source).unwrap();
    let schema = detect(&file.descriptors().unwrap());
    let records = file.read(Some(&schema)).unwrap();

    let csv_path = dir.path().join("groups.csv");
    export::write_csv(&records, &csv_path).unwrap();

    let table = open_catalog(&csv_path).unwrap();
    assert!(matches!(table, CatalogFile::Tabular { .. }));
    assert!(table.descriptors().unwrap().is_empty());
    let back = table.read(None).unwrap();
    assert_eq!(back, records);
    assert_eq!(stats(&back).unwrap(), stats(&records).unwrap());
}

#[test]
fn parquet_columns_are_widened_to_f64() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("halos.parquet");

    let schema = Arc::new(Schema::new(vec![
        ArrowField::new("X", DataType::Float64, false),
        ArrowField::new("y", DataType::Float64, false),
        ArrowField::new("z", DataType::Float64, false),
        ArrowField::new("Mass", DataType::Float32, false),
        ArrowField::new("id", DataType::Int32, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0])),
        Arc::new(Float64Array::from(vec![0.0, 0.0, 1.0])),
        Arc::new(Float64Array::from(vec![5.0, 6.0, 7.0])),
        Arc::new(Float32Array::from(vec![1.5f32, 2.5, 4.0])),
        Arc::new(Int32Array::from(vec![7, 8, 9])),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
    let out = std::fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(out, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let records = open_catalog(&path).unwrap().read(None).unwrap();
    let expected = CatalogRecordSet::new(
        vec![1.0, 2.0, 3.0],
        vec![0.0, 0.0, 1.0],
        vec![5.0, 6.0, 7.0],
        vec![1.5, 2.5, 4.0],
    )
    .unwrap()
    .with_id(vec![7, 8, 9])
    .unwrap();
    assert_eq!(records, expected);
}

#[test]
fn table_without_coordinates_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("masses.csv");
    std::fs::write(&path, "mass,radius\n1.0,0.5\n").unwrap();

    let err = open_catalog(&path).unwrap().read(None).unwrap_err();
    assert!(matches!(err, CatalogError::MissingCoordinates(_)));
}

#[test]
fn missing_or_malformed_container_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = open_catalog(&dir.path().join("missing.json")).err().unwrap();
    assert!(matches!(err, CatalogError::ContainerRead(msg) if msg.contains("missing.json")));

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not a container").unwrap();
    let err = open_catalog(&broken).err().unwrap();
    assert!(matches!(err, CatalogError::ContainerRead(_)));
}

#[test]
fn unknown_extension_is_unsupported() {
    let err = open_catalog(Path::new("catalog.fits")).err().unwrap();
    assert!(matches!(err, CatalogError::UnsupportedFormat(_)));
}

#[test]
fn field_lookup_on_absent_column_fails() {
    let records = CatalogRecordSet::new(vec![0.0], vec![0.0], vec![0.0], vec![1.0]).unwrap();
    assert!(matches!(
        records.column(Field::Radius),
        Err(CatalogError::FieldNotFound(Field::Radius))
    ));
}
