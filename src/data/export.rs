use std::io::Write;
use std::path::Path;

use super::error::Result;
use super::model::CatalogRecordSet;

/// Write a record set as CSV (`x,y,z,mass[,radius][,id][,parent_id]`).
///
/// The output reads back through the tabular loader.
pub fn write_csv_to<W: Write>(records: &CatalogRecordSet, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["x", "y", "z", "mass"];
    if records.radius().is_some() {
        header.push("radius");
    }
    if records.id().is_some() {
        header.push("id");
    }
    if records.parent_id().is_some() {
        header.push("parent_id");
    }
    writer.write_record(&header)?;

    let mut row = Vec::with_capacity(header.len());
    for i in 0..records.len() {
        row.clear();
        row.push(records.x()[i].to_string());
        row.push(records.y()[i].to_string());
        row.push(records.z()[i].to_string());
        row.push(records.mass()[i].to_string());
        if let Some(radius) = records.radius() {
            row.push(radius[i].to_string());
        }
        if let Some(id) = records.id() {
            row.push(id[i].to_string());
        }
        if let Some(parent_id) = records.parent_id() {
            row.push(parent_id[i].to_string());
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_csv(records: &CatalogRecordSet, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv_to(records, std::io::BufWriter::new(file))
}

/// Write a record set as a JSON object of parallel arrays.
pub fn write_json(records: &CatalogRecordSet, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer(std::io::BufWriter::new(file), records)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_has_one_column_per_present_field() {
        let rs = CatalogRecordSet::new(vec![1.0], vec![2.0], vec![3.0], vec![1e12])
            .unwrap()
            .with_parent_id(vec![-1])
            .unwrap();
        let mut buf = Vec::new();
        write_csv_to(&rs, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "x,y,z,mass,parent_id\n1,2,3,1000000000000,-1\n");
    }
}
