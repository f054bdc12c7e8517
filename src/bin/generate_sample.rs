use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use halo_viewer::data::container::ArrayData;
use halo_viewer::data::{export, CatalogRecordSet, MemoryContainer, NdArray};

const HOSTS: usize = 60;
const FILAMENT_LENGTH: f64 = 100.0;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Flat columns of the generated catalog.
#[derive(Default)]
struct Halos {
    pos: Vec<[f64; 3]>,
    mass: Vec<f64>,
    radius: Vec<f64>,
    id: Vec<i64>,
    parent_id: Vec<i64>,
}

impl Halos {
    fn push(&mut self, pos: [f64; 3], mass: f64, parent: i64) -> i64 {
        let id = self.id.len() as i64;
        self.pos.push(pos);
        self.mass.push(mass);
        // Virial-like scaling: R ∝ M^(1/3), 1 Mpc at 1e14.
        self.radius.push((mass / 1e14).cbrt());
        self.id.push(id);
        self.parent_id.push(parent);
        id
    }

    fn records(&self) -> Result<CatalogRecordSet> {
        let col = |axis: usize| self.pos.iter().map(|p| p[axis]).collect::<Vec<f64>>();
        Ok(CatalogRecordSet::new(col(0), col(1), col(2), self.mass.clone())?
            .with_radius(self.radius.clone())?
            .with_id(self.id.clone())?
            .with_parent_id(self.parent_id.clone())?)
    }
}

/// Host halos strung along a filament on the x axis, each with satellites,
/// and sub-satellites around the heavier satellites.
fn generate(rng: &mut SimpleRng) -> Halos {
    let mut halos = Halos::default();
    for _ in 0..HOSTS {
        let host_pos = [
            rng.uniform(0.0, FILAMENT_LENGTH),
            rng.gauss(0.0, 3.0),
            rng.gauss(0.0, 3.0),
        ];
        let host_mass = 10f64.powf(rng.uniform(12.0, 14.5));
        let host = halos.push(host_pos, host_mass, -1);

        let satellites = (host_mass.log10() - 11.5).max(0.0) as usize * 3;
        for _ in 0..satellites {
            let spread = 0.5 * (host_mass / 1e14).cbrt();
            let sat_pos = host_pos.map(|c| rng.gauss(c, spread));
            let sat_mass = host_mass * 10f64.powf(rng.uniform(-3.0, -1.0));
            let sat = halos.push(sat_pos, sat_mass, host);

            if sat_mass > 1e12 {
                for _ in 0..2 {
                    let sub_pos = sat_pos.map(|c| rng.gauss(c, 0.1 * spread));
                    let sub_mass = sat_mass * 10f64.powf(rng.uniform(-2.5, -1.0));
                    halos.push(sub_pos, sub_mass, sat);
                }
            }
        }
    }
    halos
}

/// Group-per-catalog layout the schema detector has to work out.
fn write_catalog_container(halos: &Halos, path: &Path) -> Result<()> {
    let n = halos.id.len();
    MemoryContainer::new()
        .with_dataset("Catalog/Mass", NdArray::vector(halos.mass.clone()))?
        .with_dataset("Catalog/Radius", NdArray::vector(halos.radius.clone()))?
        .with_dataset("Catalog/Position", NdArray::rows3(&halos.pos))?
        .with_dataset(
            "Catalog/ParticleIDs",
            NdArray::new(vec![n], ArrayData::Int64(halos.id.clone()))?,
        )?
        .with_dataset(
            "Catalog/ParentID",
            NdArray::new(vec![n], ArrayData::Int64(halos.parent_id.clone()))?,
        )?
        .save(path)?;
    Ok(())
}

/// Particle-type layout read without any schema.
fn write_default_layout_container(halos: &Halos, path: &Path) -> Result<()> {
    let masses: Vec<f32> = halos.mass.iter().map(|&m| m as f32).collect();
    MemoryContainer::new()
        .with_dataset("PartType1/Coordinates", NdArray::rows3(&halos.pos))?
        .with_dataset(
            "PartType1/Masses",
            NdArray::new(vec![masses.len()], ArrayData::Float32(masses))?,
        )?
        .with_dataset("PartType1/Radius", NdArray::vector(halos.radius.clone()))?
        .save(path)?;
    Ok(())
}

fn write_parquet(records: &CatalogRecordSet, path: &Path) -> Result<()> {
    let float = |name: &str| Field::new(name, DataType::Float64, false);
    let int = |name: &str| Field::new(name, DataType::Int64, false);
    let schema = Arc::new(Schema::new(vec![
        float("x"),
        float("y"),
        float("z"),
        float("mass"),
        float("radius"),
        int("id"),
        int("parent_id"),
    ]));

    let f64s = |values: &[f64]| -> ArrayRef { Arc::new(Float64Array::from(values.to_vec())) };
    let i64s = |values: &[i64]| -> ArrayRef { Arc::new(Int64Array::from(values.to_vec())) };
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            f64s(records.x()),
            f64s(records.y()),
            f64s(records.z()),
            f64s(records.mass()),
            f64s(records.radius().unwrap_or_default()),
            i64s(records.id().unwrap_or_default()),
            i64s(records.parent_id().unwrap_or_default()),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let halos = generate(&mut rng);
    let records = halos.records()?;

    write_catalog_container(&halos, &out_dir.join("halos_catalog.json"))?;
    write_default_layout_container(&halos, &out_dir.join("halos_parttype1.json"))?;
    export::write_csv(&records, &out_dir.join("halos.csv"))?;
    write_parquet(&records, &out_dir.join("halos.parquet"))?;

    log::info!("generated {} halos ({HOSTS} hosts)", records.len());
    println!(
        "Wrote {} halos to {} (halos_catalog.json, halos_parttype1.json, halos.csv, halos.parquet)",
        records.len(),
        out_dir.display()
    );
    Ok(())
}
