use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Serialize;

/// One row of the export the viewer reads.
#[derive(Serialize)]
struct SalesRow<'a> {
    id: u32,
    created: String,
    short_desc: &'a str,
    total_sold: String,
}

/// Baseline units, monthly trend and noise level per product.
const PRODUCTS: [(&str, f64, f64, f64); 3] = [
    ("Widget", 40.0, 3.0, 4.0),
    ("Gadget", 120.0, -2.5, 10.0),
    ("Sprocket", 15.0, 0.8, 2.0),
];

/// Seasonal bump peaking mid-year.
fn seasonality(month: u32) -> f64 {
    let phase = (month as f64 - 1.0) / 12.0 * std::f64::consts::TAU;
    1.0 - 0.15 * phase.cos()
}

fn main() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let output_path = "sample_sales.csv";
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;

    let mut id = 0;
    for month in 1..=12u32 {
        for &(name, base, trend, noise) in &PRODUCTS {
            let noise = Normal::new(0.0, noise).context("invalid noise level")?;
            let qty = ((base + trend * month as f64) * seasonality(month) + noise.sample(&mut rng))
                .max(1.0)
                .round();
            let day = rng.random_range(1..=28);

            id += 1;
            writer.serialize(SalesRow {
                id,
                created: format!("2023-{month:02}-{day:02}"),
                short_desc: name,
                total_sold: qty.to_string(),
            })?;
        }
    }

    // Rows the normalizer is expected to drop.
    let malformed = [
        ("2023", "Widget", "12"),
        ("2023-05-01", "12345", "3"),
        ("2023-06-02", "Gadget", "n/a"),
        ("", "Sprocket", "4"),
    ];
    for (created, desc, sold) in malformed {
        id += 1;
        writer.serialize(SalesRow {
            id,
            created: created.to_string(),
            short_desc: desc,
            total_sold: sold.to_string(),
        })?;
    }

    writer.flush().context("flushing CSV")?;

    println!("Wrote {id} sales rows ({} malformed) to {output_path}", malformed.len());
    Ok(())
}
