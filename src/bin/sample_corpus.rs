use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 4 {
        eprintln!("Usage: {} <input.csv> <output.csv> <sample_percentage>", args[0]);
        eprintln!("Example: sample_corpus posts.csv sample.csv 10");
        std::process::exit(1);
    }

    let input_path = PathBuf::from(&args[1]);
    let output_path = PathBuf::from(&args[2]);
    let sample_percentage: f32 = args[3]
        .parse()
        .context("Sample percentage must be a number")?;

    if sample_percentage <= 0.0 || sample_percentage > 100.0 {
        bail!("Sample percentage must be between 0 and 100");
    }

    println!(
        "Sampling {}% of records from {} to {}",
        sample_percentage,
        input_path.display(),
        output_path.display()
    );

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(&input_path)
        .with_context(|| format!("failed to open {}", input_path.display()))?;
    let headers = reader.headers()?.clone();
    let records = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("failed to read {}", input_path.display()))?;

    let total_records = records.len();
    println!("Total records in source: {}", total_records);

    let sample_size = ((total_records as f32) * (sample_percentage / 100.0)) as usize;
    println!("Will sample approximately {} records", sample_size);

    let step = if sample_size > 0 { total_records / sample_size } else { 1 };
    let step = step.max(1);

    println!("Taking every {}th record", step);

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(&output_path)
        .with_context(|| format!("failed to create {}", output_path.display()))?;
    writer.write_record(&headers)?;

    let mut sampled_count = 0;
    for record in records.iter().step_by(step) {
        writer.write_record(record)?;
        sampled_count += 1;
    }

    writer.flush()?;

    println!("✅ Successfully created sample file with {} records", sampled_count);
    println!("Sample file: {}", output_path.display());

    Ok(())
}
