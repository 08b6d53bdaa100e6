//! Bloom command implementation.

use batchlog_bloom::{theoretical_false_positive_rate, BloomFilter, FilterError};
use serde::Serialize;

/// False positive measurement.
#[derive(Debug, Serialize)]
pub struct BloomReport {
    /// Keys inserted.
    pub keys: u32,
    /// Filter size in bits.
    pub total_bits: u32,
    /// Cache-line blocks (0 without locality).
    pub num_blocks: u32,
    /// Probes per key.
    pub num_probes: u32,
    /// Absent keys queried.
    pub queries: u32,
    /// Absent keys the filter claimed to contain.
    pub false_positives: u32,
    /// `false_positives / queries`.
    pub observed_rate: f64,
    /// Rate predicted for an ideal filter of this shape.
    pub theoretical_rate: f64,
    /// Fraction of set bits.
    pub fill_ratio: f64,
}

/// Runs the bloom command.
pub fn run(
    keys: u32,
    bits_per_key: u32,
    probes: u32,
    locality: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = measure(keys, bits_per_key, probes, locality)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!("Bloom filter");
            println!("================");
            println!("Keys:              {}", report.keys);
            println!("Total bits:        {}", report.total_bits);
            println!("Blocks:            {}", report.num_blocks);
            println!("Probes:            {}", report.num_probes);
            println!("Fill ratio:        {:.4}", report.fill_ratio);
            println!(
                "False positives:   {}/{} ({:.4}%)",
                report.false_positives,
                report.queries,
                report.observed_rate * 100.0
            );
            println!("Theoretical rate:  {:.4}%", report.theoretical_rate * 100.0);
        }
    }

    Ok(())
}

/// Fills a filter with `keys` distinct keys and probes as many absent ones.
///
/// # Errors
///
/// Returns an error if the filter shape is invalid.
pub fn measure(
    keys: u32,
    bits_per_key: u32,
    probes: u32,
    locality: bool,
) -> Result<BloomReport, FilterError> {
    let filter = BloomFilter::for_keys(keys, bits_per_key, locality, probes)?;
    for i in 0..keys {
        filter.add(format!("key-{i}").as_bytes());
    }

    let queries = keys.max(1);
    let false_positives = (0..queries)
        .filter(|i| filter.may_contain(format!("absent-{i}").as_bytes()))
        .count();
    let false_positives = u32::try_from(false_positives).unwrap_or(u32::MAX);

    tracing::debug!(
        keys,
        total_bits = filter.total_bits(),
        false_positives,
        "measured bloom filter"
    );

    let actual_bits_per_key = f64::from(filter.total_bits()) / f64::from(keys.max(1));
    Ok(BloomReport {
        keys,
        total_bits: filter.total_bits(),
        num_blocks: filter.num_blocks(),
        num_probes: filter.num_probes(),
        queries,
        false_positives,
        observed_rate: f64::from(false_positives) / f64::from(queries),
        theoretical_rate: theoretical_false_positive_rate(actual_bits_per_key, probes),
        fill_ratio: filter.fill_ratio(),
    })
}
