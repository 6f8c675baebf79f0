// Chart datasets derived from a flat transaction list. Every function here is
// total: empty input and empty buckets produce zeros, never errors or NaN.
use indexmap::IndexMap;
use serde::Serialize;

use crate::record::Transaction;

pub const DEFAULT_NUM_PERIODS: usize = 5;

/// Fixed amount ranges as `(label, min, max)`; `max` is exclusive.
pub const AMOUNT_RANGES: [(&str, f64, f64); 4] = [
    ("0-100", 0.0, 100.0),
    ("100-1K", 100.0, 1_000.0),
    ("1K-10K", 1_000.0, 10_000.0),
    ("10K+", 10_000.0, f64::INFINITY),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudDistribution {
    pub legitimate_count: usize,
    pub fraudulent_count: usize,
}

impl FraudDistribution {
    pub fn total(&self) -> usize {
        self.legitimate_count + self.fraudulent_count
    }

    /// Percentage of fraudulent records, 0 for an empty set.
    pub fn fraud_share(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.fraudulent_count as f64 / self.total() as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeBreakdown {
    #[serde(rename = "name")]
    pub kind: String,
    pub total: usize,
    pub fraud_count: usize,
    /// Rounded integer percentage.
    pub fraud_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountRangeBreakdown {
    #[serde(rename = "name")]
    pub label: &'static str,
    #[serde(skip)]
    pub min: f64,
    #[serde(skip)]
    pub max: f64,
    pub total: usize,
    pub fraud_count: usize,
    /// Rounded integer percentage; 0 when the range is empty.
    pub fraud_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequentialBucket {
    #[serde(rename = "name")]
    pub label: String,
    pub total: usize,
    #[serde(skip)]
    pub fraud_count: usize,
    /// Unrounded percentage.
    pub fraud_rate: f64,
}

/// Counts legitimate and fraudulent records over the whole set.
pub fn compute_fraud_distribution(records: &[Transaction]) -> FraudDistribution {
    let fraudulent_count = records.iter().filter(|tx| tx.is_fraud).count();
    FraudDistribution {
        legitimate_count: records.len() - fraudulent_count,
        fraudulent_count,
    }
}

/// Groups by `type` in order of first occurrence.
pub fn compute_type_breakdown(records: &[Transaction]) -> Vec<TypeBreakdown> {
    let mut types: IndexMap<&str, (usize, usize)> = IndexMap::new();
    for tx in records {
        let entry = types.entry(tx.kind.as_str()).or_insert((0, 0));
        entry.0 += 1;
        if tx.is_fraud {
            entry.1 += 1;
        }
    }

    types
        .into_iter()
        .map(|(kind, (total, fraud_count))| TypeBreakdown {
            kind: kind.to_string(),
            total,
            fraud_count,
            // total >= 1 for every bucket that exists
            fraud_rate: rounded_percent(fraud_count, total),
        })
        .collect()
}

/// Buckets records into the four fixed amount ranges.
///
/// Records whose amount is missing, non-numeric or negative fall in no range.
pub fn compute_amount_range_breakdown(records: &[Transaction]) -> Vec<AmountRangeBreakdown> {
    AMOUNT_RANGES
        .iter()
        .map(|&(label, min, max)| {
            let (total, fraud_count) = records
                .iter()
                .filter(|tx| {
                    tx.numeric_amount()
                        .is_some_and(|amount| amount >= min && amount < max)
                })
                .fold((0, 0), |(total, fraud), tx| {
                    (total + 1, fraud + usize::from(tx.is_fraud))
                });

            AmountRangeBreakdown {
                label,
                min,
                max,
                total,
                fraud_count,
                fraud_rate: if total > 0 {
                    rounded_percent(fraud_count, total)
                } else {
                    0
                },
            }
        })
        .collect()
}

/// Splits records, in their original order, into contiguous buckets of
/// `ceil(len / num_buckets)` records. The last bucket takes the remainder.
///
/// A `num_buckets` of zero is treated as one. Empty input yields no buckets.
pub fn compute_sequential_breakdown(
    records: &[Transaction],
    num_buckets: usize,
) -> Vec<SequentialBucket> {
    if records.is_empty() {
        return Vec::new();
    }
    let bucket_size = records.len().div_ceil(num_buckets.max(1));

    records
        .chunks(bucket_size)
        .enumerate()
        .map(|(index, chunk)| {
            let fraud_count = chunk.iter().filter(|tx| tx.is_fraud).count();
            SequentialBucket {
                label: format!("Period {}", index + 1),
                total: chunk.len(),
                fraud_count,
                fraud_rate: fraud_count as f64 / chunk.len() as f64 * 100.0,
            }
        })
        .collect()
}

fn rounded_percent(part: usize, total: usize) -> u32 {
    (part as f64 / total as f64 * 100.0).round() as u32
}

/// All four chart datasets for one record snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSet {
    pub fraud_distribution: FraudDistribution,
    pub transaction_types: Vec<TypeBreakdown>,
    pub amount_ranges: Vec<AmountRangeBreakdown>,
    pub periods: Vec<SequentialBucket>,
}

impl ChartSet {
    pub fn compute(records: &[Transaction], num_periods: usize) -> Self {
        Self {
            fraud_distribution: compute_fraud_distribution(records),
            transaction_types: compute_type_breakdown(records),
            amount_ranges: compute_amount_range_breakdown(records),
            periods: compute_sequential_breakdown(records, num_periods),
        }
    }
}
