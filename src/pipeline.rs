//! Aggregation primitives over an in-memory sales table.
//!
//! Every operation here is pure and total: numeric cells were already
//! coerced by the loader, unknown categories are dropped by filters, and
//! nothing returns an error. Output order is always explicit:
//!
//! - filters keep input order;
//! - grouping emits one row per key in order of first appearance;
//! - ranking emits partitions in first-seen order, rows in rank order.

use crate::types::{AggregatedRow, Dimension, Measure, RankedRow, SalesField, SalesRecord, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Aggregation operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    Sum,
    Mean,
    Count,
}

impl AggregateOp {
    fn finish(self, sum: f64, count: u64) -> Measure {
        match self {
            AggregateOp::Sum => Measure::Number(sum),
            AggregateOp::Mean if count == 0 => Measure::Number(0.0),
            AggregateOp::Mean => Measure::Number(sum / count as f64),
            AggregateOp::Count => Measure::Integer(count),
        }
    }
}

/// One metric computed per group, e.g. `sum(Global_Sales) as TotalSales`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSpec {
    pub op: AggregateOp,
    /// Ignored for `count`.
    #[serde(default = "default_field")]
    pub field: SalesField,
    #[serde(rename = "as")]
    pub as_name: String,
}

fn default_field() -> SalesField {
    SalesField::GlobalSales
}

impl AggregateSpec {
    pub fn new(op: AggregateOp, field: SalesField, as_name: &str) -> Self {
        Self {
            op,
            field,
            as_name: as_name.to_string(),
        }
    }
}

/// Secondary aggregate over a coarser grouping, attached to every finer row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSpec {
    pub group_by: Vec<Dimension>,
    pub op: AggregateOp,
    /// Metric of the finer table to aggregate.
    pub metric: String,
    #[serde(rename = "as")]
    pub as_name: String,
}

/// Ordinal position of each row among rows sharing `partition_by`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankSpec {
    pub partition_by: Dimension,
    pub metric: String,
    #[serde(rename = "as", default = "default_rank_name")]
    pub as_name: String,
}

fn default_rank_name() -> String {
    "Rank".to_string()
}

/// Allow-list for one dimension. Applied to records before aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub dimension: Dimension,
    pub allowed: Vec<String>,
}

/// Collapse every value of `dimension` not in `keep` into `other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relabel {
    pub dimension: Dimension,
    pub keep: Vec<String>,
    pub other: String,
}

/// Record-level output: one row per record, no aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub dimensions: Vec<Dimension>,
    pub fields: Vec<SalesField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
}

/// What a sort key compares: a metric column or a grouping dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Metric(String),
    Dimension(Dimension),
}

/// One key of a multi-key sort, e.g. `{ by = { metric = "TotalSales" } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub by: SortBy,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortKey {
    pub fn metric(name: &str, order: SortOrder) -> Self {
        Self {
            by: SortBy::Metric(name.to_string()),
            order,
        }
    }

    pub fn dimension(dimension: Dimension, order: SortOrder) -> Self {
        Self {
            by: SortBy::Dimension(dimension),
            order,
        }
    }

    fn compare(&self, a: &AggregatedRow, b: &AggregatedRow) -> Ordering {
        let ord = match &self.by {
            SortBy::Metric(name) => {
                let ma = a.metric(name).unwrap_or(0.0);
                let mb = b.metric(name).unwrap_or(0.0);
                ma.total_cmp(&mb)
            }
            SortBy::Dimension(d) => {
                let missing = Value::Missing;
                a.key(*d).unwrap_or(&missing).cmp(b.key(*d).unwrap_or(&missing))
            }
        };
        match self.order {
            SortOrder::Descending => ord.reverse(),
            SortOrder::Ascending => ord,
        }
    }
}

/// Select records matching `predicate`, keeping input order.
pub fn filter<'a, I, P>(records: I, predicate: P) -> Vec<&'a SalesRecord>
where
    I: IntoIterator<Item = &'a SalesRecord>,
    P: Fn(&SalesRecord) -> bool,
{
    records.into_iter().filter(|r| predicate(r)).collect()
}

/// Drop every record whose value for a restricted dimension is not on that
/// dimension's allow-list.
pub fn restrict_domains<'a>(records: Vec<&'a SalesRecord>, domains: &[Domain]) -> Vec<&'a SalesRecord> {
    if domains.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|r| {
            domains.iter().all(|d| {
                let value = r.dimension(d.dimension);
                d.allowed.iter().any(|a| value.matches_label(a))
            })
        })
        .collect()
}

/// Apply a relabel rule. Records already carrying a kept label are
/// borrowed, the rest are cloned with the replacement label.
pub fn relabel<'a>(records: Vec<&'a SalesRecord>, rule: &Relabel) -> Vec<Cow<'a, SalesRecord>> {
    if rule.dimension == Dimension::Year {
        warn!("Relabel on Year is not supported; leaving values unchanged");
        return records.into_iter().map(Cow::Borrowed).collect();
    }
    records
        .into_iter()
        .map(|r| {
            let value = r.dimension(rule.dimension);
            if rule.keep.iter().any(|k| value.matches_label(k)) {
                Cow::Borrowed(r)
            } else {
                let mut owned = r.clone();
                owned.set_label(rule.dimension, &rule.other);
                Cow::Owned(owned)
            }
        })
        .collect()
}

/// Partition records by `dims` and compute every aggregate per partition.
///
/// Rows come out in order of each key's first appearance in `records`.
pub fn group_aggregate<R: Borrow<SalesRecord>>(
    records: &[R],
    dims: &[Dimension],
    aggregates: &[AggregateSpec],
) -> Vec<AggregatedRow> {
    struct Acc {
        sums: Vec<f64>,
        count: u64,
    }

    let groups: IndexMap<Vec<Value>, Acc> = records.iter().fold(IndexMap::new(), |mut groups, r| {
        let r: &SalesRecord = r.borrow();
        let key: Vec<Value> = dims.iter().map(|d| r.dimension(*d)).collect();
        let acc = groups.entry(key).or_insert_with(|| Acc {
            sums: vec![0.0; aggregates.len()],
            count: 0,
        });
        for (slot, spec) in acc.sums.iter_mut().zip(aggregates) {
            *slot += r.field(spec.field);
        }
        acc.count += 1;
        groups
    });

    debug!(
        records = records.len(),
        groups = groups.len(),
        "Grouped records"
    );

    groups
        .into_iter()
        .map(|(key, acc)| AggregatedRow {
            keys: dims.iter().copied().zip(key).collect(),
            metrics: aggregates
                .iter()
                .zip(&acc.sums)
                .map(|(spec, sum)| (spec.as_name.clone(), spec.op.finish(*sum, acc.count)))
                .collect(),
        })
        .collect()
}

/// One row per record carrying the projected dimensions and fields.
pub fn project<R: Borrow<SalesRecord>>(records: &[R], projection: &Projection) -> Vec<AggregatedRow> {
    records
        .iter()
        .map(|r| {
            let r: &SalesRecord = r.borrow();
            AggregatedRow {
                keys: projection
                    .dimensions
                    .iter()
                    .map(|d| (*d, r.dimension(*d)))
                    .collect(),
                metrics: projection
                    .fields
                    .iter()
                    .map(|f| (f.as_str().to_string(), Measure::Number(r.field(*f))))
                    .collect(),
            }
        })
        .collect()
}

fn coarse_key(row: &AggregatedRow, dims: &[Dimension]) -> Vec<Value> {
    dims.iter()
        .map(|d| row.key(*d).cloned().unwrap_or(Value::Missing))
        .collect()
}

/// Attach an aggregate over the coarser `join.group_by` key to every row
/// sharing that key. Existing metrics are left as they were.
pub fn join_aggregate(rows: Vec<AggregatedRow>, join: &JoinSpec) -> Vec<AggregatedRow> {
    let totals: IndexMap<Vec<Value>, (f64, u64)> = rows.iter().fold(IndexMap::new(), |mut acc, row| {
        let entry = acc.entry(coarse_key(row, &join.group_by)).or_insert((0.0, 0));
        entry.0 += row.metric(&join.metric).unwrap_or(0.0);
        entry.1 += 1;
        acc
    });

    rows.into_iter()
        .map(|row| {
            let (sum, count) = totals
                .get(&coarse_key(&row, &join.group_by))
                .copied()
                .unwrap_or((0.0, 0));
            row.with_metric(&join.as_name, join.op.finish(sum, count))
        })
        .collect()
}

/// Rank rows within each partition by `spec.metric`, highest first.
///
/// Ties are broken by the row's other key values in ascending order, then
/// by input position, so the result never depends on sort stability.
pub fn rank_within_group(rows: Vec<AggregatedRow>, spec: &RankSpec) -> Vec<RankedRow> {
    let partitions: IndexMap<Value, Vec<(usize, AggregatedRow)>> =
        rows.into_iter()
            .enumerate()
            .fold(IndexMap::new(), |mut parts, (idx, row)| {
                let key = row.key(spec.partition_by).cloned().unwrap_or(Value::Missing);
                parts.entry(key).or_insert_with(Vec::new).push((idx, row));
                parts
            });

    let mut ranked = Vec::new();
    for (_, mut peers) in partitions {
        peers.sort_by(|(ia, a), (ib, b)| {
            let ma = a.metric(&spec.metric).unwrap_or(0.0);
            let mb = b.metric(&spec.metric).unwrap_or(0.0);
            mb.total_cmp(&ma)
                .then_with(|| tie_key(a, spec.partition_by).cmp(&tie_key(b, spec.partition_by)))
                .then_with(|| ia.cmp(ib))
        });
        ranked.extend(
            peers
                .into_iter()
                .enumerate()
                .map(|(pos, (_, row))| RankedRow { row, rank: pos + 1 }),
        );
    }
    ranked
}

fn tie_key(row: &AggregatedRow, partition: Dimension) -> Vec<&Value> {
    row.keys
        .iter()
        .filter(|(d, _)| **d != partition)
        .map(|(_, v)| v)
        .collect()
}

/// Stable sort on `keys` in priority order. Rows equal on every key keep
/// their input order.
pub fn sort_rows(mut rows: Vec<AggregatedRow>, keys: &[SortKey]) -> Vec<AggregatedRow> {
    if keys.is_empty() {
        return rows;
    }
    rows.sort_by(|a, b| {
        keys.iter()
            .fold(Ordering::Equal, |ord, key| ord.then_with(|| key.compare(a, b)))
    });
    rows
}
