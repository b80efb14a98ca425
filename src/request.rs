//! Declarative aggregation requests.
//!
//! A request describes what a chart needs (filters, allow-lists, grouping,
//! metrics, optional join/rank/sort) and [`AggregationRequest::run`] turns a
//! loaded table into the matching derived rows. Requests deserialize from the
//! `[[views]]` tables of the config file.

use crate::pipeline::{
    self, AggregateOp, AggregateSpec, Domain, JoinSpec, Projection, RankSpec, Relabel, SortKey,
    SortOrder,
};
use crate::types::{AggregatedRow, Dimension, SalesField, SalesRecord};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::debug;

/// Record-level predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// Inclusive year range. Records without a year never match.
    YearBetween { min: i32, max: i32 },
    /// At least one of `fields` is `>= threshold`.
    AnyAtLeast { fields: Vec<SalesField>, threshold: f64 },
    /// Dimension value is one of `values`.
    OneOf { dimension: Dimension, values: Vec<String> },
    All { predicates: Vec<Predicate> },
    Any { predicates: Vec<Predicate> },
}

impl Predicate {
    pub fn matches(&self, r: &SalesRecord) -> bool {
        match self {
            Predicate::YearBetween { min, max } => r.year.is_some_and(|y| (*min..=*max).contains(&y)),
            Predicate::AnyAtLeast { fields, threshold } => {
                fields.iter().any(|f| r.field(*f) >= *threshold)
            }
            Predicate::OneOf { dimension, values } => {
                let v = r.dimension(*dimension);
                values.iter().any(|a| v.matches_label(a))
            }
            Predicate::All { predicates } => predicates.iter().all(|p| p.matches(r)),
            Predicate::Any { predicates } => predicates.iter().any(|p| p.matches(r)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationRequest {
    /// All must hold for a record to be kept.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Predicate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<Domain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relabel: Option<Relabel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<Dimension>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregates: Vec<AggregateSpec>,
    /// When set, `group_by` and `aggregates` are ignored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<Projection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join: Option<JoinSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<RankSpec>,
    /// Keys in priority order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl AggregationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn allow(mut self, dimension: Dimension, allowed: &[&str]) -> Self {
        self.domains.push(Domain {
            dimension,
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn relabel(mut self, dimension: Dimension, keep: &[&str], other: &str) -> Self {
        self.relabel = Some(Relabel {
            dimension,
            keep: keep.iter().map(|s| s.to_string()).collect(),
            other: other.to_string(),
        });
        self
    }

    pub fn group_by(mut self, dims: &[Dimension]) -> Self {
        self.group_by = dims.to_vec();
        self
    }

    pub fn aggregate(mut self, op: AggregateOp, field: SalesField, as_name: &str) -> Self {
        self.aggregates.push(AggregateSpec::new(op, field, as_name));
        self
    }

    pub fn project(mut self, dimensions: &[Dimension], fields: &[SalesField]) -> Self {
        self.project = Some(Projection {
            dimensions: dimensions.to_vec(),
            fields: fields.to_vec(),
        });
        self
    }

    pub fn join(mut self, group_by: &[Dimension], op: AggregateOp, metric: &str, as_name: &str) -> Self {
        self.join = Some(JoinSpec {
            group_by: group_by.to_vec(),
            op,
            metric: metric.to_string(),
            as_name: as_name.to_string(),
        });
        self
    }

    pub fn rank(mut self, partition_by: Dimension, metric: &str, as_name: &str) -> Self {
        self.rank = Some(RankSpec {
            partition_by,
            metric: metric.to_string(),
            as_name: as_name.to_string(),
        });
        self
    }

    /// Append a metric sort key.
    pub fn sort(mut self, metric: &str, order: SortOrder) -> Self {
        self.sort.push(SortKey::metric(metric, order));
        self
    }

    /// Append a dimension sort key.
    pub fn sort_by(mut self, dimension: Dimension, order: SortOrder) -> Self {
        self.sort.push(SortKey::dimension(dimension, order));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Run the request against a table.
    ///
    /// Stages run in a fixed order: filters, allow-lists, relabel,
    /// group/aggregate (or projection), join, rank, sort, limit. The input
    /// is never modified, so repeated runs give identical rows.
    pub fn run(&self, data: &[SalesRecord]) -> Vec<AggregatedRow> {
        let filtered = pipeline::filter(data, |r| self.filters.iter().all(|p| p.matches(r)));
        let restricted = pipeline::restrict_domains(filtered, &self.domains);
        let records: Vec<Cow<'_, SalesRecord>> = match &self.relabel {
            Some(rule) => pipeline::relabel(restricted, rule),
            None => restricted.into_iter().map(Cow::Borrowed).collect(),
        };
        debug!(input = data.len(), kept = records.len(), "Filtered records");

        let mut rows = match &self.project {
            Some(projection) => pipeline::project(&records, projection),
            None => pipeline::group_aggregate(&records, &self.group_by, &self.aggregates),
        };
        if let Some(join) = &self.join {
            rows = pipeline::join_aggregate(rows, join);
        }
        if let Some(rank) = &self.rank {
            rows = pipeline::rank_within_group(rows, rank)
                .into_iter()
                .map(|r| r.into_row(&rank.as_name))
                .collect();
        }
        rows = pipeline::sort_rows(rows, &self.sort);
        if let Some(n) = self.limit {
            rows.truncate(n);
        }
        rows
    }
}
