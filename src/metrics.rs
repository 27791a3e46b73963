//! Ranking-quality metrics for one query's result list.
//!
//! All metrics read the ranking strictly in list order and look grades up
//! in a [`RelevanceStore`]. A document counts as relevant when its grade
//! is greater than zero.
//!
//! | Metric        | Denominator            | Cutoff          |
//! |---------------|------------------------|-----------------|
//! | Precision@k   | k                      | k               |
//! | Recall@k      | relevant documents     | k               |
//! | r-Precision   | relevant documents     | relevant docs   |
//! | AP            | relevant documents     | whole list      |
//! | nDCG@k        | ideal DCG@k            | k               |
//!
//! When the denominator is zero (a query with no relevant documents) the
//! metric is reported as `0.0` and flagged as undefined, see
//! [`MetricValue`].

use crate::config::Cutoffs;
use crate::error::{EvalError, Result};
use crate::judgments::{DocumentId, Grade, QueryId, RelevanceStore};
use crate::runs::RetrievedDocument;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A metric score plus a flag for the zero-denominator case.
///
/// An undefined value always has `value == 0.0` so it can still be
/// averaged; callers that want to exclude it check [`is_undefined`].
///
/// [`is_undefined`]: MetricValue::is_undefined
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct MetricValue {
    /// Score in `[0.0, 1.0]`.
    pub value: f64,
    /// True when the denominator was zero and `value` is the 0.0 stand-in.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub undefined: bool,
}

impl MetricValue {
    /// A regular score.
    pub fn defined(value: f64) -> Self {
        Self {
            value,
            undefined: false,
        }
    }

    /// The 0.0 stand-in for a zero denominator.
    pub fn undefined() -> Self {
        Self {
            value: 0.0,
            undefined: true,
        }
    }

    /// `numerator / denominator`, or undefined when the denominator is 0.
    fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            Self::undefined()
        } else {
            Self::defined(numerator / denominator)
        }
    }

    /// Whether this is the zero-denominator stand-in.
    pub fn is_undefined(&self) -> bool {
        self.undefined
    }
}

fn check_cutoff(k: usize) -> Result<()> {
    if k == 0 {
        Err(EvalError::InvalidCutoff(k))
    } else {
        Ok(())
    }
}

/// Number of relevant documents among the first `k` results.
fn relevant_in_top(
    relevant: &BTreeSet<DocumentId>,
    results: &[RetrievedDocument],
    k: usize,
) -> usize {
    results
        .iter()
        .take(k)
        .filter(|r| relevant.contains(&r.document))
        .count()
}

/// Precision@k: relevant documents in the top `k`, divided by `k`.
///
/// The denominator stays `k` when the list is shorter than `k`; missing
/// slots count as non-relevant. Never undefined.
pub fn precision_at_k(
    store: &RelevanceStore,
    query: QueryId,
    results: &[RetrievedDocument],
    k: usize,
) -> Result<MetricValue> {
    check_cutoff(k)?;
    let relevant = store.relevant_documents_of(query)?;
    let hits = relevant_in_top(&relevant, results, k);
    Ok(MetricValue::defined(hits as f64 / k as f64))
}

/// Recall@k: relevant documents in the top `k`, divided by the number of
/// relevant documents for the query.
pub fn recall_at_k(
    store: &RelevanceStore,
    query: QueryId,
    results: &[RetrievedDocument],
    k: usize,
) -> Result<MetricValue> {
    check_cutoff(k)?;
    let relevant = store.relevant_documents_of(query)?;
    let hits = relevant_in_top(&relevant, results, k);
    Ok(MetricValue::ratio(hits as f64, relevant.len() as f64))
}

/// r-Precision: precision at a cutoff equal to the number of relevant
/// documents for the query.
pub fn r_precision(
    store: &RelevanceStore,
    query: QueryId,
    results: &[RetrievedDocument],
) -> Result<MetricValue> {
    let relevant = store.relevant_documents_of(query)?;
    let hits = relevant_in_top(&relevant, results, relevant.len());
    Ok(MetricValue::ratio(hits as f64, relevant.len() as f64))
}

/// Average Precision over the whole list.
///
/// ```text
/// AP = (1 / R) * Σ hits_through(i) / i   for each rank i holding a relevant doc
/// ```
///
/// where `R` is the number of relevant documents for the query, including
/// those the run never retrieved.
pub fn average_precision(
    store: &RelevanceStore,
    query: QueryId,
    results: &[RetrievedDocument],
) -> Result<MetricValue> {
    let relevant = store.relevant_documents_of(query)?;

    let mut hits = 0usize;
    let mut precision_sum = 0.0;
    for (i, row) in results.iter().enumerate() {
        if relevant.contains(&row.document) {
            hits += 1;
            precision_sum += hits as f64 / (i + 1) as f64;
        }
    }

    Ok(MetricValue::ratio(precision_sum, relevant.len() as f64))
}

/// Discount for a 1-based rank.
///
/// Rank 1 is undiscounted and rank `i > 1` is divided by `log2(i)`, so
/// ranks 1 and 2 both carry full weight. This is not the `log2(i + 1)`
/// variant; report values depend on it.
#[inline]
fn discount(rank: usize) -> f64 {
    if rank <= 1 {
        1.0
    } else {
        (rank as f64).log2()
    }
}

/// Sum of `grade / discount(rank)` over grades given in rank order.
fn discounted_sum(grades: impl Iterator<Item = Grade>) -> f64 {
    grades
        .enumerate()
        .map(|(i, grade)| grade as f64 / discount(i + 1))
        .sum()
}

/// DCG of the first `k` results, using raw grades as gains.
pub fn dcg_at_k(
    store: &RelevanceStore,
    query: QueryId,
    results: &[RetrievedDocument],
    k: usize,
) -> Result<f64> {
    check_cutoff(k)?;
    let grades = results
        .iter()
        .take(k)
        .map(|r| store.relevance_of(query, r.document))
        .collect::<Result<Vec<_>>>()?;
    Ok(discounted_sum(grades.into_iter()))
}

/// DCG of the ideal ordering: judged grades sorted descending, truncated
/// to `k` or the number of judged documents, whichever is smaller.
pub fn ideal_dcg_at_k(store: &RelevanceStore, query: QueryId, k: usize) -> Result<f64> {
    check_cutoff(k)?;
    let ideal = store.ideal_ranking(query)?;
    Ok(discounted_sum(ideal.into_iter().take(k).map(|(_, grade)| grade)))
}

/// nDCG@k = DCG@k / iDCG@k. Undefined when iDCG@k is zero.
pub fn ndcg_at_k(
    store: &RelevanceStore,
    query: QueryId,
    results: &[RetrievedDocument],
    k: usize,
) -> Result<MetricValue> {
    let dcg = dcg_at_k(store, query, results, k)?;
    let idcg = ideal_dcg_at_k(store, query, k)?;
    Ok(MetricValue::ratio(dcg, idcg))
}

/// Every configured metric for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct QueryMetrics {
    /// Query these values belong to.
    pub query: QueryId,
    /// Precision at `cutoffs.precision`.
    pub precision: MetricValue,
    /// Recall at `cutoffs.recall`.
    pub recall: MetricValue,
    pub r_precision: MetricValue,
    pub average_precision: MetricValue,
    /// nDCG at each of `cutoffs.ndcg`, same order.
    pub ndcg: Vec<MetricValue>,
}

impl QueryMetrics {
    /// Compute all metrics for one query's ranking.
    pub fn compute(
        store: &RelevanceStore,
        query: QueryId,
        results: &[RetrievedDocument],
        cutoffs: &Cutoffs,
    ) -> Result<Self> {
        let ndcg = cutoffs
            .ndcg
            .iter()
            .map(|&k| ndcg_at_k(store, query, results, k))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            query,
            precision: precision_at_k(store, query, results, cutoffs.precision)?,
            recall: recall_at_k(store, query, results, cutoffs.recall)?,
            r_precision: r_precision(store, query, results)?,
            average_precision: average_precision(store, query, results)?,
            ndcg,
        })
    }

    /// Values in report column order: P, R, r-Precision, AP, then each nDCG.
    pub fn values(&self) -> Vec<MetricValue> {
        let mut values = vec![
            self.precision,
            self.recall,
            self.r_precision,
            self.average_precision,
        ];
        values.extend(self.ndcg.iter().copied());
        values
    }

    /// Whether any value is a zero-denominator stand-in.
    pub fn has_undefined(&self) -> bool {
        self.values().iter().any(MetricValue::is_undefined)
    }
}
