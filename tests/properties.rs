//! Property-based tests for the ranking metrics.
//!
//! Checks the bounds, monotonicity and perfect-ranking invariants of
//! precision, recall, r-precision, AP and nDCG across randomized
//! judgments and runs.

use std::collections::BTreeMap;

use proptest::prelude::*;

use ir_evaluator::metrics::{
    average_precision, ndcg_at_k, precision_at_k, r_precision, recall_at_k,
};
use ir_evaluator::report::MetricSummary;
use ir_evaluator::{DocumentId, Grade, MetricValue, RelevanceStore, RetrievedDocument};

const QUERY: u32 = 1;
const EPS: f64 = 1e-9;

// ── Strategies ────────────────────────────────────────────────────────

/// Judgments for one query: document -> grade, grade 0 allowed.
fn arb_judgments() -> impl Strategy<Value = BTreeMap<DocumentId, Grade>> {
    prop::collection::btree_map(0_u64..50, 0_u32..4, 0..20)
}

/// A ranking of distinct documents in random order.
fn arb_ranking() -> impl Strategy<Value = Vec<DocumentId>> {
    prop::collection::btree_set(0_u64..60, 0..30)
        .prop_map(|docs| docs.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

fn build_store(judgments: &BTreeMap<DocumentId, Grade>) -> RelevanceStore {
    let mut store = RelevanceStore::new();
    store.add_query(QUERY);
    for (&doc, &grade) in judgments {
        store.insert(QUERY, doc, grade);
    }
    store
}

fn to_run(docs: &[DocumentId]) -> Vec<RetrievedDocument> {
    docs.iter()
        .enumerate()
        .map(|(i, &doc)| RetrievedDocument::new(doc, i as u32 + 1, 100.0 - i as f64))
        .collect()
}

// ── Properties ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn precision_and_recall_are_bounded(
        judgments in arb_judgments(),
        ranking in arb_ranking(),
        k in 1_usize..40,
    ) {
        let store = build_store(&judgments);
        let run = to_run(&ranking);

        let p = precision_at_k(&store, QUERY, &run, k).unwrap();
        let r = recall_at_k(&store, QUERY, &run, k).unwrap();

        prop_assert!((0.0..=1.0).contains(&p.value));
        prop_assert!((0.0..=1.0).contains(&r.value));
    }

    #[test]
    fn recall_is_monotonic_in_k(
        judgments in arb_judgments(),
        ranking in arb_ranking(),
    ) {
        let store = build_store(&judgments);
        let run = to_run(&ranking);

        let mut previous = 0.0;
        for k in 1..=run.len() + 2 {
            let r = recall_at_k(&store, QUERY, &run, k).unwrap().value;
            prop_assert!(r + EPS >= previous, "recall dropped at k={}: {} < {}", k, r, previous);
            previous = r;
        }
    }

    #[test]
    fn all_metrics_are_bounded(
        judgments in arb_judgments(),
        ranking in arb_ranking(),
        k in 1_usize..40,
    ) {
        let store = build_store(&judgments);
        let run = to_run(&ranking);

        for value in [
            r_precision(&store, QUERY, &run).unwrap(),
            average_precision(&store, QUERY, &run).unwrap(),
            ndcg_at_k(&store, QUERY, &run, k).unwrap(),
        ] {
            prop_assert!(value.value >= 0.0);
            prop_assert!(value.value <= 1.0 + EPS);
        }
    }

    #[test]
    fn relevant_first_gives_perfect_r_precision_and_ap(
        judgments in arb_judgments(),
        extra in prop::collection::vec(100_u64..200, 0..10),
    ) {
        let store = build_store(&judgments);
        let relevant: Vec<DocumentId> =
            store.relevant_documents_of(QUERY).unwrap().into_iter().rev().collect();
        prop_assume!(!relevant.is_empty());

        let mut docs = relevant;
        docs.extend(extra);
        let run = to_run(&docs);

        prop_assert!((r_precision(&store, QUERY, &run).unwrap().value - 1.0).abs() < EPS);
        prop_assert!((average_precision(&store, QUERY, &run).unwrap().value - 1.0).abs() < EPS);
    }

    #[test]
    fn ideal_order_gives_perfect_ndcg(judgments in arb_judgments()) {
        let store = build_store(&judgments);
        prop_assume!(store.num_relevant(QUERY).unwrap() > 0);

        let ideal: Vec<DocumentId> = store
            .ideal_ranking(QUERY)
            .unwrap()
            .into_iter()
            .map(|(doc, _)| doc)
            .collect();
        let run = to_run(&ideal);

        for k in 1..=ideal.len() {
            let ndcg = ndcg_at_k(&store, QUERY, &run, k).unwrap();
            prop_assert!(!ndcg.is_undefined());
            prop_assert!((ndcg.value - 1.0).abs() < EPS, "nDCG@{} = {}", k, ndcg.value);
        }
    }

    #[test]
    fn no_relevant_documents_is_flagged(
        docs in prop::collection::btree_set(0_u64..50, 0..10),
        ranking in arb_ranking(),
        k in 1_usize..40,
    ) {
        let judgments: BTreeMap<DocumentId, Grade> = docs.into_iter().map(|d| (d, 0)).collect();
        let store = build_store(&judgments);
        let run = to_run(&ranking);

        for value in [
            recall_at_k(&store, QUERY, &run, k).unwrap(),
            r_precision(&store, QUERY, &run).unwrap(),
            ndcg_at_k(&store, QUERY, &run, k).unwrap(),
        ] {
            prop_assert!(value.is_undefined());
            prop_assert_eq!(value.value, 0.0);
        }
    }

    #[test]
    fn summary_mean_is_arithmetic_mean(
        raw in prop::collection::vec((0.0_f64..=1.0, any::<bool>()), 1..30),
    ) {
        let values: Vec<MetricValue> = raw
            .iter()
            .map(|&(v, undefined)| if undefined { MetricValue::undefined() } else { MetricValue::defined(v) })
            .collect();

        let expected = values.iter().map(|v| v.value).sum::<f64>() / values.len() as f64;
        let summary = MetricSummary::from_values(&values);

        prop_assert!((summary.mean - expected).abs() < EPS);
        prop_assert_eq!(
            summary.undefined_count,
            values.iter().filter(|v| v.is_undefined()).count()
        );
    }
}
