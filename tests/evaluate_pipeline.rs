//! End-to-end tests: input files on disk through to the written reports.

use ir_evaluator::{
    Cutoffs, EvalError, evaluate, load_evaluation, load_qrels, load_results_dir, save_evaluation,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const QRELS: &str = "1:(1,2) (2,1) (3,0)\n\n2: 5,1\n";
const S1: &str = "1 0 1 1 3.5\n1 0 2 2 2.5\n2 0 5 1 9.0\n1 0 3 3 0.5\n";
const S2: &str = "1 Q0 3 1 3.5 bm25\n1 Q0 1 2 2.5 bm25\n1 Q0 2 3 1.5 bm25\n2 Q0 6 1 9.0 bm25\n";

fn write_inputs(dir: &Path) {
    let systems = dir.join("systems");
    fs::create_dir_all(&systems).unwrap();
    fs::write(systems.join("qrels.txt"), QRELS).unwrap();
    fs::write(systems.join("S1.results"), S1).unwrap();
    fs::write(systems.join("S2.results"), S2).unwrap();
}

#[test]
fn test_reports_match_expected_tables() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());

    let store = load_qrels(&dir.path().join("systems/qrels.txt")).unwrap();
    let runs = load_results_dir(&dir.path().join("systems"), "results").unwrap();
    let evaluation = evaluate(&store, &runs, &Cutoffs::default()).unwrap();

    let out = dir.path().join("eval_out");
    evaluation.write_reports(&out).unwrap();

    let s1 = fs::read_to_string(out.join("S1.eval")).unwrap();
    assert_eq!(
        s1,
        "\tP@10\tR@50\tr-Precision\tAP\tnDCG@10\tnDCG@20\n\
         1\t0.200\t1.000\t1.000\t1.000\t1.000\t1.000\n\
         2\t0.100\t1.000\t1.000\t1.000\t1.000\t1.000\n\
         mean\t0.150\t1.000\t1.000\t1.000\t1.000\t1.000\n"
    );

    let s2 = fs::read_to_string(out.join("S2.eval")).unwrap();
    assert_eq!(
        s2,
        "\tP@10\tR@50\tr-Precision\tAP\tnDCG@10\tnDCG@20\n\
         1\t0.200\t1.000\t0.500\t0.583\t0.877\t0.877\n\
         2\t0.000\t0.000\t0.000\t0.000\t0.000\t0.000\n\
         mean\t0.100\t0.500\t0.250\t0.292\t0.438\t0.438\n"
    );

    let all = fs::read_to_string(out.join("All.eval")).unwrap();
    assert_eq!(
        all,
        "\tP@10\tR@50\tr-Precision\tAP\tnDCG@10\tnDCG@20\n\
         S1\t0.150\t1.000\t1.000\t1.000\t1.000\t1.000\n\
         S2\t0.100\t0.500\t0.250\t0.292\t0.438\t0.438\n"
    );
}

#[test]
fn test_malformed_results_abort_loading() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    fs::write(
        dir.path().join("systems/S3.results"),
        "1 0 1 1 1.0\n1 0 2 2\n",
    )
    .unwrap();

    match load_results_dir(&dir.path().join("systems"), "results") {
        Err(EvalError::MalformedLine { path, line, .. }) => {
            assert!(path.ends_with("S3.results"));
            assert_eq!(line, 2);
        }
        other => panic!("expected MalformedLine, got {other:?}"),
    }
}

#[test]
fn test_query_without_relevant_documents_is_flagged_in_saved_report() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    fs::write(dir.path().join("systems/qrels.txt"), "1:1,2 2,1 3,0\n2:5,0\n").unwrap();

    let store = load_qrels(&dir.path().join("systems/qrels.txt")).unwrap();
    let runs = load_results_dir(&dir.path().join("systems"), "results").unwrap();
    let evaluation = evaluate(&store, &runs, &Cutoffs::default()).unwrap();

    let saved = dir.path().join("evaluation.bin");
    save_evaluation(&evaluation, &saved).unwrap();
    let loaded = load_evaluation(&saved).unwrap();

    let s1 = loaded.system(1).unwrap();
    let q2 = &s1.rows[1];
    assert_eq!(q2.query, 2);
    assert!(q2.recall.is_undefined());
    assert!(q2.r_precision.is_undefined());
    assert!(q2.ndcg.iter().all(|v| v.is_undefined()));
    assert!(!q2.precision.is_undefined());

    // recall mean keeps the 0.0 stand-in; the defined-only mean drops it
    let recall = s1.summary[1];
    assert!((recall.mean - 0.5).abs() < 1e-9);
    assert_eq!(recall.defined_mean, Some(1.0));
    assert_eq!(recall.undefined_count, 1);
}

#[test]
fn test_missing_run_aborts_without_reports() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    fs::write(dir.path().join("systems/S3.results"), "1 0 1 1 1.0\n").unwrap();

    let store = load_qrels(&dir.path().join("systems/qrels.txt")).unwrap();
    let runs = load_results_dir(&dir.path().join("systems"), "results").unwrap();

    assert!(matches!(
        evaluate(&store, &runs, &Cutoffs::default()),
        Err(EvalError::MissingRun { system: 3, query: 2 })
    ));
}
