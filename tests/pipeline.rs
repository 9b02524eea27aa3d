use std::fs;
use std::path::Path;

use ncrp::configs::{BuildGraphConfig, GraphConfig, OverlapSource, RunConfig};
use ncrp::create_overlap_graph::EdgeStats;
use ncrp::label_pipeline;
use tempfile::TempDir;

const KRAKEN: &str = "C\tr1\t562\t150\t562:116\n\
                      U\tr2\t0\t150\t0:116\n\
                      U\tr3\t0\t150\t0:116\n\
                      C\tr4\t562\t150\t562:116\n\
                      U\tr5\t0\t150\t0:116\n\
                      C\tr6\t1280\t150\t1280:116\n\
                      U\tr7\t0\t150\t0:116\n";

const EDGES: &str = "r1 r2 500\n\
                     r2 r3 400\n\
                     r3 r4 300\n\
                     r5 r6 200\n\
                     r1 r1 900\n\
                     r4 r5 100\n\
                     r2 r3 not_a_number\n";

fn run_config(dir: &Path, overlaps: OverlapSource) -> RunConfig {
    RunConfig {
        kraken: dir.join("kraken.txt"),
        overlaps,
        graph: GraphConfig::default(),
        hist_bin: 100,
        hist_out: Some(dir.join("overlap_hist.tsv")),
        degree_hist_out: Some(dir.join("degree_hist.tsv")),
        weight_hist_out: Some(dir.join("weight_hist.tsv")),
        weight_bins: 10,
        output: dir.join("final_labels.tsv"),
    }
}

const EXPECTED: &str = "C\tr1\t562\n\
                        C\tr2\t562\n\
                        C\tr3\t562\n\
                        C\tr4\t562\n\
                        C\tr5\t1280\n\
                        C\tr6\t1280\n\
                        U\tr7\t0\n";

#[test]
fn edge_list_run_fills_in_unclassified_reads() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    fs::write(dir.join("kraken.txt"), KRAKEN).unwrap();
    fs::write(dir.join("edges.txt"), EDGES).unwrap();

    let config = run_config(dir, OverlapSource::EdgeList(dir.join("edges.txt")));
    let summary = label_pipeline::run(&config).unwrap();

    assert_eq!(summary.edge_stats, EdgeStats { raw: 6, too_short: 1, self_loops: 1, kept_records: 4, unique_edges: 4 });
    assert_eq!(summary.total_reads, 7);
    assert_eq!(summary.initial_labels, 3);
    assert_eq!(summary.refined_labels, 3);
    assert_eq!(summary.final_labels, 6);
    assert_eq!(summary.graph_config, GraphConfig::default());

    assert_eq!(fs::read_to_string(dir.join("final_labels.tsv")).unwrap(), EXPECTED);

    let overlap_hist = fs::read_to_string(dir.join("overlap_hist.tsv")).unwrap();
    assert!(overlap_hist.starts_with("bin_left\tbin_right\tcount\n"));
    assert_eq!(overlap_hist.lines().count(), 1 + 5);
    assert!(fs::read_to_string(dir.join("degree_hist.tsv")).unwrap().contains("2\t2\n"));
    assert!(dir.join("weight_hist.tsv").exists());
}

#[test]
fn archived_graph_gives_same_labels() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    fs::write(dir.join("kraken.txt"), KRAKEN).unwrap();
    fs::write(dir.join("edges.txt"), EDGES).unwrap();

    let built_with = GraphConfig { min_overlap: 200, ..GraphConfig::default() };
    let build = BuildGraphConfig {
        overlaps: OverlapSource::EdgeList(dir.join("edges.txt")),
        graph: built_with,
        output: dir.join("graph.bin"),
    };
    let stats = label_pipeline::build_graph(&build).unwrap();
    assert_eq!(stats.unique_edges, 4);

    // run with the default threshold; the archive's own parameters win
    let mut config = run_config(dir, OverlapSource::Archive(dir.join("graph.bin")));
    config.hist_out = None;
    assert_eq!(config.graph.min_overlap, 130);
    let summary = label_pipeline::run(&config).unwrap();
    assert_eq!(summary.edge_stats, stats);
    assert_eq!(summary.graph_config, built_with);
    assert_eq!(fs::read_to_string(dir.join("final_labels.tsv")).unwrap(), EXPECTED);
}

#[test]
fn conflicting_paf_seeds_are_dropped() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    fs::write(dir.join("kraken.txt"), "C\ta\t10\nU\tx\t0\nC\tc\t20\n").unwrap();
    fs::write(
        dir.join("overlaps.paf"),
        "a\t1000\t0\t500\t+\tx\t1000\t500\t1000\t500\t500\t60\n\
         x\t1000\t0\t500\t+\tc\t1000\t500\t1000\t450\t500\t60\n",
    )
    .unwrap();

    let mut config = run_config(dir, OverlapSource::Paf(dir.join("overlaps.paf")));
    config.hist_out = None;
    let summary = label_pipeline::run(&config).unwrap();

    assert_eq!(summary.refined_labels, 0);
    assert_eq!(summary.final_labels, 0);
    assert_eq!(
        fs::read_to_string(dir.join("final_labels.tsv")).unwrap(),
        "U\ta\t0\nU\tx\t0\nU\tc\t0\n"
    );
}

#[test]
fn missing_classifier_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    fs::write(dir.join("edges.txt"), EDGES).unwrap();
    let config = run_config(dir, OverlapSource::EdgeList(dir.join("edges.txt")));
    let err = label_pipeline::run(&config).unwrap_err();
    assert!(format!("{:#}", err).contains("kraken.txt"));
}
