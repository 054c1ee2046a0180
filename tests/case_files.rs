//! Parsing of the case, mesh and boundary text formats.

use std::io::Write;
use std::path::PathBuf;

use quadflow::io::mesh::{load_boundaries, load_mesh};
use quadflow::{CaseConfig, FlowError};

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

const CASE: &str = "\
Re 250.0
delta_t 0.01
T 30.0
T_ramp 4.0
N_interval 100
epsilon 1e-4
max_corrections 50
relaxation 0.5
mesh cavity.msh
boundary cavity.bnd
outfile flow.vtk
tmpfile state.bin
";

// A 2x1 strip of unit squares split across two partitions.
const MESH: &str = "\
2 6 2
1 0.0 0.0
2 1.0 0.0
3 2.0 0.0
4 0.0 1.0
5 1.0 1.0
6 2.0 1.0
1 1 2 5 4 0
2 2 3 6 5 1
";

const BOUNDARY: &str = "\
1
1 3
1 4 5
6.0 0.0 0.0 0.0 0.0 0.0
0.6 0.0 0.0 0.0 0.0 0.0
";

#[test]
fn case_file_round_trips_all_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "cavity.cfd", CASE);
    let cfg = CaseConfig::load(&path).unwrap();
    assert_eq!(cfg.reynolds, 250.0);
    assert_eq!(cfg.delta_t, 0.01);
    assert_eq!(cfg.duration, 30.0);
    assert_eq!(cfg.t_ramp, 4.0);
    assert_eq!(cfg.output_interval, 100);
    assert_eq!(cfg.epsilon, 1e-4);
    assert_eq!(cfg.max_corrections, 50);
    assert_eq!(cfg.relaxation, 0.5);
    assert_eq!(cfg.mesh_path, PathBuf::from("cavity.msh"));
    assert_eq!(cfg.boundary_path, PathBuf::from("cavity.bnd"));
    assert_eq!(cfg.output_path, PathBuf::from("flow.vtk"));
    assert_eq!(cfg.checkpoint_path, PathBuf::from("state.bin"));
}

#[test]
fn misspelled_case_label_names_the_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "bad.cfd", &CASE.replace("delta_t", "dt"));
    match CaseConfig::load(&path) {
        Err(FlowError::Data { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected data error, got {other:?}"),
    }
}

#[test]
fn zero_output_interval_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "bad.cfd", &CASE.replace("N_interval 100", "N_interval 0"));
    match CaseConfig::load(&path) {
        Err(FlowError::Data { line, message, .. }) => {
            assert_eq!(line, 5);
            assert!(message.contains("N_interval"), "unexpected message: {message}");
        }
        other => panic!("expected data error, got {other:?}"),
    }
}

#[test]
fn negative_correction_budget_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        &dir,
        "bad.cfd",
        &CASE.replace("max_corrections 50", "max_corrections -1"),
    );
    match CaseConfig::load(&path) {
        Err(FlowError::Data { line, message, .. }) => {
            assert_eq!(line, 7);
            assert!(
                message.contains("max_corrections"),
                "unexpected message: {message}"
            );
        }
        other => panic!("expected data error, got {other:?}"),
    }
}

#[test]
fn mesh_topology_and_rank_membership() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "strip.msh", MESH);
    let mesh = load_mesh(&path).unwrap();
    assert_eq!(mesh.num_partitions, 2);
    assert_eq!(mesh.nodes.len(), 6);
    assert_eq!(mesh.elements.len(), 2);
    assert_eq!(mesh.elements[0].node_indices(), [0, 1, 4, 3]);
    assert_eq!(mesh.elements[1].rank(), 1);

    // The middle column borders both partitions.
    assert!(mesh.nodes[1].is_shared());
    assert!(mesh.nodes[4].is_shared());
    assert!(!mesh.nodes[0].is_shared());
    assert!(mesh.nodes[0].is_on_rank(0) && !mesh.nodes[0].is_on_rank(1));
}

#[test]
fn mesh_echo_index_mismatch_is_a_data_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "bad.msh", &MESH.replace("2 1.0 0.0", "7 1.0 0.0"));
    match load_mesh(&path) {
        Err(FlowError::Data { line, message, .. }) => {
            assert_eq!(line, 3);
            assert!(message.contains('7'), "unexpected message: {message}");
        }
        other => panic!("expected data error, got {other:?}"),
    }
}

#[test]
fn mesh_rejects_negative_header_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "bad.msh", &MESH.replace("2 6 2", "2 -6 2"));
    match load_mesh(&path) {
        Err(FlowError::Data { line, message, .. }) => {
            assert_eq!(line, 1);
            assert!(message.contains("-6"), "unexpected message: {message}");
        }
        other => panic!("expected data error, got {other:?}"),
    }

    let path = write_file(&dir, "bad2.msh", &MESH.replace("2 6 2", "0 6 2"));
    match load_mesh(&path) {
        Err(FlowError::Data { message, .. }) => {
            assert!(
                message.contains("process count"),
                "unexpected message: {message}"
            );
        }
        other => panic!("expected data error, got {other:?}"),
    }
}

#[test]
fn mesh_rejects_rank_beyond_partition_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "bad.msh", &MESH.replace("2 2 3 6 5 1", "2 2 3 6 5 2"));
    match load_mesh(&path) {
        Err(FlowError::Data { message, .. }) => {
            assert!(message.contains("rank 2"), "unexpected message: {message}");
        }
        other => panic!("expected data error, got {other:?}"),
    }
}

#[test]
fn boundary_groups_are_filtered_by_rank() {
    let dir = tempfile::tempdir().unwrap();
    let mesh_path = write_file(&dir, "strip.msh", MESH);
    let bnd_path = write_file(&dir, "strip.bnd", BOUNDARY);
    let mesh = load_mesh(&mesh_path).unwrap();

    // Group references nodes 1, 4, 5 (1-based); rank 0 owns 1 and 4 of those.
    let on_rank0 = load_boundaries(&bnd_path, &mesh.nodes, 0).unwrap();
    assert_eq!(on_rank0.len(), 1);
    assert_eq!(on_rank0[0].node_indices(), &[0, 3, 4]);
    assert_eq!(on_rank0[0].u_coeffs[0], 6.0);
    assert_eq!(on_rank0[0].v_coeffs[0], 0.6);

    let on_rank1 = load_boundaries(&bnd_path, &mesh.nodes, 1).unwrap();
    assert_eq!(on_rank1[0].node_indices(), &[4]);
}
