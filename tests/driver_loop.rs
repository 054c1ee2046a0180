//! Driver behavior on a single partition: the correction loop, the time
//! loop, snapshots and restart.

use std::path::PathBuf;
use std::time::Duration;

use approx::assert_relative_eq;
use quadflow::comm::{CommDirectory, NoTransport};
use quadflow::mesh::{Boundary, Node, QuadElement};
use quadflow::solver::{Driver, Partition};
use quadflow::CaseConfig;

fn config(epsilon: f64, max_corrections: usize, dir: &tempfile::TempDir) -> CaseConfig {
    CaseConfig {
        reynolds: 1.0,
        delta_t: 0.1,
        duration: 0.25,
        t_ramp: 0.0,
        output_interval: 2,
        epsilon,
        max_corrections,
        relaxation: 0.5,
        mesh_path: PathBuf::new(),
        boundary_path: PathBuf::new(),
        output_path: dir.path().join("flow.vtk"),
        checkpoint_path: dir.path().join("state.bin"),
    }
}

/// One 2x2 square element owned by rank 0, ownership resolved.
fn square_partition(boundaries: Vec<Boundary>) -> (Partition, CommDirectory) {
    let mut nodes = vec![
        Node::new(0.0, -2.0),
        Node::new(2.0, -2.0),
        Node::new(2.0, 0.0),
        Node::new(0.0, 0.0),
    ];
    for n in nodes.iter_mut() {
        n.add_rank(0);
    }
    let mut p = Partition::new(0, nodes, vec![QuadElement::new(0, [0, 1, 2, 3], 0)]);
    let mut comm = CommDirectory::new();
    p.find_own_data(&mut comm);
    p.set_boundaries(boundaries);
    (p, comm)
}

fn shear_velocity(p: &mut Partition) {
    for node in p.nodes_mut() {
        node.velocity.x = node.position.x;
        node.velocity.y = 0.0;
    }
}

#[test]
fn correction_loop_halves_the_discriminant_until_convergence() {
    let dir = tempfile::tempdir().unwrap();
    let (p, comm) = square_partition(Vec::new());
    let mut driver = Driver::from_parts(config(0.3, 10, &dir), NoTransport, p, comm);
    driver.calc_invariants().unwrap();
    shear_velocity(driver.partition_mut());

    driver.correct_velocity().unwrap();

    // relaxation 0.5 halves the divergence each iteration: 1 -> 0.5 -> 0.25,
    // and 0.25 is inside the 0.3 tolerance.
    assert_eq!(driver.corrections_total(), 2);
    assert_relative_eq!(
        driver.partition().elements()[0].discriminant(),
        0.25,
        max_relative = 1e-12
    );
    // Converging clears anything still staged.
    for node in driver.partition().nodes() {
        assert_eq!(node.velocity_delta.x, 0.0);
        assert_eq!(node.velocity_delta.y, 0.0);
    }
}

#[test]
fn correction_loop_stops_at_the_iteration_budget() {
    let dir = tempfile::tempdir().unwrap();
    // The boundary group pins u = x back onto all four corners, so the
    // divergence reappears after every correction.
    let mut pin = Boundary::new([0.0, 1.0, 0.0, 0.0, 0.0, 0.0], [0.0; 6]);
    for ni in 0..4 {
        pin.add_node(ni);
    }
    let (p, comm) = square_partition(vec![pin]);
    let mut driver = Driver::from_parts(config(1e-4, 5, &dir), NoTransport, p, comm);
    driver.calc_invariants().unwrap();
    shear_velocity(driver.partition_mut());

    driver.correct_velocity().unwrap();

    assert_eq!(driver.corrections_total(), 5);
    // Every iteration saw the same unit discriminant, so the pressure
    // dropped by lambda each time (lambda = 2.5 on this square).
    assert_relative_eq!(
        driver.partition().elements()[0].pressure(),
        -5.0 * 2.5,
        max_relative = 1e-12
    );
}

#[test]
fn zero_correction_budget_is_a_quiet_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let (p, comm) = square_partition(Vec::new());
    let mut driver = Driver::from_parts(config(1e-4, 0, &dir), NoTransport, p, comm);
    driver.calc_invariants().unwrap();
    shear_velocity(driver.partition_mut());

    // Nothing runs and nothing is counted, even though the field diverges.
    driver.correct_velocity().unwrap();
    assert_eq!(driver.corrections_total(), 0);
    assert_eq!(driver.partition().elements()[0].pressure(), 0.0);
}

#[test]
fn time_loop_covers_the_duration_and_snapshots_on_interval() {
    let dir = tempfile::tempdir().unwrap();
    let (p, comm) = square_partition(Vec::new());
    let mut driver = Driver::from_parts(config(1e-4, 5, &dir), NoTransport, p, comm);
    driver.calc_invariants().unwrap();

    driver.time_loop().unwrap();

    // Steps at t = 0, 0.1, 0.2, 0.3; the loop exits once t > T + dt.
    assert_eq!(driver.clock().round(), 4);
    assert!(dir.path().join("flow_r00000_s0000000.vtk").exists());
    assert!(dir.path().join("flow_r00000_s0000002.vtk").exists());
    assert!(!dir.path().join("flow_r00000_s0000001.vtk").exists());
}

#[test]
fn exhausted_wall_clock_budget_stops_before_stepping() {
    let dir = tempfile::tempdir().unwrap();
    let (p, comm) = square_partition(Vec::new());
    let mut driver = Driver::from_parts(config(1e-4, 5, &dir), NoTransport, p, comm);
    driver.calc_invariants().unwrap();
    driver.set_wall_clock_budget(Some(Duration::ZERO));

    driver.time_loop().unwrap();

    assert_eq!(driver.clock().round(), 0);
    assert_eq!(driver.clock().t(), 0.0);
}

#[test]
fn checkpoint_restart_resumes_the_clock() {
    let dir = tempfile::tempdir().unwrap();
    let (p, comm) = square_partition(Vec::new());
    let mut driver = Driver::from_parts(config(1e-4, 5, &dir), NoTransport, p, comm);
    driver.calc_invariants().unwrap();
    driver.time_loop().unwrap();
    driver.save_state().unwrap();
    let t_end = driver.clock().t();

    let (p2, comm2) = square_partition(Vec::new());
    let mut resumed = Driver::from_parts(config(1e-4, 5, &dir), NoTransport, p2, comm2);
    resumed.init_field_data().unwrap();
    assert_eq!(resumed.clock().t(), t_end);
    assert_eq!(resumed.clock().round(), driver.clock().round());
}
