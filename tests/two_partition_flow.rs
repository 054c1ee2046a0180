//! Parity between a two-partition run and the equivalent single-partition
//! run on a 2x1 strip of unit squares.

use approx::assert_relative_eq;
use nalgebra::Vector2;
use quadflow::comm::{CommDirectory, LocalTransport, NoTransport, Transport};
use quadflow::mesh::{Node, QuadElement};
use quadflow::solver::Partition;

const RE: f64 = 10.0;
const DELTA_T: f64 = 0.05;
const RELAXATION: f64 = 0.5;

/// Shared topology of the strip; `ranks` assigns the two elements.
fn strip(ranks: [usize; 2]) -> (Vec<Node>, Vec<QuadElement>) {
    let coords = [
        (0.0, 0.0),
        (1.0, 0.0),
        (2.0, 0.0),
        (0.0, 1.0),
        (1.0, 1.0),
        (2.0, 1.0),
    ];
    let mut nodes: Vec<Node> = coords.iter().map(|&(x, y)| Node::new(x, y)).collect();
    let corners = [[0, 1, 4, 3], [1, 2, 5, 4]];
    let elements: Vec<QuadElement> = corners
        .iter()
        .zip(ranks)
        .enumerate()
        .map(|(i, (&c, rank))| {
            for ni in c {
                nodes[ni].add_rank(rank);
            }
            QuadElement::new(i, c, rank)
        })
        .collect();
    (nodes, elements)
}

fn shear_velocity(p: &mut Partition) {
    for node in p.nodes_mut() {
        node.velocity.x = node.position.x;
        node.velocity.y = 0.5 * node.position.y;
    }
}

/// Invariants plus one predictor step on a single partition owning both
/// elements.
fn serial_reference() -> Partition {
    let (nodes, elements) = strip([0, 0]);
    let mut p = Partition::new(0, nodes, elements);
    let mut comm = CommDirectory::new();
    p.find_own_data(&mut comm);
    assert!(comm.is_empty());

    p.calc_invariants_1(RE, &mut comm).unwrap();
    comm.exchange(&NoTransport).unwrap();
    p.calc_invariants_2(DELTA_T, RELAXATION, &comm).unwrap();

    shear_velocity(&mut p);
    p.calc_velocity_prediction();
    p.apply_velocity_delta_and_clear();
    p
}

fn parallel_rank(transport: LocalTransport) -> Partition {
    let rank = transport.rank();
    let (nodes, elements) = strip([0, 1]);
    let mut p = Partition::new(rank, nodes, elements);
    let mut comm = CommDirectory::new();
    p.find_own_data(&mut comm);
    assert_eq!(comm.peer_buffers().len(), 1);
    assert_eq!(comm.peer_buffers()[0].node_indices(), &[1, 4]);

    p.calc_invariants_1(RE, &mut comm).unwrap();
    comm.exchange(&transport).unwrap();
    p.calc_invariants_2(DELTA_T, RELAXATION, &comm).unwrap();

    shear_velocity(&mut p);
    p.calc_velocity_prediction();
    p.gather_velocity_delta(&mut comm);
    comm.exchange(&transport).unwrap();
    p.distribute_velocity_delta(&comm);
    p.apply_velocity_delta_and_clear();
    p
}

#[test]
fn split_run_reproduces_the_serial_fields() {
    let serial = serial_reference();

    let mut group = LocalTransport::group(2);
    let t1 = group.pop().unwrap();
    let t0 = group.pop().unwrap();
    let [part0, part1] = std::thread::scope(|s| {
        let h0 = s.spawn(move || parallel_rank(t0));
        let h1 = s.spawn(move || parallel_rank(t1));
        [h0.join().unwrap(), h1.join().unwrap()]
    });

    // Interior column mass is contributed by both partitions.
    for part in [&part0, &part1] {
        for ni in [1, 4] {
            assert_relative_eq!(part.nodes()[ni].mass, serial.nodes()[ni].mass);
            assert_relative_eq!(part.nodes()[ni].mass, 0.5);
        }
    }
    assert_relative_eq!(part0.nodes()[0].mass, 0.25);
    assert_relative_eq!(part1.nodes()[2].mass, 0.25);

    // After the delta exchange each rank's owned velocities match the
    // serial run, shared column included.
    for part in [&part0, &part1] {
        for &ni in part.owned_node_indices() {
            let got: Vector2<f64> = part.nodes()[ni].velocity;
            let want = serial.nodes()[ni].velocity;
            assert_relative_eq!(got.x, want.x, max_relative = 1e-12);
            assert_relative_eq!(got.y, want.y, max_relative = 1e-12);
        }
    }
}
