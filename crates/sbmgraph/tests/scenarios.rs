//! End-to-end scenarios: concrete generator outputs, layout geometry and
//! configuration snapshots.

use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use sbmgraph::algo::polarization;
use sbmgraph::layout::{BlockGroupedLayout, ForceAtlas2Layout, Layout};
use sbmgraph::{
    detect_degeneracies, generate, generate_seeded, Degeneracy, Error, GraphModel, LayoutSpec,
    SbmConfig,
};

fn dist(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

#[test]
fn identity_matrix_gives_two_triangles() {
    let p = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
    let g = generate_seeded(6, &[3, 3], &p, 2024).unwrap();

    let mut edges: Vec<_> = g.edges().collect();
    edges.sort_unstable();
    assert_eq!(edges, vec![(0, 1), (0, 2), (1, 2), (3, 4), (3, 5), (4, 5)]);

    let blocks: Vec<_> = g.nodes().map(|n| n.block).collect();
    assert_eq!(blocks, vec![0, 0, 0, 1, 1, 1]);
}

#[test]
fn identity_matrix_is_seed_independent() {
    let p = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
    let a = generate_seeded(6, &[3, 3], &p, 1).unwrap();
    let b = generate_seeded(6, &[3, 3], &p, 2).unwrap();
    assert!(a.edges().eq(b.edges()));
    assert_ne!(a.positions(), b.positions());
}

#[test]
fn validation_failures_are_distinct() {
    let p = vec![vec![0.5, 0.5], vec![0.5, 0.5]];
    let err = generate_seeded(7, &[3, 3], &p, 0).unwrap_err();
    assert!(matches!(err, Error::SizeMismatch { expected: 7, actual: 6 }));
    assert!(err.is_validation());
    assert!(err.to_string().contains("size mismatch"));

    let err = generate_seeded(6, &[2, 2, 2], &p, 0).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { blocks: 3, rows: 2, .. }));
    assert!(err.to_string().contains("dimension mismatch"));
}

#[test]
fn degenerate_inputs_build_without_error() {
    let g = generate_seeded(0, &[], &[], 0).unwrap();
    assert!(g.is_empty());
    assert_eq!(g.edge_count(), 0);
    assert!(detect_degeneracies(&[], &[]).contains(&Degeneracy::NoBlocks));

    let g = generate_seeded(0, &[0, 0], &[vec![0.5; 2], vec![0.5; 2]], 0).unwrap();
    assert!(g.is_empty());

    let zeros = vec![vec![0.0; 3]; 3];
    let g = generate_seeded(12, &[4, 4, 4], &zeros, 0).unwrap();
    assert_eq!(g.node_count(), 12);
    assert_eq!(g.edge_count(), 0);
    assert_eq!(
        detect_degeneracies(&[4, 4, 4], &zeros),
        vec![Degeneracy::EdgelessMatrix]
    );
}

#[test]
fn block_two_of_four_sits_left_of_center() {
    let zeros = vec![vec![0.0; 4]; 4];
    let mut g = generate_seeded(40, &[10, 10, 10, 10], &zeros, 9).unwrap();
    BlockGroupedLayout::new(4).assign(&mut g, &mut XorShiftRng::seed_from_u64(9));

    let block_two: Vec<_> = g.nodes().filter(|n| n.block == 2).collect();
    assert_eq!(block_two.len(), 10);
    for node in block_two {
        assert!(
            dist((node.x, node.y), (0.0, 0.5)) <= 0.15 + 1e-12,
            "node {} at ({}, {})",
            node.id,
            node.x,
            node.y
        );
    }
}

fn close_pairs(g: &GraphModel, threshold: f64) -> usize {
    let pos = g.positions();
    let mut count = 0;
    for i in 0..pos.len() {
        for j in (i + 1)..pos.len() {
            if dist(pos[i], pos[j]) < threshold {
                count += 1;
            }
        }
    }
    count
}

fn mean_pair_distance(g: &GraphModel) -> f64 {
    let pos = g.positions();
    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..pos.len() {
        for j in (i + 1)..pos.len() {
            total += dist(pos[i], pos[j]);
            pairs += 1;
        }
    }
    total / pairs as f64
}

#[test]
fn isolated_nodes_spread_out() {
    let zeros = vec![vec![0.0; 2]; 2];
    let start = generate_seeded(40, &[20, 20], &zeros, 31).unwrap();
    let initial_close = close_pairs(&start, 0.1);
    let initial_mean = mean_pair_distance(&start);
    assert!(initial_close > 0);

    for iterations in [1, 10, 50, 150] {
        let mut g = start.clone();
        ForceAtlas2Layout::new(iterations).assign(&mut g, &mut XorShiftRng::seed_from_u64(31));
        assert!(
            close_pairs(&g, 0.1) <= initial_close,
            "{iterations} iterations increased overlap"
        );
        assert!(mean_pair_distance(&g) > initial_mean);
    }
}

#[test]
fn config_snapshot_end_to_end() {
    let json = r#"{
        "blockSizes": [5, 5, 5],
        "pMatrix": [[0.9, 0.05, 0.05], [0.05, 0.9, 0.05], [0.05, 0.05, 0.9]],
        "layout": { "kind": "block-grouped", "params": { "blockCount": 3 } },
        "seed": 123
    }"#;
    let cfg = SbmConfig::from_json_str(json).unwrap();
    cfg.validate().unwrap();

    let g = cfg.build_seeded().unwrap();
    assert_eq!(g.node_count(), 15);
    let centers = BlockGroupedLayout::new(3).centers(3);
    for node in g.nodes() {
        assert!(dist((node.x, node.y), centers[node.block]) <= 0.15 + 1e-12);
    }

    // Same snapshot, same graph.
    let again = SbmConfig::from_json_str(&cfg.to_json_string().unwrap())
        .unwrap()
        .build_seeded()
        .unwrap();
    assert!(g.edges().eq(again.edges()));
    assert_eq!(g.positions(), again.positions());
}

#[test]
fn renderer_contract() {
    let cfg = SbmConfig::new(vec![2, 2], vec![vec![1.0, 0.0], vec![0.0, 1.0]])
        .with_layout(LayoutSpec::Circular)
        .with_seed(3);
    let g = cfg.build_seeded().unwrap();

    let value: serde_json::Value = serde_json::from_str(&g.to_json_string().unwrap()).unwrap();
    let nodes = value["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 4);
    for key in ["id", "label", "block", "x", "y", "size", "color"] {
        assert!(nodes[0].get(key).is_some(), "missing {key}");
    }
    assert_eq!(nodes[0]["label"], "Node 0");
    assert_eq!(nodes[2]["color"], "#1f77b4");
    assert_eq!(value["edges"], serde_json::json!([[0, 1], [2, 3]]));

    let back = GraphModel::from_json_str(&g.to_json_string().unwrap()).unwrap();
    assert!(back.edges().eq(g.edges()));
    for (a, b) in back.positions().into_iter().zip(g.positions()) {
        assert!(dist(a, b) < 1e-12);
    }
}

#[test]
fn shared_rng_drives_generation_and_layout() {
    let p = vec![vec![0.6, 0.1], vec![0.1, 0.6]];
    let mut rng = XorShiftRng::seed_from_u64(77);
    let mut a = generate(30, &[15, 15], &p, &mut rng).unwrap();
    ForceAtlas2Layout::new(30).assign(&mut a, &mut rng);

    let mut rng = XorShiftRng::seed_from_u64(77);
    let mut b = generate(30, &[15, 15], &p, &mut rng).unwrap();
    ForceAtlas2Layout::new(30).assign(&mut b, &mut rng);

    assert_eq!(a.positions(), b.positions());
}

#[test]
fn polarization_counts_planted_blocks() {
    let p = vec![vec![0.95, 0.01], vec![0.01, 0.95]];
    let g = generate_seeded(50, &[25, 25], &p, 5).unwrap();
    assert_eq!(polarization(&g, None), 2);
}
