use std::sync::atomic::{AtomicU32, Ordering};

use mesh_topomap::prelude::*;
use proptest::prelude::*;

/// Copies the gathered destination values straight to the outputs.
#[derive(Clone, Copy)]
struct Identity;

impl CombinedFunctor<(), (f64, u32), (f64, u32)> for Identity {
    fn call(&self, _shape: CellType, _ids: &LocalIds, _src: &(), dst: (f64, u32)) -> (f64, u32) {
        dst
    }
}

/// Counts calls per element; the element index arrives as a destination input.
struct Tally<'t> {
    hits: &'t [AtomicU32],
}

impl CombinedFunctor<(), (u32,), (u32,)> for Tally<'_> {
    fn call(&self, _shape: CellType, _ids: &LocalIds, _src: &(), dst: (u32,)) -> (u32,) {
        self.hits[dst.0 as usize].fetch_add(1, Ordering::Relaxed);
        dst
    }
}

/// Order-sensitive digest of the adjacency: position-weighted source values
/// plus the shape code.
#[derive(Clone, Copy)]
struct Digest;

impl CombinedFunctor<(f64,), (), (f64, i32)> for Digest {
    fn call(&self, shape: CellType, ids: &LocalIds, src: &(&[f64],), _dst: ()) -> (f64, i32) {
        let sum = ids
            .iter()
            .enumerate()
            .map(|(k, &id)| (k + 1) as f64 * src.0[id])
            .sum();
        (sum, shape.code())
    }
}

/// Sum of the corner node ids of each cell, mod 1000.
#[derive(Clone, Copy)]
struct CornerSum;

impl CombinedFunctor<(u32,), (), (u32,)> for CornerSum {
    fn call(&self, _shape: CellType, ids: &LocalIds, src: &(&[u32],), _dst: ()) -> (u32,) {
        (ids.iter().map(|&n| src.0[n]).sum::<u32>() % 1000,)
    }
}

fn grid_dims() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..5, 1..=3)
}

fn both_kinds(dims: &[usize]) -> (RegularCellSet, ExplicitCellSet) {
    let regular = RegularCellSet::try_new("grid", dims).unwrap();
    let explicit = ExplicitCellSet::from_regular("grid-explicit", regular.structure()).unwrap();
    (regular, explicit)
}

fn element_count(cells: &dyn CellSet, topology: Topology) -> usize {
    cells.connectivity(topology).unwrap().element_count()
}

fn run_identity(cells: &dyn CellSet, topology: Topology, seed: u64) {
    let n = element_count(cells, topology);
    let values: Vec<f64> = (0..n).map(|i| (i as f64 + 0.25) * (seed as f64 - 3.5)).collect();
    let tags: Vec<u32> = (0..n).map(|i| (i as u32).wrapping_mul(2_654_435_761)).collect();
    let dst_values = Array::from_vec("values", values.clone());
    let dst_tags = Array::from_vec("tags", tags.clone());
    let out_values = Array::filled("out values", n, f64::NAN);
    let out_tags = Array::filled("out tags", n, 0u32);
    CombinedTopologyMap::new(
        cells,
        topology,
        (),
        (&dst_values, &dst_tags),
        (&out_values, &out_tags),
        Identity,
    )
    .run_on_host()
    .unwrap();
    let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&out_values.into_vec()), bits(&values));
    assert_eq!(out_tags.into_vec(), tags);
}

fn digest(cells: &dyn CellSet, topology: Topology, field: &[f64]) -> (Vec<f64>, Vec<i32>) {
    let n = element_count(cells, topology);
    let src = Array::from_vec("field", field.to_vec());
    let sums = Array::filled("sums", n, 0.0f64);
    let codes = Array::filled("codes", n, 0i32);
    CombinedTopologyMap::new(cells, topology, (&src,), (), (&sums, &codes), Digest)
        .run_on_host()
        .unwrap();
    (sums.into_vec(), codes.into_vec())
}

proptest! {
    #[test]
    fn identity_on_both_kinds(dims in grid_dims(), seed in 0u64..16) {
        let (regular, explicit) = both_kinds(&dims);
        for topology in [Topology::CellsToNodes, Topology::NodesToCells] {
            run_identity(&regular, topology, seed);
            run_identity(&explicit, topology, seed);
        }
        run_identity(&regular, Topology::CellsToCells, seed);
    }

    #[test]
    fn explicit_rebuild_matches_regular(dims in grid_dims(), scale in 0.5f64..4.0) {
        let (regular, explicit) = both_kinds(&dims);
        let nodes = regular.num_nodes();
        let cells = regular.num_cells();

        let nodal: Vec<f64> = (0..nodes).map(|i| scale * (i as f64).sqrt()).collect();
        prop_assert_eq!(
            digest(&regular, Topology::CellsToNodes, &nodal),
            digest(&explicit, Topology::CellsToNodes, &nodal)
        );

        let zonal: Vec<f64> = (0..cells).map(|i| scale * (i * i) as f64).collect();
        prop_assert_eq!(
            digest(&regular, Topology::NodesToCells, &zonal),
            digest(&explicit, Topology::NodesToCells, &zonal)
        );
    }
}

#[test]
fn every_element_visited_once() {
    let (regular, explicit) = both_kinds(&[5, 4, 3]);
    let cases: [(&dyn CellSet, Topology); 5] = [
        (&regular, Topology::CellsToNodes),
        (&regular, Topology::NodesToCells),
        (&regular, Topology::CellsToCells),
        (&explicit, Topology::CellsToNodes),
        (&explicit, Topology::NodesToCells),
    ];
    for (cells, topology) in cases {
        let n = element_count(cells, topology);
        let hits: Vec<AtomicU32> = (0..n).map(|_| AtomicU32::new(0)).collect();
        let index = Array::from_vec("index", (0..n as u32).collect());
        let out = Array::filled("out", n, u32::MAX);
        // small blocks so the parallel path splits the work
        CombinedTopologyMap::new(cells, topology, (), (&index,), (&out,), Tally { hits: &hits })
            .run_with(&HostExecutor::new(7, true))
            .unwrap();
        assert!(
            hits.iter().all(|h| h.load(Ordering::Relaxed) == 1),
            "{topology} on `{}`",
            cells.name()
        );
        assert_eq!(out.into_vec(), (0..n as u32).collect::<Vec<_>>());
    }
}

#[test]
fn hex_grid_corner_sums() {
    let grid = RegularCellSet::try_new("hex", &[2, 2, 2]).unwrap();
    assert_eq!((grid.num_cells(), grid.num_nodes()), (8, 27));
    let node_ids = Array::from_vec("node ids", (0..27u32).collect());
    let sums = Array::filled("sums", 8, 0u32);
    CombinedTopologyMap::new(&grid, Topology::CellsToNodes, (&node_ids,), (), (&sums,), CornerSum)
        .run_on_host()
        .unwrap();
    let sums = sums.into_vec();

    // node (i, j, k) of a 3x3x3 lattice is i + 3j + 9k
    let node = |i: u32, j: u32, k: u32| i + 3 * j + 9 * k;
    let corner_sum = |ci: u32, cj: u32, ck: u32| {
        let mut total = 0;
        for dk in 0..2 {
            for dj in 0..2 {
                for di in 0..2 {
                    total += node(ci + di, cj + dj, ck + dk);
                }
            }
        }
        total % 1000
    };
    assert_eq!(corner_sum(0, 0, 0), 52);
    assert_eq!(sums[0], corner_sum(0, 0, 0));
    for ck in 0..2 {
        for cj in 0..2 {
            for ci in 0..2 {
                let cell = (ci + 2 * cj + 4 * ck) as usize;
                assert_eq!(sums[cell], corner_sum(ci, cj, ck));
            }
        }
    }
}
