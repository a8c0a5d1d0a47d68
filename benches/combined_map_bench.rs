use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use mesh_topomap::prelude::*;

/// Average of a nodal field over each cell's corners.
#[derive(Clone, Copy)]
struct CellAverage;

impl CombinedFunctor<(f64,), (), (f64,)> for CellAverage {
    fn call(&self, _shape: CellType, ids: &LocalIds, src: &(&[f64],), _dst: ()) -> (f64,) {
        let sum: f64 = ids.iter().map(|&n| src.0[n]).sum();
        (sum / ids.len() as f64,)
    }
}

fn bench_cell_average(c: &mut Criterion) {
    let mut group = c.benchmark_group("combined-map");

    for &n in &[16usize, 32, 64] {
        let regular = RegularCellSet::try_new("grid", &[n, n, n]).unwrap();
        let explicit = ExplicitCellSet::from_regular("grid", regular.structure()).unwrap();
        let nodal = Array::from_vec(
            "nodal",
            (0..regular.num_nodes()).map(|i| i as f64).collect::<Vec<_>>(),
        );
        let zonal = Array::filled("zonal", regular.num_cells(), 0.0f64);
        let host = HostExecutor::default();
        let device = DeviceExecutor::new(Arc::new(EmulatedDevice::new("bench")));

        let cases: [(&str, &dyn CellSet); 2] = [("regular", &regular), ("explicit", &explicit)];
        for (kind, cells) in cases {
            group.bench_with_input(BenchmarkId::new(format!("host-{kind}"), n), &n, |b, _| {
                b.iter(|| {
                    CombinedTopologyMap::new(
                        black_box(cells),
                        Topology::CellsToNodes,
                        (&nodal,),
                        (),
                        (&zonal,),
                        CellAverage,
                    )
                    .run_with(&host)
                    .unwrap();
                });
            });
        }

        group.bench_with_input(BenchmarkId::new("device-explicit", n), &n, |b, _| {
            b.iter(|| {
                CombinedTopologyMap::new(
                    black_box(&explicit),
                    Topology::CellsToNodes,
                    (&nodal,),
                    (),
                    (&zonal,),
                    CellAverage,
                )
                .run_on_device(&device)
                .unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cell_average);
criterion_main!(benches);
