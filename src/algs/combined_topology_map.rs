//! The combined topology map: one functor call per destination element, fed
//! by whole source-topology arrays and gathered destination-topology values.
//!
//! A map is built once, run once on a backend and dropped. Running it:
//! 1. resolves the cell set's connectivity for the relation (explicit or
//!    regular, anything else is [`MeshMapError::UnsupportedCellSet`]);
//! 2. checks every bound array against the element count, taken from the
//!    first output array;
//! 3. leases every array, and explicit connectivity, into the backend's
//!    memory space;
//! 4. runs the backend's element loop specialised for the connectivity kind.
//!
//! Leases are released on every exit path, so a failed device run never
//! leaves arrays stranded on the device. Outputs of a failed run hold
//! unspecified values.

use crate::algs::dispatch::dispatch;
use crate::algs::functor::CombinedFunctor;
use crate::backend::config::{Executor, Operation};
use crate::backend::executor::{BackendExecutor, DeviceExecutor, HostExecutor};
use crate::data::tuple::{ArrayTuple, OutputArrayTuple};
use crate::mesh_error::MeshMapError;
use crate::topology::cell_set::CellSet;
use crate::topology::connectivity::ConnectivityRef;
use crate::topology::relation::Topology;

/// A map operation bound to its cell set, relation, arrays and functor.
///
/// `S` and `D` are tuples of `&Array` (possibly `()`), `O` a non-empty one.
pub struct CombinedTopologyMap<'a, S, D, O, F> {
    cells: &'a dyn CellSet,
    topology: Topology,
    src: S,
    dst: D,
    out: O,
    functor: F,
}

impl<'a, S, D, O, F> CombinedTopologyMap<'a, S, D, O, F>
where
    S: ArrayTuple<'a>,
    D: ArrayTuple<'a>,
    O: OutputArrayTuple<'a>,
    F: CombinedFunctor<S::Elements, D::Elements, O::Elements>,
{
    pub fn new(
        cells: &'a dyn CellSet,
        topology: Topology,
        src: S,
        dst: D,
        out: O,
        functor: F,
    ) -> Self {
        Self {
            cells,
            topology,
            src,
            dst,
            out,
            functor,
        }
    }

    pub fn cell_set(&self) -> &'a dyn CellSet {
        self.cells
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Number of functor calls a run makes.
    pub fn element_count(&self) -> usize {
        self.out.first_len()
    }

    /// Run on the host with the default host executor.
    pub fn run_on_host(self) -> Result<(), MeshMapError> {
        self.run_with(&HostExecutor::default())
    }

    /// Run on `backend`'s device.
    pub fn run_on_device(self, backend: &DeviceExecutor) -> Result<(), MeshMapError> {
        self.run_with(backend)
    }

    /// Run on the backend `executor` selects.
    pub fn execute(self, executor: &Executor) -> Result<(), MeshMapError> {
        executor.run(self)
    }

    fn resolve(&self) -> Result<ConnectivityRef<'a>, MeshMapError> {
        let connectivity = self.cells.connectivity(self.topology)?;
        let count = self.element_count();
        let elements = connectivity.element_count();
        if count > elements {
            return Err(MeshMapError::ElementCountMismatch {
                topology: self.topology,
                elements,
                outputs: count,
            });
        }
        for (name, len) in OutputArrayTuple::describe(&self.out) {
            check_len(name, len, count, len == count)?;
        }
        for (name, len) in ArrayTuple::describe(&self.dst) {
            check_len(name, len, count, len >= count)?;
        }
        let sources = connectivity.source_count();
        for (name, len) in ArrayTuple::describe(&self.src) {
            check_len(name, len, sources, len >= sources)?;
        }
        Ok(connectivity)
    }
}

fn check_len(name: &str, found: usize, expected: usize, ok: bool) -> Result<(), MeshMapError> {
    if ok {
        Ok(())
    } else {
        Err(MeshMapError::ArrayLengthMismatch {
            name: name.to_string(),
            expected,
            found,
        })
    }
}

impl<'a, S, D, O, F> Operation for CombinedTopologyMap<'a, S, D, O, F>
where
    S: ArrayTuple<'a>,
    D: ArrayTuple<'a>,
    O: OutputArrayTuple<'a>,
    F: CombinedFunctor<S::Elements, D::Elements, O::Elements>,
{
    type Output = ();

    fn describe(&self) -> String {
        format!("{} map over `{}`", self.topology, self.cells.name())
    }

    fn run_with<E: BackendExecutor>(self, backend: &E) -> Result<(), MeshMapError> {
        let connectivity = self.resolve()?;
        let count = self.element_count();
        log::debug!(
            "{}: {} connectivity, {} elements on {}",
            Operation::describe(&self),
            connectivity.kind(),
            count,
            backend.label()
        );

        let placement = backend.placement();
        let src_leases = ArrayTuple::lease(self.src, &placement)?;
        let dst_leases = ArrayTuple::lease(self.dst, &placement)?;
        let mut out_leases = OutputArrayTuple::lease(self.out, &placement)?;

        dispatch::<E, S::Elements, D::Elements, O::Elements, F>(
            backend,
            connectivity,
            count,
            S::slices(&src_leases),
            D::slices(&dst_leases),
            O::slices_mut(&mut out_leases),
            &self.functor,
        )?;
        O::commit(&mut out_leases);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::array::Array;
    use crate::topology::cell_set::{ExplicitCellSet, RegularCellSet};
    use crate::topology::cell_type::CellType;
    use crate::topology::local_ids::LocalIds;

    /// Number of adjacent ids, tagged with the shape code.
    #[derive(Clone, Copy)]
    struct Degree;

    impl CombinedFunctor<(), (), (u32, i32)> for Degree {
        fn call(&self, shape: CellType, ids: &LocalIds, _src: &(), _dst: ()) -> (u32, i32) {
            (ids.len() as u32, shape.code())
        }
    }

    #[test]
    fn node_degrees_on_a_regular_grid() {
        let grid = RegularCellSet::try_new("grid", &[2, 2]).unwrap();
        let degree = Array::filled("degree", 9, 0u32);
        let shape = Array::filled("shape", 9, 0i32);
        CombinedTopologyMap::new(&grid, Topology::NodesToCells, (), (), (&degree, &shape), Degree)
            .run_on_host()
            .unwrap();
        assert_eq!(degree.to_vec().unwrap(), vec![1, 2, 1, 2, 4, 2, 1, 2, 1]);
        assert!(shape.to_vec().unwrap().iter().all(|&c| c == CellType::Vertex.code()));
    }

    #[test]
    fn mixed_explicit_shapes() {
        let mut b = ExplicitCellSet::builder("mixed", 5);
        b.add_cell(CellType::Quadrilateral, &[0, 1, 2, 3]).unwrap();
        b.add_cell(CellType::Triangle, &[1, 4, 2]).unwrap();
        let cells = b.build().unwrap();
        let degree = Array::filled("degree", 2, 0u32);
        let shape = Array::filled("shape", 2, 0i32);
        CombinedTopologyMap::new(&cells, Topology::CellsToNodes, (), (), (&degree, &shape), Degree)
            .run_on_host()
            .unwrap();
        assert_eq!(degree.into_vec(), vec![4, 3]);
        assert_eq!(
            shape.into_vec(),
            vec![CellType::Quadrilateral.code(), CellType::Triangle.code()]
        );
    }

    #[test]
    fn length_checks_run_before_any_write() {
        let grid = RegularCellSet::try_new("grid", &[3]).unwrap();
        let too_many = Array::filled("degree", 4, 7u32);
        let shape = Array::filled("shape", 4, 7i32);
        let err = CombinedTopologyMap::new(
            &grid,
            Topology::CellsToNodes,
            (),
            (),
            (&too_many, &shape),
            Degree,
        )
        .run_on_host()
        .unwrap_err();
        assert_eq!(
            err,
            MeshMapError::ElementCountMismatch {
                topology: Topology::CellsToNodes,
                elements: 3,
                outputs: 4,
            }
        );

        let degree = Array::filled("degree", 3, 7u32);
        let short = Array::filled("shape", 2, 7i32);
        let err = CombinedTopologyMap::new(&grid, Topology::CellsToNodes, (), (), (&degree, &short), Degree)
            .run_on_host()
            .unwrap_err();
        assert_eq!(
            err,
            MeshMapError::ArrayLengthMismatch {
                name: "shape".into(),
                expected: 3,
                found: 2,
            }
        );
        assert_eq!(degree.to_vec().unwrap(), vec![7, 7, 7]);
    }

    #[test]
    fn describe_names_relation_and_cell_set() {
        let grid = RegularCellSet::try_new("grid", &[3]).unwrap();
        let degree = Array::filled("degree", 3, 0u32);
        let shape = Array::filled("shape", 3, 0i32);
        let map = CombinedTopologyMap::new(&grid, Topology::CellsToCells, (), (), (&degree, &shape), Degree);
        assert_eq!(Operation::describe(&map), "cell->cell map over `grid`");
        assert_eq!(map.element_count(), 3);
    }
}
