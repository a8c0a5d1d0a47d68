//! Backend executors: the element loop, specialised per connectivity and
//! tuple shape.
//!
//! Both executors split the output domain into blocks of consecutive
//! elements and run the same [`process_block`] routine over each. The host
//! executor spreads blocks over the rayon pool; the device executor hands them
//! to [`Device::launch`] as one bulk kernel.

use std::sync::Arc;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::algs::functor::CombinedFunctor;
use crate::backend::device::{Block, Device};
use crate::data::residency::Placement;
use crate::data::tuple::{Elements, OutputElements};
use crate::mesh_error::MeshMapError;
use crate::topology::connectivity::Connectivity;
use crate::topology::local_ids::LocalIds;

/// Elements per block unless configured otherwise.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// A backend able to run the element loop.
pub trait BackendExecutor {
    /// Memory space the loop reads and writes.
    fn placement(&self) -> Placement;

    /// Human-readable backend name for logs.
    fn label(&self) -> String;

    /// Visit elements `0..count` of `conn`: gather `dst` at the element, call
    /// `functor`, scatter the result into `out`.
    ///
    /// Every slot of `out` must hold exactly `count` elements and every slot
    /// of `dst` at least `count`.
    fn execute<C, S, D, O, F>(
        &self,
        conn: &C,
        count: usize,
        src: S::Slices<'_>,
        dst: D::Slices<'_>,
        out: O::SlicesMut<'_>,
        functor: &F,
    ) -> Result<(), MeshMapError>
    where
        C: Connectivity,
        S: Elements,
        D: Elements,
        O: OutputElements,
        F: CombinedFunctor<S, D, O>;
}

/// Run the elements `start..start + len`; `out` is the block's own chunk.
#[inline]
fn process_block<C, S, D, O, F>(
    conn: &C,
    src: &S::Slices<'_>,
    dst: &D::Slices<'_>,
    mut out: O::SlicesMut<'_>,
    start: usize,
    len: usize,
    functor: &F,
) -> Result<(), MeshMapError>
where
    C: Connectivity,
    S: Elements,
    D: Elements,
    O: OutputElements,
    F: CombinedFunctor<S, D, O>,
{
    let mut ids = LocalIds::new();
    for local in 0..len {
        let index = start + local;
        let shape = conn.element_components(index, &mut ids)?;
        let values = functor.call(shape, &ids, src, D::gather(dst, index));
        O::scatter(&mut out, local, values);
    }
    Ok(())
}

#[inline]
fn block_len(block: usize, count: usize, index: usize) -> usize {
    block.min(count - index * block)
}

/// Multi-core host loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HostExecutor {
    block_size: usize,
    parallel: bool,
}

impl Default for HostExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE, true)
    }
}

impl HostExecutor {
    /// `parallel` is ignored without the `rayon` feature.
    pub fn new(block_size: usize, parallel: bool) -> Self {
        Self {
            block_size: block_size.max(1),
            parallel,
        }
    }

    /// Single-threaded loop, in element order.
    pub fn sequential() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE, false)
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn is_parallel(&self) -> bool {
        cfg!(feature = "rayon") && self.parallel
    }
}

impl BackendExecutor for HostExecutor {
    fn placement(&self) -> Placement {
        Placement::Host
    }

    fn label(&self) -> String {
        if self.is_parallel() {
            "host (rayon)".to_string()
        } else {
            "host".to_string()
        }
    }

    fn execute<C, S, D, O, F>(
        &self,
        conn: &C,
        count: usize,
        src: S::Slices<'_>,
        dst: D::Slices<'_>,
        out: O::SlicesMut<'_>,
        functor: &F,
    ) -> Result<(), MeshMapError>
    where
        C: Connectivity,
        S: Elements,
        D: Elements,
        O: OutputElements,
        F: CombinedFunctor<S, D, O>,
    {
        let block = self.block_size;
        let blocks = O::split_blocks(out, block);
        #[cfg(feature = "rayon")]
        if self.parallel {
            return blocks.into_par_iter().enumerate().try_for_each(|(b, chunk)| {
                process_block::<C, S, D, O, F>(
                    conn,
                    &src,
                    &dst,
                    chunk,
                    b * block,
                    block_len(block, count, b),
                    functor,
                )
            });
        }
        blocks.into_iter().enumerate().try_for_each(|(b, chunk)| {
            process_block::<C, S, D, O, F>(
                conn,
                &src,
                &dst,
                chunk,
                b * block,
                block_len(block, count, b),
                functor,
            )
        })
    }
}

/// Bulk-parallel loop launched on an accelerator.
#[derive(Clone, Debug)]
pub struct DeviceExecutor {
    device: Arc<dyn Device>,
    block_size: usize,
}

impl DeviceExecutor {
    pub fn new(device: Arc<dyn Device>) -> Self {
        Self {
            device,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

impl BackendExecutor for DeviceExecutor {
    fn placement(&self) -> Placement {
        Placement::Device(Arc::clone(&self.device))
    }

    fn label(&self) -> String {
        format!("device `{}`", self.device.name())
    }

    fn execute<C, S, D, O, F>(
        &self,
        conn: &C,
        count: usize,
        src: S::Slices<'_>,
        dst: D::Slices<'_>,
        out: O::SlicesMut<'_>,
        functor: &F,
    ) -> Result<(), MeshMapError>
    where
        C: Connectivity,
        S: Elements,
        D: Elements,
        O: OutputElements,
        F: CombinedFunctor<S, D, O>,
    {
        let block = self.block_size;
        let (src, dst) = (&src, &dst);
        let blocks: Vec<Block<'_>> = O::split_blocks(out, block)
            .into_iter()
            .enumerate()
            .map(|(b, chunk)| {
                Box::new(move || {
                    process_block::<C, S, D, O, F>(
                        conn,
                        src,
                        dst,
                        chunk,
                        b * block,
                        block_len(block, count, b),
                        functor,
                    )
                }) as Block<'_>
            })
            .collect();
        log::trace!("{}: launching {} blocks", self.label(), blocks.len());
        self.device.launch(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::cell_type::CellType;
    use crate::topology::regular::{RegularConnectivity, RegularStructure};
    use crate::topology::relation::Topology;

    /// Writes the element's first adjacent id plus its gathered offset.
    struct FirstId;

    impl CombinedFunctor<(), (u32,), (u32,)> for FirstId {
        fn call(&self, _shape: CellType, ids: &LocalIds, _src: &(), dst: (u32,)) -> (u32,) {
            (ids[0] as u32 + dst.0,)
        }
    }

    fn line(cells: usize) -> RegularConnectivity {
        RegularConnectivity::new(
            RegularStructure::try_new(&[cells]).unwrap(),
            Topology::CellsToNodes,
        )
    }

    #[test]
    fn host_blocks_cover_every_element() {
        let conn = line(7);
        let offsets = [100u32; 7];
        for exec in [
            HostExecutor::new(3, true),
            HostExecutor::new(3, false),
            HostExecutor::new(64, true),
        ] {
            let mut out = [0u32; 7];
            exec.execute::<_, (), (u32,), (u32,), _>(
                &conn,
                7,
                (),
                (&offsets[..],),
                (&mut out[..],),
                &FirstId,
            )
            .unwrap();
            assert_eq!(out, [100, 101, 102, 103, 104, 105, 106]);
        }
    }

    #[test]
    fn errors_stop_the_loop() {
        // claims more elements than the grid has
        let conn = line(2);
        let offsets = [0u32; 3];
        let mut out = [0u32; 3];
        let err = HostExecutor::sequential()
            .execute::<_, (), (u32,), (u32,), _>(
                &conn,
                3,
                (),
                (&offsets[..],),
                (&mut out[..],),
                &FirstId,
            )
            .unwrap_err();
        assert_eq!(err, MeshMapError::ElementOutOfRange { index: 2, len: 2 });
    }

    #[test]
    fn zero_block_size_is_clamped() {
        assert_eq!(HostExecutor::new(0, false).block_size(), 1);
    }
}
