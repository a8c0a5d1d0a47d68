//! Connectivity-kind dispatch.
//!
//! One `match` on [`ConnectivityRef`] per operation selects the concrete
//! [`Connectivity`] type; the backend's element loop is then instantiated for
//! that type and the operation's element tuples, so the per-element path has
//! no dynamic dispatch left.
//!
//! [`Connectivity`]: crate::topology::connectivity::Connectivity

use crate::algs::functor::CombinedFunctor;
use crate::backend::executor::BackendExecutor;
use crate::data::tuple::{Elements, OutputElements};
use crate::mesh_error::MeshMapError;
use crate::topology::connectivity::ConnectivityRef;

/// Run the element loop of `backend` over `connectivity`.
///
/// Explicit connectivity is leased into the backend's memory space for the
/// duration of the loop and released on return, on success or failure.
pub fn dispatch<E, S, D, O, F>(
    backend: &E,
    connectivity: ConnectivityRef<'_>,
    count: usize,
    src: S::Slices<'_>,
    dst: D::Slices<'_>,
    out: O::SlicesMut<'_>,
    functor: &F,
) -> Result<(), MeshMapError>
where
    E: BackendExecutor,
    S: Elements,
    D: Elements,
    O: OutputElements,
    F: CombinedFunctor<S, D, O>,
{
    match connectivity {
        ConnectivityRef::Explicit(conn) => {
            let lease = conn.lease(&backend.placement())?;
            backend.execute::<_, S, D, O, F>(&lease.view(), count, src, dst, out, functor)
        }
        ConnectivityRef::Regular(conn) => {
            backend.execute::<_, S, D, O, F>(&conn, count, src, dst, out, functor)
        }
    }
}
