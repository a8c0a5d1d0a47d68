//! Structural invariant checks for mesh containers.
//!
//! Explicit connectivity is mutable only while a mesh is being built; once
//! frozen, its offsets, shapes and ids are checked here so every executor can
//! trust them without re-validating per element.

use crate::mesh_error::MeshMapError;

/// Validation of the structural invariants of a mesh container.
pub trait DebugInvariants {
    /// Panic on a broken invariant in debug builds (or with `check-invariants`).
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "structure check failed");
    }
    /// Validate invariants and return the first violation.
    fn validate_invariants(&self) -> Result<(), MeshMapError>;
}

/// Run a fallible invariant check and panic with context when checking is
/// enabled; compiles to nothing in plain release builds.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

/// Return `MeshMapError::InvalidStructure` with a formatted message unless
/// `cond` holds.
#[macro_export]
macro_rules! ensure_structure {
    ($cond:expr, $($fmt:tt)+) => {
        if !$cond {
            return Err($crate::mesh_error::MeshMapError::InvalidStructure(format!($($fmt)+)));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Offsets(Vec<u32>);

    impl DebugInvariants for Offsets {
        fn validate_invariants(&self) -> Result<(), MeshMapError> {
            ensure_structure!(!self.0.is_empty(), "offsets must hold a leading zero");
            ensure_structure!(
                self.0.windows(2).all(|w| w[0] <= w[1]),
                "offsets must be non-decreasing"
            );
            Ok(())
        }
    }

    #[test]
    fn ensure_structure_reports_message() {
        let err = Offsets(vec![0, 3, 2]).validate_invariants().unwrap_err();
        assert_eq!(
            err,
            MeshMapError::InvalidStructure("offsets must be non-decreasing".into())
        );
        assert!(Offsets(vec![0, 2, 2]).validate_invariants().is_ok());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "[invariants]")]
    fn debug_assert_panics_on_violation() {
        Offsets(Vec::new()).debug_assert_invariants();
    }
}
