//! Ordered, fixed-arity groups of arrays bound positionally to a functor.
//!
//! Two layers, both implemented for Rust tuples by macro:
//! - [`Elements`]/[`OutputElements`] describe a tuple of *element types*,
//!   e.g. `(f64, u32)`: how to gather one element's values from per-slot
//!   slices and how to scatter them back.
//! - [`ArrayTuple`]/[`OutputArrayTuple`] describe a tuple of *array
//!   references*, e.g. `(&Array<f64>, &Array<u32>)`: how to lease every slot
//!   into a memory space and expose the leased slices.
//!
//! Everything is resolved at compile time; the gather/scatter in the element
//! loop is plain field access.

use crate::data::array::{Array, ArrayValue};
use crate::data::residency::{Placement, ReadLease, WriteLease};
use crate::mesh_error::MeshMapError;

/// A tuple of element types gathered per destination element.
pub trait Elements: Copy + Send + Sync + 'static {
    /// One read-only slice per slot.
    type Slices<'s>: Copy + Send + Sync;

    const ARITY: usize;

    /// Values of every slot at `index`.
    fn gather(slices: &Self::Slices<'_>, index: usize) -> Self;
}

/// A tuple of element types written per destination element.
pub trait OutputElements: Elements {
    /// One mutable slice per slot.
    type SlicesMut<'s>: Send;

    /// Write `values` into every slot at `index`.
    fn scatter(slices: &mut Self::SlicesMut<'_>, index: usize, values: Self);

    /// Split every slot into consecutive chunks of `block` elements, zipped
    /// slot-wise. The last chunk may be shorter.
    fn split_blocks<'s>(slices: Self::SlicesMut<'s>, block: usize) -> Vec<Self::SlicesMut<'s>>;
}

impl Elements for () {
    type Slices<'s> = ();

    const ARITY: usize = 0;

    #[inline]
    fn gather(_slices: &(), _index: usize) -> Self {}
}

/// A tuple of array references used as inputs.
pub trait ArrayTuple<'a>: Copy {
    type Elements: Elements;
    type Leases;

    /// `(name, len)` of every slot, in order.
    fn describe(&self) -> Vec<(&'a str, usize)>;

    /// Lease every slot for reading in `placement`.
    fn lease(self, placement: &Placement) -> Result<Self::Leases, MeshMapError>;

    fn slices<'s>(leases: &'s Self::Leases) -> <Self::Elements as Elements>::Slices<'s>;
}

/// A tuple of array references used as outputs (arity at least one).
pub trait OutputArrayTuple<'a>: Copy {
    type Elements: OutputElements;
    type Leases;

    /// `(name, len)` of every slot, in order.
    fn describe(&self) -> Vec<(&'a str, usize)>;

    /// Length of the first slot; the operation's element count.
    fn first_len(&self) -> usize;

    /// Lease every slot for writing in `placement`.
    fn lease(self, placement: &Placement) -> Result<Self::Leases, MeshMapError>;

    fn slices_mut<'s>(
        leases: &'s mut Self::Leases,
    ) -> <Self::Elements as OutputElements>::SlicesMut<'s>;

    /// Keep the writes made through `leases`.
    fn commit(leases: &mut Self::Leases);
}

impl<'a> ArrayTuple<'a> for () {
    type Elements = ();
    type Leases = ();

    fn describe(&self) -> Vec<(&'a str, usize)> {
        Vec::new()
    }

    fn lease(self, _placement: &Placement) -> Result<(), MeshMapError> {
        Ok(())
    }

    fn slices<'s>(_leases: &'s ()) {}
}

macro_rules! impl_tuples {
    ($arity:expr; $($T:ident $s:ident $idx:tt),+) => {
        impl<$($T: ArrayValue),+> Elements for ($($T,)+) {
            type Slices<'s> = ($(&'s [$T],)+);

            const ARITY: usize = $arity;

            #[inline]
            fn gather(slices: &Self::Slices<'_>, index: usize) -> Self {
                ($(slices.$idx[index],)+)
            }
        }

        impl<$($T: ArrayValue),+> OutputElements for ($($T,)+) {
            type SlicesMut<'s> = ($(&'s mut [$T],)+);

            #[inline]
            fn scatter(slices: &mut Self::SlicesMut<'_>, index: usize, values: Self) {
                $(slices.$idx[index] = values.$idx;)+
            }

            fn split_blocks<'s>(
                slices: Self::SlicesMut<'s>,
                block: usize,
            ) -> Vec<Self::SlicesMut<'s>> {
                let ($($s,)+) = slices;
                $(let mut $s = $s.chunks_mut(block.max(1));)+
                let mut out = Vec::new();
                loop {
                    match ($($s.next(),)+) {
                        ($(Some($s),)+) => out.push(($($s,)+)),
                        _ => break,
                    }
                }
                out
            }
        }

        impl<'a, $($T: ArrayValue),+> ArrayTuple<'a> for ($(&'a Array<$T>,)+) {
            type Elements = ($($T,)+);
            type Leases = ($(ReadLease<'a, $T>,)+);

            fn describe(&self) -> Vec<(&'a str, usize)> {
                vec![$((self.$idx.name(), self.$idx.len())),+]
            }

            fn lease(self, placement: &Placement) -> Result<Self::Leases, MeshMapError> {
                Ok(($(self.$idx.lease_read(placement)?,)+))
            }

            fn slices<'s>(leases: &'s Self::Leases) -> ($(&'s [$T],)+) {
                ($(leases.$idx.as_slice(),)+)
            }
        }

        impl<'a, $($T: ArrayValue),+> OutputArrayTuple<'a> for ($(&'a Array<$T>,)+) {
            type Elements = ($($T,)+);
            type Leases = ($(WriteLease<'a, $T>,)+);

            fn describe(&self) -> Vec<(&'a str, usize)> {
                vec![$((self.$idx.name(), self.$idx.len())),+]
            }

            fn first_len(&self) -> usize {
                self.0.len()
            }

            fn lease(self, placement: &Placement) -> Result<Self::Leases, MeshMapError> {
                Ok(($(self.$idx.lease_write(placement)?,)+))
            }

            fn slices_mut<'s>(leases: &'s mut Self::Leases) -> ($(&'s mut [$T],)+) {
                ($(leases.$idx.as_mut_slice(),)+)
            }

            fn commit(leases: &mut Self::Leases) {
                $(leases.$idx.commit();)+
            }
        }
    };
}

impl_tuples!(1; A a 0);
impl_tuples!(2; A a 0, B b 1);
impl_tuples!(3; A a 0, B b 1, C c 2);
impl_tuples!(4; A a 0, B b 1, C c 2, D d 3);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gather_reads_one_element_per_slot() {
        let xs = [1.0f32, 2.0, 3.0];
        let ids = [7u32, 8, 9];
        let slices: <(f32, u32) as Elements>::Slices<'_> = (&xs[..], &ids[..]);
        assert_eq!(<(f32, u32)>::gather(&slices, 1), (2.0, 8));
    }

    #[test]
    fn split_blocks_zips_slots_chunkwise() {
        let mut a = [0u8; 5];
        let mut b = [0i32; 5];
        let blocks = <(u8, i32)>::split_blocks((&mut a[..], &mut b[..]), 2);
        let lens: Vec<_> = blocks.iter().map(|(x, y)| (x.len(), y.len())).collect();
        assert_eq!(lens, vec![(2, 2), (2, 2), (1, 1)]);
        for (i, mut chunk) in blocks.into_iter().enumerate() {
            <(u8, i32)>::scatter(&mut chunk, 0, (i as u8, -(i as i32)));
        }
        assert_eq!(a, [0, 0, 1, 0, 2]);
        assert_eq!(b, [0, 0, -1, 0, -2]);
    }

    #[test]
    fn array_tuples_lease_on_host() {
        let x = Array::from_vec("x", vec![1u16, 2]);
        let y = Array::filled("y", 2, 0u16);
        let inputs = (&x,);
        assert_eq!(ArrayTuple::describe(&inputs), vec![("x", 2)]);
        let leases = ArrayTuple::lease(inputs, &Placement::Host).unwrap();
        let mut out_leases = OutputArrayTuple::lease((&y,), &Placement::Host).unwrap();
        {
            let src = <(&Array<u16>,)>::slices(&leases);
            let (dst,) = <(&Array<u16>,)>::slices_mut(&mut out_leases);
            dst.copy_from_slice(src.0);
        }
        drop(out_leases);
        assert_eq!(y.to_vec().unwrap(), vec![1, 2]);
    }

    #[test]
    fn same_array_in_two_output_slots_is_busy() {
        let y = Array::filled("y", 2, 0u16);
        assert!(matches!(
            OutputArrayTuple::lease((&y, &y), &Placement::Host),
            Err(MeshMapError::ArrayBusy(_))
        ));
    }
}
