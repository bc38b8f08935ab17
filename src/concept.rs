//! Concepts, slot signatures and the type-level slot list.
//!
//! A [`Concept`] is a compile-time list of operation signatures, called
//! *slots*. Each slot is written as [`Mut<fn(A..) -> R>`](Mut) when the
//! operation needs to mutate the wrapped value, or as
//! [`Ref<fn(A..) -> R>`](Ref) when it only reads it. The position of a slot in
//! the list is its index, which is how [`Poly::call`](crate::Poly::call) and
//! [`Poly::call_mut`](crate::Poly::call_mut) address it.
//!
//! ```
//! use polycall::{Concept, Mut, Ref};
//!
//! struct Shape;
//!
//! impl Concept for Shape {
//!     type Slots = (
//!         Ref<fn() -> f64>,  // 0: area
//!         Mut<fn(f64)>,      // 1: scale
//!     );
//! }
//! ```
//!
//! Most concepts are declared through the [`concept!`](crate::concept) macro,
//! which derives the slot list from method declarations and generates named
//! methods on [`Poly`](crate::Poly).
//!
//! Slot lists of up to 12 slots with up to 6 arguments each are supported.
//! Argument and return types must be `'static`.

use core::marker::PhantomData;

use polycall_internals::RawAny;

use crate::erased::{ErasedMut, ErasedRef};

/// A set of operations that a type-erased value supports.
///
/// See the [module documentation](self) for how slot lists are written.
pub trait Concept: 'static {
    /// The ordered slot signatures of this concept.
    type Slots: SlotList;
}

/// A slot whose operation needs mutable access to the wrapped value.
///
/// `F` is the signature of the operation without its receiver, for example
/// `Mut<fn(i32) -> bool>`.
pub struct Mut<F>(PhantomData<F>);

/// A slot whose operation only needs shared access to the wrapped value.
///
/// `F` is the signature of the operation without its receiver, for example
/// `Ref<fn() -> i32>`.
pub struct Ref<F>(PhantomData<F>);

/// Marker for slots that receive an [`ErasedRef`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Shared;

/// Marker for slots that receive an [`ErasedMut`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Exclusive;

mod sealed_receiver {
    use super::*;

    pub trait Sealed: 'static {}

    impl Sealed for Shared {}
    impl Sealed for Exclusive {}
}

/// The kind of access a slot needs to the wrapped value.
///
/// This trait is sealed and implemented for [`Shared`] and [`Exclusive`].
pub trait Receiver: sealed_receiver::Sealed {
    /// The view of the storage handed to entries of this kind.
    type Handle<'a>;

    /// Whether entries of this kind mutate the wrapped value.
    const MUTATES: bool;

    #[doc(hidden)]
    fn handle(storage: &mut RawAny) -> Self::Handle<'_>;
}

impl Receiver for Shared {
    type Handle<'a> = ErasedRef<'a>;

    const MUTATES: bool = false;

    #[inline]
    fn handle(storage: &mut RawAny) -> ErasedRef<'_> {
        ErasedRef::new(storage)
    }
}

impl Receiver for Exclusive {
    type Handle<'a> = ErasedMut<'a>;

    const MUTATES: bool = true;

    #[inline]
    fn handle(storage: &mut RawAny) -> ErasedMut<'_> {
        ErasedMut::new(storage)
    }
}

/// The signature of a single slot.
///
/// Implemented for [`Mut<fn(A..) -> R>`](Mut) and [`Ref<fn(A..) -> R>`](Ref)
/// with up to 6 arguments.
pub trait Signature: 'static {
    /// The arguments of the operation, as a tuple.
    type Args;
    /// The return type of the operation.
    type Output;
    /// The function pointer type stored in vtables for this slot.
    ///
    /// This is `unsafe fn(ErasedMut<'_>, A..) -> R` for [`Mut`] slots and
    /// `unsafe fn(ErasedRef<'_>, A..) -> R` for [`Ref`] slots.
    type Entry: Copy + Send + Sync + 'static;
    /// The kind of access the operation needs.
    type Receiver: Receiver;

    /// Calls `entry` with the storage view and the unpacked arguments.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `entry` was synthesized for the type of the value behind `this`.
    /// 2. If `Self::Receiver` is [`Exclusive`], the storage behind `this` is
    ///    not a read-only alias.
    unsafe fn dispatch(
        entry: Self::Entry,
        this: <Self::Receiver as Receiver>::Handle<'_>,
        args: Self::Args,
    ) -> Self::Output;
}

macro_rules! impl_signature {
    ($($arg:ident: $A:ident),*) => {
        impl<R: 'static, $($A: 'static),*> Signature for Mut<fn($($A),*) -> R> {
            type Args = ($($A,)*);
            type Output = R;
            type Entry = unsafe fn(ErasedMut<'_>, $($A),*) -> R;
            type Receiver = Exclusive;

            #[inline]
            unsafe fn dispatch(entry: Self::Entry, this: ErasedMut<'_>, args: Self::Args) -> R {
                let ($($arg,)*) = args;
                // SAFETY: The entry's requirements are the ones of this function
                // (guaranteed by the caller)
                unsafe { entry(this, $($arg),*) }
            }
        }

        impl<R: 'static, $($A: 'static),*> Signature for Ref<fn($($A),*) -> R> {
            type Args = ($($A,)*);
            type Output = R;
            type Entry = unsafe fn(ErasedRef<'_>, $($A),*) -> R;
            type Receiver = Shared;

            #[inline]
            unsafe fn dispatch(entry: Self::Entry, this: ErasedRef<'_>, args: Self::Args) -> R {
                let ($($arg,)*) = args;
                // SAFETY: The entry's requirements are the ones of this function
                // (guaranteed by the caller)
                unsafe { entry(this, $($arg),*) }
            }
        }
    };
}

impl_signature!();
impl_signature!(a0: A0);
impl_signature!(a0: A0, a1: A1);
impl_signature!(a0: A0, a1: A1, a2: A2);
impl_signature!(a0: A0, a1: A1, a2: A2, a3: A3);
impl_signature!(a0: A0, a1: A1, a2: A2, a3: A3, a4: A4);
impl_signature!(a0: A0, a1: A1, a2: A2, a3: A3, a4: A4, a5: A5);

/// An ordered list of slot signatures, written as a tuple.
///
/// Implemented for tuples of up to 12 [`Signature`]s.
pub trait SlotList: 'static {
    /// The number of slots.
    const LEN: usize;
    /// The vtable entries for these slots, as a tuple of
    /// [`Signature::Entry`] function pointers.
    type Entries: Copy + Send + Sync + 'static;
}

/// Access to the slot at index `I` of a [`SlotList`].
pub trait SlotAt<const I: usize>: SlotList {
    /// The signature of the slot.
    type Slot: Signature;

    /// Returns the entry of the slot from a table of entries.
    fn entry(entries: &Self::Entries) -> <Self::Slot as Signature>::Entry;
}

/// The signature of slot `I` of concept `C`.
pub type SlotOf<C, const I: usize> = <<C as Concept>::Slots as SlotAt<I>>::Slot;

macro_rules! impl_slot_list {
    (@at $all:tt $($i:tt => $Si:ident),*) => {
        $(impl_slot_list!(@one $all $i $Si);)*
    };
    (@one [$($S:ident),*] $i:tt $Si:ident) => {
        impl<$($S: Signature),*> SlotAt<$i> for ($($S,)*) {
            type Slot = $Si;

            #[inline]
            fn entry(entries: &Self::Entries) -> <$Si as Signature>::Entry {
                entries.$i
            }
        }
    };
    ($len:literal; $($S:ident),*; $($i:tt => $Si:ident),*) => {
        impl<$($S: Signature),*> SlotList for ($($S,)*) {
            const LEN: usize = $len;
            type Entries = ($(<$S as Signature>::Entry,)*);
        }

        impl_slot_list!(@at [$($S),*] $($i => $Si),*);
    };
}

impl_slot_list!(0; ; );
impl_slot_list!(1; S0; 0 => S0);
impl_slot_list!(2; S0, S1; 0 => S0, 1 => S1);
impl_slot_list!(3; S0, S1, S2; 0 => S0, 1 => S1, 2 => S2);
impl_slot_list!(4; S0, S1, S2, S3; 0 => S0, 1 => S1, 2 => S2, 3 => S3);
impl_slot_list!(5; S0, S1, S2, S3, S4; 0 => S0, 1 => S1, 2 => S2, 3 => S3, 4 => S4);
impl_slot_list!(
    6; S0, S1, S2, S3, S4, S5;
    0 => S0, 1 => S1, 2 => S2, 3 => S3, 4 => S4, 5 => S5
);
impl_slot_list!(
    7; S0, S1, S2, S3, S4, S5, S6;
    0 => S0, 1 => S1, 2 => S2, 3 => S3, 4 => S4, 5 => S5, 6 => S6
);
impl_slot_list!(
    8; S0, S1, S2, S3, S4, S5, S6, S7;
    0 => S0, 1 => S1, 2 => S2, 3 => S3, 4 => S4, 5 => S5, 6 => S6, 7 => S7
);
impl_slot_list!(
    9; S0, S1, S2, S3, S4, S5, S6, S7, S8;
    0 => S0, 1 => S1, 2 => S2, 3 => S3, 4 => S4, 5 => S5, 6 => S6, 7 => S7, 8 => S8
);
impl_slot_list!(
    10; S0, S1, S2, S3, S4, S5, S6, S7, S8, S9;
    0 => S0, 1 => S1, 2 => S2, 3 => S3, 4 => S4, 5 => S5, 6 => S6, 7 => S7, 8 => S8,
    9 => S9
);
impl_slot_list!(
    11; S0, S1, S2, S3, S4, S5, S6, S7, S8, S9, S10;
    0 => S0, 1 => S1, 2 => S2, 3 => S3, 4 => S4, 5 => S5, 6 => S6, 7 => S7, 8 => S8,
    9 => S9, 10 => S10
);
impl_slot_list!(
    12; S0, S1, S2, S3, S4, S5, S6, S7, S8, S9, S10, S11;
    0 => S0, 1 => S1, 2 => S2, 3 => S3, 4 => S4, 5 => S5, 6 => S6, 7 => S7, 8 => S8,
    9 => S9, 10 => S10, 11 => S11
);
