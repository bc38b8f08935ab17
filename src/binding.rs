//! Bindings from concept slots to the operations of a concrete type.
//!
//! A binding is any stateless callable: a function item, a method path such
//! as `Counter::incr`, or a closure that captures nothing. For a slot
//! `Mut<fn(A..) -> R>` or `Ref<fn(A..) -> R>`, a binding has one of three
//! shapes:
//!
//! | shape                       | marker        | allowed for        |
//! |-----------------------------|---------------|--------------------|
//! | `Fn(&mut T, B..) -> RB`     | [`ViaMut`]    | [`Mut`] slots      |
//! | `Fn(&T, B..) -> RB`         | [`ViaRef`]    | [`Mut`], [`Ref`]   |
//! | `Fn(B..) -> RB`             | [`Detached`]  | [`Mut`], [`Ref`]   |
//!
//! Every slot argument is converted to the binding's argument with
//! [`Into`], and the binding's result is converted to the slot's result with
//! [`Into`]. The shape is selected by trait resolution, so closure
//! parameters must carry type annotations:
//!
//! ```
//! # use polycall::{Concept, Fulfill, Mut, Ref, Vtable, build_vtable};
//! # struct Counter;
//! # impl Concept for Counter { type Slots = (Mut<fn(i32)>, Ref<fn(i32) -> i64>); }
//! # #[derive(Clone)]
//! # struct Impl(i32);
//! impl Fulfill<Counter> for Impl {
//!     fn vtable() -> &'static Vtable<Counter> {
//!         build_vtable::<Counter, Self, _, _>((
//!             |this: &mut Self, v: i32| this.0 = v,
//!             |this: &Self, factor: i32| this.0 * factor,
//!         ))
//!     }
//! }
//! ```
//!
//! A binding that is not zero-sized (a capturing closure, or a function
//! pointer value) is rejected when the vtable is instantiated.

use core::{marker::PhantomData, ptr::NonNull};

use crate::{
    concept::{Mut, Ref, Signature, SlotList},
    erased::{ErasedMut, ErasedRef},
};

/// Marker for bindings that take the concrete value by `&mut T`.
pub struct ViaMut<F>(PhantomData<F>);

/// Marker for bindings that take the concrete value by `&T`.
pub struct ViaRef<F>(PhantomData<F>);

/// Marker for bindings that do not take the concrete value at all.
pub struct Detached<F>(PhantomData<F>);

mod sealed_bind {
    use super::*;

    pub trait Sealed<T, S: Signature, M>: Copy + 'static {
        fn entry(self) -> S::Entry;
    }
}

mod sealed_bindings {
    use super::*;

    pub trait Sealed<T, L: SlotList, M> {
        fn entries(self) -> L::Entries;
    }
}

/// A stateless callable that can implement slot `S` for the concrete type
/// `T`.
///
/// The marker `M` records which binding shape was selected; it is always
/// inferred.
///
/// This trait is sealed. A vtable entry downcasts the stored value without
/// checking it, so the only implementations are the callable shapes marked
/// by [`ViaMut`], [`ViaRef`] and [`Detached`]:
///
/// ```compile_fail
/// # use polycall::{Bind, Ref, ViaRef};
/// #[derive(Clone, Copy)]
/// struct Forged;
///
/// impl Bind<String, Ref<fn() -> usize>, ViaRef<fn() -> usize>> for Forged {}
/// ```
pub trait Bind<T, S: Signature, M>: sealed_bind::Sealed<T, S, M> {}

impl<T, S: Signature, M, F: sealed_bind::Sealed<T, S, M>> Bind<T, S, M> for F {}

/// A tuple of bindings, one per slot of the slot list `L`.
///
/// Implemented for tuples of up to twelve [`Bind`] values, and sealed like
/// [`Bind`]:
///
/// ```compile_fail
/// # use polycall::{Bindings, Mut};
/// struct Forged;
///
/// impl Bindings<u8, (Mut<fn()>,), ()> for Forged {}
/// ```
pub trait Bindings<T, L: SlotList, M>: sealed_bindings::Sealed<T, L, M> {}

impl<T, L: SlotList, M, B: sealed_bindings::Sealed<T, L, M>> Bindings<T, L, M> for B {}

/// Produces a value of the zero-sized binding type `F` out of nothing.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `F` is zero-sized.
/// 2. A value of type `F` has existed, so the type is inhabited.
#[inline]
unsafe fn conjure<F: Copy>() -> F {
    debug_assert_eq!(size_of::<F>(), 0);
    // SAFETY: A dangling pointer is valid for zero-sized reads, and the type is
    // inhabited by a value without any state (guaranteed by the caller).
    unsafe { NonNull::<F>::dangling().read() }
}

/// Rejects bindings that carry state.
#[inline]
const fn assert_stateless<F>() {
    assert!(
        size_of::<F>() == 0,
        "slot bindings must be stateless: use a function item, a method path or a non-capturing closure"
    );
}

macro_rules! impl_bind {
    ($arity:ident; $($a:ident: $A:ident => $B:ident),*) => {
        mod $arity {
            use super::*;

            /// Entry of a [`Mut`] slot bound to a `&mut T` callable.
            ///
            /// # Safety
            ///
            /// The caller must ensure:
            ///
            /// 1. The storage holds a `T`, and is not a read-only alias.
            /// 2. `F` is zero-sized and a value of it has existed.
            unsafe fn mut_via_mut<T, F, R, RB, $($A, $B),*>(this: ErasedMut<'_>, $($a: $A),*) -> R
            where
                T: 'static,
                F: Fn(&mut T, $($B),*) -> RB + Copy,
                RB: Into<R>,
                $($A: Into<$B>,)*
            {
                // SAFETY:
                // 1. Guaranteed by the caller
                let this = unsafe { this.downcast_unchecked::<T>() };
                // SAFETY:
                // 1. Guaranteed by the caller
                // 2. Guaranteed by the caller
                let f = unsafe { conjure::<F>() };
                f(this, $($a.into()),*).into()
            }

            /// Entry of a [`Mut`] slot bound to a `&T` callable.
            ///
            /// # Safety
            ///
            /// The caller must ensure:
            ///
            /// 1. The storage holds a `T`.
            /// 2. `F` is zero-sized and a value of it has existed.
            unsafe fn mut_via_ref<T, F, R, RB, $($A, $B),*>(this: ErasedMut<'_>, $($a: $A),*) -> R
            where
                T: 'static,
                F: Fn(&T, $($B),*) -> RB + Copy,
                RB: Into<R>,
                $($A: Into<$B>,)*
            {
                // SAFETY:
                // 1. Guaranteed by the caller
                let this = unsafe { this.into_ref().downcast_unchecked::<T>() };
                // SAFETY:
                // 1. Guaranteed by the caller
                // 2. Guaranteed by the caller
                let f = unsafe { conjure::<F>() };
                f(this, $($a.into()),*).into()
            }

            /// Entry of a [`Mut`] slot bound to a detached callable.
            ///
            /// # Safety
            ///
            /// The caller must ensure:
            ///
            /// 1. `F` is zero-sized and a value of it has existed.
            unsafe fn mut_detached<F, R, RB, $($A, $B),*>(_this: ErasedMut<'_>, $($a: $A),*) -> R
            where
                F: Fn($($B),*) -> RB + Copy,
                RB: Into<R>,
                $($A: Into<$B>,)*
            {
                // SAFETY:
                // 1. Guaranteed by the caller
                // 2. Guaranteed by the caller
                let f = unsafe { conjure::<F>() };
                f($($a.into()),*).into()
            }

            /// Entry of a [`Ref`] slot bound to a `&T` callable.
            ///
            /// # Safety
            ///
            /// The caller must ensure:
            ///
            /// 1. The storage holds a `T`.
            /// 2. `F` is zero-sized and a value of it has existed.
            unsafe fn ref_via_ref<T, F, R, RB, $($A, $B),*>(this: ErasedRef<'_>, $($a: $A),*) -> R
            where
                T: 'static,
                F: Fn(&T, $($B),*) -> RB + Copy,
                RB: Into<R>,
                $($A: Into<$B>,)*
            {
                // SAFETY:
                // 1. Guaranteed by the caller
                let this = unsafe { this.downcast_unchecked::<T>() };
                // SAFETY:
                // 1. Guaranteed by the caller
                // 2. Guaranteed by the caller
                let f = unsafe { conjure::<F>() };
                f(this, $($a.into()),*).into()
            }

            /// Entry of a [`Ref`] slot bound to a detached callable.
            ///
            /// # Safety
            ///
            /// The caller must ensure:
            ///
            /// 1. `F` is zero-sized and a value of it has existed.
            unsafe fn ref_detached<F, R, RB, $($A, $B),*>(_this: ErasedRef<'_>, $($a: $A),*) -> R
            where
                F: Fn($($B),*) -> RB + Copy,
                RB: Into<R>,
                $($A: Into<$B>,)*
            {
                // SAFETY:
                // 1. Guaranteed by the caller
                // 2. Guaranteed by the caller
                let f = unsafe { conjure::<F>() };
                f($($a.into()),*).into()
            }

            impl<T, F, R, RB, $($A, $B),*> sealed_bind::Sealed<T, Mut<fn($($A),*) -> R>, ViaMut<fn($($B),*) -> RB>> for F
            where
                T: 'static,
                F: Fn(&mut T, $($B),*) -> RB + Copy + 'static,
                R: 'static,
                RB: Into<R>,
                $($A: Into<$B> + 'static,)*
            {
                #[inline]
                fn entry(self) -> unsafe fn(ErasedMut<'_>, $($A),*) -> R {
                    const { assert_stateless::<F>() };
                    mut_via_mut::<T, F, R, RB, $($A, $B),*>
                }
            }

            impl<T, F, R, RB, $($A, $B),*> sealed_bind::Sealed<T, Mut<fn($($A),*) -> R>, ViaRef<fn($($B),*) -> RB>> for F
            where
                T: 'static,
                F: Fn(&T, $($B),*) -> RB + Copy + 'static,
                R: 'static,
                RB: Into<R>,
                $($A: Into<$B> + 'static,)*
            {
                #[inline]
                fn entry(self) -> unsafe fn(ErasedMut<'_>, $($A),*) -> R {
                    const { assert_stateless::<F>() };
                    mut_via_ref::<T, F, R, RB, $($A, $B),*>
                }
            }

            impl<T, F, R, RB, $($A, $B),*> sealed_bind::Sealed<T, Mut<fn($($A),*) -> R>, Detached<fn($($B),*) -> RB>> for F
            where
                F: Fn($($B),*) -> RB + Copy + 'static,
                R: 'static,
                RB: Into<R>,
                $($A: Into<$B> + 'static,)*
            {
                #[inline]
                fn entry(self) -> unsafe fn(ErasedMut<'_>, $($A),*) -> R {
                    const { assert_stateless::<F>() };
                    mut_detached::<F, R, RB, $($A, $B),*>
                }
            }

            impl<T, F, R, RB, $($A, $B),*> sealed_bind::Sealed<T, Ref<fn($($A),*) -> R>, ViaRef<fn($($B),*) -> RB>> for F
            where
                T: 'static,
                F: Fn(&T, $($B),*) -> RB + Copy + 'static,
                R: 'static,
                RB: Into<R>,
                $($A: Into<$B> + 'static,)*
            {
                #[inline]
                fn entry(self) -> unsafe fn(ErasedRef<'_>, $($A),*) -> R {
                    const { assert_stateless::<F>() };
                    ref_via_ref::<T, F, R, RB, $($A, $B),*>
                }
            }

            impl<T, F, R, RB, $($A, $B),*> sealed_bind::Sealed<T, Ref<fn($($A),*) -> R>, Detached<fn($($B),*) -> RB>> for F
            where
                F: Fn($($B),*) -> RB + Copy + 'static,
                R: 'static,
                RB: Into<R>,
                $($A: Into<$B> + 'static,)*
            {
                #[inline]
                fn entry(self) -> unsafe fn(ErasedRef<'_>, $($A),*) -> R {
                    const { assert_stateless::<F>() };
                    ref_detached::<F, R, RB, $($A, $B),*>
                }
            }
        }
    };
}

impl_bind!(arity0;);
impl_bind!(arity1; a0: A0 => B0);
impl_bind!(arity2; a0: A0 => B0, a1: A1 => B1);
impl_bind!(arity3; a0: A0 => B0, a1: A1 => B1, a2: A2 => B2);
impl_bind!(arity4; a0: A0 => B0, a1: A1 => B1, a2: A2 => B2, a3: A3 => B3);
impl_bind!(
    arity5;
    a0: A0 => B0, a1: A1 => B1, a2: A2 => B2, a3: A3 => B3, a4: A4 => B4
);
impl_bind!(
    arity6;
    a0: A0 => B0, a1: A1 => B1, a2: A2 => B2, a3: A3 => B3, a4: A4 => B4, a5: A5 => B5
);

macro_rules! impl_bindings {
    ($($b:ident: $Bn:ident => $S:ident, $M:ident),*) => {
        impl<T, $($Bn, $S, $M),*> sealed_bindings::Sealed<T, ($($S,)*), ($($M,)*)> for ($($Bn,)*)
        where
            $($S: Signature, $Bn: Bind<T, $S, $M>,)*
        {
            #[inline]
            #[allow(clippy::unused_unit)]
            fn entries(self) -> <($($S,)*) as SlotList>::Entries {
                let ($($b,)*) = self;
                ($($b.entry(),)*)
            }
        }
    };
}

impl_bindings!();
impl_bindings!(b0: B0 => S0, M0);
impl_bindings!(b0: B0 => S0, M0, b1: B1 => S1, M1);
impl_bindings!(b0: B0 => S0, M0, b1: B1 => S1, M1, b2: B2 => S2, M2);
impl_bindings!(
    b0: B0 => S0, M0, b1: B1 => S1, M1, b2: B2 => S2, M2, b3: B3 => S3, M3
);
impl_bindings!(
    b0: B0 => S0, M0, b1: B1 => S1, M1, b2: B2 => S2, M2, b3: B3 => S3, M3,
    b4: B4 => S4, M4
);
impl_bindings!(
    b0: B0 => S0, M0, b1: B1 => S1, M1, b2: B2 => S2, M2, b3: B3 => S3, M3,
    b4: B4 => S4, M4, b5: B5 => S5, M5
);
impl_bindings!(
    b0: B0 => S0, M0, b1: B1 => S1, M1, b2: B2 => S2, M2, b3: B3 => S3, M3,
    b4: B4 => S4, M4, b5: B5 => S5, M5, b6: B6 => S6, M6
);
impl_bindings!(
    b0: B0 => S0, M0, b1: B1 => S1, M1, b2: B2 => S2, M2, b3: B3 => S3, M3,
    b4: B4 => S4, M4, b5: B5 => S5, M5, b6: B6 => S6, M6, b7: B7 => S7, M7
);
impl_bindings!(
    b0: B0 => S0, M0, b1: B1 => S1, M1, b2: B2 => S2, M2, b3: B3 => S3, M3,
    b4: B4 => S4, M4, b5: B5 => S5, M5, b6: B6 => S6, M6, b7: B7 => S7, M7,
    b8: B8 => S8, M8
);
impl_bindings!(
    b0: B0 => S0, M0, b1: B1 => S1, M1, b2: B2 => S2, M2, b3: B3 => S3, M3,
    b4: B4 => S4, M4, b5: B5 => S5, M5, b6: B6 => S6, M6, b7: B7 => S7, M7,
    b8: B8 => S8, M8, b9: B9 => S9, M9
);
impl_bindings!(
    b0: B0 => S0, M0, b1: B1 => S1, M1, b2: B2 => S2, M2, b3: B3 => S3, M3,
    b4: B4 => S4, M4, b5: B5 => S5, M5, b6: B6 => S6, M6, b7: B7 => S7, M7,
    b8: B8 => S8, M8, b9: B9 => S9, M9, b10: B10 => S10, M10
);
impl_bindings!(
    b0: B0 => S0, M0, b1: B1 => S1, M1, b2: B2 => S2, M2, b3: B3 => S3, M3,
    b4: B4 => S4, M4, b5: B5 => S5, M5, b6: B6 => S6, M6, b7: B7 => S7, M7,
    b8: B8 => S8, M8, b9: B9 => S9, M9, b10: B10 => S10, M10, b11: B11 => S11, M11
);
