//! Per-type tables of slot entries.
//!
//! A [`Vtable<C>`] holds one entry per slot of concept `C`, synthesized for a
//! single concrete type. Tables are built by [`build_vtable`] the first time a
//! concrete type is wrapped under a concept, and live for the rest of the
//! process. Every wrapper holding the same type under the same concept refers
//! to the same table.

use core::marker::PhantomData;

use polycall_internals::TypeInfo;

use crate::{
    binding::Bindings,
    concept::{Concept, Signature, SlotAt, SlotList},
    registry,
};

/// The table of entries for one concrete type under concept `C`.
///
/// The layout of the table depends only on `C`.
pub struct Vtable<C: Concept> {
    /// The type the entries were synthesized for.
    concrete: TypeInfo,
    /// One entry per slot, in slot order.
    entries: <C::Slots as SlotList>::Entries,
    /// The concept of the table.
    _concept: PhantomData<fn() -> C>,
}

impl<C: Concept> Vtable<C> {
    /// Returns the [`TypeInfo`] of the concrete type this table was built for.
    #[inline]
    #[must_use]
    pub fn concrete(&self) -> TypeInfo {
        self.concrete
    }

    /// Returns the number of slots in the table.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        <C::Slots as SlotList>::LEN
    }

    /// Returns `true` if the concept has no slots.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the entry of slot `I`.
    #[inline]
    #[must_use]
    pub fn entry<const I: usize>(
        &self,
    ) -> <<C::Slots as SlotAt<I>>::Slot as Signature>::Entry
    where
        C::Slots: SlotAt<I>,
    {
        <C::Slots as SlotAt<I>>::entry(&self.entries)
    }
}

impl<C: Concept> core::fmt::Debug for Vtable<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Vtable")
            .field("concept", &core::any::type_name::<C>())
            .field("concrete", &self.concrete)
            .field("slots", &self.len())
            .finish()
    }
}

/// Declares how a concrete type fulfils concept `C`.
///
/// Implementations list one binding per slot and hand them to
/// [`build_vtable`]:
///
/// ```
/// use polycall::{Concept, Fulfill, Mut, Poly, Ref, Vtable, build_vtable};
///
/// struct Counter;
///
/// impl Concept for Counter {
///     type Slots = (Mut<fn()>, Ref<fn() -> i32>);
/// }
///
/// #[derive(Clone, Default)]
/// struct Ticks(i32);
///
/// impl Ticks {
///     fn tick(&mut self) {
///         self.0 += 1;
///     }
/// }
///
/// impl Fulfill<Counter> for Ticks {
///     fn vtable() -> &'static Vtable<Counter> {
///         build_vtable::<Counter, Self, _, _>((Self::tick, |this: &Self| this.0))
///     }
/// }
///
/// let mut poly = Poly::<Counter>::new(Ticks::default());
/// poly.call_mut::<0>(());
/// assert_eq!(poly.call::<1>(()), 1);
/// ```
pub trait Fulfill<C: Concept>: 'static {
    /// Returns the table of `Self` under `C`.
    ///
    /// The table must have been built for `Self`; wrapping a value whose
    /// table reports another concrete type panics.
    fn vtable() -> &'static Vtable<C>;
}

/// Returns the table of `T` under concept `C`, synthesizing it from
/// `bindings` on first use.
///
/// Later calls for the same `(C, T)` pair return the same table and ignore
/// their `bindings`. This function is safe to call concurrently.
pub fn build_vtable<C, T, B, M>(bindings: B) -> &'static Vtable<C>
where
    C: Concept,
    T: 'static,
    B: Bindings<T, C::Slots, M>,
{
    registry::get_or_insert::<C, T>(move || Vtable {
        concrete: TypeInfo::of::<T>(),
        entries: bindings.entries(),
        _concept: PhantomData,
    })
}
