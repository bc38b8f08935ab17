//! The type-erased wrapper.

use core::{any::type_name, marker::PhantomData, ptr, ptr::NonNull};

use polycall_internals::{Ownership, RawAny, TypeInfo};

use crate::{
    concept::{Concept, Receiver, Shared, Signature, SlotAt, SlotOf},
    erased::ErasedRef,
    error::DispatchError,
    vtable::{Fulfill, Vtable},
};

/// A value of any type that fulfils concept `C`, or nothing.
///
/// A [`Poly`] either owns its value (stored inline when it is at most 16
/// bytes large and aligned, boxed otherwise) or aliases a value owned by
/// somebody else for the lifetime `'a`. Operations of the concept are called
/// through [`call`](Self::call) and [`call_mut`](Self::call_mut), or through
/// the named methods generated by [`concept!`](crate::concept).
///
/// # Examples
///
/// ```
/// use polycall::{Fulfill, Poly, Vtable, build_vtable, concept};
///
/// concept! {
///     /// Something that can be greeted.
///     pub Greet: GreetOps {
///         fn name(&self) -> &'static str;
///         fn rename(&mut self, name: &'static str);
///     }
/// }
///
/// #[derive(Clone)]
/// struct Person(&'static str);
///
/// impl Fulfill<Greet> for Person {
///     fn vtable() -> &'static Vtable<Greet> {
///         build_vtable::<Greet, Self, _, _>((
///             |this: &Self| this.0,
///             |this: &mut Self, name: &'static str| this.0 = name,
///         ))
///     }
/// }
///
/// let mut owned = Poly::<Greet>::new(Person("Ada"));
/// owned.rename("Grace");
/// assert_eq!(owned.name(), "Grace");
///
/// let mut person = Person("Alan");
/// {
///     let mut alias = Poly::<Greet>::from_mut(&mut person);
///     alias.rename("Barbara");
/// }
/// assert_eq!(person.0, "Barbara");
/// ```
///
/// # Invariants
///
/// The vtable is present if and only if the storage holds a value, and it
/// was synthesized for the type of that value.
pub struct Poly<'a, C: Concept> {
    storage: RawAny,
    vtable: Option<&'static Vtable<C>>,
    _borrow: PhantomData<&'a mut ()>,
}

/// Returns the table of `T` under `C`, checking that it was built for `T`.
#[track_caller]
fn vtable_of<C: Concept, T: Fulfill<C>>() -> &'static Vtable<C> {
    let vtable = T::vtable();
    assert!(
        vtable.concrete() == TypeInfo::of::<T>(),
        "`Fulfill<{}>` for `{}` returned the vtable of `{}`",
        type_name::<C>(),
        type_name::<T>(),
        vtable.concrete(),
    );
    vtable
}

#[cold]
#[inline(never)]
#[track_caller]
fn dispatch_failed<C: Concept>(slot: usize, error: DispatchError) -> ! {
    panic!("cannot call slot {slot} of `{}`: {error}", type_name::<C>())
}

impl<'a, C: Concept> Poly<'a, C> {
    /// Creates an empty wrapper.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            storage: RawAny::new(),
            vtable: None,
            _borrow: PhantomData,
        }
    }

    /// Creates a wrapper owning `value`.
    #[track_caller]
    pub fn new<T: Fulfill<C> + Clone>(value: T) -> Self {
        let vtable = vtable_of::<C, T>();
        Self {
            storage: RawAny::owned(value),
            vtable: Some(vtable),
            _borrow: PhantomData,
        }
    }

    /// Creates a wrapper owning the value returned by `init`.
    #[track_caller]
    pub fn new_with<T: Fulfill<C> + Clone>(init: impl FnOnce() -> T) -> Self {
        Self::new(init())
    }

    /// Creates a read-only alias of `value`.
    ///
    /// Only [`Ref`](crate::Ref) slots can be called through the alias.
    #[track_caller]
    pub fn from_ref<T: Fulfill<C>>(value: &'a T) -> Self {
        let vtable = vtable_of::<C, T>();
        // SAFETY:
        // 1. `value` is borrowed for `'a`, and the wrapper as well as every clone
        //    and alias of it is bounded by `'a`
        // 2. The shared borrow prevents mutation of `value` for `'a`
        let storage = unsafe { RawAny::borrowed(NonNull::from(value)) };
        Self {
            storage,
            vtable: Some(vtable),
            _borrow: PhantomData,
        }
    }

    /// Creates a mutable alias of `value`.
    ///
    /// Mutations through the wrapper are visible through `value` once the
    /// wrapper is gone.
    #[track_caller]
    pub fn from_mut<T: Fulfill<C>>(value: &'a mut T) -> Self {
        let vtable = vtable_of::<C, T>();
        // SAFETY:
        // 1. `value` is borrowed for `'a`, and the wrapper as well as every clone
        //    and alias of it is bounded by `'a`
        // 2. The exclusive borrow prevents any other access to `value` for `'a`
        let storage = unsafe { RawAny::borrowed_mut(NonNull::from(value)) };
        Self {
            storage,
            vtable: Some(vtable),
            _borrow: PhantomData,
        }
    }

    /// Replaces the contents with an owned `value`.
    ///
    /// An aliased value is never dropped; the wrapper simply stops referring
    /// to it.
    #[track_caller]
    pub fn emplace<T: Fulfill<C> + Clone>(&mut self, value: T) {
        let vtable = vtable_of::<C, T>();
        self.storage.emplace(value);
        self.vtable = Some(vtable);
    }

    /// Replaces the contents with the value returned by `init`.
    #[track_caller]
    pub fn emplace_with<T: Fulfill<C> + Clone>(&mut self, init: impl FnOnce() -> T) {
        self.emplace(init());
    }

    /// Creates a read-only alias of the current value.
    ///
    /// Aliasing an empty wrapper gives an empty wrapper.
    #[must_use]
    pub fn alias(&self) -> Poly<'_, C> {
        // SAFETY:
        // 1. The alias borrows `self` for its whole lifetime, so `self` can be
        //    neither moved, dropped, emplaced into, reset nor mutated meanwhile
        let storage = unsafe { self.storage.alias() };
        Poly {
            storage,
            vtable: self.vtable,
            _borrow: PhantomData,
        }
    }

    /// Creates a mutable alias of the current value.
    ///
    /// Aliasing a read-only alias gives another read-only alias.
    #[must_use]
    pub fn alias_mut(&mut self) -> Poly<'_, C> {
        // SAFETY:
        // 1. The alias mutably borrows `self` for its whole lifetime, so `self`
        //    can be neither moved, dropped, emplaced into nor reset meanwhile
        // 2. For the same reason, the value is not accessed through `self`
        //    while the alias is in use
        let storage = unsafe { self.storage.alias_mut() };
        Poly {
            storage,
            vtable: self.vtable,
            _borrow: PhantomData,
        }
    }

    /// Copies the wrapper, or returns `None` if it is a mutable alias.
    ///
    /// An owned value is cloned into an independent wrapper, and a read-only
    /// alias is copied as another read-only alias of the same object. A
    /// mutable alias is the only writer of its referent and cannot be copied;
    /// use [`alias_mut`](Self::alias_mut) for a second, borrow-bound view.
    ///
    /// ```
    /// # use polycall::{Fulfill, Poly, Vtable, build_vtable, concept};
    /// # concept! { pub Count: CountOps { fn get(&self) -> u8; } }
    /// # #[derive(Clone)]
    /// # struct Seven;
    /// # impl Fulfill<Count> for Seven {
    /// #     fn vtable() -> &'static Vtable<Count> {
    /// #         build_vtable::<Count, Self, _, _>((|| 7u8,))
    /// #     }
    /// # }
    /// let owned = Poly::<Count>::new(Seven);
    /// assert_eq!(owned.try_clone().map(|copy| copy.get()), Some(7));
    ///
    /// let mut seven = Seven;
    /// let alias = Poly::<Count>::from_mut(&mut seven);
    /// assert!(alias.try_clone().is_none());
    /// ```
    #[must_use]
    pub fn try_clone(&self) -> Option<Self> {
        Some(Self {
            storage: self.storage.try_clone()?,
            vtable: self.vtable,
            _borrow: PhantomData,
        })
    }

    /// Returns `true` if the wrapper holds or aliases a value.
    #[inline]
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.storage.has_value()
    }

    /// Returns the [`TypeInfo`] of the wrapped value, or `None` if the
    /// wrapper is empty.
    #[inline]
    #[must_use]
    pub fn type_info(&self) -> Option<TypeInfo> {
        self.storage.type_info()
    }

    /// Returns `true` if the wrapped value is a `T`.
    #[inline]
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.storage.is::<T>()
    }

    /// Returns how the value is held, or `None` if the wrapper is empty.
    #[inline]
    #[must_use]
    pub fn ownership(&self) -> Option<Ownership> {
        self.storage.ownership()
    }

    /// Returns the vtable of the wrapped value, or `None` if the wrapper is
    /// empty.
    #[inline]
    #[must_use]
    pub fn vtable(&self) -> Option<&'static Vtable<C>> {
        self.vtable
    }

    /// Returns the address of the wrapped value, or null if the wrapper is
    /// empty.
    ///
    /// For aliases this is the address of the aliased object.
    #[inline]
    #[must_use]
    pub fn data(&self) -> *const () {
        self.storage
            .data()
            .map_or(ptr::null(), |data| data.as_ptr().cast_const())
    }

    /// Returns the writable address of the wrapped value, or null if the
    /// wrapper is empty or a read-only alias.
    #[inline]
    #[must_use]
    pub fn data_mut(&mut self) -> *mut () {
        self.storage
            .data_mut()
            .map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// Returns a reference to the wrapped value if it is a `T`.
    #[inline]
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.storage.downcast_ref::<T>()
    }

    /// Returns a mutable reference to the wrapped value if it is a `T` and
    /// the wrapper is not a read-only alias.
    #[inline]
    #[must_use]
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.storage.downcast_mut::<T>()
    }

    /// Moves the owned `T` out of the wrapper.
    ///
    /// Returns the wrapper unchanged if it does not own a `T`.
    pub fn into_inner<T: 'static>(self) -> Result<T, Self> {
        let Self {
            storage,
            vtable,
            _borrow: borrow,
        } = self;
        storage.into_inner::<T>().map_err(|storage| Self {
            storage,
            vtable,
            _borrow: borrow,
        })
    }

    /// Exchanges the contents of two wrappers, including emptiness.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    /// Moves the contents out, leaving this wrapper empty.
    #[inline]
    #[must_use]
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    /// Drops the contents, leaving this wrapper empty.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::empty();
    }

    /// Calls slot `I`, which must be a [`Ref`](crate::Ref) slot.
    ///
    /// # Panics
    ///
    /// Panics if the wrapper is empty.
    #[track_caller]
    pub fn call<const I: usize>(
        &self,
        args: <SlotOf<C, I> as Signature>::Args,
    ) -> <SlotOf<C, I> as Signature>::Output
    where
        C::Slots: SlotAt<I>,
        SlotOf<C, I>: Signature<Receiver = Shared>,
    {
        match self.try_call::<I>(args) {
            Ok(output) => output,
            Err(error) => dispatch_failed::<C>(I, error),
        }
    }

    /// Calls slot `I`.
    ///
    /// # Panics
    ///
    /// Panics if the wrapper is empty, or if slot `I` is a
    /// [`Mut`](crate::Mut) slot and the wrapper is a read-only alias.
    #[track_caller]
    pub fn call_mut<const I: usize>(
        &mut self,
        args: <SlotOf<C, I> as Signature>::Args,
    ) -> <SlotOf<C, I> as Signature>::Output
    where
        C::Slots: SlotAt<I>,
    {
        match self.try_call_mut::<I>(args) {
            Ok(output) => output,
            Err(error) => dispatch_failed::<C>(I, error),
        }
    }

    /// Calls slot `I`, which must be a [`Ref`](crate::Ref) slot, or reports
    /// why it cannot be called.
    pub fn try_call<const I: usize>(
        &self,
        args: <SlotOf<C, I> as Signature>::Args,
    ) -> Result<<SlotOf<C, I> as Signature>::Output, DispatchError>
    where
        C::Slots: SlotAt<I>,
        SlotOf<C, I>: Signature<Receiver = Shared>,
    {
        let vtable = self.vtable.ok_or(DispatchError::Empty)?;
        let entry = vtable.entry::<I>();

        // SAFETY:
        // 1. The vtable was synthesized for the type of the stored value
        //    (guaranteed by the invariants on this type)
        // 2. The slot has a `Shared` receiver
        let output = unsafe {
            <SlotOf<C, I> as Signature>::dispatch(entry, ErasedRef::new(&self.storage), args)
        };
        Ok(output)
    }

    /// Calls slot `I`, or reports why it cannot be called.
    pub fn try_call_mut<const I: usize>(
        &mut self,
        args: <SlotOf<C, I> as Signature>::Args,
    ) -> Result<<SlotOf<C, I> as Signature>::Output, DispatchError>
    where
        C::Slots: SlotAt<I>,
    {
        type ReceiverOf<C, const I: usize> = <SlotOf<C, I> as Signature>::Receiver;

        let vtable = self.vtable.ok_or(DispatchError::Empty)?;
        if <ReceiverOf<C, I> as Receiver>::MUTATES
            && self.storage.ownership() == Some(Ownership::Shared)
        {
            return Err(DispatchError::ReadOnlyAlias);
        }

        let entry = vtable.entry::<I>();
        let this = <ReceiverOf<C, I> as Receiver>::handle(&mut self.storage);

        // SAFETY:
        // 1. The vtable was synthesized for the type of the stored value
        //    (guaranteed by the invariants on this type)
        // 2. Mutating slots are never dispatched on read-only aliases (we just
        //    checked)
        let output = unsafe { <SlotOf<C, I> as Signature>::dispatch(entry, this, args) };
        Ok(output)
    }
}

impl<C: Concept> Default for Poly<'_, C> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<C: Concept> core::fmt::Debug for Poly<'_, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Poly")
            .field("concept", &type_name::<C>())
            .field("type", &self.type_info())
            .field("ownership", &self.ownership())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, rc::Rc, string::String};
    use core::cell::Cell;

    use super::*;
    use crate::{
        concept::{Mut, Ref},
        vtable::build_vtable,
    };

    struct Tally;

    impl Concept for Tally {
        type Slots = (Mut<fn(u32)>, Ref<fn() -> u32>);
    }

    #[derive(Clone, Default)]
    struct Count(u32);

    impl Fulfill<Tally> for Count {
        fn vtable() -> &'static Vtable<Tally> {
            build_vtable::<Tally, Self, _, _>((
                |this: &mut Self, n: u32| this.0 += n,
                |this: &Self| this.0,
            ))
        }
    }

    #[derive(Clone)]
    struct Dropper(Rc<Cell<u32>>);

    impl Drop for Dropper {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    impl Fulfill<Tally> for Dropper {
        fn vtable() -> &'static Vtable<Tally> {
            build_vtable::<Tally, Self, _, _>((|_: u32| {}, || 0u32))
        }
    }

    #[derive(Clone)]
    struct Impostor;

    impl Fulfill<Tally> for Impostor {
        fn vtable() -> &'static Vtable<Tally> {
            Count::vtable()
        }
    }

    #[test]
    fn test_empty_wrapper() {
        let mut poly = Poly::<Tally>::empty();
        assert!(!poly.has_value());
        assert_eq!(poly.type_info(), None);
        assert!(poly.vtable().is_none());
        assert!(poly.data().is_null());
        assert!(poly.data_mut().is_null());
        assert_eq!(poly.try_call::<1>(()), Err(DispatchError::Empty));
        assert_eq!(poly.try_call_mut::<0>((1,)), Err(DispatchError::Empty));
    }

    #[test]
    fn test_owned_dispatch() {
        let mut poly = Poly::<Tally>::new(Count(1));
        poly.call_mut::<0>((4,));
        assert_eq!(poly.call::<1>(()), 5);
        assert_eq!(poly.call_mut::<1>(()), 5);
        assert_eq!(poly.ownership(), Some(Ownership::Inline));
        assert!(poly.is::<Count>());
    }

    #[test]
    fn test_read_only_alias_rejects_mutation() {
        let count = Count(3);
        let mut poly = Poly::<Tally>::from_ref(&count);

        assert_eq!(poly.try_call_mut::<0>((1,)), Err(DispatchError::ReadOnlyAlias));
        assert_eq!(poly.try_call_mut::<1>(()), Ok(3));
        assert!(poly.data_mut().is_null());
        assert_eq!(poly.data(), ptr::from_ref(&count).cast::<()>());
    }

    #[test]
    #[should_panic(expected = "read-only alias")]
    fn test_call_mut_through_read_only_alias_panics() {
        let count = Count(0);
        let mut poly = Poly::<Tally>::from_ref(&count);
        poly.call_mut::<0>((1,));
    }

    #[test]
    #[should_panic(expected = "holds no value")]
    fn test_call_on_empty_panics() {
        let poly = Poly::<Tally>::default();
        let _ = poly.call::<1>(());
    }

    #[test]
    #[should_panic(expected = "returned the vtable of")]
    fn test_mismatched_vtable_panics() {
        let _ = Poly::<Tally>::new(Impostor);
    }

    #[test]
    fn test_drops() {
        let drops = Rc::new(Cell::new(0));
        {
            let poly = Poly::<Tally>::new(Dropper(drops.clone()));
            let copy = poly.try_clone().unwrap();
            drop(poly);
            assert_eq!(drops.get(), 1);
            drop(copy);
        }
        assert_eq!(drops.get(), 2);

        let dropper = Dropper(drops.clone());
        {
            let alias = Poly::<Tally>::from_ref(&dropper);
            let _copy = alias.try_clone().unwrap();
        }
        assert_eq!(drops.get(), 2);
        drop(dropper);
        assert_eq!(drops.get(), 3);
    }

    #[test]
    fn test_into_inner() {
        let poly = Poly::<Tally>::new(Count(9));
        let poly = poly.into_inner::<String>().unwrap_err();
        assert!(poly.has_value());
        assert_eq!(poly.into_inner::<Count>().map(|count| count.0).ok(), Some(9));
    }

    #[test]
    fn test_debug() {
        let poly = Poly::<Tally>::new(Count(0));
        let debug = format!("{poly:?}");
        assert!(debug.contains("Tally"));
        assert!(debug.contains("Count"));
        assert!(debug.contains("Inline"));
    }

    #[test]
    fn test_not_send_or_sync() {
        static_assertions::assert_not_impl_any!(Poly<'static, Tally>: Send, Sync, Clone);
    }
}
