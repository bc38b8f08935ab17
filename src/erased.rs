//! Borrowed views of erased storage, passed to vtable entries.
//!
//! Every vtable entry receives the storage of the [`Poly`] it was called on
//! as its first argument. Entries of [`Ref`] slots receive an [`ErasedRef`],
//! entries of [`Mut`] slots an [`ErasedMut`]. Neither view knows the concrete
//! type it refers to; the entry that receives it was synthesized for exactly
//! one type and downcasts without checking.
//!
//! [`Poly`]: crate::Poly
//! [`Ref`]: crate::Ref
//! [`Mut`]: crate::Mut

use polycall_internals::{Ownership, RawAny, TypeInfo};

/// A read-only view of the storage of a [`Poly`](crate::Poly).
#[derive(Clone, Copy)]
pub struct ErasedRef<'a>(&'a RawAny);

impl<'a> ErasedRef<'a> {
    /// Wraps a storage cell.
    #[inline]
    pub(crate) fn new(storage: &'a RawAny) -> Self {
        Self(storage)
    }

    /// Returns the [`TypeInfo`] of the stored value, or `None` if the storage
    /// is empty.
    #[inline]
    #[must_use]
    pub fn type_info(self) -> Option<TypeInfo> {
        self.0.type_info()
    }

    /// Returns a reference to the stored value as a `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The storage holds a `T`.
    #[inline]
    #[must_use]
    pub unsafe fn downcast_unchecked<T: 'static>(self) -> &'a T {
        // SAFETY:
        // 1. Guaranteed by the caller
        unsafe { self.0.downcast_unchecked::<T>() }
    }
}

/// A writable view of the storage of a [`Poly`](crate::Poly).
///
/// The storage may still be a read-only alias; entries of [`Mut`](crate::Mut)
/// slots are only ever given an [`ErasedMut`] after this has been ruled out.
pub struct ErasedMut<'a>(&'a mut RawAny);

impl<'a> ErasedMut<'a> {
    /// Wraps a storage cell.
    #[inline]
    pub(crate) fn new(storage: &'a mut RawAny) -> Self {
        Self(storage)
    }

    /// Returns the [`TypeInfo`] of the stored value, or `None` if the storage
    /// is empty.
    #[inline]
    #[must_use]
    pub fn type_info(&self) -> Option<TypeInfo> {
        self.0.type_info()
    }

    /// Returns `true` if the stored value may be mutated through this view.
    #[inline]
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.0.ownership().is_some_and(Ownership::is_writable)
    }

    /// Gives up write access.
    #[inline]
    #[must_use]
    pub fn into_ref(self) -> ErasedRef<'a> {
        ErasedRef(self.0)
    }

    /// Returns a mutable reference to the stored value as a `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The storage holds a `T`.
    /// 2. The storage is not a read-only alias.
    #[inline]
    #[must_use]
    pub unsafe fn downcast_unchecked<T: 'static>(self) -> &'a mut T {
        // SAFETY:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe { self.0.downcast_unchecked_mut::<T>() }
    }
}

impl core::fmt::Debug for ErasedRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("ErasedRef").field(&self.type_info()).finish()
    }
}

impl core::fmt::Debug for ErasedMut<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("ErasedMut").field(&self.type_info()).finish()
    }
}
