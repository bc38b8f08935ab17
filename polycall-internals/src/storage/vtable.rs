//! Vtable for type-erased storage operations.
//!
//! This module contains the [`StorageVtable`] which enables dropping, cloning
//! and identifying the value inside a [`RawAny`] when its concrete type `T`
//! has been erased.
//!
//! This module encapsulates the fields of [`StorageVtable`] so they cannot be
//! accessed directly. This visibility restriction guarantees the safety
//! invariant: **the vtable's type parameter matches the actual type of the
//! value stored in the [`RawAny`]**.
//!
//! # Safety Invariant
//!
//! This invariant is maintained because vtables are created as `&'static`
//! references via [`StorageVtable::owned`] and [`StorageVtable::borrowed`],
//! which pair the function pointers with a specific type `T` at compile time.

use core::ptr::NonNull;

use crate::{storage::raw::RawAny, type_info::TypeInfo, util::Erased};

/// Vtable for type-erased storage operations.
///
/// # Safety Invariant
///
/// The fields `drop_inline`, `drop_boxed` and `clone_owned` are guaranteed to
/// point to the functions defined below instantiated with the type `T` that
/// was used to create this [`StorageVtable`].
pub(crate) struct StorageVtable {
    /// Gets the [`TypeInfo`] of the type that was used to create this
    /// [`StorageVtable`].
    type_info: fn() -> TypeInfo,
    /// Drops a `T` stored inline at this pointer, without deallocating.
    drop_inline: unsafe fn(NonNull<Erased>),
    /// Drops the [`Box<T>`] this pointer came from.
    drop_boxed: unsafe fn(NonNull<Erased>),
    /// Clones the `T` behind this pointer into a new owned [`RawAny`].
    clone_owned: unsafe fn(NonNull<Erased>) -> RawAny,
}

impl StorageVtable {
    /// Creates the [`StorageVtable`] used by owned values of type `T`.
    pub(super) const fn owned<T: Clone + 'static>() -> &'static Self {
        const {
            &Self {
                type_info: TypeInfo::of::<T>,
                drop_inline: drop_inline::<T>,
                drop_boxed: drop_boxed::<T>,
                clone_owned: clone_owned::<T>,
            }
        }
    }

    /// Creates the [`StorageVtable`] used by aliases of a `T` that is owned by
    /// somebody else.
    ///
    /// Such a vtable is never asked to clone or drop a value, so `T` does not
    /// need to implement [`Clone`].
    pub(super) const fn borrowed<T: 'static>() -> &'static Self {
        const {
            &Self {
                type_info: TypeInfo::of::<T>,
                drop_inline: drop_inline::<T>,
                drop_boxed: drop_boxed::<T>,
                clone_owned: never_owned::<T>,
            }
        }
    }

    /// Gets the [`TypeInfo`] of the type that was used to create this
    /// [`StorageVtable`].
    #[inline]
    pub(super) fn type_info(&self) -> TypeInfo {
        (self.type_info)()
    }

    /// Drops the value stored inline at `ptr`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to an initialized inline value of the type this
    ///    [`StorageVtable`] was created for.
    /// 2. The value is not used again after this call.
    #[inline]
    pub(super) unsafe fn drop_inline(&self, ptr: NonNull<Erased>) {
        // SAFETY: We know that `self.drop_inline` points to `drop_inline::<T>`
        // below. Its safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe {
            (self.drop_inline)(ptr);
        }
    }

    /// Drops the boxed value at `ptr` and frees its allocation.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` comes from a [`Box<T>`] of the type this [`StorageVtable`]
    ///    was created for.
    /// 2. The pointer is not used again after this call.
    #[inline]
    pub(super) unsafe fn drop_boxed(&self, ptr: NonNull<Erased>) {
        // SAFETY: We know that `self.drop_boxed` points to `drop_boxed::<T>`
        // below. Its safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe {
            (self.drop_boxed)(ptr);
        }
    }

    /// Clones the value at `ptr` into a new owned [`RawAny`].
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to an initialized value of the type this
    ///    [`StorageVtable`] was created for.
    /// 2. This [`StorageVtable`] was created by [`StorageVtable::owned`].
    #[inline]
    pub(super) unsafe fn clone_owned(&self, ptr: NonNull<Erased>) -> RawAny {
        // SAFETY: We know that `self.clone_owned` points to `clone_owned::<T>`
        // below, since the caller guarantees this is an owned vtable. Its safety
        // requirements are upheld:
        // 1. Guaranteed by the caller
        unsafe { (self.clone_owned)(ptr) }
    }
}

/// Drops the `T` stored at `ptr` in place.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `ptr` points to an initialized `T` that is not used after this call.
unsafe fn drop_inline<T>(ptr: NonNull<Erased>) {
    let ptr: *mut T = ptr.cast::<T>().as_ptr();
    // SAFETY: The pointer is valid, aligned and initialized, and ownership of
    // the value is transferred to us (guaranteed by the caller).
    unsafe {
        core::ptr::drop_in_place(ptr);
    }
}

/// Drops the [`Box<T>`] this pointer was leaked from.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `ptr` was created from a [`Box<T>`] and is not used after this call.
///
/// [`Box<T>`]: alloc::boxed::Box
unsafe fn drop_boxed<T>(ptr: NonNull<Erased>) {
    let ptr: *mut T = ptr.cast::<T>().as_ptr();
    // SAFETY: The pointer came from a `Box<T>` and we own it (guaranteed by the
    // caller).
    let boxed = unsafe { alloc::boxed::Box::from_raw(ptr) };
    core::mem::drop(boxed);
}

/// Clones the `T` at `ptr` into a new owned [`RawAny`].
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `ptr` points to an initialized `T`.
unsafe fn clone_owned<T: Clone + 'static>(ptr: NonNull<Erased>) -> RawAny {
    // SAFETY: The pointer is valid, aligned and initialized (guaranteed by the
    // caller), and we only create a shared reference for the duration of the
    // clone.
    let value: &T = unsafe { ptr.cast::<T>().as_ref() };
    RawAny::owned(value.clone())
}

/// Stands in for [`clone_owned`] in vtables of aliased values.
///
/// # Safety
///
/// Never safe to call: only vtables created by [`StorageVtable::owned`] may be
/// asked to clone a value.
unsafe fn never_owned<T>(_ptr: NonNull<Erased>) -> RawAny {
    unreachable!(
        "aliased storage of `{}` was asked to clone an owned value",
        core::any::type_name::<T>()
    )
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;

    #[test]
    fn test_storage_vtable_eq() {
        // Test that vtables have proper static lifetime and can be safely shared
        let vtable1 = StorageVtable::owned::<i32>();
        let vtable2 = StorageVtable::owned::<i32>();

        // Both should be the exact same static instance
        assert!(core::ptr::eq(vtable1, vtable2));
    }

    #[test]
    fn test_storage_vtable_type_info() {
        assert_eq!(
            StorageVtable::owned::<String>().type_info(),
            TypeInfo::of::<String>()
        );
        assert_eq!(
            StorageVtable::borrowed::<String>().type_info(),
            TypeInfo::of::<String>()
        );
        assert!(!core::ptr::eq(
            StorageVtable::owned::<String>(),
            StorageVtable::borrowed::<String>()
        ));
    }
}
