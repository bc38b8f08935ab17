//! The type-erased storage cell.
//!
//! This module encapsulates the fields of [`RawAny`], ensuring they are only
//! visible within this module. This visibility restriction guarantees the
//! safety invariant: **if a header is present, the slot holds a value of the
//! vtable's type, in the way described by the ownership tag**.
//!
//! # Safety Invariant
//!
//! The header and the slot are only ever written together, by the
//! constructors in this file. No method hands out a way to change one without
//! the other, so the pairing established at construction time holds for the
//! entire lifetime of the value.
//!
//! # Ownership
//!
//! A [`RawAny`] holds its value in one of four ways, described by
//! [`Ownership`]:
//!
//! - [`Ownership::Inline`]: owned, embedded in the small buffer of the slot
//! - [`Ownership::Boxed`]: owned, heap allocated
//! - [`Ownership::Shared`]: a read-only alias of a value owned elsewhere
//! - [`Ownership::Exclusive`]: a mutable alias of a value owned elsewhere
//!
//! Cloning, dropping and address computations branch on this tag. Aliases are
//! never dropped through the cell. Cloning a read-only alias copies the
//! reference, while mutable aliases cannot be cloned at all.

use alloc::boxed::Box;
use core::{any::TypeId, mem::ManuallyDrop, ptr::NonNull};

use crate::{
    storage::{
        slot::{Slot, fits_inline},
        vtable::StorageVtable,
    },
    type_info::TypeInfo,
    util::Erased,
};

/// Describes how a [`RawAny`] holds its value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Ownership {
    /// The value is owned and stored in the inline buffer.
    Inline,
    /// The value is owned and stored on the heap.
    Boxed,
    /// The value is owned elsewhere and may only be read through this cell.
    Shared,
    /// The value is owned elsewhere and may be read and mutated through this
    /// cell.
    Exclusive,
}

impl Ownership {
    /// Returns `true` if the cell is responsible for dropping the value.
    #[inline]
    #[must_use]
    pub const fn is_owned(self) -> bool {
        matches!(self, Self::Inline | Self::Boxed)
    }

    /// Returns `true` if the cell refers to a value owned elsewhere.
    #[inline]
    #[must_use]
    pub const fn is_alias(self) -> bool {
        !self.is_owned()
    }

    /// Returns `true` if the value may be mutated through the cell.
    #[inline]
    #[must_use]
    pub const fn is_writable(self) -> bool {
        !matches!(self, Self::Shared)
    }
}

/// Describes the value held by a non-empty [`RawAny`].
#[derive(Clone, Copy)]
struct Header {
    /// The vtable of the stored type.
    vtable: &'static StorageVtable,
    /// How the slot holds the value.
    ownership: Ownership,
}

/// A container for a single value of any type, which is either owned or an
/// alias of a value owned elsewhere.
///
/// Small values (at most 16 bytes, aligned to at most 16) are stored inline
/// without any allocation; larger values are boxed.
///
/// # Safety invariants
///
/// The following invariants hold for as long as the value exists:
///
/// 1. If `header` is `None`, the slot holds no value.
/// 2. If `header` is `Some`, the slot holds a value of the type the vtable
///    was created for:
///    - [`Ownership::Inline`]: initialized inline in the slot,
///    - [`Ownership::Boxed`]: behind a pointer created from a [`Box`],
///    - [`Ownership::Shared`]/[`Ownership::Exclusive`]: behind a pointer
///      that stays valid (and, for `Shared`, is only read) for as long as
///      this value or any clone or alias of it is used.
/// 3. Owned values are paired with a vtable created by
///    [`StorageVtable::owned`].
pub struct RawAny {
    /// Description of the held value, if any.
    header: Option<Header>,
    /// The held value, interpreted according to `header`.
    slot: Slot,
}

impl RawAny {
    /// Creates an empty [`RawAny`].
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            header: None,
            slot: Slot::vacant(),
        }
    }

    /// Creates a [`RawAny`] owning `value`.
    ///
    /// The value is stored inline if it is small enough and boxed otherwise.
    #[inline]
    pub fn owned<T: Clone + 'static>(value: T) -> Self {
        let vtable = StorageVtable::owned::<T>();

        if fits_inline::<T>() {
            Self {
                header: Some(Header {
                    vtable,
                    ownership: Ownership::Inline,
                }),
                // SAFETY:
                // 1. We just checked that `T` fits inline
                slot: unsafe { Slot::inline(value) },
            }
        } else {
            let ptr: NonNull<T> = NonNull::from(Box::leak(Box::new(value)));
            Self {
                header: Some(Header {
                    vtable,
                    ownership: Ownership::Boxed,
                }),
                slot: Slot::from_ptr(ptr.cast::<Erased>()),
            }
        }
    }

    /// Creates a read-only alias of the `T` behind `ptr`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to an initialized `T` that stays valid for as long as
    ///    the returned value, or any clone or alias of it, is used.
    /// 2. The pointee is not mutated during that time.
    #[inline]
    pub unsafe fn borrowed<T: 'static>(ptr: NonNull<T>) -> Self {
        Self {
            header: Some(Header {
                vtable: StorageVtable::borrowed::<T>(),
                ownership: Ownership::Shared,
            }),
            slot: Slot::from_ptr(ptr.cast::<Erased>()),
        }
    }

    /// Creates a mutable alias of the `T` behind `ptr`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to an initialized `T` that stays valid for as long as
    ///    the returned value, or any clone or alias of it, is used.
    /// 2. `ptr` is valid for writes, and the pointee is only accessed through
    ///    the returned value and its clones and aliases during that time.
    #[inline]
    pub unsafe fn borrowed_mut<T: 'static>(ptr: NonNull<T>) -> Self {
        Self {
            header: Some(Header {
                vtable: StorageVtable::borrowed::<T>(),
                ownership: Ownership::Exclusive,
            }),
            slot: Slot::from_ptr(ptr.cast::<Erased>()),
        }
    }

    /// Replaces the current contents with an owned `value`.
    ///
    /// The new value is constructed before the old one is dropped. An aliased
    /// referent is never dropped.
    #[inline]
    pub fn emplace<T: Clone + 'static>(&mut self, value: T) {
        *self = Self::owned(value);
    }

    /// Drops the current contents, leaving the cell empty.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Moves the contents out, leaving this cell empty.
    #[inline]
    #[must_use]
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    /// Exchanges the contents of two cells.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    /// Returns `true` if the cell holds a value.
    #[inline]
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.header.is_some()
    }

    /// Returns how the value is held, or `None` if the cell is empty.
    #[inline]
    #[must_use]
    pub fn ownership(&self) -> Option<Ownership> {
        self.header.map(|header| header.ownership)
    }

    /// Returns the [`TypeInfo`] of the held value, or `None` if the cell is
    /// empty.
    #[inline]
    #[must_use]
    pub fn type_info(&self) -> Option<TypeInfo> {
        self.header.map(|header| header.vtable.type_info())
    }

    /// Returns the [`TypeId`] of the held value, or `None` if the cell is
    /// empty.
    #[inline]
    #[must_use]
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_info().map(TypeInfo::id)
    }

    /// Returns `true` if the cell holds a `T`.
    #[inline]
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id() == Some(TypeId::of::<T>())
    }

    /// Returns a read-only pointer to the held value, or `None` if the cell is
    /// empty.
    #[inline]
    #[must_use]
    pub fn data(&self) -> Option<NonNull<()>> {
        self.value_ptr().map(NonNull::cast::<()>)
    }

    /// Returns a writable pointer to the held value, or `None` if the cell is
    /// empty or a read-only alias.
    #[inline]
    #[must_use]
    pub fn data_mut(&mut self) -> Option<NonNull<()>> {
        self.value_ptr_mut().map(NonNull::cast::<()>)
    }

    /// Pointer to the held value, derived from a shared borrow.
    #[inline]
    fn value_ptr(&self) -> Option<NonNull<Erased>> {
        let header = self.header?;
        let ptr = match header.ownership {
            Ownership::Inline => NonNull::from(&self.slot).cast::<Erased>(),
            Ownership::Boxed | Ownership::Shared | Ownership::Exclusive => {
                // SAFETY:
                // 1. Values that are not inline are stored through `Slot::from_ptr`
                //    (guaranteed by the invariants on this type)
                unsafe { self.slot.ptr() }
            }
        };
        Some(ptr)
    }

    /// Pointer to the held value, derived from a mutable borrow.
    ///
    /// Returns `None` for read-only aliases.
    #[inline]
    fn value_ptr_mut(&mut self) -> Option<NonNull<Erased>> {
        let header = self.header?;
        let ptr = match header.ownership {
            Ownership::Inline => NonNull::from(&mut self.slot).cast::<Erased>(),
            Ownership::Shared => return None,
            Ownership::Boxed | Ownership::Exclusive => {
                // SAFETY:
                // 1. Values that are not inline are stored through `Slot::from_ptr`
                //    (guaranteed by the invariants on this type)
                unsafe { self.slot.ptr() }
            }
        };
        Some(ptr)
    }

    /// Creates a read-only alias of the held value.
    ///
    /// Aliasing an empty cell returns an empty cell.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The returned value, and any clone or alias of it, is not used after
    ///    `self` is moved, dropped, emplaced into or reset, or after the value
    ///    held by `self` is mutated.
    #[inline]
    #[must_use]
    pub unsafe fn alias(&self) -> Self {
        let (Some(header), Some(ptr)) = (self.header, self.value_ptr()) else {
            return Self::new();
        };

        // Invariant 2 holds because the caller keeps the referent alive and
        // unmutated; invariant 3 does not apply to aliases.
        Self {
            header: Some(Header {
                vtable: header.vtable,
                ownership: Ownership::Shared,
            }),
            slot: Slot::from_ptr(ptr),
        }
    }

    /// Creates a mutable alias of the held value.
    ///
    /// Aliasing a read-only alias gives another read-only alias. Aliasing an
    /// empty cell returns an empty cell.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The returned value, and any clone or alias of it, is not used after
    ///    `self` is moved, dropped, emplaced into or reset.
    /// 2. The held value is not accessed through `self` while the returned
    ///    value, or any clone or alias of it, is in use.
    #[inline]
    #[must_use]
    pub unsafe fn alias_mut(&mut self) -> Self {
        let Some(header) = self.header else {
            return Self::new();
        };

        let (ownership, ptr) = match self.value_ptr_mut() {
            Some(ptr) => (Ownership::Exclusive, ptr),
            // A read-only alias can only produce another read-only alias
            None => match self.value_ptr() {
                Some(ptr) => (Ownership::Shared, ptr),
                None => return Self::new(),
            },
        };

        // Invariant 2 holds because the caller keeps the referent alive and
        // unaccessed through `self`; invariant 3 does not apply to aliases.
        Self {
            header: Some(Header {
                vtable: header.vtable,
                ownership,
            }),
            slot: Slot::from_ptr(ptr),
        }
    }

    /// Returns a reference to the held value as a `T`, or `None` if the cell
    /// holds something else or nothing.
    #[inline]
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if !self.is::<T>() {
            return None;
        }
        let ptr = self.value_ptr()?.cast::<T>();

        // SAFETY: The cell holds an initialized `T` at this pointer (we just
        // checked the type and the invariants on this type guarantee the rest),
        // and the returned reference is bound to a shared borrow of the cell.
        Some(unsafe { ptr.as_ref() })
    }

    /// Returns a mutable reference to the held value as a `T`, or `None` if the
    /// cell holds something else or nothing, or is a read-only alias.
    #[inline]
    #[must_use]
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        if !self.is::<T>() {
            return None;
        }
        let mut ptr = self.value_ptr_mut()?.cast::<T>();

        // SAFETY: The cell holds an initialized, writable `T` at this pointer (we
        // just checked the type and ownership, and the invariants on this type
        // guarantee the rest), and the returned reference is bound to a mutable
        // borrow of the cell.
        Some(unsafe { ptr.as_mut() })
    }

    /// Returns a reference to the held value as a `T`, without checking the
    /// type.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The cell holds a `T`.
    #[inline]
    #[must_use]
    pub unsafe fn downcast_unchecked<T: 'static>(&self) -> &T {
        // Debug assertion to catch type mismatches in case of bugs
        debug_assert_eq!(self.type_id(), Some(TypeId::of::<T>()));

        // SAFETY:
        // 1. A non-empty cell always has a value pointer (guaranteed by the caller)
        let ptr = unsafe { self.value_ptr().unwrap_unchecked() };

        // SAFETY: The pointer points to an initialized `T` (guaranteed by the
        // caller and the invariants on this type), and the returned reference is
        // bound to a shared borrow of the cell.
        unsafe { ptr.cast::<T>().as_ref() }
    }

    /// Returns a mutable reference to the held value as a `T`, without
    /// checking the type.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The cell holds a `T`.
    /// 2. The cell is not a read-only alias.
    #[inline]
    #[must_use]
    pub unsafe fn downcast_unchecked_mut<T: 'static>(&mut self) -> &mut T {
        // Debug assertions to catch misuse in case of bugs
        debug_assert_eq!(self.type_id(), Some(TypeId::of::<T>()));
        debug_assert_ne!(self.ownership(), Some(Ownership::Shared));

        // SAFETY:
        // 1. A non-empty, writable cell always has a writable value pointer
        //    (guaranteed by the caller)
        let ptr = unsafe { self.value_ptr_mut().unwrap_unchecked() };

        // SAFETY: The pointer points to an initialized, writable `T` (guaranteed
        // by the caller and the invariants on this type), and the returned
        // reference is bound to a mutable borrow of the cell.
        unsafe { ptr.cast::<T>().as_mut() }
    }

    /// Moves the owned `T` out of the cell.
    ///
    /// Returns the cell unchanged if it does not hold a `T`, or if it is an
    /// alias and therefore cannot give up a value it does not own.
    pub fn into_inner<T: 'static>(self) -> Result<T, Self> {
        let Some(header) = self.header else {
            return Err(self);
        };
        if !self.is::<T>() || header.ownership.is_alias() {
            return Err(self);
        }

        let this = ManuallyDrop::new(self);
        match header.ownership {
            Ownership::Inline => {
                let ptr: *const T = core::ptr::from_ref(&this.slot).cast::<T>();
                // SAFETY: The slot holds an initialized inline `T` (we checked the
                // type and ownership). `this` is never dropped, so the value is
                // moved out exactly once.
                Ok(unsafe { ptr.read() })
            }
            Ownership::Boxed | Ownership::Shared | Ownership::Exclusive => {
                // SAFETY:
                // 1. Boxed values are stored through `Slot::from_ptr`
                let ptr = unsafe { this.slot.ptr() }.cast::<T>();
                // SAFETY: The pointer came from a `Box<T>` (we checked the type and
                // ownership). `this` is never dropped, so the box is reclaimed
                // exactly once.
                let boxed = unsafe { Box::from_raw(ptr.as_ptr()) };
                Ok(*boxed)
            }
        }
    }
}

impl Default for RawAny {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl RawAny {
    /// Copies the cell, or returns `None` if it is a mutable alias.
    ///
    /// Owned values are cloned and read-only aliases copy the reference. A
    /// mutable alias grants the only write access to its referent, so copying
    /// it would create two writers; [`RawAny::alias_mut`] is the way to get a
    /// second, borrow-bound view instead.
    #[must_use]
    pub fn try_clone(&self) -> Option<Self> {
        let Some(header) = self.header else {
            return Some(Self::new());
        };

        match header.ownership {
            Ownership::Inline | Ownership::Boxed => {
                // SAFETY:
                // 1. A non-empty cell always has a value pointer
                let ptr = unsafe { self.value_ptr().unwrap_unchecked() };
                // SAFETY:
                // 1. The pointer points to a value of the vtable's type (guaranteed by
                //    the invariants on this type)
                // 2. Owned values use owned vtables (guaranteed by the invariants on
                //    this type)
                Some(unsafe { header.vtable.clone_owned(ptr) })
            }
            Ownership::Shared => {
                // SAFETY:
                // 1. Aliases are stored through `Slot::from_ptr`
                let ptr = unsafe { self.slot.ptr() };
                Some(Self {
                    header: Some(header),
                    slot: Slot::from_ptr(ptr),
                })
            }
            Ownership::Exclusive => None,
        }
    }
}

impl Drop for RawAny {
    #[inline]
    fn drop(&mut self) {
        let Some(header) = self.header else {
            return;
        };

        match header.ownership {
            Ownership::Inline => {
                let ptr = NonNull::from(&mut self.slot).cast::<Erased>();
                // SAFETY:
                // 1. The slot holds an initialized inline value of the vtable's type
                //    (guaranteed by the invariants on this type)
                // 2. We are in the drop function, so the value is not used afterwards
                unsafe {
                    header.vtable.drop_inline(ptr);
                }
            }
            Ownership::Boxed => {
                // SAFETY:
                // 1. Boxed values are stored through `Slot::from_ptr`
                let ptr = unsafe { self.slot.ptr() };
                // SAFETY:
                // 1. The pointer came from a `Box` of the vtable's type (guaranteed by
                //    the invariants on this type)
                // 2. We are in the drop function, so the pointer is not used afterwards
                unsafe {
                    header.vtable.drop_boxed(ptr);
                }
            }
            Ownership::Shared | Ownership::Exclusive => {}
        }
    }
}

impl core::fmt::Debug for RawAny {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawAny")
            .field("type", &self.type_info())
            .field("ownership", &self.ownership())
            .finish()
    }
}
