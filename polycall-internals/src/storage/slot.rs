//! Backing memory of a [`RawAny`].
//!
//! A [`Slot`] is either a small inline buffer holding a value directly, or a
//! pointer to a value living elsewhere (on the heap for boxed values, in the
//! caller's memory for aliases). The slot itself does not know which of the
//! two it holds; that information is the [`Ownership`] tag stored next to it
//! in the [`RawAny`].
//!
//! [`RawAny`]: crate::storage::RawAny
//! [`Ownership`]: crate::storage::Ownership

use core::{mem::MaybeUninit, ptr::NonNull};

use crate::util::Erased;

/// Size in bytes of the inline buffer.
pub(crate) const INLINE_SIZE: usize = 16;

/// Alignment of the inline buffer.
pub(crate) const INLINE_ALIGN: usize = 16;

/// Returns `true` if values of type `T` are stored inline rather than boxed.
#[inline]
pub(crate) const fn fits_inline<T>() -> bool {
    size_of::<T>() <= INLINE_SIZE && align_of::<T>() <= INLINE_ALIGN
}

/// Raw memory for a value stored inline.
#[derive(Clone, Copy)]
#[repr(C, align(16))]
pub(crate) struct InlineBuffer(MaybeUninit<[u8; INLINE_SIZE]>);

/// The memory of a [`RawAny`], interpreted according to its [`Ownership`].
///
/// The union is `#[repr(C)]`, so both fields start at offset zero and the
/// address of the slot is the address of an inline value.
///
/// [`RawAny`]: crate::storage::RawAny
/// [`Ownership`]: crate::storage::Ownership
#[repr(C)]
pub(crate) union Slot {
    /// An inline value of some type `T` for which [`fits_inline`] holds.
    inline: InlineBuffer,
    /// A pointer to a boxed or aliased value.
    ptr: NonNull<Erased>,
}

impl Slot {
    /// Creates a slot that holds no value.
    #[inline]
    pub(crate) const fn vacant() -> Self {
        Self {
            ptr: NonNull::dangling(),
        }
    }

    /// Creates a slot pointing to a value stored elsewhere.
    #[inline]
    pub(crate) const fn from_ptr(ptr: NonNull<Erased>) -> Self {
        Self { ptr }
    }

    /// Creates a slot holding `value` in its inline buffer.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `fits_inline::<T>()` returns `true`.
    #[inline]
    pub(crate) unsafe fn inline<T>(value: T) -> Self {
        debug_assert!(fits_inline::<T>());

        let mut slot = Self {
            inline: InlineBuffer(MaybeUninit::uninit()),
        };
        let ptr: *mut T = (&raw mut slot).cast::<T>();

        // SAFETY: The slot is at least as large and as aligned as `T` (guaranteed
        // by the caller), and the union is `#[repr(C)]`, so the slot address is a
        // valid place for a `T`.
        unsafe {
            ptr.write(value);
        }

        slot
    }

    /// Returns the pointer stored in this slot.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The slot was created by [`Slot::from_ptr`] or [`Slot::vacant`].
    #[inline]
    pub(crate) unsafe fn ptr(&self) -> NonNull<Erased> {
        // SAFETY: The `ptr` field is the one that was written (guaranteed by the
        // caller). `NonNull` is `Copy`, so reading it does not move anything out.
        unsafe { self.ptr }
    }
}
