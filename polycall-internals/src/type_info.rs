//! Runtime identity of concrete types.

use core::{
    any::TypeId,
    hash::{Hash, Hasher},
};

/// The identity of a concrete type, together with its name for diagnostics.
///
/// Two [`TypeInfo`] values compare equal if and only if they were created for
/// the same type. The name does not participate in comparisons or hashing,
/// since [`core::any::type_name`] is not guaranteed to be unique.
///
/// An empty storage cell reports `None` rather than a [`TypeInfo`]; there is no
/// "null" type identity.
///
/// # Examples
///
/// ```
/// use polycall_internals::TypeInfo;
///
/// assert_eq!(TypeInfo::of::<u32>(), TypeInfo::of::<u32>());
/// assert_ne!(TypeInfo::of::<u32>(), TypeInfo::of::<i32>());
/// assert_eq!(TypeInfo::of::<u32>().name(), "u32");
/// ```
#[derive(Clone, Copy)]
pub struct TypeInfo {
    /// The [`TypeId`] of the type.
    id: TypeId,
    /// The [`core::any::type_name`] of the type.
    name: &'static str,
}

impl TypeInfo {
    /// Returns the [`TypeInfo`] of `T`.
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`] of the type.
    #[inline]
    #[must_use]
    pub fn id(self) -> TypeId {
        self.id
    }

    /// Returns the [`core::any::type_name`] of the type.
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        self.name
    }

    /// Returns `true` if this is the identity of `T`.
    #[inline]
    #[must_use]
    pub fn is<T: ?Sized + 'static>(self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeInfo {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl core::fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("TypeInfo").field(&self.name).finish()
    }
}

impl core::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name)
    }
}
