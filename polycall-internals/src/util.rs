//! Internal utility types.

/// Marker type used when type-erasing stored values.
///
/// This zero-sized type serves as a placeholder in pointer types when the
/// actual concrete type has been erased. For example, `NonNull<Erased>`
/// points to a value whose concrete type is only known by the
/// [`StorageVtable`] it is paired with.
///
/// Using a distinct marker type (rather than `()`) makes the intent clearer
/// in type signatures and error messages.
///
/// [`StorageVtable`]: crate::storage::vtable::StorageVtable
pub(crate) struct Erased;
