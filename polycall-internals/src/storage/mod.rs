//! Module containing the erased storage cell.
//!
//! - [`raw`]: [`RawAny`] itself, the only place where the storage fields are
//!   visible
//! - [`slot`]: The backing memory of a [`RawAny`] and the small buffer used for
//!   inline values
//! - [`vtable`]: [`StorageVtable`], the drop and clone operations of a stored
//!   type
//!
//! [`StorageVtable`]: vtable::StorageVtable

pub(crate) mod raw;
mod slot;
pub(crate) mod vtable;

pub use self::raw::{Ownership, RawAny};
