#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Type erasure by concept: hold any value that supports a set of operations,
//! and call those operations without knowing its type.
//!
//! ## Overview
//!
//! A *concept* is an ordered list of operation signatures. A [`Poly<C>`]
//! holds a value of any type that fulfils concept `C` (owned, or aliased from
//! somewhere else) and dispatches the concept's operations to it through a
//! table of function pointers. There is no common base trait and no trait
//! object: the table is synthesized per concrete type from a list of
//! *bindings*, which may be methods, free functions or stateless closures,
//! with lossless argument and return conversions.
//!
//! Values up to 16 bytes (and aligned to at most 16) are stored inline
//! without allocating.
//!
//! ## Quick Example
//!
//! ```
//! use polycall::prelude::*;
//!
//! concept! {
//!     /// A counter.
//!     pub Counter: CounterOps {
//!         fn incr(&mut self);
//!         fn set(&mut self, value: i32);
//!         fn get(&self) -> i32;
//!         fn mul(&self, factor: i32) -> f64;
//!     }
//! }
//!
//! #[derive(Clone, Default)]
//! struct Tally {
//!     value: i32,
//! }
//!
//! impl Tally {
//!     fn incr(&mut self) {
//!         self.value += 1;
//!     }
//!
//!     fn get(&self) -> i32 {
//!         self.value
//!     }
//! }
//!
//! impl Fulfill<Counter> for Tally {
//!     fn vtable() -> &'static Vtable<Counter> {
//!         build_vtable::<Counter, Self, _, _>((
//!             Self::incr,
//!             |this: &mut Self, value: i32| this.value = value,
//!             Self::get,
//!             // The binding returns `i32`; the slot converts it to `f64`
//!             |this: &Self, factor: i32| this.value * factor,
//!         ))
//!     }
//! }
//!
//! let mut owned = Poly::<Counter>::new(Tally::default());
//! owned.set(1);
//! owned.incr();
//! assert_eq!(owned.get(), 2);
//! assert_eq!(owned.mul(3), 6.0);
//!
//! let mut tally = Tally::default();
//! let mut alias = Poly::<Counter>::from_mut(&mut tally);
//! alias.set(5);
//! drop(alias);
//! assert_eq!(tally.get(), 5);
//! ```
//!
//! ## Core Concepts
//!
//! - **Concepts** are declared with [`concept!`], or by implementing
//!   [`Concept`] with a tuple of [`Mut`] and [`Ref`] slots. See the
//!   [`Concept`] documentation for the type-level form.
//! - **Bindings** connect slots to a concrete type. A type implements
//!   [`Fulfill<C>`] by passing one binding per slot to [`build_vtable`]. The
//!   accepted binding shapes are described on [`Bind`].
//! - **Vtables** are built once per concept and concrete type, cached for the
//!   lifetime of the process, and shared by every wrapper holding that type.
//!   [`registered_vtables`] lists them.
//! - **Wrappers** ([`Poly`]) own their value or alias one for a lifetime
//!   `'a`. [`Poly::try_clone`] clones an owned value and copies a read-only
//!   alias. A mutable alias is never copied, since it is the only writer of
//!   its referent.
//!
//! ## Features
//!
//! - `std`: Use `std::sync::RwLock` for the vtable registry instead of a spin
//!   lock.
//!
//! ## Logging
//!
//! Vtable synthesis is reported through [`tracing`](https://docs.rs/tracing)
//! at the `debug` level, and registry cache hits at the `trace` level.

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

#[macro_use]
mod macros;

mod binding;
mod concept;
mod erased;
mod error;
mod poly;
pub mod prelude;
mod registry;
mod vtable;

pub use polycall_internals::{Ownership, TypeInfo};

pub use self::{
    binding::{Bind, Bindings, Detached, ViaMut, ViaRef},
    concept::{Concept, Exclusive, Mut, Receiver, Ref, Shared, Signature, SlotAt, SlotList, SlotOf},
    erased::{ErasedMut, ErasedRef},
    error::DispatchError,
    poly::Poly,
    registry::{VtableInfo, registered_vtables},
    vtable::{Fulfill, Vtable, build_vtable},
};
