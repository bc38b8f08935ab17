#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`polycall`].
//!
//! # Overview
//!
//! This crate contains the erased storage cell that every `polycall::Poly`
//! value is built on, together with the unsafe operations needed to create,
//! copy, alias and destroy values whose concrete type is only known through a
//! vtable.
//!
//! **This crate is an implementation detail.** No semantic versioning guarantees
//! are provided. Users should depend on the [`polycall`] crate, not this one.
//!
//! # Architecture
//!
//! - **[`storage`]**: Type-erased value storage
//!   - [`RawAny`]: A cell holding nothing, an owned value (inline in a small
//!     buffer or boxed) or a non-owning alias of a caller object
//!   - [`Ownership`]: The tag describing how a [`RawAny`] holds its value
//!   - [`StorageVtable`]: Function pointers for type-erased drop and clone
//!
//! - **[`type_info`]**: [`TypeInfo`], the comparable and hashable identity of a
//!   concrete type
//!
//! # Safety Strategy
//!
//! A [`RawAny`] pairs raw memory with a `&'static` [`StorageVtable`] that was
//! instantiated for the exact type stored in that memory. The pairing is
//! established in the constructors and can never be changed afterwards,
//! because the fields are private to the [`storage::raw`] module. All the
//! `unsafe` code that relies on the pairing lives in that one file, which keeps
//! the invariants locally verifiable.
//!
//! Aliasing constructors are `unsafe`: a [`RawAny`] carries no lifetime, so the
//! caller (the `polycall` crate, which tracks lifetimes in its public types)
//! must guarantee that the referent outlives the alias.
//!
//! [`polycall`]: https://docs.rs/polycall/latest/polycall/
//! [`StorageVtable`]: storage::vtable::StorageVtable

extern crate alloc;

mod storage;
mod type_info;
mod util;

pub use storage::{Ownership, RawAny};
pub use type_info::TypeInfo;
