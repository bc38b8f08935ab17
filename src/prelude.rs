//! Commonly used items for convenient importing.
//!
//! ```rust
//! use polycall::prelude::*;
//!
//! concept! {
//!     pub Area: AreaOps {
//!         fn area(&self) -> f64;
//!     }
//! }
//!
//! #[derive(Clone)]
//! struct Square(f64);
//!
//! impl Fulfill<Area> for Square {
//!     fn vtable() -> &'static Vtable<Area> {
//!         build_vtable::<Area, Self, _, _>((|this: &Self| this.0 * this.0,))
//!     }
//! }
//!
//! let shape = Poly::<Area>::new(Square(3.0));
//! assert_eq!(shape.area(), 9.0);
//! ```
//!
//! # What's Included
//!
//! - **[`Poly`]**: The type-erased wrapper
//! - **[`Concept`]**, **[`Mut`]** and **[`Ref`]**: For declaring concepts by
//!   hand
//! - **[`concept!`]**: For declaring concepts from method signatures
//! - **[`Fulfill`]**, **[`Vtable`]** and **[`build_vtable`]**: For binding
//!   concrete types to concepts

pub use crate::{Concept, Fulfill, Mut, Poly, Ref, Vtable, build_vtable, concept};
