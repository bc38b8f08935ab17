//! Process-wide registry of synthesized vtables.
//!
//! Every [`Vtable`] is synthesized once per `(concept, concrete type)` pair,
//! leaked, and recorded here. Lookups take a read lock; a miss upgrades to a
//! write lock and checks again before synthesizing, so concurrent first uses
//! from several threads agree on a single table.
//!
//! The registry is insert-only. Tables are never mutated or freed.

use alloc::{boxed::Box, vec::Vec};
use core::any::{Any, TypeId, type_name};

use hashbrown::HashMap;
use polycall_internals::TypeInfo;

use self::lock::RegistryLock;
use crate::{
    concept::{Concept, SlotList},
    vtable::Vtable,
};

mod lock;

/// A synthesized table, together with what it was synthesized for.
struct Registered {
    concept: TypeInfo,
    concrete: TypeInfo,
    vtable: &'static (dyn Any + Send + Sync),
}

type VtableMap = HashMap<TypeId, Registered, rustc_hash::FxBuildHasher>;

/// Global registry of synthesized vtables.
///
/// # Invariant
///
/// The entry stored under `TypeId::of::<(C, T)>()` holds a `Vtable<C>` whose
/// entries were synthesized for `T`.
static VTABLES: RegistryLock<VtableMap> = RegistryLock::new();

/// Recovers the typed table of concept `C` from a registry entry.
#[inline]
fn typed<C: Concept>(registered: &Registered) -> Option<&'static Vtable<C>> {
    let vtable: &'static (dyn Any + Send + Sync) = registered.vtable;
    vtable.downcast_ref::<Vtable<C>>()
}

fn lookup<C: Concept>(key: TypeId) -> Option<&'static Vtable<C>> {
    VTABLES.read().get()?.get(&key).and_then(typed::<C>)
}

/// Returns the table of `T` under `C`, calling `build` if it does not exist
/// yet.
pub(crate) fn get_or_insert<C: Concept, T: 'static>(
    build: impl FnOnce() -> Vtable<C>,
) -> &'static Vtable<C> {
    let key = TypeId::of::<(C, T)>();

    if let Some(vtable) = lookup::<C>(key) {
        tracing::trace!(
            concept = type_name::<C>(),
            concrete = type_name::<T>(),
            "vtable cache hit"
        );
        return vtable;
    }

    let mut guard = VTABLES.write();
    let map = guard.get_or_insert_with(|| HashMap::with_hasher(rustc_hash::FxBuildHasher));

    // Another thread may have won the race between the two locks
    if let Some(vtable) = map.get(&key).and_then(typed::<C>) {
        return vtable;
    }

    let vtable: &'static Vtable<C> = Box::leak(Box::new(build()));
    map.insert(
        key,
        Registered {
            concept: TypeInfo::of::<C>(),
            concrete: vtable.concrete(),
            vtable,
        },
    );

    tracing::debug!(
        concept = type_name::<C>(),
        concrete = type_name::<T>(),
        slots = <C::Slots as SlotList>::LEN,
        "synthesized vtable"
    );

    vtable
}

/// Describes a table held by the registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct VtableInfo {
    concept: TypeInfo,
    concrete: TypeInfo,
}

impl VtableInfo {
    /// The concept the table implements.
    #[inline]
    #[must_use]
    pub fn concept(&self) -> TypeInfo {
        self.concept
    }

    /// The concrete type the table dispatches to.
    #[inline]
    #[must_use]
    pub fn concrete(&self) -> TypeInfo {
        self.concrete
    }
}

/// Lists every vtable synthesized so far, in no particular order.
///
/// This is primarily useful for debugging.
///
/// # Examples
///
/// ```
/// use polycall::{Concept, Fulfill, Poly, Ref, TypeInfo, Vtable, build_vtable, registered_vtables};
///
/// struct Named;
///
/// impl Concept for Named {
///     type Slots = (Ref<fn() -> &'static str>,);
/// }
///
/// #[derive(Clone)]
/// struct Dog;
///
/// impl Fulfill<Named> for Dog {
///     fn vtable() -> &'static Vtable<Named> {
///         build_vtable::<Named, Self, _, _>((|| "dog",))
///     }
/// }
///
/// let _poly = Poly::<Named>::new(Dog);
/// assert!(registered_vtables().iter().any(|info| {
///     info.concept() == TypeInfo::of::<Named>() && info.concrete() == TypeInfo::of::<Dog>()
/// }));
/// ```
#[must_use]
pub fn registered_vtables() -> Vec<VtableInfo> {
    let guard = VTABLES.read();
    guard
        .get()
        .map(|map| {
            map.values()
                .map(|registered| VtableInfo {
                    concept: registered.concept,
                    concrete: registered.concrete,
                })
                .collect()
        })
        .unwrap_or_default()
}
