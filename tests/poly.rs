//! Wrappers over a concept declared with `concept!`.

use std::{cell::Cell, rc::Rc};

use polycall::{
    DispatchError, Fulfill, Ownership, Poly, TypeInfo, Vtable, build_vtable, concept,
};

concept! {
    /// A counter whose last slot takes an argument that the binding widens.
    pub Clazz: ClazzOps {
        fn incr(&mut self);
        fn set(&mut self, value: i32);
        fn get(&self) -> i32;
        fn decr(&mut self);
        fn mul(&mut self, factor: i32) -> f64;
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Impl {
    value: i32,
}

impl Impl {
    fn incr(&mut self) {
        self.value += 1;
    }

    fn set(&mut self, value: i32) {
        self.value = value;
    }

    fn get(&self) -> i32 {
        self.value
    }
}

impl Fulfill<Clazz> for Impl {
    fn vtable() -> &'static Vtable<Clazz> {
        build_vtable::<Clazz, Self, _, _>((
            Self::incr,
            Self::set,
            Self::get,
            |this: &mut Self| this.set(this.get() - 1),
            |this: &Self, factor: f64| factor * f64::from(this.get()),
        ))
    }
}

/// Same operations, stored on the heap because of its size.
#[derive(Clone, Debug, Default)]
struct Wide {
    value: i32,
    history: [i64; 4],
}

impl Fulfill<Clazz> for Wide {
    fn vtable() -> &'static Vtable<Clazz> {
        build_vtable::<Clazz, Self, _, _>((
            |this: &mut Self| this.value += 1,
            |this: &mut Self, value: i32| {
                this.history.rotate_right(1);
                this.history[0] = i64::from(this.value);
                this.value = value;
            },
            |this: &Self| this.value,
            |this: &mut Self| this.value -= 1,
            |this: &Self, factor: i32| this.value * factor,
        ))
    }
}

#[derive(Clone)]
struct Counted {
    drops: Rc<Cell<u32>>,
}

impl Drop for Counted {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

impl Fulfill<Clazz> for Counted {
    fn vtable() -> &'static Vtable<Clazz> {
        build_vtable::<Clazz, Self, _, _>((
            || {},
            |_: i32| {},
            |this: &Self| i32::try_from(this.drops.get()).unwrap_or(i32::MAX),
            || {},
            |_: i32| 0.0_f64,
        ))
    }
}

fn value_of(poly: &Poly<'_, Clazz>) -> Option<i32> {
    poly.downcast_ref::<Impl>().map(|instance| instance.value)
}

#[test]
fn test_functionalities() {
    let mut instance = Impl::default();
    let instance_address = (&raw const instance).cast::<()>();

    let mut empty = Poly::<Clazz>::empty();
    let in_place = Poly::<Clazz>::new_with(|| Impl { value: 3 });
    let alias = Poly::<Clazz>::from_mut(&mut instance);
    let value = Poly::<Clazz>::new(Impl::default());

    assert!(!empty.has_value());
    assert!(in_place.has_value());
    assert!(alias.has_value());
    assert!(value.has_value());

    assert_eq!(empty.type_info(), None);
    assert_eq!(in_place.type_info(), Some(TypeInfo::of::<Impl>()));
    assert_eq!(alias.type_info(), Some(TypeInfo::of::<Impl>()));
    assert_eq!(value.type_info(), Some(TypeInfo::of::<Impl>()));

    assert_eq!(alias.data(), instance_address);

    empty = Poly::new(Impl::default());

    assert!(empty.has_value());
    assert!(!empty.data().is_null());
    assert!(!empty.data_mut().is_null());
    assert_eq!(empty.type_info(), Some(TypeInfo::of::<Impl>()));
    assert_eq!(empty.get(), 0);

    empty.emplace(Impl { value: 3 });

    assert!(empty.has_value());
    assert_eq!(empty.get(), 3);

    let reference = in_place.alias();

    assert!(reference.has_value());
    assert!(!reference.data().is_null());
    assert_eq!(reference.data(), in_place.data());
    assert_eq!(reference.type_info(), Some(TypeInfo::of::<Impl>()));
    assert_eq!(reference.get(), 3);

    let mut null = Poly::<Clazz>::empty();
    empty.swap(&mut null);

    assert!(!empty.has_value());
    assert!(null.has_value());
    assert_eq!(null.get(), 3);

    let mut copy = in_place.try_clone().unwrap();

    assert!(copy.has_value());
    assert_eq!(copy.get(), 3);

    let moved = copy.take();

    assert!(moved.has_value());
    assert!(!copy.has_value());
    assert_eq!(moved.get(), 3);
}

#[test]
fn test_owned() {
    let mut poly = Poly::<Clazz>::new(Impl::default());
    let address = poly.data();

    assert!(poly.has_value());
    assert!(!address.is_null());
    assert_eq!(value_of(&poly), Some(0));
    assert_eq!(poly.get(), 0);

    poly.set(1);
    poly.incr();

    assert_eq!(poly.data(), address);
    assert_eq!(value_of(&poly), Some(2));
    assert_eq!(poly.get(), 2);
    assert_eq!(poly.mul(3), 6.0);

    poly.decr();

    assert_eq!(value_of(&poly), Some(1));
    assert_eq!(poly.get(), 1);
    assert_eq!(poly.mul(3), 3.0);
}

#[test]
fn test_alias() {
    let mut instance = Impl::default();
    let instance_address = (&raw const instance).cast::<()>();

    {
        let mut poly = Poly::<Clazz>::from_mut(&mut instance);

        assert!(poly.has_value());
        assert_eq!(poly.data(), instance_address);
        assert_eq!(poly.data_mut().cast_const(), instance_address);
        assert_eq!(poly.ownership(), Some(Ownership::Exclusive));
        assert_eq!(poly.get(), 0);

        poly.set(1);
        poly.incr();

        assert_eq!(value_of(&poly), Some(2));
        assert_eq!(poly.get(), 2);
        assert_eq!(poly.mul(3), 6.0);

        poly.decr();

        assert_eq!(poly.get(), 1);
        assert_eq!(poly.mul(3), 3.0);
    }

    assert_eq!(instance.value, 1);
}

#[test]
fn test_read_only_alias() {
    let instance = Impl { value: 4 };
    let mut poly = Poly::<Clazz>::from_ref(&instance);

    assert_eq!(poly.ownership(), Some(Ownership::Shared));
    assert_eq!(poly.get(), 4);
    assert!(poly.data_mut().is_null());
    assert_eq!(poly.try_call_mut::<0>(()), Err(DispatchError::ReadOnlyAlias));
    assert_eq!(poly.try_call_mut::<2>(()), Ok(4));

    // Mutable aliases of read-only aliases stay read-only
    let mut nested = poly.alias_mut();
    assert_eq!(nested.ownership(), Some(Ownership::Shared));
    assert_eq!(nested.try_call_mut::<1>((9,)), Err(DispatchError::ReadOnlyAlias));
    drop(nested);

    assert_eq!(instance.value, 4);
}

#[test]
#[should_panic(expected = "read-only alias")]
fn test_mutation_through_read_only_alias_panics() {
    let instance = Impl::default();
    let mut poly = Poly::<Clazz>::from_ref(&instance);
    poly.incr();
}

#[test]
#[should_panic(expected = "holds no value")]
fn test_call_on_empty_panics() {
    let poly = Poly::<Clazz>::empty();
    let _ = poly.get();
}

#[test]
fn test_alias_mut_is_visible_from_original() {
    let mut owner = Poly::<Clazz>::new(Impl { value: 1 });
    {
        let mut alias = owner.alias_mut();
        assert_eq!(alias.ownership(), Some(Ownership::Exclusive));
        alias.set(7);
        alias.incr();
    }
    assert_eq!(owner.get(), 8);
    assert_eq!(owner.ownership(), Some(Ownership::Inline));
}

#[test]
fn test_clone_is_independent() {
    let original = Poly::<Clazz>::new(Impl { value: 5 });
    let mut copy = original.try_clone().unwrap();

    copy.set(50);

    assert_eq!(original.get(), 5);
    assert_eq!(copy.get(), 50);
    assert_ne!(original.data(), copy.data());
    assert!(std::ptr::eq(
        original.vtable().unwrap(),
        copy.vtable().unwrap()
    ));
}

#[test]
fn test_mutable_alias_is_never_copied() {
    let mut instance = Impl::default();
    {
        let mut alias = Poly::<Clazz>::from_mut(&mut instance);

        assert!(alias.try_clone().is_none());

        // A second writable view has to borrow the first one
        let mut nested = alias.alias_mut();
        assert!(nested.try_clone().is_none());
        nested.set(12);
        drop(nested);

        assert_eq!(alias.get(), 12);
        alias.incr();
    }
    assert_eq!(instance.value, 13);
}

#[test]
fn test_copy_of_read_only_alias_shares_referent() {
    let instance = Impl { value: 4 };
    let alias = Poly::<Clazz>::from_ref(&instance);
    let copy = alias.try_clone().unwrap();

    assert_eq!(copy.ownership(), Some(Ownership::Shared));
    assert_eq!(copy.data(), alias.data());
    assert_eq!(copy.get(), 4);

    let owner = Poly::<Clazz>::new(Impl { value: 8 });
    let view = owner.alias();
    let view_copy = view.try_clone().unwrap();
    assert_eq!(view_copy.data(), owner.data());
    assert_eq!(view_copy.get(), 8);
}

#[test]
fn test_emplace_into_empty() {
    let mut poly = Poly::<Clazz>::empty();
    poly.emplace(Impl { value: 7 });

    assert!(poly.has_value());
    assert_eq!(poly.type_info(), Some(TypeInfo::of::<Impl>()));
    assert_eq!(poly.ownership(), Some(Ownership::Inline));
    assert_eq!(poly.get(), 7);

    let mut boxed = Poly::<Clazz>::default();
    boxed.emplace_with(Wide::default);

    assert!(boxed.has_value());
    assert_eq!(boxed.type_info(), Some(TypeInfo::of::<Wide>()));
    assert_eq!(boxed.get(), 0);
}

#[test]
fn test_emplace_into_alias_leaves_referent_alone() {
    let drops = Rc::new(Cell::new(0));
    let mut counted = Counted {
        drops: drops.clone(),
    };
    {
        let mut poly = Poly::<Clazz>::from_mut(&mut counted);
        poly.emplace(Impl::default());

        assert_eq!(drops.get(), 0);
        assert_eq!(poly.ownership(), Some(Ownership::Inline));
        assert_eq!(poly.type_info(), Some(TypeInfo::of::<Impl>()));
        poly.set(3);
        assert_eq!(poly.get(), 3);
    }
    assert_eq!(drops.get(), 0);
    assert_eq!(Rc::strong_count(&counted.drops), 2);

    let mut instance = Impl { value: 5 };
    {
        let mut poly = Poly::<Clazz>::from_mut(&mut instance);
        poly.emplace(Impl { value: 9 });
        poly.incr();
        assert_eq!(poly.get(), 10);
    }
    assert_eq!(instance.value, 5);

    drop(counted);
    assert_eq!(drops.get(), 1);
}

#[test]
fn test_emplace_changes_type() {
    let mut poly = Poly::<Clazz>::new(Impl { value: 2 });
    let impl_table = poly.vtable().unwrap();

    poly.emplace(Wide::default());

    assert_eq!(poly.type_info(), Some(TypeInfo::of::<Wide>()));
    assert_eq!(poly.ownership(), Some(Ownership::Boxed));
    assert!(!std::ptr::eq(impl_table, poly.vtable().unwrap()));
    assert_eq!(poly.get(), 0);

    poly.emplace_with(|| Impl { value: 11 });
    assert_eq!(poly.type_info(), Some(TypeInfo::of::<Impl>()));
    assert!(std::ptr::eq(impl_table, poly.vtable().unwrap()));
    assert_eq!(poly.get(), 11);
}

#[test]
fn test_boxed_value() {
    let mut poly = Poly::<Clazz>::new(Wide::default());

    assert_eq!(poly.ownership(), Some(Ownership::Boxed));
    poly.set(3);
    poly.set(4);
    poly.incr();
    assert_eq!(poly.get(), 5);
    assert_eq!(poly.mul(2), 10.0);
    assert_eq!(
        poly.downcast_ref::<Wide>().map(|wide| wide.history),
        Some([3, 0, 0, 0])
    );

    let copy = poly.try_clone().unwrap();
    assert_eq!(copy.ownership(), Some(Ownership::Boxed));
    assert_eq!(copy.get(), 5);
}

#[test]
fn test_swap_exchanges_everything() {
    let mut instance = Impl { value: 20 };
    let mut left = Poly::<Clazz>::new(Wide::default());
    let mut right = Poly::<Clazz>::from_mut(&mut instance);

    left.swap(&mut right);

    assert_eq!(left.ownership(), Some(Ownership::Exclusive));
    assert_eq!(left.get(), 20);
    assert_eq!(right.ownership(), Some(Ownership::Boxed));
    assert_eq!(right.type_info(), Some(TypeInfo::of::<Wide>()));

    let mut empty = Poly::<Clazz>::empty();
    left.swap(&mut empty);
    assert!(!left.has_value());
    assert!(left.vtable().is_none());
    assert_eq!(empty.get(), 20);
}

#[test]
fn test_drop_counts() {
    let drops = Rc::new(Cell::new(0));

    let mut poly = Poly::<Clazz>::new(Counted {
        drops: drops.clone(),
    });
    let copy = poly.try_clone().unwrap();
    assert_eq!(drops.get(), 0);

    poly.emplace(Impl::default());
    assert_eq!(drops.get(), 1);

    drop(copy);
    assert_eq!(drops.get(), 2);

    let counted = Counted {
        drops: drops.clone(),
    };
    let alias = Poly::<Clazz>::from_ref(&counted);
    assert_eq!(alias.get(), 2);
    drop(alias.try_clone());
    drop(alias);
    assert_eq!(drops.get(), 2);

    let mut owned = Poly::<Clazz>::new(counted);
    let taken = owned.take();
    drop(owned);
    assert_eq!(drops.get(), 2);
    drop(taken);
    assert_eq!(drops.get(), 3);
}

#[test]
fn test_into_inner() {
    let poly = Poly::<Clazz>::new(Impl { value: 6 });
    let poly = poly.into_inner::<Wide>().unwrap_err();
    assert_eq!(poly.into_inner::<Impl>().ok(), Some(Impl { value: 6 }));

    let instance = Impl::default();
    let alias = Poly::<Clazz>::from_ref(&instance);
    assert!(alias.into_inner::<Impl>().is_err());
}

#[test]
fn test_index_calls_match_named_calls() {
    let mut poly = Poly::<Clazz>::new(Impl::default());
    poly.call_mut::<1>((9,));
    assert_eq!(poly.call::<2>(()), poly.get());
    assert_eq!(poly.call_mut::<4>((2,)), 18.0);
}

#[test]
fn test_poly_is_not_thread_safe() {
    static_assertions::assert_not_impl_any!(Poly<'static, Clazz>: Send, Sync, Clone);
    static_assertions::assert_impl_all!(Vtable<Clazz>: Send, Sync);
}
