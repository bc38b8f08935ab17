//! Wrappers over a concept declared by implementing `Concept` directly.

use polycall::{
    Concept, Fulfill, Mut, Ownership, Poly, Ref, SlotList, TypeInfo, Vtable, build_vtable,
};

struct Defined;

impl Concept for Defined {
    type Slots = (
        Mut<fn()>,
        Mut<fn(i32)>,
        Ref<fn() -> i32>,
        Mut<fn()>,
        Mut<fn(i32) -> f64>,
    );
}

trait DefinedOps {
    fn incr(&mut self);
    fn set(&mut self, value: i32);
    fn get(&self) -> i32;
    fn decr(&mut self);
    fn mul(&mut self, factor: i32) -> f64;
}

impl DefinedOps for Poly<'_, Defined> {
    fn incr(&mut self) {
        self.call_mut::<0>(());
    }

    fn set(&mut self, value: i32) {
        self.call_mut::<1>((value,));
    }

    fn get(&self) -> i32 {
        self.call::<2>(())
    }

    fn decr(&mut self) {
        self.call_mut::<3>(());
    }

    fn mul(&mut self, factor: i32) -> f64 {
        self.call_mut::<4>((factor,))
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

    fn decrement(&mut self) {
        self.value -= 1;
    }

    fn multiply(&self, factor: f64) -> f64 {
        factor * f64::from(self.value)
    }
}

impl Fulfill<Defined> for Impl {
    fn vtable() -> &'static Vtable<Defined> {
        build_vtable::<Defined, Self, _, _>((
            Self::incr,
            Self::set,
            Self::get,
            |this: &mut Self| this.decrement(),
            |this: &mut Self, factor: f64| this.multiply(factor),
        ))
    }
}

/// Bound entirely through free functions taking the object explicitly.
#[derive(Clone, Copy, Debug, Default)]
struct Free(i16);

fn free_incr(this: &mut Free) {
    this.0 += 1;
}

fn free_set(this: &mut Free, value: i32) {
    this.0 = i16::try_from(value).unwrap_or(i16::MAX);
}

fn free_get(this: &Free) -> i16 {
    this.0
}

impl Fulfill<Defined> for Free {
    fn vtable() -> &'static Vtable<Defined> {
        build_vtable::<Defined, Self, _, _>((
            free_incr,
            free_set,
            free_get,
            |this: &mut Self| this.0 -= 1,
            |this: &Self, factor: i32| i32::from(this.0) * factor,
        ))
    }
}

#[test]
fn test_slot_count() {
    assert_eq!(<<Defined as Concept>::Slots as SlotList>::LEN, 5);
    assert_eq!(Impl::vtable().len(), 5);
    assert!(!Impl::vtable().is_empty());
}

#[test]
fn test_functionalities() {
    let mut instance = Impl::default();
    let instance_address = (&raw const instance).cast::<()>();

    let mut empty = Poly::<Defined>::empty();
    let in_place = Poly::<Defined>::new_with(|| Impl { value: 3 });
    let alias = Poly::<Defined>::from_mut(&mut instance);
    let value = Poly::<Defined>::new(Impl::default());

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
    assert_eq!(empty.get(), 0);

    empty.emplace(Impl { value: 3 });

    assert!(empty.has_value());
    assert_eq!(empty.get(), 3);

    let reference = in_place.alias();

    assert_eq!(reference.data(), in_place.data());
    assert_eq!(reference.ownership(), Some(Ownership::Shared));
    assert_eq!(reference.get(), 3);

    let mut null = Poly::<Defined>::empty();
    empty.swap(&mut null);

    assert!(!empty.has_value());
    assert!(null.has_value());

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
    let mut poly = Poly::<Defined>::new(Impl::default());

    assert_eq!(poly.downcast_ref::<Impl>(), Some(&Impl { value: 0 }));
    assert_eq!(poly.get(), 0);

    poly.set(1);
    poly.incr();

    assert_eq!(poly.downcast_ref::<Impl>(), Some(&Impl { value: 2 }));
    assert_eq!(poly.get(), 2);
    assert_eq!(poly.mul(3), 6.0);

    poly.decr();

    assert_eq!(poly.downcast_ref::<Impl>(), Some(&Impl { value: 1 }));
    assert_eq!(poly.get(), 1);
    assert_eq!(poly.mul(3), 3.0);
}

#[test]
fn test_alias() {
    let mut instance = Impl::default();
    {
        let mut poly = Poly::<Defined>::from_mut(&mut instance);

        assert_eq!(poly.get(), 0);

        poly.set(1);
        poly.incr();

        assert_eq!(poly.downcast_mut::<Impl>().map(|instance| instance.value), Some(2));
        assert_eq!(poly.get(), 2);
        assert_eq!(poly.mul(3), 6.0);

        poly.decr();

        assert_eq!(poly.get(), 1);
        assert_eq!(poly.mul(3), 3.0);
    }
    assert_eq!(instance, Impl { value: 1 });
}

#[test]
fn test_free_function_bindings() {
    let mut poly = Poly::<Defined>::new(Free::default());

    poly.set(40);
    poly.incr();
    poly.incr();
    poly.decr();

    assert_eq!(poly.get(), 41);
    assert_eq!(poly.mul(2), 82.0);

    poly.set(i32::MAX);
    assert_eq!(poly.get(), i32::from(i16::MAX));
}

#[test]
fn test_heterogeneous_collection() {
    let mut first = Impl { value: 10 };
    let mut items = vec![
        Poly::<Defined>::new(Impl { value: 1 }),
        Poly::<Defined>::new(Free(2)),
        Poly::<Defined>::from_mut(&mut first),
    ];

    for item in &mut items {
        item.incr();
    }

    let values = items.iter().map(DefinedOps::get).collect::<Vec<_>>();
    assert_eq!(values, [2, 3, 11]);

    drop(items);
    assert_eq!(first.value, 11);
}
