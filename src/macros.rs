/// Declares a concept from a list of method signatures.
///
/// The macro takes a concept name, the name of an extension trait, and one
/// method declaration per slot. Each declaration becomes one slot, in order:
/// methods taking `&mut self` become [`Mut`](crate::Mut) slots, methods taking
/// `&self` become [`Ref`](crate::Ref) slots. The macro expands to:
///
/// - a unit struct implementing [`Concept`](crate::Concept),
/// - the extension trait, declaring the methods,
/// - an implementation of the extension trait for [`Poly`](crate::Poly) that
///   routes each method to its slot.
///
/// Attributes and doc comments on the concept are placed on the struct, and
/// those on methods on the trait methods.
///
/// # Examples
///
/// ```
/// use polycall::{Fulfill, Poly, Vtable, build_vtable, concept};
///
/// concept! {
///     /// A counter that can be stepped and inspected.
///     pub Counter: CounterOps {
///         /// Adds one.
///         fn incr(&mut self);
///         fn set(&mut self, value: i32);
///         fn get(&self) -> i32;
///     }
/// }
///
/// #[derive(Clone, Default)]
/// struct Simple(i32);
///
/// impl Simple {
///     fn incr(&mut self) {
///         self.0 += 1;
///     }
/// }
///
/// impl Fulfill<Counter> for Simple {
///     fn vtable() -> &'static Vtable<Counter> {
///         build_vtable::<Counter, Self, _, _>((
///             Self::incr,
///             |this: &mut Self, value: i32| this.0 = value,
///             |this: &Self| this.0,
///         ))
///     }
/// }
///
/// let mut counter = Poly::<Counter>::new(Simple::default());
/// counter.set(41);
/// counter.incr();
/// assert_eq!(counter.get(), 42);
/// ```
///
/// Slots are numbered from zero in declaration order, so the generated
/// `get` is equivalent to `counter.call::<2>(())`.
#[macro_export]
macro_rules! concept {
    (
        @munch $meta:tt $vis:tt $name:tt $ops:tt [$idx:expr]
        [$($slots:tt)*] [$($items:tt)*] [$($impls:tt)*];
        $(#[$m:meta])*
        fn $method:ident(&mut self $(, $arg:ident : $ty:ty)* $(,)?) $(-> $ret:ty)?;
        $($rest:tt)*
    ) => {
        $crate::concept!(
            @munch $meta $vis $name $ops [$idx + 1]
            [$($slots)* $crate::Mut<fn($($ty),*) $(-> $ret)?>,]
            [$($items)* $(#[$m])* fn $method(&mut self $(, $arg: $ty)*) $(-> $ret)?;]
            [$($impls)*
                #[inline]
                #[track_caller]
                fn $method(&mut self $(, $arg: $ty)*) $(-> $ret)? {
                    self.call_mut::<{ $idx }>(($($arg,)*))
                }
            ];
            $($rest)*
        );
    };

    (
        @munch $meta:tt $vis:tt $name:tt $ops:tt [$idx:expr]
        [$($slots:tt)*] [$($items:tt)*] [$($impls:tt)*];
        $(#[$m:meta])*
        fn $method:ident(&self $(, $arg:ident : $ty:ty)* $(,)?) $(-> $ret:ty)?;
        $($rest:tt)*
    ) => {
        $crate::concept!(
            @munch $meta $vis $name $ops [$idx + 1]
            [$($slots)* $crate::Ref<fn($($ty),*) $(-> $ret)?>,]
            [$($items)* $(#[$m])* fn $method(&self $(, $arg: $ty)*) $(-> $ret)?;]
            [$($impls)*
                #[inline]
                #[track_caller]
                fn $method(&self $(, $arg: $ty)*) $(-> $ret)? {
                    self.call::<{ $idx }>(($($arg,)*))
                }
            ];
            $($rest)*
        );
    };

    (
        @munch [$(#[$meta:meta])*] [$vis:vis] [$name:ident] [$ops:ident] [$idx:expr]
        [$($slots:tt)*] [$($items:tt)*] [$($impls:tt)*];
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
        $vis struct $name;

        impl $crate::Concept for $name {
            type Slots = ($($slots)*);
        }

        #[doc = concat!("Named operations of the [`", stringify!($name), "`] concept.")]
        $vis trait $ops {
            $($items)*
        }

        impl $ops for $crate::Poly<'_, $name> {
            $($impls)*
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis $name:ident : $ops:ident {
            $($body:tt)*
        }
    ) => {
        $crate::concept!(
            @munch [$(#[$meta])*] [$vis] [$name] [$ops] [0usize] [] [] [];
            $($body)*
        );
    };
}
