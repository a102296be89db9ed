#[rustfmt::skip]
macro_rules! all_the_tuples {
    ($name:ident) => {
        $name!([]);
        $name!([T1]);
        $name!([T1, T2]);
        $name!([T1, T2, T3]);
        $name!([T1, T2, T3, T4]);
        $name!([T1, T2, T3, T4, T5]);
        $name!([T1, T2, T3, T4, T5, T6]);
        $name!([T1, T2, T3, T4, T5, T6, T7]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9, T10]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11]);
        $name!([T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12]);
    };
}

/// Implements [`crate::Resolvable`] for concrete types that implement [`crate::Injectable`].
///
/// # Examples
/// ```rust
/// use wirekit::{injectable, Descriptor, Injectable};
///
/// struct Clock;
///
/// impl Injectable for Clock {
///     fn describe(descriptor: &mut Descriptor<Self>) {
///         descriptor.constructor(|| Ok(Clock));
///     }
/// }
///
/// injectable!(Clock);
/// ```
#[macro_export]
macro_rules! injectable {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Resolvable for $ty {
                fn descriptor() -> ::core::result::Result<$crate::TypeDescriptor, $crate::InjectorError> {
                    $crate::TypeDescriptor::concrete::<$ty>()
                }
            }
        )+
    };
}

/// Marks a trait as an abstract type that can be requested from the injector as `dyn Trait`.
///
/// The `Trait => Implementation` form also attaches the "implemented by" marker,
/// so requests for `dyn Trait` without an explicit binding construct `Implementation`.
///
/// The trait must be a subtrait of [`Send`] and [`Sync`].
///
/// # Examples
/// ```rust
/// use wirekit::{injectable, interface, Descriptor, Injectable, Injector};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> &'static str;
/// }
///
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> &'static str {
///         "hello"
///     }
/// }
///
/// impl Injectable for English {
///     fn describe(descriptor: &mut Descriptor<Self>) {
///         descriptor.constructor(|| Ok(English));
///     }
/// }
///
/// injectable!(English);
/// interface!(Greeter => English);
///
/// let injector = Injector::new();
/// assert_eq!(injector.resolve::<dyn Greeter>().unwrap().greet(), "hello");
/// ```
#[macro_export]
macro_rules! interface {
    ($interface:ident) => {
        $crate::interface!(@upcast $interface);

        impl $crate::Resolvable for dyn $interface {
            fn descriptor() -> ::core::result::Result<$crate::TypeDescriptor, $crate::InjectorError> {
                ::core::result::Result::Ok($crate::TypeDescriptor::contract::<Self>())
            }
        }
    };
    ($interface:ident => $implementation:ty) => {
        $crate::interface!(@upcast $interface);

        impl $crate::Resolvable for dyn $interface {
            fn descriptor() -> ::core::result::Result<$crate::TypeDescriptor, $crate::InjectorError> {
                ::core::result::Result::Ok($crate::TypeDescriptor::implemented_by::<Self, $implementation>())
            }
        }
    };
    (@upcast $interface:ident) => {
        impl<T: $interface + 'static> $crate::Upcast<T> for dyn $interface {
            #[inline]
            fn upcast(service: $crate::Svc<T>) -> $crate::Svc<Self> {
                service
            }
        }
    };
}

/// Builds a [`crate::Member`] for a field of a type.
///
/// The member is identified by its declaring type and field offset, the name is only used in messages.
#[macro_export]
macro_rules! member {
    ($ty:ty, $field:ident) => {
        $crate::Member::<$ty, _>::new(
            ::core::stringify!($field),
            ::core::mem::offset_of!($ty, $field),
            |target: &mut $ty| &mut target.$field,
        )
    };
}

/// Marks types as value types.
///
/// Value types can't be injected: members of these types are rejected at bind time
/// and constructors with parameters of these types aren't considered injectable.
#[macro_export]
macro_rules! value_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Slot for $ty {
                type Value = $ty;

                #[inline]
                fn kind() -> $crate::SlotKind {
                    $crate::SlotKind::Value($crate::TypeInfo::of::<$ty>())
                }

                #[inline]
                fn wrap(value: Self::Value) -> $crate::Instance {
                    $crate::Instance::new::<$ty>($crate::Svc::new(value))
                }

                #[inline]
                fn unwrap(instance: &$crate::Instance) -> ::core::option::Option<Self::Value> {
                    instance.downcast::<$ty>().map(|value| ::core::clone::Clone::clone(&*value))
                }

                #[inline]
                fn fill(&mut self, value: Self::Value) {
                    *self = value;
                }
            }

            impl $crate::DependencyResolver for $ty {
                fn resolve(
                    _injector: &$crate::Injector,
                    _context: &mut $crate::Context,
                ) -> ::core::result::Result<Self, $crate::InjectorError> {
                    ::core::result::Result::Err($crate::ErrorKind::NoBindingFound.format(&[::core::any::type_name::<$ty>()]))
                }

                #[inline]
                fn dependency() -> ::core::option::Option<$crate::Dependency> {
                    ::core::option::Option::Some($crate::Dependency::Value($crate::TypeInfo::of::<$ty>()))
                }
            }
        )+
    };
}
