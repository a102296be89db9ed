use alloc::vec::Vec;
use core::ops::Deref;
use tracing::error;

use crate::{
    any::{Svc, Type, TypeInfo},
    context::Context,
    errors::InjectorError,
    injector::Injector,
    metadata::Resolvable,
    ErrorKind,
};

/// What a constructor parameter asks the injector for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    /// A service resolved through the injector
    Service(Type),
    /// A value-typed parameter the injector can't provide
    Value(TypeInfo),
}

/// A constructor parameter (or a tuple of them) that can be resolved by the injector.
pub trait DependencyResolver: Sized {
    fn resolve(injector: &Injector, context: &mut Context) -> Result<Self, InjectorError>;

    /// Static description of the parameter, used for constructor selection and verification
    #[inline]
    #[must_use]
    fn dependency() -> Option<Dependency> {
        None
    }

    #[doc(hidden)]
    #[inline]
    fn collect_dependencies(dependencies: &mut Vec<Dependency>) {
        dependencies.extend(Self::dependency());
    }
}

/// Service dependency of a constructor.
///
/// Resolved with the same rules as [`Injector::resolve`], sharing the cycle detection frames of the current call.
pub struct Inject<Dep: ?Sized + Resolvable>(pub Svc<Dep>);

impl<Dep: ?Sized + Resolvable> Inject<Dep> {
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Svc<Dep> {
        self.0
    }
}

impl<Dep: ?Sized + Resolvable> Deref for Inject<Dep> {
    type Target = Dep;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<Dep: ?Sized + Resolvable> DependencyResolver for Inject<Dep> {
    fn resolve(injector: &Injector, context: &mut Context) -> Result<Self, InjectorError> {
        let ty = Type::of::<Dep>();
        let instance = injector.resolve_in(ty, context)?;

        match instance.downcast::<Dep>() {
            Some(dependency) => Ok(Self(dependency)),
            None => {
                let err = ErrorKind::IncorrectType.format(&[ty.name(), instance.type_info().name]);
                error!("{}", err);
                Err(err)
            }
        }
    }

    #[inline]
    fn dependency() -> Option<Dependency> {
        Some(Dependency::Service(Type::of::<Dep>()))
    }
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_variables)]
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            #[inline]
            fn resolve(injector: &Injector, context: &mut Context) -> Result<Self, InjectorError> {
                Ok(($($ty::resolve(injector, context)?,)*))
            }

            #[inline]
            fn collect_dependencies(dependencies: &mut Vec<Dependency>) {
                $( $ty::collect_dependencies(dependencies); )*
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);
