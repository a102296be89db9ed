use alloc::{boxed::Box, sync::Arc, vec::Vec};
use core::any::Any;
use tracing::debug;

use crate::{
    context::Context,
    dependency_resolver::{Dependency, DependencyResolver},
    errors::{InstantiateErrorKind, InstantiatorErrorKind},
    injector::Injector,
    service::{service_fn, BoxCloneService},
};

/// Constructor of a service.
///
/// Implemented for closures whose parameters are [`DependencyResolver`]s, e.g.
/// `|Inject(db): Inject<Database>, retries: u32| Ok(Client { db, retries })`.
pub trait Instantiator<Deps>: Clone + Send + Sync + 'static
where
    Deps: DependencyResolver,
{
    type Provides: Send + Sync + 'static;

    fn instantiate(&mut self, dependencies: Deps) -> Result<Self::Provides, InstantiateErrorKind>;
}

pub(crate) struct Request {
    injector: Injector,
    context: Context,
}

impl Request {
    #[inline]
    #[must_use]
    pub(crate) const fn new(injector: Injector, context: Context) -> Self {
        Self { injector, context }
    }
}

pub(crate) type Constructed = Box<dyn Any + Send + Sync>;

pub(crate) type BoxedCloneInstantiator = BoxCloneService<Request, (Constructed, Context), InstantiatorErrorKind>;

#[must_use]
pub(crate) fn boxed_instantiator<Inst, Deps>(instantiator: Inst) -> BoxedCloneInstantiator
where
    Inst: Instantiator<Deps>,
    Deps: DependencyResolver + 'static,
{
    BoxCloneService::new(service_fn(move |Request { injector, mut context }| {
        let dependencies = match Deps::resolve(&injector, &mut context) {
            Ok(dependencies) => dependencies,
            Err(err) => return Err(InstantiatorErrorKind::Deps(err)),
        };
        let provides = match instantiator.clone().instantiate(dependencies) {
            Ok(provides) => provides,
            Err(err) => return Err(InstantiatorErrorKind::Factory(err)),
        };

        debug!("Instantiated");

        Ok((Box::new(provides) as Constructed, context))
    }))
}

/// Erased constructor of an injectable type
#[derive(Debug, Clone)]
pub(crate) struct Constructor {
    pub(crate) marked: bool,
    pub(crate) dependencies: Arc<[Dependency]>,
    pub(crate) instantiator: BoxedCloneInstantiator,
}

impl Constructor {
    #[must_use]
    pub(crate) fn new<Inst, Deps>(instantiator: Inst, marked: bool) -> Self
    where
        Inst: Instantiator<Deps>,
        Deps: DependencyResolver + 'static,
    {
        let mut dependencies = Vec::new();
        Deps::collect_dependencies(&mut dependencies);

        Self {
            marked,
            dependencies: dependencies.into(),
            instantiator: boxed_instantiator(instantiator),
        }
    }

    /// Constructor without container-provided arguments, used for factory overrides
    #[must_use]
    pub(crate) fn supplied<F, T>(supplier: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        let supplier = Arc::new(supplier);
        Self::new(move || Ok::<_, InstantiateErrorKind>(supplier()), true)
    }

    /// A constructor is viable for implicit selection when every parameter can be resolved by the injector
    #[inline]
    #[must_use]
    pub(crate) fn is_viable(&self) -> bool {
        self.dependencies
            .iter()
            .all(|dependency| matches!(dependency, Dependency::Service(_)))
    }
}

macro_rules! impl_instantiator {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Response, $($ty,)*> Instantiator<($($ty,)*)> for F
        where
            F: FnMut($($ty,)*) -> Result<Response, InstantiateErrorKind> + Clone + Send + Sync + 'static,
            Response: Send + Sync + 'static,
            $( $ty: DependencyResolver, )*
        {
            type Provides = Response;

            #[inline]
            fn instantiate(&mut self, ($($ty,)*): ($($ty,)*)) -> Result<Self::Provides, InstantiateErrorKind> {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_instantiator);

#[cfg(test)]
mod tests {
    extern crate std;
    use std::prelude::rust_2021::*;

    use super::{boxed_instantiator, Constructor, Request};
    use crate::{
        context::Context, errors::InstantiatorErrorKind, service::Service as _, Dependency, Descriptor, Inject, Injectable,
        InstantiateErrorKind, Injector, Type, TypeInfo,
    };

    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicU8, Ordering};
    use tracing_test::traced_test;

    struct Request1;

    impl Injectable for Request1 {
        fn describe(descriptor: &mut Descriptor<Self>) {
            descriptor.constructor(|| Ok(Request1));
        }
    }

    injectable!(Request1);

    struct Response1(bool);

    #[test]
    #[traced_test]
    fn test_boxed_instantiator() {
        let call_count = Arc::new(AtomicU8::new(0));

        let mut instantiator = boxed_instantiator({
            let call_count = call_count.clone();
            move |Inject(_request): Inject<Request1>| {
                call_count.fetch_add(1, Ordering::SeqCst);
                Ok(Response1(true))
            }
        });

        let (response, context) = instantiator
            .call(Request::new(Injector::new(), Context::default()))
            .unwrap();

        assert!(response.downcast::<Response1>().unwrap().0);
        assert_eq!(context.depth(), 0);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_factory_error() {
        let mut instantiator = boxed_instantiator(|| {
            Err::<Response1, _>(InstantiateErrorKind::Custom(anyhow::anyhow!("out of connections")))
        });

        let Err(InstantiatorErrorKind::Factory(err)) = instantiator.call(Request::new(Injector::new(), Context::default())) else {
            panic!("factory error expected");
        };
        assert_eq!(alloc::string::ToString::to_string(&err), "out of connections");
    }

    #[test]
    fn test_constructor_dependencies() {
        let constructor = Constructor::new(|Inject(_): Inject<Request1>, _retries: u8| Ok(Response1(false)), false);

        assert!(!constructor.marked);
        assert!(!constructor.is_viable());
        assert_eq!(
            &*constructor.dependencies,
            [Dependency::Service(Type::of::<Request1>()), Dependency::Value(TypeInfo::of::<u8>())]
        );
    }
}
