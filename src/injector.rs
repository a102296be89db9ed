use alloc::{collections::BTreeSet, sync::Arc, vec::Vec};
use core::{
    any::{type_name, TypeId},
    marker::PhantomData,
};
use tracing::{debug, debug_span, error, info_span};

use crate::{
    any::{Instance, Svc, Type},
    cache::SingletonCache,
    compiler::FactoryCompiler,
    config::Config,
    context::Context,
    dependency_resolver::Dependency,
    errors::InjectorError,
    instantiator::Constructor,
    member::{into_member, upsert, MemberInjector, MemberSelector, MembersBinding, Slot, ValueSource},
    metadata::{identity, upcast, Injectable, Resolvable, Upcast},
    registry::{Binding, Origin, Registry},
    ErrorKind,
};

/// Dependency injection container.
///
/// Cloning yields another handle to the same container. Separately created injectors share nothing.
///
/// # Examples
/// ```rust
/// use wirekit::{injectable, Descriptor, Inject, Injectable, Injector, Svc};
///
/// struct Config;
///
/// impl Injectable for Config {
///     fn describe(descriptor: &mut Descriptor<Self>) {
///         descriptor.constructor(|| Ok(Config));
///     }
/// }
///
/// struct Server(Svc<Config>);
///
/// impl Injectable for Server {
///     fn describe(descriptor: &mut Descriptor<Self>) {
///         descriptor.constructor(|Inject(config): Inject<Config>| Ok(Server(config)));
///     }
/// }
///
/// injectable!(Config, Server);
///
/// let injector = Injector::new();
/// injector.bind::<Config>().unwrap().as_singleton();
///
/// let first = injector.resolve::<Server>().unwrap();
/// let second = injector.resolve::<Server>().unwrap();
/// assert!(!Svc::ptr_eq(&first, &second));
/// assert!(Svc::ptr_eq(&first.0, &second.0));
/// ```
#[derive(Clone, Default)]
pub struct Injector {
    inner: Arc<InjectorInner>,
}

#[derive(Default)]
struct InjectorInner {
    registry: Registry,
    compiler: FactoryCompiler,
    singletons: SingletonCache,
}

impl Injector {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(InjectorInner {
                registry: Registry::new(),
                compiler: FactoryCompiler::new(),
                singletons: SingletonCache::new(),
            }),
        }
    }

    /// Binds `T` to itself, replacing any previous explicit binding of `T`.
    ///
    /// # Errors
    /// Fails if the markers of `T` are invalid, e.g. a value-typed member is marked for injection.
    pub fn bind<T: Injectable>(&self) -> Result<BindingBuilder<'_, T, T>, InjectorError> {
        let span = info_span!("bind", requested = type_name::<T>());
        let _guard = span.enter();

        BindingBuilder::new(self, Type::of::<T>(), identity)
    }

    /// Binds the abstract type `R` to the implementation `I`, replacing any previous explicit binding of `R`
    ///
    /// # Errors
    /// Fails if the markers of `I` are invalid.
    pub fn bind_to<R, I>(&self) -> Result<BindingBuilder<'_, R, I>, InjectorError>
    where
        R: ?Sized + Resolvable + Upcast<I>,
        I: Injectable,
    {
        let span = info_span!("bind", requested = type_name::<R>(), implementation = type_name::<I>());
        let _guard = span.enter();

        BindingBuilder::new(self, Type::of::<R>(), upcast::<R, I>)
    }

    /// Registers explicit member injectors of `T`.
    ///
    /// They apply to every instance of `T` built or injected from now on.
    pub fn register<T: Injectable>(&self, members: MembersBinding<T>) -> &Self {
        self.inner.registry.register_members(TypeId::of::<T>(), members.into_injectors());

        debug!(target_type = type_name::<T>(), "Members registered");
        self
    }

    /// Resolves an instance of `T`.
    ///
    /// # Errors
    /// - [`ErrorKind::NoBindingFound`] if `T` is abstract and neither bound nor marked as implemented by a type.
    /// - [`ErrorKind::RecursionDetected`] if a constructor or member depends on itself, directly or not.
    /// - [`ErrorKind::NoAppropriateConstructor`] and [`ErrorKind::AmbiguousBinding`] if a constructor can't be chosen.
    /// - [`ErrorKind::InstantiationFailed`] if a constructor returned an error.
    pub fn resolve<T: ?Sized + Resolvable>(&self) -> Result<Svc<T>, InjectorError> {
        let ty = Type::of::<T>();

        let span = info_span!("resolve", dependency = ty.name());
        let _guard = span.enter();

        let instance = self.resolve_in(ty, &mut Context::new())?;
        match instance.downcast::<T>() {
            Some(service) => Ok(service),
            None => {
                let err = ErrorKind::IncorrectType.format(&[ty.name(), instance.type_info().name]);
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Resolves an instance of a type known at runtime, the same way [`Self::resolve`] does
    ///
    /// # Errors
    /// See [`Self::resolve`].
    pub fn resolve_type(&self, ty: Type) -> Result<Instance, InjectorError> {
        let span = info_span!("resolve", dependency = ty.name());
        let _guard = span.enter();

        self.resolve_in(ty, &mut Context::new())
    }

    /// Injects the members of an instance the caller constructed.
    ///
    /// Marked members, registered [`MembersBinding`]s and the member injectors of the binding of `T` are applied.
    /// The singleton cache is neither consulted nor updated.
    ///
    /// # Errors
    /// Fails if a member can't be resolved, including a member that depends on itself.
    pub fn inject_members<'a, T: Injectable>(&self, target: &'a mut T) -> Result<&'a mut T, InjectorError> {
        let ty = Type::of::<T>();

        let span = info_span!("inject_members", dependency = ty.name());
        let _guard = span.enter();

        let registry = &self.inner.registry;
        let binding = registry.lookup(ty)?;
        let plan = self.inner.compiler.member_plan(&binding, registry);

        plan.apply(self, &mut Context::new(), ty.info(), &mut *target)?;

        debug!("Members injected");
        Ok(target)
    }

    /// Checks every explicit binding without instantiating anything.
    ///
    /// Constructors are selected and the construction plans of their parameters and member targets
    /// are walked recursively with the same cycle detection as [`Self::resolve`], so a binding
    /// that fails to resolve fails to verify with the same error kind.
    ///
    /// # Errors
    /// Returns the first error found.
    pub fn verify(&self) -> Result<(), InjectorError> {
        let span = info_span!("verify");
        let _guard = span.enter();

        let mut verified = BTreeSet::new();
        for binding in self.inner.registry.explicit_bindings() {
            self.verify_type(binding.requested, &mut Context::new(), &mut verified)?;
        }

        debug!(count = verified.len(), "Verified");
        Ok(())
    }

    fn verify_type(&self, ty: Type, context: &mut Context, verified: &mut BTreeSet<TypeId>) -> Result<(), InjectorError> {
        if verified.contains(&ty.id()) {
            return Ok(());
        }

        let registry = &self.inner.registry;
        let binding = registry.lookup(ty)?;
        let factory = self.inner.compiler.factory(&binding, registry)?;
        let info = binding.implementation.info;

        context.enter_constructor(info)?;
        for dependency in factory.constructor.dependencies.iter() {
            match dependency {
                Dependency::Service(dependency) => self.verify_type(*dependency, context, verified)?,
                Dependency::Value(value) => {
                    let err = ErrorKind::NoBindingFound.format(&[value.name]);
                    error!("{}", err);
                    return Err(err);
                }
            }
        }
        context.leave_constructor(info);

        if !factory.members.injectors.is_empty() {
            context.enter_members(info)?;
            for member in &factory.members.injectors {
                if let ValueSource::Resolve(target) = member.source {
                    self.verify_type(target, context, verified)?;
                }
            }
            context.leave_members(info);
        }

        verified.insert(ty.id());
        Ok(())
    }

    pub(crate) fn resolve_in(&self, ty: Type, context: &mut Context) -> Result<Instance, InjectorError> {
        let span = debug_span!("resolve_in", dependency = ty.name(), depth = context.depth());
        let _guard = span.enter();

        let InjectorInner {
            registry,
            compiler,
            singletons,
        } = &*self.inner;

        let binding = registry.lookup(ty)?;
        let singleton = binding.config.singleton;

        if singleton {
            if let Some(instance) = singletons.get(&ty.id()) {
                debug!("Found in cache");
                return Ok(instance);
            }
            debug!("Not found in cache");
        }

        let factory = compiler.factory(&binding, registry)?;
        let instance = factory.invoke(self, context)?;

        if singleton {
            let instance = singletons.insert(ty.id(), instance);
            debug!("Cached");
            return Ok(instance);
        }
        Ok(instance)
    }
}

/// Explicit binding of the requested type `R` to the implementation `I`.
///
/// Every call commits a new version of the binding, the last one wins.
pub struct BindingBuilder<'a, R: ?Sized, I> {
    injector: &'a Injector,
    binding: Binding,
    _marker: PhantomData<fn() -> (Svc<R>, I)>,
}

impl<'a, R: ?Sized + Resolvable, I: Injectable> BindingBuilder<'a, R, I> {
    fn new(injector: &'a Injector, requested: Type, upcast: fn(Instance) -> Option<Instance>) -> Result<Self, InjectorError> {
        let registry = &injector.inner.registry;
        let implementation = registry.concrete(Type::of::<I>())?;

        let builder = Self {
            injector,
            binding: Binding {
                id: registry.next_id(),
                requested,
                config: Config {
                    singleton: implementation.singleton,
                },
                implementation,
                factory: None,
                members: Vec::new(),
                upcast,
                origin: Origin::Explicit,
            },
            _marker: PhantomData,
        };
        Ok(builder.commit())
    }

    /// Uses `factory` instead of a constructor. Members are still injected into the instances it returns.
    pub fn set_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
    {
        self.binding.factory = Some(Constructor::supplied(factory));
        self.commit()
    }

    pub fn as_singleton(self) -> Self {
        self.with_config(Config::singleton())
    }

    pub fn as_transient(self) -> Self {
        self.with_config(Config::transient())
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.binding.config = config;
        self.commit()
    }

    /// Injects the selected member of `I` with a service resolved from the injector
    ///
    /// # Errors
    /// Fails for value-typed members and for [`crate::Selector::Expression`] selectors.
    pub fn add_property_injector<Sel>(mut self, selector: Sel) -> Result<Self, InjectorError>
    where
        Sel: MemberSelector<I>,
    {
        let member = into_member(selector.into_selector())?;
        upsert(&mut self.binding.members, MemberInjector::resolved(member)?);
        Ok(self.commit())
    }

    /// Injects the selected member of `I` with the value of `supplier`
    ///
    /// # Errors
    /// Fails for value-typed members and for [`crate::Selector::Expression`] selectors.
    pub fn add_property_injector_with<Sel, F>(mut self, selector: Sel, supplier: F) -> Result<Self, InjectorError>
    where
        Sel: MemberSelector<I>,
        F: Fn() -> <Sel::Slot as Slot>::Value + Send + Sync + 'static,
    {
        let member = into_member(selector.into_selector())?;
        upsert(&mut self.binding.members, MemberInjector::supplied(member, supplier)?);
        Ok(self.commit())
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> Config {
        self.binding.config
    }

    fn commit(mut self) -> Self {
        let registry = &self.injector.inner.registry;

        self.binding.id = registry.next_id();
        registry.commit(self.binding.clone());
        self
    }
}
