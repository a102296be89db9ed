use alloc::{collections::BTreeMap, format, sync::Arc, vec::Vec};
use core::{
    any::{Any, TypeId},
    mem,
};
use parking_lot::RwLock;
use tracing::{debug, error};

use crate::{
    any::{Instance, Type, TypeInfo},
    context::Context,
    errors::{InjectorError, InstantiatorErrorKind},
    injector::Injector,
    instantiator::{Constructed, Constructor, Request},
    member::{upsert, MemberInjector, ValueSource},
    metadata::Concrete,
    registry::{Binding, Registry},
    service::Service as _,
    ErrorKind,
};

/// Member injectors of a binding, merged by precedence
#[derive(Debug)]
pub(crate) struct MemberPlan {
    binding_id: u64,
    members_revision: u64,
    pub(crate) injectors: Vec<MemberInjector>,
}

impl MemberPlan {
    /// Marked members, then registered member bindings, then binding-level injectors
    fn merge(binding: &Binding, registry: &Registry, members_revision: u64) -> Self {
        let mut injectors = binding.implementation.members.clone();
        for injector in registry.members(&binding.implementation.info.id) {
            upsert(&mut injectors, injector);
        }
        for injector in &binding.members {
            upsert(&mut injectors, injector.clone());
        }

        Self {
            binding_id: binding.id,
            members_revision,
            injectors,
        }
    }

    #[inline]
    fn is_current(&self, binding: &Binding, members_revision: u64) -> bool {
        self.binding_id == binding.id && self.members_revision == members_revision
    }

    /// Injects every member of `target`, pushing a member frame for `info` while dependencies are resolved
    pub(crate) fn apply(
        &self,
        injector: &Injector,
        context: &mut Context,
        info: TypeInfo,
        target: &mut dyn Any,
    ) -> Result<(), InjectorError> {
        if self.injectors.is_empty() {
            return Ok(());
        }

        context.enter_members(info)?;
        for member in &self.injectors {
            let value = match &member.source {
                ValueSource::Resolve(ty) => injector.resolve_in(*ty, context)?,
                ValueSource::Supply(supplier) => supplier(),
            };

            if !member.assign(target, &value) {
                let err = ErrorKind::IncorrectType.format(&[member.member.name(), value.type_info().name]);
                error!("{}", err);
                return Err(err);
            }
            debug!(member = member.member.name(), "Member injected");
        }
        context.leave_members(info);

        Ok(())
    }
}

/// Ready-to-call factory of a requested type
#[derive(Debug)]
pub(crate) struct CompiledFactory {
    binding_id: u64,
    members_revision: u64,
    pub(crate) requested: Type,
    pub(crate) implementation: TypeInfo,
    pub(crate) constructor: Constructor,
    pub(crate) members: Arc<MemberPlan>,
    seal: fn(Constructed) -> Option<Instance>,
    upcast: fn(Instance) -> Option<Instance>,
}

impl CompiledFactory {
    /// Constructs, injects members, then converts the instance to the requested type
    pub(crate) fn invoke(&self, injector: &Injector, context: &mut Context) -> Result<Instance, InjectorError> {
        let info = self.implementation;

        context.enter_constructor(info)?;

        let mut instantiator = self.constructor.instantiator.clone();
        let (mut constructed, returned) = match instantiator.call(Request::new(injector.clone(), mem::take(context))) {
            Ok(response) => response,
            Err(InstantiatorErrorKind::Deps(err)) => return Err(err),
            Err(InstantiatorErrorKind::Factory(err)) => {
                let err = InjectorError::with_source(ErrorKind::InstantiationFailed, &[info.name], err);
                error!("{}", err);
                return Err(err);
            }
        };
        *context = returned;
        context.leave_constructor(info);

        self.members.apply(injector, context, info, &mut *constructed)?;

        let Some(instance) = (self.seal)(constructed).and_then(self.upcast) else {
            let err = ErrorKind::IncorrectType.format(&[self.requested.name(), info.name]);
            error!("{}", err);
            return Err(err);
        };
        Ok(instance)
    }
}

/// Compiles bindings into factories and caches them per requested type.
///
/// Cached entries are stamped with the binding id and the member registration revision,
/// so re-binding or registering members recompiles on the next call.
#[derive(Default)]
pub(crate) struct FactoryCompiler {
    factories: RwLock<BTreeMap<TypeId, Arc<CompiledFactory>>>,
    member_plans: RwLock<BTreeMap<TypeId, Arc<MemberPlan>>>,
}

impl FactoryCompiler {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn factory(&self, binding: &Binding, registry: &Registry) -> Result<Arc<CompiledFactory>, InjectorError> {
        let members_revision = registry.members_revision();

        let cached = self.factories.read().get(&binding.requested.id()).cloned();
        if let Some(factory) = cached {
            if factory.binding_id == binding.id && factory.members_revision == members_revision {
                debug!("Found compiled factory");
                return Ok(factory);
            }
        }

        let constructor = match &binding.factory {
            Some(factory) => factory.clone(),
            None => select_constructor(&binding.implementation)?.clone(),
        };

        let factory = Arc::new(CompiledFactory {
            binding_id: binding.id,
            members_revision,
            requested: binding.requested,
            implementation: binding.implementation.info,
            constructor,
            members: self.member_plan(binding, registry),
            seal: binding.implementation.seal,
            upcast: binding.upcast,
        });
        self.factories.write().insert(binding.requested.id(), factory.clone());

        debug!(
            requested = binding.requested.name(),
            implementation = binding.implementation.info.name,
            origin = ?binding.origin,
            overridden = binding.factory.is_some(),
            "Factory compiled"
        );
        Ok(factory)
    }

    pub(crate) fn member_plan(&self, binding: &Binding, registry: &Registry) -> Arc<MemberPlan> {
        let members_revision = registry.members_revision();

        let cached = self.member_plans.read().get(&binding.requested.id()).cloned();
        if let Some(plan) = cached {
            if plan.is_current(binding, members_revision) {
                return plan;
            }
        }

        let plan = Arc::new(MemberPlan::merge(binding, registry, members_revision));
        self.member_plans.write().insert(binding.requested.id(), plan.clone());
        plan
    }
}

/// The inject constructor if there is one, otherwise the only constructor whose parameters are all services
pub(crate) fn select_constructor(concrete: &Concrete) -> Result<&Constructor, InjectorError> {
    let mut marked = concrete.constructors.iter().filter(|constructor| constructor.marked);
    match (marked.next(), marked.next()) {
        (Some(constructor), None) => return Ok(constructor),
        (Some(_), Some(_)) => {
            let reason = format!("{} has more than one inject constructor", concrete.info.name);
            let err = ErrorKind::AmbiguousBinding.format(&[&reason]);
            error!("{}", err);
            return Err(err);
        }
        (None, _) => {}
    }

    let mut viable = concrete.constructors.iter().filter(|constructor| constructor.is_viable());
    match (viable.next(), viable.next()) {
        (Some(constructor), None) => Ok(constructor),
        _ => {
            let err = ErrorKind::NoAppropriateConstructor.format(&[concrete.info.name]);
            error!("{}", err);
            Err(err)
        }
    }
}
