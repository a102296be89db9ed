use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};
use core::{
    any::TypeId,
    sync::atomic::{AtomicU64, Ordering},
};
use parking_lot::RwLock;
use tracing::{debug, error};

use crate::{
    any::{Instance, Type},
    config::Config,
    errors::InjectorError,
    instantiator::Constructor,
    member::MemberInjector,
    metadata::{identity, Concrete, DescriptorKind, TypeDescriptor},
    ErrorKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Explicit,
    Implicit,
}

/// Effective binding of a requested type.
///
/// Explicit bindings are immutable snapshots: every builder call commits a new one with a fresh `id`.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub(crate) id: u64,
    pub(crate) requested: Type,
    pub(crate) implementation: Arc<Concrete>,
    pub(crate) factory: Option<Constructor>,
    pub(crate) config: Config,
    pub(crate) members: Vec<MemberInjector>,
    pub(crate) upcast: fn(Instance) -> Option<Instance>,
    pub(crate) origin: Origin,
}

#[derive(Default)]
pub(crate) struct Registry {
    explicit: RwLock<BTreeMap<TypeId, Arc<Binding>>>,
    implicit: RwLock<BTreeMap<TypeId, Arc<Binding>>>,
    descriptors: RwLock<BTreeMap<TypeId, TypeDescriptor>>,
    members: RwLock<BTreeMap<TypeId, Vec<MemberInjector>>>,
    members_revision: AtomicU64,
    next_id: AtomicU64,
}

impl Registry {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Descriptor of `ty`, computed once per registry
    pub(crate) fn descriptor(&self, ty: Type) -> Result<TypeDescriptor, InjectorError> {
        if let Some(descriptor) = self.descriptors.read().get(&ty.id()) {
            return Ok(descriptor.clone());
        }

        let descriptor = ty.describe()?;
        Ok(self.descriptors.write().entry(ty.id()).or_insert(descriptor).clone())
    }

    /// Concrete metadata of `ty`, failing for abstract types
    pub(crate) fn concrete(&self, ty: Type) -> Result<Arc<Concrete>, InjectorError> {
        match self.descriptor(ty)?.kind() {
            DescriptorKind::Concrete(concrete) => Ok(concrete.clone()),
            DescriptorKind::Contract { .. } => {
                let err = ErrorKind::NoBindingFound.format(&[ty.name()]);
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Replaces the explicit binding of the requested type
    pub(crate) fn commit(&self, binding: Binding) -> Arc<Binding> {
        debug_assert_eq!(binding.origin, Origin::Explicit);

        let binding = Arc::new(binding);
        self.explicit.write().insert(binding.requested.id(), binding.clone());

        debug!(requested = binding.requested.name(), id = binding.id, "Binding committed");
        binding
    }

    #[inline]
    #[must_use]
    pub(crate) fn explicit(&self, ty: &TypeId) -> Option<Arc<Binding>> {
        self.explicit.read().get(ty).cloned()
    }

    /// Snapshot of all explicit bindings
    #[must_use]
    pub(crate) fn explicit_bindings(&self) -> Vec<Arc<Binding>> {
        self.explicit.read().values().cloned().collect()
    }

    /// Effective binding of `ty`: explicit binding, then the "implemented by" marker, then the type itself
    pub(crate) fn lookup(&self, ty: Type) -> Result<Arc<Binding>, InjectorError> {
        if let Some(binding) = self.explicit(&ty.id()) {
            return Ok(binding);
        }
        if let Some(binding) = self.implicit.read().get(&ty.id()) {
            return Ok(binding.clone());
        }

        let binding = self.implicit_binding(ty)?;
        let binding = self.implicit.write().entry(ty.id()).or_insert_with(|| Arc::new(binding)).clone();

        debug!(requested = ty.name(), implementation = binding.implementation.info.name, "Implicit binding");
        Ok(binding)
    }

    fn implicit_binding(&self, ty: Type) -> Result<Binding, InjectorError> {
        let (implementation, upcast) = match self.descriptor(ty)?.kind() {
            DescriptorKind::Concrete(concrete) => (concrete.clone(), identity as fn(Instance) -> Option<Instance>),
            DescriptorKind::Contract {
                implemented_by: Some(implementation),
            } => (self.concrete(implementation.ty)?, implementation.upcast),
            DescriptorKind::Contract { implemented_by: None } => {
                let err = ErrorKind::NoBindingFound.format(&[ty.name()]);
                error!("{}", err);
                return Err(err);
            }
        };

        Ok(Binding {
            id: self.next_id(),
            requested: ty,
            config: Config {
                singleton: implementation.singleton,
            },
            implementation,
            factory: None,
            members: Vec::new(),
            upcast,
            origin: Origin::Implicit,
        })
    }

    /// Appends explicit member injectors of `ty`, replacing earlier ones for the same members
    pub(crate) fn register_members(&self, ty: TypeId, injectors: Vec<MemberInjector>) {
        {
            let mut members = self.members.write();
            let registered = members.entry(ty).or_default();
            for injector in injectors {
                crate::member::upsert(registered, injector);
            }
        }
        self.members_revision.fetch_add(1, Ordering::AcqRel);
    }

    #[must_use]
    pub(crate) fn members(&self, ty: &TypeId) -> Vec<MemberInjector> {
        self.members.read().get(ty).cloned().unwrap_or_default()
    }

    #[inline]
    #[must_use]
    pub(crate) fn members_revision(&self) -> u64 {
        self.members_revision.load(Ordering::Acquire)
    }
}
