use alloc::{format, sync::Arc, vec::Vec};
use core::{
    any::TypeId,
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
};
use tracing::error;

use crate::{
    any::{Instance, Svc, Type, TypeInfo},
    dependency_resolver::DependencyResolver,
    errors::{ErrorKind, InjectorError},
    instantiator::{Constructed, Constructor, Instantiator},
    member::{Member, MemberInjector, MemberRef, Slot},
};

/// Any type that can be requested from the injector: concrete types and `dyn Trait`.
///
/// Implemented with [`crate::injectable!`] for concrete types and with [`crate::interface!`] for traits.
pub trait Resolvable: Send + Sync + 'static {
    fn descriptor() -> Result<TypeDescriptor, InjectorError>;
}

/// Concrete type the injector knows how to build.
///
/// # Examples
/// ```rust
/// use wirekit::{injectable, member, Descriptor, Inject, Injectable, Injector, Svc};
///
/// struct Database;
///
/// impl Injectable for Database {
///     fn describe(descriptor: &mut Descriptor<Self>) {
///         descriptor.constructor(|| Ok(Database)).singleton();
///     }
/// }
///
/// struct Repository {
///     database: Svc<Database>,
///     audit: Option<Svc<Database>>,
/// }
///
/// impl Injectable for Repository {
///     fn describe(descriptor: &mut Descriptor<Self>) {
///         descriptor
///             .inject_constructor(|Inject(database): Inject<Database>| Ok(Repository { database, audit: None }))
///             .inject(member!(Repository, audit));
///     }
/// }
///
/// injectable!(Database, Repository);
///
/// let injector = Injector::new();
/// let repository = injector.resolve::<Repository>().unwrap();
/// assert!(Svc::ptr_eq(&repository.database, repository.audit.as_ref().unwrap()));
/// ```
pub trait Injectable: Resolvable + Sized {
    fn describe(descriptor: &mut Descriptor<Self>);
}

/// Converts a service of an implementation into a service of an abstract type.
///
/// Implemented for `dyn Trait` by [`crate::interface!`].
pub trait Upcast<S>: Send + Sync + 'static {
    fn upcast(service: Svc<S>) -> Svc<Self>;
}

/// Collects the declarative markers of an [`Injectable`] type
pub struct Descriptor<T> {
    constructors: Vec<Constructor>,
    members: Vec<MemberInjector>,
    bases: Vec<TypeId>,
    singleton: bool,
    error: Option<InjectorError>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Injectable> Descriptor<T> {
    #[inline]
    #[must_use]
    fn new() -> Self {
        Self {
            constructors: Vec::new(),
            members: Vec::new(),
            bases: Vec::new(),
            singleton: false,
            error: None,
            _marker: PhantomData,
        }
    }

    /// Adds a public constructor.
    ///
    /// Without an inject constructor, the single constructor whose parameters can all be resolved is used.
    pub fn constructor<Deps, F>(&mut self, instantiator: F) -> &mut Self
    where
        Deps: DependencyResolver + 'static,
        F: Instantiator<Deps, Provides = T>,
    {
        self.constructors.push(Constructor::new(instantiator, false));
        self
    }

    /// Adds the constructor the injector must use
    pub fn inject_constructor<Deps, F>(&mut self, instantiator: F) -> &mut Self
    where
        Deps: DependencyResolver + 'static,
        F: Instantiator<Deps, Provides = T>,
    {
        self.constructors.push(Constructor::new(instantiator, true));
        self
    }

    /// Marks a member for injection after construction.
    ///
    /// Members of value types are rejected with [`crate::ErrorKind::UnableToBindNonClassMember`]
    /// as soon as the type is bound or resolved.
    pub fn inject<S: Slot>(&mut self, member: Member<T, S>) -> &mut Self {
        match MemberInjector::resolved(member) {
            Ok(injector) => crate::member::upsert(&mut self.members, injector),
            Err(err) => self.fail(err),
        }
        self
    }

    /// Inherits the marked members of an embedded base type.
    ///
    /// Members of the base keep their own identity, so a derived member with the same name doesn't hide them.
    /// A base type can be embedded once, directly or through another base,
    /// otherwise the description fails with [`crate::ErrorKind::AmbiguousBinding`].
    pub fn base<B: Injectable>(&mut self, project: fn(&mut T) -> &mut B) -> &mut Self {
        let mut base = Descriptor::<B>::new();
        B::describe(&mut base);

        if let Some(err) = base.error {
            self.fail(err);
        }
        base.bases.push(TypeId::of::<B>());
        for id in base.bases {
            if self.bases.contains(&id) {
                let reason = format!(
                    "{} embeds {} more than once",
                    TypeInfo::of::<T>().short_name(),
                    TypeInfo::of::<B>().short_name(),
                );
                self.fail(ErrorKind::AmbiguousBinding.format(&[&reason]));
                return self;
            }
            self.bases.push(id);
        }
        for injector in base.members {
            crate::member::upsert(&mut self.members, injector.project(project));
        }
        self
    }

    /// Marks the type as a singleton by default
    pub fn singleton(&mut self) -> &mut Self {
        self.singleton = true;
        self
    }

    fn fail(&mut self, err: InjectorError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

/// Erased metadata of a concrete type
pub(crate) struct Concrete {
    pub(crate) info: TypeInfo,
    pub(crate) singleton: bool,
    pub(crate) constructors: Vec<Constructor>,
    pub(crate) members: Vec<MemberInjector>,
    pub(crate) seal: fn(Constructed) -> Option<Instance>,
}

impl Debug for Concrete {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Concrete")
            .field("info", &self.info.name)
            .field("singleton", &self.singleton)
            .field("constructors", &self.constructors.len())
            .field("members", &self.members)
            .finish()
    }
}

/// "Implemented by" marker of an abstract type
#[derive(Debug, Clone, Copy)]
pub(crate) struct Implementation {
    pub(crate) ty: Type,
    pub(crate) upcast: fn(Instance) -> Option<Instance>,
}

#[derive(Debug, Clone)]
pub(crate) enum DescriptorKind {
    Concrete(Arc<Concrete>),
    Contract { implemented_by: Option<Implementation> },
}

/// Metadata of a requestable type, as seen by the registry
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    info: TypeInfo,
    kind: DescriptorKind,
}

impl TypeDescriptor {
    /// Describes a concrete type, failing if its markers are invalid
    pub fn concrete<T: Injectable>() -> Result<Self, InjectorError> {
        let mut descriptor = Descriptor::<T>::new();
        T::describe(&mut descriptor);

        if let Some(err) = descriptor.error {
            error!("{}", err);
            return Err(err);
        }

        let info = TypeInfo::of::<T>();
        Ok(Self {
            info,
            kind: DescriptorKind::Concrete(Arc::new(Concrete {
                info,
                singleton: descriptor.singleton,
                constructors: descriptor.constructors,
                members: descriptor.members,
                seal: seal::<T>,
            })),
        })
    }

    /// Describes an abstract type without an implementation
    #[must_use]
    pub fn contract<T: ?Sized + Resolvable>() -> Self {
        Self {
            info: TypeInfo::of::<T>(),
            kind: DescriptorKind::Contract { implemented_by: None },
        }
    }

    /// Describes an abstract type implemented by `I` unless bound explicitly
    #[must_use]
    pub fn implemented_by<R, I>() -> Self
    where
        R: ?Sized + Resolvable + Upcast<I>,
        I: Injectable,
    {
        Self {
            info: TypeInfo::of::<R>(),
            kind: DescriptorKind::Contract {
                implemented_by: Some(Implementation {
                    ty: Type::of::<I>(),
                    upcast: upcast::<R, I>,
                }),
            },
        }
    }

    #[inline]
    #[must_use]
    pub const fn info(&self) -> TypeInfo {
        self.info
    }

    /// Type to construct when this one is requested without an explicit binding
    #[must_use]
    pub fn implemented_by_type(&self) -> Option<Type> {
        match &self.kind {
            DescriptorKind::Concrete(_) => None,
            DescriptorKind::Contract { implemented_by } => implemented_by.map(|implementation| implementation.ty),
        }
    }

    #[must_use]
    pub fn is_marked_singleton(&self) -> bool {
        matches!(&self.kind, DescriptorKind::Concrete(concrete) if concrete.singleton)
    }

    #[inline]
    pub fn injectable_members(&self) -> impl Iterator<Item = MemberRef> + '_ {
        let members: &[MemberInjector] = match &self.kind {
            DescriptorKind::Concrete(concrete) => concrete.members.as_slice(),
            DescriptorKind::Contract { .. } => &[],
        };
        members.iter().map(|injector| injector.member)
    }

    #[inline]
    pub(crate) const fn kind(&self) -> &DescriptorKind {
        &self.kind
    }
}

fn seal<T: Send + Sync + 'static>(constructed: Constructed) -> Option<Instance> {
    constructed
        .downcast::<T>()
        .ok()
        .map(|value| Instance::new(Svc::new(*value)))
}

pub(crate) fn upcast<R, I>(instance: Instance) -> Option<Instance>
where
    R: ?Sized + Resolvable + Upcast<I>,
    I: Injectable,
{
    instance.downcast::<I>().map(|service| Instance::new::<R>(R::upcast(service)))
}

#[inline]
pub(crate) fn identity(instance: Instance) -> Option<Instance> {
    Some(instance)
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::prelude::rust_2021::*;

    use super::{DescriptorKind, TypeDescriptor};
    use crate::{Descriptor, ErrorKind, Inject, Injectable, Svc, Type};

    use tracing_test::traced_test;

    trait Sound: Send + Sync {
        fn sound(&self) -> &'static str;
    }

    struct Bell {
        clapper: Option<Svc<Clapper>>,
    }

    impl Sound for Bell {
        fn sound(&self) -> &'static str {
            "ding"
        }
    }

    impl Injectable for Bell {
        fn describe(descriptor: &mut Descriptor<Self>) {
            descriptor
                .constructor(|| Ok(Bell { clapper: None }))
                .inject(member!(Bell, clapper))
                .singleton();
        }
    }

    struct Clapper;

    impl Injectable for Clapper {
        fn describe(descriptor: &mut Descriptor<Self>) {
            descriptor.inject_constructor(|Inject(_bell): Inject<Bell>| Ok(Clapper));
        }
    }

    struct Counter {
        count: u32,
    }

    impl Injectable for Counter {
        fn describe(descriptor: &mut Descriptor<Self>) {
            descriptor.constructor(|| Ok(Counter { count: 0 })).inject(member!(Counter, count));
        }
    }

    #[derive(Default)]
    struct Tower {
        clapper: Option<Svc<Clapper>>,
    }

    impl Injectable for Tower {
        fn describe(descriptor: &mut Descriptor<Self>) {
            descriptor.inject(member!(Tower, clapper));
        }
    }

    #[derive(Default)]
    struct Twins {
        left: Tower,
        right: Tower,
    }

    impl Injectable for Twins {
        fn describe(descriptor: &mut Descriptor<Self>) {
            descriptor
                .constructor(|| Ok(Twins::default()))
                .base(|twins| &mut twins.left)
                .base(|twins| &mut twins.right);
        }
    }

    injectable!(Bell, Clapper, Counter, Tower, Twins);
    interface!(Sound => Bell);

    #[test]
    fn test_concrete_markers() {
        let descriptor = TypeDescriptor::concrete::<Bell>().unwrap();

        assert!(descriptor.is_marked_singleton());
        assert!(descriptor.implemented_by_type().is_none());
        assert_eq!(descriptor.injectable_members().count(), 1);

        let DescriptorKind::Concrete(concrete) = descriptor.kind() else {
            panic!("concrete descriptor expected");
        };
        assert_eq!(concrete.constructors.len(), 1);
        assert!(!concrete.constructors[0].marked);
    }

    #[test]
    fn test_implemented_by_marker() {
        let descriptor = <dyn Sound as crate::Resolvable>::descriptor().unwrap();

        assert_eq!(descriptor.implemented_by_type(), Some(Type::of::<Bell>()));
        assert!(!descriptor.is_marked_singleton());
        assert_eq!(descriptor.injectable_members().count(), 0);
    }

    #[test]
    fn test_value_member_fails_description() {
        let err = TypeDescriptor::concrete::<Counter>().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnableToBindNonClassMember);
        assert!(err.message().contains("count"));
    }

    #[test]
    #[traced_test]
    fn test_base_embedded_twice() {
        let err = TypeDescriptor::concrete::<Twins>().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AmbiguousBinding);
        assert_eq!(err.args(), ["Twins embeds Tower more than once"]);
        assert!(logs_contain("Twins embeds Tower more than once"));
    }

    #[test]
    fn test_upcast() {
        let instance = crate::Instance::new(Svc::new(Bell { clapper: None }));
        let upcasted = super::upcast::<dyn Sound, Bell>(instance.clone()).unwrap();

        assert_eq!(upcasted.downcast::<dyn Sound>().unwrap().sound(), "ding");
        assert!(upcasted.ptr_eq(&instance));
    }
}
