use alloc::{sync::Arc, vec::Vec};
use core::{
    any::{type_name, Any},
    fmt::{self, Debug, Formatter},
    hash::{Hash, Hasher},
    marker::PhantomData,
    time::Duration,
};
use tracing::error;

use crate::{
    any::{Instance, Svc, Type, TypeInfo},
    errors::InjectorError,
    metadata::{Injectable, Resolvable},
    ErrorKind,
};

/// How the injector treats a member or parameter of a given type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// The member holds a service resolved through the injector
    Service(Type),
    /// The member holds a plain value and can't be injected
    Value(TypeInfo),
}

/// Type of a field that can be targeted by a member injector.
///
/// Service members are declared as `Option<Svc<M>>` and stay `None` until injected.
/// Value types are marked with [`crate::value_type!`].
pub trait Slot: 'static {
    type Value: Send + Sync + 'static;

    fn kind() -> SlotKind;

    fn wrap(value: Self::Value) -> Instance;

    fn unwrap(instance: &Instance) -> Option<Self::Value>;

    fn fill(&mut self, value: Self::Value);
}

impl<M: ?Sized + Resolvable> Slot for Option<Svc<M>> {
    type Value = Svc<M>;

    #[inline]
    fn kind() -> SlotKind {
        SlotKind::Service(Type::of::<M>())
    }

    #[inline]
    fn wrap(value: Self::Value) -> Instance {
        Instance::new(value)
    }

    #[inline]
    fn unwrap(instance: &Instance) -> Option<Self::Value> {
        instance.downcast::<M>()
    }

    #[inline]
    fn fill(&mut self, value: Self::Value) {
        *self = Some(value);
    }
}

value_type!(bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);
value_type!(alloc::string::String, Duration);

/// Identity of a member: its declaring type and its offset in that type.
///
/// The name is kept for messages only, so two fields named alike in a base and a derived type stay distinct.
#[derive(Clone, Copy)]
pub struct MemberRef {
    declaring: TypeInfo,
    name: &'static str,
    offset: usize,
}

impl MemberRef {
    #[inline]
    #[must_use]
    pub const fn declaring(&self) -> TypeInfo {
        self.declaring
    }

    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

impl PartialEq for MemberRef {
    fn eq(&self, other: &Self) -> bool {
        self.declaring == other.declaring && self.offset == other.offset
    }
}

impl Eq for MemberRef {}

impl Hash for MemberRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.declaring.id.hash(state);
        self.offset.hash(state);
    }
}

impl Debug for MemberRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring.short_name(), self.name)
    }
}

/// Field `S` of `T`, usually built with [`crate::member!`]
pub struct Member<T, S> {
    name: &'static str,
    offset: usize,
    access: fn(&mut T) -> &mut S,
}

impl<T, S> Member<T, S> {
    #[inline]
    #[must_use]
    pub const fn new(name: &'static str, offset: usize, access: fn(&mut T) -> &mut S) -> Self {
        Self { name, offset, access }
    }

    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: 'static, S> Member<T, S> {
    #[inline]
    #[must_use]
    pub fn reference(&self) -> MemberRef {
        MemberRef {
            declaring: TypeInfo::of::<T>(),
            name: self.name,
            offset: self.offset,
        }
    }
}

impl<T, S> Clone for Member<T, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, S> Copy for Member<T, S> {}

/// Target of an explicit member injector.
///
/// Only [`Selector::Member`] can be injected. [`Selector::Expression`] stands for
/// an arbitrary computation and is rejected with [`ErrorKind::InvalidMemberExpression`].
pub enum Selector<T, S> {
    Member(Member<T, S>),
    Expression(fn(&T) -> S),
}

impl<T, S> From<Member<T, S>> for Selector<T, S> {
    #[inline]
    fn from(member: Member<T, S>) -> Self {
        Self::Member(member)
    }
}

/// Anything that can name a member of `T`: a [`Member`] or a [`Selector`]
pub trait MemberSelector<T> {
    type Slot: Slot;

    fn into_selector(self) -> Selector<T, Self::Slot>;
}

impl<T, S: Slot> MemberSelector<T> for Member<T, S> {
    type Slot = S;

    #[inline]
    fn into_selector(self) -> Selector<T, S> {
        Selector::Member(self)
    }
}

impl<T, S: Slot> MemberSelector<T> for Selector<T, S> {
    type Slot = S;

    #[inline]
    fn into_selector(self) -> Selector<T, S> {
        self
    }
}

pub(crate) type Supplier = Arc<dyn Fn() -> Instance + Send + Sync>;

pub(crate) type Assign = Arc<dyn Fn(&mut dyn Any, &Instance) -> bool + Send + Sync>;

/// Where the value of an injected member comes from
#[derive(Clone)]
pub(crate) enum ValueSource {
    Resolve(Type),
    Supply(Supplier),
}

impl Debug for ValueSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve(ty) => f.debug_tuple("Resolve").field(ty).finish(),
            Self::Supply(_) => f.write_str("Supply"),
        }
    }
}

/// Erased injector of a single member
#[derive(Clone)]
pub(crate) struct MemberInjector {
    pub(crate) member: MemberRef,
    pub(crate) source: ValueSource,
    assign: Assign,
}

impl MemberInjector {
    fn new<T: 'static, S: Slot>(member: Member<T, S>, source: ValueSource) -> Self {
        let access = member.access;
        Self {
            member: member.reference(),
            source,
            assign: Arc::new(move |target: &mut dyn Any, instance: &Instance| {
                let (Some(target), Some(value)) = (target.downcast_mut::<T>(), S::unwrap(instance)) else {
                    return false;
                };
                access(target).fill(value);
                true
            }),
        }
    }

    /// Injector of a member whose value is resolved from the injector
    pub(crate) fn resolved<T: 'static, S: Slot>(member: Member<T, S>) -> Result<Self, InjectorError> {
        match S::kind() {
            SlotKind::Service(ty) => Ok(Self::new(member, ValueSource::Resolve(ty))),
            SlotKind::Value(_) => Err(non_class_member(&member)),
        }
    }

    /// Injector of a member whose value is produced by `supplier` on every injection
    pub(crate) fn supplied<T, S, F>(member: Member<T, S>, supplier: F) -> Result<Self, InjectorError>
    where
        T: 'static,
        S: Slot,
        F: Fn() -> S::Value + Send + Sync + 'static,
    {
        match S::kind() {
            SlotKind::Service(_) => Ok(Self::new(member, ValueSource::Supply(Arc::new(move || S::wrap(supplier()))))),
            SlotKind::Value(_) => Err(non_class_member(&member)),
        }
    }

    /// Re-targets an injector of a base type `B` to a derived type `T` embedding it
    pub(crate) fn project<T: 'static, B: 'static>(self, project: fn(&mut T) -> &mut B) -> Self {
        let inner = self.assign;
        Self {
            member: self.member,
            source: self.source,
            assign: Arc::new(move |target: &mut dyn Any, instance: &Instance| match target.downcast_mut::<T>() {
                Some(target) => inner(project(target) as &mut dyn Any, instance),
                None => false,
            }),
        }
    }

    #[inline]
    pub(crate) fn assign(&self, target: &mut dyn Any, instance: &Instance) -> bool {
        (self.assign)(target, instance)
    }
}

impl Debug for MemberInjector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberInjector")
            .field("member", &self.member)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

fn non_class_member<T, S>(member: &Member<T, S>) -> InjectorError {
    let err = ErrorKind::UnableToBindNonClassMember.format(&[member.name, type_name::<T>()]);
    error!("{}", err);
    err
}

pub(crate) fn into_member<T, S>(selector: Selector<T, S>) -> Result<Member<T, S>, InjectorError> {
    match selector {
        Selector::Member(member) => Ok(member),
        Selector::Expression(_) => {
            let err = ErrorKind::InvalidMemberExpression.format(&[]);
            error!("{}", err);
            Err(err)
        }
    }
}

/// Replaces the injector of the same member or appends a new one
pub(crate) fn upsert(injectors: &mut Vec<MemberInjector>, injector: MemberInjector) {
    match injectors.iter_mut().find(|existing| existing.member == injector.member) {
        Some(existing) => *existing = injector,
        None => injectors.push(injector),
    }
}

/// Explicit member injectors of `T`, registered with [`crate::Injector::register`].
///
/// They apply to every instance of `T` the injector builds or injects,
/// taking precedence over members marked in [`Injectable::describe`].
pub struct MembersBinding<T> {
    injectors: Vec<MemberInjector>,
    _marker: PhantomData<fn(&mut T)>,
}

impl<T: Injectable> MembersBinding<T> {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            injectors: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Injects the selected member with the value of `supplier`
    pub fn inject_member<Sel, F>(mut self, selector: Sel, supplier: F) -> Result<Self, InjectorError>
    where
        Sel: MemberSelector<T>,
        F: Fn() -> <Sel::Slot as Slot>::Value + Send + Sync + 'static,
    {
        let member = into_member(selector.into_selector())?;
        upsert(&mut self.injectors, MemberInjector::supplied(member, supplier)?);
        Ok(self)
    }

    /// Injects the selected member with a service resolved from the injector
    pub fn inject_member_resolved<Sel>(mut self, selector: Sel) -> Result<Self, InjectorError>
    where
        Sel: MemberSelector<T>,
    {
        let member = into_member(selector.into_selector())?;
        upsert(&mut self.injectors, MemberInjector::resolved(member)?);
        Ok(self)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.injectors.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.injectors.is_empty()
    }

    #[inline]
    pub(crate) fn into_injectors(self) -> Vec<MemberInjector> {
        self.injectors
    }
}

impl<T: Injectable> Default for MembersBinding<T> {
    fn default() -> Self {
        Self::new()
    }
}
