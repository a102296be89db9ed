use alloc::{string::String, sync::Arc};
use core::{
    any::{type_name, Any, TypeId},
    cmp::Ordering,
    fmt::{self, Debug, Formatter},
};

use crate::{errors::InjectorError, metadata::Resolvable, TypeDescriptor};

/// Shared pointer to a resolved service
pub type Svc<T> = Arc<T>;

#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub name: &'static str,
    pub id: TypeId,
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl TypeInfo {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    /// Type name with module paths stripped from every path segment, generic arguments included
    #[must_use]
    pub fn short_name(&self) -> String {
        let mut short = String::with_capacity(self.name.len());
        let mut segment = 0;
        let mut rest = self.name;

        while let Some(ch) = rest.chars().next() {
            if let Some(after) = rest.strip_prefix("::") {
                short.truncate(segment);
                rest = after;
                continue;
            }
            short.push(ch);
            if !(ch.is_alphanumeric() || ch == '_') {
                segment = short.len();
            }
            rest = &rest[ch.len_utf8()..];
        }
        short
    }
}

/// Runtime handle of a requestable type.
///
/// It's the non-generic counterpart of a type parameter: [`crate::Injector::resolve_type`] accepts it
/// and behaves exactly like [`crate::Injector::resolve`] with the same type.
#[derive(Clone, Copy)]
pub struct Type {
    info: TypeInfo,
    descriptor: fn() -> Result<TypeDescriptor, InjectorError>,
}

impl Type {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + Resolvable>() -> Self {
        Self {
            info: TypeInfo::of::<T>(),
            descriptor: T::descriptor,
        }
    }

    #[inline]
    #[must_use]
    pub const fn info(&self) -> TypeInfo {
        self.info
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.info.id
    }

    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.info.name
    }

    #[inline]
    pub(crate) fn describe(&self) -> Result<TypeDescriptor, InjectorError> {
        (self.descriptor)()
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info
    }
}

impl Eq for Type {}

impl Debug for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Type").field(&self.info.name).finish()
    }
}

/// Type-erased resolved service.
///
/// Holds a `Svc<T>` of the type it was created for, so [`Instance::downcast`] returns the same pointer
/// the injector cached or constructed.
#[derive(Clone)]
pub struct Instance {
    type_info: TypeInfo,
    address: usize,
    value: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    #[inline]
    #[must_use]
    pub fn new<T: ?Sized + Send + Sync + 'static>(service: Svc<T>) -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            address: Arc::as_ptr(&service) as *const () as usize,
            value: Arc::new(service),
        }
    }

    #[inline]
    #[must_use]
    pub fn downcast<T: ?Sized + 'static>(&self) -> Option<Svc<T>> {
        self.value.downcast_ref::<Svc<T>>().cloned()
    }

    #[inline]
    #[must_use]
    pub const fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    /// Returns `true` if both instances point to the same service
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.type_info.name)
            .field("address", &self.address)
            .finish()
    }
}
