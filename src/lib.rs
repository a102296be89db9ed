#![no_std]

extern crate alloc;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod cache;
pub(crate) mod compiler;
pub(crate) mod config;
pub(crate) mod context;
pub(crate) mod dependency_resolver;
pub(crate) mod errors;
pub(crate) mod injector;
pub(crate) mod instantiator;
pub(crate) mod member;
pub(crate) mod metadata;
pub(crate) mod registry;
pub(crate) mod service;

pub use any::{Instance, Svc, Type, TypeInfo};
pub use config::Config;
pub use context::Context;
pub use dependency_resolver::{Dependency, DependencyResolver, Inject};
pub use errors::{ErrorKind, InjectorError, InstantiateErrorKind};
pub use injector::{BindingBuilder, Injector};
pub use instantiator::Instantiator;
pub use member::{Member, MemberRef, MemberSelector, MembersBinding, Selector, Slot, SlotKind};
pub use metadata::{Descriptor, Injectable, Resolvable, TypeDescriptor, Upcast};
