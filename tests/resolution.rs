use std::{
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

use wirekit::{
    injectable, interface, member, Config, Descriptor, ErrorKind, Inject, Injectable, InjectorError, Injector, Svc, Type,
};
use tracing_test::traced_test;

trait ISingleton: Send + Sync {
    fn calculate(&self) -> usize;
}

trait ITransient: Send + Sync {
    fn calculate(&self) -> usize;
}

struct Singleton;

impl ISingleton for Singleton {
    fn calculate(&self) -> usize {
        1
    }
}

impl Injectable for Singleton {
    fn describe(descriptor: &mut Descriptor<Self>) {
        descriptor.constructor(|| Ok(Singleton));
    }
}

static COUNTED_INSTANCES: AtomicUsize = AtomicUsize::new(0);

struct CountedSingleton;

impl ISingleton for CountedSingleton {
    fn calculate(&self) -> usize {
        1
    }
}

impl Injectable for CountedSingleton {
    fn describe(descriptor: &mut Descriptor<Self>) {
        descriptor.constructor(|| {
            COUNTED_INSTANCES.fetch_add(1, Ordering::SeqCst);
            Ok(CountedSingleton)
        });
    }
}

struct Transient;

impl ITransient for Transient {
    fn calculate(&self) -> usize {
        2
    }
}

impl Injectable for Transient {
    fn describe(descriptor: &mut Descriptor<Self>) {
        descriptor.constructor(|| Ok(Transient));
    }
}

struct Combined {
    first: Svc<dyn ISingleton>,
    second: Svc<dyn ITransient>,
}

impl Injectable for Combined {
    fn describe(descriptor: &mut Descriptor<Self>) {
        descriptor.constructor(|Inject(first): Inject<dyn ISingleton>, Inject(second): Inject<dyn ITransient>| {
            Ok(Combined { first, second })
        });
    }
}

injectable!(Singleton, CountedSingleton, Transient, Combined);
interface!(ISingleton);
interface!(ITransient);

fn injector() -> Injector {
    let injector = Injector::new();
    injector.bind_to::<dyn ISingleton, Singleton>().unwrap().as_singleton();
    injector.bind_to::<dyn ITransient, Transient>().unwrap().as_transient();
    injector.bind::<Combined>().unwrap().with_config(Config::transient());
    injector
}

#[test]
#[traced_test]
fn test_singleton_constructed_once() {
    let injector = Injector::new();
    injector.bind_to::<dyn ISingleton, CountedSingleton>().unwrap().as_singleton();

    let before = COUNTED_INSTANCES.load(Ordering::SeqCst);
    let first = injector.resolve::<dyn ISingleton>().unwrap();
    let second = injector.resolve::<dyn ISingleton>().unwrap();

    assert!(Svc::ptr_eq(&first, &second));
    assert_eq!(first.calculate(), 1);
    assert_eq!(COUNTED_INSTANCES.load(Ordering::SeqCst), before + 1);
}

#[test]
#[traced_test]
fn test_combined() {
    let injector = injector();

    let first = injector.resolve::<Combined>().unwrap();
    let second = injector.resolve::<Combined>().unwrap();

    assert!(!Svc::ptr_eq(&first, &second));
    assert!(Svc::ptr_eq(&first.first, &second.first));
    assert!(!core::ptr::addr_eq(Svc::as_ptr(&first.second), Svc::as_ptr(&second.second)));
    assert_eq!(first.first.calculate() + first.second.calculate(), 3);
}

#[test]
#[traced_test]
fn test_resolve_type() {
    let injector = injector();

    let instance = injector.resolve_type(Type::of::<dyn ISingleton>()).unwrap();
    let service = instance.downcast::<dyn ISingleton>().unwrap();

    assert!(Svc::ptr_eq(&service, &injector.resolve::<dyn ISingleton>().unwrap()));
    assert!(instance.downcast::<Singleton>().is_none());
}

trait Unbound: Send + Sync {}

interface!(Unbound);

#[test]
#[traced_test]
fn test_no_binding_found() {
    let injector = Injector::new();

    let err = injector.resolve::<dyn Unbound>().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::NoBindingFound);
    assert_eq!(err.code(), "IF0001");
    assert_eq!(err.message(), format!("No binding found for {}", core::any::type_name::<dyn Unbound>()));
}

struct NoProperConstructor;

impl Injectable for NoProperConstructor {
    fn describe(descriptor: &mut Descriptor<Self>) {
        descriptor
            .constructor(|_name: String| Ok(NoProperConstructor))
            .constructor(|_retries: u8, _timeout: std::time::Duration| Ok(NoProperConstructor));
    }
}

injectable!(NoProperConstructor);

#[test]
#[traced_test]
fn test_no_proper_constructor() {
    let injector = Injector::new();

    let err = injector.resolve::<NoProperConstructor>().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::NoAppropriateConstructor);
    assert_eq!(err.code(), "IF0005");
}

struct NeedsUnbound(#[allow(dead_code)] Svc<dyn Unbound>);

impl Injectable for NeedsUnbound {
    fn describe(descriptor: &mut Descriptor<Self>) {
        descriptor.constructor(|Inject(unbound): Inject<dyn Unbound>| Ok(NeedsUnbound(unbound)));
    }
}

injectable!(NeedsUnbound);

static VERIFIED_INSTANCES: AtomicUsize = AtomicUsize::new(0);

struct Verified(#[allow(dead_code)] Svc<dyn ISingleton>);

impl Injectable for Verified {
    fn describe(descriptor: &mut Descriptor<Self>) {
        descriptor.constructor(|Inject(singleton): Inject<dyn ISingleton>| {
            VERIFIED_INSTANCES.fetch_add(1, Ordering::SeqCst);
            Ok(Verified(singleton))
        });
    }
}

injectable!(Verified);

#[test]
#[traced_test]
fn test_verify() {
    let injector = injector();
    injector.bind::<Verified>().unwrap();

    injector.verify().unwrap();
    assert_eq!(VERIFIED_INSTANCES.load(Ordering::SeqCst), 0);

    injector.bind::<NeedsUnbound>().unwrap();
    let err = injector.verify().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoBindingFound);
}

#[test]
#[traced_test]
fn test_verify_reports_resolve_error() {
    let injector = Injector::new();
    injector.bind::<NoProperConstructor>().unwrap();

    let verify_err = injector.verify().unwrap_err();
    let resolve_err = injector.resolve::<NoProperConstructor>().err().unwrap();

    assert_eq!(verify_err.code(), "IF0005");
    assert_eq!(verify_err.code(), resolve_err.code());
    assert_eq!(verify_err.message(), resolve_err.message());
}

#[derive(Default)]
struct BrokenMember {
    #[allow(dead_code)]
    broken: Option<Svc<NoProperConstructor>>,
}

impl Injectable for BrokenMember {
    fn describe(descriptor: &mut Descriptor<Self>) {
        descriptor
            .constructor(|| Ok(BrokenMember::default()))
            .inject(member!(BrokenMember, broken));
    }
}

injectable!(BrokenMember);

#[test]
#[traced_test]
fn test_verify_walks_member_targets() {
    let injector = Injector::new();
    injector.bind::<BrokenMember>().unwrap();

    let resolve_err = injector.resolve::<BrokenMember>().err().unwrap();
    let verify_err = injector.verify().unwrap_err();

    assert_eq!(resolve_err.kind(), ErrorKind::NoAppropriateConstructor);
    assert_eq!(verify_err.kind(), resolve_err.kind());
}

#[test]
fn test_error_codes_and_chaining() {
    let cause = ErrorKind::AmbiguousBinding.format(&["foobar"]);
    let err = InjectorError::with_source(ErrorKind::AmbiguousBinding, &["something"], cause);

    assert_eq!(err.code(), "IF0004");
    assert_eq!(err.message(), "Ambiguous binding: something");
    assert_eq!(
        std::error::Error::source(&err).map(ToString::to_string),
        Some(String::from("Ambiguous binding: foobar"))
    );
}

#[test]
#[traced_test]
fn test_concurrent_singleton_resolution() {
    let injector = injector();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let injector = injector.clone();
            thread::spawn(move || injector.resolve::<Combined>().map(|combined| combined.first.clone()))
        })
        .collect();

    let singletons: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().unwrap())
        .collect();

    assert!(singletons.windows(2).all(|pair| Svc::ptr_eq(&pair[0], &pair[1])));
}
