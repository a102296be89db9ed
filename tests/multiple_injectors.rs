use wirekit::{injectable, Descriptor, Injectable, Injector, Svc};
use tracing_test::traced_test;

struct MyClass(u8);

impl Injectable for MyClass {
    fn describe(descriptor: &mut Descriptor<Self>) {
        descriptor.constructor(|| Ok(MyClass(0)));
    }
}

injectable!(MyClass);

#[test]
#[traced_test]
fn test_factories_are_per_injector() {
    let injector1 = Injector::new();
    let injector2 = Injector::new();

    injector1.bind::<MyClass>().unwrap().set_factory(|| MyClass(1));
    injector2.bind::<MyClass>().unwrap().set_factory(|| MyClass(2));

    assert_eq!(injector1.resolve::<MyClass>().unwrap().0, 1);
    assert_eq!(injector2.resolve::<MyClass>().unwrap().0, 2);
    assert_eq!(Injector::new().resolve::<MyClass>().unwrap().0, 0);
}

#[test]
#[traced_test]
fn test_singletons_are_per_injector() {
    let injector1 = Injector::new();
    let injector2 = Injector::new();

    injector1.bind::<MyClass>().unwrap().as_singleton();
    injector2.bind::<MyClass>().unwrap().as_singleton();

    let res1 = injector1.resolve::<MyClass>().unwrap();
    let res2 = injector2.resolve::<MyClass>().unwrap();
    assert!(!Svc::ptr_eq(&res1, &res2));

    // A clone is a handle to the same container
    let res3 = injector1.clone().resolve::<MyClass>().unwrap();
    assert!(Svc::ptr_eq(&res1, &res3));
}
