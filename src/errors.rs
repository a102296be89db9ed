mod injector;
mod instantiate;
mod instantiator;
mod kind;

pub use injector::InjectorError;
pub use instantiate::InstantiateErrorKind;
pub(crate) use instantiator::InstantiatorErrorKind;
pub use kind::ErrorKind;
