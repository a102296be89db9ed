use super::{InjectorError, InstantiateErrorKind};

#[derive(thiserror::Error, Debug)]
pub(crate) enum InstantiatorErrorKind {
    #[error(transparent)]
    Deps(InjectorError),
    #[error(transparent)]
    Factory(InstantiateErrorKind),
}
