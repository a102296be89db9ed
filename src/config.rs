/// Lifecycle config of a binding
/// ## Fields
/// - `singleton`:
///   If `true`, the first constructed instance is cached per requested type and reused for the lifetime of the injector.
///
///   This does **not** affect the dependencies of the instance.
///   Only the final result is cached, keyed by the requested type, not by the implementation type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    pub singleton: bool,
}

impl Config {
    #[inline]
    #[must_use]
    pub const fn singleton() -> Self {
        Self { singleton: true }
    }

    #[inline]
    #[must_use]
    pub const fn transient() -> Self {
        Self { singleton: false }
    }
}
