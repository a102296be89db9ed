use alloc::{
    boxed::Box,
    string::{String, ToString as _},
    vec::Vec,
};
use core::error::Error;

use super::ErrorKind;

/// The single error type of the injector.
///
/// Carries the [`ErrorKind`] with its stable code, the arguments substituted into its template,
/// the formatted message and an optional source error.
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct InjectorError {
    kind: ErrorKind,
    args: Vec<String>,
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl InjectorError {
    #[inline]
    #[must_use]
    pub fn new(kind: ErrorKind, args: &[&str]) -> Self {
        Self {
            kind,
            args: args.iter().map(|arg| arg.to_string()).collect(),
            message: kind.message(args),
            source: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_source(kind: ErrorKind, args: &[&str], source: impl Error + Send + Sync + 'static) -> Self {
        Self {
            kind,
            args: args.iter().map(|arg| arg.to_string()).collect(),
            message: kind.message(args),
            source: Some(Box::new(source)),
        }
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Arguments substituted into the message template, e.g. type and member names
    #[inline]
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{ErrorKind, InjectorError};

    use alloc::string::ToString as _;
    use core::error::Error as _;

    #[test]
    fn test_display_uses_template() {
        let err = ErrorKind::AmbiguousBinding.format(&["foobar"]);

        assert_eq!(err.to_string(), ErrorKind::AmbiguousBinding.message(&["foobar"]));
        assert_eq!(err.code(), "IF0004");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_args_kept() {
        let err = ErrorKind::UnableToBindNonClassMember.format(&["count", "Holder"]);

        assert_eq!(err.args(), ["count", "Holder"]);
        assert_eq!(err.kind().template(), "Unable to bind member {0} of {1}: only service members can be injected");
        assert_eq!(err.message(), err.kind().message(&["count", "Holder"]));
    }

    #[test]
    fn test_with_source() {
        let inner = ErrorKind::AmbiguousBinding.format(&["foobar"]);
        let err = InjectorError::with_source(ErrorKind::AmbiguousBinding, &["something"], inner);

        assert_eq!(err.message(), "Ambiguous binding: something");
        assert_eq!(err.source().unwrap().to_string(), "Ambiguous binding: foobar");
    }
}
