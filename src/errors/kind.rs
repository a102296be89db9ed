use alloc::string::String;
use core::fmt::{self, Display, Formatter};

use super::InjectorError;

/// Kind of an [`InjectorError`].
///
/// Each kind has a stable code and a message template with `{0}`, `{1}`, ... substitution points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoBindingFound,
    RecursionDetected,
    UnableToBindNonClassMember,
    AmbiguousBinding,
    NoAppropriateConstructor,
    InvalidMemberExpression,
    InstantiationFailed,
    IncorrectType,
}

impl ErrorKind {
    #[inline]
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            ErrorKind::NoBindingFound => "IF0001",
            ErrorKind::RecursionDetected => "IF0002",
            ErrorKind::UnableToBindNonClassMember => "IF0003",
            ErrorKind::AmbiguousBinding => "IF0004",
            ErrorKind::NoAppropriateConstructor => "IF0005",
            ErrorKind::InvalidMemberExpression => "IF0006",
            ErrorKind::InstantiationFailed => "IF0007",
            ErrorKind::IncorrectType => "IF0008",
        }
    }

    #[inline]
    #[must_use]
    pub const fn template(&self) -> &'static str {
        match self {
            ErrorKind::NoBindingFound => "No binding found for {0}",
            ErrorKind::RecursionDetected => "Resolution recursion detected while resolving {0}",
            ErrorKind::UnableToBindNonClassMember => "Unable to bind member {0} of {1}: only service members can be injected",
            ErrorKind::AmbiguousBinding => "Ambiguous binding: {0}",
            ErrorKind::NoAppropriateConstructor => "No appropriate constructor found for {0}",
            ErrorKind::InvalidMemberExpression => "Member injector requires a member access expression",
            ErrorKind::InstantiationFailed => "Failed to instantiate {0}",
            ErrorKind::IncorrectType => "Resolved instance of {0} has unexpected type {1}",
        }
    }

    /// Substitutes `args` into the template of this kind
    #[must_use]
    pub fn message(&self, args: &[&str]) -> String {
        let template = self.template();
        let mut message = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            message.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                message.push_str(&rest[start..]);
                rest = "";
                break;
            };
            match after[..end].parse::<usize>().ok().and_then(|index| args.get(index)) {
                Some(arg) => message.push_str(arg),
                None => message.push_str(&rest[start..=start + end + 1]),
            }
            rest = &after[end + 1..];
        }
        message.push_str(rest);

        message
    }

    #[inline]
    #[must_use]
    pub fn format(self, args: &[&str]) -> InjectorError {
        InjectorError::new(self, args)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?} ({})", self.code())
    }
}
