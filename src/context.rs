use alloc::vec::Vec;
use tracing::error;

use crate::{any::TypeInfo, errors::InjectorError, ErrorKind};

/// Frames of a single resolution call.
///
/// Constructor frames and member frames are separate stacks:
/// a type whose constructor loops can still have its members injected, and vice versa.
#[derive(Debug, Default)]
pub struct Context {
    constructing: Vec<TypeInfo>,
    injecting: Vec<TypeInfo>,
}

impl Context {
    #[inline]
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self {
            constructing: Vec::new(),
            injecting: Vec::new(),
        }
    }

    pub(crate) fn enter_constructor(&mut self, type_info: TypeInfo) -> Result<(), InjectorError> {
        Self::enter(&mut self.constructing, type_info)
    }

    pub(crate) fn leave_constructor(&mut self, type_info: TypeInfo) {
        Self::leave(&mut self.constructing, type_info);
    }

    pub(crate) fn enter_members(&mut self, type_info: TypeInfo) -> Result<(), InjectorError> {
        Self::enter(&mut self.injecting, type_info)
    }

    pub(crate) fn leave_members(&mut self, type_info: TypeInfo) {
        Self::leave(&mut self.injecting, type_info);
    }

    #[inline]
    #[must_use]
    pub(crate) fn depth(&self) -> usize {
        self.constructing.len() + self.injecting.len()
    }

    fn enter(frames: &mut Vec<TypeInfo>, type_info: TypeInfo) -> Result<(), InjectorError> {
        if frames.contains(&type_info) {
            let err = ErrorKind::RecursionDetected.format(&[&type_info.short_name()]);
            error!(dependency = type_info.name, "{}", err);
            return Err(err);
        }
        frames.push(type_info);
        Ok(())
    }

    fn leave(frames: &mut Vec<TypeInfo>, type_info: TypeInfo) {
        let popped = frames.pop();
        debug_assert_eq!(popped, Some(type_info), "frames must be left in LIFO order");
    }
}
