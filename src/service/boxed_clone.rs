use alloc::boxed::Box;
use core::fmt::{self, Debug, Formatter};

use super::base::Service;

type BoxedService<Request, Response, Error> = Box<dyn CloneService<Request, Response = Response, Error = Error> + Send + Sync>;

/// Type-erased service that can be cloned and shared across threads.
///
/// Compiled factories keep one of these and clone it per call, so a factory closure with `FnMut` state
/// never needs a lock.
pub(crate) struct BoxCloneService<Request, Response, Error>(BoxedService<Request, Response, Error>);

impl<Request, Response, Error> BoxCloneService<Request, Response, Error> {
    #[inline]
    #[must_use]
    pub(crate) fn new<S>(service: S) -> Self
    where
        S: Service<Request, Response = Response, Error = Error> + Clone + Send + Sync + 'static,
    {
        Self(Box::new(service))
    }
}

pub(crate) trait CloneService<Request>: Service<Request> {
    fn clone_box(&self) -> BoxedService<Request, Self::Response, Self::Error>;
}

impl<Request, T> CloneService<Request> for T
where
    T: Service<Request> + Clone + Send + Sync + 'static,
{
    #[inline]
    fn clone_box(&self) -> BoxedService<Request, T::Response, T::Error> {
        Box::new(self.clone())
    }
}

impl<Request, Response, Error> Clone for BoxCloneService<Request, Response, Error> {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl<Request, Response, Error> Service<Request> for BoxCloneService<Request, Response, Error> {
    type Response = Response;
    type Error = Error;

    #[inline]
    fn call(&mut self, request: Request) -> Result<Self::Response, Self::Error> {
        self.0.call(request)
    }
}

impl<Request, Response, Error> Debug for BoxCloneService<Request, Response, Error> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxCloneService").finish_non_exhaustive()
    }
}
