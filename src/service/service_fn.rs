use super::base::Service;

#[inline]
#[must_use]
pub(crate) const fn service_fn<F>(f: F) -> ServiceFn<F> {
    ServiceFn { f }
}

#[derive(Clone)]
pub(crate) struct ServiceFn<F> {
    f: F,
}

impl<F, Request, Response, Error> Service<Request> for ServiceFn<F>
where
    F: FnMut(Request) -> Result<Response, Error>,
{
    type Response = Response;
    type Error = Error;

    #[inline]
    fn call(&mut self, request: Request) -> Result<Self::Response, Self::Error> {
        (self.f)(request)
    }
}

#[cfg(test)]
mod tests {
    use super::{service_fn, Service as _};

    #[test]
    fn test_service_fn_error() {
        let mut service = service_fn(|value: i32| if value < 0 { Err("negative") } else { Ok(value * 2) });

        assert_eq!(service.call(2), Ok(4));
        assert_eq!(service.call(-1), Err("negative"));
    }
}
