/// A synchronous request handler.
///
/// Factories are stored as services so that instantiators with different dependency tuples
/// share one erased shape.
pub(crate) trait Service<Request> {
    type Response;
    type Error;

    fn call(&mut self, request: Request) -> Result<Self::Response, Self::Error>;
}
