use std::fmt::Debug;

/// Log-and-continue for fire-and-forget paths where an error has nowhere to go.
pub trait ForwardRefToTracing<T, E> {
    fn trace_err(self) -> Result<T, E>;
    fn trace_err_ok(self) -> Option<T>;
}

impl<T, E> ForwardRefToTracing<T, E> for Result<T, E>
where
    E: Debug,
{
    fn trace_err(self) -> Result<T, E> {
        self.inspect_err(|e| tracing::error!("{:?}", e))
    }

    fn trace_err_ok(self) -> Option<T> {
        self.trace_err().ok()
    }
}
