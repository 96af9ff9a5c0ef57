use super::loaded::LoadedImage;

/// Single-shot receiver of a successfully loaded image.
///
/// Invoked at most once per request, and never when the load fails. Any
/// `FnOnce(LoadedImage)` closure is a sink.
pub trait ResultSink: Send {
    fn deliver(self: Box<Self>, image: LoadedImage);
}

impl<F> ResultSink for F
where
    F: FnOnce(LoadedImage) + Send,
{
    fn deliver(self: Box<Self>, image: LoadedImage) {
        (*self)(image)
    }
}
