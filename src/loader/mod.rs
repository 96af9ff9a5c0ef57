//! Per-target image loading.
//!
//! # Components
//!
//! - [`FetchCoordinator`]: the decision algorithm (cache hit, duplicate,
//!   cancel-and-restart, fetch-then-store)
//! - [`Target`] / [`TargetBinding`]: a display surface and the load state it owns
//! - [`DisplaySurface`]: layer-like or view-like capability receiving images
//! - [`ResultSink`]: single-shot success callback
//! - [`FetchHandle`] / [`Completion`]: cancellable background fetch and its result
//! - [`LoadObserver`] / [`LoadEvent`]: internal observability of swallowed outcomes

mod coordinator;
mod fetch;
mod loaded;
mod observer;
mod sink;
mod surface;
mod target;

pub use coordinator::FetchCoordinator;
pub use fetch::{Completion, FetchHandle};
pub use loaded::LoadedImage;
pub use observer::{ImageSource, LoadEvent, LoadObserver};
pub use sink::ResultSink;
pub use surface::{DisplaySurface, SurfaceContent, SurfaceKind, Transition};
pub use target::{Target, TargetBinding};
