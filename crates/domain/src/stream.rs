use std::pin::Pin;

use crate::error::Result;

/// A boxed async stream, used for provider responses consumed incrementally.
pub type BoxStream<'a, T> = Pin<Box<dyn futures_core::Stream<Item = T> + Send + 'a>>;

/// Raw completion chunks as they arrive from an agent runtime.
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>>>;
