mod tag;
mod muxer;

pub use tag::*;
pub use muxer::*;
