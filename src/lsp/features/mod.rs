//! LSP features
//!
//! Only completion is provided. Its building blocks (context detection and
//! suggestion building) are independent of the protocol and are converted to
//! LSP types at the edge, in `completion::items`.

pub mod completion;
