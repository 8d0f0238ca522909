pub use append_rle::AppendRle;
pub use splitable_span::*;

mod splitable_span;
mod append_rle;
