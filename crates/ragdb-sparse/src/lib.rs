pub mod index;
pub mod tokenize;

pub use index::{Bm25Index, Bm25Params};
pub use tokenize::tokenize;
