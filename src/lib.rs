pub mod backend;
pub mod diagnostics;
pub mod distance;
pub mod document;
pub mod lexicon;
pub mod logging;
pub mod symbols;
