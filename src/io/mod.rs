//! Input file reading.
//!
//! Benchmark inputs are read whole; files of 1 MiB or more are memory
//! mapped and validated as UTF-8 in place. A directory input is read as a
//! corpus of documents joined in file-name order.

pub mod corpus;
pub mod reader;

pub use corpus::{CorpusOptions, DEFAULT_MAX_DOCUMENTS, list_documents, read_corpus};
pub use reader::{FileReader, read_file};
