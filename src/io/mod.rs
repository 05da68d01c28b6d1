//! I/O abstraction layer for listing and reading dataset objects

pub mod byte_reader;
pub mod local_reader;
pub mod local_store;
pub mod s3_reader;
pub mod s3_store;
pub mod store;
pub mod uri;

pub use byte_reader::{ByteReader, read_tail};
pub use store::{DatasetStore, ObjectInfo, StoreFactory};
pub use uri::DatasetUri;
