//! Dataset layout discovery - versions, partitions and data files

pub mod layout;
pub mod version;

pub use layout::{PartitionValue, VersionLayout};
pub use version::{VersionRequest, VersionSelector, pick_versions};
