//! I/O operations module
//!
//! Contains the unbuffered file abstraction used by both benchmark phases
//! and the data block generators.

pub mod buffer;
pub mod disk;

pub use buffer::DataBlock;
pub use disk::{DirectFile, DiskIO, PlatformDiskIO, RawFile};
