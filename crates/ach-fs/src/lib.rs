mod error;
mod permissions;
mod primitives;
mod workspace;

pub use error::{Error, Result};
pub use permissions::PermissionMode;

pub use primitives::{atomic_read, atomic_write, replace_dir, AtomicWriteOptions, ReplaceDirOptions};

pub use workspace::{MergeLock, Workspace};
