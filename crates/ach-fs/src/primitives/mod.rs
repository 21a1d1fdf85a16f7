pub mod atomic_write;
pub mod replace_dir;

pub use atomic_write::{atomic_read, atomic_write, AtomicWriteOptions};
pub use replace_dir::{replace_dir, ReplaceDirOptions};
