//! The file-pipeline core (spec.md §1): scheduler, merger, uploader, and
//! return/correction processor that turn individual transfer records into
//! compliant, grouped, de-duplicated ACH files deposited at a remote ODFI
//! on time, and that update persistent state when files flow back.
//!
//! [`controller::Controller`] is the single entry point a host binary
//! drives; `merger`, `uploader`, and `processor` are its three workers and
//! are only ever reached indirectly through it outside of tests.

pub mod controller;
pub mod error;
pub mod merger;
pub mod processor;
pub mod uploader;

pub use controller::{Controller, FlushIncomingRequest, FlushOutgoingRequest, PipelineHandles, RemovalRequest};
pub use error::{PipelineError, Result};
pub use merger::{FinalizedFile, Merger};
pub use processor::Processor;
pub use uploader::Uploader;
