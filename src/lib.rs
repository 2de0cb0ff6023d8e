// Library for the CLI and tests to access modules

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod network;
pub mod prober;
pub mod snapshot;
pub mod storage;

pub use error::{EnumerationError, MalformedSnapshotError, ObserverStartError, ProbeError};
pub use prober::{Prober, ProberBuilder, new_prober};
