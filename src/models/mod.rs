// Domain models shared by the observers, the storage prober and snapshots

mod network;
mod storage;
mod trace;

pub use network::{InterfaceState, NetworkEvent};
pub use storage::{
    BlockDevice, Filesystem, Partition, ProbeType, ProbeTypes, StorageResult, UnknownProbeType,
};
pub use trace::{ProbeMode, ProbeTrace};
