// moonsync: in-process mirror of a Moonraker printer's live state

pub mod config;
pub mod printer_objects;
pub mod rpc;
pub mod sync;

pub use config::SyncConfig;
pub use printer_objects::{
    DisplayStatus, GcodeMetadata, KlippyState, PrintState, PrintStats, PrinterObjects, ServerInfo,
    VirtualSdCard,
};
pub use rpc::{RpcClient, RpcError};
pub use sync::{SyncEngine, SyncError};
