//! Keeps the printer-object mirror current against the remote controller.
//!
//! One resync cycle: verify Klippy readiness within a bounded wait, discover
//! which printer objects the remote currently exposes, fetch their status in
//! a single batched query, and fold the payload into the records. The caller
//! drives periodicity; the engine only exposes `resync()` and snapshot
//! accessors.

use std::time::Duration;

use serde_json::{Map, Value, json};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Instant, sleep, timeout_at};

use crate::config::SyncConfig;
use crate::printer_objects::{
    DisplayStatus, GcodeMetadata, KlippyState, PrintStats, PrinterObjects, ServerInfo,
    VirtualSdCard,
};
use crate::rpc::{RpcClient, RpcError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("klippy not ready within {0:?}")]
    Timeout(Duration),
    #[error("rpc failure: {0}")]
    Connection(#[from] RpcError),
}

/// Maintains the in-process mirror of one printer's state.
///
/// The record set is owned exclusively by the engine; callers receive owned
/// clones. `resync()` invocations are serialized by an internal cycle guard,
/// so overlapping calls queue instead of interleaving record updates.
pub struct SyncEngine<C: RpcClient> {
    client: C,
    config: SyncConfig,
    printer_name: String,
    state: RwLock<PrinterObjects>,
    cycle: Mutex<()>,
}

impl<C: RpcClient> SyncEngine<C> {
    pub fn new(client: C, config: SyncConfig) -> Self {
        let printer_name = config.printer_name().to_string();
        Self {
            client,
            config,
            printer_name,
            state: RwLock::new(PrinterObjects::new()),
            cycle: Mutex::new(()),
        }
    }

    pub fn printer_name(&self) -> &str {
        &self.printer_name
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run one full synchronization cycle.
    ///
    /// On success the records reflect the latest observed values and
    /// `klippy_ready` is true. On failure the records keep their last
    /// fully-applied values; nothing is cleared or rolled back.
    pub async fn resync(&self) -> Result<(), SyncError> {
        let _cycle = self.cycle.lock().await;
        tracing::debug!("Resync started for printer '{}'", self.printer_name);

        self.await_klippy_ready().await?;
        let objects = self.list_objects().await?;
        let status = self.query_status(&objects).await?;
        {
            let mut state = self.state.write().await;
            state.apply_status(&status);
        }
        self.refresh_metadata().await;

        tracing::info!("Resync complete for printer '{}'", self.printer_name);
        Ok(())
    }

    /// Poll `server.info` until Klippy reports ready or the configured
    /// timeout elapses.
    ///
    /// Each request is raced against the absolute deadline, so a transport
    /// that never answers still times out on schedule. A request-level
    /// timeout or server error counts as a not-ready report and polling
    /// continues; a connection failure aborts the cycle.
    async fn await_klippy_ready(&self) -> Result<(), SyncError> {
        let timeout = self.config.klippy_timeout();
        let deadline = Instant::now() + timeout;
        // A zero interval would busy-loop the transport.
        let poll_interval = self
            .config
            .klippy_poll_interval()
            .max(Duration::from_millis(1));

        // Readiness is re-verified every cycle, never cached.
        self.state.write().await.klippy_ready = false;

        loop {
            match timeout_at(deadline, self.client.call("server.info", None)).await {
                Err(_) => {
                    tracing::warn!(
                        "Klippy on printer '{}' not ready after {:?}",
                        self.printer_name,
                        timeout
                    );
                    return Err(SyncError::Timeout(timeout));
                }
                Ok(Ok(result)) => {
                    let reported = result
                        .get("klippy_state")
                        .and_then(Value::as_str)
                        .map(KlippyState::from_wire);
                    let mut state = self.state.write().await;
                    state.server_info.apply(&result);
                    if reported.is_some_and(KlippyState::is_ready) {
                        state.klippy_ready = true;
                        tracing::debug!("Klippy ready on printer '{}'", self.printer_name);
                        return Ok(());
                    }
                    tracing::debug!(
                        "Klippy on printer '{}' reported '{}', waiting",
                        self.printer_name,
                        state.server_info.klippy_state
                    );
                }
                Ok(Err(RpcError::Connection(e))) => {
                    return Err(SyncError::Connection(RpcError::Connection(e)));
                }
                Ok(Err(err)) => {
                    // Request timeout or server error: same as a not-ready
                    // report, keep polling until the deadline.
                    tracing::debug!(
                        "Readiness poll on printer '{}' failed: {}",
                        self.printer_name,
                        err
                    );
                }
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    "Klippy on printer '{}' not ready after {:?}",
                    self.printer_name,
                    timeout
                );
                return Err(SyncError::Timeout(timeout));
            }
            sleep(poll_interval).await;
        }
    }

    /// Ask the remote which printer objects it currently exposes.
    async fn list_objects(&self) -> Result<Vec<String>, SyncError> {
        let result = self.client.call("printer.objects.list", None).await?;
        let objects: Vec<String> = result
            .get("objects")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        tracing::debug!(
            "Printer '{}' exposes {} objects",
            self.printer_name,
            objects.len()
        );
        Ok(objects)
    }

    /// Fetch current values for the discovered objects in one batched query.
    async fn query_status(&self, objects: &[String]) -> Result<Map<String, Value>, SyncError> {
        let mut wanted = Map::new();
        for name in objects {
            wanted.insert(name.clone(), Value::Null);
        }
        let result = self
            .client
            .call("printer.objects.query", Some(json!({ "objects": wanted })))
            .await?;
        let status = result
            .get("status")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Ok(status)
    }

    /// Best-effort fetch of slicer metadata for the current file. Failures
    /// are logged and never fail the resync.
    async fn refresh_metadata(&self) {
        let filename = self.state.read().await.print_stats.filename.clone();
        let Some(filename) = filename else {
            return;
        };
        let params = json!({ "filename": filename });
        match self.client.call("server.files.metadata", Some(params)).await {
            Ok(result) => {
                self.state.write().await.gcode_metadata.apply(&result);
            }
            Err(err) => {
                tracing::debug!(
                    "Metadata fetch for '{}' on printer '{}' failed: {}",
                    filename,
                    self.printer_name,
                    err
                );
            }
        }
    }

    pub async fn klippy_ready(&self) -> bool {
        self.state.read().await.klippy_ready
    }

    pub async fn server_info(&self) -> ServerInfo {
        self.state.read().await.server_info.clone()
    }

    pub async fn print_stats(&self) -> PrintStats {
        self.state.read().await.print_stats.clone()
    }

    pub async fn display_status(&self) -> DisplayStatus {
        self.state.read().await.display_status.clone()
    }

    pub async fn virtual_sdcard(&self) -> VirtualSdCard {
        self.state.read().await.virtual_sdcard.clone()
    }

    pub async fn gcode_metadata(&self) -> GcodeMetadata {
        self.state.read().await.gcode_metadata.clone()
    }

    /// Owned point-in-time copy of the whole record set.
    pub async fn snapshot(&self) -> PrinterObjects {
        self.state.read().await.clone()
    }
}
