//! Typed snapshots of the printer objects Moonraker exposes.
//!
//! Status payloads arrive as arbitrary-shaped JSON per object name, so each
//! record decodes itself with an explicit `apply` function: a field that is
//! missing or has an unexpected type keeps its prior value. Decoding never
//! fails; defaults only exist until a value is first observed.

use serde_json::{Map, Value};
use std::fmt;

/// Klippy host state as reported by `server.info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KlippyState {
    Ready,
    Startup,
    Shutdown,
    Error,
    Disconnected,
}

impl KlippyState {
    /// Unknown strings decode to `Error` so they can never pass the
    /// readiness gate.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "ready" => KlippyState::Ready,
            "startup" => KlippyState::Startup,
            "shutdown" => KlippyState::Shutdown,
            "disconnected" => KlippyState::Disconnected,
            _ => KlippyState::Error,
        }
    }

    pub fn is_ready(self) -> bool {
        self == KlippyState::Ready
    }
}

impl fmt::Display for KlippyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KlippyState::Ready => "ready",
            KlippyState::Startup => "startup",
            KlippyState::Shutdown => "shutdown",
            KlippyState::Error => "error",
            KlippyState::Disconnected => "disconnected",
        };
        write!(f, "{}", s)
    }
}

/// Job state reported under `print_stats.state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintState {
    Standby,
    Printing,
    Paused,
    Complete,
    Cancelled,
    Error,
}

impl PrintState {
    /// Unknown strings return `None`; the caller keeps the prior value.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "standby" => Some(PrintState::Standby),
            "printing" => Some(PrintState::Printing),
            "paused" => Some(PrintState::Paused),
            "complete" => Some(PrintState::Complete),
            "cancelled" => Some(PrintState::Cancelled),
            "error" => Some(PrintState::Error),
            _ => None,
        }
    }
}

impl fmt::Display for PrintState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrintState::Standby => "standby",
            PrintState::Printing => "printing",
            PrintState::Paused => "paused",
            PrintState::Complete => "complete",
            PrintState::Cancelled => "cancelled",
            PrintState::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Connection/readiness report from `server.info`.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerInfo {
    pub klippy_state: KlippyState,
    pub klippy_connected: bool,
}

impl ServerInfo {
    pub fn new() -> Self {
        Self {
            klippy_state: KlippyState::Disconnected,
            klippy_connected: false,
        }
    }

    pub fn apply(&mut self, data: &Value) {
        if let Some(s) = data.get("klippy_state").and_then(Value::as_str) {
            self.klippy_state = KlippyState::from_wire(s);
        }
        if let Some(c) = data.get("klippy_connected").and_then(Value::as_bool) {
            self.klippy_connected = c;
        }
    }
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// Current job bookkeeping from the `print_stats` object.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintStats {
    pub filename: Option<String>,
    pub state: PrintState,
}

impl PrintStats {
    pub fn new() -> Self {
        Self {
            filename: None,
            state: PrintState::Error,
        }
    }

    pub fn apply(&mut self, data: &Value) {
        match data.get("filename") {
            // Moonraker reports an empty filename between jobs.
            Some(Value::String(s)) if s.is_empty() => self.filename = None,
            Some(Value::String(s)) => self.filename = Some(s.clone()),
            Some(Value::Null) => self.filename = None,
            _ => {}
        }
        if let Some(state) = data
            .get("state")
            .and_then(Value::as_str)
            .and_then(PrintState::from_wire)
        {
            self.state = state;
        }
    }
}

impl Default for PrintStats {
    fn default() -> Self {
        Self::new()
    }
}

/// M117-style message from the `display_status` object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayStatus {
    pub message: Option<String>,
}

impl DisplayStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, data: &Value) {
        match data.get("message") {
            Some(Value::String(s)) => self.message = Some(s.clone()),
            Some(Value::Null) => self.message = None,
            _ => {}
        }
    }
}

/// Print progress from the `virtual_sdcard` object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VirtualSdCard {
    /// Fraction of the file printed, 0.0-1.0.
    pub progress: f64,
}

impl VirtualSdCard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, data: &Value) {
        if let Some(p) = data.get("progress").and_then(Value::as_f64) {
            self.progress = p.clamp(0.0, 1.0);
        }
    }
}

/// Slicer metadata for the current file, from `server.files.metadata`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GcodeMetadata {
    pub slicer: Option<String>,
    /// Estimated print time in seconds.
    pub estimated_time: Option<f64>,
    /// Total filament use in millimeters.
    pub filament_total: Option<f64>,
    pub object_height: Option<f64>,
}

impl GcodeMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, data: &Value) {
        if let Some(s) = data.get("slicer").and_then(Value::as_str) {
            self.slicer = Some(s.to_string());
        }
        if let Some(t) = data.get("estimated_time").and_then(Value::as_f64) {
            self.estimated_time = Some(t);
        }
        if let Some(f) = data.get("filament_total").and_then(Value::as_f64) {
            self.filament_total = Some(f);
        }
        if let Some(h) = data.get("object_height").and_then(Value::as_f64) {
            self.object_height = Some(h);
        }
    }
}

/// The full record set owned by the sync engine. Callers only ever see
/// clones of this; the engine mutates it in place during a resync cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrinterObjects {
    pub klippy_ready: bool,
    pub server_info: ServerInfo,
    pub print_stats: PrintStats,
    pub display_status: DisplayStatus,
    pub virtual_sdcard: VirtualSdCard,
    pub gcode_metadata: GcodeMetadata,
}

impl PrinterObjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a `printer.objects.query` status map into the records.
    ///
    /// Known object names update their record, names absent from the map
    /// are no-ops, and names this engine does not track are ignored.
    /// Performs no I/O and cannot fail.
    pub fn apply_status(&mut self, status: &Map<String, Value>) {
        if let Some(data) = status.get("print_stats") {
            self.print_stats.apply(data);
        }
        if let Some(data) = status.get("display_status") {
            self.display_status.apply(data);
        }
        if let Some(data) = status.get("virtual_sdcard") {
            self.virtual_sdcard.apply(data);
        }
    }
}
