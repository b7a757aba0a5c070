//! Host platform classification.
//!
//! detect_platform -> PlatformKind { Windows | Linux | MacOs | Unknown }
//!
//! The native identifier comes from `std::env::consts::OS`. On Unix the
//! kernel descriptor fields (ostype, hostname, osrelease, version) are read
//! from `/proc/sys/kernel`; a `microsoft` marker in any of them means the
//! process runs under the Windows Linux compatibility layer, where the host
//! build tooling is still MSBuild.

use std::fmt;
use std::sync::OnceLock;

/// Marker found in the kernel descriptor of the Windows compatibility layer.
pub const COMPAT_LAYER_MARKER: &str = "microsoft";

const KERNEL_FIELDS: &[&str] = &["ostype", "hostname", "osrelease", "version"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformKind {
    Windows,
    Linux,
    MacOs,
    Unknown,
}

impl PlatformKind {
    pub fn is_windows(&self) -> bool {
        matches!(self, PlatformKind::Windows)
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlatformKind::Windows => "windows",
            PlatformKind::Linux => "linux",
            PlatformKind::MacOs => "macos",
            PlatformKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Classify a native platform identifier plus uname-style descriptor fields.
///
/// Substring match: `darwin`/`macos` is checked before `win` (a substring of
/// `darwin`), so `win32`, `cygwin` and `msys_win` all classify as Windows.
pub fn classify<S: AsRef<str>>(native: &str, uname_fields: &[S]) -> PlatformKind {
    let overridden = uname_fields
        .iter()
        .any(|f| f.as_ref().to_ascii_lowercase().contains(COMPAT_LAYER_MARKER));
    if overridden {
        return PlatformKind::Windows;
    }

    let norm = native.trim().to_ascii_lowercase();
    if norm.contains("darwin") || norm.contains("macos") {
        PlatformKind::MacOs
    } else if norm.contains("win") {
        PlatformKind::Windows
    } else if norm.contains("linux") {
        PlatformKind::Linux
    } else {
        PlatformKind::Unknown
    }
}

/// Collect the kernel descriptor fields for the running host.
pub fn uname_fields() -> Vec<String> {
    let mut fields: Vec<String> = Vec::with_capacity(KERNEL_FIELDS.len() + 1);
    if cfg!(unix) {
        for name in KERNEL_FIELDS {
            let path = format!("/proc/sys/kernel/{name}");
            if let Ok(v) = std::fs::read_to_string(&path) {
                fields.push(v.trim().to_string());
            }
        }
    }
    fields.push(std::env::consts::ARCH.to_string());
    fields
}

/// Detect the host platform. Computed once per process.
pub fn detect_platform() -> PlatformKind {
    static DETECTED: OnceLock<PlatformKind> = OnceLock::new();
    *DETECTED.get_or_init(|| {
        let fields = uname_fields();
        let kind = classify(std::env::consts::OS, fields.as_slice());
        crate::log_debug!(
            "platform: native={} fields={:?} -> {}",
            std::env::consts::OS,
            fields,
            kind
        );
        kind
    })
}
