//! Platform probes: OS version, CPU model, and disk figures.
//!
//! Each probe returns `Result` internally; the snapshot assembler unwraps
//! to the documented fallback value, so a degraded probe never aborts a
//! collection.

use crate::snapshot::DiskFigures;
use std::fs;
use std::io::BufRead;
use std::path::Path;
use std::process::Command;
use sysinfo::{DiskExt, System, SystemExt};
use thiserror::Error;
use tracing::debug;

/// Fallback when no probe can resolve the CPU model.
pub const UNKNOWN_CPU: &str = "Unknown CPU";

const OS_RELEASE_PATH: &str = "/etc/os-release";
const CPUINFO_PATH: &str = "/proc/cpuinfo";

/// Mount points eligible as the partition of interest on non-Windows
/// hosts. Matching is by set membership over the partitions in enumeration
/// order; the first enumerated match wins, regardless of its position in
/// this list.
const TARGET_MOUNT_POINTS: [&str; 4] = ["/var/home", "/home", "/run/host/var/home", "/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Windows,
    Other,
}

impl Platform {
    /// Resolved once at collection start.
    pub fn detect() -> Self {
        match std::env::consts::OS {
            "linux" => Self::Linux,
            "windows" => Self::Windows,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: &'static str,
        source: std::io::Error,
    },
    #[error("{command} returned no usable output")]
    Output { command: &'static str },
    #[error("registry lookup failed: {0}")]
    Registry(String),
    #[error("no {0} available")]
    Missing(&'static str),
    #[error("{0} is not resolvable on this platform")]
    Unsupported(&'static str),
    #[error("no partition matched the target mount points")]
    NoMatchingPartition,
}

/// Distribution-aware OS version. Only Linux has a richer source than the
/// generic platform version; the other variants degrade immediately.
pub fn os_version(platform: Platform) -> Result<String, ProbeError> {
    match platform {
        Platform::Linux => os_version_from_file(Path::new(OS_RELEASE_PATH)),
        Platform::Windows | Platform::Other => Err(ProbeError::Unsupported("distribution version")),
    }
}

fn os_version_from_file(path: &Path) -> Result<String, ProbeError> {
    let text = fs::read_to_string(path).map_err(|source| ProbeError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_os_release(&text))
}

fn parse_os_release(text: &str) -> String {
    let mut name = None;
    let mut version_id = None;
    for line in text.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"');
        match key.trim() {
            "NAME" => name = Some(value.to_string()),
            "VERSION_ID" => version_id = Some(value.to_string()),
            _ => {}
        }
    }

    let name = name.unwrap_or_else(|| "Linux".to_string());
    let version_id = version_id.unwrap_or_default();
    format!("{name} {version_id}").trim().to_string()
}

/// CPU model string. `generic_brand` is the identifier reported by the
/// base metrics layer, used as the source of truth on platforms without a
/// dedicated probe.
pub fn cpu_model(platform: Platform, generic_brand: &str) -> Result<String, ProbeError> {
    match platform {
        Platform::Windows => cpu_model_windows(),
        Platform::Linux => cpu_model_from_file(Path::new(CPUINFO_PATH)),
        Platform::Other => {
            let brand = generic_brand.trim();
            if brand.is_empty() {
                Err(ProbeError::Missing("cpu brand"))
            } else {
                Ok(brand.to_string())
            }
        }
    }
}

fn cpu_model_windows() -> Result<String, ProbeError> {
    match wmic_cpu_name() {
        Ok(name) => Ok(name),
        Err(err) => {
            debug!(error = %err, "wmic query degraded, falling back to the registry");
            registry_cpu_name()
        }
    }
}

fn wmic_cpu_name() -> Result<String, ProbeError> {
    let output = Command::new("wmic")
        .args(["cpu", "get", "Name"])
        .output()
        .map_err(|source| ProbeError::Spawn {
            command: "wmic",
            source,
        })?;
    if !output.status.success() {
        return Err(ProbeError::Output { command: "wmic" });
    }

    let text = String::from_utf8_lossy(&output.stdout);
    parse_wmic_value(&text).ok_or(ProbeError::Output { command: "wmic" })
}

/// wmic prints a header line followed by the value line.
fn parse_wmic_value(text: &str) -> Option<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.len() >= 2 {
        Some(lines[1].to_string())
    } else {
        None
    }
}

#[cfg(windows)]
fn registry_cpu_name() -> Result<String, ProbeError> {
    use winreg::enums::HKEY_LOCAL_MACHINE;
    use winreg::RegKey;

    let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
    let key = hklm
        .open_subkey(r"HARDWARE\DESCRIPTION\System\CentralProcessor\0")
        .map_err(|err| ProbeError::Registry(err.to_string()))?;
    let name: String = key
        .get_value("ProcessorNameString")
        .map_err(|err| ProbeError::Registry(err.to_string()))?;
    Ok(name.trim().to_string())
}

#[cfg(not(windows))]
fn registry_cpu_name() -> Result<String, ProbeError> {
    Err(ProbeError::Registry(
        "registry access requires Windows".to_string(),
    ))
}

fn cpu_model_from_file(path: &Path) -> Result<String, ProbeError> {
    let file = fs::File::open(path).map_err(|source| ProbeError::Read {
        path: path.display().to_string(),
        source,
    })?;

    for line in std::io::BufReader::new(file).lines() {
        let line = line.map_err(|source| ProbeError::Read {
            path: path.display().to_string(),
            source,
        })?;
        if line.contains("model name") {
            return line
                .split_once(':')
                .map(|(_, value)| value.trim().to_string())
                .ok_or(ProbeError::Missing("model name value"));
        }
    }

    Err(ProbeError::Missing("model name entry"))
}

/// Usage figures for the partition of interest: the `C:` volume on
/// Windows, the first enumerated target mount point elsewhere.
pub fn disk_figures(platform: Platform, system: &System) -> Result<DiskFigures, ProbeError> {
    let partitions = system.disks().iter().map(|disk| PartitionUsage {
        mount: disk.mount_point().to_string_lossy().to_string(),
        total_bytes: disk.total_space(),
        available_bytes: disk.available_space(),
    });

    match platform {
        Platform::Windows => select_windows_root(partitions),
        Platform::Linux | Platform::Other => select_first_target(partitions),
    }
}

struct PartitionUsage {
    mount: String,
    total_bytes: u64,
    available_bytes: u64,
}

impl PartitionUsage {
    fn figures(&self) -> DiskFigures {
        let used = self.total_bytes.saturating_sub(self.available_bytes);
        DiskFigures {
            total_bytes: self.total_bytes,
            used_bytes: used,
            free_bytes: self.available_bytes,
            usage_percent: percent(used, self.total_bytes),
        }
    }
}

fn select_windows_root(
    partitions: impl IntoIterator<Item = PartitionUsage>,
) -> Result<DiskFigures, ProbeError> {
    partitions
        .into_iter()
        .find(|p| p.mount == "C:\\" || p.mount == "C:")
        .map(|p| p.figures())
        .ok_or(ProbeError::NoMatchingPartition)
}

fn select_first_target(
    partitions: impl IntoIterator<Item = PartitionUsage>,
) -> Result<DiskFigures, ProbeError> {
    for partition in partitions {
        if !TARGET_MOUNT_POINTS.contains(&partition.mount.as_str()) {
            continue;
        }
        if partition.total_bytes == 0 {
            // The enumeration API surfaces unreadable partitions as
            // zero-sized entries; keep scanning.
            debug!(mount = %partition.mount, "skipping partition with unreadable usage");
            continue;
        }
        return Ok(partition.figures());
    }

    Err(ProbeError::NoMatchingPartition)
}

fn percent(used: u64, total: u64) -> f64 {
    if total > 0 {
        (used as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}
