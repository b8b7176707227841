//! Snapshot assembler over the sysinfo base metrics.
//!
//! Base metric failures are fatal to the collection call; platform probes
//! and peripheral collectors degrade to their documented fallbacks
//! instead of propagating.

use crate::collectors::probes::{self, Platform};
use crate::collectors::{gpu, temps};
use crate::snapshot::{DiskFigures, Snapshot};
use crate::units::{bytes_to_gb, bytes_to_human, round1};
use std::time::Duration;
use sysinfo::{CpuExt, NetworkExt, NetworksExt, System, SystemExt};
use thiserror::Error;
use tracing::debug;

/// Interval between the two CPU refreshes; an instantaneous sample reads
/// near zero.
const CPU_SAMPLE_WINDOW: Duration = Duration::from_millis(500);

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("hostname is not available")]
    HostnameUnavailable,
}

pub fn collect_snapshot(system: &mut System) -> Result<Snapshot, CollectError> {
    system.refresh_cpu();
    system.refresh_memory();
    system.refresh_disks_list();
    system.refresh_disks();
    system.refresh_networks_list();
    system.refresh_networks();

    std::thread::sleep(CPU_SAMPLE_WINDOW);
    system.refresh_cpu();

    let platform = Platform::detect();

    let hostname = system
        .host_name()
        .filter(|name| !name.trim().is_empty())
        .ok_or(CollectError::HostnameUnavailable)?;

    let os = system.name().unwrap_or_else(|| UNKNOWN.to_string());
    let os_release = system
        .kernel_version()
        .unwrap_or_else(|| UNKNOWN.to_string());
    let os_version = probes::os_version(platform).unwrap_or_else(|err| {
        debug!(error = %err, "os version probe degraded to the generic version");
        system.os_version().unwrap_or_default()
    });

    let cpus = system.cpus();
    let cpu_usage_percent = if cpus.is_empty() {
        0
    } else {
        let sum: f32 = cpus.iter().map(|cpu| cpu.cpu_usage()).sum();
        (sum / cpus.len() as f32).round().clamp(0.0, 100.0) as u32
    };
    let cpu_cores = cpus.len().max(1) as u32;
    let cpu_frequency_mhz = cpus.first().map(|cpu| cpu.frequency()).filter(|mhz| *mhz > 0);
    let generic_brand = cpus
        .first()
        .map(|cpu| cpu.brand().to_string())
        .unwrap_or_default();
    let cpu_model = probes::cpu_model(platform, &generic_brand).unwrap_or_else(|err| {
        debug!(error = %err, "cpu model probe degraded");
        probes::UNKNOWN_CPU.to_string()
    });

    let memory_total = system.total_memory();
    let memory_used = system.used_memory();
    let memory_usage_percent = if memory_total > 0 {
        ((memory_used as f64 / memory_total as f64) * 100.0).round() as u32
    } else {
        0
    };

    let disk = probes::disk_figures(platform, system).unwrap_or_else(|err| {
        debug!(error = %err, "disk probe degraded to zeroed figures");
        DiskFigures::default()
    });

    let (sent, received) = system
        .networks()
        .iter()
        .fold((0_u64, 0_u64), |acc, (_iface, data)| {
            (
                acc.0.saturating_add(data.total_transmitted()),
                acc.1.saturating_add(data.total_received()),
            )
        });

    let gpus = gpu::collect();
    let temperatures = temps::collect();

    Ok(Snapshot {
        hostname,
        uptime_seconds: system.uptime(),
        os,
        os_release,
        os_version,
        cpu_model,
        cpu_usage_percent,
        cpu_cores,
        cpu_frequency_mhz,
        memory_usage_percent,
        memory_total_gb: round1(bytes_to_gb(memory_total)),
        memory_used_gb: round1(bytes_to_gb(memory_used)),
        disk,
        network_sent: bytes_to_human(sent),
        network_recv: bytes_to_human(received),
        gpus,
        temperatures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_invariants_hold_on_this_host() {
        let mut system = System::new_all();
        let snapshot = collect_snapshot(&mut system).expect("base metrics must resolve");

        assert!(!snapshot.hostname.is_empty());
        assert!(snapshot.cpu_cores >= 1);
        assert!(snapshot.cpu_usage_percent <= 100);
        assert!(snapshot.memory_usage_percent <= 100);
        assert!(!snapshot.os.is_empty());
        assert!(!snapshot.cpu_model.is_empty());

        let flat = snapshot.to_flat();
        assert!(flat["uptime_seconds"].as_u64().is_some());
        assert!(flat.contains_key("network_sent_bytes"));
        assert!(flat.contains_key("network_recv_bytes"));
    }
}
