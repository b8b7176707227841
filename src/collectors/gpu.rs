//! GPU enumerator backed by the nvidia-smi listing.
//!
//! A missing binary, a failed invocation, or an empty listing all yield an
//! empty set of readings, never an error.

use crate::snapshot::GpuReading;
use crate::units::safe_number;
use std::process::Command;
use tracing::debug;

pub fn collect() -> Vec<GpuReading> {
    let Some(output) = run_nvidia_smi(&[
        "--query-gpu=name,utilization.gpu,memory.used,memory.total,temperature.gpu",
        "--format=csv,noheader,nounits",
    ]) else {
        debug!("nvidia-smi is not available, reporting no GPUs");
        return Vec::new();
    };
    if !output.status.success() {
        debug!(code = ?output.status.code(), "nvidia-smi exited with an error, reporting no GPUs");
        return Vec::new();
    }

    let Ok(text) = String::from_utf8(output.stdout) else {
        return Vec::new();
    };

    parse_listing(&text)
}

fn parse_listing(text: &str) -> Vec<GpuReading> {
    text.lines().filter_map(parse_row).collect()
}

fn parse_row(line: &str) -> Option<GpuReading> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 5 {
        return None;
    }

    let name = if parts[0].is_empty() {
        "Unknown".to_string()
    } else {
        parts[0].to_string()
    };

    // Memory figures come back in MiB.
    Some(GpuReading {
        name,
        load_percent: round_metric(parse_f64(parts[1])),
        memory_used_gb: round_metric(parse_f64(parts[2]).map(mib_to_gb)),
        memory_total_gb: round_metric(parse_f64(parts[3]).map(mib_to_gb)),
        temperature_c: round_metric(parse_f64(parts[4])),
    })
}

fn round_metric(value: Option<f64>) -> u64 {
    safe_number(value, 0.0).round().max(0.0) as u64
}

fn mib_to_gb(mib: f64) -> f64 {
    mib / 1024.0
}

fn parse_f64(input: &str) -> Option<f64> {
    input.parse().ok()
}

fn run_nvidia_smi(args: &[&str]) -> Option<std::process::Output> {
    if let Ok(output) = Command::new("nvidia-smi").args(args).output() {
        return Some(output);
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(output) = Command::new(r"C:\Windows\System32\nvidia-smi.exe")
            .args(args)
            .output()
        {
            return Some(output);
        }
    }

    None
}
