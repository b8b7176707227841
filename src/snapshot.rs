//! Typed snapshot records and their flat-map rendering.
//!
//! Collectors fill the typed structs; `Snapshot::to_flat` serializes them
//! into the flat string-keyed mapping consumed by the JSON dump and the
//! summary renderer. The dynamic key groups (`gpu{i}_*`, sensor names) are
//! appended after the fixed keys; their prefixes are namespaced so they
//! cannot collide with the fixed key set.

use crate::units::{bytes_to_gb, round1};
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// One point-in-time host snapshot. Owned by the caller, never shared or
/// merged with prior snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub hostname: String,
    pub uptime_seconds: u64,
    pub os: String,
    pub os_release: String,
    pub os_version: String,
    pub cpu_model: String,
    pub cpu_usage_percent: u32,
    pub cpu_cores: u32,
    pub cpu_frequency_mhz: Option<u64>,
    pub memory_usage_percent: u32,
    pub memory_total_gb: f64,
    pub memory_used_gb: f64,
    pub disk: DiskFigures,
    pub network_sent: String,
    pub network_recv: String,
    pub gpus: Vec<GpuReading>,
    pub temperatures: Vec<TemperatureReading>,
}

/// Usage figures for the partition of interest. All zeros when no target
/// partition was found.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DiskFigures {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub usage_percent: f64,
}

impl DiskFigures {
    pub fn total_gb(&self) -> f64 {
        round1(bytes_to_gb(self.total_bytes))
    }

    pub fn used_gb(&self) -> f64 {
        round1(bytes_to_gb(self.used_bytes))
    }
}

/// One detected GPU, already sanitized and rounded by the enumerator.
#[derive(Debug, Clone, Serialize)]
pub struct GpuReading {
    pub name: String,
    pub load_percent: u64,
    pub memory_total_gb: u64,
    pub memory_used_gb: u64,
    pub temperature_c: u64,
}

/// One thermal sensor entry: chip group plus optional per-entry label.
/// `celsius` is `None` when the raw reading was not a finite number.
#[derive(Debug, Clone, Serialize)]
pub struct TemperatureReading {
    pub group: String,
    pub label: Option<String>,
    pub celsius: Option<f64>,
}

impl TemperatureReading {
    pub fn flat_key(&self) -> String {
        match &self.label {
            Some(label) => format!("{}_{}", self.group, label),
            None => self.group.clone(),
        }
    }
}

impl Snapshot {
    /// Renders the snapshot as the flat metric-name → value mapping.
    pub fn to_flat(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("hostname".into(), Value::String(self.hostname.clone()));
        out.insert("uptime_seconds".into(), self.uptime_seconds.into());
        out.insert("os".into(), Value::String(self.os.clone()));
        out.insert("os_release".into(), Value::String(self.os_release.clone()));
        out.insert("os_version".into(), Value::String(self.os_version.clone()));
        out.insert("cpu_model".into(), Value::String(self.cpu_model.clone()));
        out.insert("cpu_usage".into(), self.cpu_usage_percent.into());
        out.insert("cpu_cores".into(), self.cpu_cores.into());
        out.insert(
            "cpu_frequency_mhz".into(),
            match self.cpu_frequency_mhz {
                Some(mhz) => mhz.into(),
                None => Value::Null,
            },
        );
        out.insert("memory_usage".into(), self.memory_usage_percent.into());
        out.insert("memory_total_gb".into(), float_value(self.memory_total_gb));
        out.insert("memory_used_gb".into(), float_value(self.memory_used_gb));
        out.insert(
            "disk_usage".into(),
            (self.disk.usage_percent.round() as u64).into(),
        );
        out.insert("disk_total_gb".into(), float_value(self.disk.total_gb()));
        out.insert("disk_used_gb".into(), float_value(self.disk.used_gb()));
        out.insert(
            "network_sent_bytes".into(),
            Value::String(self.network_sent.clone()),
        );
        out.insert(
            "network_recv_bytes".into(),
            Value::String(self.network_recv.clone()),
        );

        for (i, gpu) in self.gpus.iter().enumerate() {
            out.insert(format!("gpu{i}_name"), Value::String(gpu.name.clone()));
            out.insert(format!("gpu{i}_load_percent"), gpu.load_percent.into());
            out.insert(format!("gpu{i}_memory_total_gb"), gpu.memory_total_gb.into());
            out.insert(format!("gpu{i}_memory_used_gb"), gpu.memory_used_gb.into());
            out.insert(format!("gpu{i}_temperature_c"), gpu.temperature_c.into());
        }

        for reading in &self.temperatures {
            let value = match reading.celsius {
                Some(v) => float_value(v),
                None => Value::Null,
            };
            out.insert(reading.flat_key(), value);
        }

        out
    }
}

fn float_value(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            hostname: "workstation".to_string(),
            uptime_seconds: 86_400,
            os: "Linux".to_string(),
            os_release: "6.8.0".to_string(),
            os_version: "Fedora Linux 39".to_string(),
            cpu_model: "AMD Ryzen 9 5950X 16-Core Processor".to_string(),
            cpu_usage_percent: 12,
            cpu_cores: 32,
            cpu_frequency_mhz: Some(3400),
            memory_usage_percent: 40,
            memory_total_gb: 31.3,
            memory_used_gb: 12.5,
            disk: DiskFigures {
                total_bytes: 512 * 1024 * 1024 * 1024,
                used_bytes: 128 * 1024 * 1024 * 1024,
                free_bytes: 384 * 1024 * 1024 * 1024,
                usage_percent: 25.0,
            },
            network_sent: "12.34 MB".to_string(),
            network_recv: "1.23 GB".to_string(),
            gpus: Vec::new(),
            temperatures: Vec::new(),
        }
    }

    #[test]
    fn flat_map_contains_fixed_keys() {
        let flat = sample_snapshot().to_flat();
        for key in [
            "hostname",
            "uptime_seconds",
            "os",
            "os_release",
            "os_version",
            "cpu_model",
            "cpu_usage",
            "cpu_cores",
            "cpu_frequency_mhz",
            "memory_usage",
            "memory_total_gb",
            "memory_used_gb",
            "disk_usage",
            "disk_total_gb",
            "disk_used_gb",
            "network_sent_bytes",
            "network_recv_bytes",
        ] {
            assert!(flat.contains_key(key), "missing {key}");
        }

        assert!(!flat["hostname"].as_str().unwrap().is_empty());
        assert!(flat["uptime_seconds"].as_u64().unwrap() > 0);
        assert!(flat["cpu_cores"].as_u64().unwrap() >= 1);
        let memory_usage = flat["memory_usage"].as_u64().unwrap();
        assert!(memory_usage <= 100);
    }

    #[test]
    fn flat_map_without_gpus_has_no_gpu_keys() {
        let flat = sample_snapshot().to_flat();
        assert!(!flat.keys().any(|k| k.starts_with("gpu")));
    }

    #[test]
    fn flat_map_renders_gpu_key_scheme() {
        let mut snapshot = sample_snapshot();
        snapshot.gpus = vec![
            GpuReading {
                name: "NVIDIA GeForce RTX 3080".to_string(),
                load_percent: 5,
                memory_total_gb: 10,
                memory_used_gb: 1,
                temperature_c: 45,
            },
            GpuReading {
                name: "NVIDIA GeForce GTX 1050 Ti".to_string(),
                load_percent: 0,
                memory_total_gb: 4,
                memory_used_gb: 0,
                temperature_c: 38,
            },
        ];

        let flat = snapshot.to_flat();
        let gpu_keys: Vec<&String> = flat.keys().filter(|k| k.starts_with("gpu")).collect();
        assert_eq!(gpu_keys.len(), 10);
        for i in 0..2 {
            for suffix in [
                "name",
                "load_percent",
                "memory_total_gb",
                "memory_used_gb",
                "temperature_c",
            ] {
                assert!(flat.contains_key(&format!("gpu{i}_{suffix}")));
            }
        }
        assert_eq!(flat["gpu0_load_percent"].as_u64(), Some(5));
        assert_eq!(flat["gpu1_memory_total_gb"].as_u64(), Some(4));
    }

    #[test]
    fn temperature_keys_join_group_and_label() {
        let mut snapshot = sample_snapshot();
        snapshot.temperatures = vec![
            TemperatureReading {
                group: "coretemp".to_string(),
                label: Some("Core 0".to_string()),
                celsius: Some(52.0),
            },
            TemperatureReading {
                group: "acpitz".to_string(),
                label: None,
                celsius: None,
            },
        ];

        let flat = snapshot.to_flat();
        assert_eq!(flat["coretemp_Core 0"].as_f64(), Some(52.0));
        assert!(flat["acpitz"].is_null());
    }

    #[test]
    fn zeroed_disk_figures_render_zero_percent() {
        let mut snapshot = sample_snapshot();
        snapshot.disk = DiskFigures::default();
        let flat = snapshot.to_flat();
        assert_eq!(flat["disk_usage"].as_u64(), Some(0));
        assert_eq!(flat["disk_total_gb"].as_f64(), Some(0.0));
    }
}
