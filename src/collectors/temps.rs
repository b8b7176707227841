//! Temperature enumerator over the Linux hwmon sysfs tree.
//!
//! Each hwmon chip is one sensor group; each `temp*_input` file is one
//! entry, labelled by the matching `temp*_label` when present. Platforms
//! without the sysfs tree contribute zero readings.

use crate::snapshot::TemperatureReading;
#[cfg(any(target_os = "linux", test))]
use crate::units::clean_value;
#[cfg(any(target_os = "linux", test))]
use std::path::{Path, PathBuf};

#[cfg(target_os = "linux")]
pub fn collect() -> Vec<TemperatureReading> {
    read_hwmon(Path::new("/sys/class/hwmon"))
}

#[cfg(not(target_os = "linux"))]
pub fn collect() -> Vec<TemperatureReading> {
    Vec::new()
}

#[cfg(any(target_os = "linux", test))]
fn read_hwmon(root: &Path) -> Vec<TemperatureReading> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };

    let mut chips: Vec<PathBuf> = entries.flatten().map(|entry| entry.path()).collect();
    chips.sort();

    let mut out = Vec::new();
    for chip in chips {
        let group = read_trimmed(&chip.join("name"))
            .filter(|name| !name.is_empty())
            .or_else(|| {
                chip.file_name()
                    .map(|name| name.to_string_lossy().to_string())
            });
        let Some(group) = group else {
            continue;
        };

        let Ok(files) = std::fs::read_dir(&chip) else {
            continue;
        };
        let mut inputs: Vec<PathBuf> = files
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("temp") && name.ends_with("_input"))
            })
            .collect();
        inputs.sort();

        for input in inputs {
            // Readings are in millidegrees Celsius.
            let Some(raw) = read_trimmed(&input).and_then(|text| text.parse::<f64>().ok()) else {
                continue;
            };
            let label = label_path(&input)
                .and_then(|path| read_trimmed(&path))
                .filter(|label| !label.is_empty());

            out.push(TemperatureReading {
                group: group.clone(),
                label,
                celsius: clean_value(raw / 1000.0),
            });
        }
    }

    out
}

#[cfg(any(target_os = "linux", test))]
fn label_path(input: &Path) -> Option<PathBuf> {
    let name = input.file_name()?.to_str()?;
    let stem = name.strip_suffix("_input")?;
    Some(input.with_file_name(format!("{stem}_label")))
}

#[cfg(any(target_os = "linux", test))]
fn read_trimmed(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|text| text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_chip(root: &Path, dir: &str, name: Option<&str>, files: &[(&str, &str)]) {
        let chip = root.join(dir);
        fs::create_dir_all(&chip).unwrap();
        if let Some(name) = name {
            fs::write(chip.join("name"), format!("{name}\n")).unwrap();
        }
        for (file, contents) in files {
            fs::write(chip.join(file), format!("{contents}\n")).unwrap();
        }
    }

    #[test]
    fn missing_tree_yields_no_readings() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_hwmon(&dir.path().join("hwmon")).is_empty());
    }

    #[test]
    fn labelled_and_unlabelled_entries() {
        let dir = tempfile::tempdir().unwrap();
        write_chip(
            dir.path(),
            "hwmon0",
            Some("coretemp"),
            &[
                ("temp1_input", "52000"),
                ("temp1_label", "Core 0"),
                ("temp2_input", "53500"),
                ("temp2_label", "Core 1"),
            ],
        );
        write_chip(dir.path(), "hwmon1", Some("acpitz"), &[("temp1_input", "41000")]);

        let readings = read_hwmon(dir.path());
        assert_eq!(readings.len(), 3);

        let keys: Vec<String> = readings.iter().map(|r| r.flat_key()).collect();
        assert_eq!(keys, vec!["coretemp_Core 0", "coretemp_Core 1", "acpitz"]);
        assert_eq!(readings[0].celsius, Some(52.0));
        assert_eq!(readings[1].celsius, Some(53.5));
        assert_eq!(readings[2].celsius, Some(41.0));
    }

    #[test]
    fn chip_without_name_file_uses_directory_name() {
        let dir = tempfile::tempdir().unwrap();
        write_chip(dir.path(), "hwmon7", None, &[("temp1_input", "30000")]);

        let readings = read_hwmon(dir.path());
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].group, "hwmon7");
    }

    #[test]
    fn non_finite_reading_becomes_null() {
        let dir = tempfile::tempdir().unwrap();
        write_chip(dir.path(), "hwmon0", Some("weird"), &[("temp1_input", "nan")]);

        let readings = read_hwmon(dir.path());
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].celsius, None);
    }

    #[test]
    fn unparsable_input_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_chip(
            dir.path(),
            "hwmon0",
            Some("coretemp"),
            &[("temp1_input", "garbage"), ("temp2_input", "45000")],
        );

        let readings = read_hwmon(dir.path());
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].celsius, Some(45.0));
    }
}
