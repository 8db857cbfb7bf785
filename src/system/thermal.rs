use std::fs;
use std::path::Path;

use super::procfs::read_single_line;

#[derive(Debug, Clone, PartialEq)]
pub struct ThermalZone {
    pub kind: String,
    /// `None` when the temperature is unreadable.
    pub celsius: Option<f64>,
}

impl ThermalZone {
    /// Rounded temperature followed by `degree`, or `n/a`.
    pub fn display(&self, degree: &str) -> String {
        match self.celsius {
            Some(c) => format!("{c:.0}{degree}"),
            None => "n/a".to_string(),
        }
    }
}

/// Every `thermal_zone*` under `<sys>/class/thermal`, in name order.
pub fn sample_thermal(sys_root: &Path) -> Vec<ThermalZone> {
    let dir = sys_root.join("class").join("thermal");
    let Ok(entries) = fs::read_dir(&dir) else {
        return Vec::new();
    };
    let mut zones: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains("thermal_zone"))
        .map(|e| e.path())
        .collect();
    zones.sort_by_key(|path| {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        let index: Option<u32> = name
            .as_deref()
            .and_then(|n| n.trim_start_matches("thermal_zone").parse().ok());
        (index, name)
    });

    zones
        .iter()
        .map(|zone| ThermalZone {
            kind: read_single_line(&zone.join("type")).unwrap_or_else(|| "?".to_string()),
            celsius: read_single_line(&zone.join("temp"))
                .and_then(|t| t.trim().parse::<f64>().ok())
                .map(|milli| milli / 1000.0),
        })
        .collect()
}
