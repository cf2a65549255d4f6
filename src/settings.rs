use serde::{Deserialize, Serialize};

/// Display preset driving which unit family a dimension defaults to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Metric,
    Imperial,
    Custom,
}

/// Per-selection preferences consumed read-only by the converter and detector.
///
/// Persisting this across sessions is the host application's job (an external
/// collaborator, same as the key/value store behind the rate cache); this
/// struct only carries the values, the way `AppSettings` carries them before
/// `directories`/`serde_json` round-trip it to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub length_unit: String,
    pub weight_unit: String,
    pub temperature_unit: String,
    pub volume_unit: String,
    pub area_unit: String,
    pub speed_unit: String,
    pub acceleration_unit: String,
    pub flow_rate_unit: String,
    pub torque_unit: String,
    pub pressure_unit: String,
    /// Zone abbreviation (e.g. `"PST"`) or IANA id, or `"auto"` to resolve
    /// from the local machine offset.
    pub timezone_unit: String,
    pub currency_unit: String,
    pub is_12hr: bool,
    pub preset: Preset,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            length_unit: "m".to_string(),
            weight_unit: "kg".to_string(),
            temperature_unit: "c".to_string(),
            volume_unit: "l".to_string(),
            area_unit: "m2".to_string(),
            speed_unit: "ms".to_string(),
            acceleration_unit: "ms2".to_string(),
            flow_rate_unit: "lmin".to_string(),
            torque_unit: "Nm".to_string(),
            pressure_unit: "pa".to_string(),
            timezone_unit: "auto".to_string(),
            currency_unit: "USD".to_string(),
            is_12hr: true,
            preset: Preset::Metric,
        }
    }
}
