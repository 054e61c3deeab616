//! Catalog entries matched against free-text model strings at ingest.

use serde::{Deserialize, Serialize};

use crate::codes::{AntennaCategory, TxArchitecture};

/// Whether a catalog row describes a dish antenna or a billboard reflector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogEntryType {
    Antenna,
    Reflector,
}

/// One row of the antenna model catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntennaCatalogEntry {
    pub name: String,
    pub category: AntennaCategory,
    pub entry_type: CatalogEntryType,
    pub diameter_m: Option<f64>,
    pub midband_gain_dbi: Option<f64>,
    /// Reflector dimensions in metres, for `Reflector` rows.
    pub reflector_width_m: Option<f64>,
    pub reflector_height_m: Option<f64>,
}

/// One row of the transmitter model catalog. Matching is by prefix of the
/// cleaned model string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmitterCatalogEntry {
    pub model_prefix: String,
    pub architecture: TxArchitecture,
}

/// Normalize a free-text model string for matching: uppercase and strip
/// every non-alphanumeric character.
pub fn clean_model_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_model_name() {
        assert_eq!(clean_model_name("hp8-59w/a"), "HP859WA");
        assert_eq!(clean_model_name("  P6-65 G "), "P665G");
        assert_eq!(clean_model_name(""), "");
    }
}
