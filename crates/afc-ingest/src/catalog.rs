//! Antenna and transmitter model catalogs with free-text matching.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use regex::RegexBuilder;
use tracing::debug;

use afc_core::catalog::{clean_model_name, AntennaCatalogEntry, CatalogEntryType, TransmitterCatalogEntry};
use afc_core::codes::{AntennaCategory, TxArchitecture};

use crate::{IngestError, Result};

fn strip_comments(text: &str) -> String {
    text.lines()
        .filter(|l| !l.trim_start().starts_with('#') && !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn header_index(headers: &csv::StringRecord, label: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == label)
        .ok_or_else(|| IngestError::Catalog {
            path: String::new(),
            message: format!("label line missing \"{label}\""),
        })
}

/// Antenna model catalog plus the ordered regex map used for US records.
/// ISED records match by longest catalog-name prefix instead.
pub struct AntennaModelMap {
    entries: Vec<AntennaCatalogEntry>,
    /// (compiled regex, entry index), in file order; first match wins.
    patterns: Vec<(regex::Regex, usize)>,
}

impl AntennaModelMap {
    /// Load the model list and the regex map.
    ///
    /// List columns: `Ant Model`, `Category`, `Diameter (m)`,
    /// `Midband Gain (dBi)`, `Type`, `Reflector Width (m)`,
    /// `Reflector Height (m)`. Map columns: `regex`, `Ant Model`.
    pub fn from_csv_paths<P: AsRef<Path>>(list_path: P, map_path: P) -> Result<Self> {
        let mut list_text = String::new();
        File::open(&list_path)?.read_to_string(&mut list_text)?;
        let mut map_text = String::new();
        File::open(&map_path)?.read_to_string(&mut map_text)?;
        Self::from_csv_strs(&list_text, &map_text)
    }

    pub fn from_csv_strs(list_text: &str, map_text: &str) -> Result<Self> {
        let mut entries = Vec::new();

        let cleaned = strip_comments(list_text);
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(cleaned.as_bytes());
        let headers = reader.headers()?.clone();
        let name_idx = header_index(&headers, "Ant Model")?;
        let category_idx = header_index(&headers, "Category")?;
        let diameter_idx = header_index(&headers, "Diameter (m)")?;
        let gain_idx = header_index(&headers, "Midband Gain (dBi)")?;
        let type_idx = headers.iter().position(|h| h == "Type");
        let refl_w_idx = headers.iter().position(|h| h == "Reflector Width (m)");
        let refl_h_idx = headers.iter().position(|h| h == "Reflector Height (m)");

        for record in reader.records() {
            let record = record?;
            let name = record.get(name_idx).unwrap_or("").to_string();
            if name.is_empty() {
                continue;
            }
            let category = record
                .get(category_idx)
                .unwrap_or("")
                .parse::<AntennaCategory>()
                .unwrap_or(AntennaCategory::Unknown);
            let entry_type = match type_idx.and_then(|i| record.get(i)) {
                Some("Reflector") => CatalogEntryType::Reflector,
                _ => CatalogEntryType::Antenna,
            };
            let get_f64 = |idx: Option<usize>| -> Option<f64> {
                idx.and_then(|i| record.get(i)).and_then(|s| s.parse().ok())
            };
            entries.push(AntennaCatalogEntry {
                name,
                category,
                entry_type,
                diameter_m: get_f64(Some(diameter_idx)),
                midband_gain_dbi: get_f64(Some(gain_idx)),
                reflector_width_m: get_f64(refl_w_idx),
                reflector_height_m: get_f64(refl_h_idx),
            });
        }

        let cleaned_map = strip_comments(map_text);
        let mut map_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(cleaned_map.as_bytes());
        let map_headers = map_reader.headers()?.clone();
        let regex_idx = header_index(&map_headers, "regex")?;
        let target_idx = header_index(&map_headers, "Ant Model")?;

        let mut patterns = Vec::new();
        for record in map_reader.records() {
            let record = record?;
            let pattern = record.get(regex_idx).unwrap_or("");
            let target = record.get(target_idx).unwrap_or("");
            let entry_idx = entries
                .iter()
                .position(|e| e.name == target)
                .ok_or_else(|| IngestError::Catalog {
                    path: String::new(),
                    message: format!("map row targets unknown model \"{target}\""),
                })?;
            let re = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| IngestError::Regex {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })?;
            patterns.push((re, entry_idx));
        }

        debug!(
            entries = entries.len(),
            patterns = patterns.len(),
            "loaded antenna catalog"
        );
        Ok(Self { entries, patterns })
    }

    /// US matching: clean the model string, run the ordered regex list,
    /// first full match wins.
    pub fn find_us(&self, raw_model: &str) -> Option<&AntennaCatalogEntry> {
        let cleaned = clean_model_name(raw_model);
        for (re, idx) in &self.patterns {
            if let Some(m) = re.find(&cleaned) {
                if m.start() == 0 && m.end() == cleaned.len() {
                    return Some(&self.entries[*idx]);
                }
            }
        }
        None
    }

    /// ISED matching: longest catalog name that prefixes the cleaned
    /// model string.
    pub fn find_ca(&self, raw_model: &str) -> Option<&AntennaCatalogEntry> {
        let cleaned = clean_model_name(raw_model);
        self.entries
            .iter()
            .filter(|e| {
                let name = clean_model_name(&e.name);
                !name.is_empty() && cleaned.starts_with(&name)
            })
            .max_by_key(|e| clean_model_name(&e.name).len())
    }

    pub fn entries(&self) -> &[AntennaCatalogEntry] {
        &self.entries
    }
}

/// Transmitter model catalog. Matching is by catalog prefix against the
/// cleaned model string; first listed prefix wins.
pub struct TransmitterModelMap {
    entries: Vec<TransmitterCatalogEntry>,
}

impl TransmitterModelMap {
    /// Columns: `Model Prefix`, `Architecture` (IDU/ODU).
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut text = String::new();
        File::open(&path)?.read_to_string(&mut text)?;
        Self::from_csv_str(&text)
    }

    pub fn from_csv_str(text: &str) -> Result<Self> {
        let cleaned = strip_comments(text);
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(cleaned.as_bytes());
        let headers = reader.headers()?.clone();
        let prefix_idx = header_index(&headers, "Model Prefix")?;
        let arch_idx = header_index(&headers, "Architecture")?;

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record?;
            let prefix = clean_model_name(record.get(prefix_idx).unwrap_or(""));
            if prefix.is_empty() {
                continue;
            }
            let architecture = match record.get(arch_idx).unwrap_or("") {
                "IDU" => TxArchitecture::Idu,
                "ODU" => TxArchitecture::Odu,
                _ => TxArchitecture::Unknown,
            };
            entries.push(TransmitterCatalogEntry {
                model_prefix: prefix,
                architecture,
            });
        }
        Ok(Self { entries })
    }

    pub fn find(&self, raw_model: &str) -> Option<&TransmitterCatalogEntry> {
        let cleaned = clean_model_name(raw_model);
        self.entries
            .iter()
            .find(|e| cleaned.starts_with(&e.model_prefix))
    }
}
