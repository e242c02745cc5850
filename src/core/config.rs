use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::core::error::Result;
use crate::lob::CompressionType;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Coder descriptions, textual form ("0" = Elias gamma, "1:5" = extended)
    pub id_coder: String,          // document-id gaps
    pub frequency_coder: String,   // in-document frequencies
    pub location_coder: String,    // location gaps

    // Overflow file geometry
    pub page_size: u32,            // physical page size in kilobytes
    pub max_file_size: u64,        // physical file cap in kilobytes
    pub max_page_id: u32,          // pages per physical file

    // Decimal arithmetic
    pub max_precision: i32,        // digit cap applied to operation results

    // LOB storage
    pub lob_compression: CompressionType,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            id_coder: "1".to_string(),
            frequency_coder: "0".to_string(),
            location_coder: "0".to_string(),

            page_size: 16,                      // 16KB pages
            max_file_size: 4 * 1024 * 1024,     // 4GB per physical file
            max_page_id: 256 * 1024,

            max_precision: 38,

            lob_compression: CompressionType::Lz4,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| {
            crate::core::error::Error::new(
                crate::core::error::ErrorKind::Parse,
                format!("bad config: {}", e),
            )
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self).map_err(|e| {
            crate::core::error::Error::new(
                crate::core::error::ErrorKind::Parse,
                e.to_string(),
            )
        })?;
        std::fs::write(path, data)?;
        Ok(())
    }
}
