use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::compression::compress::CompressionType;
use crate::core::config::Config;

/// Metadata of one built database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub name: String,
    pub size: u32,          // Next free pre value = row count
    pub ndocs: u32,         // Document nodes in the table
    pub lastid: u32,        // Highest node id handed out
    pub filesize: u64,      // Size of the parsed input
    pub time: DateTime<Utc>,
    pub path: String,       // Original input location, if any
    pub encoding: String,
    pub compression: CompressionType,
}

impl Meta {
    pub fn new(name: &str, config: &Config) -> Self {
        Meta {
            name: name.to_string(),
            size: 0,
            ndocs: 0,
            lastid: 0,
            filesize: 0,
            time: Utc::now(),
            path: String::new(),
            encoding: "UTF-8".to_string(),
            compression: config.compression,
        }
    }
}
