use std::path::PathBuf;
use crate::compression::compress::CompressionType;

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_path: PathBuf,
    pub memory_limit: usize,            // Caps output buffer sizing
    pub compression: CompressionType,   // Codec for stored tokens
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_path: PathBuf::from("./data"),
            memory_limit: 100 * 1024 * 1024,    // 100MB
            compression: CompressionType::LZ4,
        }
    }
}
