use std::borrow::Cow;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, ErrorKind, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionType {
    None,
    LZ4,      // fastest, modest ratio
    Zstd,     // tightest ratio, slowest
    Snappy,   // middle ground
}

/// Per-token compressor for stored text and attribute values.
///
/// A token is packed only when the packed form is strictly shorter than the
/// input; the flag in the returned pair tells the two apart.
#[derive(Debug)]
pub struct Compressor {
    codec: CompressionType,
}

impl Compressor {
    pub fn new(codec: CompressionType) -> Self {
        Compressor { codec }
    }

    pub fn pack<'a>(&self, data: &'a [u8]) -> Result<(Cow<'a, [u8]>, bool)> {
        // Short tokens never win against the codec framing
        if self.codec == CompressionType::None || data.len() < 8 {
            return Ok((Cow::Borrowed(data), false));
        }

        let packed = match self.codec {
            CompressionType::None => unreachable!(),

            CompressionType::LZ4 => {
                // Size-prepended block, so unpacking needs no side channel
                lz4::block::compress(data, None, true)?
            }

            CompressionType::Zstd => {
                zstd::encode_all(data, 3)?  // low level keeps token packing cheap
            }

            CompressionType::Snappy => {
                use snap::raw::Encoder;
                let mut encoder = Encoder::new();
                encoder.compress_vec(data)
                    .map_err(|e| Error::new(ErrorKind::Io, e.to_string()))?
            }
        };

        if packed.len() < data.len() {
            Ok((Cow::Owned(packed), true))
        } else {
            Ok((Cow::Borrowed(data), false))
        }
    }

    /// Reverses `pack` for a token that was stored with the compressed flag.
    pub fn unpack(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self.codec {
            CompressionType::None => Err(Error::new(
                ErrorKind::Internal,
                "compressed token in an uncompressed database".to_string(),
            )),

            CompressionType::LZ4 => {
                lz4::block::decompress(data, None)
                    .map_err(|e| Error::new(ErrorKind::Io, e.to_string()))
            }

            CompressionType::Zstd => {
                zstd::decode_all(data)
                    .map_err(|e| Error::new(ErrorKind::Io, e.to_string()))
            }

            CompressionType::Snappy => {
                use snap::raw::Decoder;
                let mut decoder = Decoder::new();
                decoder.decompress_vec(data)
                    .map_err(|e| Error::new(ErrorKind::Io, e.to_string()))
            }
        }
    }
}
