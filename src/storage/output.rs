use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use crate::compression::vbyte::VByte;
use crate::core::error::Result;
use crate::core::types::BLOCKSIZE;

/// Append-only writer with the fixed-width and variable-width primitives
/// of the table format. All multi-byte integers are big-endian.
pub struct DataOutput {
    file: File,
    buffer: Vec<u8>,
    capacity: usize,
    written: u64,
}

impl DataOutput {
    pub fn create(path: &Path, buffer_size: usize) -> Result<Self> {
        let file = File::create(path)?;
        Ok(DataOutput {
            file,
            buffer: Vec::with_capacity(buffer_size),
            capacity: buffer_size,
            written: 0,
        })
    }

    /// Output buffer size for an input of the given length: at least one
    /// block, at most 4MB capped by a quarter of the memory limit, rounded
    /// down to whole blocks to reduce fragmentation.
    pub fn buffer_size(filesize: u64, memory_limit: usize) -> usize {
        let cap = (4 << 20).min(memory_limit / 4);
        let bs = (filesize as usize).min(cap);
        (bs - bs % BLOCKSIZE).max(BLOCKSIZE)
    }

    pub fn write1(&mut self, value: u8) -> Result<()> {
        self.put(&[value])
    }

    pub fn write2(&mut self, value: u16) -> Result<()> {
        self.put(&value.to_be_bytes())
    }

    pub fn write4(&mut self, value: u32) -> Result<()> {
        self.put(&value.to_be_bytes())
    }

    /// Writes the low 40 bits of the value.
    pub fn write5(&mut self, value: u64) -> Result<()> {
        self.put(&value.to_be_bytes()[3..8])
    }

    pub fn write_num(&mut self, value: u32) -> Result<()> {
        let start = self.buffer.len();
        VByte::encode(&mut self.buffer, value);
        self.written += (self.buffer.len() - start) as u64;
        if self.buffer.len() >= self.capacity {
            self.flush()?;
        }
        Ok(())
    }

    /// Writes a length-prefixed token, returns the total bytes written.
    pub fn write_token(&mut self, token: &[u8]) -> Result<usize> {
        self.write_num(token.len() as u32)?;
        self.put(token)?;
        Ok(VByte::encoded_len(token.len() as u32) + token.len())
    }

    /// Total bytes accepted so far, flushed or not
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            self.file.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }

    /// Flushes and syncs the file to disk.
    pub fn close(&mut self) -> Result<()> {
        self.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(bytes);
        self.written += bytes.len() as u64;
        if self.buffer.len() >= self.capacity {
            self.flush()?;
        }
        Ok(())
    }
}

/// Reader for the variable-width streams written by `DataOutput`
pub struct DataInput {
    data: Vec<u8>,
    pos: usize,
}

impl DataInput {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(DataInput {
            data: fs::read(path)?,
            pos: 0,
        })
    }

    pub fn read_num(&mut self) -> Result<u32> {
        let (value, used) = VByte::decode(&self.data[self.pos..])?;
        self.pos += used;
        Ok(value)
    }

    pub fn has_more(&self) -> bool {
        self.pos < self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_size_stays_within_block_multiples() {
        assert_eq!(DataOutput::buffer_size(0, 100 << 20), BLOCKSIZE);
        assert_eq!(DataOutput::buffer_size(100, 100 << 20), BLOCKSIZE);
        assert_eq!(DataOutput::buffer_size(10_000, 100 << 20), 2 * BLOCKSIZE);
        // large file, large heap: capped at 4MB
        assert_eq!(DataOutput::buffer_size(1 << 30, 100 << 20), 4 << 20);
        // large file, small heap: capped at memory_limit / 4
        assert_eq!(DataOutput::buffer_size(1 << 30, 1 << 20), 256 * 1024);
    }

    #[test]
    fn primitives_are_big_endian() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out");
        let mut out = DataOutput::create(&path, BLOCKSIZE).unwrap();
        out.write1(0xAB).unwrap();
        out.write2(0x0102).unwrap();
        out.write4(0x01020304).unwrap();
        out.write5((1 << 39) | 0x0A0B0C0D).unwrap();
        out.close().unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(
            bytes,
            vec![0xAB, 0x01, 0x02, 0x01, 0x02, 0x03, 0x04, 0x80, 0x0A, 0x0B, 0x0C, 0x0D]
        );
        assert_eq!(out.written(), 12);
    }

    #[test]
    fn tokens_round_trip_through_data_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out");
        let mut out = DataOutput::create(&path, BLOCKSIZE).unwrap();
        assert_eq!(out.write_token(b"hello").unwrap(), 6);
        out.write_num(300).unwrap();
        out.close().unwrap();

        let mut input = DataInput::open(&path).unwrap();
        assert_eq!(input.read_num().unwrap(), 5);
        input.pos += 5;
        assert_eq!(input.read_num().unwrap(), 300);
        assert!(!input.has_more());
    }

    #[test]
    fn small_buffer_still_writes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out");
        let mut out = DataOutput::create(&path, BLOCKSIZE).unwrap();
        for i in 0..BLOCKSIZE as u32 {
            out.write4(i).unwrap();
        }
        out.close().unwrap();
        assert_eq!(fs::read(&path).unwrap().len(), 4 * BLOCKSIZE);
    }
}
