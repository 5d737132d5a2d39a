use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use crate::core::error::Result;
use crate::core::types::ROW_SIZE;

/// Random-access writer over a closed table file, used by the size-patch
/// pass after parsing has finished.
pub struct TableDiskAccess {
    file: File,
}

impl TableDiskAccess {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(TableDiskAccess { file })
    }

    /// Overwrites four bytes at the given offset inside the row.
    pub fn write4(&mut self, pre: u32, offset: u32, value: u32) -> Result<()> {
        let pos = pre as u64 * ROW_SIZE as u64 + offset as u64;
        self.file.seek(SeekFrom::Start(pos))?;
        self.file.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn patches_rows_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tbl");
        fs::write(&path, vec![0u8; 3 * ROW_SIZE]).unwrap();

        let mut ta = TableDiskAccess::open(&path).unwrap();
        ta.write4(1, 8, 0x01020304).unwrap();
        ta.write4(2, 8, 7).unwrap();
        ta.close().unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[ROW_SIZE + 8..ROW_SIZE + 12], &[1, 2, 3, 4]);
        assert_eq!(&bytes[2 * ROW_SIZE + 8..2 * ROW_SIZE + 12], &[0, 0, 0, 7]);
        // neighbours untouched
        assert!(bytes[..ROW_SIZE + 8].iter().all(|&b| b == 0));
    }
}
