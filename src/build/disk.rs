use std::fs;
use tracing::debug;

use crate::build::backend::Backend;
use crate::build::parser::InputSource;
use crate::build::progress::{Phase, Progress};
use crate::compression::compress::Compressor;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::meta::Meta;
use crate::core::types::{to_simple_int, NodeKind, OFFCOMP, OFFNUM};
use crate::index::names::Names;
use crate::index::namespaces::Namespaces;
use crate::index::path::PathSummary;
use crate::storage::layout::DbLayout;
use crate::storage::output::{DataInput, DataOutput};
use crate::storage::table::TableDiskAccess;

/// Handle of a successfully built on-disk database
#[derive(Debug)]
pub struct DiskData {
    pub meta: Meta,
    pub elem_names: Names,
    pub attr_names: Names,
    pub ns: Namespaces,
    pub path: PathSummary,
    pub layout: DbLayout,
}

/// Backend writing the database to disk.
///
/// The table stays strictly append-only while parsing; size values are
/// collected in a temporary stream and patched into the closed table file
/// in a second pass.
pub struct DiskBackend {
    layout: DbLayout,
    tout: DataOutput,   // table rows
    xout: DataOutput,   // text tokens
    vout: DataOutput,   // attribute value tokens
    sout: DataOutput,   // temporary (pre, size) pairs
    txtlen: u64,
    vallen: u64,
    ssize: usize,
    comp: Compressor,
}

impl DiskBackend {
    /// Drops any database of this name and opens fresh output streams.
    /// The input's size, location and modification time are captured in
    /// the metadata.
    pub fn create(config: &Config, meta: &mut Meta, source: Option<&InputSource>) -> Result<Self> {
        if let Some(source) = source {
            meta.filesize = source.size;
            meta.path = source.path.clone();
            meta.time = source.mtime;
        }
        let layout = DbLayout::create(&config.storage_path, &meta.name)?;
        let bs = DataOutput::buffer_size(meta.filesize, config.memory_limit);
        Ok(DiskBackend {
            tout: DataOutput::create(&layout.table_path(), bs)?,
            xout: DataOutput::create(&layout.texts_path(), bs)?,
            vout: DataOutput::create(&layout.values_path(), bs)?,
            sout: DataOutput::create(&layout.sizes_path(), bs)?,
            layout,
            txtlen: 0,
            vallen: 0,
            ssize: 0,
            comp: Compressor::new(config.compression),
        })
    }

    /// Stores a text or attribute value and returns its 40-bit reference:
    /// an inlined integer, or the token's offset in the side file, flagged
    /// when the stored token is compressed.
    fn text_off(&mut self, value: &[u8], text: bool) -> Result<u64> {
        if let Some(num) = to_simple_int(value) {
            return Ok(num as u64 | OFFNUM);
        }

        let (packed, compressed) = self.comp.pack(value)?;
        let off = if text {
            let off = self.txtlen;
            self.txtlen += self.xout.write_token(&packed)? as u64;
            off
        } else {
            let off = self.vallen;
            self.vallen += self.vout.write_token(&packed)? as u64;
            off
        };
        Ok(if compressed { off | OFFCOMP } else { off })
    }

    fn close_outputs(&mut self) -> Result<()> {
        self.tout.close()?;
        self.xout.close()?;
        self.vout.close()?;
        self.sout.close()?;
        Ok(())
    }

    /// Copies the collected size values into the table file and persists
    /// the metadata.
    fn complete(&mut self, meta: &Meta, progress: &Progress) -> Result<()> {
        self.close_outputs()?;

        progress.set_phase(Phase::Finish);
        progress.patch_total(self.ssize);
        let mut table = TableDiskAccess::open(&self.layout.table_path())?;
        let mut sin = DataInput::open(&self.layout.sizes_path())?;
        for spos in 0..self.ssize {
            let pre = sin.read_num()?;
            let size = sin.read_num()?;
            table.write4(pre, 8, size)?;
            progress.patch_done(spos + 1);
        }
        table.close()?;
        fs::remove_file(self.layout.sizes_path())?;

        fs::write(self.layout.meta_path(), bincode::serialize(meta)?)?;
        progress.set_phase(Phase::Done);
        Ok(())
    }
}

impl Backend for DiskBackend {
    type Data = DiskData;

    fn add_doc(&mut self, pre: u32, name: &[u8]) -> Result<()> {
        let off = self.text_off(name, true)?;
        self.tout.write1(NodeKind::Doc.code())?;
        self.tout.write2(0)?;
        self.tout.write5(off)?;
        self.tout.write4(0)?;
        self.tout.write4(pre)
    }

    fn add_elem(
        &mut self,
        pre: u32,
        dist: u32,
        name: u16,
        asize: u32,
        uri: u32,
        ne: bool,
    ) -> Result<()> {
        self.tout.write1((asize as u8) << 3 | NodeKind::Elem.code())?;
        self.tout.write2(if ne { 1 << 15 } else { 0 } | name)?;
        self.tout.write1(uri as u8)?;
        self.tout.write4(dist)?;
        self.tout.write4(asize)?;
        self.tout.write4(pre)
    }

    fn add_attr(&mut self, pre: u32, name: u16, value: &[u8], dist: u32, uri: u32) -> Result<()> {
        let off = self.text_off(value, false)?;
        self.tout.write1((dist as u8) << 3 | NodeKind::Attr.code())?;
        self.tout.write2(name)?;
        self.tout.write5(off)?;
        self.tout.write4(uri)?;
        self.tout.write4(pre)
    }

    fn add_text(&mut self, pre: u32, value: &[u8], dist: u32, kind: NodeKind) -> Result<()> {
        let off = self.text_off(value, true)?;
        self.tout.write1(kind.code())?;
        self.tout.write2(0)?;
        self.tout.write5(off)?;
        self.tout.write4(dist)?;
        self.tout.write4(pre)
    }

    fn set_size(&mut self, pre: u32, size: u32) -> Result<()> {
        self.sout.write_num(pre)?;
        self.sout.write_num(size)?;
        self.ssize += 1;
        Ok(())
    }

    fn finish(
        mut self,
        meta: Meta,
        elem_names: Names,
        attr_names: Names,
        ns: Namespaces,
        path: PathSummary,
        progress: &Progress,
    ) -> Result<DiskData> {
        if let Err(err) = self.complete(&meta, progress) {
            self.abort();
            return Err(err);
        }
        Ok(DiskData {
            meta,
            elem_names,
            attr_names,
            ns,
            path,
            layout: self.layout,
        })
    }

    fn abort(&mut self) {
        if let Err(err) = self.close_outputs() {
            debug!(error = %err, "closing outputs during abort");
        }
        if let Err(err) = self.layout.drop_db() {
            debug!(error = %err, "dropping database during abort");
        }
    }
}
