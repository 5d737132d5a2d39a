use crate::build::backend::Backend;
use crate::build::progress::{Phase, Progress};
use crate::compression::compress::Compressor;
use crate::compression::vbyte::VByte;
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::meta::Meta;
use crate::core::types::{to_simple_int, NodeKind, OFFCOMP, OFFNUM, ROW_SIZE};
use crate::index::names::Names;
use crate::index::namespaces::Namespaces;
use crate::index::path::PathSummary;

/// Backend building the database in memory.
///
/// Rows and side buffers use the same byte layout as the disk backend, so
/// both targets produce identical tables for identical event streams. Size
/// values are written straight into the table, there is no patch pass.
pub struct MemBackend {
    table: Vec<u8>,
    texts: Vec<u8>,
    values: Vec<u8>,
    comp: Compressor,
}

impl MemBackend {
    pub fn new(config: &Config) -> Self {
        MemBackend {
            table: Vec::new(),
            texts: Vec::new(),
            values: Vec::new(),
            comp: Compressor::new(config.compression),
        }
    }

    fn text_off(&mut self, value: &[u8], text: bool) -> Result<u64> {
        if let Some(num) = to_simple_int(value) {
            return Ok(num as u64 | OFFNUM);
        }
        let (packed, compressed) = self.comp.pack(value)?;
        let heap = if text { &mut self.texts } else { &mut self.values };
        let off = heap.len() as u64;
        VByte::encode(heap, packed.len() as u32);
        heap.extend_from_slice(&packed);
        Ok(if compressed { off | OFFCOMP } else { off })
    }
}

impl Backend for MemBackend {
    type Data = MemData;

    fn add_doc(&mut self, pre: u32, name: &[u8]) -> Result<()> {
        let off = self.text_off(name, true)?;
        self.table.push(NodeKind::Doc.code());
        self.table.extend_from_slice(&0u16.to_be_bytes());
        self.table.extend_from_slice(&off.to_be_bytes()[3..8]);
        self.table.extend_from_slice(&0u32.to_be_bytes());
        self.table.extend_from_slice(&pre.to_be_bytes());
        Ok(())
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
        self.table.push((asize as u8) << 3 | NodeKind::Elem.code());
        let half = if ne { 1 << 15 } else { 0 } | name;
        self.table.extend_from_slice(&half.to_be_bytes());
        self.table.push(uri as u8);
        self.table.extend_from_slice(&dist.to_be_bytes());
        self.table.extend_from_slice(&asize.to_be_bytes());
        self.table.extend_from_slice(&pre.to_be_bytes());
        Ok(())
    }

    fn add_attr(&mut self, pre: u32, name: u16, value: &[u8], dist: u32, uri: u32) -> Result<()> {
        let off = self.text_off(value, false)?;
        self.table.push((dist as u8) << 3 | NodeKind::Attr.code());
        self.table.extend_from_slice(&name.to_be_bytes());
        self.table.extend_from_slice(&off.to_be_bytes()[3..8]);
        self.table.extend_from_slice(&uri.to_be_bytes());
        self.table.extend_from_slice(&pre.to_be_bytes());
        Ok(())
    }

    fn add_text(&mut self, pre: u32, value: &[u8], dist: u32, kind: NodeKind) -> Result<()> {
        let off = self.text_off(value, true)?;
        self.table.push(kind.code());
        self.table.extend_from_slice(&0u16.to_be_bytes());
        self.table.extend_from_slice(&off.to_be_bytes()[3..8]);
        self.table.extend_from_slice(&dist.to_be_bytes());
        self.table.extend_from_slice(&pre.to_be_bytes());
        Ok(())
    }

    fn set_size(&mut self, pre: u32, size: u32) -> Result<()> {
        let off = pre as usize * ROW_SIZE + 8;
        self.table[off..off + 4].copy_from_slice(&size.to_be_bytes());
        Ok(())
    }

    fn finish(
        self,
        meta: Meta,
        elem_names: Names,
        attr_names: Names,
        ns: Namespaces,
        path: PathSummary,
        progress: &Progress,
    ) -> Result<MemData> {
        progress.set_phase(Phase::Done);
        Ok(MemData {
            meta,
            elem_names,
            attr_names,
            ns,
            path,
            table: self.table,
            texts: self.texts,
            values: self.values,
            comp: self.comp,
        })
    }

    fn abort(&mut self) {
        self.table.clear();
        self.texts.clear();
        self.values.clear();
    }
}

/// Handle of a successfully built in-memory database
#[derive(Debug)]
pub struct MemData {
    pub meta: Meta,
    pub elem_names: Names,
    pub attr_names: Names,
    pub ns: Namespaces,
    pub path: PathSummary,
    pub table: Vec<u8>,
    pub texts: Vec<u8>,
    pub values: Vec<u8>,
    comp: Compressor,
}

impl MemData {
    /// Number of rows in the table
    pub fn rows(&self) -> u32 {
        (self.table.len() / ROW_SIZE) as u32
    }

    pub fn kind(&self, pre: u32) -> NodeKind {
        NodeKind::from_code(self.row(pre)[0] & 7).expect("valid node kind")
    }

    /// Name id of an element or attribute row
    pub fn name_id(&self, pre: u32) -> u16 {
        let row = self.row(pre);
        u16::from_be_bytes([row[1], row[2]]) & 0x7FFF
    }

    /// Namespace flag of an element row
    pub fn ns_flag(&self, pre: u32) -> bool {
        self.row(pre)[1] & 0x80 != 0
    }

    /// Attribute count plus one, as stored in an element row header
    pub fn asize(&self, pre: u32) -> u32 {
        (self.row(pre)[0] >> 3) as u32
    }

    /// Distance to the parent row
    pub fn dist(&self, pre: u32) -> u32 {
        let row = self.row(pre);
        match self.kind(pre) {
            NodeKind::Doc => 1,
            NodeKind::Elem => be32(&row[4..8]),
            NodeKind::Attr => (row[0] >> 3) as u32,
            _ => be32(&row[8..12]),
        }
    }

    /// Subtree size; one for leaf kinds
    pub fn size(&self, pre: u32) -> u32 {
        if self.kind(pre).is_leaf() {
            1
        } else {
            be32(&self.row(pre)[8..12])
        }
    }

    /// Uri id of an element or attribute row
    pub fn uri(&self, pre: u32) -> u32 {
        let row = self.row(pre);
        match self.kind(pre) {
            NodeKind::Elem => row[3] as u32,
            NodeKind::Attr => be32(&row[8..12]),
            _ => 0,
        }
    }

    /// Node id stored with the row
    pub fn id(&self, pre: u32) -> u32 {
        be32(&self.row(pre)[12..16])
    }

    /// Document name or text content of a doc, text, comment or pi row
    pub fn text(&self, pre: u32) -> Result<Vec<u8>> {
        if matches!(self.kind(pre), NodeKind::Elem | NodeKind::Attr) {
            return Err(Error::new(
                ErrorKind::Internal,
                "row kind carries no text".to_string(),
            ));
        }
        self.token(&self.texts, self.text_ref(pre))
    }

    /// Value of an attribute row
    pub fn attr_value(&self, pre: u32) -> Result<Vec<u8>> {
        if self.kind(pre) != NodeKind::Attr {
            return Err(Error::new(
                ErrorKind::Internal,
                "row kind carries no attribute value".to_string(),
            ));
        }
        self.token(&self.values, self.text_ref(pre))
    }

    fn text_ref(&self, pre: u32) -> u64 {
        let row = self.row(pre);
        let mut v = 0u64;
        for &b in &row[3..8] {
            v = v << 8 | b as u64;
        }
        v
    }

    fn token(&self, heap: &[u8], reference: u64) -> Result<Vec<u8>> {
        if reference & OFFNUM != 0 {
            let num = (reference & 0x7FFF_FFFF) as u32;
            return Ok(num.to_string().into_bytes());
        }
        let compressed = reference & OFFCOMP != 0;
        let off = (reference & (OFFCOMP - 1)) as usize;
        let (len, used) = VByte::decode(&heap[off..])?;
        let token = &heap[off + used..off + used + len as usize];
        if compressed {
            self.comp.unpack(token)
        } else {
            Ok(token.to_vec())
        }
    }

    fn row(&self, pre: u32) -> &[u8] {
        let off = pre as usize * ROW_SIZE;
        &self.table[off..off + ROW_SIZE]
    }
}

fn be32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
