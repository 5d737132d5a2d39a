pub mod core;
pub mod storage;
pub mod compression;
pub mod index;
pub mod build;

/*
┌──────────────────────────────────────────────────────────────────────────┐
│                        XYLEMDB BUILD PIPELINE                            │
└──────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── FRONT-END ───────────────────────────────┐
│                                                                          │
│  trait Parser ──events──> struct Builder<B: Backend>                     │
│  • parse(sink)            • meta: Meta          // size, ndocs, lastid   │
│  • detail()               • elem_names: Names   // element dictionary    │
│  • source()               • attr_names: Names   // attribute dictionary  │
│                           • ns: Namespaces      // scopes bound to pre   │
│  struct EventParser       • path: PathSummary   // distinct paths        │
│  • replays Vec<Event>     • pstack / tstack     // open ancestors        │
│                           • progress: Progress  // cross-thread view     │
└──────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── BACK-ENDS ───────────────────────────────┐
│                                                                          │
│  trait Backend { add_doc, add_elem, add_attr, add_text,                  │
│                  set_size, finish, abort }                               │
│                                                                          │
│  struct DiskBackend ──────────────> struct DiskData                      │
│  • tout/xout/vout: DataOutput       // tbl, txt, atv                     │
│  • sout: DataOutput                 // tmp (pre, size) pairs             │
│  • patch pass: TableDiskAccess      // write4(pre, 8, size)              │
│                                                                          │
│  struct MemBackend ───────────────> struct MemData                       │
│  • table/texts/values: Vec<u8>      // same byte layout as disk          │
│  • set_size patches rows in place   // no second pass                    │
└──────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── STORAGE ─────────────────────────────────┐
│                                                                          │
│  struct DataOutput                  struct Compressor                    │
│  • write1/2/4/5 (big-endian)        • pack -> (bytes, compressed)        │
│  • write_num (vbyte varint)         • lz4 / zstd / snappy                │
│  • write_token (length-prefixed)                                         │
│                                                                          │
│  row = 16 bytes: kind | name/flags | text-ref or uri+dist | size | pre   │
│  text-ref = 40 bits: OFFNUM inlined int | OFFCOMP packed | raw offset    │
└──────────────────────────────────────────────────────────────────────────┘

Builder ──rows──> Backend ──bytes──> tbl/txt/atv          (disk)
   │                        └──────> table/texts/values   (memory)
   ├──names──> Names ──stats──> leaf flags, value lengths
   ├──scopes──> Namespaces ──uris──> uri ids in rows
   └──positions──> PathSummary ──queries──> distinct paths, depths
*/
