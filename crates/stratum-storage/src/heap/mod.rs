//! Heap files of fixed-length records.
//!
//! A heap file is the record store an index is built over: page 1 holds the
//! heap header (magic and record length), data pages follow. Records are
//! addressed by [`RecordId`] {data page, slot} and streamed in physical
//! order by [`HeapScan`] during index bulk load.
//!
//! [`RecordId`]: stratum_common::types::RecordId

pub mod file;
pub mod page;

pub use file::{HeapFile, HeapScan};
pub use page::{HeapDataPage, HeapDataPageMut, HeapHeaderPage, HeapHeaderPageMut};
