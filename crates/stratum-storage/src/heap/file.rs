//! Heap file manager with buffer pool integration.
//!
//! All page I/O is routed through the buffer pool. Pages are fetched from
//! the pool (loading from disk on a miss), modified under a write guard,
//! marked dirty, and written back lazily on eviction or flush.

use crate::disk::DiskManager;
use crate::heap::page::{
    HeapDataPage, HeapDataPageMut, HeapHeaderPage, HeapHeaderPageMut, DATA_PAGE_HEADER_SIZE,
    FIRST_DATA_PAGE, HEAP_MAGIC,
};
use std::sync::Arc;
use stratum_buffer::BufferPool;
use stratum_common::page::{PageData, PageId, PageNo, PAGE_SIZE};
use stratum_common::types::RecordId;
use stratum_common::{Result, StratumError};
use tracing::debug;

/// Heap file of fixed-length records backed by the buffer pool.
pub struct HeapFile {
    /// Disk manager for page I/O.
    disk: Arc<DiskManager>,
    /// Buffer pool for page caching.
    pool: Arc<BufferPool>,
    /// Runtime file ID.
    file_id: u32,
    /// File name within the data directory.
    name: String,
    /// Length in bytes of every record.
    record_len: usize,
}

impl HeapFile {
    /// Creates a new heap file with the given record length.
    pub fn create(
        disk: Arc<DiskManager>,
        pool: Arc<BufferPool>,
        name: &str,
        record_len: usize,
    ) -> Result<Self> {
        if record_len == 0 || record_len > PAGE_SIZE - DATA_PAGE_HEADER_SIZE {
            return Err(StratumError::InvalidParameter {
                name: "record_len".to_string(),
                value: record_len.to_string(),
            });
        }

        let file_id = disk.create(name)?;
        let header_no = disk.allocate_page(file_id)?;
        let page_id = PageId::new(file_id, header_no);

        let (frame, evicted) = pool.new_page(page_id)?;
        if let Some(ev) = evicted {
            if let Err(e) = disk.write_page(ev.page_id, &ev.data) {
                pool.unpin_page(page_id, false);
                return Err(e);
            }
        }
        {
            let mut data = frame.write_data();
            HeapHeaderPageMut::new(&mut **data).init(record_len);
        }
        pool.unpin_page(page_id, true);

        debug!(name, record_len, "created heap file");

        Ok(Self {
            disk,
            pool,
            file_id,
            name: name.to_string(),
            record_len,
        })
    }

    /// Opens an existing heap file, reading the record length from its
    /// header page.
    pub fn open(disk: Arc<DiskManager>, pool: Arc<BufferPool>, name: &str) -> Result<Self> {
        let file_id = disk.open(name)?;

        let heap = Self {
            disk,
            pool,
            file_id,
            name: name.to_string(),
            record_len: 0,
        };

        let header_data = heap.fetch_page_data(1)?;
        let header = HeapHeaderPage::new(&header_data);
        if header.magic() != HEAP_MAGIC {
            return Err(StratumError::PageCorrupted {
                page_no: 1,
                reason: format!("bad heap magic in file {:?}", heap.name),
            });
        }
        let record_len = header.record_len();
        if record_len == 0 || record_len > PAGE_SIZE - DATA_PAGE_HEADER_SIZE {
            return Err(StratumError::PageCorrupted {
                page_no: 1,
                reason: format!("bad record length {} in file {:?}", record_len, heap.name),
            });
        }

        Ok(Self { record_len, ..heap })
    }

    /// Returns the heap file's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the runtime file ID.
    pub fn file_id(&self) -> u32 {
        self.file_id
    }

    /// Returns the fixed record length.
    pub fn record_len(&self) -> usize {
        self.record_len
    }

    /// Fetches a page's contents through the pool, loading it from disk on
    /// a miss. The page is unpinned again before returning.
    fn fetch_page_data(&self, page_no: PageNo) -> Result<PageData> {
        let page_id = PageId::new(self.file_id, page_no);

        if let Some(frame) = self.pool.fetch_page(page_id) {
            let mut data = [0u8; PAGE_SIZE];
            frame.copy_to(&mut data);
            self.pool.unpin_page(page_id, false);
            return Ok(data);
        }

        let disk_data = self.disk.read_page(page_id)?;
        let (frame, evicted) = self.pool.load_page(page_id, &disk_data)?;
        if let Some(ev) = evicted {
            if let Err(e) = self.disk.write_page(ev.page_id, &ev.data) {
                self.pool.unpin_page(page_id, false);
                return Err(e);
            }
        }
        let mut data = [0u8; PAGE_SIZE];
        frame.copy_to(&mut data);
        self.pool.unpin_page(page_id, false);
        Ok(data)
    }

    /// Loads a page into the pool if it is not already resident.
    fn ensure_resident(&self, page_id: PageId) -> Result<()> {
        if self.pool.contains(page_id) {
            return Ok(());
        }
        let disk_data = self.disk.read_page(page_id)?;
        let (_, evicted) = self.pool.load_page(page_id, &disk_data)?;
        if let Some(ev) = evicted {
            if let Err(e) = self.disk.write_page(ev.page_id, &ev.data) {
                self.pool.unpin_page(page_id, false);
                return Err(e);
            }
        }
        self.pool.unpin_page(page_id, false);
        Ok(())
    }

    /// Appends a record, returning its record ID.
    pub fn insert(&self, record: &[u8]) -> Result<RecordId> {
        if record.len() != self.record_len {
            return Err(StratumError::RecordSizeMismatch {
                size: record.len(),
                expected: self.record_len,
            });
        }

        // Try the last data page first.
        let num_pages = self.disk.num_pages(self.file_id)?;
        if num_pages >= FIRST_DATA_PAGE {
            let page_id = PageId::new(self.file_id, num_pages);
            self.ensure_resident(page_id)?;
            if let Some(guard) = self.pool.write_page(page_id) {
                let slot = {
                    let mut data = guard.data_mut();
                    HeapDataPageMut::new(&mut **data).push_record(record)
                };
                if let Some(slot) = slot {
                    guard.set_dirty();
                    return Ok(RecordId::new(num_pages, slot));
                }
            }
        }

        // Last page full (or no data pages yet): start a fresh one.
        let page_no = self.disk.allocate_page(self.file_id)?;
        let page_id = PageId::new(self.file_id, page_no);
        let (frame, evicted) = self.pool.new_page(page_id)?;
        if let Some(ev) = evicted {
            if let Err(e) = self.disk.write_page(ev.page_id, &ev.data) {
                self.pool.unpin_page(page_id, false);
                return Err(e);
            }
        }
        let slot = {
            let mut data = frame.write_data();
            HeapDataPageMut::new(&mut **data).push_record(record)
        };
        self.pool.unpin_page(page_id, true);

        match slot {
            Some(slot) => Ok(RecordId::new(page_no, slot)),
            None => Err(StratumError::PageCorrupted {
                page_no,
                reason: "record does not fit an empty data page".to_string(),
            }),
        }
    }

    /// Returns a copy of the record with the given ID, or None if the ID
    /// does not name a stored record.
    pub fn get(&self, rid: RecordId) -> Result<Option<Vec<u8>>> {
        if !rid.is_valid()
            || rid.page_no < FIRST_DATA_PAGE
            || rid.page_no > self.disk.num_pages(self.file_id)?
        {
            return Ok(None);
        }

        let page_id = PageId::new(self.file_id, rid.page_no);
        self.ensure_resident(page_id)?;
        let guard = self
            .pool
            .read_page(page_id)
            .ok_or(StratumError::PageNotFound {
                file_id: self.file_id,
                page_no: rid.page_no,
            })?;
        let data = guard.data();
        let page = HeapDataPage::new(&**data);
        Ok(page
            .record(rid.slot_no as usize, self.record_len)
            .map(|r| r.to_vec()))
    }

    /// Starts a sequential scan over every record in the heap.
    pub fn scan(&self) -> Result<HeapScan<'_>> {
        let num_pages = self.disk.num_pages(self.file_id)?;
        Ok(HeapScan {
            heap: self,
            num_pages,
            next_page: FIRST_DATA_PAGE,
            current: None,
        })
    }

    /// Flushes all dirty pages of this heap file to disk.
    pub fn flush(&self) -> Result<()> {
        let disk = &self.disk;
        self.pool.flush_file(self.file_id, |page_id, data| {
            let page: &PageData = data.try_into().map_err(|_| StratumError::PageCorrupted {
                page_no: page_id.page_no,
                reason: "short page buffer".to_string(),
            })?;
            disk.write_page(page_id, page)
        })?;
        self.disk.flush(self.file_id)
    }
}

/// Sequential scanner over a heap file's records.
///
/// Fetches one data page at a time and yields `(record id, record bytes)`
/// in physical order.
pub struct HeapScan<'a> {
    heap: &'a HeapFile,
    /// Page count snapshot taken when the scan started.
    num_pages: u32,
    /// Next data page to fetch.
    next_page: PageNo,
    /// Current page: (page number, contents, record count, next slot).
    current: Option<(PageNo, Box<PageData>, usize, usize)>,
}

impl HeapScan<'_> {
    /// Returns the next record, or None when the heap is exhausted.
    pub fn next_record(&mut self) -> Result<Option<(RecordId, Vec<u8>)>> {
        loop {
            if let Some((page_no, data, count, slot)) = self.current.as_mut() {
                if *slot < *count {
                    let page = HeapDataPage::new(&**data);
                    let record = page
                        .record(*slot, self.heap.record_len)
                        .ok_or_else(|| StratumError::PageCorrupted {
                            page_no: *page_no,
                            reason: "record count overruns page".to_string(),
                        })?
                        .to_vec();
                    let rid = RecordId::new(*page_no, *slot as u16);
                    *slot += 1;
                    return Ok(Some((rid, record)));
                }
            }

            // Current page exhausted (or none fetched yet): move on.
            if self.next_page > self.num_pages {
                return Ok(None);
            }

            let page_no = self.next_page;
            self.next_page += 1;
            let data = Box::new(self.heap.fetch_page_data(page_no)?);
            let count = HeapDataPage::new(&data).record_count();
            self.current = Some((page_no, data, count, 0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_common::config::{BufferPoolConfig, DiskManagerConfig};
    use tempfile::tempdir;

    fn setup(num_frames: usize) -> (Arc<DiskManager>, Arc<BufferPool>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let disk = Arc::new(
            DiskManager::new(DiskManagerConfig {
                data_dir: dir.path().to_path_buf(),
                fsync_enabled: false,
            })
            .unwrap(),
        );
        let pool = Arc::new(BufferPool::new(BufferPoolConfig { num_frames }));
        (disk, pool, dir)
    }

    fn record_with_tag(len: usize, tag: u8) -> Vec<u8> {
        let mut record = vec![0u8; len];
        record[0] = tag;
        record
    }

    #[test]
    fn test_heap_create_and_open() {
        let (disk, pool, _dir) = setup(16);

        {
            let heap =
                HeapFile::create(Arc::clone(&disk), Arc::clone(&pool), "employees", 64).unwrap();
            assert_eq!(heap.record_len(), 64);
            assert_eq!(heap.name(), "employees");
            heap.flush().unwrap();
        }

        let heap = HeapFile::open(disk, pool, "employees").unwrap();
        assert_eq!(heap.record_len(), 64);
    }

    #[test]
    fn test_heap_create_rejects_bad_record_len() {
        let (disk, pool, _dir) = setup(16);

        let result = HeapFile::create(Arc::clone(&disk), Arc::clone(&pool), "a", 0);
        assert!(matches!(result, Err(StratumError::InvalidParameter { .. })));

        let result = HeapFile::create(disk, pool, "b", PAGE_SIZE);
        assert!(matches!(result, Err(StratumError::InvalidParameter { .. })));
    }

    #[test]
    fn test_heap_open_missing_fails() {
        let (disk, pool, _dir) = setup(16);
        let result = HeapFile::open(disk, pool, "nope");
        assert!(matches!(result, Err(StratumError::FileNotFound(_))));
    }

    #[test]
    fn test_heap_insert_assigns_sequential_rids() {
        let (disk, pool, _dir) = setup(16);
        let heap = HeapFile::create(disk, pool, "t", 800).unwrap();

        // 800-byte records: 10 per page, data pages start at page 2
        for i in 0..25u8 {
            let rid = heap.insert(&record_with_tag(800, i)).unwrap();
            assert_eq!(rid.page_no, (i as u32 / 10) + 2);
            assert_eq!(rid.slot_no, (i as u16) % 10);
        }
    }

    #[test]
    fn test_heap_insert_wrong_size_fails() {
        let (disk, pool, _dir) = setup(16);
        let heap = HeapFile::create(disk, pool, "t", 64).unwrap();

        let result = heap.insert(&[0u8; 63]);
        assert!(matches!(
            result,
            Err(StratumError::RecordSizeMismatch {
                size: 63,
                expected: 64
            })
        ));
    }

    #[test]
    fn test_heap_get() {
        let (disk, pool, _dir) = setup(16);
        let heap = HeapFile::create(disk, pool, "t", 64).unwrap();

        let rid = heap.insert(&record_with_tag(64, 0x42)).unwrap();
        let record = heap.get(rid).unwrap().unwrap();
        assert_eq!(record[0], 0x42);
        assert_eq!(record.len(), 64);

        // Invalid and out-of-range IDs
        assert_eq!(heap.get(RecordId::INVALID).unwrap(), None);
        assert_eq!(heap.get(RecordId::new(99, 0)).unwrap(), None);
        assert_eq!(heap.get(RecordId::new(rid.page_no, 50)).unwrap(), None);
    }

    #[test]
    fn test_heap_scan_empty() {
        let (disk, pool, _dir) = setup(16);
        let heap = HeapFile::create(disk, pool, "t", 64).unwrap();

        let mut scan = heap.scan().unwrap();
        assert!(scan.next_record().unwrap().is_none());
    }

    #[test]
    fn test_heap_scan_returns_records_in_order() {
        let (disk, pool, _dir) = setup(16);
        let heap = HeapFile::create(disk, pool, "t", 800).unwrap();

        let mut inserted = Vec::new();
        for i in 0..37u8 {
            let rid = heap.insert(&record_with_tag(800, i)).unwrap();
            inserted.push((rid, i));
        }

        let mut scan = heap.scan().unwrap();
        let mut seen = Vec::new();
        while let Some((rid, record)) = scan.next_record().unwrap() {
            seen.push((rid, record[0]));
        }
        assert_eq!(seen, inserted);
    }

    #[test]
    fn test_heap_scan_survives_small_pool() {
        // More data pages than frames forces eviction and reload mid-scan.
        let (disk, pool, _dir) = setup(4);
        let heap = HeapFile::create(Arc::clone(&disk), Arc::clone(&pool), "t", 2048).unwrap();

        let total = 40u8; // 3 records per page -> 14 data pages
        for i in 0..total {
            heap.insert(&record_with_tag(2048, i)).unwrap();
        }

        let mut scan = heap.scan().unwrap();
        let mut count = 0u8;
        while let Some((_, record)) = scan.next_record().unwrap() {
            assert_eq!(record[0], count);
            count += 1;
        }
        assert_eq!(count, total);
    }

    #[test]
    fn test_heap_persistence_across_reopen() {
        let dir = tempdir().unwrap();
        let config = DiskManagerConfig {
            data_dir: dir.path().to_path_buf(),
            fsync_enabled: false,
        };

        {
            let disk = Arc::new(DiskManager::new(config.clone()).unwrap());
            let pool = Arc::new(BufferPool::new(BufferPoolConfig { num_frames: 8 }));
            let heap = HeapFile::create(disk, pool, "t", 128).unwrap();
            for i in 0..100u8 {
                heap.insert(&record_with_tag(128, i)).unwrap();
            }
            heap.flush().unwrap();
        }

        let disk = Arc::new(DiskManager::new(config).unwrap());
        let pool = Arc::new(BufferPool::new(BufferPoolConfig { num_frames: 8 }));
        let heap = HeapFile::open(disk, pool, "t").unwrap();
        assert_eq!(heap.record_len(), 128);

        let mut scan = heap.scan().unwrap();
        let mut count = 0u8;
        while let Some((_, record)) = scan.next_record().unwrap() {
            assert_eq!(record[0], count);
            count += 1;
        }
        assert_eq!(count, 100);
    }
}
