//! The B+ tree index engine.
//!
//! One index instance owns one paged file. The meta page (page 1) names
//! the relation, the indexed attribute, and the current root; the tree
//! below the root always keeps at least one internal node, so the initial
//! empty index is a key-less level-1 root pointing at a single empty leaf.
//!
//! Pin discipline: every page read or allocated is pinned through the
//! buffer pool and unpinned on every exit path, dirty exactly when the
//! path mutated it. The only pin that survives a public call is the scan
//! cursor's current leaf.

use crate::btree::node::{
    relation_name_bytes, InternalPage, InternalPageMut, LeafPage, LeafPageMut, MetaPage,
    MetaPageMut, LEAF_CAPACITY, NODE_CAPACITY, RELATION_NAME_LEN,
};
use crate::btree::key_at_offset;
use crate::disk::DiskManager;
use crate::heap::HeapFile;
use std::sync::Arc;
use stratum_buffer::BufferPool;
use stratum_common::page::{PageData, PageId, PageNo, INVALID_PAGE_NO};
use stratum_common::types::{AttrType, Operator, RecordId};
use stratum_common::{Result, StratumError};
use tracing::{debug, info};

/// Page number of the meta page, always the first page of the index file.
const META_PAGE_NO: PageNo = 1;

/// State of the single scan cursor.
struct ScanState {
    low_val: i32,
    low_op: Operator,
    high_val: i32,
    high_op: Operator,
    /// Pinned leaf and index of the next entry to return; None once the
    /// scan has run to exhaustion (no page pinned).
    position: Option<(PageNo, usize)>,
}

/// Disk-resident B+ tree index over one integer attribute of a relation.
///
/// Supports insertion and one active range scan at a time. Starting a new
/// scan implicitly ends the previous one.
pub struct BTreeIndex {
    disk: Arc<DiskManager>,
    pool: Arc<BufferPool>,
    file_id: u32,
    index_name: String,
    relation_name: String,
    attr_byte_offset: usize,
    attr_type: AttrType,
    root_page_no: PageNo,
    scan: Option<ScanState>,
    closed: bool,
}

impl BTreeIndex {
    /// Opens the index for `relation_name` over the attribute at
    /// `attr_byte_offset`, creating and bulk-loading it from the
    /// relation's heap file if the index file does not exist yet.
    ///
    /// The index file is named `"<relation_name>.<attr_byte_offset>"`. On
    /// reopen the meta page must match the supplied parameters exactly or
    /// the call fails with BadIndexInfo.
    pub fn open_or_create(
        disk: Arc<DiskManager>,
        pool: Arc<BufferPool>,
        relation_name: &str,
        attr_byte_offset: usize,
        attr_type: AttrType,
    ) -> Result<Self> {
        if relation_name.len() > RELATION_NAME_LEN {
            return Err(StratumError::RelationNameTooLong(relation_name.to_string()));
        }
        if attr_type != AttrType::Integer {
            return Err(StratumError::UnsupportedAttrType(attr_type.to_string()));
        }

        let index_name = format!("{}.{}", relation_name, attr_byte_offset);

        if disk.exists(&index_name) {
            Self::open(disk, pool, relation_name, index_name, attr_byte_offset, attr_type)
        } else {
            Self::create(disk, pool, relation_name, index_name, attr_byte_offset, attr_type)
        }
    }

    fn create(
        disk: Arc<DiskManager>,
        pool: Arc<BufferPool>,
        relation_name: &str,
        index_name: String,
        attr_byte_offset: usize,
        attr_type: AttrType,
    ) -> Result<Self> {
        let file_id = disk.create(&index_name)?;
        info!(relation = relation_name, index = %index_name, "creating index file");

        let mut index = Self {
            disk,
            pool,
            file_id,
            index_name,
            relation_name: relation_name.to_string(),
            attr_byte_offset,
            attr_type,
            root_page_no: INVALID_PAGE_NO,
            scan: None,
            closed: false,
        };

        let meta_no = index.alloc_page_pinned()?;
        let root_no = match index.alloc_page_pinned() {
            Ok(n) => n,
            Err(e) => {
                index.unpin(meta_no, false);
                return Err(e);
            }
        };
        let leaf_no = match index.alloc_page_pinned() {
            Ok(n) => n,
            Err(e) => {
                index.unpin(meta_no, false);
                index.unpin(root_no, false);
                return Err(e);
            }
        };

        index.write_view(meta_no, |data| {
            MetaPageMut::new(data).init(
                relation_name,
                attr_byte_offset as i32,
                attr_type,
                root_no,
            )
        })?;
        index.write_view(root_no, |data| {
            let mut root = InternalPageMut::new(data);
            root.reset(1);
            root.set_child(0, leaf_no);
        })?;
        index.write_view(leaf_no, |data| {
            LeafPageMut::new(data).reset(INVALID_PAGE_NO);
        })?;

        index.unpin(meta_no, true);
        index.unpin(root_no, true);
        index.unpin(leaf_no, true);
        index.root_page_no = root_no;

        // Bulk load: stream every record of the relation's heap file and
        // insert the key found at the attribute offset.
        let heap = HeapFile::open(
            Arc::clone(&index.disk),
            Arc::clone(&index.pool),
            relation_name,
        )?;
        let mut scan = heap.scan()?;
        let mut loaded = 0u64;
        while let Some((rid, record)) = scan.next_record()? {
            let key = key_at_offset(&record, attr_byte_offset)?;
            index.insert(key, rid)?;
            loaded += 1;
        }

        index.flush()?;
        info!(index = %index.index_name, records = loaded, "index bulk load complete");

        Ok(index)
    }

    fn open(
        disk: Arc<DiskManager>,
        pool: Arc<BufferPool>,
        relation_name: &str,
        index_name: String,
        attr_byte_offset: usize,
        attr_type: AttrType,
    ) -> Result<Self> {
        let file_id = disk.open(&index_name)?;

        let mut index = Self {
            disk,
            pool,
            file_id,
            index_name,
            relation_name: relation_name.to_string(),
            attr_byte_offset,
            attr_type,
            root_page_no: INVALID_PAGE_NO,
            scan: None,
            closed: false,
        };

        let meta_no = index
            .disk
            .first_page_no(file_id)?
            .ok_or_else(|| StratumError::BadIndexInfo(index.index_name.clone()))?;

        index.pin_page(meta_no)?;
        let (name_matches, stored_offset, stored_tag, stored_root) =
            match index.read_view(meta_no, |data| {
                let meta = MetaPage::new(data);
                (
                    meta.relation_name() == &relation_name_bytes(relation_name),
                    meta.attr_byte_offset(),
                    meta.attr_type_tag(),
                    meta.root_page_no(),
                )
            }) {
                Ok(v) => v,
                Err(e) => {
                    index.unpin(meta_no, false);
                    return Err(e);
                }
            };
        index.unpin(meta_no, false);

        let type_matches = AttrType::from_i32(stored_tag) == Some(attr_type);
        if !name_matches || stored_offset != attr_byte_offset as i32 || !type_matches {
            return Err(StratumError::BadIndexInfo(index.index_name.clone()));
        }

        index.root_page_no = stored_root;
        debug!(index = %index.index_name, root = stored_root, "opened existing index");

        Ok(index)
    }

    /// Returns the derived index file name.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Returns the indexed relation's name.
    pub fn relation_name(&self) -> &str {
        &self.relation_name
    }

    /// Returns the indexed attribute's byte offset within a record.
    pub fn attr_byte_offset(&self) -> usize {
        self.attr_byte_offset
    }

    /// Returns the indexed attribute's type.
    pub fn attr_type(&self) -> AttrType {
        self.attr_type
    }

    /// Returns the current root page number.
    pub fn root_page_no(&self) -> PageNo {
        self.root_page_no
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Inserts a (key, record id) entry.
    ///
    /// Descends to the destination leaf, splitting full nodes on the way
    /// back up; when the root itself splits, a new root is allocated and
    /// the meta page is updated. Keys are assumed unique.
    pub fn insert(&mut self, key: i32, rid: RecordId) -> Result<()> {
        let promoted = self.insert_descend(self.root_page_no, key, rid)?;

        if let Some((sep_key, sep_page)) = promoted {
            // The root split: grow the tree by one level. The new root is
            // always a non-leaf over two former-root siblings.
            let old_root = self.root_page_no;
            let new_root = self.alloc_page_pinned()?;
            self.write_view(new_root, |data| {
                let mut root = InternalPageMut::new(data);
                root.reset(0);
                root.set_child(0, old_root);
                root.insert_entry(0, 0, sep_key, sep_page);
            })?;
            self.unpin(new_root, true);

            self.pin_page(META_PAGE_NO)?;
            self.write_view(META_PAGE_NO, |data| {
                MetaPageMut::new(data).set_root_page_no(new_root)
            })?;
            self.unpin(META_PAGE_NO, true);

            self.root_page_no = new_root;
            debug!(index = %self.index_name, new_root, "root split, tree height increased");
        }

        Ok(())
    }

    /// Recursive insertion worker for the subtree under `node_no`.
    ///
    /// Returns the (separator, new sibling) pair a split pushed or copied
    /// up, or None if no split reached this level.
    fn insert_descend(
        &self,
        node_no: PageNo,
        key: i32,
        rid: RecordId,
    ) -> Result<Option<(i32, PageNo)>> {
        self.pin_page(node_no)?;
        let (level, child_no) = match self.read_view(node_no, |data| {
            let node = InternalPage::new(data);
            (node.level(), node.find_child(key, Operator::Gt))
        }) {
            Ok(v) => v,
            Err(e) => {
                self.unpin(node_no, false);
                return Err(e);
            }
        };

        let outcome = if level == 1 {
            self.insert_into_leaf(child_no, key, rid)
        } else {
            self.insert_descend(child_no, key, rid)
        };
        let promoted = match outcome {
            Ok(p) => p,
            Err(e) => {
                self.unpin(node_no, false);
                return Err(e);
            }
        };

        let Some((sep_key, sep_page)) = promoted else {
            self.unpin(node_no, false);
            return Ok(None);
        };

        match self.insert_into_node(node_no, sep_key, sep_page) {
            Ok(result) => {
                self.unpin(node_no, true);
                Ok(result)
            }
            Err(e) => {
                // Failures happen before any mutation of this node
                self.unpin(node_no, false);
                Err(e)
            }
        }
    }

    /// Inserts into the destination leaf, splitting it when full.
    fn insert_into_leaf(
        &self,
        leaf_no: PageNo,
        key: i32,
        rid: RecordId,
    ) -> Result<Option<(i32, PageNo)>> {
        self.pin_page(leaf_no)?;
        let (m, pos) = match self.read_view(leaf_no, |data| {
            let leaf = LeafPage::new(data);
            let m = leaf.entry_count();
            (m, leaf.insert_position(key, m))
        }) {
            Ok(v) => v,
            Err(e) => {
                self.unpin(leaf_no, false);
                return Err(e);
            }
        };

        if m < LEAF_CAPACITY {
            match self.write_view(leaf_no, |data| {
                LeafPageMut::new(data).insert_entry(pos, m, key, rid)
            }) {
                Ok(()) => {
                    self.unpin(leaf_no, true);
                    return Ok(None);
                }
                Err(e) => {
                    self.unpin(leaf_no, false);
                    return Err(e);
                }
            }
        }

        // Leaf full: split it and copy the new sibling's first key up.
        let new_no = match self.alloc_page_pinned() {
            Ok(n) => n,
            Err(e) => {
                self.unpin(leaf_no, false);
                return Err(e);
            }
        };

        let split = self.write_view(leaf_no, |old_data| {
            self.write_view(new_no, |new_data| {
                split_leaf(old_data, new_data, new_no, pos, key, rid)
            })
        });
        match split {
            Ok(Ok(sep_key)) => {
                self.unpin(new_no, true);
                self.unpin(leaf_no, true);
                Ok(Some((sep_key, new_no)))
            }
            Ok(Err(e)) | Err(e) => {
                self.unpin(new_no, false);
                self.unpin(leaf_no, false);
                Err(e)
            }
        }
    }

    /// Inserts a (separator, right child) pair into an internal node that
    /// is already pinned by the caller, splitting it when full. The caller
    /// unpins the node.
    fn insert_into_node(
        &self,
        node_no: PageNo,
        key: i32,
        right_child: PageNo,
    ) -> Result<Option<(i32, PageNo)>> {
        let (m, pos) = self.read_view(node_no, |data| {
            let node = InternalPage::new(data);
            let m = node.key_count();
            (m, node.insert_position(key, m))
        })?;

        if m < NODE_CAPACITY {
            self.write_view(node_no, |data| {
                InternalPageMut::new(data).insert_entry(pos, m, key, right_child)
            })?;
            return Ok(None);
        }

        // Node full: split it and push the median up, out of this level.
        let new_no = self.alloc_page_pinned()?;

        let split = self.write_view(node_no, |old_data| {
            self.write_view(new_no, |new_data| {
                split_internal(old_data, new_data, pos, key, right_child)
            })
        });
        match split {
            Ok(Ok(pushed)) => {
                self.unpin(new_no, true);
                Ok(Some((pushed, new_no)))
            }
            Ok(Err(e)) | Err(e) => {
                self.unpin(new_no, false);
                Err(e)
            }
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Descends from the root to the leaf whose key range can contain
    /// `key` under the given operator (GT for insertion, the scan's low
    /// operator for scans). Exactly one page is pinned at a time; each
    /// interior page is unpinned clean before its child is read.
    fn find_leaf(&self, key: i32, op: Operator) -> Result<PageNo> {
        let mut current = self.root_page_no;
        loop {
            self.pin_page(current)?;
            let (level, child) = match self.read_view(current, |data| {
                let node = InternalPage::new(data);
                (node.level(), node.find_child(key, op))
            }) {
                Ok(v) => v,
                Err(e) => {
                    self.unpin(current, false);
                    return Err(e);
                }
            };
            self.unpin(current, false);

            if level == 1 {
                return Ok(child);
            }
            current = child;
        }
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    /// Begins a range scan over keys satisfying both bounds.
    ///
    /// `low_op` must be GT or GTE and `high_op` LT or LTE. Any scan
    /// already in progress is ended first. Fails with NoSuchKeyFound (and
    /// returns to the idle state) when no key qualifies.
    pub fn start_scan(
        &mut self,
        low_val: i32,
        low_op: Operator,
        high_val: i32,
        high_op: Operator,
    ) -> Result<()> {
        if !low_op.is_lower_bound() || !high_op.is_upper_bound() {
            return Err(StratumError::BadOpcodes);
        }
        if low_val > high_val {
            return Err(StratumError::BadScanRange {
                low: low_val,
                high: high_val,
            });
        }

        if self.scan.is_some() {
            self.end_scan()?;
        }

        let leaf_no = self.find_leaf(low_val, low_op)?;
        self.pin_page(leaf_no)?;

        match self.advance_from(leaf_no, 0, low_val, low_op, high_val, high_op)? {
            Some(position) => {
                self.scan = Some(ScanState {
                    low_val,
                    low_op,
                    high_val,
                    high_op,
                    position: Some(position),
                });
                Ok(())
            }
            None => Err(StratumError::NoSuchKeyFound),
        }
    }

    /// Returns the record ID under the cursor and advances it.
    ///
    /// Fails with ScanNotInitialized when no scan is active and
    /// IndexScanCompleted once the cursor is exhausted.
    pub fn scan_next(&mut self) -> Result<RecordId> {
        let state = self.scan.as_ref().ok_or(StratumError::ScanNotInitialized)?;
        let (page_no, idx) = state.position.ok_or(StratumError::IndexScanCompleted)?;
        let (low_val, low_op, high_val, high_op) = (
            state.low_val,
            state.low_op,
            state.high_val,
            state.high_op,
        );

        let rid = self.read_view(page_no, |data| LeafPage::new(data).rid_at(idx))?;

        let next = match self.advance_from(page_no, idx + 1, low_val, low_op, high_val, high_op) {
            Ok(next) => next,
            Err(e) => {
                if let Some(state) = self.scan.as_mut() {
                    state.position = None;
                }
                return Err(e);
            }
        };
        if let Some(state) = self.scan.as_mut() {
            state.position = next;
        }

        Ok(rid)
    }

    /// Ends the active scan, unpinning the cursor's leaf.
    pub fn end_scan(&mut self) -> Result<()> {
        let state = self.scan.take().ok_or(StratumError::ScanNotInitialized)?;
        if let Some((page_no, _)) = state.position {
            self.unpin(page_no, false);
        }
        Ok(())
    }

    /// Moves the cursor to the next qualifying entry at or after
    /// (`page_no`, `idx`), crossing right-sibling links as leaves run out.
    ///
    /// `page_no` is pinned on entry. Returns the new position with its
    /// page still pinned, or None with everything unpinned once the scan
    /// is exhausted (end of the leaf chain or a key past the high bound).
    fn advance_from(
        &self,
        mut page_no: PageNo,
        mut idx: usize,
        low_val: i32,
        low_op: Operator,
        high_val: i32,
        high_op: Operator,
    ) -> Result<Option<(PageNo, usize)>> {
        loop {
            let (at_end, key, right_sib) = match self.read_view(page_no, |data| {
                let leaf = LeafPage::new(data);
                if idx >= LEAF_CAPACITY || !leaf.rid_at(idx).is_valid() {
                    (true, 0, leaf.right_sibling())
                } else {
                    (false, leaf.key_at(idx), INVALID_PAGE_NO)
                }
            }) {
                Ok(v) => v,
                Err(e) => {
                    self.unpin(page_no, false);
                    return Err(e);
                }
            };

            if at_end {
                self.unpin(page_no, false);
                if right_sib == INVALID_PAGE_NO {
                    return Ok(None);
                }
                self.pin_page(right_sib)?;
                page_no = right_sib;
                idx = 0;
                continue;
            }

            // Below the low bound: skip. Only ever fires before the first
            // qualifying entry of a fresh scan.
            if !low_op.compare(key, low_val) {
                idx += 1;
                continue;
            }

            // Past the high bound: keys are ascending, nothing further
            // can qualify.
            if !high_op.compare(key, high_val) {
                self.unpin(page_no, false);
                return Ok(None);
            }

            return Ok(Some((page_no, idx)));
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Writes all of the index's dirty pages to disk and syncs the file.
    fn flush(&self) -> Result<()> {
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

    fn shutdown(&mut self) -> Result<()> {
        self.closed = true;
        if self.scan.is_some() {
            self.end_scan()?;
        }
        self.flush()?;
        self.disk.close_file(self.file_id)
    }

    /// Ends any active scan, flushes the index file, and consumes the
    /// index. Unlike dropping, errors are reported.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    // =========================================================================
    // Buffer pool plumbing
    // =========================================================================

    fn page_id(&self, page_no: PageNo) -> PageId {
        PageId::new(self.file_id, page_no)
    }

    /// Pins a page, loading it from disk if it is not resident. A dirty
    /// page displaced to make room is written back immediately.
    fn pin_page(&self, page_no: PageNo) -> Result<()> {
        let page_id = self.page_id(page_no);
        if self.pool.fetch_page(page_id).is_some() {
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
        Ok(())
    }

    /// Allocates a fresh page at the end of the index file and pins its
    /// zeroed frame.
    fn alloc_page_pinned(&self) -> Result<PageNo> {
        let page_no = self.disk.allocate_page(self.file_id)?;
        let page_id = self.page_id(page_no);
        let (_, evicted) = self.pool.new_page(page_id)?;
        if let Some(ev) = evicted {
            if let Err(e) = self.disk.write_page(ev.page_id, &ev.data) {
                self.pool.unpin_page(page_id, false);
                return Err(e);
            }
        }
        Ok(page_no)
    }

    fn unpin(&self, page_no: PageNo, dirty: bool) {
        self.pool.unpin_page(self.page_id(page_no), dirty);
    }

    /// Runs `f` over a pinned page's contents. The transient fetch pin is
    /// released before returning; the caller's own pin keeps the page
    /// resident.
    fn read_view<R>(&self, page_no: PageNo, f: impl FnOnce(&PageData) -> R) -> Result<R> {
        let page_id = self.page_id(page_no);
        let frame = self
            .pool
            .fetch_page(page_id)
            .ok_or_else(|| StratumError::IndexCorrupted(format!("page {} not resident", page_no)))?;
        let result = {
            let data = frame.read_data();
            f(&**data)
        };
        self.pool.unpin_page(page_id, false);
        Ok(result)
    }

    /// Runs `f` over a pinned page's contents with write access. Dirtiness
    /// is recorded by the caller's final unpin, not here.
    fn write_view<R>(&self, page_no: PageNo, f: impl FnOnce(&mut PageData) -> R) -> Result<R> {
        let page_id = self.page_id(page_no);
        let frame = self
            .pool
            .fetch_page(page_id)
            .ok_or_else(|| StratumError::IndexCorrupted(format!("page {} not resident", page_no)))?;
        let result = {
            let mut data = frame.write_data();
            f(&mut **data)
        };
        self.pool.unpin_page(page_id, false);
        Ok(result)
    }
}

impl Drop for BTreeIndex {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.shutdown();
        }
    }
}

/// Splits a full leaf around `mid = (m + 1) >> 1`, inserting the pending
/// entry into whichever half it belongs to, and returns the separator key
/// copied up to the parent (the new right sibling's first key).
///
/// The new leaf takes over the old leaf's right-sibling link; the old leaf
/// is truncated to the left half and linked to the new one.
fn split_leaf(
    old_data: &mut PageData,
    new_data: &mut PageData,
    new_page_no: PageNo,
    pos: usize,
    key: i32,
    rid: RecordId,
) -> i32 {
    let m = LEAF_CAPACITY;
    let mid = (m + 1) >> 1;

    let mut old = LeafPageMut::new(old_data);
    let mut new = LeafPageMut::new(new_data);

    new.reset(old.right_sibling());

    // When the insertion lands in the left half, slot 0 of the new leaf is
    // reserved for the median displaced by it.
    let start = usize::from(pos <= mid);
    for (j, i) in (mid..m).enumerate() {
        new.set_entry(start + j, old.key_at(i), old.rid_at(i));
    }

    if pos <= mid {
        old.insert_entry(pos, mid, key, rid);
        new.set_entry(0, old.key_at(mid), old.rid_at(mid));
    } else {
        new.insert_entry(pos - mid, m - mid, key, rid);
    }

    old.truncate(mid);
    old.set_right_sibling(new_page_no);

    new.key_at(0)
}

/// Splits a full internal node around `mid = (m + 1) >> 1`, inserting the
/// pending (separator, right child) pair into the proper half, and returns
/// the median key pushed up to the parent. Unlike a leaf split, the pushed
/// key leaves this level entirely.
fn split_internal(
    old_data: &mut PageData,
    new_data: &mut PageData,
    pos: usize,
    key: i32,
    right_child: PageNo,
) -> i32 {
    let m = NODE_CAPACITY;
    let mid = (m + 1) >> 1;

    let mut old = InternalPageMut::new(old_data);
    let mut new = InternalPageMut::new(new_data);

    new.reset(old.level());

    if pos <= mid {
        // Keys [mid, m) move right; the pending pair goes into the left
        // half, displacing the median (the pending key itself when
        // pos == mid) into the parent.
        for (j, i) in (mid..m).enumerate() {
            new.set_key(j, old.key_at(i));
            new.set_child(j + 1, old.child_at(i + 1));
        }
        old.insert_entry(pos, mid + 1, key, right_child);
        let pushed = old.key_at(mid);
        new.set_child(0, old.child_at(mid + 1));
        old.truncate(mid);
        pushed
    } else {
        // The median key [mid] is pushed up; keys (mid, m) and the pending
        // pair form the right half.
        new.set_child(0, old.child_at(mid + 1));
        for (j, i) in (mid + 1..m).enumerate() {
            new.set_key(j, old.key_at(i));
            new.set_child(j + 1, old.child_at(i + 1));
        }
        new.insert_entry(pos - mid - 1, m - mid - 1, key, right_child);
        let pushed = old.key_at(mid);
        old.truncate(mid);
        pushed
    }
}
