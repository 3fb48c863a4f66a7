//! Disk manager for page-level file I/O.
//!
//! Files are paged and addressed by name within a data directory. Pages are
//! numbered from 1; page number 0 is the INVALID sentinel, so the byte
//! offset of page p is `(p - 1) * PAGE_SIZE`. Each opened file receives a
//! runtime file ID, stable for the lifetime of the manager, which keys the
//! buffer pool's page table.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use stratum_common::config::DiskManagerConfig;
use stratum_common::page::{PageId, PageNo, INVALID_PAGE_NO, PAGE_SIZE};
use stratum_common::{Result, StratumError};

/// Manages reading and writing pages in named data files.
pub struct DiskManager {
    /// Configuration.
    config: DiskManagerConfig,
    /// Open file handles keyed by file ID.
    files: Mutex<HashMap<u32, FileHandle>>,
    /// Name to file ID mapping, stable across close/reopen.
    ids_by_name: Mutex<HashMap<String, u32>>,
    /// Next file ID to hand out.
    next_file_id: Mutex<u32>,
}

/// Handle for an open data file.
struct FileHandle {
    /// The open file.
    file: File,
    /// Path to the file.
    path: PathBuf,
    /// Number of pages in the file.
    num_pages: u32,
}

impl DiskManager {
    /// Creates a new disk manager, creating the data directory if needed.
    pub fn new(config: DiskManagerConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        Ok(Self {
            config,
            files: Mutex::new(HashMap::new()),
            ids_by_name: Mutex::new(HashMap::new()),
            next_file_id: Mutex::new(1),
        })
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Returns the path for a named file.
    fn file_path(&self, name: &str) -> PathBuf {
        self.config.data_dir.join(name)
    }

    /// Returns true if a file with the given name exists on disk.
    pub fn exists(&self, name: &str) -> bool {
        self.file_path(name).exists()
    }

    /// Assigns (or recalls) the runtime ID for a file name.
    fn id_for_name(&self, name: &str) -> u32 {
        let mut ids = self.ids_by_name.lock();
        if let Some(&id) = ids.get(name) {
            return id;
        }
        let mut next = self.next_file_id.lock();
        let id = *next;
        *next += 1;
        ids.insert(name.to_string(), id);
        id
    }

    /// Creates a new empty file. Fails if it already exists.
    pub fn create(&self, name: &str) -> Result<u32> {
        let path = self.file_path(name);
        if path.exists() {
            return Err(StratumError::FileExists(name.to_string()));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;

        let file_id = self.id_for_name(name);
        self.files.lock().insert(
            file_id,
            FileHandle {
                file,
                path,
                num_pages: 0,
            },
        );

        Ok(file_id)
    }

    /// Opens an existing file. Fails if it does not exist.
    ///
    /// Opening an already-open file returns the same file ID.
    pub fn open(&self, name: &str) -> Result<u32> {
        let path = self.file_path(name);
        if !path.exists() {
            return Err(StratumError::FileNotFound(name.to_string()));
        }

        let file_id = self.id_for_name(name);

        let mut files = self.files.lock();
        if files.contains_key(&file_id) {
            return Ok(file_id);
        }

        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let file_size = file.metadata()?.len();
        let num_pages = (file_size / PAGE_SIZE as u64) as u32;

        files.insert(
            file_id,
            FileHandle {
                file,
                path,
                num_pages,
            },
        );

        Ok(file_id)
    }

    /// Reads a page from disk.
    pub fn read_page(&self, page_id: PageId) -> Result<[u8; PAGE_SIZE]> {
        let mut files = self.files.lock();
        let handle = files
            .get_mut(&page_id.file_id)
            .ok_or(StratumError::PageNotFound {
                file_id: page_id.file_id,
                page_no: page_id.page_no,
            })?;

        if page_id.page_no == INVALID_PAGE_NO || page_id.page_no > handle.num_pages {
            return Err(StratumError::PageNotFound {
                file_id: page_id.file_id,
                page_no: page_id.page_no,
            });
        }

        let offset = (page_id.page_no as u64 - 1) * (PAGE_SIZE as u64);
        handle.file.seek(SeekFrom::Start(offset))?;

        let mut buffer = [0u8; PAGE_SIZE];
        handle.file.read_exact(&mut buffer)?;

        Ok(buffer)
    }

    /// Writes a page to disk.
    pub fn write_page(&self, page_id: PageId, data: &[u8; PAGE_SIZE]) -> Result<()> {
        let mut files = self.files.lock();
        let handle = files
            .get_mut(&page_id.file_id)
            .ok_or(StratumError::PageNotFound {
                file_id: page_id.file_id,
                page_no: page_id.page_no,
            })?;

        if page_id.page_no == INVALID_PAGE_NO {
            return Err(StratumError::PageNotFound {
                file_id: page_id.file_id,
                page_no: page_id.page_no,
            });
        }

        let offset = (page_id.page_no as u64 - 1) * (PAGE_SIZE as u64);
        handle.file.seek(SeekFrom::Start(offset))?;
        handle.file.write_all(data)?;

        if self.config.fsync_enabled {
            handle.file.sync_all()?;
        }

        if page_id.page_no > handle.num_pages {
            handle.num_pages = page_id.page_no;
        }

        Ok(())
    }

    /// Allocates a new page at the end of the file, zero-filled.
    ///
    /// Returns the page number of the new page (the first allocation in a
    /// fresh file returns page 1).
    pub fn allocate_page(&self, file_id: u32) -> Result<PageNo> {
        let mut files = self.files.lock();
        let handle = files.get_mut(&file_id).ok_or(StratumError::PageNotFound {
            file_id,
            page_no: INVALID_PAGE_NO,
        })?;

        let page_no = handle.num_pages + 1;

        let offset = (page_no as u64 - 1) * (PAGE_SIZE as u64);
        handle.file.seek(SeekFrom::Start(offset))?;
        handle.file.write_all(&[0u8; PAGE_SIZE])?;

        if self.config.fsync_enabled {
            handle.file.sync_all()?;
        }

        handle.num_pages = page_no;

        Ok(page_no)
    }

    /// Returns the number of pages in a file.
    pub fn num_pages(&self, file_id: u32) -> Result<u32> {
        let files = self.files.lock();
        let handle = files.get(&file_id).ok_or(StratumError::PageNotFound {
            file_id,
            page_no: INVALID_PAGE_NO,
        })?;
        Ok(handle.num_pages)
    }

    /// Returns the number of the file's first page, or None for an empty file.
    pub fn first_page_no(&self, file_id: u32) -> Result<Option<PageNo>> {
        let num_pages = self.num_pages(file_id)?;
        Ok(if num_pages == 0 { None } else { Some(1) })
    }

    /// Flushes a file's pending writes to stable storage.
    pub fn flush(&self, file_id: u32) -> Result<()> {
        let files = self.files.lock();
        let handle = files.get(&file_id).ok_or(StratumError::PageNotFound {
            file_id,
            page_no: INVALID_PAGE_NO,
        })?;
        handle.file.sync_all()?;
        Ok(())
    }

    /// Flushes all open files.
    pub fn flush_all(&self) -> Result<()> {
        let files = self.files.lock();
        for handle in files.values() {
            handle.file.sync_all()?;
        }
        Ok(())
    }

    /// Closes a file, syncing it first.
    pub fn close_file(&self, file_id: u32) -> Result<()> {
        let mut files = self.files.lock();
        if let Some(handle) = files.remove(&file_id) {
            handle.file.sync_all()?;
        }
        Ok(())
    }

    /// Deletes a file from disk.
    pub fn delete_file(&self, file_id: u32) -> Result<()> {
        let mut files = self.files.lock();
        if let Some(handle) = files.remove(&file_id) {
            if handle.path.exists() {
                std::fs::remove_file(&handle.path)?;
            }
        }
        Ok(())
    }
}

impl Drop for DiskManager {
    fn drop(&mut self) {
        let _ = self.flush_all();
    }
}
