//! Pinned-page buffer pool for the stratum storage engine.
//!
//! The pool owns a fixed set of page frames. Callers pin a page to keep it
//! resident, mutate it through the frame's data lock, and unpin it with a
//! dirty flag. Dirty pages are written back either by an explicit flush or
//! when a clean-or-dirty victim is evicted to make room (dirty victims are
//! handed back to the caller as [`EvictedPage`]s to write to disk).

pub mod frame;
pub mod pool;
pub mod replacer;

pub use frame::{BufferFrame, FrameId};
pub use pool::{BufferPool, BufferPoolStats, EvictedPage, PageReadGuard, PageWriteGuard};
pub use replacer::ClockReplacer;

pub use stratum_common::config::BufferPoolConfig;
