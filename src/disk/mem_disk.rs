use std::{
    io::Result,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
};

use crate::disk::{
    block_device::{out_of_range, BlockDevice},
    types::{Block, BLOCK_COUNT, BLOCK_SIZE},
};

/// 内存中的块设备，主要用于测试。
/// 记录读写次数，便于断言某个操作没有触碰块存储。
#[derive(Debug)]
pub struct MemDisk {
    blocks: Mutex<Vec<Block>>,
    reads: AtomicU64,
    writes: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoStats {
    pub reads: u64,
    pub writes: u64,
}

impl MemDisk {
    pub fn new() -> Self {
        Self::with_blocks(BLOCK_COUNT)
    }

    pub fn with_blocks(count: usize) -> Self {
        Self {
            blocks: Mutex::new(vec![[0u8; BLOCK_SIZE]; count]),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> IoStats {
        IoStats {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}

impl Default for MemDisk {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDevice for MemDisk {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()> {
        let blocks = self.blocks.lock().unwrap_or_else(|e| e.into_inner());
        let block = blocks
            .get(block_id as usize)
            .ok_or_else(|| out_of_range(block_id))?;
        buf.copy_from_slice(block);
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()> {
        let mut blocks = self.blocks.lock().unwrap_or_else(|e| e.into_inner());
        let block = blocks
            .get_mut(block_id as usize)
            .ok_or_else(|| out_of_range(block_id))?;
        block.copy_from_slice(buf);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
