//! 逻辑块号（LBN）到物理块号（PBN）的映射。
//! 前 DIRECT_PTRS 个逻辑块由 inode 直接指向，其余经一级间接块。

use crate::{
    disk::{Block, BlockDevice, BLOCK_SIZE},
    fs::{
        config::{DATA_AREA_START_BLOCK_ID, DIRECT_PTRS, MAX_FILE_BLOCKS, PTRS_PER_BLOCK},
        error::{FileSystemError, Result},
        FileSystem,
    },
};

type PtrBlock = [u32; PTRS_PER_BLOCK];

fn decode_ptrs(block: &Block) -> PtrBlock {
    let mut ptrs = [0u32; PTRS_PER_BLOCK];
    for (ptr, bytes) in ptrs.iter_mut().zip(block.chunks_exact(4)) {
        *ptr = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }
    ptrs
}

fn encode_ptrs(ptrs: &PtrBlock) -> Block {
    let mut block: Block = [0; BLOCK_SIZE];
    for (bytes, ptr) in block.chunks_exact_mut(4).zip(ptrs.iter()) {
        bytes.copy_from_slice(&ptr.to_le_bytes());
    }
    block
}

impl<D: BlockDevice> FileSystem<D> {
    pub(crate) fn get_size(&self, inum: usize) -> Result<u64> {
        Ok(self.inode_table.get(inum)?.size)
    }

    pub(crate) fn set_size(&mut self, inum: usize, size: u64) -> Result<()> {
        self.inode_table.get_mut(inum)?.size = size;
        Ok(())
    }

    /// 查找逻辑块对应的物理块，未映射时返回 None
    pub(crate) fn map_lookup(&self, inum: usize, lbn: u64) -> Result<Option<u64>> {
        let inode = self.inode_table.get(inum)?;
        if lbn >= inode.block_count as u64 {
            return Ok(None);
        }

        let lbn = lbn as usize;
        let pbn = if lbn < DIRECT_PTRS {
            inode.direct_blocks[lbn]
        } else {
            let Some(indirect) = inode.indirect_block else {
                return Ok(None);
            };
            self.read_ptrs(indirect as u64)?[lbn - DIRECT_PTRS]
        };

        Ok((pbn != 0).then_some(pbn as u64))
    }

    /// 逐块扩展映射，直到文件拥有 new_count 个逻辑块。
    /// 每个新块在磁盘上清零。返回第 new_count - 1 块的物理块号。
    /// 超过单文件块数上限时不分配任何块；数据区中途耗尽时，已分配的块保持映射。
    pub(crate) fn map_extend(&mut self, inum: usize, new_count: u64) -> Result<u64> {
        if new_count == 0 {
            return Err(FileSystemError::Corrupted(
                "extend to zero blocks".to_string(),
            ));
        }
        if new_count > MAX_FILE_BLOCKS {
            log::warn!(
                "inode {} cannot grow to {} blocks (limit {})",
                inum,
                new_count,
                MAX_FILE_BLOCKS
            );
            return Err(FileSystemError::NoSpace);
        }

        loop {
            let count = self.inode_table.get(inum)?.block_count as u64;
            if count >= new_count {
                break;
            }
            if count >= MAX_FILE_BLOCKS {
                return Err(FileSystemError::NoSpace);
            }
            let pbn = self.alloc_data_block()?;
            if let Err(e) = self.map_append(inum, count as usize, pbn) {
                self.free_data_block(pbn);
                return Err(e);
            }
            log::trace!("inode {}: lbn {} -> pbn {}", inum, count, pbn);
        }

        self.map_lookup(inum, new_count - 1)?
            .ok_or(FileSystemError::MissingBlock {
                inode: inum,
                lbn: new_count - 1,
            })
    }

    /// 释放文件的所有块，文件大小归零
    pub(crate) fn map_release(&mut self, inum: usize) -> Result<()> {
        let (direct, indirect, count) = {
            let inode = self.inode_table.get(inum)?;
            (inode.direct_blocks, inode.indirect_block, inode.block_count as usize)
        };

        for &pbn in direct.iter().take(count.min(DIRECT_PTRS)) {
            self.free_data_block(pbn as u64);
        }
        if let Some(indirect) = indirect {
            let ptrs = self.read_ptrs(indirect as u64)?;
            for &pbn in ptrs.iter().take(count.saturating_sub(DIRECT_PTRS)) {
                self.free_data_block(pbn as u64);
            }
            self.free_data_block(indirect as u64);
        }

        let inode = self.inode_table.get_mut(inum)?;
        inode.direct_blocks = [0; DIRECT_PTRS];
        inode.indirect_block = None;
        inode.block_count = 0;
        inode.size = 0;
        log::debug!("inode {}: released {} blocks", inum, count);
        Ok(())
    }

    fn map_append(&mut self, inum: usize, lbn: usize, pbn: u64) -> Result<()> {
        if lbn < DIRECT_PTRS {
            let inode = self.inode_table.get_mut(inum)?;
            inode.direct_blocks[lbn] = pbn as u32;
            inode.block_count += 1;
            return Ok(());
        }

        let indirect = match self.inode_table.get(inum)?.indirect_block {
            Some(indirect) => indirect as u64,
            None => {
                let indirect = self.alloc_data_block()?;
                self.inode_table.get_mut(inum)?.indirect_block = Some(indirect as u32);
                indirect
            }
        };
        let mut ptrs = self.read_ptrs(indirect)?;
        ptrs[lbn - DIRECT_PTRS] = pbn as u32;
        self.disk.write_block(indirect, &encode_ptrs(&ptrs))?;
        self.inode_table.get_mut(inum)?.block_count += 1;
        Ok(())
    }

    fn read_ptrs(&self, pbn: u64) -> Result<PtrBlock> {
        let mut block: Block = [0; BLOCK_SIZE];
        self.disk.read_block(pbn, &mut block)?;
        Ok(decode_ptrs(&block))
    }

    /// 从空闲位图分配一个数据块并清零
    fn alloc_data_block(&mut self) -> Result<u64> {
        let Some(index) = self.data_bitmap.alloc() else {
            log::warn!("data area exhausted");
            return Err(FileSystemError::NoSpace);
        };
        let pbn = DATA_AREA_START_BLOCK_ID + index;
        let zero: Block = [0; BLOCK_SIZE];
        if let Err(e) = self.disk.write_block(pbn, &zero) {
            self.data_bitmap.free(index);
            return Err(e.into());
        }
        Ok(pbn)
    }

    fn free_data_block(&mut self, pbn: u64) {
        if pbn >= DATA_AREA_START_BLOCK_ID {
            self.data_bitmap.free(pbn - DATA_AREA_START_BLOCK_ID);
        }
    }
}
