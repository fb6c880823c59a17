use serde::{Deserialize, Serialize};

use crate::{
    disk::BlockDevice,
    fs::{
        bitmap::Bitmap,
        config::{DIRECT_PTRS, INODE_TABLE_BLOCKS, INODE_TABLE_START_BLOCK_ID},
        error::{FileSystemError, Result},
        region,
    },
    utils::{current_timestamp, generate_uuid},
};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum InodeType {
    Free,
    File,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InodeTable {
    inodes: Vec<Inode>,
}

impl InodeTable {
    pub fn new(total_inodes: u64) -> Self {
        Self {
            inodes: (0..total_inodes).map(|_| Inode::empty()).collect(),
        }
    }

    pub fn alloc_inode(&mut self, inode_bitmap: &mut Bitmap) -> Result<usize> {
        let index = inode_bitmap.alloc().ok_or(FileSystemError::InodeFull)? as usize;
        let slot = self
            .inodes
            .get_mut(index)
            .ok_or(FileSystemError::InodeFull)?;
        *slot = Inode::new(InodeType::File);
        Ok(index)
    }

    pub fn free_inode(&mut self, inode_bitmap: &mut Bitmap, index: usize) {
        if let Some(slot) = self.inodes.get_mut(index) {
            *slot = Inode::empty();
        }
        inode_bitmap.free(index as u64);
    }

    pub fn get(&self, index: usize) -> Result<&Inode> {
        self.inodes
            .get(index)
            .filter(|inode| inode.inode_type != InodeType::Free)
            .ok_or_else(|| FileSystemError::Corrupted(format!("inode {} is not in use", index)))
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Inode> {
        self.inodes
            .get_mut(index)
            .filter(|inode| inode.inode_type != InodeType::Free)
            .ok_or_else(|| FileSystemError::Corrupted(format!("inode {} is not in use", index)))
    }

    pub fn load<D: BlockDevice>(disk: &D) -> Result<Self> {
        region::load(
            disk,
            INODE_TABLE_START_BLOCK_ID,
            INODE_TABLE_BLOCKS,
            "inode table",
        )
    }

    pub fn sync<D: BlockDevice>(&self, disk: &D) -> Result<()> {
        region::store(
            disk,
            INODE_TABLE_START_BLOCK_ID,
            INODE_TABLE_BLOCKS,
            self,
            "inode table",
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Inode {
    pub id: String,            // inode 唯一标识
    pub inode_type: InodeType, // 文件类型
    pub size: u64,             // 文件大小（字节）
    pub link_count: u32,       // 目录项链接数
    pub atime: u64,            // 最后访问时间
    pub mtime: u64,            // 最后修改时间
    pub ctime: u64,            // 状态改变时间

    // 块索引区，0 表示未映射（0 号块是超级块，不可能是数据块）
    pub direct_blocks: [u32; DIRECT_PTRS],
    pub indirect_block: Option<u32>,
    pub block_count: u32, // 已映射的逻辑块数，映射总是从 0 开始连续的
}

impl Inode {
    pub fn new(inode_type: InodeType) -> Self {
        let now = current_timestamp();
        Self {
            id: generate_uuid(),
            inode_type,
            size: 0,
            link_count: 1,
            atime: now,
            mtime: now,
            ctime: now,
            direct_blocks: [0; DIRECT_PTRS],
            indirect_block: None,
            block_count: 0,
        }
    }

    pub fn empty() -> Self {
        Self {
            id: String::new(),
            inode_type: InodeType::Free,
            size: 0,
            link_count: 0,
            atime: 0,
            mtime: 0,
            ctime: 0,
            direct_blocks: [0; DIRECT_PTRS],
            indirect_block: None,
            block_count: 0,
        }
    }

    pub fn touch_access(&mut self) {
        self.atime = current_timestamp();
    }

    pub fn touch_modify(&mut self) {
        let now = current_timestamp();
        self.mtime = now;
        self.ctime = now;
    }
}
