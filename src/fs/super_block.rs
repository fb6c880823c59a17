use serde::{Deserialize, Serialize};

use crate::{
    disk::{BlockDevice, BLOCK_COUNT, BLOCK_SIZE},
    fs::{
        config::*,
        error::{FileSystemError, Result},
        region,
    },
};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SuperBlock {
    pub magic: u64,        // 魔数，用于识别文件系统
    pub fs_type: String,   // 文件系统标识
    pub block_size: u64,   // 每块大小（字节）
    pub total_blocks: u64, // 文件系统总块数
    /** 区域起始块号 */
    pub inode_bitmap_start: u64,
    pub block_bitmap_start: u64,
    pub inode_table_start: u64,
    pub directory_start: u64,
    pub data_block_start: u64,
    /** 统计信息，sync 时刷新 */
    pub total_inodes: u64,
    pub free_inodes: u64,
    pub free_blocks: u64,
}

impl SuperBlock {
    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            fs_type: "BlockFS".to_string(),
            block_size: BLOCK_SIZE as u64,
            total_blocks: BLOCK_COUNT as u64,
            inode_bitmap_start: INODE_BITMAP_BLOCK_ID,
            block_bitmap_start: DATA_BLOCK_BITMAP_BLOCK_ID,
            inode_table_start: INODE_TABLE_START_BLOCK_ID,
            directory_start: DIRECTORY_START_BLOCK_ID,
            data_block_start: DATA_AREA_START_BLOCK_ID,
            total_inodes: TOTAL_INODES,
            free_inodes: TOTAL_INODES,
            free_blocks: DATA_AREA_BLOCKS,
        }
    }

    pub fn load<D: BlockDevice>(disk: &D) -> Result<Self> {
        let sb: Self = region::load(disk, SUPER_BLOCK_BLOCK_ID, 1, "super block")?;
        if sb.magic != MAGIC {
            return Err(FileSystemError::Corrupted(format!(
                "bad magic {:#x}",
                sb.magic
            )));
        }
        if sb.block_size != BLOCK_SIZE as u64 || sb.total_blocks != BLOCK_COUNT as u64 {
            return Err(FileSystemError::Corrupted(format!(
                "unsupported geometry: {} blocks of {} bytes",
                sb.total_blocks, sb.block_size
            )));
        }
        Ok(sb)
    }

    pub fn sync<D: BlockDevice>(&self, disk: &D) -> Result<()> {
        region::store(disk, SUPER_BLOCK_BLOCK_ID, 1, self, "super block")
    }
}

impl Default for SuperBlock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::{Block, MemDisk};

    #[test]
    fn round_trips_through_block_zero() {
        let disk = MemDisk::new();
        let mut sb = SuperBlock::new();
        sb.free_blocks = 17;
        sb.sync(&disk).unwrap();
        assert_eq!(SuperBlock::load(&disk).unwrap(), sb);
    }

    #[test]
    fn rejects_foreign_magic() {
        let disk = MemDisk::new();
        let mut sb = SuperBlock::new();
        sb.magic = 0xDEADBEEF;
        sb.sync(&disk).unwrap();
        assert!(matches!(
            SuperBlock::load(&disk),
            Err(FileSystemError::Corrupted(_))
        ));
    }

    #[test]
    fn rejects_unformatted_disk() {
        let disk = MemDisk::new();
        let zero: Block = [0; BLOCK_SIZE];
        disk.write_block(0, &zero).unwrap();
        assert!(SuperBlock::load(&disk).is_err());
    }
}
