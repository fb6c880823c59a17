use crate::disk::{BLOCK_COUNT, BLOCK_SIZE};

// 磁盘布局：超级块 | inode 位图 | 数据块位图 | inode 表 | 目录 | 数据区
pub const SUPER_BLOCK_BLOCK_ID: u64 = 0;

pub const INODE_BITMAP_BLOCK_ID: u64 = 1;
pub const INODE_BITMAP_BLOCKS: u64 = 1;

pub const DATA_BLOCK_BITMAP_BLOCK_ID: u64 = INODE_BITMAP_BLOCK_ID + INODE_BITMAP_BLOCKS;
pub const DATA_BLOCK_BITMAP_BLOCKS: u64 = 2;

pub const INODE_TABLE_START_BLOCK_ID: u64 = DATA_BLOCK_BITMAP_BLOCK_ID + DATA_BLOCK_BITMAP_BLOCKS;
pub const INODE_TABLE_BLOCKS: u64 = 32;

pub const DIRECTORY_START_BLOCK_ID: u64 = INODE_TABLE_START_BLOCK_ID + INODE_TABLE_BLOCKS;
pub const DIRECTORY_BLOCKS: u64 = 16;

// 数据区的起始块号
pub const DATA_AREA_START_BLOCK_ID: u64 = DIRECTORY_START_BLOCK_ID + DIRECTORY_BLOCKS;
pub const DATA_AREA_BLOCKS: u64 = BLOCK_COUNT as u64 - DATA_AREA_START_BLOCK_ID;

pub const TOTAL_INODES: u64 = 64;

pub const DIRECT_PTRS: usize = 12; // 直接块指针
pub const PTRS_PER_BLOCK: usize = BLOCK_SIZE / 4; // 一级间接块中的 u32 指针数
pub const MAX_FILE_BLOCKS: u64 = (DIRECT_PTRS + PTRS_PER_BLOCK) as u64;
pub const MAX_FILE_SIZE: u64 = MAX_FILE_BLOCKS * BLOCK_SIZE as u64;

pub const MAX_NAME_LEN: usize = 32;
pub const MAX_OPEN_FILES: usize = 32;

pub const MAGIC: u64 = 0xB10C_F5E5;
