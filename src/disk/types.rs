/// 每个块（Block）的大小：512 字节
/// 块设备只以整块为单位读写。
pub const BLOCK_SIZE: usize = 512;

/// 磁盘中包含的块总数：2MB / 512B = 4096 块
pub const BLOCK_COUNT: usize = 4096;

/// 虚拟磁盘总大小（单位：字节）
/// 用于创建固定大小的 disk.img 文件。
pub const DISK_SIZE: u64 = (BLOCK_SIZE * BLOCK_COUNT) as u64;

/// 一个块的字节数组
pub type Block = [u8; BLOCK_SIZE];
