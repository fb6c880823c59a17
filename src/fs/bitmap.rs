use serde::{Deserialize, Serialize};

use crate::{
    disk::BlockDevice,
    fs::{error::Result, region},
};

/// 空闲位图：每个 bit 表示一个 inode 或数据块是否被占用。
/// inode 位图与数据块位图共用这一实现。
#[derive(Debug, Serialize, Deserialize)]
pub struct Bitmap {
    bits: Vec<u8>,
    total: u64,
    free: u64,
}

impl Bitmap {
    // 创建一个所有位清零（全部空闲）的位图
    pub fn new(total: u64) -> Self {
        let byte_len = ((total + 7) / 8) as usize;
        Self {
            bits: vec![0; byte_len],
            total,
            free: total,
        }
    }

    // 分配编号最小的空闲位
    pub fn alloc(&mut self) -> Option<u64> {
        for (byte_index, byte) in self.bits.iter_mut().enumerate() {
            if *byte == 0xFF {
                continue;
            }
            for bit in 0..8 {
                let index = (byte_index * 8 + bit) as u64;
                if index >= self.total {
                    return None;
                }
                if *byte & (1 << bit) == 0 {
                    *byte |= 1 << bit;
                    self.free -= 1;
                    return Some(index);
                }
            }
        }
        None
    }

    // 释放；越界或重复释放直接忽略
    pub fn free(&mut self, index: u64) {
        if index >= self.total {
            return;
        }
        let byte_index = (index / 8) as usize;
        let bit_index = (index % 8) as u8;
        if self.bits[byte_index] & (1 << bit_index) != 0 {
            self.bits[byte_index] &= !(1 << bit_index);
            self.free += 1;
        }
    }

    pub fn is_used(&self, index: u64) -> bool {
        if index >= self.total {
            return false;
        }
        let byte_index = (index / 8) as usize;
        let bit_index = (index % 8) as u8;
        self.bits[byte_index] & (1 << bit_index) != 0
    }

    pub fn free_count(&self) -> u64 {
        self.free
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn load<D: BlockDevice>(disk: &D, start_block: u64, blocks: u64) -> Result<Self> {
        let mut bitmap: Self = region::load(disk, start_block, blocks, "bitmap")?;
        // 空闲数以位图内容为准
        let used: u64 = bitmap.bits.iter().map(|b| b.count_ones() as u64).sum();
        bitmap.free = bitmap.total.saturating_sub(used);
        Ok(bitmap)
    }

    pub fn sync<D: BlockDevice>(&self, disk: &D, start_block: u64, blocks: u64) -> Result<()> {
        region::store(disk, start_block, blocks, self, "bitmap")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemDisk;

    #[test]
    fn alloc_returns_lowest_free_index() {
        let mut bitmap = Bitmap::new(10);
        assert_eq!(bitmap.alloc(), Some(0));
        assert_eq!(bitmap.alloc(), Some(1));
        assert_eq!(bitmap.alloc(), Some(2));
        bitmap.free(1);
        assert_eq!(bitmap.alloc(), Some(1));
        assert_eq!(bitmap.free_count(), 7);
    }

    #[test]
    fn never_hands_out_padding_bits() {
        let mut bitmap = Bitmap::new(3);
        assert_eq!(bitmap.alloc(), Some(0));
        assert_eq!(bitmap.alloc(), Some(1));
        assert_eq!(bitmap.alloc(), Some(2));
        assert_eq!(bitmap.alloc(), None);
        assert_eq!(bitmap.free_count(), 0);
    }

    #[test]
    fn double_free_and_out_of_range_are_ignored() {
        let mut bitmap = Bitmap::new(4);
        bitmap.alloc();
        bitmap.free(0);
        bitmap.free(0);
        bitmap.free(100);
        assert_eq!(bitmap.free_count(), 4);
        assert!(!bitmap.is_used(0));
        assert!(!bitmap.is_used(100));
    }

    #[test]
    fn load_recounts_free_bits() {
        let disk = MemDisk::with_blocks(4);
        let mut bitmap = Bitmap::new(100);
        for _ in 0..13 {
            bitmap.alloc();
        }
        bitmap.sync(&disk, 1, 2).unwrap();

        let back = Bitmap::load(&disk, 1, 2).unwrap();
        assert_eq!(back.total(), 100);
        assert_eq!(back.free_count(), 87);
        assert!(back.is_used(12));
        assert!(!back.is_used(13));
    }
}
