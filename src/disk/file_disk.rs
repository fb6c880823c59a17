use std::{
    fs::{File, OpenOptions},
    io::{Read, Result, Seek, SeekFrom, Write},
    path::Path,
    sync::Mutex,
};

use crate::disk::{
    block_device::{out_of_range, BlockDevice},
    types::{Block, BLOCK_COUNT, BLOCK_SIZE, DISK_SIZE},
};

/// 以宿主机文件作为后端的虚拟磁盘
#[derive(Debug)]
pub struct FileDisk {
    file: Mutex<File>,
}

impl FileDisk {
    /// 打开（必要时创建）磁盘镜像。
    /// 返回值中的 bool 表示镜像是否是新分配的，需要格式化。
    pub fn open<P: AsRef<Path>>(path: P) -> Result<(Self, bool)> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;

        let fresh = file.metadata()?.len() < DISK_SIZE;
        if fresh {
            log::info!(
                "allocating {} bytes for disk image {}",
                DISK_SIZE,
                path.as_ref().display()
            );
            file.set_len(DISK_SIZE)?;
        }

        Ok((
            Self {
                file: Mutex::new(file),
            },
            fresh,
        ))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, File> {
        // 持锁线程 panic 后文件本身仍然可用
        self.file.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl BlockDevice for FileDisk {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()> {
        if block_id >= BLOCK_COUNT as u64 {
            return Err(out_of_range(block_id));
        }
        let mut file = self.lock();
        file.seek(SeekFrom::Start(block_id * BLOCK_SIZE as u64))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()> {
        if block_id >= BLOCK_COUNT as u64 {
            return Err(out_of_range(block_id));
        }
        let mut file = self.lock();
        file.seek(SeekFrom::Start(block_id * BLOCK_SIZE as u64))?;
        file.write_all(buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::generate_uuid;

    #[test]
    fn blocks_survive_reopen() {
        let path = std::env::temp_dir().join(format!("block-fs-{}.img", generate_uuid()));

        let (disk, fresh) = FileDisk::open(&path).unwrap();
        assert!(fresh);
        let mut block = [0u8; BLOCK_SIZE];
        block[0] = 0xAB;
        block[BLOCK_SIZE - 1] = 0xCD;
        disk.write_block(7, &block).unwrap();
        drop(disk);

        let (disk, fresh) = FileDisk::open(&path).unwrap();
        assert!(!fresh);
        let mut back = [0u8; BLOCK_SIZE];
        disk.read_block(7, &mut back).unwrap();
        assert_eq!(back, block);

        assert!(disk.read_block(BLOCK_COUNT as u64, &mut back).is_err());
        std::fs::remove_file(&path).unwrap();
    }
}
