use crate::{
    disk::BlockDevice,
    fs::{
        bitmap::Bitmap,
        config::*,
        directory::{validate_name, Directory},
        error::{FileSystemError, Result},
        inode_table::InodeTable,
        open_file_table::OpenFileTable,
        super_block::SuperBlock,
    },
};

pub mod bitmap;
pub mod block_map;
pub mod config;
pub mod directory;
pub mod error;
pub mod handle;
pub mod inode_table;
pub mod open_file_table;
pub mod region;
pub mod super_block;
pub mod transfer;

pub use handle::FileHandle;
pub use open_file_table::Fd;
pub use transfer::{merge_range, Whence, SEEK_CUR, SEEK_END, SEEK_SET};

/// 一次挂载的文件系统会话。
/// 元数据常驻内存，sync 时写回各自的区域；数据块由读写路径直接落盘。
#[derive(Debug)]
pub struct FileSystem<D: BlockDevice> {
    disk: D,                     // 底层块设备
    super_block: SuperBlock,     // 文件系统总体信息
    inode_bitmap: Bitmap,        // inode 分配信息
    data_bitmap: Bitmap,         // 数据块分配信息
    inode_table: InodeTable,     // 所有 inode
    directory: Directory,        // 根目录
    open_files: OpenFileTable,   // 打开文件表
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub name: String,
    pub inode: usize,
    pub id: String,
    pub size: u64,
    pub blocks: u32,
    pub atime: u64,
    pub mtime: u64,
    pub ctime: u64,
    pub open: bool,
}

impl<D: BlockDevice> FileSystem<D> {
    fn blank(disk: D) -> Self {
        Self {
            disk,
            super_block: SuperBlock::new(),
            inode_bitmap: Bitmap::new(TOTAL_INODES),
            data_bitmap: Bitmap::new(DATA_AREA_BLOCKS),
            inode_table: InodeTable::new(TOTAL_INODES),
            directory: Directory::new(),
            open_files: OpenFileTable::new(MAX_OPEN_FILES),
        }
    }

    /// 在设备上写入一个空文件系统并挂载
    pub fn format(disk: D) -> Result<Self> {
        let fs = Self::blank(disk);
        fs.sync()?;
        log::info!(
            "formatted: {} data blocks from block {}, {} inodes",
            DATA_AREA_BLOCKS,
            DATA_AREA_START_BLOCK_ID,
            TOTAL_INODES
        );
        Ok(fs)
    }

    /// 挂载已格式化的设备
    pub fn mount(disk: D) -> Result<Self> {
        let super_block = SuperBlock::load(&disk)?;
        let inode_bitmap = Bitmap::load(&disk, INODE_BITMAP_BLOCK_ID, INODE_BITMAP_BLOCKS)?;
        let data_bitmap =
            Bitmap::load(&disk, DATA_BLOCK_BITMAP_BLOCK_ID, DATA_BLOCK_BITMAP_BLOCKS)?;
        if inode_bitmap.total() != TOTAL_INODES || data_bitmap.total() != DATA_AREA_BLOCKS {
            return Err(FileSystemError::Corrupted(
                "bitmap sizes do not match the layout".to_string(),
            ));
        }
        let inode_table = InodeTable::load(&disk)?;
        let directory = Directory::load(&disk)?;

        log::info!(
            "mounted: {} files, {} free blocks, {} free inodes",
            directory.len(),
            data_bitmap.free_count(),
            inode_bitmap.free_count()
        );
        Ok(Self {
            disk,
            super_block,
            inode_bitmap,
            data_bitmap,
            inode_table,
            directory,
            open_files: OpenFileTable::new(MAX_OPEN_FILES),
        })
    }

    /// 清空当前会话并重新格式化，所有打开的文件描述符失效
    pub fn reformat(&mut self) -> Result<()> {
        self.super_block = SuperBlock::new();
        self.inode_bitmap = Bitmap::new(TOTAL_INODES);
        self.data_bitmap = Bitmap::new(DATA_AREA_BLOCKS);
        self.inode_table = InodeTable::new(TOTAL_INODES);
        self.directory = Directory::new();
        self.open_files.clear();
        self.sync()?;
        log::info!("reformatted");
        Ok(())
    }

    /// 把内存中的元数据写回磁盘
    pub fn sync(&self) -> Result<()> {
        let mut sb = self.super_block.clone();
        sb.free_blocks = self.data_bitmap.free_count();
        sb.free_inodes = self.inode_bitmap.free_count();
        sb.sync(&self.disk)?;
        self.inode_bitmap
            .sync(&self.disk, INODE_BITMAP_BLOCK_ID, INODE_BITMAP_BLOCKS)?;
        self.data_bitmap
            .sync(&self.disk, DATA_BLOCK_BITMAP_BLOCK_ID, DATA_BLOCK_BITMAP_BLOCKS)?;
        self.inode_table.sync(&self.disk)?;
        self.directory.sync(&self.disk)?;
        log::debug!("metadata synced");
        Ok(())
    }

    pub fn unmount(self) -> Result<D> {
        self.sync()?;
        log::info!("unmounted");
        Ok(self.disk)
    }

    pub fn disk(&self) -> &D {
        &self.disk
    }

    /// 创建文件；同名文件已存在时清空后复用其 inode。
    /// 与 remove 一样，不能清空仍处于打开状态的文件。
    pub fn create(&mut self, name: &str) -> Result<Fd> {
        validate_name(name)?;
        let inum = match self.directory.find(name) {
            Some(inum) => {
                if self.open_files.is_open(inum) {
                    return Err(FileSystemError::Busy(name.to_string()));
                }
                self.map_release(inum)?;
                self.inode_table.get_mut(inum)?.touch_modify();
                log::debug!("create '{}': truncated inode {}", name, inum);
                inum
            }
            None => {
                let inum = self.inode_table.alloc_inode(&mut self.inode_bitmap)?;
                if let Err(e) = self.directory.add(inum, name) {
                    self.inode_table.free_inode(&mut self.inode_bitmap, inum);
                    return Err(e);
                }
                log::debug!("create '{}': new inode {}", name, inum);
                inum
            }
        };
        self.sync()?;
        self.open_files.open(inum)
    }

    pub fn open(&mut self, name: &str) -> Result<Fd> {
        let inum = self.lookup(name)?;
        let fd = self.open_files.open(inum)?;
        log::debug!("open '{}': inode {} on fd {}", name, inum, fd);
        Ok(fd)
    }

    pub fn close(&mut self, fd: Fd) -> Result<()> {
        let inum = self.open_files.close(fd)?;
        log::debug!("close fd {} (inode {})", fd, inum);
        self.sync()
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        let inum = self.lookup(name)?;
        if self.open_files.is_open(inum) {
            return Err(FileSystemError::Busy(name.to_string()));
        }
        self.map_release(inum)?;
        self.directory.remove(name);
        self.inode_table.free_inode(&mut self.inode_bitmap, inum);
        log::debug!("removed '{}' (inode {})", name, inum);
        self.sync()
    }

    /// 从头读出整个文件。文件已被打开时与之共享表项，读完后游标复原。
    pub fn read_all(&mut self, name: &str) -> Result<Vec<u8>> {
        let fd = self.open(name)?;
        let saved = self.open_files.cursor(fd)?;

        let data = self.read_from_start(fd);
        let restored = self.open_files.set_cursor(fd, saved);
        let closed = self.close(fd);

        let data = data?;
        restored?;
        closed?;
        Ok(data)
    }

    fn read_from_start(&mut self, fd: Fd) -> Result<Vec<u8>> {
        self.open_files.set_cursor(fd, 0)?;
        let mut data = vec![0u8; self.size(fd)? as usize];
        let n = self.read(fd, &mut data)?;
        data.truncate(n);
        Ok(data)
    }

    pub fn list_dir(&self) -> Vec<String> {
        self.directory.list_sorted()
    }

    pub fn stat(&self, name: &str) -> Result<FileStat> {
        let inum = self.lookup(name)?;
        let inode = self.inode_table.get(inum)?;
        Ok(FileStat {
            name: name.to_string(),
            inode: inum,
            id: inode.id.clone(),
            size: inode.size,
            blocks: inode.block_count,
            atime: inode.atime,
            mtime: inode.mtime,
            ctime: inode.ctime,
            open: self.open_files.is_open(inum),
        })
    }

    pub fn free_blocks(&self) -> u64 {
        self.data_bitmap.free_count()
    }

    fn lookup(&self, name: &str) -> Result<usize> {
        self.directory
            .find(name)
            .ok_or_else(|| FileSystemError::NotFound(name.to_string()))
    }
}
