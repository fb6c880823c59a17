use crate::{
    disk::BlockDevice,
    fs::{error::Result, open_file_table::Fd, transfer::Whence, FileSystem},
};

/// 借用会话的已打开文件。离开作用域时自动关闭，`?` 提前返回也一样。
#[derive(Debug)]
pub struct FileHandle<'a, D: BlockDevice> {
    fs: &'a mut FileSystem<D>,
    fd: Fd,
    closed: bool, // 已显式关闭，drop 时跳过
}

impl<D: BlockDevice> FileSystem<D> {
    pub fn open_scoped(&mut self, name: &str) -> Result<FileHandle<'_, D>> {
        let fd = self.open(name)?;
        Ok(FileHandle::new(self, fd))
    }

    pub fn create_scoped(&mut self, name: &str) -> Result<FileHandle<'_, D>> {
        let fd = self.create(name)?;
        Ok(FileHandle::new(self, fd))
    }
}

impl<'a, D: BlockDevice> FileHandle<'a, D> {
    fn new(fs: &'a mut FileSystem<D>, fd: Fd) -> Self {
        Self {
            fs,
            fd,
            closed: false,
        }
    }

    pub fn fd(&self) -> Fd {
        self.fd
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.fs.read(self.fd, buf)
    }

    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.fs.write(self.fd, data)
    }

    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        self.fs.seek(self.fd, offset, whence)
    }

    pub fn tell(&self) -> Result<u64> {
        self.fs.tell(self.fd)
    }

    pub fn size(&self) -> Result<u64> {
        self.fs.size(self.fd)
    }

    /// 显式关闭，并返回关闭时的错误
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.fs.close(self.fd)
    }
}

impl<D: BlockDevice> Drop for FileHandle<'_, D> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.fs.close(self.fd) {
            log::warn!("closing fd {} on drop failed: {}", self.fd, e);
        }
    }
}
