//! 字节粒度的读写与游标。
//!
//! 任意 `(cursor, len)` 的请求被拆成按块对齐的若干段：开头的不完整块、
//! 中间的整块、结尾的不完整块。块设备只接受整块读写，不完整块一律
//! 读出整块、合并、再整块写回。

use crate::{
    disk::{Block, BlockDevice, BLOCK_SIZE},
    fs::{
        error::{FileSystemError, Result},
        open_file_table::Fd,
        FileSystem,
    },
};

pub const SEEK_SET: i32 = 0;
pub const SEEK_CUR: i32 = 1;
pub const SEEK_END: i32 = 2;

const BLOCK: u64 = BLOCK_SIZE as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Set, // 从文件头
    Cur, // 从当前游标
    End, // 从文件末尾
}

impl TryFrom<i32> for Whence {
    type Error = FileSystemError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            SEEK_SET => Ok(Whence::Set),
            SEEK_CUR => Ok(Whence::Cur),
            SEEK_END => Ok(Whence::End),
            other => Err(FileSystemError::BadWhence(other)),
        }
    }
}

/// 把 `src[src_offset..src_offset + len]` 复制到 `dst[dst_offset..dst_offset + len]`。
/// 任一范围越界都返回错误，不做部分复制。
pub fn merge_range(
    dst: &mut [u8],
    dst_offset: usize,
    src: &[u8],
    src_offset: usize,
    len: usize,
) -> Result<()> {
    let dst_len = dst.len();
    let src_len = src.len();
    let target = dst_offset
        .checked_add(len)
        .and_then(|end| dst.get_mut(dst_offset..end));
    let source = src_offset
        .checked_add(len)
        .and_then(|end| src.get(src_offset..end));

    match (target, source) {
        (Some(target), Some(source)) => {
            target.copy_from_slice(source);
            Ok(())
        }
        _ => Err(FileSystemError::Corrupted(format!(
            "merge of {} bytes out of bounds: dst {}/{} src {}/{}",
            len, dst_offset, dst_len, src_offset, src_len
        ))),
    }
}

impl<D: BlockDevice> FileSystem<D> {
    /// 从游标处读取至多 `buf.len()` 字节，返回实际读取的字节数。
    /// 只有遇到文件末尾时才会少于请求的字节数。
    pub fn read(&mut self, fd: Fd, buf: &mut [u8]) -> Result<usize> {
        let inum = self.open_files.fd_to_inode(fd)?;
        let cursor = self.open_files.cursor(fd)?;
        let size = self.get_size(inum)?;

        let available = size.saturating_sub(cursor);
        let to_read = (buf.len() as u64).min(available) as usize;
        if to_read == 0 {
            return Ok(0);
        }

        let mut block: Block = [0; BLOCK_SIZE];
        let mut done = 0;
        while done < to_read {
            let pos = cursor + done as u64;
            let lbn = pos / BLOCK;
            let offset = (pos % BLOCK) as usize;
            let len = (BLOCK_SIZE - offset).min(to_read - done);

            let pbn = self
                .map_lookup(inum, lbn)?
                .ok_or(FileSystemError::MissingBlock { inode: inum, lbn })?;
            self.disk.read_block(pbn, &mut block)?;
            merge_range(buf, done, &block, offset, len)?;
            log::trace!("read fd {}: lbn {} [{}..{})", fd, lbn, offset, offset + len);

            self.advance(fd, len)?;
            done += len;
        }

        self.inode_table.get_mut(inum)?.touch_access();
        Ok(done)
    }

    /// 从游标处写入全部 `data`，必要时扩展文件。成功时返回 `data.len()`。
    ///
    /// 写入不是原子的：中途 `NoSpace` 时，之前已写的块、游标和文件大小都保留。
    pub fn write(&mut self, fd: Fd, data: &[u8]) -> Result<usize> {
        let inum = self.open_files.fd_to_inode(fd)?;
        if data.is_empty() {
            return Ok(0);
        }

        let cursor = self.open_files.cursor(fd)?;
        let write_start = (cursor % BLOCK) as usize;
        let mut lbn = cursor / BLOCK;
        let mut consumed = 0;

        // 开头的不完整块
        if write_start != 0 {
            let len = (BLOCK_SIZE - write_start).min(data.len());
            self.merge_into_block(inum, lbn, write_start, &data[..len])?;
            self.commit(fd, inum, len)?;
            consumed += len;
            lbn += 1;
        }

        // 中间的整块，直接覆盖
        while data.len() - consumed >= BLOCK_SIZE {
            let pbn = match self.map_lookup(inum, lbn)? {
                Some(pbn) => pbn,
                None => self.map_extend(inum, lbn + 1)?,
            };
            let mut block: Block = [0; BLOCK_SIZE];
            merge_range(&mut block, 0, data, consumed, BLOCK_SIZE)?;
            self.disk.write_block(pbn, &block)?;
            log::trace!("write fd {}: full lbn {}", fd, lbn);

            self.commit(fd, inum, BLOCK_SIZE)?;
            consumed += BLOCK_SIZE;
            lbn += 1;
        }

        // 结尾的不完整块
        let remaining = data.len() - consumed;
        if remaining > 0 {
            self.merge_into_block(inum, lbn, 0, &data[consumed..])?;
            self.commit(fd, inum, remaining)?;
        }

        self.inode_table.get_mut(inum)?.touch_modify();
        Ok(data.len())
    }

    /// 移动游标。负偏移一律拒绝，即便 `Cur`/`End` 下结果仍然非负。
    pub fn seek(&mut self, fd: Fd, offset: i64, whence: Whence) -> Result<u64> {
        if offset < 0 {
            log::warn!("seek fd {}: negative offset {}", fd, offset);
            return Err(FileSystemError::BadCursor(offset));
        }

        let inum = self.open_files.fd_to_inode(fd)?;
        let base = match whence {
            Whence::Set => 0,
            Whence::Cur => self.open_files.cursor(fd)?,
            Whence::End => self.get_size(inum)?,
        };
        let cursor = base
            .checked_add(offset as u64)
            .ok_or(FileSystemError::BadCursor(offset))?;
        self.open_files.set_cursor(fd, cursor)?;
        Ok(cursor)
    }

    /// 数字形式的 whence，未知取值返回 `BadWhence`。偏移先于 whence 校验。
    pub fn seek_raw(&mut self, fd: Fd, offset: i64, whence: i32) -> Result<u64> {
        if offset < 0 {
            log::warn!("seek fd {}: negative offset {}", fd, offset);
            return Err(FileSystemError::BadCursor(offset));
        }
        match Whence::try_from(whence) {
            Ok(whence) => self.seek(fd, offset, whence),
            Err(e) => {
                log::warn!("seek fd {}: unknown whence {}", fd, whence);
                Err(e)
            }
        }
    }

    pub fn tell(&self, fd: Fd) -> Result<u64> {
        self.open_files.cursor(fd)
    }

    pub fn size(&self, fd: Fd) -> Result<u64> {
        let inum = self.open_files.fd_to_inode(fd)?;
        self.get_size(inum)
    }

    fn advance(&mut self, fd: Fd, len: usize) -> Result<u64> {
        self.seek(fd, len as i64, Whence::Cur)
    }

    // 推进游标，并让文件大小覆盖到新游标
    fn commit(&mut self, fd: Fd, inum: usize, len: usize) -> Result<()> {
        let cursor = self.advance(fd, len)?;
        if cursor > self.get_size(inum)? {
            self.set_size(inum, cursor)?;
        }
        Ok(())
    }

    /// 读-改-写一个不完整块；块尚未分配时先扩展（新块已清零）
    fn merge_into_block(&mut self, inum: usize, lbn: u64, offset: usize, src: &[u8]) -> Result<()> {
        let pbn = match self.map_lookup(inum, lbn)? {
            Some(pbn) => pbn,
            None => self.map_extend(inum, lbn + 1)?,
        };
        let mut block: Block = [0; BLOCK_SIZE];
        self.disk.read_block(pbn, &mut block)?;
        merge_range(&mut block, offset, src, 0, src.len())?;
        self.disk.write_block(pbn, &block)?;
        log::trace!(
            "write inode {}: merged lbn {} [{}..{})",
            inum,
            lbn,
            offset,
            offset + src.len()
        );
        Ok(())
    }
}
