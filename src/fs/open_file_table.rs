use std::fmt;

use crate::fs::error::{FileSystemError, Result};

/// 文件描述符。每次使用都会在打开文件表中校验。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fd(usize);

impl Fd {
    /// 从用户输入的数字构造；是否有效由打开文件表判断。
    pub fn from_raw(raw: usize) -> Self {
        Fd(raw)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenFile {
    inode: usize,
    cursor: u64,
    refs: u32,
}

/// 打开文件表，由文件系统会话持有
#[derive(Debug)]
pub struct OpenFileTable {
    slots: Vec<Option<OpenFile>>,
}

impl OpenFileTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// 同一个 inode 只占一个表项：再次打开返回同一个 Fd 并增加引用计数，游标共享。
    pub fn open(&mut self, inode: usize) -> Result<Fd> {
        if let Some(index) = self.find(inode) {
            if let Some(entry) = self.slots[index].as_mut() {
                entry.refs += 1;
            }
            return Ok(Fd(index));
        }

        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(FileSystemError::TooManyOpenFiles)?;
        self.slots[index] = Some(OpenFile {
            inode,
            cursor: 0,
            refs: 1,
        });
        Ok(Fd(index))
    }

    /// 引用计数减一，归零时释放表项。返回该表项的 inode。
    pub fn close(&mut self, fd: Fd) -> Result<usize> {
        let slot = self
            .slots
            .get_mut(fd.0)
            .ok_or(FileSystemError::BadFd(fd.0))?;
        let entry = slot.as_mut().ok_or(FileSystemError::BadFd(fd.0))?;
        let inode = entry.inode;
        entry.refs -= 1;
        if entry.refs == 0 {
            *slot = None;
        }
        Ok(inode)
    }

    fn entry(&self, fd: Fd) -> Result<&OpenFile> {
        self.slots
            .get(fd.0)
            .and_then(Option::as_ref)
            .ok_or(FileSystemError::BadFd(fd.0))
    }

    fn entry_mut(&mut self, fd: Fd) -> Result<&mut OpenFile> {
        self.slots
            .get_mut(fd.0)
            .and_then(Option::as_mut)
            .ok_or(FileSystemError::BadFd(fd.0))
    }

    fn find(&self, inode: usize) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| matches!(slot, Some(entry) if entry.inode == inode))
    }

    pub fn fd_to_inode(&self, fd: Fd) -> Result<usize> {
        Ok(self.entry(fd)?.inode)
    }

    pub fn cursor(&self, fd: Fd) -> Result<u64> {
        Ok(self.entry(fd)?.cursor)
    }

    pub fn set_cursor(&mut self, fd: Fd, cursor: u64) -> Result<()> {
        self.entry_mut(fd)?.cursor = cursor;
        Ok(())
    }

    pub fn is_open(&self, inode: usize) -> bool {
        self.find(inode).is_some()
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reopen_shares_the_entry() {
        let mut table = OpenFileTable::new(4);
        let a = table.open(9).unwrap();
        table.set_cursor(a, 40).unwrap();

        let b = table.open(9).unwrap();
        assert_eq!(a, b);
        assert_eq!(table.cursor(b).unwrap(), 40);

        assert_eq!(table.close(a).unwrap(), 9);
        assert!(table.is_open(9));
        table.close(b).unwrap();
        assert!(!table.is_open(9));

        let c = table.open(9).unwrap();
        assert_eq!(table.cursor(c).unwrap(), 0);
    }

    #[test]
    fn stale_and_unknown_fds_are_rejected() {
        let mut table = OpenFileTable::new(2);
        let fd = table.open(1).unwrap();
        table.close(fd).unwrap();
        assert!(matches!(table.close(fd), Err(FileSystemError::BadFd(_))));
        assert!(matches!(
            table.cursor(Fd::from_raw(7)),
            Err(FileSystemError::BadFd(7))
        ));
    }

    #[test]
    fn full_table() {
        let mut table = OpenFileTable::new(2);
        table.open(1).unwrap();
        table.open(2).unwrap();
        assert!(matches!(
            table.open(3),
            Err(FileSystemError::TooManyOpenFiles)
        ));
        // 已打开的 inode 仍然可以再次打开
        assert!(table.open(2).is_ok());
    }
}
