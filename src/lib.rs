//! 以 512 字节块为单位的文件系统：字节粒度的读写、游标和按需增长的块映射。

pub mod config;
pub mod disk;
pub mod fs;
pub mod utils;

pub use disk::{BlockDevice, FileDisk, MemDisk};
pub use fs::{error::FileSystemError, error::Result, Fd, FileHandle, FileSystem, Whence};
