use std::fmt;

/// 文件系统错误类型
#[derive(Debug)]
pub enum FileSystemError {
    Io(std::io::Error),                    // 底层 I/O 错误
    NoSpace,                               // 数据块耗尽，或文件已达最大块数
    InodeFull,                             // inode 已满
    NotFound(String),                      // 文件不存在，带文件名
    InvalidPath(String),                   // 文件名非法
    BadFd(usize),                          // 文件描述符无效或已关闭
    TooManyOpenFiles,                      // 打开文件表已满
    Busy(String),                          // 文件仍处于打开状态
    BadCursor(i64),                        // seek 偏移为负
    BadWhence(i32),                        // 未知的 whence
    MissingBlock { inode: usize, lbn: u64 }, // 文件大小范围内的逻辑块没有映射
    Corrupted(String),                     // 文件系统损坏
}

impl FileSystemError {
    /// 属于误用或内部不变量被破坏的错误。
    /// 调用者可以选择直接终止进程，也可以当作普通错误处理。
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::BadCursor(_) | Self::BadWhence(_) | Self::MissingBlock { .. } | Self::Corrupted(_)
        )
    }
}

impl From<std::io::Error> for FileSystemError {
    fn from(e: std::io::Error) -> Self {
        FileSystemError::Io(e)
    }
}

// 实现 Display trait，用于打印错误信息
impl fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Disk I/O error: {}", e),
            Self::NoSpace => write!(f, "No space left for a new block"),
            Self::InodeFull => write!(f, "No free inode available"),
            Self::NotFound(name) => write!(f, "File not found: {}", name),
            Self::InvalidPath(name) => write!(f, "Invalid file name: {}", name),
            Self::BadFd(fd) => write!(f, "Bad file descriptor: {}", fd),
            Self::TooManyOpenFiles => write!(f, "Open file table is full"),
            Self::Busy(name) => write!(f, "File is still open: {}", name),
            Self::BadCursor(offset) => write!(f, "Bad cursor offset: {}", offset),
            Self::BadWhence(whence) => write!(f, "Bad whence: {}", whence),
            Self::MissingBlock { inode, lbn } => {
                write!(f, "Inode {} has no block mapped at {}", inode, lbn)
            }
            Self::Corrupted(desc) => write!(f, "File system corrupted: {}", desc),
        }
    }
}

// 支持链式错误，方便追踪底层原因
impl std::error::Error for FileSystemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// 文件系统统一结果类型
pub type Result<T> = std::result::Result<T, FileSystemError>;
