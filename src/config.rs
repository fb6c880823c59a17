use std::{env, path::PathBuf};

pub const DEFAULT_DISK_PATH: &str = "disk.img";
pub const HISTORY_FILE: &str = ".blockfs_history";
pub const HISTORY_SIZE: usize = 100;

/// shell 的运行时配置，来自环境变量
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub disk_path: PathBuf,
    /// 遇到误用类错误（见 `FileSystemError::is_fatal`）时是否终止进程
    pub abort_on_misuse: bool,
    pub history_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            disk_path: PathBuf::from(DEFAULT_DISK_PATH),
            abort_on_misuse: true,
            history_path: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(HISTORY_FILE),
        }
    }
}

impl Config {
    /// `BLOCKFS_DISK` 指定磁盘镜像，`BLOCKFS_RECOVER_MISUSE=1` 让误用只报错不退出
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup("BLOCKFS_DISK").filter(|p| !p.is_empty()) {
            config.disk_path = PathBuf::from(path);
        }
        if let Some(flag) = lookup("BLOCKFS_RECOVER_MISUSE") {
            config.abort_on_misuse = !matches!(flag.trim(), "1" | "true" | "yes");
        }
        config
    }
}
