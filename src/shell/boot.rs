use std::{path::PathBuf, sync::mpsc::Sender};

use block_fs::{FileDisk, FileSystem, FileSystemError};

use crate::shell::BootProgress;

pub fn perform_disk_initialization(tx: Sender<BootProgress>, disk_path: PathBuf) {
    // 主线程提前退出时 send 会失败，此时没有人需要进度
    let _ = tx.send(BootProgress::Step("🧠 Initializing virtual disk..."));

    let (disk, fresh) = match FileDisk::open(&disk_path) {
        Ok(d) => d,
        Err(e) => {
            let _ = tx.send(BootProgress::Finished(Err(FileSystemError::Io(e))));
            return;
        }
    };
    let _ = tx.send(BootProgress::Progress(40));

    let result = if fresh {
        // 只有新分配的镜像才格式化
        let _ = tx.send(BootProgress::Step(
            "🔧 New disk image, formatting file system...",
        ));
        FileSystem::format(disk)
    } else {
        let _ = tx.send(BootProgress::Step("⚙️  Mounting file system..."));
        FileSystem::mount(disk)
    };
    let _ = tx.send(BootProgress::Progress(100));
    let _ = tx.send(BootProgress::Finished(result));
}
