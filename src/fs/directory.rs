use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{
    disk::BlockDevice,
    fs::{
        config::{DIRECTORY_BLOCKS, DIRECTORY_START_BLOCK_ID, MAX_NAME_LEN},
        error::{FileSystemError, Result},
        region,
    },
};

// 一个目录项
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub inode_index: usize,
}

/// 扁平的根目录：文件名 -> inode
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Directory {
    entries: Vec<DirEntry>,
    #[serde(skip)]
    index_map: HashMap<String, usize>, // name -> entries 索引
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN || name.contains('/') || name.contains('\0') {
        return Err(FileSystemError::InvalidPath(name.to_string()));
    }
    Ok(())
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<D: BlockDevice>(disk: &D) -> Result<Self> {
        let mut dir: Directory =
            region::load(disk, DIRECTORY_START_BLOCK_ID, DIRECTORY_BLOCKS, "directory")?;
        dir.rebuild_index_map();
        Ok(dir)
    }

    pub fn sync<D: BlockDevice>(&self, disk: &D) -> Result<()> {
        region::store(
            disk,
            DIRECTORY_START_BLOCK_ID,
            DIRECTORY_BLOCKS,
            self,
            "directory",
        )
    }

    fn rebuild_index_map(&mut self) {
        self.index_map.clear();
        for (i, entry) in self.entries.iter().enumerate() {
            self.index_map.insert(entry.name.clone(), i);
        }
    }

    pub fn add(&mut self, inode_index: usize, name: &str) -> Result<()> {
        validate_name(name)?;
        if self.index_map.contains_key(name) {
            return Err(FileSystemError::Corrupted(format!(
                "duplicate directory entry '{}'",
                name
            )));
        }
        self.entries.push(DirEntry {
            name: name.to_string(),
            inode_index,
        });
        self.index_map
            .insert(name.to_string(), self.entries.len() - 1);
        Ok(())
    }

    // 删除目录项，返回 inode_index
    pub fn remove(&mut self, name: &str) -> Option<usize> {
        let idx = *self.index_map.get(name)?;
        let entry = self.entries.remove(idx);
        self.rebuild_index_map();
        Some(entry.inode_index)
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.index_map
            .get(name)
            .map(|&idx| self.entries[idx].inode_index)
    }

    pub fn list_sorted(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.name.clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
