//! 元数据区：一段连续的块，开头 8 字节是小端长度前缀，
//! 后面紧跟 bincode 编码后的结构体。

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    disk::{Block, BlockDevice, BLOCK_SIZE},
    fs::error::{FileSystemError, Result},
};

const LEN_PREFIX: usize = 8;

pub fn store<D: BlockDevice, T: Serialize>(
    disk: &D,
    start_block: u64,
    blocks: u64,
    value: &T,
    what: &str,
) -> Result<()> {
    let bytes = bincode::serialize(value)
        .map_err(|e| FileSystemError::Corrupted(format!("cannot encode {}: {}", what, e)))?;

    let capacity = blocks as usize * BLOCK_SIZE;
    if bytes.len() + LEN_PREFIX > capacity {
        log::warn!(
            "{} needs {} bytes but its region holds {}",
            what,
            bytes.len() + LEN_PREFIX,
            capacity
        );
        return Err(FileSystemError::NoSpace);
    }

    let mut payload = Vec::with_capacity(bytes.len() + LEN_PREFIX);
    payload.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    payload.extend_from_slice(&bytes);

    for (i, chunk) in payload.chunks(BLOCK_SIZE).enumerate() {
        let mut block: Block = [0; BLOCK_SIZE];
        block[..chunk.len()].copy_from_slice(chunk);
        disk.write_block(start_block + i as u64, &block)?;
    }
    Ok(())
}

pub fn load<D: BlockDevice, T: DeserializeOwned>(
    disk: &D,
    start_block: u64,
    blocks: u64,
    what: &str,
) -> Result<T> {
    let mut block: Block = [0; BLOCK_SIZE];
    disk.read_block(start_block, &mut block)?;

    let mut len_bytes = [0u8; LEN_PREFIX];
    len_bytes.copy_from_slice(&block[..LEN_PREFIX]);
    let len = u64::from_le_bytes(len_bytes) as usize;
    if len == 0 || len + LEN_PREFIX > blocks as usize * BLOCK_SIZE {
        return Err(FileSystemError::Corrupted(format!(
            "{} region has an invalid length {}",
            what, len
        )));
    }

    let mut payload = Vec::with_capacity(len + LEN_PREFIX);
    payload.extend_from_slice(&block);
    let mut i = 1;
    while payload.len() < len + LEN_PREFIX {
        disk.read_block(start_block + i, &mut block)?;
        payload.extend_from_slice(&block);
        i += 1;
    }

    bincode::deserialize(&payload[LEN_PREFIX..LEN_PREFIX + len])
        .map_err(|e| FileSystemError::Corrupted(format!("cannot decode {}: {}", what, e)))
}
