use std::io::Result;

use crate::disk::types::Block;

/// Raw block store. Every call moves exactly one whole block.
pub trait BlockDevice: Send + Sync {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()>;
    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()>;
}

pub(crate) fn out_of_range(block_id: u64) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("block {} is outside the device", block_id),
    )
}
