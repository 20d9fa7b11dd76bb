//! Chunk payload codecs.
//!
//! The response decoder sequences chunks; turning one chunk's bytes into a
//! structured value is delegated to a codec collaborator behind this trait.

use serde_json::Value;

use crate::error::Result;

/// Decodes one self-contained chunk payload to a structured value.
pub trait ChunkCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Value>;
}

/// JSON payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ChunkCodec for JsonCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// MessagePack payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgpackCodec;

impl ChunkCodec for MsgpackCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}
