//! Chunk and object types passed between the codec and the channel drivers.

use bytes::Bytes;

/// A bounded-size slice of an object, tagged with its position.
///
/// Lives only while an upload is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position within the object.
    pub index: usize,
    /// Chunk bytes, a view into the object's buffer.
    pub payload: Bytes,
    /// `"<originalName>.part<index+1>"`.
    pub source_name: String,
}

/// A chunk downloaded back from the channel, waiting for reassembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Zero-based position within the object.
    pub index: usize,
    /// Downloaded bytes.
    pub content: Bytes,
    /// Attachment name the chunk was stored under.
    pub raw_file_name: String,
}

/// An object reassembled from its chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Original name recovered from the first chunk.
    pub name: String,
    /// Object bytes.
    pub content: Bytes,
}
