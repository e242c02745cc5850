use bytes::Bytes;
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};

/// Uncompressed payload per sub-block
pub const BLOCK_SIZE: usize = 32 * 1024;

/// Sub-block compression codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionType {
    None,
    Lz4,      // fast, modest ratio
    Zstd,     // best ratio, slower
    Snappy,   // balanced
}

fn compress(data: &[u8], compression: CompressionType) -> Result<Vec<u8>> {
    match compression {
        CompressionType::None => Ok(data.to_vec()),
        CompressionType::Lz4 => Ok(lz4_flex::block::compress(data)),
        CompressionType::Zstd => {
            zstd::encode_all(data, 3) // level 3 is balanced
                .map_err(|e| Error::new(ErrorKind::Io, e.to_string()))
        }
        CompressionType::Snappy => {
            let mut encoder = snap::raw::Encoder::new();
            encoder
                .compress_vec(data)
                .map_err(|e| Error::new(ErrorKind::Io, e.to_string()))
        }
    }
}

fn uncompress(data: &[u8], uncompressed_len: usize, compression: CompressionType) -> Result<Vec<u8>> {
    match compression {
        CompressionType::None => Ok(data.to_vec()),
        CompressionType::Lz4 => lz4_flex::block::decompress(data, uncompressed_len)
            .map_err(|e| Error::new(ErrorKind::Io, e.to_string())),
        CompressionType::Zstd => {
            zstd::decode_all(data).map_err(|e| Error::new(ErrorKind::Io, e.to_string()))
        }
        CompressionType::Snappy => {
            let mut decoder = snap::raw::Decoder::new();
            decoder
                .decompress_vec(data)
                .map_err(|e| Error::new(ErrorKind::Io, e.to_string()))
        }
    }
}

/// One independently compressed sub-block
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LobBlock {
    data: Vec<u8>,          // compressed payload
    uncompressed_len: u32,
    checksum: u32,          // over the uncompressed payload
}

impl LobBlock {
    fn build(payload: &[u8], compression: CompressionType) -> Result<LobBlock> {
        debug_assert!(payload.len() <= BLOCK_SIZE);
        Ok(LobBlock {
            data: compress(payload, compression)?,
            uncompressed_len: payload.len() as u32,
            checksum: crc32fast::hash(payload),
        })
    }

    fn open(&self, compression: CompressionType) -> Result<Vec<u8>> {
        uncompress(&self.data, self.uncompressed_len as usize, compression)
    }
}

/// One data page of the chain
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LobPage {
    id: u32,
    prev: Option<u32>,
    next: Option<u32>,
    blocks: Vec<LobBlock>,
    used: usize,            // compressed bytes on the page
}

impl LobPage {
    fn uncompressed_len(&self) -> usize {
        self.blocks.iter().map(|b| b.uncompressed_len as usize).sum()
    }
}

/// A large object stored as a chain of pages, each packing a run of
/// independently compressed 32 KiB sub-blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedLobData {
    compression: CompressionType,
    page_capacity: usize,   // compressed bytes a page accepts
    pages: Vec<LobPage>,
    length: u64,            // uncompressed bytes overall
    next_page_id: u32,
}

impl CompressedLobData {
    pub fn new(compression: CompressionType, page_capacity: usize) -> Self {
        debug_assert!(page_capacity > 0);
        CompressedLobData {
            compression,
            page_capacity,
            pages: Vec::new(),
            length: 0,
            next_page_id: 0,
        }
    }

    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn compression(&self) -> CompressionType {
        self.compression
    }

    fn allocate_page(&mut self) -> usize {
        let id = self.next_page_id;
        self.next_page_id += 1;
        let prev = self.pages.last().map(|p| p.id);
        if let Some(last) = self.pages.last_mut() {
            last.next = Some(id);
        }
        self.pages.push(LobPage { id, prev, next: None, blocks: Vec::new(), used: 0 });
        self.pages.len() - 1
    }

    fn push_block(&mut self, block: LobBlock) {
        let need = block.data.len();
        let target = match self.pages.last() {
            Some(page) if page.used + need <= self.page_capacity => self.pages.len() - 1,
            _ => self.allocate_page(),
        };
        let page = &mut self.pages[target];
        page.used += need;
        page.blocks.push(block);
    }

    /// Append bytes at the end.
    ///
    /// A partial tail block is first uncompressed, spliced with the new
    /// bytes and truncated away, then everything flows back in block-sized
    /// pieces.
    pub fn append(&mut self, buffer: &[u8]) -> Result<()> {
        if self.length + buffer.len() as u64 > i32::MAX as u64 {
            return Err(Error::new(
                ErrorKind::BadArgument,
                "large object exceeds its maximum size".to_string(),
            ));
        }

        let mut pending: Vec<u8>;
        let tail_partial = self
            .pages
            .last()
            .and_then(|p| p.blocks.last())
            .map(|b| (b.uncompressed_len as usize) < BLOCK_SIZE)
            .unwrap_or(false);

        if tail_partial {
            let page = self.pages.last_mut().unwrap();
            let block = page.blocks.pop().unwrap();
            page.used -= block.data.len();
            let mut tail = block.open(self.compression)?;
            self.length -= tail.len() as u64;
            tail.extend_from_slice(buffer);
            pending = tail;
        } else {
            pending = buffer.to_vec();
        }

        self.length += pending.len() as u64;
        let mut offset = 0usize;
        while offset < pending.len() {
            let take = (pending.len() - offset).min(BLOCK_SIZE);
            let block = LobBlock::build(&pending[offset..offset + take], self.compression)?;
            self.push_block(block);
            offset += take;
        }
        pending.clear();
        Ok(())
    }

    /// Read a range, decompressing block by block. A range past the end is
    /// clipped, possibly to nothing.
    pub fn get(&self, position: u64, length: usize) -> Result<Bytes> {
        let mut length = length as u64;
        if position + length > self.length {
            length = self.length.saturating_sub(position);
        }
        if length == 0 {
            return Ok(Bytes::new());
        }

        let mut out = Vec::with_capacity(length as usize);
        let mut skip = position;
        let mut remaining = length as usize;

        'pages: for page in &self.pages {
            let page_len = page.uncompressed_len() as u64;
            if skip >= page_len {
                skip -= page_len;
                continue;
            }
            for block in &page.blocks {
                let block_len = block.uncompressed_len as u64;
                if skip >= block_len {
                    skip -= block_len;
                    continue;
                }
                let payload = block.open(self.compression)?;
                let start = skip as usize;
                let take = (payload.len() - start).min(remaining);
                out.extend_from_slice(&payload[start..start + take]);
                remaining -= take;
                skip = 0;
                if remaining == 0 {
                    break 'pages;
                }
            }
        }

        Ok(Bytes::from(out))
    }

    /// Drop bytes from the tail
    pub fn truncate(&mut self, bytes: u64) -> Result<()> {
        if bytes > self.length {
            return Err(Error::new(
                ErrorKind::BadArgument,
                "truncating more than the object holds".to_string(),
            ));
        }
        let mut to_drop = bytes;
        while to_drop > 0 {
            let page = match self.pages.last_mut() {
                Some(page) => page,
                None => break,
            };
            match page.blocks.last() {
                Some(block) => {
                    let block_len = block.uncompressed_len as u64;
                    if block_len <= to_drop {
                        let block = page.blocks.pop().unwrap();
                        page.used -= block.data.len();
                        to_drop -= block_len;
                    } else {
                        // shrink the tail block in place
                        let block = page.blocks.pop().unwrap();
                        page.used -= block.data.len();
                        let mut payload = block.open(self.compression)?;
                        payload.truncate((block_len - to_drop) as usize);
                        let rebuilt = LobBlock::build(&payload, self.compression)?;
                        page.used += rebuilt.data.len();
                        page.blocks.push(rebuilt);
                        to_drop = 0;
                    }
                }
                None => {}
            }
            if self.pages.last().map(|p| p.blocks.is_empty()).unwrap_or(false) {
                self.pages.pop();
                if let Some(last) = self.pages.last_mut() {
                    last.next = None;
                }
            }
        }
        self.length -= bytes;
        Ok(())
    }

    /// Consistency check: page links, per-block uncompressed sizes and
    /// checksums, and the total length.
    pub fn verify(&self) -> Result<()> {
        let mut previous: Option<u32> = None;
        let mut total = 0u64;

        for page in &self.pages {
            if page.prev != previous {
                return Err(Error::new(
                    ErrorKind::Unexpected,
                    format!("page {} has a broken backward link", page.id),
                ));
            }
            if let Some(prev) = previous {
                let prev_page = self.pages.iter().find(|p| p.id == prev).unwrap();
                if prev_page.next != Some(page.id) {
                    return Err(Error::new(
                        ErrorKind::Unexpected,
                        format!("page {} has a broken forward link", prev),
                    ));
                }
            }
            previous = Some(page.id);

            for block in &page.blocks {
                let payload = block.open(self.compression)?;
                if payload.len() != block.uncompressed_len as usize {
                    return Err(Error::new(
                        ErrorKind::Unexpected,
                        format!("block on page {} has inconsistent size", page.id),
                    ));
                }
                if crc32fast::hash(&payload) != block.checksum {
                    return Err(Error::new(
                        ErrorKind::Unexpected,
                        format!("block on page {} fails its checksum", page.id),
                    ));
                }
                total += payload.len() as u64;
            }
        }

        if let Some(last) = self.pages.last() {
            if last.next.is_some() {
                return Err(Error::new(
                    ErrorKind::Unexpected,
                    "tail page links forward".to_string(),
                ));
            }
        }
        if total != self.length {
            return Err(Error::new(
                ErrorKind::Unexpected,
                format!("object length {} but blocks hold {}", self.length, total),
            ));
        }
        Ok(())
    }

    /// Persistable form of the whole chain
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let loaded: CompressedLobData = bincode::deserialize(data)?;
        loaded.verify()?;
        Ok(loaded)
    }
}
