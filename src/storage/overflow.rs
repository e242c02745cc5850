use std::fmt;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DataUnit;
use crate::storage::page::{CancelToken, PageStore};

/// Upper bound on the physical files behind one overflow file
pub const DEFAULT_MAX_FILE_NUM: u32 = 32;

/// Page id of an overflow file.
///
/// The id packs the physical file number into the high bits and the
/// physical page id within that file into the low bits:
///
/// ```text
/// [ file_index : 32 - pageBits ][ physical_page_id : pageBits ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverflowPageId(pub u32);

/// Sentinel terminating a page chain
pub const NO_PAGE: u32 = u32::MAX;

/// Management header of an overflow file, kept on the leaf file's header
/// page.
pub struct OverflowFileHeader {
    page_size: u32,       // physical page size in kilobytes
    max_file_size: u64,   // physical file cap in kilobytes
    max_page_id: u32,     // pages per physical file
    max_file_num: u32,
    used_file_num: u32,
    file_ids: Vec<u32>,   // physical file id per file index
    identifier: u8,

    // bits of the id spent on the in-file page; derived from max_page_id
    // and never serialized
    page_bits: u32,
}

impl OverflowFileHeader {
    pub fn new(page_size: u32, max_file_size: u64, max_page_id: u32, identifier: u8) -> Self {
        let mut header = OverflowFileHeader {
            page_size,
            max_file_size,
            max_page_id,
            max_file_num: 0,
            used_file_num: 0,
            file_ids: Vec::new(),
            identifier,
            page_bits: 0,
        };
        header.set_page_bits();
        header.max_file_num = Self::calc_max_file_num(max_page_id);
        header.file_ids = vec![0; header.max_file_num as usize];
        header
    }

    /// Bits needed for the largest in-file page id
    fn set_page_bits(&mut self) {
        debug_assert!(self.max_page_id > 0);
        self.page_bits = 1;
        let mut tmp = self.max_page_id - 1;
        while tmp > 1 {
            self.page_bits += 1;
            tmp >>= 1;
        }
    }

    /// File count representable beside `max_page_id` pages, capped at the
    /// default maximum
    pub fn calc_max_file_num(max_page_id: u32) -> u32 {
        let mut page_bits = 1u32;
        let mut tmp = max_page_id - 1;
        while tmp > 1 {
            page_bits += 1;
            tmp >>= 1;
        }
        let representable = 1u64 << (32 - page_bits);
        if representable >= DEFAULT_MAX_FILE_NUM as u64 {
            DEFAULT_MAX_FILE_NUM
        } else {
            representable as u32
        }
    }

    pub fn overflow_page_id(&self, file_index: u32, page_id: u32) -> OverflowPageId {
        debug_assert!(page_id < (1 << self.page_bits));
        OverflowPageId((file_index << self.page_bits) | (page_id & ((1 << self.page_bits) - 1)))
    }

    pub fn physical_page_id(&self, page_id: OverflowPageId) -> u32 {
        page_id.0 & ((1 << self.page_bits) - 1)
    }

    pub fn file_index(&self, page_id: OverflowPageId) -> u32 {
        page_id.0 >> self.page_bits
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn set_page_size(&mut self, value: u32) {
        self.page_size = value;
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn set_max_file_size(&mut self, value: u64) {
        self.max_file_size = value;
    }

    pub fn max_page_id(&self) -> u32 {
        self.max_page_id
    }

    pub fn max_file_num(&self) -> u32 {
        self.max_file_num
    }

    pub fn used_file_num(&self) -> u32 {
        self.used_file_num
    }

    pub fn set_used_file_num(&mut self, value: u32) {
        self.used_file_num = value;
    }

    pub fn file_id(&self, index: u32) -> u32 {
        self.file_ids[index as usize]
    }

    pub fn set_file_id(&mut self, index: u32, value: u32) {
        self.file_ids[index as usize] = value;
    }

    pub fn identifier(&self) -> u8 {
        self.identifier
    }

    pub fn set_identifier(&mut self, value: u8) {
        self.identifier = value;
    }

    pub fn page_bits(&self) -> u32 {
        self.page_bits
    }

    /// Serialize field by field in the fixed on-disk order
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.page_size.to_le_bytes());
        out.extend_from_slice(&self.max_file_size.to_le_bytes());
        out.extend_from_slice(&self.max_file_num.to_le_bytes());
        out.extend_from_slice(&self.max_page_id.to_le_bytes());
        out.extend_from_slice(&self.used_file_num.to_le_bytes());
        for i in 0..self.max_file_num {
            out.extend_from_slice(&self.file_ids[i as usize].to_le_bytes());
        }
        out.push(self.identifier);
    }

    /// Deserialize; the trailing identifier byte is absent in headers
    /// written before it existed, which is how versions are told apart.
    pub fn read_from(data: &[u8]) -> Result<Self> {
        fn truncated() -> Error {
            Error::new(
                ErrorKind::BadArgument,
                "overflow file header is truncated".to_string(),
            )
        }
        fn read_u32(data: &[u8], pos: &mut usize) -> Result<u32> {
            let bytes = data.get(*pos..*pos + 4).ok_or_else(truncated)?;
            *pos += 4;
            Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
        }
        fn read_u64(data: &[u8], pos: &mut usize) -> Result<u64> {
            let bytes = data.get(*pos..*pos + 8).ok_or_else(truncated)?;
            *pos += 8;
            Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
        }

        let mut pos = 0usize;
        let page_size = read_u32(data, &mut pos)?;
        let max_file_size = read_u64(data, &mut pos)?;
        let max_file_num = read_u32(data, &mut pos)?;
        let max_page_id = read_u32(data, &mut pos)?;
        let used_file_num = read_u32(data, &mut pos)?;

        if max_file_num > DEFAULT_MAX_FILE_NUM || max_page_id == 0 {
            return Err(Error::new(
                ErrorKind::BadArgument,
                format!("overflow file header is corrupt: maxFileNum={}", max_file_num),
            ));
        }

        let mut file_ids = Vec::with_capacity(max_file_num as usize);
        for _ in 0..max_file_num {
            file_ids.push(read_u32(data, &mut pos)?);
        }

        let identifier = if pos < data.len() { data[pos] } else { 0 };

        let mut header = OverflowFileHeader {
            page_size,
            max_file_size,
            max_page_id,
            max_file_num,
            used_file_num,
            file_ids,
            identifier,
            page_bits: 0,
        };
        header.set_page_bits();
        Ok(header)
    }
}

impl fmt::Display for OverflowFileHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "pageSize: {}, maxFileSize: {}, maxPageID: {}, maxFileNum: {}, usedFileNum: {}, fileID:",
            self.page_size, self.max_file_size, self.max_page_id, self.max_file_num,
            self.used_file_num
        )?;
        for i in 0..self.used_file_num {
            write!(f, " [{}]: {}", i, self.file_ids[i as usize])?;
        }
        Ok(())
    }
}

/// Posting streams flushed beyond their leaf entry live in chains of
/// overflow pages. Each page reserves two units: the id of the next page
/// in the chain and the used payload bits; the packed units follow.
pub struct OverflowFile<S: PageStore> {
    store: S,
}

const PAGE_RESERVED_UNITS: usize = 2;

impl<S: PageStore> OverflowFile<S> {
    pub fn new(store: S) -> Self {
        OverflowFile { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn payload_units(&self) -> usize {
        self.store.page_unit_count() - PAGE_RESERVED_UNITS
    }

    /// Write a packed stream into a freshly allocated page chain and
    /// return the head page id.
    pub fn write_chain(&self, units: &[DataUnit], used_bits: u32) -> Result<OverflowPageId> {
        debug_assert!((used_bits as usize).div_ceil(32) <= units.len());
        let payload = self.payload_units();

        let mut handles = Vec::new();
        let mut offset = 0usize;
        let mut bits_left = used_bits as usize;
        loop {
            let page = self.store.allocate()?;
            let page_bits = bits_left.min(payload * 32);
            let page_units = page_bits.div_ceil(32);
            {
                let mut data = page.write();
                data[0] = NO_PAGE;
                data[1] = page_bits as u32;
                data[PAGE_RESERVED_UNITS..PAGE_RESERVED_UNITS + page_units]
                    .copy_from_slice(&units[offset..offset + page_units]);
            }
            self.store.dirty(&page);
            handles.push(page);

            offset += page_units;
            bits_left -= page_bits;
            if bits_left == 0 {
                break;
            }
        }

        // link the chain front to back
        for i in 0..handles.len() - 1 {
            let next_id = handles[i + 1].id().0;
            handles[i].write()[0] = next_id;
        }

        Ok(handles[0].id())
    }

    /// Read a whole chain back. The cancel token is polled once per page
    /// fetch, the only blocking boundary of an evaluation.
    pub fn read_chain(
        &self,
        head: OverflowPageId,
        cancel: &CancelToken,
    ) -> Result<(Vec<DataUnit>, u32)> {
        let mut units = Vec::new();
        let mut total_bits = 0u32;

        let mut next = head.0;
        while next != NO_PAGE {
            if cancel.is_canceled() {
                return Err(Error::new(
                    ErrorKind::Canceled,
                    "query canceled during page fetch".to_string(),
                ));
            }
            let page = self.store.attach(OverflowPageId(next))?;
            let data = page.read();
            let page_bits = data[1];
            let page_units = (page_bits as usize).div_ceil(32);
            units.extend_from_slice(
                &data[PAGE_RESERVED_UNITS..PAGE_RESERVED_UNITS + page_units],
            );
            total_bits += page_bits;
            next = data[0];
        }

        Ok((units, total_bits))
    }

    /// Release every page of a chain
    pub fn free_chain(&self, head: OverflowPageId) -> Result<()> {
        let mut next = head.0;
        while next != NO_PAGE {
            let page = self.store.attach(OverflowPageId(next))?;
            let following = page.read()[0];
            drop(page);
            self.store.free(OverflowPageId(next))?;
            next = following;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::page::MemoryPageStore;

    #[test]
    fn test_page_id_bijection() {
        // maxPageID 256 needs 8 page bits
        let header = OverflowFileHeader::new(16, 1 << 20, 256, b'I');
        assert_eq!(header.page_bits(), 8);
        assert_eq!(header.max_file_num(), 32);

        let oid = header.overflow_page_id(3, 200);
        assert_eq!(oid.0, 0x3C8);
        assert_eq!(header.file_index(oid), 3);
        assert_eq!(header.physical_page_id(oid), 200);

        for file_index in [0u32, 1, 7, 31] {
            for page_id in [0u32, 1, 100, 255] {
                let oid = header.overflow_page_id(file_index, page_id);
                assert_eq!(header.file_index(oid), file_index);
                assert_eq!(header.physical_page_id(oid), page_id);
            }
        }
    }

    #[test]
    fn test_max_file_num_cap() {
        // huge per-file page counts leave few file bits
        assert_eq!(OverflowFileHeader::calc_max_file_num(1 << 28), 16);
        assert_eq!(OverflowFileHeader::calc_max_file_num(1 << 30), 4);
        // small files hit the fixed cap
        assert_eq!(OverflowFileHeader::calc_max_file_num(256), 32);
        assert_eq!(OverflowFileHeader::calc_max_file_num(2), 32);
    }

    #[test]
    fn test_header_serialization_round_trip() {
        let mut header = OverflowFileHeader::new(16, 1 << 22, 1024, b'L');
        header.set_used_file_num(2);
        header.set_file_id(0, 100);
        header.set_file_id(1, 101);

        let mut bytes = Vec::new();
        header.write_to(&mut bytes);

        let loaded = OverflowFileHeader::read_from(&bytes).unwrap();
        assert_eq!(loaded.page_size(), 16);
        assert_eq!(loaded.max_file_size(), 1 << 22);
        assert_eq!(loaded.max_page_id(), 1024);
        assert_eq!(loaded.max_file_num(), header.max_file_num());
        assert_eq!(loaded.used_file_num(), 2);
        assert_eq!(loaded.file_id(0), 100);
        assert_eq!(loaded.file_id(1), 101);
        assert_eq!(loaded.identifier(), b'L');
        // derived, not serialized
        assert_eq!(loaded.page_bits(), header.page_bits());
    }

    #[test]
    fn test_header_without_identifier_is_older_version() {
        let header = OverflowFileHeader::new(16, 1 << 22, 1024, b'L');
        let mut bytes = Vec::new();
        header.write_to(&mut bytes);
        bytes.pop(); // pre-identifier layout

        let loaded = OverflowFileHeader::read_from(&bytes).unwrap();
        assert_eq!(loaded.identifier(), 0);
    }

    #[test]
    fn test_chain_round_trip() {
        // 8 units per page leaves 6 payload units; force several pages
        let file = OverflowFile::new(MemoryPageStore::new(8));
        let units: Vec<u32> = (0..40).map(|i| i * 17 + 3).collect();
        let used_bits = 40 * 32 - 5;

        let head = file.write_chain(&units, used_bits).unwrap();
        let cancel = CancelToken::new();
        let (read, bits) = file.read_chain(head, &cancel).unwrap();
        assert_eq!(bits, used_bits);
        // every fully used unit survives; the tail unit also round-trips
        assert_eq!(read.len(), units.len());
        assert_eq!(read, units);
    }

    #[test]
    fn test_chain_cancellation() {
        let file = OverflowFile::new(MemoryPageStore::new(8));
        let units: Vec<u32> = (0..100).collect();
        let head = file.write_chain(&units, 100 * 32).unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let err = file.read_chain(head, &cancel).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Canceled);
    }

    #[test]
    fn test_free_chain() {
        let store = MemoryPageStore::new(8);
        let file = OverflowFile::new(store);
        let units: Vec<u32> = (0..30).collect();
        let head = file.write_chain(&units, 30 * 32).unwrap();
        assert!(file.store().page_count() > 1);

        file.free_chain(head).unwrap();
        assert_eq!(file.store().page_count(), 0);
    }
}
