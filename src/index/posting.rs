use std::sync::Arc;
use crate::coder::{self, Coder};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::types::{DataUnit, DocId};
use crate::location::SmartLocationList;

/// The three coders a posting stream is packed with
#[derive(Clone)]
pub struct PostingCoders {
    pub id: Arc<dyn Coder>,
    pub frequency: Arc<dyn Coder>,
    pub location: Arc<dyn Coder>,
}

impl PostingCoders {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(PostingCoders {
            id: coder::parse_coder(&config.id_coder)?,
            frequency: coder::parse_coder(&config.frequency_coder)?,
            location: coder::parse_coder(&config.location_coder)?,
        })
    }
}

/// Write side of one term's posting stream.
///
/// Per document the stream packs the document-id gap, the in-document
/// frequency, the bit length of the location block, and the location gaps
/// copied straight out of the document's `SmartLocationList`.
pub struct PostingBuffer {
    coders: PostingCoders,
    units: Vec<DataUnit>,
    tail_bits: u32,
    last_doc_id: u32,
    doc_count: u32,
    total_freq: u64,
    store_locations: bool,
}

impl PostingBuffer {
    pub fn new(coders: PostingCoders, store_locations: bool) -> Self {
        PostingBuffer {
            coders,
            units: vec![0; 4],
            tail_bits: 0,
            last_doc_id: 0,
            doc_count: 0,
            total_freq: 0,
            store_locations,
        }
    }

    fn append_value(&mut self, which: Which, value: u32) {
        loop {
            let coder = match which {
                Which::Id => &self.coders.id,
                Which::Frequency => &self.coders.frequency,
                Which::Location => &self.coders.location,
            };
            let cap_bits = (self.units.len() as u32) << 5;
            if coder.append(value, &mut self.units, cap_bits, &mut self.tail_bits) {
                return;
            }
            let grown = self.units.len() * 2;
            self.units.resize(grown, 0);
        }
    }

    fn reserve_bits(&mut self, bits: u32) {
        let needed = ((self.tail_bits + bits) as usize).div_ceil(32);
        if needed > self.units.len() {
            let grown = needed.next_power_of_two();
            self.units.resize(grown, 0);
        }
    }

    /// Append one document's occurrences. Documents must arrive in
    /// ascending id order; the list must not be empty.
    pub fn append(&mut self, doc_id: DocId, locations: &SmartLocationList) {
        debug_assert!(doc_id.0 > self.last_doc_id);
        debug_assert!(locations.size() > 0);

        let gap = doc_id.0 - self.last_doc_id;
        let tf = locations.size();

        self.append_value(Which::Id, gap);
        self.append_value(Which::Frequency, tf);

        if self.store_locations {
            let loc_bits = locations.bit_length();
            self.append_value(Which::Location, loc_bits);
            self.reserve_bits(loc_bits);
            if locations.size() > 4 {
                // packed area copies bit for bit
                locations.copy(&mut self.units, &mut self.tail_bits);
            } else {
                // small lists re-emit their gaps through the coder
                let mut last = 0;
                for i in 0..locations.size() {
                    let value = locations.get(i);
                    let cap_bits = (self.units.len() as u32) << 5;
                    let ok = self.coders.location.append(
                        value - last,
                        &mut self.units,
                        cap_bits,
                        &mut self.tail_bits,
                    );
                    debug_assert!(ok);
                    last = value;
                }
            }
        }

        self.last_doc_id = doc_id.0;
        self.doc_count += 1;
        self.total_freq += tf as u64;
    }

    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    pub fn total_freq(&self) -> u64 {
        self.total_freq
    }

    pub fn bit_length(&self) -> u32 {
        self.tail_bits
    }

    pub fn units(&self) -> &[DataUnit] {
        &self.units
    }

    /// Snapshot the stream into a read-side list
    pub fn to_list(&self) -> PostingList {
        PostingList {
            coders: self.coders.clone(),
            units: self.units[..(self.tail_bits as usize).div_ceil(32).max(1)].to_vec(),
            end_bits: self.tail_bits,
            doc_count: self.doc_count,
            total_freq: self.total_freq,
            store_locations: self.store_locations,
        }
    }
}

enum Which {
    Id,
    Frequency,
    Location,
}

/// Read side of one term's posting stream
pub struct PostingList {
    pub(crate) coders: PostingCoders,
    pub(crate) units: Vec<DataUnit>,
    pub(crate) end_bits: u32,
    pub(crate) doc_count: u32,
    pub(crate) total_freq: u64,
    pub(crate) store_locations: bool,
}

impl std::fmt::Debug for PostingList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostingList")
            .field("units", &self.units)
            .field("end_bits", &self.end_bits)
            .field("doc_count", &self.doc_count)
            .field("total_freq", &self.total_freq)
            .field("store_locations", &self.store_locations)
            .finish()
    }
}

impl PostingList {
    pub fn from_units(
        coders: PostingCoders,
        units: Vec<DataUnit>,
        end_bits: u32,
        doc_count: u32,
        total_freq: u64,
        store_locations: bool,
    ) -> Self {
        PostingList { coders, units, end_bits, doc_count, total_freq, store_locations }
    }

    /// Document frequency of the term
    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    /// Occurrences across all documents
    pub fn total_freq(&self) -> u64 {
        self.total_freq
    }

    pub fn bit_length(&self) -> u32 {
        self.end_bits
    }
}
