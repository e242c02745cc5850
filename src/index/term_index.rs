use std::collections::{BTreeMap, HashMap};
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::posting::{PostingBuffer, PostingCoders, PostingList};
use crate::location::SmartLocationList;
use crate::storage::{CancelToken, OverflowFile, OverflowPageId, PageStore};

/// Term representation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Term(Vec<u8>);

impl Term {
    pub fn new(text: &str) -> Self {
        Term(text.as_bytes().to_vec())
    }

    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.0)
            .map_err(|_| Error::new(ErrorKind::Parse, "invalid UTF-8 in term".to_string()))
    }

    /// Character count, used as the token length of location iterators
    pub fn char_length(&self) -> u32 {
        match std::str::from_utf8(&self.0) {
            Ok(s) => s.chars().count() as u32,
            Err(_) => self.0.len() as u32,
        }
    }
}

/// Per-term statistics and storage location
#[derive(Debug, Clone)]
pub struct TermInfo {
    pub doc_freq: u32,
    pub total_freq: u64,
    pub head_page: Option<OverflowPageId>,
    pub bit_length: u32,
}

/// In-memory inverted index over pre-tokenized documents.
///
/// Tokenization is the caller's concern; documents arrive as
/// (term text, 1-based position) pairs in position order.
pub struct TermIndex {
    coders: PostingCoders,
    store_locations: bool,
    postings: HashMap<Term, PostingBuffer>,
    doc_count: u32,
    total_tokens: u64,
    max_doc_id: DocId,
}

impl TermIndex {
    pub fn new(coders: PostingCoders, store_locations: bool) -> Self {
        TermIndex {
            coders,
            store_locations,
            postings: HashMap::new(),
            doc_count: 0,
            total_tokens: 0,
            max_doc_id: DocId(0),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(PostingCoders::from_config(config)?, true))
    }

    pub fn coders(&self) -> &PostingCoders {
        &self.coders
    }

    pub fn add_document(&mut self, doc_id: DocId, tokens: &[(&str, u32)]) -> Result<()> {
        if doc_id <= self.max_doc_id {
            return Err(Error::new(
                ErrorKind::BadArgument,
                format!("document {} arrives out of order", doc_id.0),
            ));
        }

        // group occurrence positions per term; BTreeMap keeps the
        // per-document insertion order deterministic
        let mut term_locations: BTreeMap<Term, SmartLocationList> = BTreeMap::new();
        for &(text, position) in tokens {
            term_locations
                .entry(Term::new(text))
                .or_insert_with(|| SmartLocationList::new(self.coders.location.clone()))
                .push_back(position);
        }

        for (term, locations) in term_locations {
            self.postings
                .entry(term)
                .or_insert_with(|| PostingBuffer::new(self.coders.clone(), self.store_locations))
                .append(doc_id, &locations);
        }

        self.doc_count += 1;
        self.total_tokens += tokens.len() as u64;
        self.max_doc_id = doc_id;
        Ok(())
    }

    /// Snapshot one term's postings for evaluation
    pub fn posting_list(&self, term: &Term) -> Option<PostingList> {
        self.postings.get(term).map(|buffer| buffer.to_list())
    }

    pub fn term_info(&self, term: &Term) -> Option<TermInfo> {
        self.postings.get(term).map(|buffer| TermInfo {
            doc_freq: buffer.doc_count(),
            total_freq: buffer.total_freq(),
            head_page: None,
            bit_length: buffer.bit_length(),
        })
    }

    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.postings.keys()
    }

    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn max_doc_id(&self) -> DocId {
        self.max_doc_id
    }

    /// Flush every posting stream into overflow page chains and return the
    /// dictionary of stored terms.
    pub fn flush<S: PageStore>(
        &self,
        file: &OverflowFile<S>,
    ) -> Result<HashMap<Term, TermInfo>> {
        let mut dictionary = HashMap::with_capacity(self.postings.len());
        for (term, buffer) in &self.postings {
            let head = file.write_chain(buffer.units(), buffer.bit_length())?;
            dictionary.insert(
                term.clone(),
                TermInfo {
                    doc_freq: buffer.doc_count(),
                    total_freq: buffer.total_freq(),
                    head_page: Some(head),
                    bit_length: buffer.bit_length(),
                },
            );
        }
        Ok(dictionary)
    }

    /// Load a flushed posting stream back from its page chain
    pub fn load_posting<S: PageStore>(
        &self,
        file: &OverflowFile<S>,
        info: &TermInfo,
        cancel: &CancelToken,
    ) -> Result<PostingList> {
        let head = info.head_page.ok_or_else(|| {
            Error::new(ErrorKind::BadArgument, "term has no stored postings".to_string())
        })?;
        let (units, bits) = file.read_chain(head, cancel)?;
        if bits != info.bit_length {
            return Err(Error::new(
                ErrorKind::Unexpected,
                format!("posting chain carries {} bits, dictionary says {}", bits, info.bit_length),
            ));
        }
        Ok(PostingList::from_units(
            self.coders.clone(),
            units,
            bits,
            info.doc_freq,
            info.total_freq,
            self.store_locations,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::coder::ParameterizedExpGolombCoder;
    use crate::storage::MemoryPageStore;

    fn coders() -> PostingCoders {
        PostingCoders {
            id: Arc::new(ParameterizedExpGolombCoder::new(1).unwrap()),
            frequency: Arc::new(ParameterizedExpGolombCoder::new(0).unwrap()),
            location: Arc::new(ParameterizedExpGolombCoder::new(0).unwrap()),
        }
    }

    #[test]
    fn test_add_documents() {
        let mut index = TermIndex::new(coders(), true);
        index
            .add_document(DocId(1), &[("quick", 1), ("brown", 2), ("quick", 3)])
            .unwrap();
        index.add_document(DocId(2), &[("brown", 1), ("fox", 2)]).unwrap();

        assert_eq!(index.doc_count(), 2);
        assert_eq!(index.total_tokens(), 5);
        assert_eq!(index.max_doc_id(), DocId(2));

        let info = index.term_info(&Term::new("quick")).unwrap();
        assert_eq!(info.doc_freq, 1);
        assert_eq!(info.total_freq, 2);

        let info = index.term_info(&Term::new("brown")).unwrap();
        assert_eq!(info.doc_freq, 2);
        assert_eq!(info.total_freq, 2);

        assert!(index.posting_list(&Term::new("lazy")).is_none());
    }

    #[test]
    fn test_out_of_order_document_is_rejected() {
        let mut index = TermIndex::new(coders(), true);
        index.add_document(DocId(5), &[("a", 1)]).unwrap();
        assert!(index.add_document(DocId(5), &[("a", 1)]).is_err());
        assert!(index.add_document(DocId(3), &[("a", 1)]).is_err());
    }

    #[test]
    fn test_flush_and_load_round_trip() {
        let mut index = TermIndex::new(coders(), true);
        index
            .add_document(DocId(1), &[("alpha", 1), ("beta", 2), ("alpha", 5)])
            .unwrap();
        index.add_document(DocId(4), &[("alpha", 2)]).unwrap();

        let file = OverflowFile::new(MemoryPageStore::new(8));
        let dictionary = index.flush(&file).unwrap();
        let info = &dictionary[&Term::new("alpha")];
        assert_eq!(info.doc_freq, 2);

        let cancel = CancelToken::new();
        let loaded = index.load_posting(&file, info, &cancel).unwrap();
        assert_eq!(loaded.doc_count(), 2);
        assert_eq!(loaded.total_freq(), 3);
        assert_eq!(loaded.bit_length(), info.bit_length);

        let memory = index.posting_list(&Term::new("alpha")).unwrap();
        assert_eq!(memory.bit_length(), loaded.bit_length());
    }
}
