use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use lru::LruCache;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DataUnit;
use crate::storage::overflow::OverflowPageId;

/// Cooperative cancellation flag, polled at page-fetch boundaries only.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One attached physical page
pub struct Page {
    data: RwLock<Vec<DataUnit>>,
    dirty: AtomicBool,
}

impl Page {
    fn new(unit_count: usize) -> Self {
        Page {
            data: RwLock::new(vec![0; unit_count]),
            dirty: AtomicBool::new(false),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}

/// Scoped page access; the attachment ends when the handle drops.
#[derive(Clone)]
pub struct PageHandle {
    id: OverflowPageId,
    page: Arc<Page>,
}

impl PageHandle {
    pub fn id(&self) -> OverflowPageId {
        self.id
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<DataUnit>> {
        self.page.data.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<DataUnit>> {
        self.page.data.write()
    }
}

/// Paged storage backing overflow files. The engine only attaches, frees
/// and marks pages; eviction and durability live behind this interface.
/// The cache guarantees at most one writer per page.
pub trait PageStore: Send + Sync {
    fn attach(&self, page_id: OverflowPageId) -> Result<PageHandle>;
    fn allocate(&self) -> Result<PageHandle>;
    fn free(&self, page_id: OverflowPageId) -> Result<()>;
    fn dirty(&self, handle: &PageHandle);

    /// Units per page
    fn page_unit_count(&self) -> usize;
}

/// Heap-backed page store, the default backing for tests and small indexes
pub struct MemoryPageStore {
    unit_count: usize,
    pages: Mutex<HashMap<u32, Arc<Page>>>,
    next_id: Mutex<u32>,
}

impl MemoryPageStore {
    pub fn new(unit_count: usize) -> Self {
        MemoryPageStore {
            unit_count,
            pages: Mutex::new(HashMap::new()),
            next_id: Mutex::new(0),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.lock().len()
    }
}

impl PageStore for MemoryPageStore {
    fn attach(&self, page_id: OverflowPageId) -> Result<PageHandle> {
        let pages = self.pages.lock();
        match pages.get(&page_id.0) {
            Some(page) => Ok(PageHandle { id: page_id, page: page.clone() }),
            None => Err(Error::new(
                ErrorKind::BadArgument,
                format!("page {} is not allocated", page_id.0),
            )),
        }
    }

    fn allocate(&self) -> Result<PageHandle> {
        let mut next = self.next_id.lock();
        let id = OverflowPageId(*next);
        *next += 1;

        let page = Arc::new(Page::new(self.unit_count));
        self.pages.lock().insert(id.0, page.clone());
        Ok(PageHandle { id, page })
    }

    fn free(&self, page_id: OverflowPageId) -> Result<()> {
        match self.pages.lock().remove(&page_id.0) {
            Some(_) => Ok(()),
            None => Err(Error::new(
                ErrorKind::BadArgument,
                format!("page {} is not allocated", page_id.0),
            )),
        }
    }

    fn dirty(&self, handle: &PageHandle) {
        handle.page.dirty.store(true, Ordering::Release);
    }

    fn page_unit_count(&self) -> usize {
        self.unit_count
    }
}

/// LRU attachment cache over another store. Clean attachments are served
/// from the cache; dirtying a page drops it so the inner store stays the
/// single writer authority.
pub struct CachedPageStore<S: PageStore> {
    inner: S,
    cache: Mutex<LruCache<u32, PageHandle>>,
}

impl<S: PageStore> CachedPageStore<S> {
    pub fn new(inner: S, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        CachedPageStore {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: PageStore> PageStore for CachedPageStore<S> {
    fn attach(&self, page_id: OverflowPageId) -> Result<PageHandle> {
        if let Some(handle) = self.cache.lock().get(&page_id.0) {
            return Ok(handle.clone());
        }
        let handle = self.inner.attach(page_id)?;
        self.cache.lock().put(page_id.0, handle.clone());
        Ok(handle)
    }

    fn allocate(&self) -> Result<PageHandle> {
        self.inner.allocate()
    }

    fn free(&self, page_id: OverflowPageId) -> Result<()> {
        self.cache.lock().pop(&page_id.0);
        self.inner.free(page_id)
    }

    fn dirty(&self, handle: &PageHandle) {
        self.cache.lock().pop(&handle.id().0);
        self.inner.dirty(handle);
    }

    fn page_unit_count(&self) -> usize {
        self.inner.page_unit_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_attach_free() {
        let store = MemoryPageStore::new(16);
        let a = store.allocate().unwrap();
        let b = store.allocate().unwrap();
        assert_ne!(a.id().0, b.id().0);

        a.write()[0] = 42;
        let again = store.attach(a.id()).unwrap();
        assert_eq!(again.read()[0], 42);

        store.free(a.id()).unwrap();
        assert!(store.attach(a.id()).is_err());
        assert!(store.free(a.id()).is_err());
    }

    #[test]
    fn test_dirty_flag() {
        let store = MemoryPageStore::new(16);
        let page = store.allocate().unwrap();
        assert!(!page.page.is_dirty());
        store.dirty(&page);
        assert!(page.page.is_dirty());
    }

    #[test]
    fn test_cached_store_serves_repeat_attach() {
        let store = CachedPageStore::new(MemoryPageStore::new(16), 4);
        let page = store.allocate().unwrap();
        page.write()[3] = 7;
        let id = page.id();
        drop(page);

        let first = store.attach(id).unwrap();
        let second = store.attach(id).unwrap();
        assert_eq!(first.read()[3], 7);
        assert_eq!(second.read()[3], 7);
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_canceled());
        let shared = token.clone();
        shared.cancel();
        assert!(token.is_canceled());
    }
}
