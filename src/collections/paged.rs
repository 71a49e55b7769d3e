//! Append-only paged arenas written by many threads, read as one address space.
//!
//! Writers never share a page. Each [`PageAllocator`] owns the page it is currently
//! filling and only reserves a fresh page id from the shared [`PagedBuilder`] when
//! that page runs out, the same way a thread-local allocation buffer works. Retired
//! pages are handed to the builder once, when the allocator is dropped.
//!
//! Memory layout:
//! - addresses are `page_id << page_shift | offset_in_page`, counted in elements
//! - an allocation never straddles two pages
//! - an allocation larger than a page gets its own exactly-sized *oversize* page
//!
//! ### Performance Characteristics
//! | Operation | Complexity | Notes |
//! |-----------|------------|-------|
//! | `allocate` | \(O(1)\) amortized | Atomic `fetch_add` only on page turnover |
//! | `slice_from` | \(O(1)\) | Shift + mask, no search |
//! | `reorder` | \(O(n + p)\) | One pass over offsets, one over pages |

use core::mem;
use core::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::error::{CompressionError, Result};

/// Shared side of an arena under construction.
pub struct PagedBuilder<T> {
    page_shift: u32,
    page_limit: usize,
    next_page: AtomicUsize,
    pages: Mutex<Vec<(usize, Box<[T]>)>>,
}

impl<T: Copy + Default> PagedBuilder<T> {
    /// Creates a builder whose pages hold `1 << page_shift` elements.
    ///
    /// # Panics
    /// Panics if `page_shift >= 48`; addresses reserve the upper bits for page ids.
    pub fn new(page_shift: u32) -> Self {
        assert!(page_shift < 48, "page shift {page_shift} leaves no room for page ids");
        Self {
            page_shift,
            page_limit: usize::MAX,
            next_page: AtomicUsize::new(0),
            pages: Mutex::new(Vec::new()),
        }
    }

    /// Caps the number of page ids this builder hands out; later allocations fail.
    #[cfg(test)]
    pub(crate) fn limit_pages(&mut self, page_limit: usize) {
        self.page_limit = page_limit;
    }

    /// Elements per regular page.
    #[inline]
    pub fn page_size(&self) -> usize {
        1 << self.page_shift
    }

    /// Returns a new allocator. Allocators are meant to live on one thread each.
    pub fn allocator(&self) -> PageAllocator<'_, T> {
        PageAllocator {
            builder: self,
            current: Vec::new(),
            current_id: 0,
            top: 0,
            retired: Vec::new(),
        }
    }

    /// Collects every retired page into a read-only arena.
    ///
    /// Borrowing rules guarantee that no allocator is alive here, so every
    /// reserved page id has been handed back.
    pub fn build(self) -> PageArena<T> {
        let page_count = self.next_page.into_inner();
        let mut pages: Vec<Box<[T]>> = Vec::with_capacity(page_count);
        pages.resize_with(page_count, Box::default);
        for (id, page) in self.pages.into_inner() {
            pages[id] = page;
        }
        PageArena {
            pages,
            page_shift: self.page_shift,
        }
    }

    fn reserve_page(&self, bytes: usize) -> Result<usize> {
        self.next_page
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| {
                (id < self.page_limit).then_some(id + 1)
            })
            .map_err(|_| CompressionError::Allocation { bytes })
    }

    fn retire(&self, pages: &mut Vec<(usize, Box<[T]>)>) {
        if !pages.is_empty() {
            self.pages.lock().append(pages);
        }
    }
}

fn new_page<T: Copy + Default>(len: usize) -> Result<Vec<T>> {
    let mut page = Vec::new();
    page.try_reserve_exact(len).map_err(|_| CompressionError::Allocation {
        bytes: len.saturating_mul(mem::size_of::<T>()),
    })?;
    page.resize(len, T::default());
    Ok(page)
}

/// Per-thread bump allocator over a [`PagedBuilder`].
pub struct PageAllocator<'a, T: Copy + Default> {
    builder: &'a PagedBuilder<T>,
    current: Vec<T>,
    current_id: usize,
    top: usize,
    retired: Vec<(usize, Box<[T]>)>,
}

impl<'a, T: Copy + Default> PageAllocator<'a, T> {
    /// Reserves `len` contiguous elements and returns their address with the slice.
    ///
    /// # Errors
    /// [`CompressionError::Allocation`] if a new page cannot be allocated. The
    /// allocator is left as it was.
    pub fn allocate(&mut self, len: usize) -> Result<(u64, &mut [T])> {
        debug_assert!(len > 0, "zero-length allocations carry no address");
        let page_size = self.builder.page_size();
        let shift = self.builder.page_shift;

        if len > page_size {
            let page = new_page::<T>(len)?;
            let id = self.builder.reserve_page(len * mem::size_of::<T>())?;
            tracing::trace!(page = id, len, "allocated oversize page");
            self.retired.push((id, page.into_boxed_slice()));
            let slot = self.retired.last_mut().map(|(_, page)| &mut page[..]).unwrap_or_default();
            return Ok(((id as u64) << shift, slot));
        }

        if self.current.is_empty() || self.top + len > page_size {
            let page = new_page::<T>(page_size)?;
            let id = self.builder.reserve_page(page_size * mem::size_of::<T>())?;
            self.retire_current();
            self.current = page;
            self.current_id = id;
            self.top = 0;
        }

        let start = self.top;
        self.top += len;
        let address = ((self.current_id as u64) << shift) | start as u64;
        Ok((address, &mut self.current[start..start + len]))
    }

    fn retire_current(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let mut page = mem::take(&mut self.current);
        page.truncate(self.top);
        self.retired.push((self.current_id, page.into_boxed_slice()));
    }
}

impl<T: Copy + Default> Drop for PageAllocator<'_, T> {
    fn drop(&mut self) {
        self.retire_current();
        self.builder.retire(&mut self.retired);
    }
}

/// Read-only arena addressed by `page_id << page_shift | offset`.
#[derive(Debug)]
pub struct PageArena<T> {
    pages: Vec<Box<[T]>>,
    page_shift: u32,
}

impl<T: Copy> PageArena<T> {
    #[inline(always)]
    fn offset_mask(&self) -> u64 {
        (1u64 << self.page_shift) - 1
    }

    /// Everything from `address` to the end of its page.
    ///
    /// # Panics
    /// Panics if `address` does not point into this arena.
    #[inline]
    pub fn slice_from(&self, address: u64) -> &[T] {
        let page = &self.pages[(address >> self.page_shift) as usize];
        &page[(address & self.offset_mask()) as usize..]
    }

    /// Number of pages, oversize pages included.
    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Bytes held by page contents.
    pub fn size_in_bytes(&self) -> u64 {
        self.pages
            .iter()
            .map(|page| (page.len() * mem::size_of::<T>()) as u64)
            .sum()
    }

    /// Permutes pages into the order in which `offsets` first reference them.
    ///
    /// Only slots for which `include(node)` holds are considered and rewritten;
    /// pages nobody references keep their relative order at the end.
    pub fn reorder(&mut self, offsets: &mut [u64], include: impl Fn(usize) -> bool) {
        let shift = self.page_shift;
        let mask = self.offset_mask();
        let mut remap = vec![usize::MAX; self.pages.len()];
        let mut order = Vec::with_capacity(self.pages.len());

        for (node, &offset) in offsets.iter().enumerate() {
            if !include(node) {
                continue;
            }
            let page = (offset >> shift) as usize;
            if remap[page] == usize::MAX {
                remap[page] = order.len();
                order.push(page);
            }
        }
        for (page, slot) in remap.iter_mut().enumerate() {
            if *slot == usize::MAX {
                *slot = order.len();
                order.push(page);
            }
        }

        let mut old: Vec<Option<Box<[T]>>> = mem::take(&mut self.pages).into_iter().map(Some).collect();
        self.pages = order
            .iter()
            .map(|&page| old[page].take().unwrap_or_default())
            .collect();

        for (node, offset) in offsets.iter_mut().enumerate() {
            if include(node) {
                let page = (*offset >> shift) as usize;
                *offset = ((remap[page] as u64) << shift) | (*offset & mask);
            }
        }
    }
}
