//! The category-tree data source.
//!
//! A source owns its subcategories and exposes a flattened index space
//! over them, governed by `lookup_level` (how deep the flattening
//! descends) and `items_for_subcats` (whether category roots occupy a
//! slot). Fetching is callback-based so providers may answer
//! synchronously or later; slice requests are joined and delivered
//! exactly once.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use slipstream_core::{Listener, Observable, Subscription};

use crate::{Id, Value};

pub type DataCallback = Box<dyn FnOnce(Value)>;
pub type BatchCallback = Box<dyn FnOnce(BTreeMap<Id, Value>)>;

/// Leaf fetch for a single child index (or [`Id::SELF`]).
pub type SourceCallback = Rc<dyn Fn(Id, DataCallback)>;
/// Optional bulk fetch: `(first, size, deliver)`.
pub type BatchSourceCallback = Rc<dyn Fn(u64, usize, BatchCallback)>;

struct SourceInner {
    category_id: Id,
    own_count: usize,
    subcats: Vec<DataSource>,
    data: Option<Value>,
    source_cb: Option<SourceCallback>,
    batch_cb: Option<BatchSourceCallback>,
    subscription: Subscription,
}

/// Shared handle over one category node. Clones observe the same node.
#[derive(Clone)]
pub struct DataSource {
    inner: Rc<RefCell<SourceInner>>,
}

impl PartialEq for DataSource {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Observable for DataSource {
    fn subscription(&self) -> Subscription {
        self.inner.borrow().subscription.clone()
    }
}

/// Listener binding for a source; `check()` fires after mutations.
pub type SourceListener = Listener<DataSource>;

impl Default for DataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSource {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SourceInner {
                category_id: Id(0),
                own_count: 0,
                subcats: Vec::new(),
                data: None,
                source_cb: None,
                batch_cb: None,
                subscription: Subscription::new(),
            })),
        }
    }

    /// Leaf source over `count` items served by `source_cb`.
    pub fn with_items(count: usize, source_cb: impl Fn(Id, DataCallback) + 'static) -> Self {
        let source = Self::new();
        {
            let mut inner = source.inner.borrow_mut();
            inner.own_count = count;
            inner.source_cb = Some(Rc::new(source_cb));
        }
        source
    }

    pub fn set_source_callback(&self, cb: impl Fn(Id, DataCallback) + 'static) {
        self.inner.borrow_mut().source_cb = Some(Rc::new(cb));
    }

    pub fn set_batch_callback(&self, cb: impl Fn(u64, usize, BatchCallback) + 'static) {
        self.inner.borrow_mut().batch_cb = Some(Rc::new(cb));
    }

    pub fn set_category_id(&self, id: Id) {
        self.inner.borrow_mut().category_id = id;
    }

    pub fn category_id(&self) -> Id {
        self.inner.borrow().category_id
    }

    pub fn set_data(&self, data: Option<Value>) {
        self.inner.borrow_mut().data = data;
        self.set_dirty();
    }

    pub fn data(&self) -> Option<Value> {
        self.inner.borrow().data.clone()
    }

    pub fn set_dirty(&self) {
        self.inner.borrow().subscription.set_dirty();
    }

    // ── tree mutation ────────────────────────────────────────────────

    pub fn add_subcategory(&self, category: DataSource) {
        self.inner.borrow_mut().subcats.push(category);
        self.set_dirty();
    }

    pub fn set_subcategories(&self, categories: Vec<DataSource>) {
        self.inner.borrow_mut().subcats = categories;
        self.set_dirty();
    }

    pub fn subcategory(&self, n: usize) -> Option<DataSource> {
        self.inner.borrow().subcats.get(n).cloned()
    }

    pub fn set_childs_count(&self, count: usize) {
        self.inner.borrow_mut().own_count = count;
        self.set_dirty();
    }

    /// Drops all subcategories, keeping own items.
    pub fn clear(&self) {
        self.inner.borrow_mut().subcats.clear();
        self.set_dirty();
    }

    // ── counting ─────────────────────────────────────────────────────

    pub fn items_count(&self) -> usize {
        self.inner.borrow().own_count
    }

    pub fn subcat_count(&self) -> usize {
        self.inner.borrow().subcats.len()
    }

    /// Own items plus every descendant's, regardless of level.
    pub fn global_count(&self) -> usize {
        let inner = self.inner.borrow();
        inner.own_count
            + inner
                .subcats
                .iter()
                .map(|c| c.global_count())
                .sum::<usize>()
    }

    /// Size of the flattened index space for the given traversal.
    pub fn count(&self, level: u32, items_for_subcats: bool) -> usize {
        let inner = self.inner.borrow();
        let mut c = inner.own_count
            + if items_for_subcats {
                inner.subcats.len()
            } else {
                0
            };
        if level > 0 {
            for cat in &inner.subcats {
                c += cat.count(level - 1, items_for_subcats);
            }
        }
        c
    }

    // ── single-item fetch ────────────────────────────────────────────

    /// Fetches a direct child (or [`Id::SELF`]). Returns false when the
    /// index is out of range.
    pub fn get_item_data(&self, cb: DataCallback, index: Id) -> bool {
        let (own_count, data, source_cb) = {
            let inner = self.inner.borrow();
            (
                inner.own_count,
                inner.data.clone(),
                inner.source_cb.clone(),
            )
        };

        if !index.is_self() && index.get() as usize >= own_count {
            return false;
        }

        if index.is_self() {
            if let Some(data) = data {
                cb(data);
                return true;
            }
        }

        if let Some(source_cb) = source_cb {
            source_cb(index, cb);
            true
        } else {
            false
        }
    }

    /// Fetches by flattened index through the tree walk.
    pub fn get_item_data_at(
        &self,
        cb: DataCallback,
        index: Id,
        level: u32,
        items_for_subcats: bool,
    ) -> bool {
        let mut n = index.get();
        if level > 0 {
            let subcats = self.inner.borrow().subcats.clone();
            for cat in subcats {
                if items_for_subcats {
                    if n == 0 {
                        return cat.get_item_data(cb, Id::SELF);
                    }
                    n -= 1;
                }
                let c = cat.count(level - 1, items_for_subcats) as u64;
                if n < c {
                    return cat.get_item_data_at(cb, Id(n), level - 1, items_for_subcats);
                }
                n -= c;
            }
        }
        self.get_item_data(cb, Id(n))
    }

    /// Walks to the category owning a flattened index. The flag is true
    /// when the index addresses the category itself.
    pub fn get_item_category(
        &self,
        index: Id,
        level: u32,
        items_for_subcats: bool,
    ) -> (DataSource, bool) {
        let mut n = index.get();
        if level > 0 {
            let subcats = self.inner.borrow().subcats.clone();
            for cat in subcats {
                if items_for_subcats {
                    if n == 0 {
                        return (cat, true);
                    }
                    n -= 1;
                }
                let c = cat.count(level - 1, items_for_subcats) as u64;
                if n < c {
                    return cat.get_item_category(Id(n), level - 1, items_for_subcats);
                }
                n -= c;
            }
        }
        (self.clone(), false)
    }

    // ── category bounds ──────────────────────────────────────────────

    /// Snaps `(first, count)` outward to the nearest enclosing category
    /// boundaries so a slice never splits a category.
    pub fn set_category_bounds(
        &self,
        first: &mut Id,
        count: &mut usize,
        level: u32,
        items_for_subcats: bool,
    ) {
        let subcats = self.inner.borrow().subcats.clone();
        let own_count = self.inner.borrow().own_count;

        if level == 0 || subcats.is_empty() {
            *first = Id(0);
            *count = self.count(level, items_for_subcats);
            return;
        }

        let mut lower_bound = 0usize;
        let mut offset = 0usize;
        let mut subcat = 0usize;
        loop {
            lower_bound += offset;
            offset = subcats[subcat].count(level - 1, items_for_subcats);
            subcat += 1;
            if subcat >= subcats.len() || lower_bound + offset > first.get() as usize {
                break;
            }
        }
        if lower_bound + offset <= first.get() as usize {
            lower_bound += offset;
        }

        let lead = first.get() as usize - lower_bound;
        *first = Id(lower_bound as u64);
        *count += lead;

        let window_end = (lower_bound + *count) as i64;
        let mut upper_bound = self.count(level, items_for_subcats) as i64;
        if upper_bound - own_count as i64 >= window_end {
            upper_bound -= own_count as i64;
        }

        let mut offset = 0i64;
        let mut subcat = subcats.len();
        while subcat > 0 && upper_bound - offset >= window_end {
            upper_bound -= offset;
            offset = subcats[subcat - 1].count(level - 1, items_for_subcats) as i64;
            subcat -= 1;
        }

        *count = (upper_bound - lower_bound as i64).max(0) as usize;
    }

    // ── slice fetch ──────────────────────────────────────────────────

    /// Requests `[first, first + count)` of the flattened space.
    /// Delivers one merged map exactly once, after all segments have
    /// arrived. Returns the number of items actually requested.
    pub fn get_slice_data(
        &self,
        cb: BatchCallback,
        first: Id,
        count: usize,
        level: u32,
        items_for_subcats: bool,
    ) -> usize {
        let mut segments = Vec::new();
        let mut f = first.get() as usize;
        let mut c = count;
        self.collect_slices(&mut segments, &mut f, &mut c, level, items_for_subcats);

        if segments.is_empty() {
            return 0;
        }

        let join = Rc::new(RefCell::new(SliceJoin {
            data: BTreeMap::new(),
            pending: segments.len(),
            cb: Some(cb),
        }));

        let mut offset = first.get() as usize;
        let mut requested = 0;
        // Stamp offsets before issuing anything: a synchronous provider
        // may complete a segment inside the request call.
        let stamped: Vec<(SliceSegment, usize)> = segments
            .into_iter()
            .map(|seg| {
                let off = offset;
                offset += seg.len;
                (seg, off)
            })
            .collect();

        for (seg, seg_offset) in stamped {
            requested += seg.len;
            let join = join.clone();
            seg.source.on_slice_request(
                Box::new(move |values| {
                    SliceJoin::merge(&join, seg_offset, values);
                }),
                seg.first,
                seg.len,
            );
        }
        requested
    }

    fn collect_slices(
        &self,
        segments: &mut Vec<SliceSegment>,
        first: &mut usize,
        count: &mut usize,
        level: u32,
        items_for_subcats: bool,
    ) {
        let (subcats, own_count) = {
            let inner = self.inner.borrow();
            (inner.subcats.clone(), inner.own_count)
        };

        if level > 0 {
            for cat in subcats {
                if *first > 0 {
                    if items_for_subcats {
                        *first -= 1;
                    }
                    let sub_count = cat.count(level - 1, items_for_subcats);
                    if sub_count <= *first {
                        *first -= sub_count;
                    } else {
                        cat.collect_slices(segments, first, count, level - 1, items_for_subcats);
                    }
                } else if *count > 0 {
                    if items_for_subcats {
                        segments.push(SliceSegment {
                            first: Id::SELF.get(),
                            len: 1,
                            source: cat.clone(),
                        });
                        *count -= 1;
                    }
                    if *count > 0 {
                        cat.collect_slices(segments, first, count, level - 1, items_for_subcats);
                    }
                }
            }
        }

        if *count > 0 && *first < own_count {
            let c = (*count).min(own_count - *first);
            segments.push(SliceSegment {
                first: *first as u64,
                len: c,
                source: self.clone(),
            });
            *first = 0;
            *count -= c;
        } else if *first >= own_count {
            *first -= own_count;
        }
    }

    /// Serves one segment: the category's own data for [`Id::SELF`],
    /// the batch callback when present, otherwise joined per-item
    /// fetches.
    fn on_slice_request(&self, cb: BatchCallback, first: u64, size: usize) {
        if first == Id::SELF.get() {
            let (data, source_cb) = {
                let inner = self.inner.borrow();
                (inner.data.clone(), inner.source_cb.clone())
            };
            if let Some(data) = data {
                let mut map = BTreeMap::new();
                map.insert(Id::SELF, data);
                cb(map);
            } else if let Some(source_cb) = source_cb {
                source_cb(
                    Id::SELF,
                    Box::new(move |value| {
                        let mut map = BTreeMap::new();
                        map.insert(Id::SELF, unwrap_single(value));
                        cb(map);
                    }),
                );
            } else {
                let mut map = BTreeMap::new();
                map.insert(Id::SELF, Value::Null);
                cb(map);
            }
            return;
        }

        let (batch_cb, source_cb) = {
            let inner = self.inner.borrow();
            (inner.batch_cb.clone(), inner.source_cb.clone())
        };

        if let Some(batch_cb) = batch_cb {
            batch_cb(first, size, cb);
            return;
        }

        let Some(source_cb) = source_cb else {
            log::warn!("slice request on a source with no callbacks");
            let map = (first..first + size as u64)
                .map(|i| (Id(i), Value::Null))
                .collect();
            cb(map);
            return;
        };

        // Join `size` individual responses into one delivery.
        let join = Rc::new(RefCell::new(BatchJoin {
            map: BTreeMap::new(),
            remaining: size,
            cb: Some(cb),
        }));
        for i in first..first + size as u64 {
            let join = join.clone();
            source_cb(
                Id(i),
                Box::new(move |value| {
                    BatchJoin::arrive(&join, Id(i), unwrap_single(value));
                }),
            );
        }
    }

    // ── mutation driven by consumers ─────────────────────────────────

    /// Removes one item from the category owning `id`, shrinking the
    /// flattened space by one. The recycler's commit path.
    pub fn remove_item(&self, id: Id, level: u32, items_for_subcats: bool) {
        let (category, is_category) = self.get_item_category(id, level, items_for_subcats);
        if !is_category {
            let count = category.items_count();
            category.set_childs_count(count.saturating_sub(1));
        }
        self.set_dirty();
    }
}

struct SliceSegment {
    first: u64,
    len: usize,
    source: DataSource,
}

struct SliceJoin {
    data: BTreeMap<Id, Value>,
    pending: usize,
    cb: Option<BatchCallback>,
}

impl SliceJoin {
    fn merge(join: &Rc<RefCell<SliceJoin>>, offset: usize, values: BTreeMap<Id, Value>) {
        let fire = {
            let mut join = join.borrow_mut();
            // Re-base the segment's local ids onto the flat space.
            let front = values.keys().next().copied();
            for (id, value) in values {
                let key = if id.is_self() {
                    Id(offset as u64)
                } else {
                    let front = front.map(Id::get).unwrap_or(id.get());
                    Id(id.get() - front + offset as u64)
                };
                join.data.insert(key, value);
            }
            join.pending -= 1;
            if join.pending == 0 {
                join.cb.take().map(|cb| (cb, std::mem::take(&mut join.data)))
            } else {
                None
            }
        };
        if let Some((cb, data)) = fire {
            cb(data);
        }
    }
}

struct BatchJoin {
    map: BTreeMap<Id, Value>,
    remaining: usize,
    cb: Option<BatchCallback>,
}

impl BatchJoin {
    fn arrive(join: &Rc<RefCell<BatchJoin>>, id: Id, value: Value) {
        let fire = {
            let mut join = join.borrow_mut();
            join.map.insert(id, value);
            join.remaining -= 1;
            if join.remaining == 0 {
                join.cb.take().map(|cb| (cb, std::mem::take(&mut join.map)))
            } else {
                None
            }
        };
        if let Some((cb, map)) = fire {
            cb(map);
        }
    }
}

/// Providers answering with an array mean "first element".
fn unwrap_single(value: Value) -> Value {
    match value {
        Value::Array(mut items) if !items.is_empty() => items.remove(0),
        other => other,
    }
}

#[cfg(test)]
#[path = "tests/source_tests.rs"]
mod tests;
