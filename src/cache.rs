//! Fixed-size open-addressed caches for rasterized runs and their widths.
//!
//! Entries are keyed by `(font, text)`. A probe starts at the key's hash
//! and walks forward until it finds the key, an empty slot, or an entry
//! that has not been used for more than the staleness window. If the whole
//! table is fresh, the starting slot is overwritten.

use std::sync::Arc;

use crate::{bitmap::Bitmap, rasterizer::FontId};

/// Rasterized glyph runs.
pub type GlyphBitmapCache = StaleProbeCache<Arc<Bitmap>>;
/// Measured run widths.
pub type GlyphWidthCache = StaleProbeCache<i32>;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub occupied: usize,
    pub capacity: usize,
}

struct CacheEntry<T> {
    hash: u32,
    font: FontId,
    text: Box<str>,
    payload: T,
    last_used: u32,
}

pub struct StaleProbeCache<T> {
    entries: Box<[Option<CacheEntry<T>>]>,
    staleness: u32,
    occupied: usize,
    hits: u64,
    misses: u64,
}

/// The key hash; the table index is this value modulo the capacity.
pub(crate) fn hash_key(font: FontId, text: &str) -> u32 {
    let mut hash = (font.index() as u32).wrapping_mul(23) ^ 0xAAAA_AAAA;
    for &b in text.as_bytes() {
        hash = hash.rotate_right(3) ^ u32::from(b).wrapping_mul(13);
    }
    hash
}

impl<T: Clone> StaleProbeCache<T> {
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize, staleness: u32) -> Self {
        assert!(capacity > 0, "cache capacity must be nonzero");
        Self {
            entries: (0..capacity).map(|_| None).collect(),
            staleness,
            occupied: 0,
            hits: 0,
            misses: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.occupied
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            occupied: self.occupied,
            capacity: self.capacity(),
        }
    }

    /// Returns the payload for `(font, text)`, producing and storing it on a miss.
    ///
    /// `tick` is the current frame counter; a hit refreshes the entry's
    /// last-use tick. If `produce` returns `None` the chosen slot is left
    /// empty and `None` is returned.
    pub fn get_or_insert_with(
        &mut self,
        font: FontId,
        text: &str,
        tick: u32,
        produce: impl FnOnce() -> Option<T>,
    ) -> Option<T> {
        let hash = hash_key(font, text);
        let capacity = self.capacity();
        let start = hash as usize % capacity;

        let mut slot = start;
        for probe in 0..capacity {
            let index = (start + probe) % capacity;
            match &mut self.entries[index] {
                Some(entry) if entry.hash == hash && entry.font == font && &*entry.text == text => {
                    entry.last_used = tick;
                    self.hits += 1;
                    return Some(entry.payload.clone());
                }
                Some(entry) if tick.saturating_sub(entry.last_used) > self.staleness => {
                    slot = index;
                    break;
                }
                Some(_) => {}
                None => {
                    slot = index;
                    break;
                }
            }
        }

        self.misses += 1;
        if self.entries[slot].take().is_some() {
            self.occupied -= 1;
        }

        let payload = produce()?;
        self.entries[slot] = Some(CacheEntry {
            hash,
            font,
            text: text.into(),
            payload: payload.clone(),
            last_used: tick,
        });
        self.occupied += 1;
        Some(payload)
    }

    /// Releases every entry.
    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|e| *e = None);
        self.occupied = 0;
    }

    pub(crate) fn log_stats(&self, name: &str) {
        log::debug!(
            "{} cache: {}/{} occupied, {} hits, {} misses",
            name,
            self.occupied,
            self.capacity(),
            self.hits,
            self.misses
        );
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn hit_skips_producer() {
        let mut cache = GlyphBitmapCache::new(8, 64);
        let calls = Cell::new(0);
        let produce = || {
            calls.set(calls.get() + 1);
            Some(Arc::new(Bitmap::new(3, 2)))
        };

        let a = cache.get_or_insert_with(FontId::new(0), "abc", 1, produce).unwrap();
        let b = cache
            .get_or_insert_with(FontId::new(0), "abc", 2, || unreachable!())
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn font_is_part_of_the_key() {
        let mut cache = GlyphWidthCache::new(8, 64);
        cache.get_or_insert_with(FontId::new(0), "x", 0, || Some(5));
        let other = cache.get_or_insert_with(FontId::new(1), "x", 0, || Some(9));
        assert_eq!(other, Some(9));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn occupancy_never_exceeds_capacity() {
        let mut cache = GlyphWidthCache::new(4, 64);
        for i in 0..100 {
            let text = format!("run {}", i);
            assert_eq!(
                cache.get_or_insert_with(FontId::new(0), &text, i, || Some(i as i32)),
                Some(i as i32)
            );
            assert!(cache.len() <= cache.capacity());
        }
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn stale_entries_are_replaced() {
        let mut cache = GlyphWidthCache::new(1, 2);
        cache.get_or_insert_with(FontId::new(0), "old", 0, || Some(1));
        // Fresh: the only slot is overwritten anyway since the probe finds nothing better.
        assert_eq!(
            cache.get_or_insert_with(FontId::new(0), "new", 1, || Some(2)),
            Some(2)
        );
        assert_eq!(
            cache.get_or_insert_with(FontId::new(0), "new", 10, || unreachable!()),
            Some(2)
        );
        assert_eq!(
            cache.get_or_insert_with(FontId::new(0), "newer", 20, || Some(3)),
            Some(3)
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_producer_leaves_slot_empty() {
        let mut cache = GlyphBitmapCache::new(2, 64);
        assert!(cache
            .get_or_insert_with(FontId::new(0), "", 0, || None)
            .is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn clear_releases_everything() {
        let mut cache = GlyphWidthCache::new(4, 64);
        cache.get_or_insert_with(FontId::new(0), "a", 0, || Some(1));
        cache.get_or_insert_with(FontId::new(0), "b", 0, || Some(1));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(
            cache.get_or_insert_with(FontId::new(0), "a", 0, || Some(7)),
            Some(7)
        );
    }
}
