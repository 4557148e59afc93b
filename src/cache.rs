//! Bounded LRU cache of decoded tiles, shared across every `SlideView`
//! registered against it.
//!
//! Unlike the teacher crate's `tile::TileCache` (an async, size-based JPEG
//! cache guarded by `tokio::sync::RwLock` because it backs concurrent HTTP
//! handlers), this cache is plain synchronous state: the resampler is
//! single-threaded and run-to-completion by design, so no interior
//! synchronization is needed. Eviction is strictly by tile count
//! (`max_tiles`), least-recently-used across every slide sharing the cache.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::tile::{Tile, TileRef};

/// A bounded, single-threaded LRU registry of [`Tile`]s.
///
/// The cache is the sole owner of every resident tile's buffer — a
/// `SlideView` never stores tile data itself, only the coordinate keys
/// (`TileRef`) needed to ask the cache for a tile. This is what lets a
/// `TileCache` be shared by multiple `SlideView`s without a cyclic
/// ownership graph: the cache never needs a pointer back into a slide.
pub struct TileCache {
    max_tiles: u32,
    counter: u64,
    tiles: HashMap<TileRef, Tile>,
    /// timestamp -> tile ref, kept in sync with `tiles[..].timestamp`, used
    /// to find the least-recently-used entry in O(log n) rather than the
    /// reference implementation's linear scan (permitted, and preferred,
    /// by the spec).
    order: BTreeMap<u64, TileRef>,
}

impl TileCache {
    /// Create a new cache holding at most `max_tiles` tiles.
    ///
    /// # Panics
    ///
    /// Panics if `max_tiles == 0`.
    pub fn new(max_tiles: u32) -> Self {
        assert!(max_tiles >= 1, "TileCache requires max_tiles >= 1");
        Self {
            max_tiles,
            counter: 0,
            tiles: HashMap::new(),
            order: BTreeMap::new(),
        }
    }

    /// Number of tiles currently resident.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Issue a new monotonically increasing timestamp.
    pub fn touch(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    pub fn contains(&self, tile_ref: TileRef) -> bool {
        self.tiles.contains_key(&tile_ref)
    }

    pub fn get(&self, tile_ref: TileRef) -> Option<&Tile> {
        self.tiles.get(&tile_ref)
    }

    /// Bump a resident tile's timestamp on a cache hit, keeping the LRU
    /// order index in sync.
    pub fn mark_used(&mut self, tile_ref: TileRef) {
        let new_ts = self.touch();
        if let Some(tile) = self.tiles.get_mut(&tile_ref) {
            self.order.remove(&tile.timestamp);
            tile.timestamp = new_ts;
            self.order.insert(new_ts, tile_ref);
        }
    }

    /// Evict the globally least-recently-used tile, across every slide
    /// sharing this cache, while at or over capacity. Runs before a new
    /// tile is registered, per the reference design (the "protect"
    /// parameter in the original is unused dead design and is not carried
    /// over — see `DESIGN.md`).
    pub fn evict_if_needed(&mut self) {
        while self.tiles.len() as u32 >= self.max_tiles {
            let Some((&oldest_ts, &oldest_ref)) = self.order.iter().next() else {
                break;
            };
            self.order.remove(&oldest_ts);
            self.tiles.remove(&oldest_ref);
            trace!(
                slide_id = oldest_ref.slide_id,
                level = oldest_ref.level,
                ti_x = oldest_ref.ti_x,
                ti_y = oldest_ref.ti_y,
                "evicted tile"
            );
        }
    }

    /// Insert a freshly-loaded tile, already timestamped via [`Self::touch`].
    pub fn insert(&mut self, tile_ref: TileRef, tile: Tile) {
        self.order.insert(tile.timestamp, tile_ref);
        self.tiles.insert(tile_ref, tile);
    }

    /// Drop every tile belonging to `slide_id`, e.g. when a `SlideView` is
    /// released.
    pub fn evict_slide(&mut self, slide_id: u64) {
        let stale: Vec<TileRef> = self
            .tiles
            .keys()
            .copied()
            .filter(|r| r.slide_id == slide_id)
            .collect();
        for tile_ref in stale {
            if let Some(tile) = self.tiles.remove(&tile_ref) {
                self.order.remove(&tile.timestamp);
            }
        }
    }
}
