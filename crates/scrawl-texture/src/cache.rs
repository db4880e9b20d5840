//! Keeping decoded textures around
//!
//! Decoded paper images are large, so the cache is deliberately tiny: a
//! two-entry LRU keyed by template id. That is one slot for the active
//! template and one for the template the user just switched away from,
//! so toggling between two papers doesn't re-decode on every switch.
//! Inserting a third template evicts the least recently used entry.

use crate::PaperTexture;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

const DEFAULT_CAPACITY: usize = 2;

/// Small LRU of decoded textures, keyed by template id
pub struct TextureCache {
    entries: Mutex<LruCache<String, Arc<PaperTexture>>>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, template_id: &str) -> Option<Arc<PaperTexture>> {
        self.entries.lock().get(template_id).cloned()
    }

    pub fn insert(&self, texture: Arc<PaperTexture>) {
        self.entries
            .lock()
            .put(texture.template_id.clone(), texture);
    }

    /// Drop everything, releasing the decoded images.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new()
    }
}
