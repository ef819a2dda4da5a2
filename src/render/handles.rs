//! Transient image handles.
//!
//! A handle stands in for a blob while it is on screen. Handles are issued
//! during a render pass and all revoked at the start of the next one, so the
//! number of live handles is bounded by what is currently displayed.

use serde::Serialize;
use std::collections::HashMap;

/// Short-lived reference to a displayed image blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TransientHandle(String);

impl TransientHandle {
    /// The handle's URL-like name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Live handles keyed by image id.
#[derive(Debug, Default)]
pub struct HandleCache {
    next_serial: u64,
    by_image: HashMap<i64, TransientHandle>,
    blobs: HashMap<TransientHandle, Vec<u8>>,
}

impl HandleCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a handle for `image_id`, reusing the live one if there is one.
    pub fn allocate(&mut self, image_id: i64, blob: Vec<u8>) -> TransientHandle {
        if let Some(handle) = self.by_image.get(&image_id) {
            return handle.clone();
        }
        self.next_serial += 1;
        let handle = TransientHandle(format!("blob:deadlines/{}", self.next_serial));
        self.blobs.insert(handle.clone(), blob);
        self.by_image.insert(image_id, handle.clone());
        handle
    }

    /// The blob behind a live handle; `None` once revoked.
    #[must_use]
    pub fn resolve(&self, handle: &TransientHandle) -> Option<&[u8]> {
        self.blobs.get(handle).map(Vec::as_slice)
    }

    /// The live handle for an image, if any.
    #[must_use]
    pub fn handle_for(&self, image_id: i64) -> Option<&TransientHandle> {
        self.by_image.get(&image_id)
    }

    /// Revoke the handle for one image. Returns whether one was live.
    pub fn revoke(&mut self, image_id: i64) -> bool {
        match self.by_image.remove(&image_id) {
            Some(handle) => {
                self.blobs.remove(&handle);
                true
            }
            None => false,
        }
    }

    /// Revoke every live handle. Returns how many were revoked.
    pub fn revoke_all(&mut self) -> usize {
        let count = self.by_image.len();
        self.by_image.clear();
        self.blobs.clear();
        count
    }

    /// Number of live handles.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.by_image.len()
    }
}
