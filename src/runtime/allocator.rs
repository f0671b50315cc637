//! Device memory blocks and per-device allocation accounting
//!
//! Every array's backing memory is a `DeviceMemory` block tied to the
//! `ArrayContext` that allocated it. Live bytes are tracked per context so
//! callers can observe whether an operation allocated (copy path) or not
//! (zero-copy path).

use super::ArrayContext;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::OnceLock;

static LIVE_BYTES: OnceLock<Mutex<HashMap<ArrayContext, usize>>> = OnceLock::new();

fn live_bytes() -> &'static Mutex<HashMap<ArrayContext, usize>> {
    LIVE_BYTES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Bytes currently allocated on the device selected by `ctx`
pub fn allocated_bytes(ctx: ArrayContext) -> usize {
    live_bytes().lock().get(&ctx).copied().unwrap_or(0)
}

/// One allocation on one device
///
/// Deallocates (and updates the accounting) on drop.
pub(crate) struct DeviceMemory {
    ctx: ArrayContext,
    bytes: Box<[u8]>,
}

impl DeviceMemory {
    /// Allocate a device block initialized with `bytes`
    pub(crate) fn upload(ctx: ArrayContext, bytes: Vec<u8>) -> Self {
        let bytes = bytes.into_boxed_slice();
        if !bytes.is_empty() {
            *live_bytes().lock().entry(ctx).or_insert(0) += bytes.len();
        }
        Self { ctx, bytes }
    }

    /// Owning context
    #[inline]
    pub(crate) fn context(&self) -> ArrayContext {
        self.ctx
    }

    /// Raw contents
    #[inline]
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for DeviceMemory {
    fn drop(&mut self) {
        if self.bytes.is_empty() {
            return;
        }
        let mut live = live_bytes().lock();
        if let Some(total) = live.get_mut(&self.ctx) {
            *total = total.saturating_sub(self.bytes.len());
        }
    }
}

impl std::fmt::Debug for DeviceMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceMemory")
            .field("ctx", &self.ctx)
            .field("len", &self.bytes.len())
            .finish()
    }
}
