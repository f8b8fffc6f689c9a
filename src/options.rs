//! Recording-aware option proxies.
//!
//! A live sensor exposes its controls as options. The recording decorator
//! must be able to observe option writes so the archive can replay them,
//! while reads and capability checks stay transparent. [`RecordableOption`]
//! wraps one live option and reports committed writes through a hook;
//! [`RecordableOptionCache`] guarantees exactly one wrapper per option id
//! for the lifetime of the decorator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use crate::error::Result;
use crate::sensor::SensorInterface;
use crate::sensor::types::{OptionId, OptionRange};

/// A single sensor control.
pub trait SensorOption: Send + Sync {
    /// Read the current value.
    ///
    /// # Errors
    ///
    /// Returns an error on a communication failure.
    fn get(&self) -> Result<f32>;

    /// Write a new value.
    ///
    /// # Errors
    ///
    /// Returns an error if the option is read-only, the value is out of
    /// range, or there's a communication failure.
    fn set(&self, value: f32) -> Result<()>;

    /// The valid value range and stepping.
    fn range(&self) -> OptionRange;

    /// Whether the option rejects writes.
    fn is_read_only(&self) -> bool {
        false
    }

    /// Human-readable description of the option.
    fn description(&self) -> &str;
}

/// Observer invoked after a committed option write, carrying the option id
/// and the value that was written.
pub type OptionWriteHook = Arc<dyn Fn(OptionId, f32) + Send + Sync>;

/// Proxy over one live option that makes writes observable.
///
/// Reads, range queries, and capability checks pass straight through. A
/// successful `set` additionally invokes the write hook; a failed `set`
/// invokes nothing, so only committed values reach the archive.
pub struct RecordableOption {
    id: OptionId,
    inner: Arc<dyn SensorOption>,
    on_write: OptionWriteHook,
}

impl RecordableOption {
    fn new(id: OptionId, inner: Arc<dyn SensorOption>, on_write: OptionWriteHook) -> Self {
        Self {
            id,
            inner,
            on_write,
        }
    }

    /// The id of the wrapped option.
    #[must_use]
    pub fn id(&self) -> OptionId {
        self.id
    }
}

impl SensorOption for RecordableOption {
    fn get(&self) -> Result<f32> {
        self.inner.get()
    }

    fn set(&self, value: f32) -> Result<()> {
        self.inner.set(value)?;
        trace!(id = ?self.id, value, "Option write committed");
        (self.on_write)(self.id, value);
        Ok(())
    }

    fn range(&self) -> OptionRange {
        self.inner.range()
    }

    fn is_read_only(&self) -> bool {
        self.inner.is_read_only()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }
}

/// Lazily wraps each live option in a [`RecordableOption`], exactly once
/// per option id.
pub struct RecordableOptionCache {
    live: Arc<dyn SensorInterface>,
    on_write: OptionWriteHook,
    cache: Mutex<HashMap<OptionId, Arc<RecordableOption>>>,
}

impl RecordableOptionCache {
    /// Create a cache over `live` reporting writes to `on_write`.
    #[must_use]
    pub fn new(live: Arc<dyn SensorInterface>, on_write: OptionWriteHook) -> Self {
        Self {
            live,
            on_write,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Get the wrapper for `id`, constructing it on first access.
    ///
    /// The map lock is held across construction, so two concurrent calls
    /// with the same id observe exactly one wrapper.
    ///
    /// # Errors
    ///
    /// Propagates the live sensor's failure for unsupported ids; nothing is
    /// cached in that case.
    pub fn get_option(&self, id: OptionId) -> Result<Arc<RecordableOption>> {
        let mut cache = self.cache.lock().expect("option cache lock poisoned");

        if let Some(existing) = cache.get(&id) {
            return Ok(Arc::clone(existing));
        }

        let live_option = self.live.get_option(id)?;
        debug!(?id, "Wrapping live option for recording");
        let wrapper = Arc::new(RecordableOption::new(
            id,
            live_option,
            Arc::clone(&self.on_write),
        ));
        cache.insert(id, Arc::clone(&wrapper));
        Ok(wrapper)
    }

    /// Number of wrappers constructed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.lock().expect("option cache lock poisoned").len()
    }

    /// Whether no wrapper has been constructed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
