//! Cart storage
//!
//! [`KeyValueStore`] is the durable-storage seam (browser local storage, a
//! directory on disk, or memory in tests). [`CartStorage`] is what a
//! [`Cart`](crate::cart::Cart) depends on; [`JsonCartStorage`] bridges the
//! two by serializing the cart under one key.

use std::{
    cell::RefCell,
    fmt, fs, io,
    path::{Path, PathBuf},
    rc::Rc,
};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{cart::records::CartRecord, items::LineItem};

/// Key the storefront has always stored its cart under.
pub const DEFAULT_CART_KEY: &str = "balloon-displays-cart";

/// Bytes escaped in [`FileStore`] file names. `%` is escaped too, so distinct
/// keys never share a file.
const FILE_NAME_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

/// Failures reading or writing persisted cart state.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The backing store could not be read or written.
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The stored text is not a cart document.
    #[error("stored cart is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The document was written by a newer schema.
    #[error("stored cart has unsupported schema version {0}")]
    UnsupportedVersion(u32),

    /// The document is in another currency (stored, expected).
    #[error("stored cart is in {0}, expected {1}")]
    CurrencyMismatch(String, &'static str),

    /// A line item record failed validation (index, reason).
    #[error("stored line item {0} is invalid: {1}")]
    InvalidRecord(usize, &'static str),

    /// Two records share an identity.
    #[error("stored cart contains {0} more than once")]
    DuplicateItem(String),

    /// A write would exceed the store's capacity.
    #[error("writing {needed} bytes to {key} exceeds the {quota} byte quota")]
    QuotaExceeded {
        /// Key being written
        key: String,
        /// Bytes the store would hold after the write
        needed: usize,
        /// Store capacity in bytes
        quota: usize,
    },

    /// The store refused the operation outright.
    #[error("storage unavailable: {0}")]
    Unavailable(&'static str),
}

/// String key/value storage that survives reloads.
pub trait KeyValueStore: fmt::Debug {
    /// Reads the value at `key`, `Ok(None)` if absent.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Writes `value` at `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the store cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Removes `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the store cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// Load/save adapter used by the cart.
pub trait CartStorage: fmt::Debug {
    /// Loads previously saved items, `Ok(None)` if nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if stored data is unreadable or invalid.
    fn load(&self, currency: &'static Currency) -> Result<Option<Vec<LineItem>>, PersistenceError>;

    /// Replaces the saved items.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the items cannot be written.
    fn save(
        &mut self,
        items: &[LineItem],
        currency: &'static Currency,
    ) -> Result<(), PersistenceError>;
}

/// Stores the cart as a versioned JSON document under a single key.
#[derive(Debug, Clone)]
pub struct JsonCartStorage<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> JsonCartStorage<S> {
    /// Stores under [`DEFAULT_CART_KEY`].
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_CART_KEY)
    }

    /// Stores under a custom key.
    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// The key the cart is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: KeyValueStore> CartStorage for JsonCartStorage<S> {
    fn load(&self, currency: &'static Currency) -> Result<Option<Vec<LineItem>>, PersistenceError> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(None);
        };

        let items = CartRecord::parse(&raw, currency)?.into_line_items(currency)?;

        Ok(Some(items))
    }

    fn save(
        &mut self,
        items: &[LineItem],
        currency: &'static Currency,
    ) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string(&CartRecord::from_items(items, currency))?;

        self.store.set(&self.key, &raw)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    values: FxHashMap<String, String>,
    quota: Option<usize>,
    fail_reads: bool,
    fail_writes: bool,
}

/// In-memory [`KeyValueStore`].
///
/// Clones share the same map, the way two tabs share one browser profile's
/// storage. Single-threaded only.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryStore {
    /// Creates an empty store with no quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that refuses writes once the total size of all
    /// keys and values would exceed `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        let store = Self::default();
        store.state.borrow_mut().quota = Some(quota);
        store
    }

    /// Makes every subsequent read fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.state.borrow_mut().fail_reads = fail;
    }

    /// Makes every subsequent write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    /// Writes a raw value, bypassing failure switches and quota.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.state
            .borrow_mut()
            .values
            .insert(key.to_string(), value.to_string());
    }

    /// Reads a raw value, bypassing failure switches.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.state.borrow().values.get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let state = self.state.borrow();

        if state.fail_reads {
            return Err(PersistenceError::Unavailable("reads disabled"));
        }

        Ok(state.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut state = self.state.borrow_mut();

        if state.fail_writes {
            return Err(PersistenceError::Unavailable("writes disabled"));
        }

        if let Some(quota) = state.quota {
            let others: usize = state
                .values
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, stored)| existing.len().saturating_add(stored.len()))
                .sum();
            let needed = others.saturating_add(key.len()).saturating_add(value.len());

            if needed > quota {
                return Err(PersistenceError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }

        state.values.insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        let mut state = self.state.borrow_mut();

        if state.fail_writes {
            return Err(PersistenceError::Unavailable("writes disabled"));
        }

        state.values.remove(key);

        Ok(())
    }
}

/// Directory-backed [`KeyValueStore`]: one `<key>.json` file per key, with
/// the key percent-encoded.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Stores files under `root`, created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory files are stored in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name = utf8_percent_encode(key, FILE_NAME_ESCAPES);

        self.root.join(format!("{file_name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.root)?;

        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");

        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}
