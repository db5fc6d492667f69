//! Durable cart storage.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::{CartError, CartItem};

/// Storage key the cart is saved under.
pub const CART_STORAGE_KEY: &str = "shopify-cart";

/// The persisted part of a cart. The busy flag is deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub cart_id: Option<String>,
    #[serde(default)]
    pub checkout_url: Option<String>,
}

/// On-disk envelope: `{ "state": {...}, "version": 0 }`.
#[derive(Serialize, Deserialize)]
struct Envelope {
    state: PersistedCart,
    #[serde(default)]
    version: u32,
}

const STORAGE_VERSION: u32 = 0;

/// Where a cart is loaded from and saved to.
pub trait CartStorage {
    /// Load the saved cart; `Ok(None)` when nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the saved data cannot be read or parsed.
    fn load(&self) -> Result<Option<PersistedCart>, CartError>;

    /// Replace the saved cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the data cannot be written.
    fn save(&self, cart: &PersistedCart) -> Result<(), CartError>;
}

/// JSON file storage at `<dir>/shopify-cart.json`.
///
/// Writes go to a temporary file in the same directory which is then
/// renamed over the target, so a crash never leaves a half-written cart.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Storage inside `dir`. The directory is created on first save.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{CART_STORAGE_KEY}.json")),
        }
    }

    /// Path of the cart file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<PersistedCart>, CartError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CartError::Storage(e)),
        };
        let envelope: Envelope = serde_json::from_slice(&bytes)?;
        Ok(Some(envelope.state))
    }

    fn save(&self, cart: &PersistedCart) -> Result<(), CartError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let json = serde_json::to_vec_pretty(&Envelope {
            state: cart.clone(),
            version: STORAGE_VERSION,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), items = cart.items.len(), "Cart saved");
        Ok(())
    }
}

/// In-memory storage for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    saved: Mutex<Option<PersistedCart>>,
}

impl MemoryStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with `cart`.
    #[must_use]
    pub fn with(cart: PersistedCart) -> Self {
        Self {
            saved: Mutex::new(Some(cart)),
        }
    }

    /// What was last saved.
    #[must_use]
    pub fn snapshot(&self) -> Option<PersistedCart> {
        self.saved
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<Option<PersistedCart>, CartError> {
        Ok(self.snapshot())
    }

    fn save(&self, cart: &PersistedCart) -> Result<(), CartError> {
        *self
            .saved
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(cart.clone());
        Ok(())
    }
}
