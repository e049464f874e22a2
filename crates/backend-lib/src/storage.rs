// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! User persistence abstraction with in-memory and flat-file implementations.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::{fs as tokio_fs, sync::RwLock};
use tradedesk_common::UserId;
use uuid::Uuid;

use crate::config::{StorageBackend, StorageSettings};

/// Errors raised by the backing stores
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record already exists")]
    Duplicate,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A registered user. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredential {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserCredential {
    fn new(email: &str, password_hash: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Trait for user storage backends
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look a user up by normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredential>, StoreError>;

    /// Look a user up by id
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserCredential>, StoreError>;

    /// Create a user, failing with [`StoreError::Duplicate`] if the email is taken
    async fn create(&self, email: &str, password_hash: &str)
        -> Result<UserCredential, StoreError>;
}

/// Process-local user store
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    by_email: DashMap<String, UserCredential>,
    email_by_id: DashMap<UserId, String>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredential>, StoreError> {
        Ok(self.by_email.get(email).map(|user| user.clone()))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserCredential>, StoreError> {
        let Some(email) = self.email_by_id.get(&id).map(|e| e.clone()) else {
            return Ok(None);
        };
        self.find_by_email(&email).await
    }

    async fn create(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<UserCredential, StoreError> {
        // The entry guard holds the shard lock, so two signups racing on
        // the same email cannot both see a vacant slot.
        let user = match self.by_email.entry(email.to_string()) {
            Entry::Occupied(_) => return Err(StoreError::Duplicate),
            Entry::Vacant(slot) => slot.insert(UserCredential::new(email, password_hash)).clone(),
        };
        self.email_by_id.insert(user.id, user.email.clone());
        Ok(user)
    }
}

/// User store persisted as a JSON array in `<root>/users.json`
#[derive(Debug)]
pub struct FlatFileUserStore {
    file: PathBuf,
    users: RwLock<HashMap<UserId, UserCredential>>,
}

impl FlatFileUserStore {
    /// Open the store under `root`, loading any existing users
    pub async fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        tokio_fs::create_dir_all(&root).await?;

        let file = root.join("users.json");
        let users = match tokio_fs::read(&file).await {
            Ok(bytes) => {
                let records: Vec<UserCredential> = serde_json::from_slice(&bytes)?;
                records.into_iter().map(|u| (u.id, u)).collect()
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %file.display(), users = users.len(), "user store opened");

        Ok(Self {
            file,
            users: RwLock::new(users),
        })
    }

    /// Write the full user set, replacing the file atomically
    async fn persist(&self, users: &HashMap<UserId, UserCredential>) -> Result<(), StoreError> {
        let mut records: Vec<&UserCredential> = users.values().collect();
        records.sort_by_key(|u| u.created_at);

        let json = serde_json::to_vec_pretty(&records)?;
        let tmp = self.file.with_extension("json.tmp");
        tokio_fs::write(&tmp, json).await?;
        tokio_fs::rename(&tmp, &self.file).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for FlatFileUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredential>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserCredential>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn create(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<UserCredential, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Err(StoreError::Duplicate);
        }

        let user = UserCredential::new(email, password_hash);
        users.insert(user.id, user.clone());

        if let Err(e) = self.persist(&users).await {
            users.remove(&user.id);
            return Err(e);
        }

        Ok(user)
    }
}

/// Open the user store selected in settings
pub async fn open_user_store(settings: &StorageSettings) -> Result<Arc<dyn UserStore>, StoreError> {
    match settings.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryUserStore::new())),
        StorageBackend::File => Ok(Arc::new(FlatFileUserStore::open(&settings.path).await?)),
    }
}
