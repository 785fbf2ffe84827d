use std::{marker::PhantomData, sync::Arc};

use tracing::{info, warn};

use super::{Document, DocumentBackend, MemoryBackend};
use crate::{
    config::{DatabaseConfig, StorageBackendKind},
    models::*,
    CoreError, Result,
};

/// Typed view over one collection of a [`DocumentBackend`].
pub struct Collection<T: Document> {
    backend: Arc<dyn DocumentBackend>,
    _doc: PhantomData<fn() -> T>,
}

impl<T: Document> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            _doc: PhantomData,
        }
    }
}

impl<T: Document> Collection<T> {
    fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            backend,
            _doc: PhantomData,
        }
    }

    /// Inserts or replaces the document stored under `doc.id()`.
    pub async fn insert(&self, doc: &T) -> Result<()> {
        let bytes = serde_json::to_vec(doc)?;
        self.backend.put(T::COLLECTION, doc.id(), bytes).await
    }

    pub async fn insert_many(&self, docs: &[T]) -> Result<()> {
        for doc in docs {
            self.insert(doc).await?;
        }
        Ok(())
    }

    /// Inserts only when no document with the same id exists.
    pub async fn insert_unique(&self, doc: &T) -> Result<bool> {
        let bytes = serde_json::to_vec(doc)?;
        self.backend
            .put_if_absent(T::COLLECTION, doc.id(), bytes)
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<T>> {
        match self.backend.get(T::COLLECTION, id).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn all(&self) -> Result<Vec<T>> {
        self.backend
            .scan(T::COLLECTION)
            .await?
            .iter()
            .map(|bytes| serde_json::from_slice(bytes).map_err(CoreError::from))
            .collect()
    }

    pub async fn find<P>(&self, predicate: P) -> Result<Vec<T>>
    where
        P: Fn(&T) -> bool,
    {
        Ok(self.all().await?.into_iter().filter(|d| predicate(d)).collect())
    }

    pub async fn find_one<P>(&self, predicate: P) -> Result<Option<T>>
    where
        P: Fn(&T) -> bool,
    {
        Ok(self.all().await?.into_iter().find(|d| predicate(d)))
    }

    pub async fn count_where<P>(&self, predicate: P) -> Result<usize>
    where
        P: Fn(&T) -> bool,
    {
        Ok(self.all().await?.iter().filter(|d| predicate(d)).count())
    }

    /// Applies `f` to the stored document atomically and returns the new version.
    pub async fn update<F>(&self, id: &str, f: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut T) + Send,
    {
        let mut f = Some(f);
        let mut updated: Option<T> = None;
        let found = self
            .backend
            .modify(T::COLLECTION, id, &mut |bytes: &[u8]| {
                let mut doc: T = serde_json::from_slice(bytes)?;
                if let Some(f) = f.take() {
                    f(&mut doc);
                }
                let next = serde_json::to_vec(&doc)?;
                updated = Some(doc);
                Ok(next)
            })
            .await?;
        Ok(if found { updated } else { None })
    }

    /// Applies `f` to every document matching `predicate`; returns how many changed.
    pub async fn update_where<P, F>(&self, predicate: P, f: F) -> Result<usize>
    where
        P: Fn(&T) -> bool,
        F: Fn(&mut T) + Send + Sync,
    {
        let ids: Vec<String> = self
            .find(predicate)
            .await?
            .iter()
            .map(|d| d.id().to_string())
            .collect();
        let mut changed = 0;
        for id in ids {
            if self.update(&id, |doc| f(doc)).await?.is_some() {
                changed += 1;
            }
        }
        Ok(changed)
    }

    pub async fn remove(&self, id: &str) -> Result<bool> {
        self.backend.delete(T::COLLECTION, id).await
    }

    pub async fn remove_where<P>(&self, predicate: P) -> Result<usize>
    where
        P: Fn(&T) -> bool,
    {
        let mut removed = 0;
        for doc in self.find(predicate).await? {
            if self.remove(doc.id()).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Entry point to every collection the service persists.
#[derive(Clone)]
pub struct Database {
    backend: Arc<dyn DocumentBackend>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl Database {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        match config.backend {
            StorageBackendKind::Memory => {
                info!("Using in-memory document store");
                Ok(Self::in_memory())
            }
            #[cfg(feature = "rocksdb")]
            StorageBackendKind::RocksDb => {
                info!("Opening RocksDB document store at {}", config.path);
                let backend = super::RocksDbBackend::open(&config.path)?;
                Ok(Self::new(Arc::new(backend)))
            }
            #[cfg(not(feature = "rocksdb"))]
            StorageBackendKind::RocksDb => Err(CoreError::Config(
                "database.backend = \"rocksdb\" requires the `rocksdb` feature".to_string(),
            )),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn collection<T: Document>(&self) -> Collection<T> {
        Collection::new(self.backend.clone())
    }

    pub fn users(&self) -> Collection<User> {
        self.collection()
    }

    pub fn user_emails(&self) -> Collection<UserEmail> {
        self.collection()
    }

    pub fn stocks(&self) -> Collection<Stock> {
        self.collection()
    }

    pub fn assets(&self) -> Collection<Asset> {
        self.collection()
    }

    pub fn lessons(&self) -> Collection<Lesson> {
        self.collection()
    }

    pub fn quiz_scores(&self) -> Collection<QuizScore> {
        self.collection()
    }

    pub fn predictions(&self) -> Collection<PredictionRecord> {
        self.collection()
    }

    pub fn news(&self) -> Collection<NewsItem> {
        self.collection()
    }

    pub fn alerts(&self) -> Collection<Alert> {
        self.collection()
    }

    pub fn advisor_history(&self) -> Collection<AdvisorRecord> {
        self.collection()
    }

    pub fn community_chat(&self) -> Collection<ChatMessage> {
        self.collection()
    }

    /// Looks a user up through the unique email index.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.user_emails().get(&normalize_email(email)).await? {
            Some(entry) => self.users().get(&entry.user_id).await,
            None => Ok(None),
        }
    }

    /// Claims the user's email and stores the user. Returns `false` if the email is taken.
    pub async fn create_user(&self, user: &User) -> Result<bool> {
        let claim = UserEmail {
            email: normalize_email(&user.email),
            user_id: user.id.clone(),
        };
        if !self.user_emails().insert_unique(&claim).await? {
            return Ok(false);
        }
        if let Err(err) = self.users().insert(user).await {
            if let Err(release) = self.user_emails().remove(&claim.email).await {
                warn!(error = %release, email = %claim.email, "failed to release email claim");
            }
            return Err(err);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.into(),
            name: format!("user {id}"),
            email: email.into(),
            password: "hash".into(),
            risk_personality: "Undetermined".into(),
            financial_health_score: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn email_is_unique_case_insensitively() {
        let db = Database::in_memory();
        assert!(db.create_user(&user("u1", "Demo@DhanDraft.com")).await.unwrap());
        assert!(!db.create_user(&user("u2", "demo@dhandraft.com ")).await.unwrap());
        let found = db.find_user_by_email("DEMO@dhandraft.com").await.unwrap().unwrap();
        assert_eq!(found.id, "u1");
        assert!(db.users().get("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_where_and_remove_where() {
        let db = Database::in_memory();
        let now = Utc::now();
        let alerts: Vec<Alert> = (0..3)
            .map(|i| Alert {
                id: format!("a{i}"),
                title: format!("alert {i}"),
                impact_score: 80,
                impacted_sectors: vec!["Energy".into()],
                severity: Severity::Medium,
                explanation: String::new(),
                created_at: now - Duration::days(i),
                is_read: i == 0,
            })
            .collect();
        db.alerts().insert_many(&alerts).await.unwrap();

        let changed = db
            .alerts()
            .update_where(|a| !a.is_read, |a| a.is_read = true)
            .await
            .unwrap();
        assert_eq!(changed, 2);
        assert_eq!(db.alerts().count_where(|a| a.is_read).await.unwrap(), 3);

        let cutoff = now - Duration::hours(36);
        let removed = db
            .alerts()
            .remove_where(|a| a.created_at < cutoff)
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(db.alerts().all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_missing_document_returns_none() {
        let db = Database::in_memory();
        let result = db.alerts().update("missing", |a| a.is_read = true).await.unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn rocksdb_backend_requires_feature() {
        let config = DatabaseConfig {
            backend: StorageBackendKind::RocksDb,
            path: "unused".into(),
        };
        if cfg!(not(feature = "rocksdb")) {
            assert!(Database::open(&config).is_err());
        }
    }

    /// Memory store whose `users` writes always fail.
    struct UsersDown(MemoryBackend);

    #[async_trait::async_trait]
    impl DocumentBackend for UsersDown {
        async fn put(&self, collection: &str, id: &str, doc: Vec<u8>) -> Result<()> {
            if collection == User::COLLECTION {
                return Err(CoreError::Storage("users unavailable".into()));
            }
            self.0.put(collection, id, doc).await
        }

        async fn put_if_absent(&self, collection: &str, id: &str, doc: Vec<u8>) -> Result<bool> {
            self.0.put_if_absent(collection, id, doc).await
        }

        async fn get(&self, collection: &str, id: &str) -> Result<Option<Vec<u8>>> {
            self.0.get(collection, id).await
        }

        async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
            self.0.delete(collection, id).await
        }

        async fn scan(&self, collection: &str) -> Result<Vec<Vec<u8>>> {
            self.0.scan(collection).await
        }

        async fn modify(
            &self,
            collection: &str,
            id: &str,
            f: &mut super::super::ModifyFn<'_>,
        ) -> Result<bool> {
            self.0.modify(collection, id, f).await
        }

        fn name(&self) -> &'static str {
            "users-down"
        }
    }

    #[tokio::test]
    async fn failed_user_insert_releases_email_claim() {
        let db = Database::new(Arc::new(UsersDown(MemoryBackend::new())));
        assert!(db.create_user(&user("u1", "demo@dhandraft.com")).await.is_err());
        assert!(db.user_emails().get("demo@dhandraft.com").await.unwrap().is_none());
        assert!(db.find_user_by_email("demo@dhandraft.com").await.unwrap().is_none());
    }
}
