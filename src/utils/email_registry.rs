use std::sync::RwLock;
use std::time::Duration;

use autoscale_cuckoo_filter::CuckooFilter;
use moka::future::Cache;
use tracing::info;

use crate::store::{StoreResult, UserStore};

/// Expected capacity and false-positive rate.
/// Tune these based on real user counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Fast answer to "is this email already registered".
///
/// The cuckoo filter gives a definite "no"; the moka cache gives a fast
/// "yes" for recently seen emails. Anything else falls through to the store,
/// which stays the source of truth (the unique key still guards inserts).
pub struct EmailRegistry {
    filter: RwLock<CuckooFilter<str>>,
    taken: Cache<String, bool>,
}

impl Default for EmailRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
pub fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

impl EmailRegistry {
    pub fn new() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            taken: Cache::builder()
                .max_capacity(500_000) // tune based on memory
                .time_to_live(Duration::from_secs(86400)) // 24h TTL
                .build(),
        }
    }

    /// Check if an email might be registered (false positives possible)
    fn might_exist(&self, email: &str) -> bool {
        // A poisoned lock only means a writer panicked mid-add; answer "maybe".
        self.filter
            .read()
            .map(|f| f.contains(email))
            .unwrap_or(true)
    }

    /// Record a registered email in both the filter and the cache.
    pub async fn mark_taken(&self, email: &str) {
        let email = normalize(email);
        if let Ok(mut filter) = self.filter.write() {
            filter.add(&email);
        }
        self.taken.insert(email, true).await;
    }

    /// Forget a deleted account's email.
    pub async fn forget(&self, email: &str) {
        let email = normalize(email);
        if let Ok(mut filter) = self.filter.write() {
            filter.remove(&email);
        }
        self.taken.invalidate(&email).await;
    }

    /// true  => email AVAILABLE
    /// false => email TAKEN
    pub async fn is_available(&self, email: &str, users: &dyn UserStore) -> StoreResult<bool> {
        let email = normalize(email);

        // 1️⃣ Cuckoo filter: fast negative
        if !self.might_exist(&email) {
            return Ok(true);
        }

        // 2️⃣ Moka cache: fast positive
        if self.taken.get(&email).await.unwrap_or(false) {
            return Ok(false);
        }

        // 3️⃣ Store fallback
        let exists = users.find_user_by_email(&email).await?.is_some();
        if exists {
            self.taken.insert(email, true).await;
        }
        Ok(!exists)
    }

    /// Load every registered email into the filter in batches.
    pub async fn warmup(&self, users: &dyn UserStore, batch_size: usize) -> StoreResult<usize> {
        let emails = users.all_emails().await?;
        let total = emails.len();

        for batch in emails.chunks(batch_size.max(1)) {
            if let Ok(mut filter) = self.filter.write() {
                for email in batch {
                    filter.add(&normalize(email));
                }
            }
        }

        info!(total, "Email registry warmup complete");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{role::Role, user::NewUser};
    use crate::store::MemoryStore;

    #[actix_web::test]
    async fn unknown_email_is_available_without_touching_the_store() {
        let registry = EmailRegistry::new();
        let store = MemoryStore::new();
        assert!(registry.is_available("new@dayflow.io", &store).await.unwrap());
    }

    #[actix_web::test]
    async fn marked_email_is_taken_regardless_of_case() {
        let registry = EmailRegistry::new();
        let store = MemoryStore::new();
        registry.mark_taken("Taken@Dayflow.io").await;
        assert!(!registry.is_available("taken@dayflow.io ", &store).await.unwrap());
    }

    #[actix_web::test]
    async fn warmup_loads_existing_accounts() {
        let registry = EmailRegistry::new();
        let store = MemoryStore::new();
        store
            .create_user(NewUser {
                email: "old@dayflow.io".into(),
                password_hash: "h".into(),
                full_name: None,
                role: Role::Employee,
            })
            .await
            .unwrap();

        assert_eq!(registry.warmup(&store, 100).await.unwrap(), 1);
        assert!(!registry.is_available("old@dayflow.io", &store).await.unwrap());
    }

    #[actix_web::test]
    async fn forgotten_email_becomes_available() {
        let registry = EmailRegistry::new();
        let store = MemoryStore::new();
        registry.mark_taken("gone@dayflow.io").await;
        registry.forget("gone@dayflow.io").await;
        assert!(registry.is_available("gone@dayflow.io", &store).await.unwrap());
    }
}
