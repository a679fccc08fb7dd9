use crate::domain::model::Venue;
use crate::domain::ports::VenueSource;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct CatalogState {
    venues: Vec<Venue>,
    loaded_at: Option<DateTime<Utc>>,
}

/// Shared, swappable venue list. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    inner: Arc<RwLock<CatalogState>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_venues(venues: Vec<Venue>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CatalogState {
                venues,
                loaded_at: Some(Utc::now()),
            })),
        }
    }

    pub async fn replace(&self, venues: Vec<Venue>) {
        let mut state = self.inner.write().await;
        state.venues = venues;
        state.loaded_at = Some(Utc::now());
    }

    pub async fn snapshot(&self) -> Vec<Venue> {
        self.inner.read().await.venues.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.venues.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.loaded_at
    }
}

/// Fetches the catalog and swaps it in. A failed fetch is logged and the
/// previous contents stay in place.
pub async fn load_into(source: &dyn VenueSource, catalog: &Catalog) -> bool {
    tracing::info!("🔗 Loading venues from {}", source.describe());
    match source.fetch().await {
        Ok(venues) => {
            tracing::info!("✅ Loaded {} venues", venues.len());
            catalog.replace(venues).await;
            true
        }
        Err(e) => {
            tracing::error!("❌ Failed to load venues from {}: {}", source.describe(), e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            false
        }
    }
}
