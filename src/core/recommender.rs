use crate::core::catalog::Catalog;
use crate::core::matching::{fallback_pick, filter_by_menu};
use crate::core::prompt::{parse_choice, ChoicePrompt};
use crate::domain::model::{Recommendation, Venue};
use crate::domain::ports::VenueChooser;
use crate::utils::error::{BotError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Mutex;
use std::time::Duration;

pub const DEFAULT_CHOOSER_TIMEOUT: Duration = Duration::from_secs(20);

pub struct Recommender<C: VenueChooser> {
    catalog: Catalog,
    chooser: C,
    timeout: Duration,
    rng: Mutex<StdRng>,
}

impl<C: VenueChooser> Recommender<C> {
    pub fn new(catalog: Catalog, chooser: C) -> Self {
        Self {
            catalog,
            chooser,
            timeout: DEFAULT_CHOOSER_TIMEOUT,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    /// Picks one venue for a free-text request. `None` only when the catalog is empty.
    pub async fn recommend(&self, request: &str) -> Option<Recommendation> {
        let venues = self.catalog.snapshot().await;
        if venues.is_empty() {
            tracing::error!("❌ No venue data loaded");
            return None;
        }

        let chosen = match self.choose_with_model(request, &venues).await {
            Ok(venue) => venue,
            Err(e) => {
                tracing::error!("❌ Model selection failed, using fallback: {}", e);
                self.with_rng(|rng| fallback_pick(request, &venues, rng))?
            }
        };

        Some(Recommendation::from(&chosen))
    }

    async fn choose_with_model(&self, request: &str, venues: &[Venue]) -> Result<Venue> {
        // Shuffled so the model does not keep favouring the top rows of the sheet
        let (candidates, prompt) = self.with_rng(|rng| {
            let mut shuffled = venues.to_vec();
            shuffled.shuffle(rng);
            let candidates = filter_by_menu(request, &shuffled);
            let prompt = ChoicePrompt::build(request, &candidates, rng);
            (candidates, prompt)
        });

        tracing::info!(
            "🤖 Asking the model to choose among {} venues",
            candidates.len()
        );
        tracing::debug!(
            "🔍 First candidates: {:?}",
            candidates.iter().take(3).map(Venue::name).collect::<Vec<_>>()
        );

        let answer = tokio::time::timeout(self.timeout, self.chooser.choose(&prompt))
            .await
            .map_err(|_| BotError::TimeoutError {
                what: "venue choice from the model".to_string(),
            })??;

        tracing::info!("🤖 Model answered: '{}'", answer);

        match parse_choice(&answer, candidates.len()) {
            Some(index) => {
                let venue = candidates[index].clone();
                tracing::info!(
                    "✅ Model chose {} (option {} of {})",
                    venue.name(),
                    index + 1,
                    candidates.len()
                );
                Ok(venue)
            }
            None => {
                tracing::warn!("⚠️ No usable option number in the answer, using fallback");
                self.with_rng(|rng| fallback_pick(request, &candidates, rng)).ok_or_else(|| {
                    BotError::CatalogError {
                        message: "no candidates to choose from".to_string(),
                    }
                })
            }
        }
    }
}
