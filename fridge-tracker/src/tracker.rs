use crate::history::{write_wasted, WasteHistory};
use crate::inventory::{write_items, Inventory};
use crate::notifications::{NotificationSink, Notifier};
use crate::profile::{write_profile, ProfileStore};
use crate::recipe_book::RecipeBook;
use crate::recipes::{OpenAiRecipeAdapter, Recipe, RecipeAdapter};
use crate::snapshot::Snapshot;
use crate::store::FridgeStore;
use crate::types::{Result, TrackerConfig};
use chrono::{NaiveDate, Utc};
use tracing::{error, info};

/// Composition root: owns the database handle and hands each store a clone.
pub struct FridgeTracker {
    store: FridgeStore,
    inventory: Inventory,
    history: WasteHistory,
    recipes: RecipeBook,
    profile: ProfileStore,
    notifier: Notifier,
    config: TrackerConfig,
}

impl FridgeTracker {
    pub async fn new(config: TrackerConfig) -> Result<Self> {
        let store = FridgeStore::connect(&config.database_url).await?;
        Ok(Self::with_store(store, config))
    }

    pub fn with_store(store: FridgeStore, config: TrackerConfig) -> Self {
        Self {
            inventory: Inventory::new(store.clone()),
            history: WasteHistory::new(store.clone()),
            recipes: RecipeBook::new(store.clone()),
            profile: ProfileStore::new(store.clone()),
            store,
            notifier: Notifier::new(),
            config,
        }
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn history(&self) -> &WasteHistory {
        &self.history
    }

    pub fn recipes(&self) -> &RecipeBook {
        &self.recipes
    }

    pub fn profile(&self) -> &ProfileStore {
        &self.profile
    }

    /// One notification pass over the current inventory.
    pub async fn check_expirations(&mut self, today: NaiveDate, sink: &mut dyn NotificationSink) -> Result<usize> {
        let items = self.inventory.list_items().await?;
        Ok(self.notifier.check(&items, today, sink))
    }

    /// Requests suggestions for everything in the fridge through the
    /// configured recipe service.
    pub async fn suggest_recipes(&self) -> Result<Vec<Recipe>> {
        let adapter = OpenAiRecipeAdapter::new(self.config.recipes.clone())?;
        self.suggest_recipes_with(&adapter).await
    }

    pub async fn suggest_recipes_with(&self, adapter: &dyn RecipeAdapter) -> Result<Vec<Recipe>> {
        let names: Vec<String> = self
            .inventory
            .list_items()
            .await?
            .into_iter()
            .map(|item| item.name)
            .collect();

        match self.recipes.refresh(adapter, &names, Utc::now()).await {
            Ok(recipes) => Ok(recipes),
            Err(e) => {
                error!("Error generating recipes: {}", e);
                Err(e)
            }
        }
    }

    pub async fn export_snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot::new(
            self.inventory.list_items().await?,
            self.history.list_wasted().await?,
            self.profile.profile().await?,
        ))
    }

    /// Replaces inventory, waste history and profile with the snapshot's
    /// contents in a single transaction.
    pub async fn import_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let mut tx = self.store.pool().begin().await?;
        write_items(&mut tx, &snapshot.items).await?;
        write_wasted(&mut tx, &snapshot.wasted_items).await?;
        write_profile(&mut tx, &snapshot.profile).await?;
        tx.commit().await?;

        info!(
            "Imported snapshot v{}: {} items, {} wasted",
            snapshot.version,
            snapshot.items.len(),
            snapshot.wasted_items.len()
        );
        Ok(())
    }
}
