pub mod types;
pub mod store;
pub mod inventory;
pub mod history;
pub mod notifications;
pub mod recipes;
pub mod recipe_book;
pub mod profile;
pub mod snapshot;
pub mod tracker;

pub use types::*;
pub use store::FridgeStore;
pub use inventory::Inventory;
pub use history::WasteHistory;
pub use notifications::{ConsoleSink, LogSink, NotificationSink, Notifier};
pub use recipes::{MockRecipeAdapter, OpenAiRecipeAdapter, Recipe, RecipeAdapter};
pub use recipe_book::{RecipeBook, RecipeSuggestions};
pub use profile::ProfileStore;
pub use snapshot::Snapshot;
pub use tracker::FridgeTracker;
