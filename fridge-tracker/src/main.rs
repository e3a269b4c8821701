use anyhow::Context;
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use fridge_core::{classify_now, today, ExpirationKind};
use fridge_tracker::{ConsoleSink, FridgeTracker, ProfileUpdate, Snapshot, TrackerConfig, RECIPE_FAILURE_MESSAGE};
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "fridge", about = "Track what's in the fridge and what gets thrown away")]
struct Cli {
    /// SQLite database URL (defaults to FRIDGE_DATABASE_URL or sqlite://fridge.db)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add an item with its expiration date (YYYY-MM-DD)
    Add { name: String, expiration_date: String },
    /// Remove an item without logging it as waste
    Remove { id: Uuid },
    /// Throw an item away and log it in the waste history
    Chuck { id: Uuid },
    /// List items with their expiration status
    List,
    /// Show expired and expiring-soon notices
    Check,
    /// Remove every item (and optionally the waste history)
    Clear {
        #[arg(long)]
        waste: bool,
    },
    /// Print waste statistics
    Report,
    /// Recipe suggestions
    #[command(subcommand)]
    Recipes(RecipesCommand),
    /// Username and daily calorie intake
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Write all data as JSON to a file, or stdout
    Export {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Replace all data with a JSON snapshot
    Import { path: PathBuf },
}

#[derive(Subcommand)]
enum RecipesCommand {
    /// Ask the recipe service for ideas based on the fridge contents
    Suggest,
    List,
    Remove { name: String },
    Clear,
}

#[derive(Subcommand)]
enum ProfileCommand {
    Show,
    Set {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        calories: Option<u32>,
    },
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = TrackerConfig::from_env()?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }
    debug!("Using database {}", config.database_url);

    let mut tracker = FridgeTracker::new(config)
        .await
        .context("failed to open the fridge database")?;

    match cli.command {
        Command::Add { name, expiration_date } => {
            match tracker.inventory().add_item(&name, &expiration_date).await? {
                Some(item) => println!("Added {} to fridge! ({})", item.name, item.id),
                None => println!("{} is already in the fridge", name.trim()),
            }
        }
        Command::Remove { id } => {
            tracker.inventory().remove_item(id).await?;
            println!("Removed {}", id);
        }
        Command::Chuck { id } => {
            let wasted = tracker.inventory().chuck_item(id, Utc::now()).await?;
            println!("Chucked {}!", wasted.item.name);
        }
        Command::List => {
            let items = tracker.inventory().list_items().await?;
            if items.is_empty() {
                println!("Your fridge is empty. Add some items to get started!");
                return Ok(());
            }
            println!("Current items ({})", items.len());
            for item in items {
                let label = match classify_now(item.expiration_date).kind() {
                    ExpirationKind::Expired => " (Expired)",
                    ExpirationKind::ExpiringSoon => " (Expires Soon)",
                    ExpirationKind::Fresh => "",
                };
                println!("  {}  {:<24} {}{}", item.id, item.name, item.expiration_date, label);
            }
        }
        Command::Check => {
            let delivered = tracker.check_expirations(today(), &mut ConsoleSink).await?;
            if delivered == 0 {
                println!("Nothing expired or expiring soon.");
            }
        }
        Command::Clear { waste } => {
            let removed = tracker.inventory().clear_items().await?;
            println!("Removed {} items", removed);
            if waste {
                let cleared = tracker.history().clear_wasted().await?;
                println!("Cleared {} waste entries", cleared);
            }
        }
        Command::Report => print_report(&tracker).await?,
        Command::Recipes(command) => run_recipes(&tracker, command).await?,
        Command::Profile(command) => run_profile(&tracker, command).await?,
        Command::Export { output } => {
            let json = tracker.export_snapshot().await?.to_json()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
                    info!("Exported snapshot to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Command::Import { path } => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            let snapshot = Snapshot::from_json(&text)?;
            tracker.import_snapshot(&snapshot).await?;
            println!(
                "Imported {} items and {} waste entries",
                snapshot.items.len(),
                snapshot.wasted_items.len()
            );
        }
    }

    Ok(())
}

async fn print_report(tracker: &FridgeTracker) -> anyhow::Result<()> {
    let stats = tracker.history().waste_report().await?;

    if stats.total_wasted == 0 {
        println!("You haven't wasted any food yet. Keep it up!");
        return Ok(());
    }

    println!("Total items wasted: {}", stats.total_wasted);

    println!("\nMonthly breakdown:");
    for (month, count) in stats.months_descending() {
        println!("  {}  {} items", month, count);
    }

    println!("\nMost wasted items:");
    for (name, count) in stats.top_wasted(5) {
        println!("  {:<24} {} time{}", name, count, if count > 1 { "s" } else { "" });
    }

    println!("\nRecent waste:");
    for wasted in &stats.recent_waste {
        println!(
            "  {:<24} expired {}  chucked {}",
            wasted.item.name,
            wasted.item.expiration_date,
            wasted.date_chucked.with_timezone(&Local).format("%b %-d, %Y")
        );
    }

    Ok(())
}

async fn run_recipes(tracker: &FridgeTracker, command: RecipesCommand) -> anyhow::Result<()> {
    match command {
        RecipesCommand::Suggest => match tracker.suggest_recipes().await {
            Ok(recipes) => {
                for recipe in &recipes {
                    print_recipe(recipe);
                }
            }
            Err(e) => {
                error!("Recipe request failed: {}", e);
                eprintln!("{}", RECIPE_FAILURE_MESSAGE);
                std::process::exit(1);
            }
        },
        RecipesCommand::List => {
            let saved = tracker.recipes().suggestions().await?;
            if saved.recipes.is_empty() {
                println!("No saved recipes. Try `fridge recipes suggest`.");
                return Ok(());
            }
            if let Some(updated) = saved.last_updated {
                println!(
                    "Suggested {} from: {}\n",
                    updated.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    saved.fridge_items_used.join(", ")
                );
            }
            for recipe in &saved.recipes {
                print_recipe(recipe);
            }
        }
        RecipesCommand::Remove { name } => {
            if tracker.recipes().remove_recipe(&name, Utc::now()).await? {
                println!("Removed recipe {}", name);
            } else {
                println!("No recipe named {}", name);
            }
        }
        RecipesCommand::Clear => {
            tracker.recipes().clear_recipes().await?;
            println!("Cleared saved recipes");
        }
    }
    Ok(())
}

fn print_recipe(recipe: &fridge_tracker::Recipe) {
    println!("{} [{} | {}]", recipe.recipe_name, recipe.difficulty_level, recipe.estimated_cooking_time);
    println!("  {}", recipe.brief_description);
    println!("  Ingredients: {}\n", recipe.main_ingredients.join(", "));
}

async fn run_profile(tracker: &FridgeTracker, command: ProfileCommand) -> anyhow::Result<()> {
    let profile = match command {
        ProfileCommand::Show => tracker.profile().profile().await?,
        ProfileCommand::Set { username, calories } => {
            tracker
                .profile()
                .update_profile(ProfileUpdate {
                    username,
                    daily_calorie_intake: calories,
                })
                .await?
        }
        ProfileCommand::Reset => tracker.profile().reset_profile().await?,
    };

    let username = if profile.username.is_empty() { "(not set)" } else { profile.username.as_str() };
    println!("Username: {}", username);
    println!("Daily calorie intake: {}", profile.daily_calorie_intake);
    Ok(())
}
