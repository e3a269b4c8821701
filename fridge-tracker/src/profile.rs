use crate::store::FridgeStore;
use crate::types::{Profile, ProfileUpdate, Result, TrackerError};
use sqlx::Row;
use tracing::info;

#[derive(Clone)]
pub struct ProfileStore {
    store: FridgeStore,
}

impl ProfileStore {
    pub fn new(store: FridgeStore) -> Self {
        Self { store }
    }

    /// The stored profile, or the default one if nothing was saved yet.
    pub async fn profile(&self) -> Result<Profile> {
        let row = sqlx::query("SELECT username, daily_calorie_intake FROM profile WHERE id = 0")
            .fetch_optional(self.store.pool())
            .await?;

        match row {
            Some(row) => {
                let intake: i64 = row.try_get("daily_calorie_intake")?;
                Ok(Profile {
                    username: row.try_get("username")?,
                    daily_calorie_intake: u32::try_from(intake)
                        .map_err(|_| TrackerError::Corrupt(format!("daily calorie intake {}", intake)))?,
                })
            }
            None => Ok(Profile::default()),
        }
    }

    pub async fn save_profile(&self, profile: &Profile) -> Result<()> {
        let mut tx = self.store.pool().begin().await?;
        write_profile(&mut tx, profile).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Profile> {
        let mut profile = self.profile().await?;
        if let Some(username) = update.username {
            profile.username = username;
        }
        if let Some(intake) = update.daily_calorie_intake {
            profile.daily_calorie_intake = intake;
        }
        self.save_profile(&profile).await?;

        info!("Updated profile for {:?}", profile.username);
        Ok(profile)
    }

    pub async fn set_username(&self, username: &str) -> Result<Profile> {
        self.update_profile(ProfileUpdate {
            username: Some(username.to_string()),
            ..ProfileUpdate::default()
        })
        .await
    }

    pub async fn set_daily_calorie_intake(&self, intake: u32) -> Result<Profile> {
        self.update_profile(ProfileUpdate {
            daily_calorie_intake: Some(intake),
            ..ProfileUpdate::default()
        })
        .await
    }

    pub async fn reset_profile(&self) -> Result<Profile> {
        sqlx::query("DELETE FROM profile").execute(self.store.pool()).await?;
        Ok(Profile::default())
    }
}

pub(crate) async fn write_profile(tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>, profile: &Profile) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO profile (id, username, daily_calorie_intake) VALUES (0, ?1, ?2)
        ON CONFLICT (id) DO UPDATE SET
            username = excluded.username,
            daily_calorie_intake = excluded.daily_calorie_intake
        "#,
    )
    .bind(&profile.username)
    .bind(i64::from(profile.daily_calorie_intake))
    .execute(&mut **tx)
    .await?;
    Ok(())
}
