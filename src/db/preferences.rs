//! Voice preference repository

use chrono::Utc;
use rusqlite::OptionalExtension;

use super::{DbPool, connection};
use crate::speech::{VoiceGender, VoicePreferences};
use crate::{Error, Result};

/// Voice preference repository
#[derive(Clone)]
pub struct PreferencesRepo {
    pool: DbPool,
}

impl PreferencesRepo {
    /// Create a new preference repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Find a user's saved preferences
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn find(&self, user_id: &str) -> Result<Option<VoicePreferences>> {
        let conn = connection(&self.pool)?;

        conn.query_row(
            "SELECT language, voice_gender, speaking_rate, pitch
             FROM voice_preferences WHERE user_id = ?1",
            [user_id],
            |row| {
                let gender: String = row.get(1)?;
                Ok(VoicePreferences {
                    language: row.get(0)?,
                    voice_gender: VoiceGender::parse(&gender).unwrap_or_default(),
                    speaking_rate: row.get(2)?,
                    pitch: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(|e| Error::Database(e.to_string()))
    }

    /// A user's saved preferences, or `defaults` if none are saved
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn get_or(&self, user_id: &str, defaults: &VoicePreferences) -> Result<VoicePreferences> {
        Ok(self.find(user_id)?.unwrap_or_else(|| defaults.clone()))
    }

    /// Save preferences for a user, replacing any earlier ones
    ///
    /// Rate and pitch are clamped before storing; the stored value is returned.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn save(&self, user_id: &str, preferences: VoicePreferences) -> Result<VoicePreferences> {
        let preferences = preferences.clamped();
        let conn = connection(&self.pool)?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO voice_preferences
                (user_id, language, voice_gender, speaking_rate, pitch, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(user_id) DO UPDATE SET
                language = excluded.language,
                voice_gender = excluded.voice_gender,
                speaking_rate = excluded.speaking_rate,
                pitch = excluded.pitch,
                updated_at = excluded.updated_at",
            rusqlite::params![
                user_id,
                preferences.language,
                preferences.voice_gender.to_string(),
                preferences.speaking_rate,
                preferences.pitch,
                now,
            ],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        tracing::debug!(user_id, gender = %preferences.voice_gender, "voice preferences saved");
        Ok(preferences)
    }

    /// Delete a user's preferences
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn delete(&self, user_id: &str) -> Result<()> {
        let conn = connection(&self.pool)?;

        conn.execute("DELETE FROM voice_preferences WHERE user_id = ?1", [user_id])
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }
}
