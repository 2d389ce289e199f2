//! Interaction history repository

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{DbPool, connection};
use crate::intent::{Confidence, Entities, Intent, IntentKind};
use crate::language::LanguageLabel;
use crate::{Error, Result};

/// A stored, understood utterance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interaction {
    pub id: String,
    pub user_id: String,
    pub transcript: String,
    pub language: LanguageLabel,
    /// Recognition language code, for voice turns
    pub language_code: Option<String>,
    pub intent: Intent,
    /// Engine-reported transcript confidence, for voice turns
    pub stt_confidence: Option<f32>,
    pub reply: String,
    pub created_at: DateTime<Utc>,
}

/// Fields of an interaction to record
#[derive(Debug, Clone, Copy)]
pub struct NewInteraction<'a> {
    pub user_id: &'a str,
    pub transcript: &'a str,
    pub language: LanguageLabel,
    pub language_code: Option<&'a str>,
    pub intent: &'a Intent,
    pub stt_confidence: Option<f32>,
    pub reply: &'a str,
}

/// Interaction history repository
#[derive(Clone)]
pub struct InteractionRepo {
    pool: DbPool,
}

impl InteractionRepo {
    /// Create a new interaction repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record an interaction
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn record(&self, new: NewInteraction<'_>) -> Result<Interaction> {
        let conn = connection(&self.pool)?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let entities = serde_json::to_string(&new.intent.entities)?;

        conn.execute(
            "INSERT INTO voice_interactions
                (id, user_id, transcript, language, language_code, intent,
                 intent_confidence, entities, stt_confidence, reply, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                id,
                new.user_id,
                new.transcript,
                new.language.as_str(),
                new.language_code,
                new.intent.intent.as_str(),
                new.intent.confidence.as_str(),
                entities,
                new.stt_confidence,
                new.reply,
                now.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(Interaction {
            id,
            user_id: new.user_id.to_string(),
            transcript: new.transcript.to_string(),
            language: new.language,
            language_code: new.language_code.map(ToString::to_string),
            intent: new.intent.clone(),
            stt_confidence: new.stt_confidence,
            reply: new.reply.to_string(),
            created_at: now,
        })
    }

    /// List a user's most recent interactions, newest first
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn list_recent(&self, user_id: &str, limit: usize) -> Result<Vec<Interaction>> {
        let conn = connection(&self.pool)?;

        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, transcript, language, language_code, intent,
                        intent_confidence, entities, stt_confidence, reply, created_at
                 FROM voice_interactions
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2",
            )
            .map_err(|e| Error::Database(e.to_string()))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let interactions = stmt
            .query_map(rusqlite::params![user_id, limit], |row| {
                let language = LanguageLabel::parse(&row.get::<_, String>(3)?).unwrap_or_default();
                let entities: Entities =
                    serde_json::from_str(&row.get::<_, String>(7)?).unwrap_or_default();
                let intent = Intent {
                    intent: IntentKind::parse(&row.get::<_, String>(5)?)
                        .unwrap_or(IntentKind::Other),
                    entities,
                    confidence: Confidence::parse(&row.get::<_, String>(6)?)
                        .unwrap_or(Confidence::Low),
                    detected_language: language,
                };

                Ok(Interaction {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    transcript: row.get(2)?,
                    language,
                    language_code: row.get(4)?,
                    intent,
                    stt_confidence: row.get(8)?,
                    reply: row.get(9)?,
                    created_at: parse_datetime(&row.get::<_, String>(10)?),
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(interactions)
    }

    /// Delete all interactions of a user, returning how many were removed
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn clear(&self, user_id: &str) -> Result<usize> {
        let conn = connection(&self.pool)?;

        conn.execute("DELETE FROM voice_interactions WHERE user_id = ?1", [user_id])
            .map_err(|e| Error::Database(e.to_string()))
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory;

    fn setup() -> InteractionRepo {
        let pool = init_memory().unwrap();
        InteractionRepo::new(pool)
    }

    fn order_intent() -> Intent {
        Intent {
            intent: IntentKind::Order,
            entities: Entities {
                food_items: vec!["biryani".to_string()],
                quantities: vec!["2".to_string()],
                ..Entities::default()
            },
            confidence: Confidence::High,
            detected_language: LanguageLabel::Urdu,
        }
    }

    fn record(repo: &InteractionRepo, user_id: &str, transcript: &str) -> Interaction {
        repo.record(NewInteraction {
            user_id,
            transcript,
            language: LanguageLabel::Urdu,
            language_code: Some("ur-PK"),
            intent: &order_intent(),
            stt_confidence: Some(0.9),
            reply: "Ji zaroor!",
        })
        .unwrap()
    }

    #[test]
    fn test_record_and_list() {
        let repo = setup();
        let recorded = record(&repo, "user-1", "do biryani chahiye");

        let listed = repo.list_recent("user-1", 10).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, recorded.id);
        assert_eq!(listed[0].intent, order_intent());
        assert_eq!(listed[0].language_code.as_deref(), Some("ur-PK"));
        assert!(listed[0].stt_confidence.is_some_and(|c| (c - 0.9).abs() < 1e-6));
    }

    #[test]
    fn test_newest_first_with_limit() {
        let repo = setup();
        record(&repo, "user-1", "first");
        record(&repo, "user-1", "second");
        record(&repo, "user-1", "third");
        record(&repo, "user-2", "other user");

        let listed = repo.list_recent("user-1", 2).unwrap();
        let transcripts: Vec<_> = listed.iter().map(|i| i.transcript.as_str()).collect();
        assert_eq!(transcripts, vec!["third", "second"]);
    }

    #[test]
    fn test_text_turn_has_no_stt_fields() {
        let repo = setup();
        let intent = Intent::bare(IntentKind::Greeting, Confidence::Medium, LanguageLabel::English);
        repo.record(NewInteraction {
            user_id: "user-1",
            transcript: "hello",
            language: LanguageLabel::English,
            language_code: None,
            intent: &intent,
            stt_confidence: None,
            reply: "Hello!",
        })
        .unwrap();

        let listed = repo.list_recent("user-1", 5).unwrap();
        assert!(listed[0].language_code.is_none());
        assert!(listed[0].stt_confidence.is_none());
        assert_eq!(listed[0].intent.entities, Entities::default());
    }

    #[test]
    fn test_clear() {
        let repo = setup();
        record(&repo, "user-1", "first");
        record(&repo, "user-1", "second");
        assert_eq!(repo.clear("user-1").unwrap(), 2);
        assert!(repo.list_recent("user-1", 10).unwrap().is_empty());
    }
}
