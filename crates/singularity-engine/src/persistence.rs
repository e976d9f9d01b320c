//! Save records, the local save file, and the remote mirror.
//!
//! Persistence is fire-and-forget from the session's point of view: a failed
//! write is reported to the learner log and never rolls back in-memory state.
//! The local save is authoritative; the remote mirror is keyed by user id
//! and reconciled once, on sign-in.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::SkillLevel;
use crate::error::{Result, SingularityError};
use crate::session::{MessageType, Session, UserProfile};
use crate::tutorial::TutorialPhase;

/// Logged when sign-in sync starts.
pub const SYNC_STARTED_MESSAGE: &str = "SYNCING WITH GLOBAL DEFENSE GRID (CLOUD)...";

/// Logged when the remote mirror cannot be reached.
pub const SYNC_FAILED_MESSAGE: &str = "CLOUD SYNC FAILED. USING LOCAL CACHE.";

// ============================================================================
// SaveRecord
// ============================================================================

/// The persisted subset of a session.
///
/// Every field is optional on load so records written by older builds
/// still restore: a missing `maxReachedLevel` falls back to the current
/// level and missing achievements to none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveRecord {
    /// Level on screen when saved.
    pub current_level_id: u32,
    /// Highest unlocked level, absent in legacy records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_reached_level: Option<u32>,
    /// Accumulated XP.
    pub xp: u32,
    /// Skill tier.
    pub skill_level: SkillLevel,
    /// Editor contents.
    pub code: String,
    /// Auto-solves used on the saved level.
    pub hints_used: u32,
    /// Whether the placement quiz is done.
    pub assessment_complete: bool,
    /// Scripted tutorial phase.
    pub tutorial_phase: TutorialPhase,
    /// Unlocked achievement ids.
    pub unlocked_achievements: Vec<String>,
    /// Signed-in learner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

impl Default for SaveRecord {
    fn default() -> Self {
        Self {
            current_level_id: 1,
            max_reached_level: None,
            xp: 0,
            skill_level: SkillLevel::default(),
            code: String::new(),
            hints_used: 0,
            assessment_complete: false,
            tutorial_phase: TutorialPhase::default(),
            unlocked_achievements: Vec::new(),
            user: None,
        }
    }
}

impl SaveRecord {
    /// High-water mark, falling back to the current level for legacy records.
    ///
    /// # Examples
    ///
    /// ```
    /// use singularity_engine::SaveRecord;
    ///
    /// let legacy: SaveRecord = serde_json::from_str(r#"{"currentLevelId": 7}"#).unwrap();
    /// assert_eq!(legacy.max_reached(), 7);
    /// assert!(legacy.unlocked_achievements.is_empty());
    /// ```
    #[must_use]
    pub fn max_reached(&self) -> u32 {
        self.max_reached_level
            .unwrap_or(self.current_level_id)
            .max(1)
    }
}

// ============================================================================
// LocalStore
// ============================================================================

/// The local save file.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write never leaves a truncated save behind. Clones share one
/// write lock, so a save and a clear never interleave.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
    writes: Arc<Mutex<()>>,
}

impl LocalStore {
    /// Creates a store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writes: Arc::new(Mutex::new(())),
        }
    }

    /// Path of the save file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the save.
    ///
    /// Returns `Ok(None)` if there is no save yet.
    ///
    /// # Errors
    ///
    /// Returns `SingularityError::SaveCorrupted` if the file is not a valid
    /// record, and `SingularityError::PersistenceError` if it cannot be read.
    pub async fn load(&self) -> Result<Option<SaveRecord>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SingularityError::persistence(
                    &self.path,
                    format!("failed to read save: {e}"),
                ));
            }
        };
        let record = serde_json::from_str(&contents)
            .map_err(|e| SingularityError::save_corrupted(&self.path, e.to_string()))?;
        Ok(Some(record))
    }

    /// Writes the save.
    pub async fn save(&self, record: &SaveRecord) -> Result<()> {
        let _guard = self.writes.lock().await;
        self.write(record).await
    }

    /// Writes the save only if `session` has not been reset since the
    /// record was taken at `generation`.
    ///
    /// The check and the write happen under the write lock, so a reset
    /// followed by [`LocalStore::clear`] can never be undone by a write
    /// already in flight. Returns whether the record was written.
    pub async fn save_if_current(
        &self,
        record: &SaveRecord,
        session: &Mutex<Session>,
        generation: u64,
    ) -> Result<bool> {
        let _guard = self.writes.lock().await;
        if session.lock().await.save_generation() != generation {
            debug!(path = %self.path.display(), "Dropped save taken before reset");
            return Ok(false);
        }
        self.write(record).await?;
        Ok(true)
    }

    async fn write(&self, record: &SaveRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    SingularityError::persistence(
                        &self.path,
                        format!("cannot create directory: {e}"),
                    )
                })?;
            }
        }

        let json = serde_json::to_string_pretty(record)?;
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, json)
            .await
            .map_err(|e| SingularityError::persistence(&temp_path, e.to_string()))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| SingularityError::persistence(&self.path, e.to_string()))?;

        debug!(path = %self.path.display(), level_id = record.current_level_id, "Save written");
        Ok(())
    }

    /// Deletes the save. A missing file is not an error.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.writes.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SingularityError::persistence(&self.path, e.to_string())),
        }
    }
}

// ============================================================================
// RemoteStore
// ============================================================================

/// A remote mirror of save records keyed by user id.
pub trait RemoteStore: Send + Sync + std::fmt::Debug {
    /// Fetches the record for `user_id`, if one exists.
    fn load<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<SaveRecord>>>;

    /// Stores `record` for `user_id`, replacing any previous one.
    fn save<'a>(&'a self, user_id: &'a str, record: &'a SaveRecord) -> BoxFuture<'a, Result<()>>;
}

/// A remote mirror backed by a directory of `<user_id>.json` files.
#[derive(Debug, Clone)]
pub struct DirectoryRemoteStore {
    dir: PathBuf,
}

impl DirectoryRemoteStore {
    /// Creates a mirror rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn store_for(&self, user_id: &str) -> Result<LocalStore> {
        let valid = !user_id.is_empty()
            && user_id
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
            && !user_id.starts_with('.');
        if !valid {
            return Err(SingularityError::remote_sync(
                user_id,
                "user id is not a valid record name",
            ));
        }
        Ok(LocalStore::new(self.dir.join(format!("{user_id}.json"))))
    }
}

impl RemoteStore for DirectoryRemoteStore {
    fn load<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<SaveRecord>>> {
        Box::pin(async move {
            self.store_for(user_id)?
                .load()
                .await
                .map_err(|e| SingularityError::remote_sync(user_id, e.to_string()))
        })
    }

    fn save<'a>(&'a self, user_id: &'a str, record: &'a SaveRecord) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.store_for(user_id)?
                .save(record)
                .await
                .map_err(|e| SingularityError::remote_sync(user_id, e.to_string()))
        })
    }
}

/// An in-process remote mirror that can be switched offline.
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    records: Mutex<HashMap<String, SaveRecord>>,
    offline: AtomicBool,
}

impl MemoryRemoteStore {
    /// Creates an empty, online mirror.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail, or succeed again.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Returns the stored record for `user_id`.
    pub async fn get(&self, user_id: &str) -> Option<SaveRecord> {
        self.records.lock().await.get(user_id).cloned()
    }

    /// Stores a record directly, bypassing the offline switch.
    pub async fn insert(&self, user_id: impl Into<String>, record: SaveRecord) {
        self.records.lock().await.insert(user_id.into(), record);
    }

    fn check_online(&self, user_id: &str) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SingularityError::remote_sync(user_id, "mirror is offline"));
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemoteStore {
    fn load<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<SaveRecord>>> {
        Box::pin(async move {
            self.check_online(user_id)?;
            Ok(self.get(user_id).await)
        })
    }

    fn save<'a>(&'a self, user_id: &'a str, record: &'a SaveRecord) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.check_online(user_id)?;
            self.insert(user_id, record.clone()).await;
            Ok(())
        })
    }
}

// ============================================================================
// Sync
// ============================================================================

/// What sign-in sync did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The remote record was ahead and replaced the session's progress.
    Restored,
    /// The local progress overwrote an older remote record.
    Updated,
    /// No remote record existed; one was created.
    Created,
    /// The mirror failed; the session keeps its local progress.
    Failed,
}

/// Reconciles a freshly signed-in session with the remote mirror.
///
/// A remote record strictly ahead (by high-water mark) is adopted;
/// otherwise local progress is pushed. The session lock is not held while
/// the mirror is contacted.
pub async fn sync_on_sign_in(
    session: &Mutex<Session>,
    remote: &dyn RemoteStore,
) -> Result<SyncOutcome> {
    let (user_id, local) = {
        let mut session = session.lock().await;
        let Some(user) = session.state().user.clone() else {
            return Err(SingularityError::invalid_transition(
                "signed out",
                "cloud sync",
            ));
        };
        session.log(MessageType::System, SYNC_STARTED_MESSAGE);
        (user.id, session.to_save_record())
    };

    let outcome = match remote.load(&user_id).await {
        Ok(Some(record)) if record.max_reached() > local.max_reached() => {
            let remote_max = record.max_reached();
            session.lock().await.adopt_remote(record)?;
            info!(user_id = %user_id, remote_max, "Adopted remote progress");
            return Ok(SyncOutcome::Restored);
        }
        Ok(existing) => match remote.save(&user_id, &local).await {
            Ok(()) if existing.is_some() => SyncOutcome::Updated,
            Ok(()) => SyncOutcome::Created,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Remote save failed");
                SyncOutcome::Failed
            }
        },
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Remote load failed");
            SyncOutcome::Failed
        }
    };

    let mut session = session.lock().await;
    match outcome {
        SyncOutcome::Updated => session.log(MessageType::Success, "CLOUD RECORD UPDATED."),
        SyncOutcome::Created => {
            session.log(MessageType::Success, "NEW PILOT RECORD CREATED IN CLOUD.");
        }
        SyncOutcome::Failed | SyncOutcome::Restored => {
            session.log(MessageType::Error, SYNC_FAILED_MESSAGE);
        }
    }
    Ok(outcome)
}

/// Writes the session's progress if it changed since the last write.
///
/// The local save is written first, then the remote mirror if a learner is
/// signed in. A record taken before a full reset is dropped. A failed local
/// write is logged and retried on the next call; the session keeps running
/// either way. Returns `true` if a record was taken.
pub async fn persist(
    session: &Mutex<Session>,
    local: Option<&LocalStore>,
    remote: Option<&dyn RemoteStore>,
) -> bool {
    let (record, generation) = {
        let mut session = session.lock().await;
        let Some(record) = session.take_save_request() else {
            return false;
        };
        (record, session.save_generation())
    };

    if let Some(local) = local {
        match local.save_if_current(&record, session, generation).await {
            Ok(true) => {}
            Ok(false) => return true,
            Err(e) => {
                warn!(error = %e, "Local save failed");
                let mut session = session.lock().await;
                session.mark_unsaved();
                session.log(MessageType::Error, "LOCAL SAVE ERROR.");
            }
        }
    }

    if let (Some(remote), Some(user)) = (remote, record.user.as_ref()) {
        if let Err(e) = remote.save(&user.id, &record).await {
            warn!(user_id = %user.id, error = %e, "Remote save failed");
        }
    }
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::Config;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("singularity-test-{}", std::process::id()))
            .join(name)
    }

    fn user(id: &str) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            avatar_url: None,
        }
    }

    fn session_at(level: u32, max: u32) -> Mutex<Session> {
        let record = SaveRecord {
            current_level_id: level,
            max_reached_level: Some(max),
            assessment_complete: true,
            ..SaveRecord::default()
        };
        let session =
            Session::restore(Config::default(), Catalog::shipped().unwrap(), record).unwrap();
        Mutex::new(session)
    }

    fn logged(session: &Session, needle: &str) -> bool {
        session
            .state()
            .logs
            .iter()
            .any(|entry| entry.content == needle)
    }

    #[test]
    fn test_save_record_shape() {
        let record = SaveRecord {
            current_level_id: 3,
            max_reached_level: Some(5),
            xp: 240,
            skill_level: SkillLevel::Intermediate,
            code: "print(1)".to_string(),
            hints_used: 1,
            assessment_complete: true,
            tutorial_phase: TutorialPhase::Standard,
            unlocked_achievements: vec!["first_steps".to_string()],
            user: None,
        };
        insta::assert_json_snapshot!(record, @r###"
        {
          "currentLevelId": 3,
          "maxReachedLevel": 5,
          "xp": 240,
          "skillLevel": "intermediate",
          "code": "print(1)",
          "hintsUsed": 1,
          "assessmentComplete": true,
          "tutorialPhase": "NONE",
          "unlockedAchievements": [
            "first_steps"
          ]
        }
        "###);
    }

    #[test]
    fn test_legacy_record_defaults() {
        let record: SaveRecord =
            serde_json::from_str(r#"{"currentLevelId": 4, "xp": 90, "skillLevel": "ADVANCED"}"#)
                .unwrap();
        assert_eq!(record.max_reached(), 4);
        assert_eq!(record.skill_level, SkillLevel::Advanced);
        assert!(record.unlocked_achievements.is_empty());
        assert_eq!(record.tutorial_phase, TutorialPhase::Standard);

        let empty: SaveRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.current_level_id, 1);
        assert_eq!(empty.max_reached(), 1);
    }

    #[tokio::test]
    async fn test_local_store_round_trip() {
        let store = LocalStore::new(temp_path("round-trip/save.json"));
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());

        let record = SaveRecord {
            current_level_id: 6,
            max_reached_level: Some(8),
            ..SaveRecord::default()
        };
        store.save(&record).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(record));
        assert!(!store.path().with_extension("json.tmp").exists());

        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupted_save_is_reported() {
        let path = temp_path("corrupted/save.json");
        tokio::fs::create_dir_all(path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let err = LocalStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, SingularityError::SaveCorrupted { .. }));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_directory_remote_rejects_bad_ids() {
        let remote = DirectoryRemoteStore::new(temp_path("remote-ids"));
        assert!(remote.load("../escape").await.is_err());
        assert!(remote.load("").await.is_err());
        assert!(remote.load("pilot-7").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sync_creates_remote_record() {
        let session = session_at(3, 3);
        session.lock().await.sign_in(user("u1"));
        let remote = MemoryRemoteStore::new();

        let outcome = sync_on_sign_in(&session, &remote).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Created);
        assert_eq!(remote.get("u1").await.unwrap().max_reached(), 3);

        let session = session.lock().await;
        assert!(logged(&session, SYNC_STARTED_MESSAGE));
        assert!(logged(&session, "NEW PILOT RECORD CREATED IN CLOUD."));
    }

    #[tokio::test]
    async fn test_sync_pushes_when_local_is_ahead() {
        let session = session_at(9, 9);
        session.lock().await.sign_in(user("u1"));
        let remote = MemoryRemoteStore::new();
        remote
            .insert(
                "u1",
                SaveRecord {
                    current_level_id: 9,
                    max_reached_level: Some(9),
                    ..SaveRecord::default()
                },
            )
            .await;

        let outcome = sync_on_sign_in(&session, &remote).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Updated);
        assert!(logged(&*session.lock().await, "CLOUD RECORD UPDATED."));
    }

    #[tokio::test]
    async fn test_sync_adopts_remote_when_ahead() {
        let session = session_at(2, 2);
        session.lock().await.sign_in(user("u1"));
        let remote = MemoryRemoteStore::new();
        remote
            .insert(
                "u1",
                SaveRecord {
                    current_level_id: 14,
                    max_reached_level: Some(15),
                    xp: 1200,
                    ..SaveRecord::default()
                },
            )
            .await;

        let outcome = sync_on_sign_in(&session, &remote).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Restored);

        let session = session.lock().await;
        let state = session.state();
        assert_eq!(state.current_level_id, 14);
        assert_eq!(state.max_reached_level, 15);
        assert_eq!(state.xp, 1200);
        assert_eq!(state.user.as_ref().map(|u| u.id.as_str()), Some("u1"));
        assert!(logged(&session, "DATA RESTORED FROM CLOUD. SECTOR 15 UNLOCKED."));
    }

    #[tokio::test]
    async fn test_sync_failure_keeps_local_state() {
        let session = session_at(4, 4);
        session.lock().await.sign_in(user("u1"));
        let remote = MemoryRemoteStore::new();
        remote.set_offline(true);

        let outcome = sync_on_sign_in(&session, &remote).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Failed);

        let session = session.lock().await;
        assert_eq!(session.state().current_level_id, 4);
        assert!(logged(&session, SYNC_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn test_sync_requires_user() {
        let session = session_at(1, 1);
        let remote = MemoryRemoteStore::new();
        assert!(sync_on_sign_in(&session, &remote).await.is_err());
    }

    #[tokio::test]
    async fn test_persist_writes_local_and_remote() {
        let session = session_at(5, 5);
        session.lock().await.sign_in(user("u2"));
        let local = LocalStore::new(temp_path("persist/save.json"));
        let remote = MemoryRemoteStore::new();

        assert!(persist(&session, Some(&local), Some(&remote)).await);
        assert_eq!(local.load().await.unwrap().unwrap().current_level_id, 5);
        assert_eq!(remote.get("u2").await.unwrap().current_level_id, 5);

        assert!(!persist(&session, Some(&local), Some(&remote)).await);
        local.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_record_taken_before_reset_is_not_written() {
        let session = session_at(6, 6);
        let local = LocalStore::new(temp_path("reset-race/save.json"));
        let (record, generation) = {
            let mut session = session.lock().await;
            let record = session.take_save_request().unwrap();
            (record, session.save_generation())
        };

        session.lock().await.reset_progress().unwrap();
        local.clear().await.unwrap();

        assert!(!local
            .save_if_current(&record, &session, generation)
            .await
            .unwrap());
        assert!(local.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persist_after_reset_leaves_no_save() {
        let session = session_at(6, 6);
        let local = LocalStore::new(temp_path("reset-persist/save.json"));
        assert!(persist(&session, Some(&local), None).await);
        assert!(local.load().await.unwrap().is_some());

        session.lock().await.reset_progress().unwrap();
        local.clear().await.unwrap();
        assert!(!persist(&session, Some(&local), None).await);
        assert!(local.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_local_write_is_retried() {
        let blocker = temp_path("blocked-dir");
        tokio::fs::create_dir_all(blocker.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&blocker, "not a directory").await.unwrap();
        let local = LocalStore::new(blocker.join("save.json"));
        let session = session_at(4, 4);

        assert!(persist(&session, Some(&local), None).await);
        assert!(logged(&*session.lock().await, "LOCAL SAVE ERROR."));
        assert!(session.lock().await.take_save_request().is_some());
    }
}
