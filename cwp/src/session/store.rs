//! File-backed session store.
//!
//! Each session is stored as `<sessionId>.json` in the sessions directory.
//! Writes go to a temp file in the same directory and are renamed into
//! place, so a crash never leaves a half-written record. Mutations hold an
//! exclusive lock on `.locks/<sessionId>.lock` for their read-modify-write.
//!
//! Lock files are kept for the lifetime of the directory. Deleting one while
//! another process holds it would let a third process lock a fresh inode and
//! race the holder.

use super::types::{GrantSessionInput, SessionState};
use crate::config::sessions_dir;
use crate::error::{CwpError, CwpResult};
use crate::protocol::UsageInput;
use chrono::Utc;
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Subdirectory holding the per-session lock files.
const LOCKS_DIR_NAME: &str = ".locks";

pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at `<config dir>/sessions`.
    pub fn from_config_dir(config_dir: &Path) -> Self {
        Self::new(sessions_dir(config_dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create and persist a new session with a fresh random id.
    pub fn grant(&self, input: GrantSessionInput) -> CwpResult<SessionState> {
        input.validate()?;

        let session = SessionState {
            session_id: hex::encode(rand::random::<[u8; 16]>()),
            account: input.account,
            chain: input.chain,
            permissions: input.permissions,
            expiry: input.expiry,
            revoked: false,
            call_counts: BTreeMap::new(),
            total_value: BTreeMap::new(),
        };

        self.write(&session)?;
        info!(
            session_id = %session.session_id,
            account = %session.account,
            chain = %session.chain,
            "session granted"
        );
        Ok(session)
    }

    pub fn revoke(&self, session_id: &str) -> CwpResult<SessionState> {
        let session = self.update(session_id, |session| {
            session.revoked = true;
            Ok(())
        })?;
        info!(session_id = %session_id, "session revoked");
        Ok(session)
    }

    /// Read a session; any read or parse failure is `SessionNotFound`.
    pub fn load(&self, session_id: &str) -> CwpResult<SessionState> {
        let path = self.session_path(session_id)?;
        let not_found = || CwpError::SessionNotFound(session_id.to_string());

        let content = std::fs::read_to_string(&path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "session file unreadable");
            not_found()
        })?;
        serde_json::from_str(&content).map_err(|e| {
            debug!(path = %path.display(), error = %e, "session file corrupted");
            not_found()
        })
    }

    /// Check `operation` against the stored grant at the current time.
    pub fn validate(
        &self,
        session_id: &str,
        operation: &str,
        input: Option<&UsageInput>,
    ) -> CwpResult<SessionState> {
        self.validate_at(session_id, operation, input, Utc::now().timestamp_millis())
    }

    pub fn validate_at(
        &self,
        session_id: &str,
        operation: &str,
        input: Option<&UsageInput>,
        now_ms: i64,
    ) -> CwpResult<SessionState> {
        let session = self.load(session_id)?;
        session.check(operation, input, now_ms)?;
        Ok(session)
    }

    /// Count a completed call and accumulate its transaction value.
    pub fn record_usage(
        &self,
        session_id: &str,
        operation: &str,
        input: Option<&UsageInput>,
    ) -> CwpResult<SessionState> {
        let session = self.update(session_id, |session| session.record(operation, input))?;
        debug!(
            session_id = %session_id,
            operation = %operation,
            calls = session.call_count(operation),
            "session usage recorded"
        );
        Ok(session)
    }

    fn update<F>(&self, session_id: &str, apply: F) -> CwpResult<SessionState>
    where
        F: FnOnce(&mut SessionState) -> CwpResult<()>,
    {
        // Fail before creating a lock file for an unknown id.
        self.load(session_id)?;

        let _lock = self.lock(session_id)?;
        let mut session = self.load(session_id)?;
        apply(&mut session)?;
        self.write(&session)?;
        Ok(session)
    }

    /// Exclusive advisory lock, released when the returned file is dropped.
    fn lock(&self, session_id: &str) -> CwpResult<File> {
        let locks = self.dir.join(LOCKS_DIR_NAME);
        std::fs::create_dir_all(&locks)?;
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(locks.join(format!("{}.lock", session_id)))?;
        file.lock_exclusive()?;
        Ok(file)
    }

    fn write(&self, session: &SessionState) -> CwpResult<()> {
        self.ensure_dir()?;
        let path = self.session_path(&session.session_id)?;
        let content = serde_json::to_string_pretty(session)?;

        // NamedTempFile is created 0600.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| CwpError::Io(e.error))?;
        Ok(())
    }

    fn ensure_dir(&self) -> CwpResult<()> {
        if self.dir.is_dir() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.dir, std::fs::Permissions::from_mode(0o700))?;
        }
        Ok(())
    }

    fn session_path(&self, session_id: &str) -> CwpResult<PathBuf> {
        if !is_session_id(session_id) {
            return Err(CwpError::SessionNotFound(session_id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", session_id)))
    }
}

/// 32 lowercase hex characters.
pub fn is_session_id(candidate: &str) -> bool {
    candidate.len() == 32 && candidate.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::Permission;
    use tempfile::tempdir;

    fn grant_input() -> GrantSessionInput {
        GrantSessionInput {
            account: "0x1234567890abcdef1234567890abcdef12345678".into(),
            chain: "eip155:1".into(),
            permissions: vec![Permission::new("sign-message")],
            expiry: Utc::now().timestamp_millis() + 3_600_000,
        }
    }

    #[test]
    fn ids_outside_the_format_are_not_found() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let upper = "A".repeat(32);
        for id in ["nonexistent", "../../etc/passwd", upper.as_str()] {
            let err = store.load(id).unwrap_err();
            assert!(matches!(err, CwpError::SessionNotFound(_)), "{}", id);
        }
    }

    #[test]
    fn grant_creates_private_directory_and_file() {
        let dir = tempdir().unwrap();
        let store = SessionStore::from_config_dir(dir.path());
        let session = store.grant(grant_input()).unwrap();

        assert!(is_session_id(&session.session_id));
        let file = store.dir().join(format!("{}.json", session.session_id));
        assert!(file.is_file());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&file).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
            let dir_mode = std::fs::metadata(store.dir()).unwrap().permissions().mode() & 0o777;
            assert_eq!(dir_mode, 0o700);
        }
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = store.grant(grant_input()).unwrap();
        store.record_usage(&session.session_id, "sign-message", None).unwrap();
        store.revoke(&session.session_id).unwrap();

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![".locks".to_string(), format!("{}.json", session.session_id)]);
        assert!(dir
            .path()
            .join(LOCKS_DIR_NAME)
            .join(format!("{}.lock", session.session_id))
            .is_file());
    }

    #[test]
    fn revoke_unknown_session_leaves_no_lock() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let err = store.revoke(&"ab".repeat(16)).unwrap_err();
        assert!(matches!(err, CwpError::SessionNotFound(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
