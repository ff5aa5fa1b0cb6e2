// zcl-campaign/src/lock.rs
// ============================================================================
// Module: Campaign Lock
// Description: Exclusive directory-based lock for a campaign run (§4.J step 1).
// Purpose: Guarantee at most one in-flight run per campaign id, releasing
//          automatically on drop so a panicking or erroring run never leaves
//          a campaign wedged.
// Dependencies: std, zcl-core, zcl-evidence
// ============================================================================

//! ## Overview
//! `mkdir <outRoot>/campaigns/<id>/campaign.lock/` is the lock: creation
//! fails with [`std::io::ErrorKind::AlreadyExists`] if another run holds it,
//! which this module surfaces as [`crate::error::CampaignError::LockHeld`]
//! without touching the existing lock directory (never race the holder by
//! writing into it).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use zcl_core::Timestamp;
use zcl_core::ids::CampaignId;
use zcl_core::layout;
use zcl_evidence::EvidenceRoot;

use crate::error::CampaignError;

// ============================================================================
// SECTION: Lock Owner
// ============================================================================

/// Identifies the process holding a campaign lock, written as `owner.json`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct LockOwner {
    pid: u32,
    started_at: Timestamp,
}

// ============================================================================
// SECTION: Lock Guard
// ============================================================================

/// RAII guard holding a campaign's lock directory. Dropping it releases the
/// lock unconditionally, so an error or panic mid-run never leaves a
/// campaign permanently locked.
pub struct LockGuard {
    lock_dir: PathBuf,
    released: bool,
}

impl LockGuard {
    /// Acquires the lock for `campaign_id` under `out_root`.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignError::LockHeld`] if the lock directory already
    /// exists, or [`CampaignError::Io`]/[`CampaignError::Evidence`] for any
    /// other filesystem failure.
    pub fn acquire(
        out_root: &Path,
        campaign_id: &CampaignId,
        now: Timestamp,
    ) -> Result<Self, CampaignError> {
        let lock_dir = layout::campaign_lock_dir(out_root, campaign_id);
        if let Some(parent) = lock_dir.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match std::fs::create_dir(&lock_dir) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(CampaignError::LockHeld(lock_dir));
            }
            Err(err) => return Err(CampaignError::Io(err)),
        }

        let owner = LockOwner { pid: std::process::id(), started_at: now };
        let root = EvidenceRoot::open_or_create(&lock_dir)?;
        root.write_json_atomic(Path::new("owner.json"), &owner)?;

        Ok(Self { lock_dir, released: false })
    }

    /// Releases the lock early, returning any filesystem error rather than
    /// deferring it to `Drop`.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignError::Io`] if the lock directory cannot be removed.
    pub fn release(mut self) -> Result<(), CampaignError> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> Result<(), CampaignError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        match std::fs::remove_dir_all(&self.lock_dir) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(CampaignError::Io(err)),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = self.release_inner();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use tempfile::tempdir;
    use zcl_core::Timestamp;
    use zcl_core::ids::CampaignId;

    use super::LockGuard;

    #[test]
    fn a_second_acquisition_is_rejected_while_the_first_is_held() {
        let dir = tempdir().expect("tempdir");
        let campaign_id = CampaignId::new("cmp-int").expect("valid id");
        let guard = LockGuard::acquire(dir.path(), &campaign_id, Timestamp::from_unix_millis(0))
            .expect("first acquire succeeds");
        let err = LockGuard::acquire(dir.path(), &campaign_id, Timestamp::from_unix_millis(1))
            .expect_err("second acquire fails");
        assert!(matches!(err, super::CampaignError::LockHeld(_)));
        drop(guard);
    }

    #[test]
    fn releasing_lets_a_later_acquisition_succeed() {
        let dir = tempdir().expect("tempdir");
        let campaign_id = CampaignId::new("cmp-int").expect("valid id");
        let guard = LockGuard::acquire(dir.path(), &campaign_id, Timestamp::from_unix_millis(0))
            .expect("first acquire succeeds");
        guard.release().expect("release ok");
        LockGuard::acquire(dir.path(), &campaign_id, Timestamp::from_unix_millis(1))
            .expect("second acquire succeeds after release");
    }

    #[test]
    fn dropping_without_explicit_release_still_releases() {
        let dir = tempdir().expect("tempdir");
        let campaign_id = CampaignId::new("cmp-int").expect("valid id");
        let guard = LockGuard::acquire(dir.path(), &campaign_id, Timestamp::from_unix_millis(0))
            .expect("first acquire succeeds");
        drop(guard);
        LockGuard::acquire(dir.path(), &campaign_id, Timestamp::from_unix_millis(1))
            .expect("second acquire succeeds after drop");
    }
}
