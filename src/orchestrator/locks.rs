//! Directory-scoped mutual exclusion for patch operations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

type Registry = Arc<Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>>;

/// One async lock per installation directory.
///
/// In-process only. Two engines in different processes do not see each
/// other's locks. An entry lives only while a guard or a waiter holds it.
#[derive(Clone, Default)]
pub struct DirectoryLocks {
    locks: Registry,
}

/// Exclusive access to one directory, released on drop.
pub struct DirectoryGuard {
    guard: Option<OwnedMutexGuard<()>>,
    registry: Registry,
    key: PathBuf,
}

impl Drop for DirectoryGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        // Waiters clone the entry under this mutex, so a count of one is final
        if locks.get(&self.key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&self.key);
        }
    }
}

impl DirectoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `dir`. Released when the guard drops.
    pub async fn acquire(&self, dir: &Path) -> DirectoryGuard {
        let key = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries left behind by waiters that gave up
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(key.clone()).or_default().clone()
        };
        DirectoryGuard {
            guard: Some(lock.lock_owned().await),
            registry: Arc::clone(&self.locks),
            key,
        }
    }

    /// Number of directories currently held or waited on.
    pub fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether `dir` is currently locked.
    pub fn is_locked(&self, dir: &Path) -> bool {
        let key = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .get(&key)
            .map(|lock| lock.try_lock().is_err())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_lock_is_scoped_to_directory() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let locks = DirectoryLocks::new();

        let guard = locks.acquire(a.path()).await;
        assert!(locks.is_locked(a.path()));
        assert!(!locks.is_locked(b.path()));

        // A different directory is not blocked
        let _other = locks.acquire(b.path()).await;

        drop(guard);
        assert!(!locks.is_locked(a.path()));
    }

    #[tokio::test]
    async fn test_second_acquire_waits_for_release() {
        let dir = TempDir::new().unwrap();
        let locks = DirectoryLocks::new();

        let guard = locks.acquire(dir.path()).await;
        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            locks.acquire(dir.path()),
        )
        .await;
        assert!(pending.is_err());

        drop(guard);
        let _guard = locks.acquire(dir.path()).await;
    }

    #[tokio::test]
    async fn test_released_directories_leave_the_registry() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let locks = DirectoryLocks::new();

        let first = locks.acquire(a.path()).await;
        let second = locks.acquire(b.path()).await;
        assert_eq!(locks.tracked(), 2);

        drop(first);
        assert_eq!(locks.tracked(), 1);
        drop(second);
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn test_entry_survives_while_a_waiter_holds_it() {
        let dir = TempDir::new().unwrap();
        let locks = DirectoryLocks::new();

        let guard = locks.acquire(dir.path()).await;
        let waiter = {
            let locks = locks.clone();
            let path = dir.path().to_path_buf();
            tokio::spawn(async move {
                let _guard = locks.acquire(&path).await;
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        // The waiter still references the lock, so it stays registered
        drop(guard);
        assert_eq!(locks.tracked(), 1);
        waiter.await.unwrap();
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_wait_does_not_leak_an_entry() {
        let dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let locks = DirectoryLocks::new();

        let guard = locks.acquire(dir.path()).await;
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            locks.acquire(dir.path()),
        )
        .await;
        drop(guard);

        let _other = locks.acquire(other.path()).await;
        assert_eq!(locks.tracked(), 1);
    }
}
