//! Process environment helpers shared by integration test binaries.

use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, PoisonError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// A requested variable change: `None` removes the variable.
pub type EnvChange = (OsString, Option<OsString>);

/// Applies environment changes and restores the prior values on drop.
///
/// Guards serialise on a process-wide lock, so only one may be live at a time
/// on any thread.
pub struct EnvVarGuard {
    restore: Vec<EnvChange>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    /// Applies `changes` in order.
    pub fn set_many(changes: &[EnvChange]) -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let restore = changes
            .iter()
            .map(|(key, value)| {
                let previous = env::var_os(key);
                apply(key, value.as_ref());
                (key.clone(), previous)
            })
            .collect();
        Self {
            restore,
            _lock: lock,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.restore.drain(..).rev() {
            apply(&key, value.as_ref());
        }
    }
}

fn apply(key: &OsString, value: Option<&OsString>) {
    // SAFETY: ENV_LOCK is held by the calling guard for every mutation.
    unsafe {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}
