use log::debug;

use crate::types::Millis;

/// Mutual exclusion for tree growth cycles.
///
/// The lock is acquired when a growth cycle starts. The caller then arms a
/// release deadline equal to the cycle's total duration, and the driving
/// clock frees the lock once that deadline passes. A held lock with no
/// deadline stays held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderLock {
    state: Option<Option<Millis>>,
}

impl BuilderLock {
    pub fn is_held(&self) -> bool {
        self.state.is_some()
    }

    /// Takes the lock.
    ///
    /// ### Returns
    /// `false` if it was already held.
    pub fn try_acquire(&mut self) -> bool {
        if self.is_held() {
            return false;
        }
        self.state = Some(None);
        true
    }

    /// Arms the release deadline of a held lock.
    ///
    /// Ignored if the lock is free or already has a deadline, so the lock
    /// is released exactly once per acquisition.
    pub fn release_at(&mut self, at: Millis) {
        if let Some(deadline) = self.state.as_mut()
            && deadline.is_none()
        {
            *deadline = Some(at);
        }
    }

    /// Deadline of the current hold, if armed.
    pub fn deadline(&self) -> Option<Millis> {
        self.state.flatten()
    }

    /// Frees the lock if its deadline is at or before `now`.
    ///
    /// ### Returns
    /// `true` if this call released the lock.
    pub fn release_if_due(&mut self, now: Millis) -> bool {
        match self.deadline() {
            Some(at) if at <= now => {
                self.state = None;
                debug!("builder lock released at {now} ms (due {at} ms)");
                true
            }
            _ => false,
        }
    }
}
