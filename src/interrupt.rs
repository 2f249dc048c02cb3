// SPDX-License-Identifier: Apache-2.0

//! Shared access to interrupt-owned state, plus the non-reentrant tick guard.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::error::Error;

/// State shared between interrupt handlers and the foreground loop.
///
/// Every access runs inside a critical section, so the timer tick, the conversion-complete
/// handler and the foreground menu never interleave. Entering again while the state is already
/// borrowed is refused with [`Error::TickReentered`] instead of panicking.
pub struct Shared<T>(Mutex<RefCell<Option<T>>>);

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Shared<T> {
    /// Empty slot, usable in a `static`
    pub const fn new() -> Self {
        Self(Mutex::new(RefCell::new(None)))
    }

    /// Place the state, returning whatever was installed before
    pub fn install(&self, value: T) -> Option<T> {
        debug!("critical_section: install shared state");
        critical_section::with(|cs| self.0.borrow(cs).replace(Some(value)))
    }

    /// Run `f` with exclusive access. Returns `Ok(None)` if nothing has been installed yet.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<Option<R>, Error> {
        critical_section::with(|cs| {
            let mut slot = self
                .0
                .borrow(cs)
                .try_borrow_mut()
                .map_err(|_| Error::TickReentered)?;
            Ok(slot.as_mut().map(f))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_is_a_no_op() {
        let shared: Shared<u32> = Shared::new();
        assert_eq!(shared.with(|value| *value += 1), Ok(None));
    }

    #[test]
    fn install_then_mutate() {
        let shared = Shared::new();
        assert_eq!(shared.install(1u32), None);
        let bumped = shared.with(|value| {
            *value += 1;
            *value
        });
        assert_eq!(bumped, Ok(Some(2)));
        assert_eq!(shared.install(7), Some(2));
    }

    #[test]
    fn reentry_is_refused() {
        static SHARED: Shared<u32> = Shared::new();
        SHARED.install(0);
        let inner = SHARED.with(|_| SHARED.with(|value| *value += 1));
        assert_eq!(inner, Ok(Some(Err(Error::TickReentered))));
        assert_eq!(SHARED.with(|value| *value), Ok(Some(0)));
    }
}
