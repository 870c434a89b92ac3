//! Hook registry shared by a device driver and its packet observers.
//!
//! One [`IrqSpinLock`] guards both direction lists together with their
//! statistics. Register and unregister hold it only for the list mutation;
//! dispatch holds it for the whole traversal, so a pass always sees one
//! consistent list and a concurrent unregister either fully precedes or
//! fully follows it.
//!
//! Nothing is logged while the lock is held.

use crate::error::HookError;
use crate::hooks::direction::Direction;
use crate::hooks::entry::{HookContext, HookEntry, HookFn, HookId};
use crate::hooks::list::{HookList, PushError};
use crate::hooks::lock::{InterruptControl, IrqSpinLock, NoInterrupts};
use crate::hooks::stats::{HookStatistics, HookStatisticsSnapshot};
use log::{debug, warn};
use std::fmt;

/// State protected by the registry lock.
struct HookLists<D, B> {
    rx: HookList<D, B>,
    tx: HookList<D, B>,
    stats: HookStatistics,
}

impl<D, B> HookLists<D, B> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            rx: HookList::with_capacity(capacity),
            tx: HookList::with_capacity(capacity),
            stats: HookStatistics::default(),
        }
    }

    fn list(&self, direction: Direction) -> &HookList<D, B> {
        match direction {
            Direction::Rx => &self.rx,
            Direction::Tx => &self.tx,
        }
    }

    fn list_mut(&mut self, direction: Direction) -> &mut HookList<D, B> {
        match direction {
            Direction::Rx => &mut self.rx,
            Direction::Tx => &mut self.tx,
        }
    }
}

/// Outcome of one locked registration attempt.
enum Attempt<D, B> {
    Done(Result<(), HookError>),
    /// The list is full; retry with storage for `capacity` entries.
    Grow { entry: HookEntry<D, B>, capacity: usize },
}

/// RX/TX packet hook registry.
///
/// `D` is the device handle and `B` the packet buffer type handed to every
/// hook. `I` selects how interrupts are masked around critical sections;
/// the default does nothing, which is correct for hosted processes.
///
/// The registry is an ordinary value: create it when the driver context is
/// set up and share it (typically through an `Arc`) with every component
/// that registers hooks or dispatches packets.
///
/// # Hook contract
///
/// Dispatch runs hooks with the lock held. A hook therefore must not block,
/// sleep or wait on I/O, and must not call [`register`](Self::register) or
/// [`unregister`](Self::unregister) on this registry: the lock is not
/// reentrant and the call would spin forever. A panicking hook unwinds out
/// of `dispatch`; the lock is released on the way out, but the remaining
/// hooks of that pass are skipped.
pub struct HookRegistry<D, B, I: InterruptControl = NoInterrupts> {
    state: IrqSpinLock<HookLists<D, B>, I>,
}

impl<D, B, I: InterruptControl> HookRegistry<D, B, I> {
    /// Creates a registry with two empty hook lists.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a registry whose lists can each hold `capacity` hooks
    /// without reallocating.
    ///
    /// Registrations beyond that grow the list while the lock is held.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: IrqSpinLock::new(HookLists::with_capacity(capacity)),
        }
    }

    /// Appends `callback` to the tail of the `direction` list.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - `callback` is `None`
    /// * `AlreadyExists` - the same callback is already registered on this
    ///   direction, whatever its context
    /// * `OutOfMemory` - the list could not grow
    ///
    /// A failed call leaves the list unchanged. When the list is full a
    /// larger buffer is allocated with the lock released and the call
    /// retries, so nothing is allocated inside the critical section.
    pub fn register(
        &self,
        direction: Direction,
        callback: Option<HookFn<D, B>>,
        context: HookContext,
    ) -> Result<(), HookError> {
        let callback = callback.ok_or(HookError::InvalidArgument)?;
        let mut entry = HookEntry::new(callback, context);
        let id = entry.id();
        let mut storage = Vec::new();

        let result = loop {
            let (attempt, retired) = self.push_locked(direction, entry, std::mem::take(&mut storage));
            drop(retired);

            match attempt {
                Attempt::Done(result) => break result,
                Attempt::Grow { entry: returned, capacity } => {
                    entry = returned;
                    match HookList::allocate_storage(capacity) {
                        Ok(fresh) => storage = fresh,
                        Err(e) => {
                            self.state.lock().stats.get_mut(direction).rejected += 1;
                            break Err(e);
                        }
                    }
                }
            }
        };

        match result {
            Ok(()) => debug!("Registered {} hook {} (context {})", direction, id, context),
            Err(e) => debug!("Failed to register {} hook {}: {}", direction, id, e),
        }

        result
    }

    /// One locked registration attempt.
    ///
    /// `storage` is adopted first when the list is full. Also returns the
    /// buffer that is no longer in use so the caller can free it after the
    /// lock is gone.
    fn push_locked(
        &self,
        direction: Direction,
        entry: HookEntry<D, B>,
        storage: Vec<HookEntry<D, B>>,
    ) -> (Attempt<D, B>, Vec<HookEntry<D, B>>) {
        let mut guard = self.state.lock();
        let HookLists { rx, tx, stats } = &mut *guard;
        let list = match direction {
            Direction::Rx => rx,
            Direction::Tx => tx,
        };
        let stats = stats.get_mut(direction);

        let retired = if list.is_full() {
            list.adopt_storage(storage)
        } else {
            storage
        };

        let attempt = match list.push_within_capacity(entry) {
            Ok(()) => {
                stats.registrations += 1;
                Attempt::Done(Ok(()))
            }
            Err(PushError::AlreadyExists) => {
                stats.rejected += 1;
                Attempt::Done(Err(HookError::AlreadyExists))
            }
            Err(PushError::Full(entry)) => Attempt::Grow {
                entry,
                capacity: list.grown_capacity(),
            },
        };

        (attempt, retired)
    }

    /// Removes `callback` from the `direction` list.
    ///
    /// The entry is unlinked under the lock and released after it.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - `callback` is `None`
    /// * `NotFound` - the callback is not registered on this direction
    pub fn unregister(
        &self,
        direction: Direction,
        callback: Option<HookFn<D, B>>,
    ) -> Result<(), HookError> {
        let id = callback
            .map(HookId::of)
            .ok_or(HookError::InvalidArgument)?;

        let removed = {
            let mut state = self.state.lock();
            let removed = state.list_mut(direction).remove(id);
            let stats = state.stats.get_mut(direction);
            if removed.is_some() {
                stats.unregistrations += 1;
            } else {
                stats.rejected += 1;
            }
            removed
        };

        match removed {
            Some(entry) => {
                debug!(
                    "Unregistered {} hook {} (context {})",
                    direction,
                    id,
                    entry.context()
                );
                drop(entry);
                Ok(())
            }
            None => {
                debug!("Cannot unregister {} hook {}: not registered", direction, id);
                Err(HookError::NotFound)
            }
        }
    }

    /// Runs every hook registered on `direction`, in registration order.
    ///
    /// Each hook receives `device`, `buffer` and its own context. The lock
    /// is held from the first hook until the last one returns. With no
    /// hooks registered this only takes and releases the lock.
    pub fn dispatch(&self, direction: Direction, device: &D, buffer: &B) {
        let mut guard = self.state.lock();
        let HookLists { rx, tx, stats } = &mut *guard;
        let list = match direction {
            Direction::Rx => &*rx,
            Direction::Tx => &*tx,
        };

        for entry in list.iter() {
            entry.invoke(device, buffer);
        }

        stats.get_mut(direction).record_pass(list.len());
    }

    pub fn register_rx(
        &self,
        callback: Option<HookFn<D, B>>,
        context: HookContext,
    ) -> Result<(), HookError> {
        self.register(Direction::Rx, callback, context)
    }

    pub fn unregister_rx(&self, callback: Option<HookFn<D, B>>) -> Result<(), HookError> {
        self.unregister(Direction::Rx, callback)
    }

    /// Receive-path dispatch, called once per received buffer.
    pub fn dispatch_rx(&self, device: &D, buffer: &B) {
        self.dispatch(Direction::Rx, device, buffer)
    }

    pub fn register_tx(
        &self,
        callback: Option<HookFn<D, B>>,
        context: HookContext,
    ) -> Result<(), HookError> {
        self.register(Direction::Tx, callback, context)
    }

    pub fn unregister_tx(&self, callback: Option<HookFn<D, B>>) -> Result<(), HookError> {
        self.unregister(Direction::Tx, callback)
    }

    /// Transmit-path dispatch, called once per transmitted buffer.
    pub fn dispatch_tx(&self, device: &D, buffer: &B) {
        self.dispatch(Direction::Tx, device, buffer)
    }

    /// Resets both lists to empty and clears statistics.
    ///
    /// The old storage is detached under the lock and freed after it.
    ///
    /// Meant for driver restart paths. Hooks still registered are dropped
    /// (their contexts are not touched) and a warning is logged, since
    /// their owners were expected to unregister first. Returns how many
    /// hooks were discarded.
    pub fn reinit(&self) -> usize {
        let (rx, tx) = {
            let mut state = self.state.lock();
            state.stats.rx.reset();
            state.stats.tx.reset();
            (state.rx.take(), state.tx.take())
        };

        let discarded = rx.len() + tx.len();
        if discarded > 0 {
            warn!(
                "Hook registry reinitialised with {} hooks still registered ({} rx, {} tx)",
                discarded,
                rx.len(),
                tx.len()
            );
        } else {
            debug!("Hook registry reinitialised");
        }

        discarded
    }

    /// Number of hooks registered on `direction`.
    pub fn len(&self, direction: Direction) -> usize {
        self.state.lock().list(direction).len()
    }

    pub fn is_empty(&self, direction: Direction) -> bool {
        self.len(direction) == 0
    }

    pub fn is_registered(&self, direction: Direction, callback: HookFn<D, B>) -> bool {
        self.state
            .lock()
            .list(direction)
            .contains(HookId::of(callback))
    }

    /// Ordered `(identity, context)` view of the `direction` list.
    ///
    /// The result buffer is sized with the lock released; if the list grew
    /// in the meantime the buffer is enlarged and the read retried.
    pub fn hooks(&self, direction: Direction) -> Vec<(HookId, HookContext)> {
        let mut out = Vec::new();
        loop {
            let needed = {
                let state = self.state.lock();
                let list = state.list(direction);
                if list.len() <= out.capacity() {
                    list.snapshot_into(&mut out);
                    return out;
                }
                list.len()
            };
            out.reserve_exact(needed);
        }
    }

    pub fn statistics(&self) -> HookStatisticsSnapshot {
        let state = self.state.lock();
        HookStatisticsSnapshot {
            rx: state.stats.rx.snapshot(state.rx.len()),
            tx: state.stats.tx.snapshot(state.tx.len()),
        }
    }
}

impl<D, B, I: InterruptControl> Default for HookRegistry<D, B, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D, B, I: InterruptControl> fmt::Debug for HookRegistry<D, B, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("rx", &self.hooks(Direction::Rx))
            .field("tx", &self.hooks(Direction::Tx))
            .finish()
    }
}
