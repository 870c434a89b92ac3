//! Interrupt-safe spin lock guarding the hook lists.
//!
//! Acquiring the lock first masks local interrupts through an
//! [`InterruptControl`] implementation, then spins until the inner
//! `spin::Mutex` is free. Releasing drops the mutex and only then restores
//! the saved interrupt state, mirroring `spin_lock_irqsave` /
//! `spin_unlock_irqrestore`. The lock never sleeps and is not reentrant:
//! taking it twice on the same thread spins forever.

use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};

/// Masks and restores interrupts on the current processor.
///
/// Implementations must be cheap and must not block. `save_and_disable`
/// returns whatever state `restore` needs to put things back exactly as
/// they were, so nested critical sections unwind correctly.
pub trait InterruptControl {
    /// Saved interrupt state.
    type Flags: Copy;

    /// Disables local interrupts and returns the previous state.
    fn save_and_disable() -> Self::Flags;

    /// Restores the state returned by a matching `save_and_disable`.
    fn restore(flags: Self::Flags);
}

/// Interrupt control for targets without interrupt-context execution.
///
/// Hosted processes have nothing to mask, so both operations are no-ops
/// and the lock degrades to a plain spin lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInterrupts;

impl InterruptControl for NoInterrupts {
    type Flags = ();

    #[inline]
    fn save_and_disable() -> Self::Flags {}

    #[inline]
    fn restore(_flags: Self::Flags) {}
}

/// Spin lock that disables interrupts for the duration of the critical
/// section.
pub struct IrqSpinLock<T, I: InterruptControl = NoInterrupts> {
    inner: spin::Mutex<T>,
    _irq: PhantomData<fn() -> I>,
}

impl<T, I: InterruptControl> IrqSpinLock<T, I> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: spin::Mutex::new(value),
            _irq: PhantomData,
        }
    }

    /// Masks interrupts, then spins until the lock is acquired.
    pub fn lock(&self) -> IrqSpinGuard<'_, T, I> {
        let flags = I::save_and_disable();
        let guard = self.inner.lock();
        IrqSpinGuard {
            guard: ManuallyDrop::new(guard),
            flags,
        }
    }

    /// Single acquisition attempt.
    ///
    /// Interrupt state is left untouched when the lock is busy.
    pub fn try_lock(&self) -> Option<IrqSpinGuard<'_, T, I>> {
        let flags = I::save_and_disable();
        match self.inner.try_lock() {
            Some(guard) => Some(IrqSpinGuard {
                guard: ManuallyDrop::new(guard),
                flags,
            }),
            None => {
                I::restore(flags);
                None
            }
        }
    }

    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: Default, I: InterruptControl> Default for IrqSpinLock<T, I> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T, I: InterruptControl> fmt::Debug for IrqSpinLock<T, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrqSpinLock")
            .field("locked", &self.is_locked())
            .finish_non_exhaustive()
    }
}

/// RAII guard for [`IrqSpinLock`].
///
/// Dropping it releases the lock, then restores interrupts.
pub struct IrqSpinGuard<'a, T, I: InterruptControl> {
    guard: ManuallyDrop<spin::MutexGuard<'a, T>>,
    flags: I::Flags,
}

impl<T, I: InterruptControl> Deref for IrqSpinGuard<'_, T, I> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T, I: InterruptControl> DerefMut for IrqSpinGuard<'_, T, I> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T, I: InterruptControl> Drop for IrqSpinGuard<'_, T, I> {
    fn drop(&mut self) {
        // SAFETY: `guard` is dropped exactly once, here, and never touched
        // afterwards.
        unsafe { ManuallyDrop::drop(&mut self.guard) };
        I::restore(self.flags);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::alloc::{GlobalAlloc, Layout, System};
    use std::cell::Cell;
    use std::sync::Arc;
    use std::thread;

    thread_local! {
        static MASKED: Cell<bool> = const { Cell::new(false) };
        static SAVES: Cell<usize> = const { Cell::new(0) };
        static MASKED_ALLOCS: Cell<usize> = const { Cell::new(0) };
    }

    /// System allocator that counts, per thread, allocations made while
    /// [`FakeIrq`] has interrupts masked.
    struct MaskedAllocCounter;

    impl MaskedAllocCounter {
        fn note() {
            let masked = MASKED.try_with(Cell::get).unwrap_or(false);
            if masked {
                let _ = MASKED_ALLOCS.try_with(|c| c.set(c.get() + 1));
            }
        }
    }

    unsafe impl GlobalAlloc for MaskedAllocCounter {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            Self::note();
            System.alloc(layout)
        }

        unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
            Self::note();
            System.alloc_zeroed(layout)
        }

        unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
            Self::note();
            System.realloc(ptr, layout, new_size)
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            System.dealloc(ptr, layout)
        }
    }

    #[global_allocator]
    static ALLOCATOR: MaskedAllocCounter = MaskedAllocCounter;

    /// Per-thread simulated interrupt flag for tests.
    pub(crate) struct FakeIrq;

    impl FakeIrq {
        pub(crate) fn masked() -> bool {
            MASKED.with(Cell::get)
        }

        pub(crate) fn saves() -> usize {
            SAVES.with(Cell::get)
        }

        /// Allocations this thread made with interrupts masked.
        pub(crate) fn masked_allocations() -> usize {
            MASKED_ALLOCS.with(Cell::get)
        }
    }

    impl InterruptControl for FakeIrq {
        type Flags = bool;

        fn save_and_disable() -> bool {
            SAVES.with(|s| s.set(s.get() + 1));
            MASKED.with(|m| m.replace(true))
        }

        fn restore(flags: bool) {
            MASKED.with(|m| m.set(flags));
        }
    }

    #[test]
    fn test_lock_masks_and_restores() {
        let lock: IrqSpinLock<u32, FakeIrq> = IrqSpinLock::new(0);
        assert!(!FakeIrq::masked());

        {
            let mut guard = lock.lock();
            assert!(FakeIrq::masked());
            assert!(lock.is_locked());
            *guard += 1;
        }

        assert!(!FakeIrq::masked());
        assert!(!lock.is_locked());
        assert_eq!(lock.into_inner(), 1);
    }

    #[test]
    fn test_nested_restore_keeps_outer_state() {
        let outer: IrqSpinLock<(), FakeIrq> = IrqSpinLock::new(());
        let inner: IrqSpinLock<(), FakeIrq> = IrqSpinLock::new(());

        let a = outer.lock();
        {
            let _b = inner.lock();
            assert!(FakeIrq::masked());
        }
        // Inner release restores "masked", not "unmasked".
        assert!(FakeIrq::masked());
        drop(a);
        assert!(!FakeIrq::masked());
    }

    #[test]
    fn test_try_lock_when_busy() {
        let lock: IrqSpinLock<u32, FakeIrq> = IrqSpinLock::new(5);
        let before = FakeIrq::saves();

        let guard = lock.lock();
        assert!(lock.try_lock().is_none());
        // The failed attempt put the flag back to what the held guard set.
        assert!(FakeIrq::masked());
        drop(guard);

        assert!(!FakeIrq::masked());
        assert_eq!(*lock.try_lock().unwrap(), 5);
        assert_eq!(FakeIrq::saves(), before + 3);
    }

    #[test]
    fn test_masked_allocations_are_counted() {
        let lock: IrqSpinLock<(), FakeIrq> = IrqSpinLock::new(());
        let before = FakeIrq::masked_allocations();

        drop(std::hint::black_box(Vec::<u64>::with_capacity(8)));
        assert_eq!(FakeIrq::masked_allocations(), before);

        {
            let _guard = lock.lock();
            drop(std::hint::black_box(Vec::<u64>::with_capacity(8)));
        }
        assert_eq!(FakeIrq::masked_allocations(), before + 1);
    }

    #[test]
    fn test_mutual_exclusion_across_threads() {
        let lock: Arc<IrqSpinLock<u64>> = Arc::new(IrqSpinLock::new(0));
        let mut handles = Vec::new();

        for _ in 0..4 {
            let lock = Arc::clone(&lock);
            handles.push(thread::spawn(move || {
                for _ in 0..10_000 {
                    *lock.lock() += 1;
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*lock.lock(), 40_000);
    }
}
