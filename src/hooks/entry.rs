//! Hook entries: the callback type, its identity and the opaque context.

use std::fmt;

/// Signature of a packet hook.
///
/// Invoked once per packet buffer with the device handle, the buffer and the
/// context supplied at registration. Hooks run with the registry lock held
/// and (on targets that mask them) with local interrupts disabled, so they
/// must be short, must never block or sleep, and must not register or
/// unregister hooks on the same registry.
pub type HookFn<D, B> = fn(&D, &B, HookContext);

/// Identity of a registered callback.
///
/// Derived from the function's address, so two registrations are "the same
/// hook" exactly when they point at the same code. If a module is unloaded
/// and an unrelated function later lands at the same address, the two are
/// indistinguishable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HookId(usize);

impl HookId {
    /// Returns the identity of `callback`.
    pub fn of<D, B>(callback: HookFn<D, B>) -> Self {
        HookId(callback as usize)
    }

    /// Raw code address backing this identity.
    pub fn addr(self) -> usize {
        self.0
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Opaque consumer-owned value handed back to the hook on every call.
///
/// The registry stores and copies it but never interprets it. When it
/// carries a pointer, the consumer must keep the pointee alive until the
/// hook has been unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HookContext(usize);

impl HookContext {
    /// A context carrying no value.
    pub const NONE: HookContext = HookContext(0);

    pub const fn from_raw(value: usize) -> Self {
        HookContext(value)
    }

    pub fn from_ptr<T>(ptr: *const T) -> Self {
        HookContext(ptr as usize)
    }

    /// Wraps the address of `value`. The borrow is not tracked.
    pub fn from_ref<T>(value: &T) -> Self {
        Self::from_ptr(value as *const T)
    }

    pub const fn raw(self) -> usize {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn as_ptr<T>(self) -> *const T {
        self.0 as *const T
    }

    /// Reinterprets the context as a reference to `T`.
    ///
    /// Returns `None` for a null context.
    ///
    /// # Safety
    ///
    /// The context must have been built from a valid `&T` (or `*const T`)
    /// whose pointee is still alive for `'a`.
    pub unsafe fn as_ref<'a, T>(self) -> Option<&'a T> {
        self.as_ptr::<T>().as_ref()
    }
}

impl From<usize> for HookContext {
    fn from(value: usize) -> Self {
        HookContext(value)
    }
}

impl fmt::Display for HookContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A registered hook: callback plus the context it was registered with.
///
/// Entries are created by a successful register and dropped by a
/// successful unregister; they are never modified in between.
pub struct HookEntry<D, B> {
    callback: HookFn<D, B>,
    context: HookContext,
}

impl<D, B> HookEntry<D, B> {
    pub fn new(callback: HookFn<D, B>, context: HookContext) -> Self {
        Self { callback, context }
    }

    pub fn id(&self) -> HookId {
        HookId::of(self.callback)
    }

    pub fn context(&self) -> HookContext {
        self.context
    }

    /// Calls the hook for one packet buffer.
    #[inline]
    pub fn invoke(&self, device: &D, buffer: &B) {
        (self.callback)(device, buffer, self.context)
    }
}

impl<D, B> fmt::Debug for HookEntry<D, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookEntry")
            .field("id", &self.id())
            .field("context", &self.context)
            .finish()
    }
}
