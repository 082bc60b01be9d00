use std::sync::Mutex;

/// A payload that can be returned to empty-but-still-allocated shape.
/// `reset` must truncate lengths, not capacities — the whole point of
/// pooling is to avoid repeated allocation churn under high per-link volume.
pub trait Poolable: Send + 'static {
    fn reset(&mut self);
}

/// A payload that knows how to deep-copy its own contents into a sibling
/// instance. Used by the broadcast stage to give every leaf but one an
/// independent copy instead of a shared reference.
pub trait PoolClone: Poolable {
    fn clone_into(&self, dst: &mut Self);
}

/// A free list of boxed payloads, created via `new_fn` on exhaustion.
///
/// This is semantically a lifetime-unbounded free list (design note: "Global
/// pool as module state") scoped here to a single pipeline instance instead
/// of process-wide static state — an implementation a pipeline owns and
/// shares via `Arc`, with no observable difference to callers.
pub struct Pool<P: Poolable> {
    free: Mutex<Vec<Box<P>>>,
    new_fn: Box<dyn Fn() -> P + Send + Sync>,
}

impl<P: Poolable> Pool<P> {
    pub fn new(new_fn: impl Fn() -> P + Send + Sync + 'static) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            new_fn: Box::new(new_fn),
        }
    }

    /// Returns a payload with all dynamic fields reset to empty but
    /// retaining whatever backing capacity the returned instance happens to
    /// carry from a previous life in the pool.
    pub fn acquire(&self) -> Box<P> {
        if let Some(p) = self.free.lock().unwrap().pop() {
            return p;
        }
        Box::new((self.new_fn)())
    }

    /// Resets and returns `p` to the free list. Recycling is idempotent-safe
    /// in the sense that the caller is expected to hold exclusive ownership
    /// of `p` at the time of the call — the pool itself just needs the inner
    /// mutex for the brief push/pop.
    pub fn release(&self, mut p: Box<P>) {
        p.reset();
        self.free.lock().unwrap().push(p);
    }

    /// Acquires a fresh payload and deep-copies `src`'s contents into it.
    pub fn clone_payload(&self, src: &P) -> Box<P>
    where
        P: PoolClone,
    {
        let mut cloned = self.acquire();
        src.clone_into(&mut cloned);
        cloned
    }
}
