//! Debug-only detector for nested table operations.
//!
//! The table calls into user code (`TableKey::table_hash`, `Eq`) while a
//! chain is being walked or appended to. Re-entering the same table from that
//! code would observe half-linked buckets, so in debug builds the second
//! entry panics and names both operations. Release builds compile this to
//! nothing.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

/// Embedded in the table; every public operation starts with
/// `let _op = self.ops.enter("insert");`.
#[derive(Debug, Default)]
pub struct OperationTracker {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
}

impl OperationTracker {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
        }
    }

    #[inline]
    pub fn enter(&self, op: &'static str) -> ActiveOperation<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(running) = self.active.get() {
                panic!("nested `{op}` on a hash table while `{running}` is in progress");
            }
            self.active.set(Some(op));
            return ActiveOperation {
                owner: self,
                _lt: PhantomData,
            };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            return ActiveOperation { _lt: PhantomData };
        }
    }

    /// Name of the operation currently running, if any. Always `None` in
    /// release builds.
    #[cfg(test)]
    pub fn current(&self) -> Option<&'static str> {
        #[cfg(debug_assertions)]
        {
            return self.active.get();
        }
        #[cfg(not(debug_assertions))]
        {
            return None;
        }
    }
}

/// RAII marker returned by `OperationTracker::enter`.
pub struct ActiveOperation<'a> {
    #[cfg(debug_assertions)]
    owner: &'a OperationTracker,
    _lt: PhantomData<&'a ()>,
}

impl Drop for ActiveOperation<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}
