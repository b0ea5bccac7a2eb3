//! Key capability set: intrinsic hash, equality, and the null sentinel.

use core::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;
use std::rc::Rc;

/// A type usable as a `ChainedHashTable` key.
///
/// `table_hash` must agree for equal values and stay stable for the life of
/// the process; the table reduces it to a bucket index with
/// `|hash mod capacity|`. Types that implement `Borrow` for lookups must hash
/// identically to their borrowed form (`String` and `str` do).
pub trait TableKey: Eq {
    fn table_hash(&self) -> i64;

    /// Whether this value is the null sentinel. Only nullable key types
    /// (`Option<T>`) ever return `true`.
    #[inline]
    fn is_null(&self) -> bool {
        false
    }
}

macro_rules! impl_integer_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl TableKey for $t {
                #[inline]
                fn table_hash(&self) -> i64 {
                    *self as i64
                }
            }
        )*
    };
}

impl_integer_key!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl TableKey for i128 {
    #[inline]
    fn table_hash(&self) -> i64 {
        (*self as i64) ^ ((*self >> 64) as i64)
    }
}

impl TableKey for u128 {
    #[inline]
    fn table_hash(&self) -> i64 {
        (*self as i64) ^ ((*self >> 64) as i64)
    }
}

impl TableKey for bool {
    #[inline]
    fn table_hash(&self) -> i64 {
        *self as i64
    }
}

impl TableKey for char {
    #[inline]
    fn table_hash(&self) -> i64 {
        *self as i64
    }
}

impl TableKey for str {
    fn table_hash(&self) -> i64 {
        // DefaultHasher::new() is fixed-key SipHash, so equal strings agree
        // across tables and across runs of the same build.
        let mut h = DefaultHasher::new();
        self.hash(&mut h);
        h.finish() as i64
    }
}

impl TableKey for String {
    #[inline]
    fn table_hash(&self) -> i64 {
        self.as_str().table_hash()
    }
}

impl<T: TableKey + ?Sized> TableKey for &T {
    #[inline]
    fn table_hash(&self) -> i64 {
        (**self).table_hash()
    }
    #[inline]
    fn is_null(&self) -> bool {
        (**self).is_null()
    }
}

impl<T: TableKey + ?Sized> TableKey for Box<T> {
    #[inline]
    fn table_hash(&self) -> i64 {
        (**self).table_hash()
    }
    #[inline]
    fn is_null(&self) -> bool {
        (**self).is_null()
    }
}

impl<T: TableKey + ?Sized> TableKey for Rc<T> {
    #[inline]
    fn table_hash(&self) -> i64 {
        (**self).table_hash()
    }
    #[inline]
    fn is_null(&self) -> bool {
        (**self).is_null()
    }
}

/// Nullable keys. `None` is the null sentinel and is rejected by every
/// keyed operation with `TableError::IllegalNullKey`.
impl<T: TableKey> TableKey for Option<T> {
    #[inline]
    fn table_hash(&self) -> i64 {
        self.as_ref().map_or(0, T::table_hash)
    }
    #[inline]
    fn is_null(&self) -> bool {
        self.as_ref().map_or(true, T::is_null)
    }
}
