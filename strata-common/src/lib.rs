//! Basic types shared by strata crates.

mod data;

pub use crate::data::Data;

pub use imbl;

// Taken from druid
impl<A: Data> Data for imbl::Vector<A> {
    fn same(&self, other: &Self) -> bool {
        // if a vec is small enough that it doesn't require an allocation
        // it is 'inline'; in this case a pointer comparison is meaningless.
        if self.is_inline() {
            self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a.same(b))
        } else {
            self.ptr_eq(other)
        }
    }
}

impl<K: Clone + 'static, V: Data, S: 'static> Data for imbl::HashMap<K, V, S> {
    fn same(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<A: Data, S: 'static> Data for imbl::HashSet<A, S> {
    fn same(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<K: Clone + 'static, V: Data> Data for imbl::OrdMap<K, V> {
    fn same(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<A: Data> Data for imbl::OrdSet<A> {
    fn same(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}
