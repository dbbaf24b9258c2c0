// id.rs — Stable identifiers for values of the program model
//
// A `ValueId` indexes the module-wide value arena (`Module::values`). IDs are
// handed out in construction order by the upstream builder, so the arena is
// dense and iteration over it is deterministic.

use serde::{Deserialize, Serialize};

/// Identifier of a scalar, array, or tensor value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueId(pub u32);

impl ValueId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Allocator for value IDs. Produces monotonically increasing IDs in
/// allocation order.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next_value: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_value(&mut self) -> ValueId {
        let id = ValueId(self.next_value);
        self.next_value += 1;
        id
    }

    /// Number of IDs handed out so far.
    pub fn allocated(&self) -> usize {
        self.next_value as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_dense_and_ordered() {
        let mut alloc = IdAllocator::new();
        let a = alloc.alloc_value();
        let b = alloc.alloc_value();
        assert_eq!(a, ValueId(0));
        assert_eq!(b, ValueId(1));
        assert!(a < b);
        assert_eq!(alloc.allocated(), 2);
    }
}
