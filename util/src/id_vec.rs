use std::marker::PhantomData;

/// Append-only vec addressed by typed ids.
/// Ids are handed out in insertion order, so iterating is iterating in insertion order.
#[derive(Debug, Hash, PartialEq, Eq, Clone)]
pub struct IdVec<K, V> {
    vec: Vec<V>,
    _phantom: PhantomData<K>,
}

impl<K, V> Default for IdVec<K, V> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<K, V> IdVec<K, V> {
    /// Create a new `IdVec` with the given capacity.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            vec: Vec::with_capacity(cap),
            _phantom: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// View the values as a slice.
    pub fn as_slice(&self) -> &[V] {
        &self.vec
    }
}

impl<K: Into<usize>, V> IdVec<K, V> {
    /// Get the value with id `k`. Panics if `k` was not issued by this `IdVec`.
    #[inline]
    pub fn get(&self, k: K) -> &V {
        &self.vec[k.into()]
    }
}

impl<K: From<usize>, V> IdVec<K, V> {
    /// Push `v` and return the id that retrieves it later.
    #[inline]
    pub fn push(&mut self, v: V) -> K {
        let id = self.vec.len().into();
        self.vec.push(v);
        id
    }
}
