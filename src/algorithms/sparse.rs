use std::collections::HashMap;
use std::hash::Hash;
use std::ops::AddAssign;

/// Sparse square matrix addressed by item pairs. Absent cells are
/// distinguishable from cells holding a zero value.
#[derive(Debug, Clone)]
pub struct SparseMatrix<K, V> {
    rows: HashMap<K, HashMap<K, V>>,
}

impl<K, V> Default for SparseMatrix<K, V> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<K, V> SparseMatrix<K, V>
where
    K: Eq + Hash + Copy,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row: &K, col: &K) -> Option<&V> {
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    pub fn contains(&self, row: &K, col: &K) -> bool {
        self.get(row, col).is_some()
    }

    pub fn row(&self, row: &K) -> Option<&HashMap<K, V>> {
        self.rows.get(row)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&K, &HashMap<K, V>)> {
        self.rows.iter()
    }

    pub fn row_keys(&self) -> impl Iterator<Item = &K> {
        self.rows.keys()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of populated cells.
    pub fn len(&self) -> usize {
        self.rows.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &K, &V)> {
        self.rows
            .iter()
            .flat_map(|(row, cells)| cells.iter().map(move |(col, value)| (row, col, value)))
    }

    pub fn update_each<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &K, &mut V),
    {
        for (row, cells) in self.rows.iter_mut() {
            for (col, value) in cells.iter_mut() {
                f(row, col, value);
            }
        }
    }
}

impl<K, V> SparseMatrix<K, V>
where
    K: Eq + Hash + Copy,
    V: Default + AddAssign,
{
    /// Adds `delta` to the cell, creating it with `V::default()` first if absent.
    pub fn accumulate(&mut self, row: K, col: K, delta: V) {
        *self.rows.entry(row).or_default().entry(col).or_default() += delta;
    }
}
