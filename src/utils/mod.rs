use std::collections::HashMap;
use std::hash::Hash;

pub mod metrics;
pub mod validation;

/// Keeps at most `cap` ratings per user, preferring the lowest item ids.
/// `exempt` keeps its full rating set. A `cap` of 0 leaves the matrix as is.
pub fn cap_ratings<U, I, R>(matrix: &mut HashMap<U, HashMap<I, R>>, cap: usize, exempt: Option<&U>)
where
    U: Eq + Hash,
    I: Eq + Hash + Ord + Copy,
{
    if cap == 0 {
        return;
    }

    for (user, ratings) in matrix.iter_mut() {
        if ratings.len() <= cap || exempt == Some(user) {
            continue;
        }
        let mut items: Vec<I> = ratings.keys().copied().collect();
        items.sort_unstable();
        for item in &items[cap..] {
            ratings.remove(item);
        }
    }
}

pub fn truncate<T>(mut items: Vec<T>, count: usize) -> Vec<T> {
    items.truncate(count);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cap_ratings() {
        let mut m: HashMap<u32, HashMap<u32, i32>> = HashMap::new();
        m.insert(1, HashMap::from([(5, 1), (3, 2), (9, 3)]));
        m.insert(2, HashMap::from([(5, 1), (3, 2), (9, 3)]));
        m.insert(3, HashMap::from([(1, 1)]));

        cap_ratings(&mut m, 2, Some(&2));

        assert_eq!(m[&1].len(), 2);
        assert!(m[&1].contains_key(&3) && m[&1].contains_key(&5));
        assert_eq!(m[&2].len(), 3);
        assert_eq!(m[&3].len(), 1);
    }

    #[test]
    fn test_cap_zero_is_noop() {
        let mut m: HashMap<u32, HashMap<u32, i32>> = HashMap::new();
        m.insert(1, HashMap::from([(5, 1), (3, 2)]));
        cap_ratings(&mut m, 0, None);
        assert_eq!(m[&1].len(), 2);
    }
}
