//! Train/test index splits.

use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Shuffle `0..len` and cut it so the first part holds `floor(train_fraction * len)` indices.
pub fn random_split(len: usize, train_fraction: f64, seed: Option<u64>) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..len).collect();
    let mut rng = match seed {
        Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
        None => rand::rngs::StdRng::from_rng(&mut rand::rng()),
    };
    indices.shuffle(&mut rng);
    let train_size = ((train_fraction.clamp(0.0, 1.0) * len as f64).floor() as usize).min(len);
    let test = indices.split_off(train_size);
    (indices, test)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_follow_floor() {
        let (train, test) = random_split(7, 0.8, Some(1));
        assert_eq!(train.len(), 5);
        assert_eq!(test.len(), 2);
        let (train, test) = random_split(10, 0.7, Some(1));
        assert_eq!((train.len(), test.len()), (7, 3));
    }

    #[test]
    fn split_is_a_partition() {
        let (mut train, test) = random_split(20, 0.8, None);
        train.extend(test);
        train.sort_unstable();
        assert_eq!(train, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn seeded_split_is_repeatable() {
        assert_eq!(random_split(50, 0.8, Some(9)), random_split(50, 0.8, Some(9)));
    }
}
