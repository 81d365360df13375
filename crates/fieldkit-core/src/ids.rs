//! Queue entry identifiers.
//!
//! Ids keep the `<epoch_ms>_<n>` shape hosts already parse, with `n` drawn
//! from `0..1000`. Generation happens under the collection lock and redraws
//! until the id is unused in that collection, so ids never collide within
//! one collection.

use rand::Rng;

const SUFFIX_RANGE: u32 = 1000;
const RANDOM_DRAWS: usize = 16;

pub fn generate_id<'a, I>(now_ms: i64, existing: I) -> String
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    let is_free = |candidate: &str| !existing.clone().into_iter().any(|id| id == candidate);
    let mut rng = rand::thread_rng();
    let mut timestamp = now_ms;
    loop {
        for _ in 0..RANDOM_DRAWS {
            let candidate = format!("{timestamp}_{}", rng.gen_range(0..SUFFIX_RANGE));
            if is_free(candidate.as_str()) {
                return candidate;
            }
        }
        // Crowded millisecond: sweep it, then move to the next one.
        if let Some(candidate) = (0..SUFFIX_RANGE)
            .map(|n| format!("{timestamp}_{n}"))
            .find(|candidate| is_free(candidate.as_str()))
        {
            return candidate;
        }
        timestamp += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_has_timestamp_prefix_and_bounded_suffix() {
        let id = generate_id(1_700_000_000_123, std::iter::empty::<&str>());
        let (ts, n) = id.split_once('_').unwrap();
        assert_eq!(ts, "1700000000123");
        assert!(n.parse::<u32>().unwrap() < 1000);
    }

    #[test]
    fn id_avoids_existing_ids() {
        let taken: Vec<String> = (0..999).map(|n| format!("5_{n}")).collect();
        let id = generate_id(5, taken.iter().map(String::as_str));
        assert_eq!(id, "5_999");
    }

    #[test]
    fn saturated_millisecond_rolls_forward() {
        let taken: Vec<String> = (0..1000).map(|n| format!("5_{n}")).collect();
        let id = generate_id(5, taken.iter().map(String::as_str));
        assert!(id.starts_with("6_"));
    }
}
