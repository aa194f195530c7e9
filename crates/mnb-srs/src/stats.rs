use std::{collections::HashMap, hash::Hash};

use chrono::{DateTime, FixedOffset, NaiveTime, Utc};

/// Session accuracy as a whole percentage, rounded half up. 0 before any review.
pub const fn accuracy(reviewed: u32, correct: u32) -> u32 {
    if reviewed == 0 {
        return 0;
    }
    let (reviewed, correct) = (reviewed as u64, correct as u64);
    ((correct * 200 + reviewed) / (reviewed * 2)) as u32
}

/// Count keys, keeping buckets in order of first appearance.
///
/// The output order follows the input rather than the counts so clients can render
/// a stable list.
pub fn bucket_counts<K, I>(keys: I) -> Vec<(K, i64)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut buckets: Vec<(K, i64)> = Vec::new();

    for key in keys {
        match positions.get(&key) {
            Some(&i) => buckets[i].1 += 1,
            None => {
                positions.insert(key.clone(), buckets.len());
                buckets.push((key, 1));
            }
        }
    }

    buckets
}

/// Last instant of the calendar day containing `now`, in the given UTC offset.
pub fn end_of_day(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let last_instant = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN);
    now.with_timezone(&offset)
        .date_naive()
        .and_time(last_instant)
        .and_local_timezone(offset)
        .single()
        .map_or(now, |end| end.with_timezone(&Utc))
}
