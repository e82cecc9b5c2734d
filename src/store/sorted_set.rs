use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy)]
struct Score(f64);

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Score-ordered set. Ties rank by first insertion of the member, earliest first.
#[derive(Debug, Clone, Default)]
pub(crate) struct SortedSet {
    members: HashMap<String, (f64, u64)>,
    order: BTreeSet<(Score, Reverse<u64>, String)>,
    next_seq: u64,
}

impl SortedSet {
    /// Insert or re-score. A re-scored member keeps its insertion position among ties.
    pub(crate) fn insert(&mut self, member: &str, score: f64) {
        let seq = match self.members.get(member) {
            Some(&(old, seq)) => {
                self.order
                    .remove(&(Score(old), Reverse(seq), member.to_string()));
                seq
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                seq
            }
        };
        self.members.insert(member.to_string(), (score, seq));
        self.order
            .insert((Score(score), Reverse(seq), member.to_string()));
    }

    pub(crate) fn score(&self, member: &str) -> Option<f64> {
        self.members.get(member).map(|&(score, _)| score)
    }

    /// Ranks `[start, stop]` by descending score.
    ///
    /// Walks past the first `start` entries, so a page costs O(start + k) rather
    /// than the O(log n + k) of a rank-indexed skip list.
    pub(crate) fn rev_range(&self, start: u64, stop: u64) -> Vec<(String, f64)> {
        if stop < start {
            return Vec::new();
        }
        self.order
            .iter()
            .rev()
            .skip(start as usize)
            .take((stop - start).saturating_add(1) as usize)
            .map(|(score, _, member)| (member.clone(), score.0))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.members.len()
    }
}
