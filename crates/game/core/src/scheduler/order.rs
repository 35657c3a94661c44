//! Ordering rules for the scheduler's entry list.

use std::cmp::Ordering;

use super::TurnEntry;

/// How the scheduler orders participants within a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum TurnOrderMode {
    /// Initiative descending, then speed descending. Rerolled every round.
    #[default]
    Initiative,
    /// Raw speed descending.
    Speed,
    /// Admission order, never re-sorted.
    Manual,
}

impl TurnOrderMode {
    /// Whether the entry list is re-sorted at the start of each round.
    pub fn resorts(self) -> bool {
        !matches!(self, TurnOrderMode::Manual)
    }
}

/// Total order used by the sort: the mode's keys first, then admission.
pub(crate) fn compare(mode: TurnOrderMode, a: &TurnEntry, b: &TurnEntry) -> Ordering {
    let by_keys = match mode {
        TurnOrderMode::Initiative => b
            .initiative
            .total_cmp(&a.initiative)
            .then_with(|| b.speed().cmp(&a.speed())),
        TurnOrderMode::Speed => b.speed().cmp(&a.speed()),
        TurnOrderMode::Manual => Ordering::Equal,
    };
    by_keys.then_with(|| a.admission.cmp(&b.admission))
}

/// Index at which a newly admitted entry is inserted under initiative
/// ordering: before the first entry whose (initiative, speed) is strictly
/// lower. Equal entries stay ahead of the newcomer.
pub(crate) fn initiative_insert_position(entries: &[TurnEntry], candidate: &TurnEntry) -> usize {
    entries
        .iter()
        .position(|existing| {
            let initiative = existing.initiative.total_cmp(&candidate.initiative);
            initiative == Ordering::Less
                || (initiative == Ordering::Equal && existing.speed() < candidate.speed())
        })
        .unwrap_or(entries.len())
}
