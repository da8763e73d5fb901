//! Final standings.
//!
//! Players are ordered by survival first: everyone still alive ranks above
//! everyone dead, and among the dead a later death ranks higher. Remaining hp
//! breaks ties, then the lower player id. Players equal on both survival and
//! hp share a position (1, 1, 3, ...).

use std::cmp::Ordering;

use crate::entity::Player;
use crate::output::RankEntry;

/// Survival key: alive players outrank every death tick.
fn survival(player: &Player) -> u64 {
    if player.alive {
        u64::MAX
    } else {
        player.death_tick.unwrap_or(0)
    }
}

fn compare(a: &Player, b: &Player) -> Ordering {
    survival(b)
        .cmp(&survival(a))
        .then_with(|| b.vitals.hp.total_cmp(&a.vitals.hp))
        .then_with(|| a.id.cmp(&b.id))
}

/// Ranks `players` best first.
///
/// # Example
///
/// ```
/// use emberfall_core::arena::Arena;
/// use emberfall_core::config::Tuning;
/// use emberfall_core::entity::{ClassKind, RosterEntry};
/// use emberfall_core::ranking::rank;
///
/// let roster = vec![
///     RosterEntry::new("a", 1, "Ash", ClassKind::Barbarian),
///     RosterEntry::new("b", 2, "Bryn", ClassKind::Paladin),
/// ];
/// let arena = Arena::new(&roster, Tuning::default(), 1);
/// let ranking = rank(arena.players());
///
/// // Both alive at full hp: tied for first, listed by id.
/// assert_eq!(ranking[0].position, 1);
/// assert_eq!(ranking[1].position, 1);
/// assert_eq!(ranking[0].name, "Ash");
/// ```
#[must_use]
#[allow(clippy::float_cmp)]
pub fn rank<'a>(players: impl IntoIterator<Item = &'a Player>) -> Vec<RankEntry> {
    let mut sorted: Vec<&Player> = players.into_iter().collect();
    sorted.sort_by(|a, b| compare(a, b));

    let mut ranking: Vec<RankEntry> = Vec::with_capacity(sorted.len());
    for (i, player) in sorted.iter().enumerate() {
        let position = match (i.checked_sub(1), ranking.last()) {
            (Some(prev), Some(last))
                if survival(sorted[prev]) == survival(player)
                    && sorted[prev].vitals.hp == player.vitals.hp =>
            {
                last.position
            }
            _ => u32::try_from(i + 1).unwrap_or(u32::MAX),
        };

        ranking.push(RankEntry {
            position,
            id: player.connection_id.clone(),
            player_id: player.id,
            name: player.name.clone(),
            class: player.class,
            hp: player.vitals.hp,
            max_hp: player.vitals.max_hp,
            death_tick: player.death_tick,
        });
    }

    ranking
}
