//! Final standings and winner determination.

use quizarena_protocol::{Outcome, Standing};

/// Sorts standings by score, highest first. Ties keep id order so the
/// scoreboard is stable between updates.
pub fn sort_standings(standings: &mut [Standing]) {
    standings.sort_by(|a, b| b.score.cmp(&a.score).then(a.player_id.cmp(&b.player_id)));
}

/// Decides who won from a set of standings (any order).
pub fn determine_outcome(standings: &[Standing]) -> Outcome {
    let Some(top) = standings.iter().map(|s| s.score).max() else {
        return Outcome::NoParticipants;
    };
    let leaders: Vec<&Standing> = standings.iter().filter(|s| s.score == top).collect();

    match leaders.as_slice() {
        [only] => Outcome::Winner {
            player_id: only.player_id,
            name: only.name.clone(),
            score: top,
        },
        _ if leaders.len() == standings.len() => Outcome::CompleteDraw { score: top },
        _ => {
            let mut players: Vec<_> = leaders.iter().map(|s| s.player_id).collect();
            players.sort();
            Outcome::PartialDraw { players, score: top }
        }
    }
}
