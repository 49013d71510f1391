//! Table-tennis scoring rules.
//!
//! Pure functions over match snapshots: set and match completion, service
//! rotation and side changes. Nothing here mutates state.

use serde::{Deserialize, Serialize};

use super::score::{MatchState, Score, Side, SideAssignment};

/// Points needed to take a set.
pub const POINTS_TO_WIN_SET: u32 = 11;

/// A set is only won with this lead.
pub const MIN_WINNING_LEAD: u32 = 2;

/// Best of five.
pub const SETS_TO_WIN_MATCH: usize = 3;

pub const MAX_SETS: u8 = 5;

/// Once both sides reach this, service alternates every point.
pub const DEUCE_THRESHOLD: u32 = 10;

/// Serves per turn outside deuce.
pub const SERVES_PER_TURN: u8 = 2;

/// Leading score that triggers the mid-set swap in the deciding set.
pub const DECIDER_SWAP_SCORE: u32 = 5;

pub fn is_set_won(score: Score) -> bool {
    let Score(a, b) = score;
    (a >= POINTS_TO_WIN_SET || b >= POINTS_TO_WIN_SET) && a.abs_diff(b) >= MIN_WINNING_LEAD
}

/// Number of completed sets won by `side`.
pub fn sets_won(sets_history: &[Score], side: Side) -> usize {
    sets_history
        .iter()
        .filter(|set| set.leader() == Some(side))
        .count()
}

pub fn is_match_finished(sets_history: &[Score]) -> bool {
    sets_won(sets_history, Side::A) >= SETS_TO_WIN_MATCH
        || sets_won(sets_history, Side::B) >= SETS_TO_WIN_MATCH
}

/// Serves per turn at the given score.
pub fn services_per_player(score_a: u32, score_b: u32) -> u8 {
    if score_a >= DEUCE_THRESHOLD && score_b >= DEUCE_THRESHOLD {
        1
    } else {
        SERVES_PER_TURN
    }
}

pub fn should_change_server(remaining_serves: u8) -> bool {
    remaining_serves == 0
}

pub fn next_server(current: Side) -> Side {
    current.other()
}

/// Odd sets open with the match's first server, even sets with the other side.
pub fn first_server_of_set(original_first_server: Side, set_number: u8) -> Side {
    if set_number % 2 == 1 {
        original_first_server
    } else {
        next_server(original_first_server)
    }
}

/// Server and serve count after a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceState {
    pub server: Side,
    pub remaining_serves: u8,
}

/// Compute service after `winner` takes a point.
///
/// Takes the pre-point snapshot. The post-point score is derived here only to
/// pick the serve count for the next turn; committing it is the caller's job.
pub fn update_service_state(state: &MatchState, winner: Side) -> ServiceState {
    let after = state.score.with_point(winner);
    let per_player = services_per_player(after.0, after.1);
    let remaining = state.remaining_serves.saturating_sub(1);

    if should_change_server(remaining) {
        ServiceState {
            server: next_server(state.server),
            remaining_serves: per_player,
        }
    } else {
        ServiceState {
            server: state.server,
            remaining_serves: remaining,
        }
    }
}

/// Whether players switch ends between `old` and `new`.
///
/// Fires at every set change, and once in the deciding set on the point that
/// first lifts the leading score to 5.
pub fn should_change_sides(old: &MatchState, new: &MatchState) -> bool {
    if old.set_number < new.set_number {
        return true;
    }

    if new.set_number == MAX_SETS && !new.decider_swap_done {
        return new.score.max() == DECIDER_SWAP_SCORE && old.score.max() < DECIDER_SWAP_SCORE;
    }

    false
}

pub fn change_sides(state: &MatchState) -> SideAssignment {
    state.current_sides.flipped()
}

/// Referee hint about the deciding-set side change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SideChangeNotice {
    /// Swap pending at 5, leader currently on `leading_score`
    Upcoming { leading_score: u32 },
    /// Swap happens on the next point for the leader
    Imminent,
    Completed,
}

pub fn side_change_notice(state: &MatchState) -> Option<SideChangeNotice> {
    if state.set_number != MAX_SETS {
        return None;
    }

    if state.decider_swap_done {
        return Some(SideChangeNotice::Completed);
    }

    let leading_score = state.score.max();
    if leading_score == DECIDER_SWAP_SCORE - 1 {
        Some(SideChangeNotice::Imminent)
    } else {
        Some(SideChangeNotice::Upcoming { leading_score })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::config::MatchConfig;
    use chrono::Utc;

    fn make_state(set_number: u8, score: Score) -> MatchState {
        let mut state = MatchState::new(MatchConfig::new("Alice", "Bob"), Utc::now());
        state.set_number = set_number;
        state.score = score;
        state
    }

    #[test]
    fn test_set_won_thresholds() {
        for a in 0..11 {
            for b in 0..11 {
                assert!(!is_set_won(Score(a, b)), "{}-{} should not be won", a, b);
            }
        }

        assert!(is_set_won(Score(11, 9)));
        assert!(is_set_won(Score(3, 11)));
        assert!(!is_set_won(Score(11, 10)));
        assert!(!is_set_won(Score(15, 14)));
        assert!(is_set_won(Score(16, 14)));
    }

    #[test]
    fn test_set_won_stays_won_as_leader_extends() {
        let mut score = Score(11, 9);
        for _ in 0..10 {
            assert!(is_set_won(score));
            score = score.with_point(Side::A);
        }
    }

    #[test]
    fn test_match_finished() {
        let sets = vec![Score(11, 5), Score(9, 11), Score(11, 7)];
        assert!(!is_match_finished(&sets));
        assert_eq!(sets_won(&sets, Side::A), 2);
        assert_eq!(sets_won(&sets, Side::B), 1);

        let mut sets = sets;
        sets.push(Score(12, 10));
        assert!(is_match_finished(&sets));

        let sweep_b = vec![Score(4, 11), Score(8, 11), Score(10, 12)];
        assert!(is_match_finished(&sweep_b));
    }

    #[test]
    fn test_services_per_player() {
        for a in 0..20 {
            for b in 0..20 {
                let expected = if a.min(b) < 10 { 2 } else { 1 };
                assert_eq!(services_per_player(a, b), expected, "at {}-{}", a, b);
            }
        }
    }

    #[test]
    fn test_first_server_by_set_parity() {
        for set in 1..=MAX_SETS {
            let expected = if set % 2 == 1 { Side::A } else { Side::B };
            assert_eq!(first_server_of_set(Side::A, set), expected);
            assert_eq!(first_server_of_set(Side::B, set), expected.other());
        }
    }

    #[test]
    fn test_server_rotates_every_two_points() {
        let mut state = make_state(1, Score(0, 0));
        let mut servers = Vec::new();

        // Alternate winners so both scores stay below 10 for 16 points.
        for i in 0..16 {
            servers.push(state.server);
            let winner = if i % 2 == 0 { Side::A } else { Side::B };
            let service = update_service_state(&state, winner);
            state.score = state.score.with_point(winner);
            state.server = service.server;
            state.remaining_serves = service.remaining_serves;
        }

        assert_eq!(state.score, Score(8, 8));
        assert_eq!(servers.len(), 16);
        for (i, block) in servers.chunks(2).enumerate() {
            let expected = if i % 2 == 0 { Side::A } else { Side::B };
            assert_eq!(block, [expected, expected]);
        }
        assert_eq!(servers.iter().filter(|s| **s == Side::A).count(), 8);
        assert_eq!(servers.iter().filter(|s| **s == Side::B).count(), 8);
    }

    #[test]
    fn test_server_alternates_every_point_at_deuce() {
        let mut state = make_state(1, Score(10, 10));
        state.server = Side::A;
        state.remaining_serves = 1;

        for winner in [Side::A, Side::B, Side::A, Side::B] {
            let before = state.server;
            let service = update_service_state(&state, winner);
            assert_eq!(service.server, before.other());
            assert_eq!(service.remaining_serves, 1);
            state.score = state.score.with_point(winner);
            state.server = service.server;
            state.remaining_serves = service.remaining_serves;
        }
    }

    #[test]
    fn test_reaching_deuce_resets_to_single_serve() {
        let mut state = make_state(1, Score(10, 9));
        state.server = Side::B;
        state.remaining_serves = 1;

        let service = update_service_state(&state, Side::B);
        assert_eq!(service.server, Side::A);
        assert_eq!(service.remaining_serves, 1);
    }

    #[test]
    fn test_sides_change_on_new_set() {
        let old = make_state(2, Score(10, 4));
        let new = make_state(3, Score(0, 0));
        assert!(should_change_sides(&old, &new));
    }

    #[test]
    fn test_decider_swap_rising_edge() {
        let old = make_state(5, Score(4, 4));
        let new = make_state(5, Score(5, 4));
        assert!(should_change_sides(&old, &new));

        // Level check would fire here, rising edge must not.
        let old = make_state(5, Score(5, 4));
        let new = make_state(5, Score(5, 5));
        assert!(!should_change_sides(&old, &new));

        let old = make_state(5, Score(3, 4));
        let new = make_state(5, Score(4, 4));
        assert!(!should_change_sides(&old, &new));
    }

    #[test]
    fn test_decider_swap_not_repeated_once_latched() {
        let old = make_state(5, Score(4, 4));
        let mut new = make_state(5, Score(5, 4));
        new.decider_swap_done = true;
        assert!(!should_change_sides(&old, &new));
    }

    #[test]
    fn test_no_mid_set_swap_outside_decider() {
        for set in 1..MAX_SETS {
            let old = make_state(set, Score(4, 2));
            let new = make_state(set, Score(5, 2));
            assert!(!should_change_sides(&old, &new));
        }
    }

    #[test]
    fn test_side_change_notice() {
        assert_eq!(side_change_notice(&make_state(4, Score(4, 0))), None);
        assert_eq!(
            side_change_notice(&make_state(5, Score(2, 3))),
            Some(SideChangeNotice::Upcoming { leading_score: 3 })
        );
        assert_eq!(
            side_change_notice(&make_state(5, Score(4, 1))),
            Some(SideChangeNotice::Imminent)
        );

        let mut done = make_state(5, Score(7, 5));
        done.decider_swap_done = true;
        assert_eq!(side_change_notice(&done), Some(SideChangeNotice::Completed));
    }
}
