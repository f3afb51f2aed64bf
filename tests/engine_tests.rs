//! Integration tests for the Cuttle engine: card conservation, move
//! generation and execution agreeing with each other, and scripted rule
//! scenarios.

use std::collections::HashSet;

use cuttle_rust::card::{Card, full_deck, parse_cards};
use cuttle_rust::constants::{DECK_SIZE, MAX_GAME_MOVES};
use cuttle_rust::executor::{IllegalMove, apply_move};
use cuttle_rust::movegen::legal_moves;
use cuttle_rust::moves::{Move, PlayAs};
use cuttle_rust::state::{GameState, JackPair, Phase, WinReason};

// =============================================================================
// Helper functions for setting up test positions
// =============================================================================

fn card(s: &str) -> Card {
    s.parse().unwrap()
}

fn cards(s: &str) -> Vec<Card> {
    parse_cards(s).unwrap()
}

/// A full deck whose top cards are `top` (in order), followed by every other
/// card. Dealing it gives player 0 the first five and player 1 the next six.
fn stacked_deck(top: &str) -> Vec<Card> {
    let mut deck = cards(top);
    let chosen: HashSet<Card> = deck.iter().copied().collect();
    deck.extend(full_deck().into_iter().filter(|c| !chosen.contains(c)));
    deck
}

fn assert_conserved(state: &GameState) {
    let all = state.all_cards();
    assert_eq!(all.len(), DECK_SIZE, "card count changed:\n{state}");
    let unique: HashSet<Card> = all.iter().copied().collect();
    assert_eq!(unique.len(), DECK_SIZE, "duplicate card:\n{state}");
}

fn play(state: &GameState, mv: Move) -> GameState {
    apply_move(state, &mv).unwrap_or_else(|e| panic!("{mv} failed: {e}\n{state}"))
}

// =============================================================================
// Properties over random games
// =============================================================================

#[test]
fn test_random_games_keep_invariants() {
    let mut rng = fastrand::Rng::with_seed(2024);
    for game in 0..20 {
        let mut state = GameState::with_seed(game);
        assert_conserved(&state);
        let mut plies = 0;
        while !state.is_terminal() {
            let moves = legal_moves(&state);
            assert!(!moves.is_empty(), "no moves in a live game:\n{state}");

            for mv in &moves {
                match apply_move(&state, mv) {
                    Ok(s) => assert_conserved(&s),
                    Err(IllegalMove::TargetNotFound(c)) => {
                        panic!("generated {mv} but {c} was missing:\n{state}")
                    }
                    Err(e) => panic!("generated {mv} but it was rejected: {e}\n{state}"),
                }
            }
            let pick = &moves[rng.usize(..moves.len())];
            state = play(&state, pick.clone());
            plies += 1;
            assert!(plies < MAX_GAME_MOVES, "game {game} did not finish");
        }
        assert!(legal_moves(&state).is_empty());
    }
}

#[test]
fn test_draw_first_games_terminate() {
    for game in 0..30 {
        let mut state = GameState::with_seed(1000 + game);
        let mut plies = 0;
        while !state.is_terminal() && plies < MAX_GAME_MOVES {
            let moves = legal_moves(&state);
            let mv = if moves.contains(&Move::Draw) {
                Move::Draw
            } else {
                moves[0].clone()
            };
            state = play(&state, mv);
            plies += 1;
        }
        let outcome = state.outcome.expect("game should be decided");
        match outcome.winner {
            Some(w) => assert!(w < 2),
            None => assert!(matches!(
                outcome.reason,
                WinReason::EmptyDeck | WinReason::TurnLimit
            )),
        }
        assert_conserved(&state);
    }
}

// =============================================================================
// Scripted scenarios
// =============================================================================

#[test]
fn test_seven_plays_revealed_ten() {
    let deck = stacked_deck("7S 4D 5D 6D 8D 9C 9D 9H 9S KC KD 3H TC");
    let state = GameState::deal(deck);
    assert_eq!(&state.deck[..2], &cards("3H TC")[..]);

    let s1 = play(
        &state,
        Move::PlayOneOff {
            card: card("7S"),
            target: None,
        },
    );
    assert_eq!(s1.phase(), Phase::Counter);
    let s2 = play(&s1, Move::DeclineCounter);
    assert_eq!(s2.phase(), Phase::ResolveSeven);
    assert_eq!(s2.acting_player(), 0);
    assert_conserved(&s2);

    let ten_for_points = Move::ResolveSeven {
        card: card("TC"),
        play: PlayAs::Points,
    };
    assert!(legal_moves(&s2).contains(&ten_for_points));

    let s3 = play(&s2, ten_for_points);
    assert_eq!(s3.players[0].point_total(), 10);
    assert!(s3.players[0].hand.contains(&card("3H")));
    assert!(!s3.players[0].hand.contains(&card("TC")));
    assert_eq!(s3.scrap, cards("7S"));
    assert_eq!(s3.current, 1);
    assert_conserved(&s3);
}

#[test]
fn test_seven_reveal_cannot_use_unrevealed_card() {
    let deck = stacked_deck("7S 4D 5D 6D 8D 9C 9D 9H 9S KC KD 3H TC");
    let state = GameState::deal(deck);
    let s1 = play(
        &state,
        Move::PlayOneOff {
            card: card("7S"),
            target: None,
        },
    );
    let s2 = play(&s1, Move::DeclineCounter);
    let result = apply_move(
        &s2,
        &Move::ResolveSeven {
            card: card("4D"),
            play: PlayAs::Points,
        },
    );
    assert!(matches!(result, Err(IllegalMove::WrongPending(_))));
}

/// P0 casts an Ace with points on both sides, then the players exchange
/// `twos` counters before someone declines.
fn ace_with_counters(twos: usize) -> GameState {
    let state = GameState::deal(stacked_deck("AC 2C 2H 3D 4D 2D 2S 5C 6C 7C 8C"));
    let s = play(&state, Move::PlayPoints(card("4D")));
    let s = play(&s, Move::PlayPoints(card("8C")));
    let mut s = play(
        &s,
        Move::PlayOneOff {
            card: card("AC"),
            target: None,
        },
    );
    let order = ["2D", "2C", "2S", "2H"];
    for c in order.iter().take(twos) {
        s = play(&s, Move::Counter(card(c)));
    }
    let s = play(&s, Move::DeclineCounter);
    assert_conserved(&s);
    s
}

#[test]
fn test_counter_chain_parity() {
    for twos in 0..=3 {
        let s = ace_with_counters(twos);
        let resolved = s.players[0].points.is_empty() && s.players[1].points.is_empty();
        assert_eq!(resolved, twos % 2 == 0, "chain of {twos}");
        assert_eq!(s.scrap.len(), 1 + twos + if resolved { 2 } else { 0 });
        assert_eq!(s.phase(), Phase::Main);
        assert_eq!(s.current, 1);
    }
}

#[test]
fn test_counter_alternates_waiting_player() {
    let mut state = GameState::deal(stacked_deck("AC 2C 2H 3D 4D 2D 2S 5C 6C 7C 8C"));
    state = play(&state, Move::PlayPoints(card("4D")));
    state = play(&state, Move::PlayPoints(card("8C")));
    state = play(
        &state,
        Move::PlayOneOff {
            card: card("AC"),
            target: None,
        },
    );
    assert_eq!(state.acting_player(), 1);
    state = play(&state, Move::Counter(card("2D")));
    assert_eq!(state.acting_player(), 0);
    assert_eq!(
        legal_moves(&state),
        vec![
            Move::Counter(card("2C")),
            Move::Counter(card("2H")),
            Move::DeclineCounter
        ]
    );
}

#[test]
fn test_two_kings_lower_threshold_to_seven() {
    let mut state = GameState::deal(stacked_deck("KS 3D 4D 5D 6D 9C 9D 9H 9S TC TD"));
    state.players[0].permanents = cards("KH");
    state.players[0].points = cards("7C");
    assert_eq!(state.players[0].point_threshold(), 14);
    assert!(state.outcome.is_none());

    let next = play(
        &state,
        Move::PlayPermanent {
            card: card("KS"),
            target: None,
        },
    );
    assert_eq!(next.players[0].point_threshold(), 7);
    assert_eq!(next.winner(), Some(0));
    assert_eq!(next.outcome.map(|o| o.reason), Some(WinReason::Points));
}

#[test]
fn test_queen_blocks_jack_steals() {
    let mut state = GameState::deal(stacked_deck("JC JH 4D 5D 6D 9C 9D 9H 9S TC TD"));
    state.players[1].points = cards("8S 7S");
    state.players[1].permanents = cards("QH");
    let moves = legal_moves(&state);
    let steals = moves
        .iter()
        .filter(|m| matches!(m, Move::PlayPermanent { target: Some(_), .. }))
        .count();
    assert_eq!(steals, 0);

    state.players[1].permanents.clear();
    let steals = legal_moves(&state)
        .iter()
        .filter(|m| matches!(m, Move::PlayPermanent { target: Some(_), .. }))
        .count();
    assert_eq!(steals, 4);
}

#[test]
fn test_two_on_jack_returns_stolen_card() {
    let mut state = GameState::deal(stacked_deck("2C 3D 4D 5D 6D 9C 9D 9H 9S TC TD"));
    state.players[1].jacks.push(JackPair {
        jack: card("JS"),
        stolen: card("8H"),
    });
    let s1 = play(
        &state,
        Move::PlayOneOff {
            card: card("2C"),
            target: Some(cuttle_rust::moves::Target::Permanent {
                owner: 1,
                card: card("JS"),
            }),
        },
    );
    let s2 = play(&s1, Move::DeclineCounter);
    assert_eq!(s2.players[0].points, cards("8H"));
    assert!(s2.players[1].jacks.is_empty());
    assert_eq!(s2.scrap, cards("JS 2C"));
}

#[test]
fn test_state_round_trips_through_json() {
    let deck = stacked_deck("7S 4D 5D 6D 8D 9C 9D 9H 9S KC KD 3H TC");
    let state = GameState::deal(deck);
    let s1 = play(
        &state,
        Move::PlayOneOff {
            card: card("7S"),
            target: None,
        },
    );
    let s2 = play(&s1, Move::DeclineCounter);

    let json = serde_json::to_string(&s2).unwrap();
    let back: GameState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, s2);

    let moves = legal_moves(&s2);
    let json = serde_json::to_string(&moves).unwrap();
    let back: Vec<Move> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, moves);
}
