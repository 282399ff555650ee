//! Scenario tests for a single player's session state.

use strictly_wordgrid::{
    Board, ClientIntent, CommitOutcome, Coord, Glyph, PlayerId, RackAssignment, Role,
    RosterEntry, ServerEvent, SessionInvariants, SessionState, InvariantSet, TileId, Verdict,
};

fn me() -> PlayerId {
    PlayerId::new("me")
}

fn other() -> PlayerId {
    PlayerId::new("other")
}

fn letters(s: &str) -> Vec<Glyph> {
    s.chars().map(Glyph::new).collect()
}

/// Session where the local player holds `rack` and the turn.
fn my_turn_with(rack: &str) -> SessionState {
    let mut state = SessionState::new(me(), 20, Role::Member);
    state.apply_event(ServerEvent::LettersDistributed {
        players: vec![
            RackAssignment::new(me(), Some("Me".into()), letters(rack), Some(0), Role::Member),
            RackAssignment::new(other(), Some("Other".into()), letters("QQQQQQQ"), Some(0), Role::Member),
        ],
    });
    state.apply_event(ServerEvent::TurnChanged { turn: me() });
    state
}

fn tile_with(state: &SessionState, letter: char) -> TileId {
    *state
        .rack()
        .tiles()
        .iter()
        .find(|tile| tile.glyph().letter() == letter)
        .expect("tile in rack")
        .id()
}

fn sorted(mut glyphs: Vec<Glyph>) -> Vec<Glyph> {
    glyphs.sort();
    glyphs
}

fn stage_ab(state: &mut SessionState) {
    let a = tile_with(state, 'A');
    state.stage_tile(Coord::new(0, 0), a).unwrap();
    let b = tile_with(state, 'B');
    state.stage_tile(Coord::new(0, 1), b).unwrap();
}

#[test]
fn test_invariants_hold_across_stage_sequence() {
    let mut state = my_turn_with("ABCDEFG");
    for (i, letter) in "ABCDEFG".chars().enumerate() {
        let tile = tile_with(&state, letter);
        state.stage_tile(Coord::new(10, i), tile).unwrap();
        assert!(SessionInvariants::check_all(&state).is_ok());
        assert_eq!(state.rack().len() + state.staging().len(), 7);
    }
}

#[test]
fn test_stage_then_cancel_restores_board() {
    let mut state = my_turn_with("ABCDEFG");
    let before = state.board().clone();
    let rack_before = sorted(state.rack().glyphs());

    stage_ab(&mut state);
    let c = tile_with(&state, 'C');
    state.stage_tile(Coord::new(1, 0), c).unwrap();

    let echo = state.cancel();
    assert_eq!(state.board(), &before);
    assert_eq!(sorted(state.rack().glyphs()), rack_before);
    assert!(state.staging().is_empty());
    assert_eq!(echo, Some(ClientIntent::CancelMove { board: before }));
}

#[test]
fn test_rejected_commit_equals_cancel() {
    let mut rejected = my_turn_with("ABCDEFG");
    let mut cancelled = my_turn_with("ABCDEFG");
    stage_ab(&mut rejected);
    stage_ab(&mut cancelled);

    rejected.begin_commit().unwrap();
    let outcome = rejected.resolve_commit(Verdict::Rejected);
    let echo = cancelled.cancel();

    assert_eq!(rejected.board(), cancelled.board());
    assert_eq!(sorted(rejected.rack().glyphs()), sorted(cancelled.rack().glyphs()));
    match (outcome, echo) {
        (CommitOutcome::Rejected { cancel_echo }, Some(echo)) => assert_eq!(cancel_echo, echo),
        other => panic!("unexpected outcomes: {other:?}"),
    }
}

#[test]
fn test_board_snapshot_is_idempotent() {
    let mut state = SessionState::new(me(), 20, Role::Member);
    let snapshot = Board::standard()
        .place(Coord::new(9, 9), Glyph::new('W'))
        .unwrap();

    state.apply_event(ServerEvent::BoardPlaced {
        board: snapshot.clone(),
    });
    let once = state.board().clone();
    state.apply_event(ServerEvent::BoardPlaced { board: snapshot });
    assert_eq!(state.board(), &once);
}

#[test]
fn test_turn_query_follows_events() {
    let mut state = SessionState::new(me(), 20, Role::Member);
    state.apply_event(ServerEvent::TurnChanged { turn: other() });
    assert!(!state.is_local_players_turn());
    state.apply_event(ServerEvent::TurnChanged { turn: me() });
    assert!(state.is_local_players_turn());
}

#[test]
fn test_accepted_commit_scenario() {
    let mut state = my_turn_with("ABCDEFG");
    stage_ab(&mut state);

    let request = state.begin_commit().unwrap();
    assert_eq!(request.placed_letters.len(), 2);

    let outcome = state.resolve_commit(Verdict::Accepted(12));
    let score_request = match outcome {
        CommitOutcome::Accepted {
            points,
            score_request,
        } => {
            assert_eq!(points, 12);
            score_request
        }
        other => panic!("expected acceptance, got {other:?}"),
    };
    assert_eq!(
        score_request,
        ClientIntent::UpdateScore {
            uid: me(),
            score: 12
        }
    );

    // The authority answers the score request with the new roster.
    state.apply_event(ServerEvent::ScoreUpdated(vec![
        RosterEntry::new(me(), "Me".into(), 12, Role::Member),
        RosterEntry::new(other(), "Other".into(), 0, Role::Member),
    ]));

    assert_eq!(state.board().get(Coord::new(0, 0)), Some(Glyph::new('A')));
    assert_eq!(state.board().get(Coord::new(0, 1)), Some(Glyph::new('B')));
    assert!(state.staging().is_empty());
    assert_eq!(state.scores().score_of(&me()), Some(12));
    assert_eq!(state.rack().len(), 5);
}

#[test]
fn test_rejected_commit_scenario() {
    let mut state = my_turn_with("ABCDEFG");
    stage_ab(&mut state);

    state.begin_commit().unwrap();
    state.resolve_commit(Verdict::Rejected);

    assert!(state.board().is_empty_at(Coord::new(0, 0)));
    assert!(state.board().is_empty_at(Coord::new(0, 1)));
    assert_eq!(state.rack().len(), 7);
    assert!(state.staging().is_empty());
}

#[test]
fn test_end_turn_requests_missing_tiles() {
    let mut state = my_turn_with("ABCD");
    let plan = state.begin_end_turn().unwrap();
    assert_eq!(plan.request.needed, 3);
    assert_eq!(plan.cancel_echo, None);

    let intent = state.complete_end_turn(letters("XYZ"));
    assert_eq!(intent, Some(ClientIntent::EndTurn));
    assert_eq!(state.rack().len(), 7);
}

#[test]
fn test_end_turn_rolls_back_staged_tiles_first() {
    let mut state = my_turn_with("ABCDEFG");
    stage_ab(&mut state);
    let plan = state.begin_end_turn().unwrap();
    assert!(matches!(plan.cancel_echo, Some(ClientIntent::CancelMove { .. })));
    assert_eq!(plan.request.needed, 0);
    assert!(state.board().is_empty_at(Coord::new(0, 0)));
}

#[test]
fn test_stage_onto_confirmed_glyph_is_noop() {
    let mut state = my_turn_with("ABCDEFG");
    let snapshot = Board::standard()
        .place(Coord::new(4, 4), Glyph::new('Z'))
        .unwrap();
    state.apply_event(ServerEvent::BoardPlaced { board: snapshot });
    let board_before = state.board().clone();

    let a = tile_with(&state, 'A');
    assert!(state.stage_tile(Coord::new(4, 4), a).is_err());
    assert_eq!(state.board(), &board_before);
    assert_eq!(state.rack().len(), 7);
    assert!(state.staging().is_empty());
}

#[test]
fn test_older_snapshot_keeps_staged_cells() {
    let mut state = my_turn_with("ABCDEFG");
    stage_ab(&mut state);
    let staged_board = state.board().clone();

    // A late snapshot that predates the second placement.
    let echo = state.apply_event(ServerEvent::BoardPlaced {
        board: Board::standard()
            .place(Coord::new(0, 0), Glyph::new('A'))
            .unwrap(),
    });

    assert_eq!(state.board(), &staged_board);
    assert_eq!(state.staging().len(), 2);
    assert_eq!(state.rack().len(), 5);
    assert_eq!(echo, Some(ClientIntent::PlaceLetter { board: staged_board }));
    assert!(SessionInvariants::check_all(&state).is_ok());
}

#[test]
fn test_out_of_order_echoes_then_cancel_clears_everything() {
    let mut state = my_turn_with("ABCDEFG");
    stage_ab(&mut state);

    let echo1 = Board::standard()
        .place(Coord::new(0, 0), Glyph::new('A'))
        .unwrap();
    let echo2 = echo1.place(Coord::new(0, 1), Glyph::new('B')).unwrap();
    state.apply_event(ServerEvent::BoardPlaced { board: echo1 });
    let echo = state.apply_event(ServerEvent::BoardPlaced { board: echo2 });
    assert_eq!(echo, None);
    assert_eq!(state.rack().len(), 5);

    state.cancel();
    assert!(state.board().is_empty_at(Coord::new(0, 0)));
    assert!(state.board().is_empty_at(Coord::new(0, 1)));
    assert_eq!(state.rack().len(), 7);
    assert!(state.staging().is_empty());
}

#[test]
fn test_snapshot_taking_staged_cell_returns_tile() {
    let mut state = my_turn_with("ABCDEFG");
    stage_ab(&mut state);

    let taken = Board::standard()
        .place(Coord::new(0, 0), Glyph::new('A'))
        .unwrap()
        .place(Coord::new(0, 1), Glyph::new('Q'))
        .unwrap();
    let echo = state.apply_event(ServerEvent::BoardPlaced {
        board: taken.clone(),
    });

    assert_eq!(echo, None);
    assert_eq!(state.board(), &taken);
    assert_eq!(state.staging().len(), 1);
    assert_eq!(state.rack().len(), 6);
    assert!(state.rack().glyphs().contains(&Glyph::new('B')));
    assert!(SessionInvariants::check_all(&state).is_ok());
}

#[test]
fn test_verdict_after_staging_shrank_credits_nothing() {
    let mut state = my_turn_with("ABCDEFG");
    stage_ab(&mut state);
    state.begin_commit().unwrap();

    state.apply_event(ServerEvent::BoardPlaced {
        board: Board::standard()
            .place(Coord::new(0, 0), Glyph::new('A'))
            .unwrap()
            .place(Coord::new(0, 1), Glyph::new('Q'))
            .unwrap(),
    });

    assert_eq!(state.resolve_commit(Verdict::Accepted(12)), CommitOutcome::Stale);
    assert_eq!(state.scores().score_of(&me()), Some(0));
    assert_eq!(state.staging().len(), 1);
}

#[test]
fn test_letters_event_is_idempotent() {
    let mut state = my_turn_with("ABC");
    let ids: Vec<_> = state.rack().tiles().iter().map(|t| *t.id()).collect();
    state.apply_event(ServerEvent::LettersDistributed {
        players: vec![RackAssignment::new(me(), None, letters("ABC"), None, Role::Member)],
    });
    let again: Vec<_> = state.rack().tiles().iter().map(|t| *t.id()).collect();
    assert_eq!(ids, again, "redelivery must not reissue tile ids");
}

#[test]
fn test_roster_from_letters_event() {
    let state = my_turn_with("ABC");
    let names: Vec<_> = state
        .scores()
        .players()
        .iter()
        .map(|p| p.display_name().as_str())
        .collect();
    assert_eq!(names, ["Me", "Other"]);
}
