use std::collections::HashSet;

use super::*;

// =============================================================
// Fixtures
// =============================================================

fn empty_grid(rows: usize, cols: usize) -> Vec<Vec<u8>> {
    vec![vec![0; cols]; rows]
}

fn wire(grid: Vec<Vec<u8>>, current_turn: &str, status: &str) -> GameData {
    GameData {
        game_id: "g-1".to_owned(),
        player_one_username: "alice".to_owned(),
        player_two_username: Some("bob".to_owned()),
        rows: grid.len(),
        columns: grid.first().map_or(0, Vec::len),
        board: grid,
        current_turn_username: Some(current_turn.to_owned()),
        start_time: None,
        end_time: None,
        status_name: status.to_owned(),
    }
}

fn game_for(viewer: &str, grid: Vec<Vec<u8>>, current_turn: &str, status: &str) -> Game {
    Game::from_wire(wire(grid, current_turn, status), viewer).expect("valid game")
}

fn loaded(grid: Vec<Vec<u8>>, current_turn: &str, status: &str) -> GameStore {
    let mut store = GameStore::new();
    assert!(store.initialize(game_for("alice", grid, current_turn, status), false));
    store
}

struct StubSource(Option<Game>);

#[async_trait::async_trait]
impl GameSource for StubSource {
    async fn fetch_game(&self, game_id: &str) -> Result<Game, ApiError> {
        self.0.clone().ok_or_else(|| ApiError::NotFound(format!("/game/{game_id}")))
    }
}

// =============================================================
// Wire conversion
// =============================================================

#[test]
fn from_wire_parses_timestamps_and_defaults() {
    let mut data = wire(empty_grid(6, 7), "alice", "In Progress");
    data.player_two_username = None;
    data.current_turn_username = None;
    data.start_time = Some("2024-05-01T12:00:00Z".to_owned());

    let game = Game::from_wire(data, "alice").expect("game");
    assert_eq!(game.player_two, "");
    assert_eq!(game.current_turn, "");
    assert_eq!(game.start_time.map(OffsetDateTime::unix_timestamp), Some(1_714_564_800));
    assert!(game.end_time.is_none());
}

#[test]
fn from_wire_rejects_bad_timestamp() {
    let mut data = wire(empty_grid(6, 7), "alice", "In Progress");
    data.end_time = Some("yesterday".to_owned());
    assert!(matches!(Game::from_wire(data, "alice"), Err(GameDataError::Timestamp { .. })));
}

#[test]
fn from_wire_rejects_misshapen_board() {
    let mut data = wire(empty_grid(6, 7), "alice", "In Progress");
    data.rows = 5;
    assert!(matches!(Game::from_wire(data, "alice"), Err(GameDataError::Board(_))));
}

#[test]
fn from_wire_rejects_oversized_declared_columns() {
    let data: GameData = serde_json::from_str(
        r#"{"game_id":"g-1","player_one_username":"alice","player_two_username":"bob",
            "rows":2,"columns":18446744073709551615,"board":[[0],[0]],
            "current_turn_username":"alice","status_name":"In Progress"}"#,
    )
    .expect("decode");
    assert!(matches!(
        Game::from_wire(data, "alice"),
        Err(GameDataError::Board(BoardError::ColumnCount { row: 0, actual: 1, .. }))
    ));
}

// =============================================================
// Initialize
// =============================================================

#[test]
fn viewer_token_follows_player_slot() {
    let store = loaded(empty_grid(6, 7), "alice", "In Progress");
    assert_eq!(store.token(), Some(Token::One));

    let mut store = GameStore::new();
    store.initialize(game_for("bob", empty_grid(6, 7), "alice", "In Progress"), false);
    assert_eq!(store.token(), Some(Token::Two));
}

#[test]
fn empty_rows_reflect_loaded_board() {
    let mut grid = empty_grid(3, 3);
    grid[2][0] = 1;
    grid[1][0] = 2;
    grid[0][1] = 1;
    grid[1][1] = 2;
    grid[2][1] = 1;

    let store = loaded(grid, "alice", "In Progress");
    assert_eq!(store.empty_rows(), &[Some(0), None, Some(2)]);
    assert!(store.is_column_full(1));
    assert!(!store.is_column_full(0));
}

#[test]
fn second_initialize_is_ignored_unless_forced() {
    let mut store = loaded(empty_grid(6, 7), "alice", "In Progress");

    let mut grid = empty_grid(6, 7);
    grid[5][3] = 2;
    assert!(!store.initialize(game_for("alice", grid.clone(), "alice", "In Progress"), false));
    assert_eq!(store.get_token(5, 3), None);

    assert!(store.initialize(game_for("alice", grid, "alice", "In Progress"), true));
    assert_eq!(store.get_token(5, 3), Some(Token::Two));
    assert_eq!(store.empty_rows()[3], Some(4));
}

#[test]
fn initialize_highlights_historical_win_without_stamping() {
    let mut grid = empty_grid(6, 7);
    for col in 0..4 {
        grid[5][col] = 1;
    }
    let store = loaded(grid, "bob", "Player 1 Wins");

    assert_eq!(store.connect_tokens().len(), 4);
    assert_eq!(store.winner_token(), Some(Token::One));
    assert!(store.game().expect("game").end_time.is_none());
    assert_eq!(store.phase(), Phase::Concluded);
    assert!(!store.loading());
}

// =============================================================
// Local clicks
// =============================================================

#[test]
fn click_drops_token_and_passes_turn() {
    let mut store = loaded(empty_grid(6, 7), "alice", "In Progress");
    assert!(store.is_my_turn());

    let placement = store.on_cell_click(3).expect("placed");
    assert_eq!(placement, Placement { row: 5, col: 3, token: Token::One, turn_flipped: true });
    assert_eq!(store.get_token(5, 3), Some(Token::One));
    assert_eq!(store.empty_rows()[3], Some(4));
    assert!(!store.is_my_turn());

    let game = store.game().expect("game");
    assert_eq!(game.current_turn, "bob");
    assert!(game.start_time.is_some());
}

#[test]
fn click_out_of_turn_changes_nothing() {
    let mut store = loaded(empty_grid(6, 7), "bob", "In Progress");
    assert_eq!(store.on_cell_click(0), Err(MoveRejection::NotYourTurn));
    assert_eq!(store.get_token(5, 0), None);
    assert_eq!(store.empty_rows()[0], Some(5));
}

#[test]
fn click_after_game_end_is_rejected() {
    let mut store = loaded(empty_grid(6, 7), "alice", "It's a Draw");
    assert_eq!(store.on_cell_click(0), Err(MoveRejection::GameEnded));
}

#[test]
fn click_on_full_or_missing_column_is_rejected() {
    let mut store = loaded(empty_grid(1, 2), "alice", "In Progress");
    store.on_cell_click(0).expect("first");
    store.update_game(2, 0, 1).expect("remote");

    assert_eq!(store.empty_rows()[0], None);
    assert_eq!(store.on_cell_click(0), Err(MoveRejection::ColumnFull(0)));
    assert_eq!(store.on_cell_click(7), Err(MoveRejection::ColumnOutOfRange(7)));
}

#[test]
fn click_without_game_is_rejected() {
    let mut store = GameStore::new();
    assert_eq!(store.on_cell_click(0), Err(MoveRejection::NotLoaded));
    assert!(!store.is_my_turn());
    assert_eq!(store.phase(), Phase::Uninitialized);
}

#[test]
fn existing_start_time_is_kept() {
    let mut data = wire(empty_grid(6, 7), "alice", "In Progress");
    data.start_time = Some("2024-05-01T12:00:00Z".to_owned());
    let mut store = GameStore::new();
    store.initialize(Game::from_wire(data, "alice").expect("game"), false);

    store.on_cell_click(0).expect("placed");
    let start = store.game().and_then(|g| g.start_time).expect("start");
    assert_eq!(start.unix_timestamp(), 1_714_564_800);
}

// =============================================================
// Remote updates
// =============================================================

#[test]
fn opponent_move_returns_turn_to_viewer() {
    let mut store = loaded(empty_grid(6, 7), "alice", "In Progress");
    store.on_cell_click(0).expect("local");

    let placement = store.update_game(2, 5, 1).expect("remote");
    assert!(placement.turn_flipped);
    assert_eq!(store.get_token(5, 1), Some(Token::Two));
    assert_eq!(store.empty_rows()[1], Some(4));
    assert!(store.is_my_turn());
}

#[test]
fn inbound_move_above_existing_token_lowers_landing_row() {
    let mut grid = empty_grid(6, 7);
    grid[5][2] = 1;
    let mut store = loaded(grid, "bob", "In Progress");
    assert_eq!(store.empty_rows()[2], Some(4));

    let event = protocol::parse_event(r#"{"event_type":"player_move","player_token":2,"message":{"row":4,"col":2}}"#)
        .expect("event");
    let protocol::Event::Move(m) = event else { panic!("expected move, got {event:?}") };
    store.update_game(m.player_token, m.row, m.column).expect("applied");

    assert_eq!(store.get_token(4, 2), Some(Token::Two));
    assert_eq!(store.empty_rows()[2], Some(3));
    assert!(store.is_my_turn());
}

#[test]
fn duplicate_remote_event_is_idempotent() {
    let mut store = loaded(empty_grid(6, 7), "bob", "In Progress");
    store.update_game(2, 5, 2).expect("first");
    let rows_after_first = store.empty_rows().to_vec();

    let again = store.update_game(2, 5, 2).expect("duplicate");
    assert!(!again.turn_flipped);
    assert_eq!(store.empty_rows(), rows_after_first.as_slice());
    assert_eq!(store.empty_rows()[2], Some(4));
}

#[test]
fn echo_of_own_move_keeps_turn() {
    let mut store = loaded(empty_grid(6, 7), "alice", "In Progress");
    store.on_cell_click(4).expect("local");

    let echo = store.update_game(1, 5, 4).expect("echo");
    assert!(!echo.turn_flipped);
    assert_eq!(store.game().expect("game").current_turn, "bob");
    assert_eq!(store.empty_rows()[4], Some(4));
}

#[test]
fn remote_move_outside_board_is_ignored() {
    let mut store = loaded(empty_grid(6, 7), "bob", "In Progress");
    assert_eq!(store.update_game(2, 6, 0), Err(MoveRejection::OutOfBounds { row: 6, col: 0 }));
    assert_eq!(store.update_game(2, 0, 7), Err(MoveRejection::OutOfBounds { row: 0, col: 7 }));
    assert_eq!(store.update_game(3, 5, 0), Err(MoveRejection::UnknownToken(3)));
    assert_eq!(store.game().expect("game").current_turn, "bob");
}

#[test]
fn undo_clears_cell_and_returns_turn_to_mover() {
    let mut store = loaded(empty_grid(6, 7), "alice", "In Progress");
    store.on_cell_click(2).expect("local");

    let undone = store.undo_move(1, 5, 2).expect("undo");
    assert!(undone.turn_flipped);
    assert_eq!(store.get_token(5, 2), None);
    assert_eq!(store.empty_rows()[2], Some(5));
    assert!(store.is_my_turn());
}

// =============================================================
// Status and win highlighting
// =============================================================

#[test]
fn live_win_status_highlights_and_stamps_end() {
    let mut store = loaded(empty_grid(6, 7), "bob", "In Progress");
    for col in 0..4 {
        store.update_game(2, 5, col).expect("remote");
    }
    assert!(store.connect_tokens().is_empty());

    store.set_status("Player 2 Wins");
    store.set_all_connected(true);

    let cells = store.connect_tokens().iter().copied().collect::<HashSet<_>>();
    let expected = (0..4).map(|col| Coord::new(5, col)).collect::<HashSet<_>>();
    assert_eq!(cells, expected);
    assert!(store.is_connected(5, 0));
    assert_eq!(store.winner_token(), Some(Token::Two));
    assert!(store.game().expect("game").end_time.is_some());
    assert_eq!(store.phase(), Phase::Concluded);
}

#[test]
fn live_draw_stamps_end_without_highlight() {
    let mut store = loaded(empty_grid(6, 7), "alice", "In Progress");
    store.set_status("Draw");
    store.set_all_connected(true);

    assert!(store.connect_tokens().is_empty());
    assert_eq!(store.winner_token(), None);
    assert!(store.game().expect("game").end_time.is_some());
}

#[test]
fn existing_end_time_is_not_overwritten() {
    let mut data = wire(empty_grid(6, 7), "alice", "In Progress");
    data.end_time = Some("2024-05-01T12:30:00Z".to_owned());
    let mut store = GameStore::new();
    store.initialize(Game::from_wire(data, "alice").expect("game"), false);

    store.set_status("Draw");
    store.set_all_connected(true);
    let end = store.game().and_then(|g| g.end_time).expect("end");
    assert_eq!(end.unix_timestamp(), 1_714_566_600);
}

#[test]
fn in_progress_status_clears_highlight() {
    let mut grid = empty_grid(6, 7);
    for col in 0..4 {
        grid[5][col] = 1;
    }
    let mut store = loaded(grid, "bob", "Player 1 Wins");
    assert!(!store.connect_tokens().is_empty());

    store.set_status("In Progress");
    store.set_all_connected(true);
    assert!(store.connect_tokens().is_empty());
    assert!(store.game().expect("game").end_time.is_none());
}

#[test]
fn status_helpers_match_backend_strings() {
    assert!(status_indicates_win("Player 1 Wins"));
    assert!(status_indicates_draw("It's a draw"));
    assert!(status_concludes("DRAW"));
    assert!(!status_concludes("In Progress"));
    assert!(!status_concludes("Created"));
}

#[test]
fn status_winner_reads_player_slot() {
    assert_eq!(status_winner("Player 1 Wins"), Some(Token::One));
    assert_eq!(status_winner("player two wins"), Some(Token::Two));
    assert_eq!(status_winner("Draw"), None);
    assert_eq!(status_winner("Player 2 joined"), None);
}

#[test]
fn set_status_without_game_is_ignored() {
    let mut store = GameStore::new();
    store.set_status("Player 1 Wins");
    store.set_all_connected(true);
    assert!(store.game().is_none());
    assert!(store.connect_tokens().is_empty());
}

// =============================================================
// Hover
// =============================================================

#[test]
fn hover_is_suppressed_off_turn_and_on_full_columns() {
    let mut store = loaded(empty_grid(1, 3), "alice", "In Progress");
    store.on_mouse_over(1);
    assert_eq!(store.column_highlight(), Some(1));

    store.on_cell_click(1).expect("local");
    assert_eq!(store.column_highlight(), None, "not my turn");

    store.update_game(2, 0, 2).expect("remote");
    assert_eq!(store.column_highlight(), None, "column 1 is full");

    store.on_mouse_over(0);
    assert_eq!(store.column_highlight(), Some(0));
    store.on_mouse_out();
    assert_eq!(store.column_highlight(), None);
}

// =============================================================
// Fetching
// =============================================================

#[tokio::test]
async fn load_moves_to_in_progress() {
    let mut store = GameStore::new();
    let source = StubSource(Some(game_for("alice", empty_grid(6, 7), "alice", "In Progress")));

    store.load("g-1", &source).await.expect("load");
    assert_eq!(store.phase(), Phase::InProgress);
    assert!(!store.loading());
}

#[tokio::test]
async fn failed_load_is_not_found() {
    let mut store = GameStore::new();
    let err = store.load("missing", &StubSource(None)).await.expect_err("not found");

    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(store.phase(), Phase::NotFound);
}

#[tokio::test]
async fn set_game_data_replaces_snapshot() {
    let mut store = loaded(empty_grid(6, 7), "alice", "In Progress");
    store.on_cell_click(0).expect("local");
    store.set_loading(true);
    assert_eq!(store.phase(), Phase::Loading);

    let mut grid = empty_grid(6, 7);
    grid[5][0] = 1;
    grid[5][6] = 2;
    let source = StubSource(Some(game_for("alice", grid, "alice", "In Progress")));

    store.set_game_data(&source).await.expect("refresh");
    assert_eq!(store.get_token(5, 6), Some(Token::Two));
    assert_eq!(store.empty_rows()[6], Some(4));
    assert!(store.is_my_turn());
    assert_eq!(store.phase(), Phase::InProgress);
}

#[tokio::test]
async fn set_game_data_requires_loaded_game() {
    let mut store = GameStore::new();
    let source = StubSource(None);
    assert!(matches!(store.set_game_data(&source).await, Err(ApiError::NotLoaded)));
    assert_eq!(store.phase(), Phase::Uninitialized);
}
