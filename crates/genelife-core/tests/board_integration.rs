use genelife_core::{Board, BoardConfig, Kind, Turn};

fn scenario_config(cols: u32, rows: u32, pool: Vec<Kind>) -> BoardConfig {
    BoardConfig {
        cols,
        rows,
        rng_seed: Some(11),
        initial_pool: pool,
        ..BoardConfig::default()
    }
}

#[test]
fn explode_death_kills_pending_births() {
    // An Explode cell at (2, 2) with a single live neighbor dies of
    // isolation. The base rule births (1, 3) and (2, 3) -- both adjacent to
    // the exploder -- so the kill queue must cancel them.
    let mut board = Board::new(scenario_config(5, 5, vec![Kind::Vanilla])).expect("board");
    board.set_cell(2, 2, true, Kind::Explode);
    board.set_cell(1, 2, true, Kind::Vanilla);
    board.set_cell(1, 4, true, Kind::Vanilla);

    let summary = board.step();
    assert_eq!(summary.births, 2);
    assert_eq!(summary.deaths, 3);
    assert_eq!(summary.survivors, 0);
    // Two birth awards plus +3 for the explode death.
    assert_eq!(summary.score_delta, 5);
    assert_eq!(summary.total_alive, 0);
    assert_eq!(board.grid().alive_count(), 0);
}

#[test]
fn guardian_death_revives_one_dead_neighbor() {
    let mut board = Board::new(scenario_config(5, 5, vec![Kind::Photosyn])).expect("board");
    board.set_cell(2, 2, true, Kind::Guardian);

    let summary = board.step();
    assert_eq!(summary.deaths, 1);
    assert_eq!(summary.score_delta, 1);
    assert_eq!(summary.total_alive, 1);

    // Exactly one of the eight neighbors came back, with a fresh pool kind.
    let mut revived = 0;
    for (nx, ny) in [
        (1, 1),
        (2, 1),
        (3, 1),
        (1, 2),
        (3, 2),
        (1, 3),
        (2, 3),
        (3, 3),
    ] {
        let cell = board.cell(nx, ny).expect("cell");
        if cell.alive {
            revived += 1;
            assert_eq!(cell.kind, Kind::Photosyn);
            assert_eq!(cell.age, 1);
        }
    }
    assert_eq!(revived, 1);
    assert!(!board.cell(2, 2).expect("cell").alive);
}

#[test]
fn guardian_scores_even_without_a_target() {
    // On a 1x1 board every neighbor coordinate is out of bounds, so the
    // dying guardian has nothing to protect but still earns its point.
    let mut board = Board::new(scenario_config(1, 1, vec![Kind::Vanilla])).expect("board");
    board.set_cell(0, 0, true, Kind::Guardian);

    let summary = board.step();
    assert_eq!(summary.deaths, 1);
    assert_eq!(summary.score_delta, 1);
    assert_eq!(summary.total_alive, 0);
}

#[test]
fn protect_overrides_kill_for_shared_coordinate() {
    // The exploder at (0, 0) and the guardian at (2, 2) both die this
    // step. The kill queue covers (1, 0), (0, 1), and (1, 1); the
    // guardian's only dead-in-next neighbor is (1, 1), so that coordinate
    // lands in both queues. The fixed kill -> protect -> convert pass
    // order means protection wins liveness while the killed births stay
    // dead.
    let mut board = Board::new(scenario_config(3, 3, vec![Kind::Photosyn])).expect("board");
    board.set_cell(0, 0, true, Kind::Explode);
    board.set_cell(2, 2, true, Kind::Guardian);
    board.set_cell(1, 1, true, Kind::Vanilla);
    board.set_cell(2, 0, true, Kind::Vanilla);
    board.set_cell(0, 2, true, Kind::Vanilla);

    let summary = board.step();
    assert_eq!(summary.births, 4);
    assert_eq!(summary.deaths, 5);
    assert_eq!(summary.survivors, 0);
    // Four birth awards, +3 for the explode death, +1 for the guardian.
    assert_eq!(summary.score_delta, 8);
    assert_eq!(summary.total_alive, 3);

    // Protected despite the overlapping kill: alive, freshly drawn kind,
    // age continued from the previous generation.
    let protected = board.cell(1, 1).expect("cell");
    assert!(protected.alive);
    assert_eq!(protected.kind, Kind::Photosyn);
    assert_eq!(protected.age, 2);

    // Births inside the blast stay dead; the two outside survive it.
    for (x, y) in [(1, 0), (0, 1)] {
        assert!(!board.cell(x, y).expect("cell").alive);
    }
    for (x, y) in [(2, 1), (1, 2)] {
        let cell = board.cell(x, y).expect("cell");
        assert!(cell.alive);
        assert_eq!(cell.age, 1);
    }
}

#[test]
fn copy_birth_converts_one_live_neighbor() {
    // A vertical blinker flips horizontal; both births draw Copy from the
    // pool and each targets the surviving center cell.
    let mut board = Board::new(scenario_config(3, 3, vec![Kind::Copy])).expect("board");
    board.set_cell(1, 0, true, Kind::Vanilla);
    board.set_cell(1, 1, true, Kind::Vanilla);
    board.set_cell(1, 2, true, Kind::Vanilla);

    let summary = board.step();
    assert_eq!(summary.births, 2);
    assert_eq!(summary.deaths, 2);
    assert_eq!(summary.survivors, 1);
    // Two birth awards plus +1 per copy conversion.
    assert_eq!(summary.score_delta, 4);
    assert_eq!(summary.total_alive, 3);

    let center = board.cell(1, 1).expect("cell");
    assert!(center.alive);
    assert_eq!(center.kind, Kind::Copy);
    assert_eq!(center.age, 2);
    for (x, y) in [(0, 1), (2, 1)] {
        let cell = board.cell(x, y).expect("cell");
        assert!(cell.alive);
        assert_eq!(cell.kind, Kind::Copy);
        assert_eq!(cell.age, 1);
    }
}

#[test]
fn photosyn_scores_per_surviving_turn() {
    let mut board = Board::new(scenario_config(4, 4, vec![Kind::Vanilla])).expect("board");
    for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
        board.set_cell(x, y, true, Kind::Photosyn);
    }

    let summary = board.step();
    assert_eq!(summary.survivors, 4);
    assert_eq!(summary.score_delta, 8);
    assert_eq!(summary.total_score, 8);

    let summary = board.step();
    assert_eq!(summary.score_delta, 8);
    assert_eq!(summary.total_score, 16);
    assert_eq!(board.score(), 16);
}

#[test]
fn statistics_track_population_by_kind() {
    let mut board = Board::new(scenario_config(6, 6, vec![Kind::Vanilla])).expect("board");
    board.set_cell(0, 0, true, Kind::Photosyn);
    board.set_cell(2, 0, true, Kind::Photosyn);
    board.set_cell(4, 0, true, Kind::Explode);
    board.set_cell(0, 2, true, Kind::Vanilla);

    let stats = board.statistics();
    assert_eq!(stats.turn, Turn::zero());
    assert_eq!(stats.total_alive, 4);
    assert_eq!(stats.count_of(Kind::Photosyn), 2);
    assert_eq!(stats.count_of(Kind::Explode), 1);
    assert_eq!(stats.count_of(Kind::Vanilla), 1);
    assert_eq!(stats.count_of(Kind::Guardian), 0);
    assert_eq!(stats.counts_by_kind.iter().sum::<usize>(), stats.total_alive);
}

#[test]
fn summaries_accumulate_in_history() {
    let mut board = Board::new(scenario_config(4, 4, vec![Kind::Vanilla])).expect("board");
    for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
        board.set_cell(x, y, true, Kind::Vanilla);
    }
    let first = board.step();
    let second = board.step();
    let recorded: Vec<_> = board.history().cloned().collect();
    assert_eq!(recorded, vec![first, second]);
    assert_eq!(recorded[1].turn, Turn(2));
}
