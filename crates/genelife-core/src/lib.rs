//! Core simulation engine for the genelife workspace.
//!
//! A fixed-size Conway-style board where every live cell carries a [`Kind`]
//! tag. Kinds trigger side effects when a cell is born, survives, or dies:
//! forced deaths, protection of neighbors, and kind conversion. The engine
//! evaluates the base rule over a double-buffered grid, runs the kind hooks
//! against the tentative next generation, applies the queued side effects,
//! and commits the result, all within a single synchronous step.

use rand::{Rng, SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

/// Special-effect category carried by a live cell.
///
/// `Vanilla` is the no-effect default every dead cell is normalized to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Kind {
    /// No special behavior.
    #[default]
    Vanilla,
    /// Awards bonus score for every turn it survives.
    Photosyn,
    /// Kills all eight neighbors when it dies.
    Explode,
    /// Revives one dead neighbor when it dies.
    Guardian,
    /// Converts one live neighbor to `Copy` when it is born.
    Copy,
}

impl Kind {
    /// All kind variants in declaration order.
    pub const ALL: [Kind; 5] = [
        Kind::Vanilla,
        Kind::Photosyn,
        Kind::Explode,
        Kind::Guardian,
        Kind::Copy,
    ];

    /// Number of kind variants.
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index used for per-kind statistics buckets.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Vanilla => "vanilla",
            Kind::Photosyn => "photosyn",
            Kind::Explode => "explode",
            Kind::Guardian => "guardian",
            Kind::Copy => "copy",
        };
        f.write_str(name)
    }
}

/// One grid cell. Dead cells are always normalized to `Vanilla` with age 0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Cell {
    pub alive: bool,
    pub kind: Kind,
    /// Consecutive turns this cell has been alive; 1 on birth, 0 when dead.
    pub age: u32,
}

impl Cell {
    /// The normalized dead cell.
    pub const DEAD: Cell = Cell {
        alive: false,
        kind: Kind::Vanilla,
        age: 0,
    };

    /// A freshly born cell of the given kind.
    #[must_use]
    pub const fn born(kind: Kind) -> Self {
        Self {
            alive: true,
            kind,
            age: 1,
        }
    }
}

/// Ordered multiset of kinds newly born cells draw from.
///
/// Duplicate entries weight the draw: picking is uniform over entries, not
/// over distinct kinds. An empty pool falls back to [`Kind::Vanilla`].
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct GenePool {
    entries: Vec<Kind>,
}

impl GenePool {
    /// Construct a pool from the given entries, preserving order.
    #[must_use]
    pub fn new(entries: Vec<Kind>) -> Self {
        Self { entries }
    }

    /// Number of entries, counting duplicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read-only view of the entries in draw order.
    #[must_use]
    pub fn entries(&self) -> &[Kind] {
        &self.entries
    }

    /// Defensive copy of the entries.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Kind> {
        self.entries.clone()
    }

    /// Append `count` copies of `kind`, raising its draw weight.
    pub fn add_copies(&mut self, kind: Kind, count: usize) {
        self.entries.extend(std::iter::repeat_n(kind, count));
    }

    /// Remove the first occurrence of `kind`. Returns whether one was found.
    pub fn remove_one(&mut self, kind: Kind) -> bool {
        match self.entries.iter().position(|&entry| entry == kind) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Replace the entire pool contents.
    pub fn replace(&mut self, entries: Vec<Kind>) {
        self.entries = entries;
    }

    /// Draw one kind uniformly by entry index; `Vanilla` when empty.
    #[must_use]
    pub fn pick(&self, rng: &mut impl Rng) -> Kind {
        if self.entries.is_empty() {
            return Kind::Vanilla;
        }
        self.entries[rng.random_range(0..self.entries.len())]
    }
}

/// Errors that can occur when constructing a board.
#[derive(Debug, Error)]
pub enum BoardError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Static configuration for a board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardConfig {
    /// Grid width in cells.
    pub cols: u32,
    /// Grid height in cells.
    pub rows: u32,
    /// Optional RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
    /// Gene pool contents seeded at construction.
    pub initial_pool: Vec<Kind>,
    /// Score awarded per base-rule birth.
    pub birth_score: i64,
    /// Maximum number of recent step summaries retained in-memory.
    pub history_capacity: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            cols: 40,
            rows: 30,
            rng_seed: None,
            initial_pool: Kind::ALL.to_vec(),
            birth_score: 1,
            history_capacity: 256,
        }
    }
}

impl BoardConfig {
    /// Validates the configuration, returning signed grid dimensions.
    fn grid_dimensions(&self) -> Result<(i32, i32), BoardError> {
        if self.cols == 0 || self.rows == 0 {
            return Err(BoardError::InvalidConfig(
                "grid dimensions must be non-zero",
            ));
        }
        let (Ok(cols), Ok(rows)) = (i32::try_from(self.cols), i32::try_from(self.rows)) else {
            return Err(BoardError::InvalidConfig(
                "grid dimensions exceed the supported range",
            ));
        };
        if self.history_capacity == 0 {
            return Err(BoardError::InvalidConfig(
                "history_capacity must be non-zero",
            ));
        }
        Ok((cols, rows))
    }

    /// Returns the configured RNG seed, generating one from entropy if absent.
    fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

/// Monotonic turn counter, incremented once per committed step.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Turn(pub u64);

impl Turn {
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Double-buffered fixed-size cell grid.
///
/// `current` is the authoritative committed state; `next` is the scratch
/// target written during an in-progress step and is meaningless between
/// steps. Neighbor math never wraps: out-of-bounds neighbors are dead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    cols: i32,
    rows: i32,
    current: Vec<Cell>,
    next: Vec<Cell>,
}

impl Grid {
    fn new(cols: i32, rows: i32) -> Self {
        let len = (cols as usize) * (rows as usize);
        Self {
            cols,
            rows,
            current: vec![Cell::DEAD; len],
            next: vec![Cell::DEAD; len],
        }
    }

    #[must_use]
    pub const fn cols(&self) -> i32 {
        self.cols
    }

    #[must_use]
    pub const fn rows(&self) -> i32 {
        self.rows
    }

    /// Whether `(x, y)` addresses a cell on this grid.
    #[must_use]
    pub const fn is_inside(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.cols && y < self.rows
    }

    /// The eight neighbor coordinates of `(x, y)`, unfiltered.
    ///
    /// Callers must bounds-check each entry with [`Grid::is_inside`].
    #[must_use]
    pub const fn neighbor_coordinates(x: i32, y: i32) -> [(i32, i32); 8] {
        [
            (x - 1, y - 1),
            (x, y - 1),
            (x + 1, y - 1),
            (x - 1, y),
            (x + 1, y),
            (x - 1, y + 1),
            (x, y + 1),
            (x + 1, y + 1),
        ]
    }

    /// Count live cells among the in-bounds neighbors of `(x, y)` in the
    /// committed state. Always in `0..=8`.
    #[must_use]
    pub fn neighbor_count(&self, x: i32, y: i32) -> u8 {
        let mut count = 0;
        for (nx, ny) in Self::neighbor_coordinates(x, y) {
            if self.is_inside(nx, ny) && self.current[self.offset(nx, ny)].alive {
                count += 1;
            }
        }
        count
    }

    /// Snapshot of the committed cell at `(x, y)`; `None` out of bounds.
    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> Option<Cell> {
        if self.is_inside(x, y) {
            Some(self.current[self.offset(x, y)])
        } else {
            None
        }
    }

    /// Number of live cells in the committed state.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.current.iter().filter(|cell| cell.alive).count()
    }

    /// Returns the flat row-major index for `(x, y)` without bounds checks.
    #[inline]
    fn offset(&self, x: i32, y: i32) -> usize {
        (y as usize) * (self.cols as usize) + (x as usize)
    }

    fn current_cell_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        if self.is_inside(x, y) {
            let idx = self.offset(x, y);
            Some(&mut self.current[idx])
        } else {
            None
        }
    }

    fn set_next(&mut self, x: i32, y: i32, cell: Cell) {
        let idx = self.offset(x, y);
        self.next[idx] = cell;
    }

    fn next_cell(&self, x: i32, y: i32) -> Cell {
        self.next[self.offset(x, y)]
    }

    fn next_cell_mut(&mut self, x: i32, y: i32) -> &mut Cell {
        let idx = self.offset(x, y);
        &mut self.next[idx]
    }

    /// Whether `(x, y)` is in bounds and alive in the tentative next state.
    fn next_alive(&self, x: i32, y: i32) -> bool {
        self.is_inside(x, y) && self.next[self.offset(x, y)].alive
    }

    fn current_alive(&self, x: i32, y: i32) -> bool {
        self.current[self.offset(x, y)].alive
    }

    /// Fold `next` into `current`, updating ages and normalizing dead cells.
    fn commit(&mut self) {
        for idx in 0..self.current.len() {
            let was = self.current[idx];
            let pending = self.next[idx];
            self.current[idx] = if pending.alive {
                Cell {
                    alive: true,
                    kind: pending.kind,
                    age: if was.alive { was.age.saturating_add(1) } else { 1 },
                }
            } else {
                Cell::DEAD
            };
        }
    }

    fn clear(&mut self) {
        self.current.fill(Cell::DEAD);
        self.next.fill(Cell::DEAD);
    }
}

/// Transient side-effect requests collected while hooks run, applied as
/// three independent passes (kill, protect, convert) and cleared at commit.
#[derive(Debug, Default)]
struct EffectQueues {
    /// Coordinates forced dead regardless of the base rule.
    kills: Vec<(i32, i32)>,
    /// Coordinates forced alive; Vanilla survivors gain a fresh pool pick.
    protects: Vec<(i32, i32)>,
    /// Kind overwrites applied only if the target ends up alive.
    converts: Vec<(i32, i32, Kind)>,
}

impl EffectQueues {
    fn clear(&mut self) {
        self.kills.clear();
        self.protects.clear();
        self.converts.clear();
    }
}

/// Birth hook: only `Copy` acts, converting one live `next` neighbor.
fn on_birth(
    kind: Kind,
    x: i32,
    y: i32,
    grid: &Grid,
    rng: &mut SmallRng,
    queues: &mut EffectQueues,
) -> i64 {
    if kind != Kind::Copy {
        return 0;
    }
    let candidates: Vec<(i32, i32)> = Grid::neighbor_coordinates(x, y)
        .into_iter()
        .filter(|&(nx, ny)| grid.next_alive(nx, ny))
        .collect();
    match pick_uniform(&candidates, rng) {
        Some(&(nx, ny)) => {
            queues.converts.push((nx, ny, Kind::Copy));
            1
        }
        None => 0,
    }
}

/// Survive hook: only `Photosyn` acts, scoring per surviving turn.
const fn on_survive(kind: Kind) -> i64 {
    match kind {
        Kind::Photosyn => 2,
        _ => 0,
    }
}

/// Death hook: `Explode` queues all eight neighbor coordinates for death,
/// unfiltered (bounds are checked at application time). `Guardian` draws
/// uniformly among the in-bounds neighbors dead in `next` only, so edge
/// cells pick from fewer candidates; it scores even when no target exists.
fn on_death(
    kind: Kind,
    x: i32,
    y: i32,
    grid: &Grid,
    rng: &mut SmallRng,
    queues: &mut EffectQueues,
) -> i64 {
    match kind {
        Kind::Explode => {
            queues.kills.extend(Grid::neighbor_coordinates(x, y));
            3
        }
        Kind::Guardian => {
            let candidates: Vec<(i32, i32)> = Grid::neighbor_coordinates(x, y)
                .into_iter()
                .filter(|&(nx, ny)| grid.is_inside(nx, ny) && !grid.next_alive(nx, ny))
                .collect();
            if let Some(&(nx, ny)) = pick_uniform(&candidates, rng) {
                queues.protects.push((nx, ny));
            }
            1
        }
        _ => 0,
    }
}

fn pick_uniform<'a, T>(candidates: &'a [T], rng: &mut impl Rng) -> Option<&'a T> {
    if candidates.is_empty() {
        None
    } else {
        Some(&candidates[rng.random_range(0..candidates.len())])
    }
}

/// Gene-pool mutation applied through [`Board::mutate_pool`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PoolMutation {
    /// Append `copies` entries of `kind`.
    Add { kind: Kind, copies: usize },
    /// Remove the first occurrence of `kind`.
    Remove { kind: Kind },
    /// Replace the whole pool.
    Replace { entries: Vec<Kind> },
}

/// Summary returned from every committed step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepSummary {
    pub turn: Turn,
    pub score_delta: i64,
    pub total_score: i64,
    /// Base-rule births recorded during the scan, before forced kills.
    pub births: usize,
    /// Base-rule deaths recorded during the scan, before protections.
    pub deaths: usize,
    pub survivors: usize,
    /// Live cells after commit.
    pub total_alive: usize,
}

/// Turn/score notification payload delivered to observers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnNotice {
    pub turn: Turn,
    pub score_delta: i64,
    pub score: i64,
}

/// Observer notified after a mutating board operation completes.
pub trait BoardObserver: Send {
    /// Fired after `step()` and `reset()` with the new turn and score.
    fn on_turn(&mut self, _notice: &TurnNotice) {}

    /// Fired after the gene pool actually changed.
    fn on_pool_changed(&mut self, _pool: &[Kind]) {}
}

/// No-op observer.
#[derive(Debug, Default)]
pub struct NullObserver;

impl BoardObserver for NullObserver {}

/// Per-board aggregate statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardStats {
    pub turn: Turn,
    pub score: i64,
    pub total_alive: usize,
    /// Live-cell counts indexed by [`Kind::index`].
    pub counts_by_kind: [usize; Kind::COUNT],
}

impl BoardStats {
    /// Live-cell count for one kind.
    #[must_use]
    pub const fn count_of(&self, kind: Kind) -> usize {
        self.counts_by_kind[kind.index()]
    }
}

/// Aggregate board state: grid, gene pool, RNG, turn and score bookkeeping.
///
/// One `step()` runs the whole generation pipeline to completion before the
/// observer is notified; there is no partial or overlapping execution.
pub struct Board {
    config: BoardConfig,
    grid: Grid,
    pool: GenePool,
    rng: SmallRng,
    turn: Turn,
    score: i64,
    births: Vec<(i32, i32)>,
    queues: EffectQueues,
    observer: Box<dyn BoardObserver>,
    history: VecDeque<StepSummary>,
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("config", &self.config)
            .field("turn", &self.turn)
            .field("score", &self.score)
            .field("alive", &self.grid.alive_count())
            .field("pool_len", &self.pool.len())
            .finish()
    }
}

impl Board {
    /// Instantiate an all-dead board from the supplied configuration.
    pub fn new(config: BoardConfig) -> Result<Self, BoardError> {
        Self::with_observer(config, Box::new(NullObserver))
    }

    /// Instantiate a board with an observer attached from the start.
    pub fn with_observer(
        config: BoardConfig,
        observer: Box<dyn BoardObserver>,
    ) -> Result<Self, BoardError> {
        let (cols, rows) = config.grid_dimensions()?;
        let rng = config.seeded_rng();
        let pool = GenePool::new(config.initial_pool.clone());
        let history_capacity = config.history_capacity;
        Ok(Self {
            grid: Grid::new(cols, rows),
            pool,
            rng,
            config,
            turn: Turn::zero(),
            score: 0,
            births: Vec::new(),
            queues: EffectQueues::default(),
            observer,
            history: VecDeque::with_capacity(history_capacity),
        })
    }

    /// Replace the observer.
    pub fn set_observer(&mut self, observer: Box<dyn BoardObserver>) {
        self.observer = observer;
    }

    /// Returns an immutable reference to configuration.
    #[must_use]
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Current turn counter.
    #[must_use]
    pub const fn turn(&self) -> Turn {
        self.turn
    }

    /// Accumulated score.
    #[must_use]
    pub const fn score(&self) -> i64 {
        self.score
    }

    /// Read-only access to the grid.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Snapshot of the committed cell at `(x, y)`; `None` out of bounds.
    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> Option<Cell> {
        self.grid.cell(x, y)
    }

    /// Defensive copy of the gene pool in draw order.
    #[must_use]
    pub fn pool(&self) -> Vec<Kind> {
        self.pool.to_vec()
    }

    /// Iterate over retained step summaries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &StepSummary> {
        self.history.iter()
    }

    /// Aggregate turn/score/population statistics.
    #[must_use]
    pub fn statistics(&self) -> BoardStats {
        let mut counts = [0usize; Kind::COUNT];
        let mut total_alive = 0;
        for y in 0..self.grid.rows() {
            for x in 0..self.grid.cols() {
                if let Some(cell) = self.grid.cell(x, y)
                    && cell.alive
                {
                    total_alive += 1;
                    counts[cell.kind.index()] += 1;
                }
            }
        }
        BoardStats {
            turn: self.turn,
            score: self.score,
            total_alive,
            counts_by_kind: counts,
        }
    }

    /// Directly override one cell, bypassing the engine.
    ///
    /// Intended for scripted scenarios and debugging. The cell invariant is
    /// normalized: newly-alive cells start at age 1, dead cells become
    /// Vanilla with age 0. Out of bounds is a no-op.
    pub fn set_cell(&mut self, x: i32, y: i32, alive: bool, kind: Kind) {
        let Some(cell) = self.grid.current_cell_mut(x, y) else {
            return;
        };
        if alive {
            let age = if cell.alive { cell.age } else { 1 };
            *cell = Cell { alive: true, kind, age };
        } else {
            *cell = Cell::DEAD;
        }
    }

    /// Advance the board by one generation.
    ///
    /// Pipeline: base-rule evaluation, kind hooks over the tentative next
    /// state, queued side effects (kill, protect, convert, in that order),
    /// then commit. The scan is column-major with `y` varying fastest, and
    /// hooks run in scan order, so runs with a fixed seed are reproducible.
    pub fn step(&mut self) -> StepSummary {
        self.births.clear();
        self.queues.clear();

        let mut delta = self.stage_rule_evaluation();
        let (hook_delta, deaths, survivors) = self.stage_hooks();
        delta += hook_delta;
        self.stage_effects();
        self.grid.commit();

        let births = self.births.len();
        self.births.clear();
        self.queues.clear();

        self.turn = self.turn.next();
        self.score += delta;

        let summary = StepSummary {
            turn: self.turn,
            score_delta: delta,
            total_score: self.score,
            births,
            deaths,
            survivors,
            total_alive: self.grid.alive_count(),
        };
        if self.history.len() >= self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(summary.clone());
        self.observer.on_turn(&TurnNotice {
            turn: summary.turn,
            score_delta: summary.score_delta,
            score: summary.total_score,
        });
        summary
    }

    /// Reinitialize the grid, making each cell independently alive with
    /// probability `fill_ratio` (clamped to `[0, 1]`) and a fresh pool pick.
    ///
    /// Resets turn and score to zero and clears retained history. The gene
    /// pool is left untouched.
    pub fn reset(&mut self, fill_ratio: f64) {
        let ratio = fill_ratio.clamp(0.0, 1.0);
        self.grid.clear();
        for y in 0..self.grid.rows() {
            for x in 0..self.grid.cols() {
                if self.rng.random::<f64>() < ratio {
                    let kind = self.pool.pick(&mut self.rng);
                    if let Some(cell) = self.grid.current_cell_mut(x, y) {
                        *cell = Cell::born(kind);
                    }
                }
            }
        }
        self.turn = Turn::zero();
        self.score = 0;
        self.births.clear();
        self.queues.clear();
        self.history.clear();
        self.observer.on_turn(&TurnNotice {
            turn: Turn::zero(),
            score_delta: 0,
            score: 0,
        });
    }

    /// Apply a gene-pool mutation. Returns whether the pool changed; the
    /// pool-changed notification fires only on change.
    pub fn mutate_pool(&mut self, mutation: PoolMutation) -> bool {
        let changed = match mutation {
            PoolMutation::Add { kind, copies } => {
                if copies == 0 {
                    false
                } else {
                    self.pool.add_copies(kind, copies);
                    true
                }
            }
            PoolMutation::Remove { kind } => self.pool.remove_one(kind),
            PoolMutation::Replace { entries } => {
                if self.pool.entries() == entries.as_slice() {
                    false
                } else {
                    self.pool.replace(entries);
                    true
                }
            }
        };
        if changed {
            self.observer.on_pool_changed(self.pool.entries());
        }
        changed
    }

    /// Evaluate the standard rule for every coordinate, writing births and
    /// survivals into `next` and recording birth coordinates in scan order.
    fn stage_rule_evaluation(&mut self) -> i64 {
        let mut delta = 0;
        for x in 0..self.grid.cols() {
            for y in 0..self.grid.rows() {
                let count = self.grid.neighbor_count(x, y);
                let cell = self.grid.current[self.grid.offset(x, y)];
                let pending = if cell.alive {
                    if count == 2 || count == 3 {
                        Cell {
                            alive: true,
                            kind: cell.kind,
                            age: cell.age,
                        }
                    } else {
                        Cell::DEAD
                    }
                } else if count == 3 {
                    let kind = self.pool.pick(&mut self.rng);
                    self.births.push((x, y));
                    delta += self.config.birth_score;
                    Cell::born(kind)
                } else {
                    Cell::DEAD
                };
                self.grid.set_next(x, y, pending);
            }
        }
        delta
    }

    /// Run birth, death, and survive hooks in scan order against the
    /// tentative next state, returning the accumulated score delta plus the
    /// base-rule death and survivor counts.
    fn stage_hooks(&mut self) -> (i64, usize, usize) {
        let mut delta = 0;

        for i in 0..self.births.len() {
            let (x, y) = self.births[i];
            let kind = self.grid.next_cell(x, y).kind;
            delta += on_birth(kind, x, y, &self.grid, &mut self.rng, &mut self.queues);
        }

        let mut deaths = 0;
        for x in 0..self.grid.cols() {
            for y in 0..self.grid.rows() {
                if self.grid.current_alive(x, y) && !self.grid.next_alive(x, y) {
                    deaths += 1;
                    let kind = self.grid.current[self.grid.offset(x, y)].kind;
                    delta += on_death(kind, x, y, &self.grid, &mut self.rng, &mut self.queues);
                }
            }
        }

        let mut survivors = 0;
        for x in 0..self.grid.cols() {
            for y in 0..self.grid.rows() {
                if self.grid.current_alive(x, y) && self.grid.next_alive(x, y) {
                    survivors += 1;
                    delta += on_survive(self.grid.current[self.grid.offset(x, y)].kind);
                }
            }
        }

        (delta, deaths, survivors)
    }

    /// Apply queued side effects as three independent passes: kill, then
    /// protect, then convert. Later passes win on liveness for coordinates
    /// queued in more than one. Out-of-bounds entries are silently skipped.
    fn stage_effects(&mut self) {
        for i in 0..self.queues.kills.len() {
            let (x, y) = self.queues.kills[i];
            if self.grid.is_inside(x, y) {
                self.grid.next_cell_mut(x, y).alive = false;
            }
        }
        for i in 0..self.queues.protects.len() {
            let (x, y) = self.queues.protects[i];
            if !self.grid.is_inside(x, y) {
                continue;
            }
            let fresh = if self.grid.next_cell(x, y).kind == Kind::Vanilla {
                Some(self.pool.pick(&mut self.rng))
            } else {
                None
            };
            let cell = self.grid.next_cell_mut(x, y);
            cell.alive = true;
            if let Some(kind) = fresh {
                cell.kind = kind;
            }
        }
        for i in 0..self.queues.converts.len() {
            let (x, y, kind) = self.queues.converts[i];
            if self.grid.is_inside(x, y) && self.grid.next_alive(x, y) {
                self.grid.next_cell_mut(x, y).kind = kind;
            }
        }
    }
}
