use std::{fmt, sync::mpsc, time::Duration};

use log::{debug, info, trace, warn};

use crate::{
    config::EngineConfig,
    scheduler::{Scheduler, TaskId},
    Board, Pos,
};

/// how many population counts are kept: the previous and the current one.
pub const POPULATION_HISTORY: usize = 2;

/// Next value of a cell given its current value and its live neighbour count.
pub fn next_alive(alive: bool, neighbor_count: usize) -> bool {
    match neighbor_count {
        0 | 1 => false,
        2 => alive,
        3 => true,
        _ => false,
    }
}

/// Read-only view of the simulation, handed to listeners and snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    board: Board,
    is_running: bool,
    period: u64,
    populations: Vec<usize>,
}

impl State {
    fn new(config: &EngineConfig) -> Self {
        Self {
            board: Board::new(config.width, config.height),
            is_running: false,
            period: 0,
            populations: Vec::with_capacity(POPULATION_HISTORY),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    /// Population counts, oldest first, at most `POPULATION_HISTORY` long.
    pub fn populations(&self) -> &[usize] {
        &self.populations
    }

    pub fn get_neighbor_count(&self, pos: Pos) -> usize {
        pos.neighbors()
            .filter(|pos| self.board.get_cell(*pos))
            .count()
    }

    fn needs_toggle(&self, pos: Pos) -> bool {
        let alive = self.board.get_cell(pos);
        next_alive(alive, self.get_neighbor_count(pos)) != alive
    }

    /// every cell that differs in the next generation, computed from the
    /// current board only.
    pub fn cells_to_toggle(&self) -> Vec<Pos> {
        self.board
            .positions()
            .filter(|pos| self.needs_toggle(*pos))
            .collect()
    }

    fn record_population(&mut self) {
        if self.populations.len() >= POPULATION_HISTORY {
            self.populations.remove(0);
        }
        self.populations.push(self.board.population());
    }
}

/// Notification in a form that can cross a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    StateChanged,
    /// cells whose value changed; re-read the board to learn the new values.
    BoardChanged(Vec<Pos>),
}

type StateListener = Box<dyn FnMut(&State) + Send>;
type BoardListener = Box<dyn FnMut(&State, &[Pos]) + Send>;

#[derive(Default)]
struct Observers {
    state: Vec<StateListener>,
    board: Vec<BoardListener>,
}

impl Observers {
    fn state_changed(&mut self, state: &State) {
        for listener in self.state.iter_mut() {
            listener(state);
        }
    }

    fn board_changed(&mut self, state: &State, cells: &[Pos]) {
        for listener in self.board.iter_mut() {
            listener(state, cells);
        }
    }
}

/// Owns the board and drives it generation by generation.
///
/// Every command returns `true` when applied and `false` when the run state
/// forbids it, in which case nothing is mutated and nothing is notified.
pub struct Engine<S>
where
    S: Scheduler,
{
    config: EngineConfig,
    state: State,
    scheduler: S,
    pending: Option<TaskId>,
    observers: Observers,
}

impl<S> Engine<S>
where
    S: Scheduler,
{
    pub fn new(config: EngineConfig, scheduler: S) -> Self {
        let mut engine = Self {
            state: State::new(&config),
            config,
            scheduler,
            pending: None,
            observers: Observers::default(),
        };
        engine.reset();
        engine
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn board(&self) -> &Board {
        self.state.board()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn period(&self) -> u64 {
        self.state.period
    }

    pub fn populations(&self) -> &[usize] {
        self.state.populations()
    }

    pub fn period_duration(&self) -> Duration {
        self.config.period_duration
    }

    /// Takes effect from the next scheduled generation on.
    pub fn set_period_duration(&mut self, period_duration: Duration) {
        debug!("period duration set to {period_duration:?}");
        self.config.period_duration = period_duration;
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn on_state_changed(&mut self, listener: impl FnMut(&State) + Send + 'static) {
        self.observers.state.push(Box::new(listener));
    }

    pub fn on_board_changed(&mut self, listener: impl FnMut(&State, &[Pos]) + Send + 'static) {
        self.observers.board.push(Box::new(listener));
    }

    /// Forwards both notifications as `Event`s; a closed receiver is ignored.
    pub fn subscribe(&mut self, sender: mpsc::Sender<Event>) {
        let board_sender = sender.clone();
        self.on_state_changed(move |_| {
            let _ = sender.send(Event::StateChanged);
        });
        self.on_board_changed(move |_, cells| {
            let _ = board_sender.send(Event::BoardChanged(cells.to_vec()));
        });
    }

    pub fn reset(&mut self) -> bool {
        if self.state.is_running {
            debug!("reset ignored while running");
            return false;
        }
        self.state = State::new(&self.config);
        info!("board reset to {}x{}", self.config.width, self.config.height);

        let cells: Vec<_> = self.state.board.positions().collect();
        self.observers.state_changed(&self.state);
        self.observers.board_changed(&self.state, &cells);
        true
    }

    pub fn start(&mut self) -> bool {
        if self.state.is_running {
            debug!("start ignored while running");
            return false;
        }
        self.state.is_running = true;
        info!("started at period {}", self.state.period);
        self.observers.state_changed(&self.state);
        self.schedule_next();
        true
    }

    /// Runs exactly one generation, then stops again.
    pub fn step(&mut self) -> bool {
        if self.state.is_running {
            debug!("step ignored while running");
            return false;
        }
        self.state.is_running = true;
        self.observers.state_changed(&self.state);
        self.advance();
        self.stop()
    }

    pub fn stop(&mut self) -> bool {
        if !self.state.is_running {
            debug!("stop ignored while stopped");
            return false;
        }
        self.state.is_running = false;
        if let Some(task) = self.pending.take() {
            self.scheduler.cancel(task);
        }
        info!("stopped at period {}", self.state.period);
        self.observers.state_changed(&self.state);
        true
    }

    pub fn toggle_cell(&mut self, pos: Pos) -> bool {
        if self.state.is_running {
            debug!("toggle of {pos:?} ignored while running");
            return false;
        }
        if !self.state.board.contains(pos) {
            debug!("toggle of {pos:?} ignored, outside the board");
            return false;
        }
        self.toggle_cells(vec![pos]);
        true
    }

    /// Called back by the scheduler. Only the outstanding task of a running
    /// engine advances a generation; anything else arrived late.
    pub fn fire(&mut self, task: TaskId) -> bool {
        if !self.state.is_running || self.pending != Some(task) {
            debug!("stale {task:?} ignored");
            return false;
        }
        self.pending = None;
        self.advance();
        if self.state.is_running {
            self.schedule_next();
        }
        true
    }

    fn schedule_next(&mut self) {
        let task = self.scheduler.schedule(self.config.period_duration);
        self.pending = Some(task);
    }

    fn advance(&mut self) {
        self.state.record_population();
        self.state.period += 1;

        let cells = self.state.cells_to_toggle();
        trace!("period {}: {} cells change", self.state.period, cells.len());
        self.toggle_cells(cells);

        self.state.record_population();
        self.observers.state_changed(&self.state);
    }

    fn toggle_cells(&mut self, cells: Vec<Pos>) {
        for pos in &cells {
            if let Err(err) = self.state.board.toggle_cell(*pos) {
                warn!("{err}");
            }
        }
        self.observers.board_changed(&self.state, &cells);
    }
}

impl<S> fmt::Display for Engine<S>
where
    S: Scheduler,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Engine#{}|{}", self.state.period, self.state.is_running)
    }
}
