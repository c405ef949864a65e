use std::{
    sync::mpsc,
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, error, info, warn};

use crate::{
    config::EngineConfig,
    engine::{Engine, Event, State},
    error::SimError,
    scheduler::{TaskId, ThreadScheduler},
    Pos,
};

pub enum SimCmd {
    Reset,
    Start,
    Step,
    Stop,
    Toggle(Pos),
    SetPeriodDuration(Duration),
    Tick(TaskId),
    Snapshot(mpsc::Sender<State>),
    Subscribe(mpsc::Sender<Event>),
    Shutdown,
}

#[derive(Clone)]
pub struct SimHandle {
    sender: mpsc::Sender<SimCmd>,
}

impl SimHandle {
    pub fn new(sender: mpsc::Sender<SimCmd>) -> Self {
        Self { sender }
    }

    fn send(&self, cmd: SimCmd) -> Result<(), SimError> {
        self.sender.send(cmd).map_err(|_| SimError::Disconnected)
    }

    pub fn reset(&self) -> Result<(), SimError> {
        self.send(SimCmd::Reset)
    }

    pub fn start(&self) -> Result<(), SimError> {
        self.send(SimCmd::Start)
    }

    pub fn step(&self) -> Result<(), SimError> {
        self.send(SimCmd::Step)
    }

    pub fn stop(&self) -> Result<(), SimError> {
        self.send(SimCmd::Stop)
    }

    pub fn toggle(&self, pos: Pos) -> Result<(), SimError> {
        self.send(SimCmd::Toggle(pos))
    }

    pub fn set_period_duration(&self, period_duration: Duration) -> Result<(), SimError> {
        self.send(SimCmd::SetPeriodDuration(period_duration))
    }

    pub fn shutdown(&self) -> Result<(), SimError> {
        self.send(SimCmd::Shutdown)
    }

    pub fn snapshot(&self) -> Result<State, SimError> {
        let (sender, receiver) = mpsc::channel();
        self.send(SimCmd::Snapshot(sender))?;
        receiver.recv().map_err(|_| SimError::Disconnected)
    }

    pub fn subscribe(&self) -> Result<mpsc::Receiver<Event>, SimError> {
        let (sender, receiver) = mpsc::channel();
        self.send(SimCmd::Subscribe(sender))?;
        Ok(receiver)
    }
}

/// The engine, running on its own thread.
#[derive(Debug)]
pub struct Sim {
    thread: JoinHandle<()>,
    sender: mpsc::Sender<SimCmd>,
}

impl Sim {
    pub fn spawn(config: EngineConfig, actives: impl IntoIterator<Item = Pos>) -> Self {
        let (sender, receiver) = mpsc::channel();
        let scheduler = ThreadScheduler::new(sender.clone(), SimCmd::Tick);
        let mut engine = Engine::new(config, scheduler);
        for active in actives.into_iter() {
            if !engine.board().contains(active) {
                warn!("pattern cell {active:?} lies outside the board, skipped");
            } else if !engine.board().get_cell(active) {
                engine.toggle_cell(active);
            }
        }

        let thread = thread::spawn(move || sim_loop(receiver, engine));

        Self { sender, thread }
    }

    pub fn handle(&self) -> SimHandle {
        SimHandle::new(self.sender.clone())
    }

    pub fn join(self) {
        if self.thread.join().is_err() {
            error!("simulation thread panicked");
        }
    }
}

fn sim_loop(receiver: mpsc::Receiver<SimCmd>, mut engine: Engine<ThreadScheduler<SimCmd>>) {
    info!("simulation started: {engine}");
    while let Ok(cmd) = receiver.recv() {
        match cmd {
            SimCmd::Reset => _ = engine.reset(),
            SimCmd::Start => _ = engine.start(),
            SimCmd::Step => _ = engine.step(),
            SimCmd::Stop => _ = engine.stop(),
            SimCmd::Toggle(pos) => _ = engine.toggle_cell(pos),
            SimCmd::SetPeriodDuration(period_duration) => engine.set_period_duration(period_duration),
            SimCmd::Tick(task) => _ = engine.fire(task),
            SimCmd::Snapshot(sender) => {
                if sender.send(engine.state().clone()).is_err() {
                    debug!("snapshot requester went away");
                }
            }
            SimCmd::Subscribe(sender) => engine.subscribe(sender),
            SimCmd::Shutdown => break,
        }
    }
    engine.stop();
    info!("simulation ended: {engine}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pos;

    fn config(period_millis: u64) -> EngineConfig {
        EngineConfig {
            width: 5,
            height: 5,
            period_duration: Duration::from_millis(period_millis),
        }
    }

    #[test]
    fn seeds_and_steps() {
        let blinker = [pos!(2, 1), pos!(2, 2), pos!(2, 3), pos!(9, 9)];
        let sim = Sim::spawn(config(1000), blinker);
        let handle = sim.handle();

        let state = handle.snapshot().unwrap();
        assert_eq!(state.board().population(), 3);
        assert_eq!(state.period(), 0);

        handle.step().unwrap();
        let state = handle.snapshot().unwrap();
        assert_eq!(state.period(), 1);
        assert!(!state.is_running());
        assert!(state.board().get_cell(pos!(1, 2)));
        assert!(state.board().get_cell(pos!(3, 2)));
        assert!(!state.board().get_cell(pos!(2, 1)));

        handle.shutdown().unwrap();
        sim.join();
        assert_eq!(handle.snapshot(), Err(SimError::Disconnected));
    }

    #[test]
    fn runs_on_its_own_until_stopped() {
        let sim = Sim::spawn(config(10), [pos!(2, 1), pos!(2, 2), pos!(2, 3)]);
        let handle = sim.handle();
        let events = handle.subscribe().unwrap();

        handle.start().unwrap();
        let mut changes = 0;
        while changes < 3 {
            match events.recv_timeout(Duration::from_secs(5)).unwrap() {
                Event::BoardChanged(cells) => {
                    assert_eq!(cells.len(), 4);
                    changes += 1;
                }
                Event::StateChanged => (),
            }
        }
        handle.stop().unwrap();
        let stopped = handle.snapshot().unwrap();
        assert!(!stopped.is_running());
        assert!(stopped.period() >= 3);

        thread::sleep(Duration::from_millis(60));
        assert_eq!(handle.snapshot().unwrap().period(), stopped.period());

        handle.shutdown().unwrap();
        sim.join();
    }
}
