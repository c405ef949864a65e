use std::{env::args, fs};

use anyhow::Context;

pub use utils::Pos;
mod utils;

pub use board::Board;
mod board;

pub mod config;
pub mod error;

pub use engine::{Engine, Event, State};
pub mod engine;

pub use pattern::parse_pattern;
mod pattern;

pub mod scheduler;

pub use sim::{Sim, SimHandle};
mod sim;

pub use view::View;
mod view;

pub fn main() -> anyhow::Result<()> {
    env_logger::init();

    let options = config::Options::parse(args().skip(1))?;
    let actives = match &options.pattern {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("could not read pattern {}", path.display()))?;
            parse_pattern(&content)
        }
        None => vec![],
    };

    let period_duration = options.engine.period_duration;
    let simulation = Sim::spawn(options.engine, actives);
    let view = View::spawn(simulation.handle(), period_duration);

    let result = view.join();
    // the view normally shuts the simulation down itself; make sure of it
    let _ = simulation.handle().shutdown();
    simulation.join();
    result
}
