use std::{
    io::{stdin, stdout, Write},
    sync::mpsc,
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::Context;
use log::debug;
use termion::{event::Key, input::TermRead, raw::IntoRawMode};

use crate::{engine::State, pos, Pos, SimHandle};

use canvas::Canvas;
mod canvas;

pub struct View {
    thread: JoinHandle<anyhow::Result<()>>,
}

impl View {
    pub fn spawn(handle: SimHandle, period_duration: Duration) -> Self {
        let thread = thread::spawn(move || view_loop(handle, period_duration));
        Self { thread }
    }

    pub fn join(self) -> anyhow::Result<()> {
        match self.thread.join() {
            Ok(result) => result,
            Err(_) => anyhow::bail!("view thread panicked"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, PartialEq, Eq)]
pub enum InputCmd {
    Exit,
    Move(Dir),
    Toggle,
    Start,
    Step,
    Stop,
    Reset,
    Accelerate,
    Decelerate,
}

fn command_for(key: Key) -> Option<InputCmd> {
    let command = match key {
        Key::Char('q') | Key::Esc | Key::Ctrl('c') => InputCmd::Exit,
        Key::Up => InputCmd::Move(Dir::Up),
        Key::Down => InputCmd::Move(Dir::Down),
        Key::Left => InputCmd::Move(Dir::Left),
        Key::Right => InputCmd::Move(Dir::Right),
        Key::Char(' ') | Key::Char('\n') => InputCmd::Toggle,
        Key::Char('s') => InputCmd::Start,
        Key::Char('n') => InputCmd::Step,
        Key::Char('p') => InputCmd::Stop,
        Key::Char('r') => InputCmd::Reset,
        Key::Char('+') => InputCmd::Accelerate,
        Key::Char('-') => InputCmd::Decelerate,
        _ => return None,
    };
    Some(command)
}

fn input_loop(sender: mpsc::Sender<InputCmd>) {
    for key in stdin().keys() {
        let Ok(key) = key else { break };
        let Some(command) = command_for(key) else {
            continue;
        };
        if sender.send(command).is_err() {
            break;
        }
    }
}

const VIEW_REFRESH_INTERVAL: Duration = Duration::from_millis(20);
const MIN_PERIOD_DURATION: Duration = Duration::from_millis(25);
const MAX_PERIOD_DURATION: Duration = Duration::from_secs(10);
const HELP: &str = "arrows move, space toggles, s start, n step, p stop, r reset, +/- speed, q quit";

/// What the local view state looks like between two frames.
struct Controls {
    cursor: Pos,
    period_duration: Duration,
}

enum Flow {
    Continue,
    Exit,
}

fn view_loop(handle: SimHandle, period_duration: Duration) -> anyhow::Result<()> {
    let mut stdout = stdout()
        .into_raw_mode()
        .context("terminal does not support raw mode")?;
    let events = handle.subscribe()?;
    let (sender, receiver) = mpsc::channel();
    let _input_handle = thread::spawn(|| input_loop(sender));

    let mut controls = Controls {
        cursor: pos!(0, 0),
        period_duration,
    };
    let mut state = handle.snapshot()?;
    let mut dirty = true;
    loop {
        while let Ok(cmd) = receiver.try_recv() {
            dirty = true;
            if let Flow::Exit = handle_input(cmd, &handle, &state, &mut controls)? {
                handle.shutdown()?;
                write!(stdout, "{}{}", termion::clear::All, termion::cursor::Goto(1, 1))?;
                return Ok(());
            }
        }
        for event in events.try_iter() {
            debug!("view got {event:?}");
            dirty = true;
        }

        if dirty {
            state = handle.snapshot()?;
            let (_, rows) = termion::terminal_size().unwrap_or((0, u16::MAX));
            render(&state, &controls, rows as usize).display(&mut stdout)?;
            dirty = false;
        }
        thread::sleep(VIEW_REFRESH_INTERVAL);
    }
}

fn handle_input(
    cmd: InputCmd,
    handle: &SimHandle,
    state: &State,
    controls: &mut Controls,
) -> anyhow::Result<Flow> {
    let board = state.board();
    match cmd {
        InputCmd::Exit => return Ok(Flow::Exit),
        InputCmd::Move(direction) => {
            let moved = controls.cursor
                + match direction {
                    Dir::Up => pos!(0, -1),
                    Dir::Down => pos!(0, 1),
                    Dir::Left => pos!(-1, 0),
                    Dir::Right => pos!(1, 0),
                };
            if board.contains(moved) {
                controls.cursor = moved;
            }
        }
        InputCmd::Toggle => handle.toggle(controls.cursor)?,
        InputCmd::Start => handle.start()?,
        InputCmd::Step => handle.step()?,
        InputCmd::Stop => handle.stop()?,
        InputCmd::Reset => handle.reset()?,
        InputCmd::Accelerate => {
            controls.period_duration = (controls.period_duration / 2).max(MIN_PERIOD_DURATION);
            handle.set_period_duration(controls.period_duration)?;
        }
        InputCmd::Decelerate => {
            controls.period_duration = (controls.period_duration * 2).min(MAX_PERIOD_DURATION);
            handle.set_period_duration(controls.period_duration)?;
        }
    }
    Ok(Flow::Continue)
}

fn status_line(state: &State, period_duration: Duration) -> String {
    let run = if state.is_running() { "running" } else { "stopped" };
    let population = match state.populations() {
        [previous, current] => {
            let delta = *current as i64 - *previous as i64;
            format!("{current} ({delta:+})")
        }
        _ => state.board().population().to_string(),
    };
    format!(
        "period {} | {run} | population {population} | {}ms/gen",
        state.period(),
        period_duration.as_millis()
    )
}

fn render(state: &State, controls: &Controls, max_rows: usize) -> Canvas {
    let board = state.board();
    let width = board.width().max(HELP.len());
    let rows = (board.height() + 2).min(max_rows);
    let mut canvas = Canvas::new(width, rows);
    canvas.layer(|pos| {
        if !board.contains(pos) {
            return None;
        }
        let alive = board.get_cell(pos);
        Some(match (pos == controls.cursor, alive) {
            (true, true) => '@',
            (true, false) => '+',
            (false, true) => '#',
            (false, false) => '.',
        })
    });
    canvas.text(board.height(), &status_line(state, controls.period_duration));
    canvas.text(board.height() + 1, HELP);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::EngineConfig, Sim};

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(command_for(Key::Char('q')), Some(InputCmd::Exit));
        assert_eq!(command_for(Key::Left), Some(InputCmd::Move(Dir::Left)));
        assert_eq!(command_for(Key::Char(' ')), Some(InputCmd::Toggle));
        assert_eq!(command_for(Key::Char('n')), Some(InputCmd::Step));
        assert_eq!(command_for(Key::Char('+')), Some(InputCmd::Accelerate));
        assert_eq!(command_for(Key::Char('z')), None);
    }

    #[test]
    fn renders_board_cursor_and_status() {
        let config = EngineConfig {
            width: 3,
            height: 2,
            period_duration: Duration::from_millis(100),
        };
        let sim = Sim::spawn(config, [pos!(0, 0), pos!(2, 1)]);
        let handle = sim.handle();
        let state = handle.snapshot().unwrap();
        let controls = Controls {
            cursor: pos!(0, 0),
            period_duration: Duration::from_millis(100),
        };

        let rows: Vec<_> = render(&state, &controls, usize::MAX).rows().collect();
        assert_eq!(rows.len(), 4);
        assert!(rows[0].starts_with("@.. "));
        assert!(rows[1].starts_with("..# "));
        assert!(rows[2].starts_with("period 0 | stopped | population 2 | 100ms/gen"));
        assert!(rows[3].starts_with(HELP));

        handle.step().unwrap();
        let state = handle.snapshot().unwrap();
        assert_eq!(
            status_line(&state, Duration::from_millis(100)),
            "period 1 | stopped | population 0 (-2) | 100ms/gen"
        );

        handle.shutdown().unwrap();
        sim.join();
    }

    #[test]
    fn cursor_stays_on_board_and_speed_is_clamped() {
        let config = EngineConfig {
            width: 2,
            height: 2,
            period_duration: Duration::from_millis(40),
        };
        let sim = Sim::spawn(config, std::iter::empty());
        let handle = sim.handle();
        let state = handle.snapshot().unwrap();
        let mut controls = Controls {
            cursor: pos!(0, 0),
            period_duration: Duration::from_millis(40),
        };

        handle_input(InputCmd::Move(Dir::Up), &handle, &state, &mut controls).unwrap();
        assert_eq!(controls.cursor, pos!(0, 0));
        handle_input(InputCmd::Move(Dir::Right), &handle, &state, &mut controls).unwrap();
        handle_input(InputCmd::Move(Dir::Right), &handle, &state, &mut controls).unwrap();
        assert_eq!(controls.cursor, pos!(1, 0));

        handle_input(InputCmd::Accelerate, &handle, &state, &mut controls).unwrap();
        assert_eq!(controls.period_duration, MIN_PERIOD_DURATION);
        handle_input(InputCmd::Toggle, &handle, &state, &mut controls).unwrap();
        assert!(handle.snapshot().unwrap().board().get_cell(pos!(1, 0)));

        let flow = handle_input(InputCmd::Exit, &handle, &state, &mut controls).unwrap();
        assert!(matches!(flow, Flow::Exit));

        handle.shutdown().unwrap();
        sim.join();
    }
}
