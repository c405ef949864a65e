use std::io::{self, Write};

use crate::{pos, Pos};

pub struct Canvas {
    lines: Vec<Vec<char>>,
    width: usize,
    height: usize,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        let lines = (0..height).map(|_| vec![' '; width]).collect();
        Self {
            height,
            lines,
            width,
        }
    }

    /// Paints every position `f` returns a character for, over what is there.
    pub fn layer(&mut self, f: impl Fn(Pos) -> Option<char>) {
        for y in 0..self.height {
            for x in 0..self.width {
                if let Some(char) = f(pos!(x as i32, y as i32)) {
                    self.lines[y][x] = char;
                }
            }
        }
    }

    /// Writes `text` from the start of line `y`, cut at the canvas width.
    pub fn text(&mut self, y: usize, text: &str) {
        if let Some(line) = self.lines.get_mut(y) {
            for (slot, char) in line.iter_mut().zip(text.chars()) {
                *slot = char;
            }
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.lines.iter().map(|line| line.iter().collect())
    }

    pub fn display(&self, out: &mut impl Write) -> io::Result<()> {
        let clear = termion::clear::All;
        write!(out, "{clear}")?;
        for (index, line) in self.rows().enumerate() {
            let goto = termion::cursor::Goto(1, index as u16 + 1);
            write!(out, "{goto}{line}")?;
        }
        out.flush()
    }
}
