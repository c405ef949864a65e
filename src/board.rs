use std::fmt;

use crate::{error::BoardError, pos, Pos};

/// A fixed-size grid of cells, alive or dead, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// row-major index of a cell, `None` when outside the board.
    fn index(&self, Pos { x, y }: Pos) -> Option<usize> {
        let x = usize::try_from(x).ok().filter(|x| *x < self.width)?;
        let y = usize::try_from(y).ok().filter(|y| *y < self.height)?;
        Some(y * self.width + x)
    }

    pub fn contains(&self, pos: Pos) -> bool {
        self.index(pos).is_some()
    }

    /// Cells outside the board always read as dead.
    pub fn get_cell(&self, pos: Pos) -> bool {
        self.index(pos).map_or(false, |index| self.cells[index])
    }

    /// Writes outside the board are rejected and leave it untouched.
    pub fn set_cell(&mut self, pos: Pos, alive: bool) -> Result<(), BoardError> {
        let index = self.index(pos).ok_or(BoardError::OutOfBounds {
            pos,
            width: self.width,
            height: self.height,
        })?;
        self.cells[index] = alive;
        Ok(())
    }

    /// Flips a cell and returns its new value.
    pub fn toggle_cell(&mut self, pos: Pos) -> Result<bool, BoardError> {
        let alive = !self.get_cell(pos);
        self.set_cell(pos, alive)?;
        Ok(alive)
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|alive| **alive).count()
    }

    /// every coordinate of the board, column by column.
    pub fn positions(&self) -> impl Iterator<Item = Pos> {
        let (width, height) = (self.width as i32, self.height as i32);
        (0..width).flat_map(move |x| (0..height).map(move |y| pos!(x, y)))
    }

    pub fn actives(&self) -> impl Iterator<Item = Pos> + '_ {
        self.positions().filter(|pos| self.get_cell(*pos))
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let char = if self.get_cell(pos!(x, y)) { '#' } else { '.' };
                write!(f, "{char}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
