use std::ops::{Add, Sub};

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

#[macro_export]
macro_rules! pos {
    ($x:expr, $y:expr) => {
        $crate::Pos { x: $x, y: $y }
    };
}

impl Pos {
    /// the 8 offsets of the Moore neighbourhood, center excluded.
    pub fn offsets() -> impl Iterator<Item = Pos> {
        (-1..=1)
            .flat_map(|x| (-1..=1).map(move |y| pos!(x, y)))
            .filter(|p| *p != pos!(0, 0))
    }

    pub fn neighbors(self) -> impl Iterator<Item = Pos> {
        Self::offsets().map(move |offset| self + offset)
    }
}

impl Add for Pos {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        pos!(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Pos {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        pos!(self.x - rhs.x, self.y - rhs.y)
    }
}

#[test]
fn test_neighbors() {
    let around: Vec<_> = pos!(5, 5).neighbors().collect();
    assert_eq!(around.len(), 8);
    assert!(!around.contains(&pos!(5, 5)));
    assert!(around.contains(&pos!(4, 4)));
    assert!(around.contains(&pos!(6, 6)));
    assert_eq!(pos!(3, 4) - pos!(1, 1), pos!(2, 3));
}
