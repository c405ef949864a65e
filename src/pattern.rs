use crate::{pos, Pos};

/// Reads a plain-text pattern: `#` is an alive cell, anything else is dead.
pub fn parse_pattern(str: &str) -> Vec<Pos> {
    let mut result = vec![];
    let mut pos = pos!(0, 0);
    for c in str.chars() {
        match c {
            '#' => {
                result.push(pos);
                pos.x += 1
            }
            '\n' => pos = pos!(0, pos.y + 1),
            '\r' => (),
            _ => pos.x += 1,
        }
    }
    result
}

#[test]
fn test_parse_pattern() {
    let glider = ".#.\n..#\r\n###\n";
    assert_eq!(
        parse_pattern(glider),
        vec![pos!(1, 0), pos!(2, 1), pos!(0, 2), pos!(1, 2), pos!(2, 2)]
    );
    assert!(parse_pattern("...\n   \n").is_empty());
}
