//! Light overlay around the player.
//!
//! Lighting is advisory: it only produces per-cell levels for presentation and
//! never feeds back into movement.
use common::{Coord, Direction};
use grid::{Grid, Walls};

/// Level written to the cell the player is standing on.
pub const PLAYER: u8 = 75;
/// Level written around the entered cell.
pub const VICINITY: u8 = 50;
/// Level written around the cell the player just left.
pub const TRAIL: u8 = 25;

/// A single light level assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightWrite {
    pub at: Coord,
    pub level: u8,
}

/// Cells lit from `src`: itself, open orthogonal neighbors and diagonals whose
/// two adjoining orthogonal sides are both open.
pub fn reachable(grid: &Grid, src: Coord) -> Vec<Coord> {
    let Ok(walls) = grid.walls(src) else {
        return Vec::new();
    };
    let mut out = vec![src];
    for dir in [
        Direction::Up,
        Direction::Left,
        Direction::Down,
        Direction::Right,
    ] {
        if walls.blocks(dir) {
            continue;
        }
        if let Some(next) = grid.neighbor(src, dir) {
            out.push(next);
        }
    }
    for vertical in [Direction::Up, Direction::Down] {
        for horizontal in [Direction::Left, Direction::Right] {
            if walls.intersects(Walls::facing(vertical) | Walls::facing(horizontal)) {
                continue;
            }
            let target = src.step(vertical).step(horizontal);
            if grid.contains(target) {
                out.push(target);
            }
        }
    }
    out
}

/// Computes the writes for a move from `left` into `entered`.
///
/// Without a flashlight nothing is written. A later write to the same cell
/// replaces the earlier one, so the entered vicinity wins over the trail.
pub fn reveal(
    grid: &Grid,
    left: Option<Coord>,
    entered: Coord,
    has_flashlight: bool,
) -> Vec<LightWrite> {
    let mut writes: Vec<LightWrite> = Vec::new();
    if !has_flashlight {
        return writes;
    }
    let mut put = |at: Coord, level: u8| match writes.iter_mut().find(|w| w.at == at) {
        Some(w) => w.level = level,
        None => writes.push(LightWrite { at, level }),
    };
    if let Some(left) = left {
        for at in reachable(grid, left) {
            put(at, TRAIL);
        }
    }
    for at in reachable(grid, entered) {
        put(at, VICINITY);
    }
    if grid.contains(entered) {
        put(entered, PLAYER);
    }
    writes
}

/// Current light level per cell, 0 meaning dark.
#[derive(Clone, Debug)]
pub struct LightMap {
    width: u32,
    height: u32,
    levels: Vec<u8>,
}

impl LightMap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            levels: vec![0; (width * height) as usize],
        }
    }

    fn idx(&self, at: Coord) -> Option<usize> {
        let inside = at.row >= 0
            && at.col >= 0
            && at.row < self.height as i32
            && at.col < self.width as i32;
        inside.then(|| at.row as usize * self.width as usize + at.col as usize)
    }

    /// Level at `at`; off-grid cells are dark.
    pub fn level(&self, at: Coord) -> u8 {
        self.idx(at).map_or(0, |i| self.levels[i])
    }

    pub fn apply(&mut self, writes: &[LightWrite]) {
        for w in writes {
            match self.idx(w.at) {
                Some(i) => self.levels[i] = w.level,
                None => tracing::trace!("dropping off-grid light write at {:?}", w.at),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid::GridBuilder;

    fn open(w: u32, h: u32) -> Grid {
        Grid::new(w, h).expect("grid")
    }

    fn level_of(writes: &[LightWrite], at: Coord) -> Option<u8> {
        writes.iter().find(|w| w.at == at).map(|w| w.level)
    }

    #[test]
    fn no_flashlight_means_no_writes() {
        let grid = open(5, 5);
        assert!(reveal(&grid, Some(Coord::new(2, 1)), Coord::new(2, 2), false).is_empty());
    }

    #[test]
    fn open_cell_reaches_all_eight_neighbors() {
        let grid = open(5, 5);
        assert_eq!(reachable(&grid, Coord::new(2, 2)).len(), 9);
    }

    #[test]
    fn corner_clips_off_grid_neighbors() {
        let grid = open(5, 5);
        assert_eq!(reachable(&grid, Coord::new(0, 0)).len(), 4);
    }

    #[test]
    fn wall_blocks_side_and_adjoining_diagonals() {
        let mut b = GridBuilder::new(5, 5).expect("builder");
        b.add_walls(Coord::new(2, 2), Walls::TOP).unwrap();
        let grid = b.build();
        let lit = reachable(&grid, Coord::new(2, 2));
        assert!(!lit.contains(&Coord::new(1, 2)));
        assert!(!lit.contains(&Coord::new(1, 1)));
        assert!(!lit.contains(&Coord::new(1, 3)));
        assert!(lit.contains(&Coord::new(3, 1)));
        assert_eq!(lit.len(), 6);
    }

    #[test]
    fn vicinity_overrides_trail_and_player_is_brightest() {
        let grid = open(6, 6);
        let left = Coord::new(2, 2);
        let entered = Coord::new(2, 3);
        let writes = reveal(&grid, Some(left), entered, true);
        assert_eq!(level_of(&writes, entered), Some(PLAYER));
        // shared neighbor of both cells
        assert_eq!(level_of(&writes, Coord::new(1, 2)), Some(VICINITY));
        assert_eq!(level_of(&writes, left), Some(VICINITY));
        // only next to the left cell
        assert_eq!(level_of(&writes, Coord::new(2, 1)), Some(TRAIL));
        let unique: std::collections::HashSet<_> = writes.iter().map(|w| w.at).collect();
        assert_eq!(unique.len(), writes.len());
    }

    #[test]
    fn light_map_applies_and_ignores_off_grid() {
        let mut map = LightMap::new(3, 3);
        map.apply(&[
            LightWrite {
                at: Coord::new(1, 1),
                level: PLAYER,
            },
            LightWrite {
                at: Coord::new(-1, 1),
                level: PLAYER,
            },
        ]);
        assert_eq!(map.level(Coord::new(1, 1)), PLAYER);
        assert_eq!(map.level(Coord::new(0, 0)), 0);
        assert_eq!(map.level(Coord::new(-1, 1)), 0);
    }
}
