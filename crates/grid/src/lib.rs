//! Grid and cell model.
use bitflags::bitflags;
use common::{Coord, Direction, EntityId, GameError, GameResult};

bitflags! {
    /// Static walls on the four sides of a cell.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Walls: u8 {
        const TOP    = 1 << 0;
        const LEFT   = 1 << 1;
        const RIGHT  = 1 << 2;
        const BOTTOM = 1 << 3;
    }
}

impl Walls {
    /// The wall flag on the side of a cell facing `dir`.
    pub fn facing(dir: Direction) -> Walls {
        match dir {
            Direction::Up => Walls::TOP,
            Direction::Left => Walls::LEFT,
            Direction::Down => Walls::BOTTOM,
            Direction::Right => Walls::RIGHT,
        }
    }

    /// Returns `true` if a wall blocks leaving the cell towards `dir`.
    pub fn blocks(self, dir: Direction) -> bool {
        self.contains(Walls::facing(dir))
    }
}

/// One grid location with static walls and a dynamic item list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    row: i32,
    col: i32,
    walls: Walls,
    items: Vec<EntityId>,
}

impl Cell {
    pub fn row(&self) -> i32 {
        self.row
    }

    pub fn col(&self) -> i32 {
        self.col
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }

    pub fn walls(&self) -> Walls {
        self.walls
    }

    /// Items in arrival order.
    pub fn items(&self) -> &[EntityId] {
        &self.items
    }
}

/// Rectangular, row-major grid of cells.
#[derive(Clone, Debug)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a wall-less grid. Both dimensions must be positive.
    pub fn new(width: u32, height: u32) -> GameResult<Self> {
        if width == 0 || height == 0 {
            return Err(GameError::InvalidDimensions);
        }
        let mut cells = Vec::with_capacity((width * height) as usize);
        for row in 0..height as i32 {
            for col in 0..width as i32 {
                cells.push(Cell {
                    row,
                    col,
                    walls: Walls::empty(),
                    items: Vec::new(),
                });
            }
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `true` if `at` lies inside the grid.
    pub fn contains(&self, at: Coord) -> bool {
        at.row >= 0 && at.col >= 0 && at.row < self.height as i32 && at.col < self.width as i32
    }

    /// Returns cell index from coordinates.
    fn idx(&self, at: Coord) -> GameResult<usize> {
        if !self.contains(at) {
            return Err(GameError::OutOfBounds {
                row: at.row,
                col: at.col,
            });
        }
        Ok(at.row as usize * self.width as usize + at.col as usize)
    }

    /// Looks up a cell. Off-grid probes yield [`GameError::OutOfBounds`].
    pub fn cell_at(&self, row: i32, col: i32) -> GameResult<&Cell> {
        let idx = self.idx(Coord::new(row, col))?;
        Ok(&self.cells[idx])
    }

    fn cell_mut(&mut self, at: Coord) -> GameResult<&mut Cell> {
        let idx = self.idx(at)?;
        Ok(&mut self.cells[idx])
    }

    pub fn walls(&self, at: Coord) -> GameResult<Walls> {
        self.cell_at(at.row, at.col).map(Cell::walls)
    }

    /// In-bounds neighbor of `at` in `dir`, ignoring walls.
    pub fn neighbor(&self, at: Coord, dir: Direction) -> Option<Coord> {
        let next = at.step(dir);
        self.contains(next).then_some(next)
    }

    pub fn items(&self, at: Coord) -> GameResult<&[EntityId]> {
        self.cell_at(at.row, at.col).map(Cell::items)
    }

    /// Appends an item to the end of a cell's list.
    pub fn push_item(&mut self, at: Coord, id: EntityId) -> GameResult<()> {
        self.cell_mut(at)?.items.push(id);
        Ok(())
    }

    /// Removes the first occurrence of `id`, keeping the order of the rest.
    pub fn remove_item(&mut self, at: Coord, id: EntityId) -> GameResult<bool> {
        let cell = self.cell_mut(at)?;
        match cell.items.iter().position(|&i| i == id) {
            Some(pos) => {
                cell.items.remove(pos);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Coordinates of every cell whose list holds `id`.
    pub fn locate(&self, id: EntityId) -> Vec<Coord> {
        self.cells
            .iter()
            .filter(|c| c.items.contains(&id))
            .map(Cell::coord)
            .collect()
    }
}

/// Builds a [`Grid`] during level load. Walls are frozen once built.
#[derive(Debug)]
pub struct GridBuilder {
    grid: Grid,
}

impl GridBuilder {
    pub fn new(width: u32, height: u32) -> GameResult<Self> {
        Ok(Self {
            grid: Grid::new(width, height)?,
        })
    }

    /// Adds wall flags to one cell.
    pub fn add_walls(&mut self, at: Coord, walls: Walls) -> GameResult<&mut Self> {
        self.grid.cell_mut(at)?.walls |= walls;
        Ok(self)
    }

    /// Marks a cell as solid: all four walls, plus the facing wall on each neighbor.
    pub fn solid(&mut self, at: Coord) -> GameResult<&mut Self> {
        self.add_walls(at, Walls::all())?;
        for dir in [
            Direction::Up,
            Direction::Left,
            Direction::Down,
            Direction::Right,
        ] {
            if let Some(next) = self.grid.neighbor(at, dir) {
                self.grid.cell_mut(next)?.walls |= Walls::facing(dir.opposite());
            }
        }
        Ok(self)
    }

    /// Adds outward walls along the grid border.
    pub fn enclose(&mut self) -> &mut Self {
        let (w, h) = (self.grid.width as i32, self.grid.height as i32);
        for cell in self.grid.cells.iter_mut() {
            if cell.row == 0 {
                cell.walls |= Walls::TOP;
            }
            if cell.row == h - 1 {
                cell.walls |= Walls::BOTTOM;
            }
            if cell.col == 0 {
                cell.walls |= Walls::LEFT;
            }
            if cell.col == w - 1 {
                cell.walls |= Walls::RIGHT;
            }
        }
        self
    }

    pub fn build(self) -> Grid {
        self.grid
    }
}
