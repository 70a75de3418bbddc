//! Play-field grid: cell matrix, pixel geometry, directional sliding and
//! floating-block cleanup.
//!
//! The grid holds occupant ids only; block lifetime is owned by the game
//! layer, which the grid reaches through the [`Occupants`] contract when the
//! field shifts under a block or a block leaves play.

use core::str::FromStr;
use std::fmt;

use thiserror::Error;

/// Cardinal slide direction. `Top` means the field shifts toward row 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Top,
    Right,
    Bottom,
    Left,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Top, Self::Right, Self::Bottom, Self::Left];

    /// Unit step of travel toward this edge. A slide applies this delta to
    /// every occupant; `middle` follows it too.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Top => (0, -1),
            Self::Right => (1, 0),
            Self::Bottom => (0, 1),
            Self::Left => (-1, 0),
        }
    }
}

impl FromStr for Direction {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "right" => Ok(Self::Right),
            "bottom" => Ok(Self::Bottom),
            "left" => Ok(Self::Left),
            _ => Err(GridError::InvalidDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Left => "left",
        })
    }
}

#[derive(Debug, Error)]
pub enum GridError {
    #[error("invalid direction: {0}")]
    InvalidDirection(String),
    #[error("cell out of range: ({x}, {y})")]
    OutOfBounds { x: i32, y: i32 },
}

/// Cell address. Signed: spawn and drop anchors can sit outside the grid.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate `steps` cells along `direction` (negative steps go the
    /// opposite way).
    pub fn stepped(self, direction: Direction, steps: i32) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x + dx * steps,
            y: self.y + dy * steps,
        }
    }
}

/// Canvas position in pixels, top-left origin. Signed for off-canvas anchors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Collaborator contract for cell occupants. The grid clears cells itself;
/// `destroy` only has to retire the entity on the other side.
pub trait Occupants<T> {
    /// The field shifted one cell in `direction` with `id` aboard.
    fn slide(&mut self, id: T, direction: Direction);

    /// `id` was removed from play by cleanup.
    fn destroy(&mut self, id: T);
}

/// Fixed-size square play field with pixel geometry for the render layer.
#[derive(Debug)]
pub struct Grid<T> {
    num_cells: usize,
    cell_size: i32,
    offset: Point,
    middle: Coord,
    contents: Vec<Vec<Option<T>>>,
}

impl<T: Copy> Grid<T> {
    /// `grid_px` and the canvas dimensions are in pixels. The cell size is
    /// `grid_px / num_cells` truncated (at least one pixel), so the effective
    /// grid square is `cell_size * num_cells` on a side, centered on the
    /// canvas.
    pub fn new(num_cells: usize, grid_px: i32, canvas_w: i32, canvas_h: i32) -> Self {
        let cell_size = (grid_px / num_cells as i32).max(1);
        let side = cell_size * num_cells as i32;
        let n = num_cells as i32;
        Self {
            num_cells,
            cell_size,
            offset: Point {
                x: (canvas_w - side) / 2,
                y: (canvas_h - side) / 2,
            },
            middle: Coord::new(n / 2 - 1, n / 2 - 1),
            contents: vec![vec![None; num_cells]; num_cells],
        }
    }

    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    pub fn cell_size(&self) -> i32 {
        self.cell_size
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    /// Top-left of the logical 2x2 center region (the anchor quad). Follows
    /// every successful slide.
    pub fn middle(&self) -> Coord {
        self.middle
    }

    /// Side length of the occupied pixel square.
    pub fn side_px(&self) -> i32 {
        self.cell_size * self.num_cells as i32
    }

    pub fn in_bounds(&self, coord: Coord) -> bool {
        let n = self.num_cells as i32;
        (0..n).contains(&coord.x) && (0..n).contains(&coord.y)
    }

    /// Top-left pixel of `coord`'s cell. Affine in both axes; works for
    /// coordinates outside the grid (spawn anchors).
    pub fn coord_to_point(&self, coord: Coord) -> Point {
        Point {
            x: self.cell_size * coord.x + self.offset.x,
            y: self.cell_size * coord.y + self.offset.y,
        }
    }

    /// Cell furthest along `direction` for lane `position`, pushed `offset`
    /// cells further outward. Lanes are indexed clockwise around the
    /// perimeter, so Bottom and Left mirror the index.
    pub fn edge_coord(&self, direction: Direction, position: i32, offset: i32) -> Coord {
        let n = self.num_cells as i32;
        match direction {
            Direction::Top => Coord::new(position, -offset),
            Direction::Right => Coord::new(n - 1 + offset, position),
            Direction::Bottom => Coord::new(n - 1 - position, n - 1 + offset),
            Direction::Left => Coord::new(-offset, n - 1 - position),
        }
    }

    /// Top-left pixel of [`Self::edge_coord`]: spawn and drop anchors at or
    /// beyond the edge of the grid.
    pub fn direction_to_point(&self, direction: Direction, position: i32, offset: i32) -> Point {
        self.coord_to_point(self.edge_coord(direction, position, offset))
    }

    /// First empty cell scanning inward from the `direction` edge along lane
    /// `position`: the last empty cell before the first occupied one, pushed
    /// `offset` cells back toward the edge.
    ///
    /// A fully empty lane yields the far interior cell (where an entering
    /// block comes to rest). An occupied entry cell yields a coordinate
    /// outside the grid; callers bounds-check before placing.
    pub fn first_available(&self, direction: Direction, position: i32, offset: i32) -> Coord {
        let entry = self.edge_coord(direction, position, 0);
        let n = self.num_cells as i32;
        let mut landing = n - 1;
        for depth in 0..n {
            if self.at(entry.stepped(direction, -depth)).is_some() {
                landing = depth - 1;
                break;
            }
        }
        entry.stepped(direction, -(landing - offset))
    }

    /// Occupant at `coord`; `None` when the cell is empty or out of range on
    /// either axis.
    pub fn at(&self, coord: Coord) -> Option<T> {
        self.at_xy(coord.x, coord.y)
    }

    pub fn at_xy(&self, x: i32, y: i32) -> Option<T> {
        if x < 0 || y < 0 {
            return None;
        }
        self.contents
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .and_then(|cell| *cell)
    }

    /// Put `id` at `coord`, overwriting any previous occupant.
    pub fn place(&mut self, coord: Coord, id: T) -> Result<(), GridError> {
        if !self.in_bounds(coord) {
            return Err(GridError::OutOfBounds {
                x: coord.x,
                y: coord.y,
            });
        }
        self.contents[coord.y as usize][coord.x as usize] = Some(id);
        Ok(())
    }

    /// Vacate `coord`, returning the occupant that was there.
    pub fn take(&mut self, coord: Coord) -> Option<T> {
        if !self.in_bounds(coord) {
            return None;
        }
        self.contents[coord.y as usize][coord.x as usize].take()
    }

    /// Occupied cells in row-major order.
    pub fn blocks(&self) -> impl Iterator<Item = (Coord, T)> + '_ {
        self.contents.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(x, cell)| cell.map(|id| (Coord::new(x as i32, y as i32), id)))
        })
    }

    /// Shift every occupant one cell toward `direction`.
    ///
    /// The boundary row/column at the destination edge must be entirely
    /// empty; otherwise nothing moves and `false` is returned. Only that one
    /// boundary is checked — an empty row anywhere else does not make room.
    /// Every occupant in the shifted field is notified once through
    /// `occupants.slide`, and `middle` follows the shift.
    pub fn slide(&mut self, direction: Direction, occupants: &mut impl Occupants<T>) -> bool {
        let n = self.num_cells;
        let boundary_occupied = match direction {
            Direction::Top => self.contents[0].iter().any(Option::is_some),
            Direction::Bottom => self.contents[n - 1].iter().any(Option::is_some),
            Direction::Left => self.contents.iter().any(|row| row[0].is_some()),
            Direction::Right => self.contents.iter().any(|row| row[n - 1].is_some()),
        };
        if boundary_occupied {
            return false;
        }

        let mut shifted = vec![vec![None; n]; n];
        for y in 0..n {
            for x in 0..n {
                if let Some(id) = self.contents[y][x] {
                    // In bounds: the destination boundary was checked empty,
                    // so no occupant sits on it.
                    let dest = Coord::new(x as i32, y as i32).stepped(direction, 1);
                    shifted[dest.y as usize][dest.x as usize] = Some(id);
                    occupants.slide(id, direction);
                }
            }
        }

        let (dx, dy) = direction.delta();
        self.middle = Coord::new(self.middle.x + dx, self.middle.y + dy);
        self.contents = shifted;
        true
    }

    pub fn slide_up(&mut self, occupants: &mut impl Occupants<T>) -> bool {
        self.slide(Direction::Top, occupants)
    }

    pub fn slide_down(&mut self, occupants: &mut impl Occupants<T>) -> bool {
        self.slide(Direction::Bottom, occupants)
    }

    pub fn slide_left(&mut self, occupants: &mut impl Occupants<T>) -> bool {
        self.slide(Direction::Left, occupants)
    }

    pub fn slide_right(&mut self, occupants: &mut impl Occupants<T>) -> bool {
        self.slide(Direction::Right, occupants)
    }

    /// Remove every floating block: all four orthogonal neighbours empty.
    ///
    /// The floating set is computed against the pre-cleanup state, then
    /// applied; cleared cells report empty afterwards. Returns the number of
    /// blocks destroyed.
    pub fn cleanup(&mut self, occupants: &mut impl Occupants<T>) -> usize {
        let n = self.num_cells as i32;
        let mut floating = Vec::new();
        for y in 0..n {
            for x in 0..n {
                if self.at_xy(x, y).is_none() {
                    continue;
                }
                let isolated = self.at_xy(x, y - 1).is_none()
                    && self.at_xy(x + 1, y).is_none()
                    && self.at_xy(x, y + 1).is_none()
                    && self.at_xy(x - 1, y).is_none();
                if isolated {
                    floating.push(Coord::new(x, y));
                }
            }
        }
        for &coord in &floating {
            if let Some(id) = self.take(coord) {
                occupants.destroy(id);
            }
        }
        floating.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        slides: Vec<(u32, Direction)>,
        destroyed: Vec<u32>,
    }

    impl Occupants<u32> for Recorder {
        fn slide(&mut self, id: u32, direction: Direction) {
            self.slides.push((id, direction));
        }

        fn destroy(&mut self, id: u32) {
            self.destroyed.push(id);
        }
    }

    /// 4 cells, 8 px grid on a 16x16 canvas: cell_size 2, offset (4, 4).
    fn grid4() -> Grid<u32> {
        Grid::new(4, 8, 16, 16)
    }

    fn occupancy(grid: &Grid<u32>) -> Vec<(Coord, u32)> {
        grid.blocks().collect()
    }

    #[test]
    fn test_coord_to_point_affine() {
        let g = grid4();
        assert_eq!(g.coord_to_point(Coord::new(0, 0)), Point { x: 4, y: 4 });
        let a = g.coord_to_point(Coord::new(1, 2));
        let b = g.coord_to_point(Coord::new(2, 2));
        let c = g.coord_to_point(Coord::new(1, 3));
        assert_eq!(b.x - a.x, g.cell_size());
        assert_eq!(b.y, a.y);
        assert_eq!(c.y - a.y, g.cell_size());
    }

    #[test]
    fn test_starts_empty() {
        let g = grid4();
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(g.at_xy(x, y), None);
            }
        }
    }

    #[test]
    fn test_out_of_range_lookup_is_empty() {
        let mut g = grid4();
        g.place(Coord::new(0, 0), 7).unwrap();
        assert_eq!(g.at_xy(-1, 0), None);
        assert_eq!(g.at_xy(0, -1), None);
        assert_eq!(g.at_xy(4, 0), None);
        assert_eq!(g.at_xy(0, 4), None);
    }

    #[test]
    fn test_place_take_and_out_of_bounds() {
        let mut g = grid4();
        g.place(Coord::new(2, 1), 9).unwrap();
        assert_eq!(g.at(Coord::new(2, 1)), Some(9));
        assert_eq!(g.take(Coord::new(2, 1)), Some(9));
        assert_eq!(g.at(Coord::new(2, 1)), None);

        let err = g.place(Coord::new(4, 0), 1).unwrap_err();
        assert!(matches!(err, GridError::OutOfBounds { x: 4, y: 0 }));
        assert_eq!(g.take(Coord::new(-1, 2)), None);
    }

    #[test]
    fn test_slide_rejected_when_destination_boundary_occupied() {
        let mut g = grid4();
        let mut rec = Recorder::default();
        g.place(Coord::new(1, 0), 1).unwrap();
        g.place(Coord::new(2, 2), 2).unwrap();
        let before = occupancy(&g);
        let middle = g.middle();

        assert!(!g.slide(Direction::Top, &mut rec));
        assert_eq!(occupancy(&g), before);
        assert_eq!(g.middle(), middle);
        assert!(rec.slides.is_empty());
    }

    #[test]
    fn test_slide_rejected_even_with_room_elsewhere() {
        // Full except the bottom row: sliding top still fails because only
        // the destination boundary counts.
        let mut g = grid4();
        let mut rec = Recorder::default();
        let mut id = 0;
        for y in 0..3 {
            for x in 0..4 {
                g.place(Coord::new(x, y), id).unwrap();
                id += 1;
            }
        }
        assert!(!g.slide(Direction::Top, &mut rec));
        assert!(g.slide(Direction::Bottom, &mut rec));
    }

    #[test]
    fn test_slide_moves_blocks_and_middle() {
        let mut g = grid4();
        let mut rec = Recorder::default();
        g.place(Coord::new(1, 2), 1).unwrap();
        g.place(Coord::new(2, 2), 2).unwrap();
        let middle = g.middle();

        assert!(g.slide(Direction::Top, &mut rec));
        assert_eq!(g.at(Coord::new(1, 1)), Some(1));
        assert_eq!(g.at(Coord::new(2, 1)), Some(2));
        assert_eq!(g.at(Coord::new(1, 2)), None);
        assert_eq!(g.middle(), Coord::new(middle.x, middle.y - 1));

        let mut slid: Vec<u32> = rec.slides.iter().map(|&(id, _)| id).collect();
        slid.sort_unstable();
        assert_eq!(slid, vec![1, 2]);
        assert!(rec.slides.iter().all(|&(_, d)| d == Direction::Top));
    }

    #[test]
    fn test_left_right_round_trip() {
        let mut g = grid4();
        let mut rec = Recorder::default();
        g.place(Coord::new(1, 1), 1).unwrap();
        g.place(Coord::new(2, 3), 2).unwrap();
        let before = occupancy(&g);
        let middle = g.middle();

        assert!(g.slide_left(&mut rec));
        assert!(g.slide_right(&mut rec));
        assert_eq!(occupancy(&g), before);
        assert_eq!(g.middle(), middle);
    }

    #[test]
    fn test_cleanup_removes_isolated_block() {
        let mut g = grid4();
        let mut rec = Recorder::default();
        g.place(Coord::new(2, 2), 5).unwrap();

        assert_eq!(g.cleanup(&mut rec), 1);
        assert_eq!(g.at(Coord::new(2, 2)), None);
        assert_eq!(rec.destroyed, vec![5]);
    }

    #[test]
    fn test_cleanup_keeps_neighboured_blocks() {
        let mut g = grid4();
        let mut rec = Recorder::default();
        g.place(Coord::new(1, 1), 1).unwrap();
        g.place(Coord::new(1, 2), 2).unwrap();
        g.place(Coord::new(3, 3), 3).unwrap();

        assert_eq!(g.cleanup(&mut rec), 1);
        assert_eq!(g.at(Coord::new(1, 1)), Some(1));
        assert_eq!(g.at(Coord::new(1, 2)), Some(2));
        assert_eq!(g.at(Coord::new(3, 3)), None);
        assert_eq!(rec.destroyed, vec![3]);
    }

    #[test]
    fn test_direction_to_point_perimeter() {
        let g = grid4();
        assert_eq!(
            g.direction_to_point(Direction::Bottom, 0, 0),
            g.coord_to_point(Coord::new(3, 3))
        );
        assert_eq!(
            g.direction_to_point(Direction::Top, 2, 0),
            g.coord_to_point(Coord::new(2, 0))
        );
        // One cell outward from the top edge.
        assert_eq!(
            g.direction_to_point(Direction::Top, 2, 1),
            g.coord_to_point(Coord::new(2, -1))
        );
        assert_eq!(
            g.direction_to_point(Direction::Left, 0, 0),
            g.coord_to_point(Coord::new(0, 3))
        );
    }

    #[test]
    fn test_first_available_empty_lane_rests_at_far_edge() {
        let g = grid4();
        assert_eq!(g.first_available(Direction::Top, 1, 0), Coord::new(1, 3));
        assert_eq!(g.first_available(Direction::Bottom, 0, 0), Coord::new(3, 0));
    }

    #[test]
    fn test_first_available_stops_before_obstruction() {
        let mut g = grid4();
        g.place(Coord::new(1, 2), 1).unwrap();
        assert_eq!(g.first_available(Direction::Top, 1, 0), Coord::new(1, 1));
        assert_eq!(g.first_available(Direction::Top, 1, 1), Coord::new(1, 0));
    }

    #[test]
    fn test_first_available_blocked_entry_is_outside() {
        let mut g = grid4();
        g.place(Coord::new(1, 0), 1).unwrap();
        let rest = g.first_available(Direction::Top, 1, 0);
        assert_eq!(rest, Coord::new(1, -1));
        assert!(!g.in_bounds(rest));
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("TOP".parse::<Direction>().unwrap(), Direction::Top);
        assert_eq!("Left".parse::<Direction>().unwrap(), Direction::Left);
        assert_eq!("bottom".parse::<Direction>().unwrap(), Direction::Bottom);
        assert!(matches!(
            "up".parse::<Direction>(),
            Err(GridError::InvalidDirection(_))
        ));
    }
}
