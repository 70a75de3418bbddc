//! Game state: block arena, quad spawning and the slide/cleanup rules.

use crate::grid::{Coord, Direction, Grid, Occupants};
use crate::theme::Theme;

/// Handle into the block arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockId(usize);

/// Block colouring: a level colour index, or the indestructible anchor quad
/// the grid's `middle` tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Level(u8),
    Anchor,
}

/// One cell occupant. The grid references blocks by id; the block mirrors its
/// own cell coordinate so collaborators can place it without consulting the
/// grid.
#[derive(Debug, Clone, Copy)]
pub struct Block {
    pub coord: Coord,
    pub kind: BlockKind,
}

/// Index arena owning block lifetime. Implements the grid's occupant
/// contract: slides keep each block's mirrored coordinate current, destroys
/// retire the slot and remember the vacated cell for the cleanup fade.
#[derive(Debug, Default)]
pub struct Blocks {
    entries: Vec<Option<Block>>,
    cleared: Vec<(Coord, BlockKind)>,
}

impl Blocks {
    pub fn insert(&mut self, block: Block) -> BlockId {
        let id = BlockId(self.entries.len());
        self.entries.push(Some(block));
        id
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.entries.get(id.0).and_then(Option::as_ref)
    }

    pub fn alive(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Cells vacated by cleanup since the last call, with the colour they
    /// held (the render layer fades them out).
    pub fn drain_cleared(&mut self) -> Vec<(Coord, BlockKind)> {
        std::mem::take(&mut self.cleared)
    }
}

impl Occupants<BlockId> for Blocks {
    fn slide(&mut self, id: BlockId, direction: Direction) {
        if let Some(block) = self.entries.get_mut(id.0).and_then(Option::as_mut) {
            block.coord = block.coord.stepped(direction, 1);
        }
    }

    fn destroy(&mut self, id: BlockId) {
        if let Some(block) = self.entries.get_mut(id.0).and_then(Option::take) {
            self.cleared.push((block.coord, block.kind));
        }
    }
}

/// Bag of spawn edges (random order, then refill) plus lane and colour rolls.
#[derive(Debug, Clone)]
pub struct SpawnBag {
    edges: Vec<Direction>,
    queue: Vec<Direction>,
    rng: u32,
}

impl SpawnBag {
    pub fn new(edges: &[Direction]) -> Self {
        debug_assert!(!edges.is_empty());
        let mut b = Self {
            edges: edges.to_vec(),
            queue: Vec::with_capacity(edges.len() * 2),
            rng: 0x51D3_B10C,
        };
        b.refill();
        b
    }

    fn refill(&mut self) {
        let mut all = self.edges.clone();
        // Fisher–Yates shuffle
        for i in (1..all.len()).rev() {
            let j = (self.next_rand() as usize) % (i + 1);
            all.swap(i, j);
        }
        self.queue.extend(all);
    }

    fn next_rand(&mut self) -> u32 {
        self.rng = self.rng.wrapping_mul(1103515245).wrapping_add(12345);
        self.rng >> 16
    }

    pub fn edges(&self) -> &[Direction] {
        &self.edges
    }

    pub fn next_edge(&mut self) -> Direction {
        if self.queue.is_empty() {
            self.refill();
        }
        self.queue.remove(0)
    }

    /// Random quad lane in `0..lanes`.
    pub fn next_lane(&mut self, lanes: usize) -> i32 {
        (self.next_rand() as usize % lanes.max(1)) as i32
    }

    pub fn next_color(&mut self, colors: usize) -> u8 {
        (self.next_rand() as usize % colors.max(1)) as u8
    }
}

/// Game state: grid, block arena, spawn bag.
#[derive(Debug)]
pub struct GameState {
    pub theme: Theme,
    pub grid: Grid<BlockId>,
    pub blocks: Blocks,
    pub bag: SpawnBag,
    pub game_over: bool,
    /// Blocks removed by cleanup over the whole game (game-over screen only).
    pub removed: u32,
}

impl GameState {
    /// Build a fresh field on a canvas of `canvas_w` x `canvas_h` pixels and
    /// place the anchor quad at the grid's middle. The grid square is clamped
    /// so it fits the canvas with a one-pixel border.
    pub fn new(theme: Theme, config: &crate::GameConfig, canvas_w: i32, canvas_h: i32) -> Self {
        let grid_px = (config.grid_size as i32)
            .min(canvas_w - 2)
            .min(canvas_h - 2)
            .max(1);
        let grid = Grid::new(config.cells as usize, grid_px, canvas_w, canvas_h);
        let middle = grid.middle();
        let mut state = Self {
            theme,
            grid,
            blocks: Blocks::default(),
            bag: SpawnBag::new(&config.spawn_edges),
            game_over: false,
            removed: 0,
        };
        state.place_quad(
            [
                middle,
                Coord::new(middle.x + 1, middle.y),
                Coord::new(middle.x, middle.y + 1),
                Coord::new(middle.x + 1, middle.y + 1),
            ],
            BlockKind::Anchor,
        );
        state
    }

    /// Slide the whole field one cell and clear any blocks the shift left
    /// floating. Returns true when the field moved.
    pub fn slide(&mut self, direction: Direction) -> bool {
        if self.game_over {
            return false;
        }
        let moved = match direction {
            Direction::Top => self.grid.slide_up(&mut self.blocks),
            Direction::Right => self.grid.slide_right(&mut self.blocks),
            Direction::Bottom => self.grid.slide_down(&mut self.blocks),
            Direction::Left => self.grid.slide_left(&mut self.blocks),
        };
        if !moved {
            return false;
        }
        self.removed += self.grid.cleanup(&mut self.blocks) as u32;
        true
    }

    /// Cells vacated by the most recent cleanup (drained).
    pub fn take_cleared(&mut self) -> Vec<(Coord, BlockKind)> {
        self.blocks.drain_cleared()
    }

    /// Generator step: slide a fresh 2x2 quad in from one of the allowed
    /// edges. Starts from a random edge/lane pick, then falls back to
    /// scanning every pair; if no quad fits anywhere the field is jammed and
    /// the game ends. Returns true when a quad was placed.
    pub fn spawn_quad(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        let n = self.grid.num_cells() as i32;
        let lanes = (n - 1).max(1) as usize;

        let mut candidates = vec![(self.bag.next_edge(), self.bag.next_lane(lanes))];
        for edge in self.bag.edges().to_vec() {
            for lane in 0..n - 1 {
                candidates.push((edge, lane));
            }
        }

        for (edge, lane) in candidates {
            if let Some(cells) = self.quad_cells(edge, lane) {
                let colors = self.theme.level.len();
                let color = self.bag.next_color(colors);
                self.place_quad(cells, BlockKind::Level(color));
                return true;
            }
        }
        self.game_over = true;
        false
    }

    /// Depth (cells in from the edge) where a block entering along `lane`
    /// comes to rest, or -1 when the lane's entry cell is occupied.
    fn landing_depth(&self, edge: Direction, lane: i32) -> i32 {
        let rest = self.grid.first_available(edge, lane, 0);
        let n = self.grid.num_cells() as i32;
        match edge {
            Direction::Top => rest.y,
            Direction::Right => n - 1 - rest.x,
            Direction::Bottom => n - 1 - rest.y,
            Direction::Left => rest.x,
        }
    }

    /// Cell at `depth` steps in from `edge` along `lane`.
    fn cell_at(&self, edge: Direction, lane: i32, depth: i32) -> Coord {
        self.grid.edge_coord(edge, lane, 0).stepped(edge, -depth)
    }

    /// Cells a rigid 2x2 quad entering from `edge` on lanes `lane`/`lane+1`
    /// would occupy, or None when there is no room for a full quad. The quad
    /// stops where its leading pair first meets an obstruction.
    fn quad_cells(&self, edge: Direction, lane: i32) -> Option<[Coord; 4]> {
        let lead = self
            .landing_depth(edge, lane)
            .min(self.landing_depth(edge, lane + 1));
        // Needs depths lead and lead-1 inside the grid.
        if lead < 1 {
            return None;
        }
        Some([
            self.cell_at(edge, lane, lead),
            self.cell_at(edge, lane + 1, lead),
            self.cell_at(edge, lane, lead - 1),
            self.cell_at(edge, lane + 1, lead - 1),
        ])
    }

    fn place_quad(&mut self, cells: [Coord; 4], kind: BlockKind) {
        for coord in cells {
            if !self.grid.in_bounds(coord) {
                continue;
            }
            let id = self.blocks.insert(Block { coord, kind });
            let _ = self.grid.place(coord, id);
        }
    }

    pub fn block_kind(&self, id: BlockId) -> Option<BlockKind> {
        self.blocks.get(id).map(|b| b.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameConfig, Palette};

    fn config(cells: u16, edges: &[Direction]) -> GameConfig {
        GameConfig {
            cells,
            grid_size: cells * 2,
            spawn_delay_ms: 3000,
            spawn_edges: edges.to_vec(),
            gridlines: true,
        }
    }

    fn state(cells: u16, edges: &[Direction]) -> GameState {
        let theme = Theme::load(None, Palette::Normal).unwrap();
        GameState::new(theme, &config(cells, edges), 64, 64)
    }

    fn kind_at(state: &GameState, x: i32, y: i32) -> Option<BlockKind> {
        state
            .grid
            .at(Coord::new(x, y))
            .and_then(|id| state.block_kind(id))
    }

    #[test]
    fn test_anchor_quad_placed_at_middle() {
        let s = state(6, &Direction::ALL);
        let m = s.grid.middle();
        assert_eq!(m, Coord::new(2, 2));
        for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            assert_eq!(kind_at(&s, m.x + dx, m.y + dy), Some(BlockKind::Anchor));
        }
        assert_eq!(s.blocks.alive(), 4);
    }

    #[test]
    fn test_slide_moves_anchor_with_middle() {
        let mut s = state(6, &Direction::ALL);
        assert!(s.slide(Direction::Left));
        let m = s.grid.middle();
        assert_eq!(m, Coord::new(1, 2));
        assert_eq!(kind_at(&s, m.x, m.y), Some(BlockKind::Anchor));
        // Mirrored coordinates in the arena stay in sync with the grid.
        for (coord, id) in s.grid.blocks() {
            assert_eq!(s.blocks.get(id).unwrap().coord, coord);
        }
        // The anchor quad has no floating member; nothing was removed.
        assert_eq!(s.removed, 0);
        assert_eq!(s.blocks.alive(), 4);
    }

    #[test]
    fn test_slide_then_cleanup_removes_lone_block() {
        let mut s = state(4, &Direction::ALL);
        let id = s.blocks.insert(Block {
            coord: Coord::new(0, 0),
            kind: BlockKind::Level(0),
        });
        s.grid.place(Coord::new(0, 0), id).unwrap();

        // Bottom row is empty, so the slide succeeds; the lone block ends up
        // at (0, 1) with every neighbour empty and is cleared.
        assert!(s.slide(Direction::Bottom));
        assert_eq!(s.removed, 1);
        assert_eq!(s.grid.at(Coord::new(0, 1)), None);
        let cleared = s.take_cleared();
        assert_eq!(cleared.len(), 1);
        assert_eq!(cleared[0].0, Coord::new(0, 1));
        // Anchor survived.
        assert_eq!(s.blocks.alive(), 4);
    }

    #[test]
    fn test_rejected_slide_reports_false() {
        let mut s = state(4, &Direction::ALL);
        // Anchor occupies (1,1)-(2,2); push it against the top edge.
        assert!(s.slide(Direction::Top));
        assert!(!s.slide(Direction::Top));
    }

    #[test]
    fn test_spawn_quad_lands_against_field() {
        let mut s = state(6, &[Direction::Top]);
        assert!(s.spawn_quad());
        assert_eq!(s.blocks.alive(), 8);

        // Four fresh Level blocks form a contiguous 2x2.
        let level: Vec<Coord> = s
            .grid
            .blocks()
            .filter(|&(_, id)| matches!(s.block_kind(id), Some(BlockKind::Level(_))))
            .map(|(coord, _)| coord)
            .collect();
        assert_eq!(level.len(), 4);
        let min_x = level.iter().map(|c| c.x).min().unwrap();
        let min_y = level.iter().map(|c| c.y).min().unwrap();
        for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            assert!(level.contains(&Coord::new(min_x + dx, min_y + dy)));
        }
    }

    #[test]
    fn test_spawn_jams_when_no_room() {
        // On a 4-cell grid the anchor leaves no adjacent lane pair with room
        // at depth 1: every pair includes a lane that lands at depth 0.
        let mut s = state(4, &Direction::ALL);
        assert!(!s.spawn_quad());
        assert!(s.game_over);
        assert!(!s.slide(Direction::Top));
    }

    #[test]
    fn test_spawn_bag_respects_allowed_edges() {
        let mut bag = SpawnBag::new(&[Direction::Right]);
        for _ in 0..8 {
            assert_eq!(bag.next_edge(), Direction::Right);
        }
    }
}
