//! `GridEngine` — A* routing over a shared [`TerrainGrid`].
//!
//! The grid is shared with the simulation behind a `RwLock` so it can be
//! read for placement and drawing.  Edits go through
//! [`RouteEngine::edit_terrain`], which the dispatcher queues in submission
//! order; the engine then flags live routes crossing the edited area for
//! re-plan.  Writing the grid directly is only ordered with queued requests
//! while the dispatcher's worker is idle, i.e. right after a barrier.
//!
//! Movement is 8-way.  A diagonal step is only allowed when both flanking
//! orthogonal cells are passable, so routes never cut corners between two
//! blocked cells.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use parking_lot::RwLock;

use rd_core::{EngineRouteId, MoverKind, OwnerId, Position, Rect};

use crate::{
    EngineError, EngineKind, EngineResult, RouteBook, RouteEngine, RouteRequest, TerrainEdit,
    WaypointPath, WaypointQuery,
};

// ── Terrain ───────────────────────────────────────────────────────────────────

/// Surface class of one grid cell.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum TerrainClass {
    #[default]
    Land,
    Water,
    /// Impassable for every mover.
    Blocked,
}

/// One grid cell: surface class plus a traversal cost multiplier (≥ 1).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Cell {
    pub class: TerrainClass,
    pub cost:  u8,
}

impl Cell {
    pub const LAND:    Cell = Cell { class: TerrainClass::Land,    cost: 1 };
    pub const WATER:   Cell = Cell { class: TerrainClass::Water,   cost: 1 };
    pub const BLOCKED: Cell = Cell { class: TerrainClass::Blocked, cost: 1 };

    #[inline]
    pub fn passable_for(self, kind: MoverKind) -> bool {
        match self.class {
            TerrainClass::Land    => kind.can_enter_land(),
            TerrainClass::Water   => kind.can_enter_water(),
            TerrainClass::Blocked => false,
        }
    }
}

/// Row-major grid of square cells anchored at the world origin.  Cell
/// `(cx, cz)` covers `[cx*cell_size, (cx+1)*cell_size)` on x and likewise on z.
pub struct TerrainGrid {
    width:     u32,
    height:    u32,
    cell_size: f32,
    cells:     Vec<Cell>,
}

impl TerrainGrid {
    /// All-land grid.
    pub fn new(width: u32, height: u32, cell_size: f32) -> Self {
        Self {
            width,
            height,
            cell_size,
            cells: vec![Cell::LAND; width as usize * height as usize],
        }
    }

    /// Grid from explicit row-major cells.
    pub fn from_cells(width: u32, height: u32, cell_size: f32, cells: Vec<Cell>) -> EngineResult<Self> {
        let expected = width as usize * height as usize;
        if cells.len() != expected {
            return Err(EngineError::GridSize { width, height, expected, got: cells.len() });
        }
        Ok(Self { width, height, cell_size, cells })
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn cell_size(&self) -> f32 { self.cell_size }

    #[inline]
    fn idx(&self, cx: u32, cz: u32) -> usize {
        cz as usize * self.width as usize + cx as usize
    }

    /// Cell at `(cx, cz)`, or `None` outside the grid.
    pub fn cell(&self, cx: u32, cz: u32) -> Option<Cell> {
        (cx < self.width && cz < self.height).then(|| self.cells[self.idx(cx, cz)])
    }

    /// Overwrite one cell.  Out-of-range coordinates are ignored.
    pub fn set(&mut self, cx: u32, cz: u32, cell: Cell) {
        if cx < self.width && cz < self.height {
            let i = self.idx(cx, cz);
            self.cells[i] = cell;
        }
    }

    /// Overwrite every cell whose centre lies inside `area` and return the
    /// world rectangle actually covered by those cells (for the
    /// terrain-change notification).
    pub fn fill(&mut self, area: Rect, cell: Cell) -> Rect {
        for cz in 0..self.height {
            for cx in 0..self.width {
                if area.contains(self.center(cx, cz)) {
                    let i = self.idx(cx, cz);
                    self.cells[i] = cell;
                }
            }
        }
        area.expanded(self.cell_size * 0.5)
    }

    /// Cell containing `pos`, or `None` outside the grid.
    pub fn cell_at(&self, pos: Position) -> Option<(u32, u32)> {
        if pos.x < 0.0 || pos.z < 0.0 {
            return None;
        }
        let cx = (pos.x / self.cell_size) as u32;
        let cz = (pos.z / self.cell_size) as u32;
        (cx < self.width && cz < self.height).then_some((cx, cz))
    }

    /// World position of a cell's centre (on the ground plane).
    pub fn center(&self, cx: u32, cz: u32) -> Position {
        Position::ground(
            (cx as f32 + 0.5) * self.cell_size,
            (cz as f32 + 0.5) * self.cell_size,
        )
    }

    #[inline]
    fn passable(&self, cx: i64, cz: i64, kind: MoverKind) -> bool {
        if cx < 0 || cz < 0 {
            return false;
        }
        self.cell(cx as u32, cz as u32)
            .is_some_and(|c| c.passable_for(kind))
    }
}

// ── GridEngine ────────────────────────────────────────────────────────────────

/// Route engine backed by a shared, mutable terrain grid.
pub struct GridEngine {
    grid: Arc<RwLock<TerrainGrid>>,
    book: RouteBook,
}

impl GridEngine {
    pub fn new(grid: Arc<RwLock<TerrainGrid>>) -> Self {
        Self { grid, book: RouteBook::new() }
    }
}

impl RouteEngine for GridEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Grid
    }

    fn create_route(&mut self, request: &RouteRequest) -> Option<EngineRouteId> {
        let points = plan(&self.grid.read(), request, request.start, request.goal_radius)?;
        self.book.insert(*request, points)
    }

    fn next_waypoint(&mut self, id: EngineRouteId, query: &WaypointQuery) -> Position {
        let grid = self.grid.read();
        self.book
            .advance(id, query, |req, from, radius| plan(&grid, req, from, radius))
    }

    fn route_updated(&mut self, id: EngineRouteId) -> bool {
        self.book.take_updated(id)
    }

    fn update_route(&mut self, id: EngineRouteId, _owner: Option<OwnerId>) -> bool {
        let grid = self.grid.read();
        self.book
            .force_replan(id, |req, from, radius| plan(&grid, req, from, radius))
    }

    fn delete_route(&mut self, id: EngineRouteId) {
        self.book.remove(id);
    }

    fn waypoint_path(&self, id: EngineRouteId) -> WaypointPath {
        self.book.path(id)
    }

    fn terrain_changed(&mut self, area: Rect) {
        let flagged = self.book.mark_dirty(area);
        log::debug!("[GridEngine] terrain change flagged {flagged} routes");
    }

    fn edit_terrain(&mut self, edit: &TerrainEdit) -> Option<Rect> {
        Some(self.grid.write().fill(edit.area, edit.cell))
    }

    fn live_routes(&self) -> usize {
        self.book.len()
    }
}

// ── A* internals ──────────────────────────────────────────────────────────────

const STRAIGHT: u32 = 10;
const DIAGONAL: u32 = 14;

/// (dx, dz, base step cost) for the 8 neighbours.
const NEIGHBOURS: [(i64, i64, u32); 8] = [
    ( 1,  0, STRAIGHT), (-1,  0, STRAIGHT), ( 0,  1, STRAIGHT), ( 0, -1, STRAIGHT),
    ( 1,  1, DIAGONAL), ( 1, -1, DIAGONAL), (-1,  1, DIAGONAL), (-1, -1, DIAGONAL),
];

/// Octile distance in step-cost units.
#[inline]
fn octile(a: (u32, u32), b: (u32, u32)) -> u32 {
    let dx = a.0.abs_diff(b.0);
    let dz = a.1.abs_diff(b.1);
    STRAIGHT * dx.max(dz) + (DIAGONAL - STRAIGHT) * dx.min(dz)
}

/// Plan from `from` and return the cell centres after the start cell.
fn plan(grid: &TerrainGrid, req: &RouteRequest, from: Position, radius: f32) -> Option<Vec<Position>> {
    let kind  = req.mover.kind;
    let start = grid.cell_at(from)?;
    let goal  = grid.cell_at(req.goal)?;
    if !grid.passable(start.0 as i64, start.1 as i64, kind) {
        return None;
    }

    let is_goal = |c: (u32, u32)| c == goal || grid.center(c.0, c.1).distance_2d(req.goal) <= radius;

    let w = grid.width as usize;
    let n = w * grid.height as usize;
    let index = |c: (u32, u32)| c.1 as usize * w + c.0 as usize;

    let mut g_cost = vec![u32::MAX; n];
    let mut parent = vec![usize::MAX; n];
    g_cost[index(start)] = 0;

    // Min-heap on (f, g, cell index); the index breaks ties deterministically.
    let mut open: BinaryHeap<Reverse<(u32, u32, usize)>> = BinaryHeap::new();
    open.push(Reverse((octile(start, goal), 0, index(start))));

    while let Some(Reverse((_, g, i))) = open.pop() {
        if g > g_cost[i] {
            continue;
        }
        let cell = ((i % w) as u32, (i / w) as u32);
        if is_goal(cell) {
            return Some(reconstruct(grid, &parent, i, index(start)));
        }

        let (cx, cz) = (cell.0 as i64, cell.1 as i64);
        for (dx, dz, step) in NEIGHBOURS {
            let (nx, nz) = (cx + dx, cz + dz);
            if !grid.passable(nx, nz, kind) {
                continue;
            }
            // No corner cutting: both flankers of a diagonal must be open.
            if dx != 0 && dz != 0
                && !(grid.passable(cx + dx, cz, kind) && grid.passable(cx, cz + dz, kind))
            {
                continue;
            }
            let next = (nx as u32, nz as u32);
            let ni   = index(next);
            let cost = grid.cells[ni].cost.max(1) as u32;
            let ng   = g.saturating_add(step * cost);
            if ng < g_cost[ni] {
                g_cost[ni] = ng;
                parent[ni] = i;
                open.push(Reverse((ng.saturating_add(octile(next, goal)), ng, ni)));
            }
        }
    }

    None
}

fn reconstruct(grid: &TerrainGrid, parent: &[usize], end: usize, start: usize) -> Vec<Position> {
    let w = grid.width as usize;
    let center = |i: usize| grid.center((i % w) as u32, (i / w) as u32);

    if end == start {
        return vec![center(start)];
    }
    let mut points = Vec::new();
    let mut cur = end;
    while cur != start && cur != usize::MAX {
        points.push(center(cur));
        cur = parent[cur];
    }
    points.reverse();
    points
}
