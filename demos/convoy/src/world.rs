//! The demo map: a 256 × 256 world with a lake, a ridge with one pass, and a
//! road lattice laid over the open ground.
//!
//! ```text
//!   z=256 ┌────────────────┬──┬──────────────┐
//!         │                │##│     ~~~~     │   ## ridge (blocked)
//!         │                │##│     ~~~~     │   ~~ lake  (water)
//!   z=110 │                └──┘              │   .. marsh (land, cost 3)
//!         │                 pass             │
//!   z=90  │       ......   ┌──┐              │
//!         │       ......   │##│              │
//!   z=0   └────────────────┴──┴──────────────┘
//!        x=0              x=100            x=256
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use rd_core::{Position, Rect};
use rd_engine::{Cell, EngineWorld, NavGraph, NavGraphBuilder, TerrainClass, TerrainGrid};

pub const CELL_SIZE:    f32 = 4.0;
pub const GRID_CELLS:   u32 = 64;
pub const EXTENT:       f32 = CELL_SIZE * GRID_CELLS as f32;
const ROAD_SPACING:     f32 = 16.0;
const ROAD_WIDTH:       f32 = 6.0;

const MARSH: Cell = Cell { class: TerrainClass::Land, cost: 3 };

pub struct World {
    pub grid:  Arc<RwLock<TerrainGrid>>,
    pub graph: Arc<NavGraph>,
}

impl World {
    /// Both engines' data, so the config can pick either.
    pub fn engine_world(&self) -> EngineWorld {
        EngineWorld::new()
            .with_grid(Arc::clone(&self.grid))
            .with_graph(Arc::clone(&self.graph))
    }
}

fn rect(x0: f32, z0: f32, x1: f32, z1: f32) -> Rect {
    Rect::from_corners(Position::ground(x0, z0), Position::ground(x1, z1))
}

pub fn build() -> World {
    let mut grid = TerrainGrid::new(GRID_CELLS, GRID_CELLS, CELL_SIZE);
    grid.fill(rect(150.0, 150.0, 230.0, 230.0), Cell::WATER);
    grid.fill(rect(100.0, 0.0, 108.0, 90.0), Cell::BLOCKED);
    grid.fill(rect(100.0, 110.0, 108.0, EXTENT), Cell::BLOCKED);
    grid.fill(rect(40.0, 40.0, 80.0, 80.0), MARSH);

    let graph = road_lattice(&grid);
    World { grid: Arc::new(RwLock::new(grid)), graph: Arc::new(graph) }
}

/// Square lattice of two-way roads.  Roads with an end or midpoint off dry
/// land are left out.
fn road_lattice(grid: &TerrainGrid) -> NavGraph {
    let per_side = (EXTENT / ROAD_SPACING) as usize;
    let mut b = NavGraphBuilder::with_capacity(per_side * per_side, per_side * per_side * 4);

    let mut ids = Vec::with_capacity(per_side * per_side);
    for iz in 0..per_side {
        for ix in 0..per_side {
            let pos = Position::ground(
                (ix as f32 + 0.5) * ROAD_SPACING,
                (iz as f32 + 0.5) * ROAD_SPACING,
            );
            ids.push(b.add_node(pos));
        }
    }

    let node_pos = |ix: usize, iz: usize| {
        Position::ground((ix as f32 + 0.5) * ROAD_SPACING, (iz as f32 + 0.5) * ROAD_SPACING)
    };
    let dry = |a: Position, c: Position| {
        let mid = Position::ground((a.x + c.x) * 0.5, (a.z + c.z) * 0.5);
        [a, mid, c].into_iter().all(|p| is_land(grid, p))
    };

    for iz in 0..per_side {
        for ix in 0..per_side {
            let here = node_pos(ix, iz);
            if ix + 1 < per_side && dry(here, node_pos(ix + 1, iz)) {
                b.add_road(ids[iz * per_side + ix], ids[iz * per_side + ix + 1], ROAD_WIDTH);
            }
            if iz + 1 < per_side && dry(here, node_pos(ix, iz + 1)) {
                b.add_road(ids[iz * per_side + ix], ids[(iz + 1) * per_side + ix], ROAD_WIDTH);
            }
        }
    }
    b.build()
}

/// A random dry-land position.
pub fn random_land<R: rand::Rng>(grid: &TerrainGrid, rng: &mut R) -> Position {
    loop {
        let pos = Position::ground(rng.gen_range(0.0..EXTENT), rng.gen_range(0.0..EXTENT));
        if is_land(grid, pos) {
            return pos;
        }
    }
}

fn is_land(grid: &TerrainGrid, pos: Position) -> bool {
    grid.cell_at(pos)
        .and_then(|(cx, cz)| grid.cell(cx, cz))
        .is_some_and(|cell| cell.class == TerrainClass::Land)
}
