//! Unit tests for rd-engine.
//!
//! All tests use hand-crafted graphs and grids.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;

    use parking_lot::RwLock;
    use rd_core::{MoverId, MoverKind, MoverProfile, NodeId, Position};

    use crate::{NavGraph, NavGraphBuilder, RouteRequest, TerrainGrid, WaypointQuery};

    /// Straight line of nodes along x: 0 ─ 10 ─ 20, roads 4 units wide,
    /// plus an isolated node far away.
    ///
    /// ```text
    ///   n0(0,0) ── n1(10,0) ── n2(20,0)        n3(100,100)
    /// ```
    pub fn line_graph() -> (Arc<NavGraph>, [NodeId; 4]) {
        let mut b = NavGraphBuilder::new();
        let n0 = b.add_node(Position::ground(0.0, 0.0));
        let n1 = b.add_node(Position::ground(10.0, 0.0));
        let n2 = b.add_node(Position::ground(20.0, 0.0));
        let n3 = b.add_node(Position::ground(100.0, 100.0));
        b.add_road(n0, n1, 4.0);
        b.add_road(n1, n2, 4.0);
        (Arc::new(b.build()), [n0, n1, n2, n3])
    }

    pub fn open_grid(w: u32, h: u32) -> Arc<RwLock<TerrainGrid>> {
        Arc::new(RwLock::new(TerrainGrid::new(w, h, 1.0)))
    }

    pub fn ground(footprint: f32) -> MoverProfile {
        MoverProfile::new(MoverId(0), MoverKind::Ground, footprint)
    }

    pub fn request(mover: MoverProfile, start: Position, goal: Position, radius: f32) -> RouteRequest {
        RouteRequest { mover, start, goal, goal_radius: radius, owner: None, synced: true }
    }

    pub fn query(caller: Position, min_distance: f32, retries: u32) -> WaypointQuery {
        WaypointQuery { caller_pos: caller, min_distance, retries, owner: None, synced: true }
    }
}

// ── NavGraph structure ────────────────────────────────────────────────────────

#[cfg(test)]
mod network {
    use rd_core::Position;

    use crate::NavGraphBuilder;

    #[test]
    fn empty_build() {
        let g = NavGraphBuilder::new().build();
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
        assert!(g.is_empty());
        assert!(g.snap_to_node(Position::ZERO).is_none());
    }

    #[test]
    fn road_costs_are_scaled_ground_distance() {
        let mut b = NavGraphBuilder::new();
        let a = b.add_node(Position::ground(0.0, 0.0));
        let c = b.add_node(Position::ground(3.0, 4.0));
        assert_eq!(b.ground_cost(a, c), 5_000);
        b.add_road(a, c, 1.0);
        let g = b.build();
        assert_eq!(g.edge_count(), 2);
        assert!(g.edge_cost.iter().all(|&c| c == 5_000));
    }

    #[test]
    fn csr_degrees() {
        let (g, [n0, n1, n2, n3]) = super::helpers::line_graph();
        assert_eq!(g.out_edges(n0).count(), 1);
        assert_eq!(g.out_edges(n1).count(), 2);
        assert_eq!(g.out_edges(n2).count(), 1);
        assert_eq!(g.out_edges(n3).count(), 0);
        for e in g.out_edges(n1) {
            assert_eq!(g.edge_from[e.index()], n1);
        }
    }

    #[test]
    fn snap_to_nearest_node() {
        let (g, [n0, n1, n2, n3]) = super::helpers::line_graph();
        assert_eq!(g.snap_to_node(Position::ground(4.0, 1.0)), Some(n0));
        assert_eq!(g.snap_to_node(Position::ground(6.0, -1.0)), Some(n1));
        assert_eq!(g.snap_to_node(Position::ground(21.0, 3.0)), Some(n2));
        assert_eq!(g.snap_to_node(Position::ground(90.0, 80.0)), Some(n3));
    }
}

// ── Waypoint paths & tracking ─────────────────────────────────────────────────

#[cfg(test)]
mod tracking {
    use rd_core::{EngineRouteId, Position, Rect};

    use super::helpers::{ground, query, request};
    use crate::{MAX_RETRIES, RouteBook, WaypointPath};

    #[test]
    fn segment_starts_mark_turns() {
        let path = WaypointPath::from_points(vec![
            Position::ground(1.0, 0.0),
            Position::ground(2.0, 0.0),
            Position::ground(2.0, 1.0),
            Position::ground(2.0, 2.0),
        ]);
        assert_eq!(path.segment_starts, vec![0, 1]);
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn straight_path_is_one_segment() {
        let path = WaypointPath::from_points(vec![
            Position::ground(0.0, 0.0),
            Position::ground(1.0, 1.0),
            Position::ground(2.0, 2.0),
        ]);
        assert_eq!(path.segment_starts, vec![0]);
        assert!(WaypointPath::from_points(vec![]).segment_starts.is_empty());
    }

    #[test]
    fn empty_points_are_not_stored() {
        let mut book = RouteBook::new();
        let req = request(ground(0.5), Position::ZERO, Position::ZERO, 0.0);
        assert!(book.insert(req, vec![]).is_none());
        assert!(book.is_empty());
    }

    #[test]
    fn ids_are_not_reused() {
        let mut book = RouteBook::new();
        let req = request(ground(0.5), Position::ZERO, Position::ZERO, 0.0);
        let a = book.insert(req, vec![Position::ZERO]).unwrap();
        book.remove(a);
        let b = book.insert(req, vec![Position::ZERO]).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, EngineRouteId(0));
        assert_eq!(b, EngineRouteId(1));
    }

    #[test]
    fn failed_replan_keeps_old_points() {
        let mut book = RouteBook::new();
        let req = request(ground(0.5), Position::ZERO, Position::ground(5.0, 0.0), 0.0);
        let points = vec![Position::ground(2.0, 0.0), Position::ground(5.0, 0.0)];
        let id = book.insert(req, points.clone()).unwrap();

        let area = Rect::from_corners(Position::ground(4.0, -1.0), Position::ground(6.0, 1.0));
        assert_eq!(book.mark_dirty(area), 1);
        assert_eq!(book.mark_dirty(area), 0); // already dirty

        let mut attempts = Vec::new();
        let target = book.advance(id, &query(Position::ZERO, 0.5, 2), |_, _, r| {
            attempts.push(r);
            None
        });
        assert_eq!(target, points[0]);
        assert_eq!(attempts, vec![0.0, 2.0, 4.0]);
        assert!(!book.take_updated(id));
        assert!(!book.get(id).unwrap().dirty);
    }

    #[test]
    fn retries_are_capped() {
        let mut book = RouteBook::new();
        let req = request(ground(0.5), Position::ZERO, Position::ground(5.0, 0.0), 0.0);
        let id = book.insert(req, vec![Position::ground(5.0, 0.0)]).unwrap();
        book.mark_dirty(Rect::from_corners(Position::ZERO, Position::ground(6.0, 1.0)));

        let mut attempts = 0u32;
        book.advance(id, &query(Position::ZERO, 0.5, u32::MAX), |_, _, _| {
            attempts += 1;
            None
        });
        assert_eq!(attempts, MAX_RETRIES + 1);
    }
}

// ── GraphEngine ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod graph_engine {
    use rd_core::{EngineRouteId, Position, Rect};

    use super::helpers::{ground, line_graph, query, request};
    use crate::{Cell, EngineKind, GraphEngine, RouteEngine, TerrainEdit};

    #[test]
    fn terrain_edits_are_not_supported() {
        let (g, _) = line_graph();
        let mut eng = GraphEngine::new(g);
        let area = Rect::from_corners(Position::ZERO, Position::ground(5.0, 5.0));
        assert_eq!(eng.edit_terrain(&TerrainEdit { area, cell: Cell::BLOCKED }), None);
    }

    #[test]
    fn route_along_line() {
        let (g, _) = line_graph();
        let mut eng = GraphEngine::new(g);
        let id = eng
            .create_route(&request(ground(1.0), Position::ZERO, Position::ground(20.0, 0.0), 0.0))
            .unwrap();

        let path = eng.waypoint_path(id);
        assert_eq!(path.points, vec![Position::ground(10.0, 0.0), Position::ground(20.0, 0.0)]);
        assert_eq!(path.segment_starts, vec![0]);
        assert_eq!(eng.live_routes(), 1);
        assert_eq!(eng.kind(), EngineKind::Graph);
    }

    #[test]
    fn next_waypoint_skips_reached_points() {
        let (g, _) = line_graph();
        let mut eng = GraphEngine::new(g);
        let id = eng
            .create_route(&request(ground(1.0), Position::ZERO, Position::ground(20.0, 0.0), 0.0))
            .unwrap();

        assert_eq!(eng.next_waypoint(id, &query(Position::ZERO, 1.0, 0)), Position::ground(10.0, 0.0));
        assert_eq!(
            eng.next_waypoint(id, &query(Position::ground(9.5, 0.0), 1.0, 0)),
            Position::ground(20.0, 0.0)
        );
        // The last waypoint is never skipped.
        assert_eq!(
            eng.next_waypoint(id, &query(Position::ground(20.0, 0.0), 1.0, 0)),
            Position::ground(20.0, 0.0)
        );
    }

    #[test]
    fn goal_radius_stops_early() {
        let (g, _) = line_graph();
        let mut eng = GraphEngine::new(g);
        let id = eng
            .create_route(&request(ground(1.0), Position::ZERO, Position::ground(20.0, 0.0), 12.0))
            .unwrap();
        assert_eq!(eng.waypoint_path(id).points, vec![Position::ground(10.0, 0.0)]);
    }

    #[test]
    fn trivial_route_is_start_node() {
        let (g, _) = line_graph();
        let mut eng = GraphEngine::new(g);
        let id = eng
            .create_route(&request(ground(1.0), Position::ZERO, Position::ground(0.5, 0.0), 0.0))
            .unwrap();
        assert_eq!(eng.waypoint_path(id).points, vec![Position::ZERO]);
    }

    #[test]
    fn wide_mover_and_disconnected_goal_fail() {
        let (g, _) = line_graph();
        let mut eng = GraphEngine::new(g);
        // footprint 3 → needs 6 wide, roads are 4.
        assert!(eng
            .create_route(&request(ground(3.0), Position::ZERO, Position::ground(20.0, 0.0), 0.0))
            .is_none());
        assert!(eng
            .create_route(&request(ground(1.0), Position::ZERO, Position::ground(100.0, 100.0), 0.0))
            .is_none());
        assert_eq!(eng.live_routes(), 0);
    }

    #[test]
    fn terrain_change_replans_lazily() {
        let (g, _) = line_graph();
        let mut eng = GraphEngine::new(g);
        let id = eng
            .create_route(&request(ground(1.0), Position::ZERO, Position::ground(20.0, 0.0), 0.0))
            .unwrap();
        assert!(!eng.route_updated(id));

        eng.terrain_changed(Rect::from_corners(Position::ground(9.0, -1.0), Position::ground(11.0, 1.0)));
        assert!(!eng.route_updated(id)); // nothing re-planned yet

        eng.next_waypoint(id, &query(Position::ZERO, 1.0, 0));
        assert!(eng.route_updated(id));
        assert!(!eng.route_updated(id)); // reading clears
    }

    #[test]
    fn forced_update_sets_flag() {
        let (g, _) = line_graph();
        let mut eng = GraphEngine::new(g);
        let id = eng
            .create_route(&request(ground(1.0), Position::ZERO, Position::ground(20.0, 0.0), 0.0))
            .unwrap();
        assert!(eng.update_route(id, None));
        assert!(eng.route_updated(id));
    }

    #[test]
    fn unknown_ids_are_tolerated() {
        let (g, _) = line_graph();
        let mut eng = GraphEngine::new(g);
        let ghost = EngineRouteId(77);
        let caller = Position::ground(3.0, 3.0);
        assert_eq!(eng.next_waypoint(ghost, &query(caller, 1.0, 0)), caller);
        assert!(!eng.route_updated(ghost));
        assert!(!eng.update_route(ghost, None));
        assert!(eng.waypoint_path(ghost).is_empty());
        eng.delete_route(ghost);
    }

    #[test]
    fn delete_releases_route() {
        let (g, _) = line_graph();
        let mut eng = GraphEngine::new(g);
        let id = eng
            .create_route(&request(ground(1.0), Position::ZERO, Position::ground(20.0, 0.0), 0.0))
            .unwrap();
        eng.delete_route(id);
        eng.delete_route(id);
        assert_eq!(eng.live_routes(), 0);
        assert!(eng.waypoint_path(id).is_empty());
    }
}

// ── GridEngine ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod grid_engine {
    use rd_core::{MoverId, MoverKind, MoverProfile, Position, Rect};

    use super::helpers::{ground, open_grid, query, request};
    use crate::{
        Cell, EngineError, EngineKind, GridEngine, RouteEngine, TerrainClass, TerrainEdit, TerrainGrid,
    };

    fn cell_pos(cx: u32, cz: u32) -> Position {
        Position::ground(cx as f32 + 0.5, cz as f32 + 0.5)
    }

    #[test]
    fn straight_route_on_open_grid() {
        let mut eng = GridEngine::new(open_grid(10, 10));
        let id = eng
            .create_route(&request(ground(0.4), cell_pos(0, 0), cell_pos(5, 0), 0.0))
            .unwrap();
        let path = eng.waypoint_path(id);
        assert_eq!(path.points, (1..=5).map(|x| cell_pos(x, 0)).collect::<Vec<_>>());
        assert_eq!(path.segment_starts, vec![0]);
        assert_eq!(eng.kind(), EngineKind::Grid);
    }

    #[test]
    fn routes_around_wall() {
        let grid = open_grid(10, 10);
        {
            let mut g = grid.write();
            for z in 0..9 {
                g.set(3, z, Cell::BLOCKED);
            }
        }
        let mut eng = GridEngine::new(grid.clone());
        let id = eng
            .create_route(&request(ground(0.4), cell_pos(0, 0), cell_pos(5, 0), 0.0))
            .unwrap();
        let path = eng.waypoint_path(id);
        assert!(path.len() > 5);
        assert_eq!(path.points.last().copied(), Some(cell_pos(5, 0)));
        let g = grid.read();
        for p in &path.points {
            let (cx, cz) = g.cell_at(*p).unwrap();
            assert_ne!(g.cell(cx, cz).unwrap().class, TerrainClass::Blocked);
        }
        assert!(path.segment_starts.len() > 1);
    }

    #[test]
    fn sealed_wall_has_no_route() {
        let grid = open_grid(10, 10);
        {
            let mut g = grid.write();
            for z in 0..10 {
                g.set(3, z, Cell::BLOCKED);
            }
        }
        let mut eng = GridEngine::new(grid);
        assert!(eng
            .create_route(&request(ground(0.4), cell_pos(0, 0), cell_pos(5, 0), 0.0))
            .is_none());
    }

    #[test]
    fn no_corner_cutting() {
        let grid = open_grid(3, 3);
        {
            let mut g = grid.write();
            g.set(1, 0, Cell::BLOCKED);
            g.set(0, 1, Cell::BLOCKED);
        }
        let mut eng = GridEngine::new(grid);
        assert!(eng
            .create_route(&request(ground(0.4), cell_pos(0, 0), cell_pos(1, 1), 0.0))
            .is_none());
    }

    #[test]
    fn mover_kind_decides_passability() {
        let grid = open_grid(6, 1);
        {
            let mut g = grid.write();
            for x in 2..6 {
                g.set(x, 0, Cell::WATER);
            }
        }
        let mut eng = GridEngine::new(grid);
        let ship  = MoverProfile::new(MoverId(1), MoverKind::Ship, 0.4);
        let hover = MoverProfile::new(MoverId(2), MoverKind::Hover, 0.4);

        // Ground unit cannot reach the water; a ship cannot start on land.
        assert!(eng.create_route(&request(ground(0.4), cell_pos(0, 0), cell_pos(5, 0), 0.0)).is_none());
        assert!(eng.create_route(&request(ship, cell_pos(0, 0), cell_pos(5, 0), 0.0)).is_none());
        assert!(eng.create_route(&request(ship, cell_pos(2, 0), cell_pos(5, 0), 0.0)).is_some());
        assert!(eng.create_route(&request(hover, cell_pos(0, 0), cell_pos(5, 0), 0.0)).is_some());
    }

    #[test]
    fn terrain_change_reroutes() {
        let grid = open_grid(10, 10);
        let mut eng = GridEngine::new(grid.clone());
        let id = eng
            .create_route(&request(ground(0.4), cell_pos(0, 0), cell_pos(5, 0), 0.0))
            .unwrap();

        let area = grid.write().fill(
            Rect::from_corners(cell_pos(3, 0), cell_pos(3, 0)),
            Cell::BLOCKED,
        );
        eng.terrain_changed(area);
        eng.next_waypoint(id, &query(cell_pos(0, 0), 0.5, 0));
        assert!(eng.route_updated(id));
        assert!(!eng.waypoint_path(id).points.contains(&cell_pos(3, 0)));
    }

    #[test]
    fn edit_terrain_writes_the_shared_grid() {
        let grid = open_grid(10, 10);
        let mut eng = GridEngine::new(grid.clone());
        let edit = TerrainEdit { area: Rect::from_corners(cell_pos(2, 2), cell_pos(3, 2)), cell: Cell::WATER };

        let changed = eng.edit_terrain(&edit).unwrap();
        assert!(changed.contains(cell_pos(2, 2)) && changed.contains(cell_pos(3, 2)));
        assert_eq!(grid.read().cell(2, 2), Some(Cell::WATER));
        assert_eq!(grid.read().cell(3, 2), Some(Cell::WATER));
        assert_eq!(grid.read().cell(4, 2), Some(Cell::LAND));
    }

    #[test]
    fn retries_widen_goal_radius() {
        let grid = open_grid(10, 10);
        let mut eng = GridEngine::new(grid.clone());
        let goal = cell_pos(5, 0);
        let id = eng
            .create_route(&request(ground(0.4), cell_pos(0, 0), goal, 0.0))
            .unwrap();

        // Wall the goal cell in.
        let area = grid.write().fill(Rect::from_corners(goal, goal), Cell::BLOCKED);

        eng.terrain_changed(area);
        eng.next_waypoint(id, &query(cell_pos(0, 0), 0.5, 0));
        assert!(!eng.route_updated(id), "radius 0 cannot reach a blocked goal");

        eng.terrain_changed(area);
        let next = eng.next_waypoint(id, &query(cell_pos(0, 0), 0.5, 1));
        assert!(eng.route_updated(id));
        assert_eq!(next, cell_pos(1, 0));
        let last = *eng.waypoint_path(id).points.last().unwrap();
        assert!(last.distance_2d(goal) <= 2.0);
    }

    #[test]
    fn outside_grid_fails() {
        let mut eng = GridEngine::new(open_grid(4, 4));
        assert!(eng
            .create_route(&request(ground(0.4), Position::ground(-1.0, 0.0), cell_pos(2, 2), 0.0))
            .is_none());
    }

    #[test]
    fn from_cells_checks_size() {
        let err = TerrainGrid::from_cells(3, 3, 1.0, vec![Cell::LAND; 8]);
        assert!(matches!(err, Err(EngineError::GridSize { expected: 9, got: 8, .. })));
        assert!(TerrainGrid::from_cells(3, 3, 1.0, vec![Cell::LAND; 9]).is_ok());
    }

    #[test]
    fn weighted_cells_are_avoided() {
        let grid = open_grid(5, 3);
        {
            let mut g = grid.write();
            for x in 1..4 {
                g.set(x, 1, Cell { class: TerrainClass::Land, cost: 20 });
            }
        }
        let mut eng = GridEngine::new(grid);
        let id = eng
            .create_route(&request(ground(0.4), cell_pos(0, 1), cell_pos(4, 1), 0.0))
            .unwrap();
        let path = eng.waypoint_path(id);
        // Detours through row 0 or row 2 instead of the expensive middle row.
        assert!(path.points.iter().all(|p| *p == cell_pos(4, 1) || p.z != 1.5));
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod registry {
    use super::helpers::{line_graph, open_grid};
    use crate::{EngineError, EngineKind, EngineWorld, build_engine};

    #[test]
    fn parse_kinds() {
        assert_eq!("graph".parse::<EngineKind>().unwrap(), EngineKind::Graph);
        assert_eq!(" GRID ".parse::<EngineKind>().unwrap(), EngineKind::Grid);
        assert!(matches!("qtpfs".parse::<EngineKind>(), Err(EngineError::UnknownKind(s)) if s == "qtpfs"));
        assert_eq!(EngineKind::Grid.to_string(), "grid");
        assert_eq!(EngineKind::default(), EngineKind::Graph);
    }

    #[test]
    fn missing_world_is_an_error() {
        let world = EngineWorld::new();
        assert!(matches!(
            build_engine(EngineKind::Graph, &world),
            Err(EngineError::MissingWorld { kind: EngineKind::Graph, .. })
        ));
        assert!(matches!(
            build_engine(EngineKind::Grid, &world),
            Err(EngineError::MissingWorld { kind: EngineKind::Grid, .. })
        ));
    }

    #[test]
    fn builds_selected_kind() {
        let (g, _) = line_graph();
        let world = EngineWorld::new().with_graph(g).with_grid(open_grid(4, 4));
        assert_eq!(build_engine(EngineKind::Graph, &world).unwrap().kind(), EngineKind::Graph);
        assert_eq!(build_engine(EngineKind::Grid, &world).unwrap().kind(), EngineKind::Grid);
    }
}
