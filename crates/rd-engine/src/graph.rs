//! `GraphEngine` — Dijkstra routing over a [`NavGraph`].
//!
//! Start and goal positions are snapped to their nearest nodes.  The search
//! ends at the first settled node that is either the goal's snapped node or
//! lies within the goal radius of the goal position.  Edges narrower than
//! the mover's footprint diameter are skipped.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use rd_core::{EdgeId, EngineRouteId, MoverProfile, NodeId, OwnerId, Position, Rect};

use crate::{EngineKind, NavGraph, RouteBook, RouteEngine, RouteRequest, WaypointPath, WaypointQuery};

/// Route engine backed by a shared, immutable navigation graph.
pub struct GraphEngine {
    graph: Arc<NavGraph>,
    book:  RouteBook,
}

impl GraphEngine {
    pub fn new(graph: Arc<NavGraph>) -> Self {
        Self { graph, book: RouteBook::new() }
    }
}

impl RouteEngine for GraphEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Graph
    }

    fn create_route(&mut self, request: &RouteRequest) -> Option<EngineRouteId> {
        let points = plan(&self.graph, request, request.start, request.goal_radius)?;
        self.book.insert(*request, points)
    }

    fn next_waypoint(&mut self, id: EngineRouteId, query: &WaypointQuery) -> Position {
        let graph = &self.graph;
        self.book
            .advance(id, query, |req, from, radius| plan(graph, req, from, radius))
    }

    fn route_updated(&mut self, id: EngineRouteId) -> bool {
        self.book.take_updated(id)
    }

    fn update_route(&mut self, id: EngineRouteId, _owner: Option<OwnerId>) -> bool {
        let graph = &self.graph;
        self.book
            .force_replan(id, |req, from, radius| plan(graph, req, from, radius))
    }

    fn delete_route(&mut self, id: EngineRouteId) {
        self.book.remove(id);
    }

    fn waypoint_path(&self, id: EngineRouteId) -> WaypointPath {
        self.book.path(id)
    }

    fn terrain_changed(&mut self, area: Rect) {
        let flagged = self.book.mark_dirty(area);
        log::debug!("[GraphEngine] terrain change flagged {flagged} routes");
    }

    fn live_routes(&self) -> usize {
        self.book.len()
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

/// Plan from `from` to the request's goal and return the waypoints after the
/// start node.  A route whose start node already satisfies the goal is the
/// single waypoint of that node.
fn plan(graph: &NavGraph, req: &RouteRequest, from: Position, radius: f32) -> Option<Vec<Position>> {
    let start     = graph.snap_to_node(from)?;
    let goal_node = graph.snap_to_node(req.goal)?;
    let nodes     = dijkstra(graph, &req.mover, start, |n| {
        n == goal_node || graph.node_pos[n.index()].distance_2d(req.goal) <= radius
    })?;

    let points: Vec<Position> = if nodes.len() == 1 {
        vec![graph.node_pos[start.index()]]
    } else {
        nodes[1..].iter().map(|n| graph.node_pos[n.index()]).collect()
    };
    Some(points)
}

/// Node sequence from `from` to the first settled node accepted by `is_goal`.
fn dijkstra<G>(graph: &NavGraph, mover: &MoverProfile, from: NodeId, is_goal: G) -> Option<Vec<NodeId>>
where
    G: Fn(NodeId) -> bool,
{
    let n = graph.node_count();
    let min_width = mover.footprint * 2.0;
    // dist[v] = best known cost to reach v.
    let mut dist      = vec![u32::MAX; n];
    // prev_edge[v] = EdgeId that reached v; EdgeId::INVALID for unreached nodes.
    let mut prev_edge = vec![EdgeId::INVALID; n];

    dist[from.index()] = 0;

    // Min-heap: (cost, node).  Secondary key NodeId ensures deterministic
    // tie-breaking.
    let mut heap: BinaryHeap<Reverse<(u32, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        if cost > dist[node.index()] {
            continue;
        }
        if is_goal(node) {
            return Some(reconstruct(graph, &prev_edge, node));
        }

        for edge in graph.out_edges(node) {
            if graph.edge_width[edge.index()] < min_width {
                continue;
            }
            let neighbor = graph.edge_to[edge.index()];
            let new_cost = cost.saturating_add(graph.edge_cost[edge.index()]);
            if new_cost < dist[neighbor.index()] {
                dist[neighbor.index()] = new_cost;
                prev_edge[neighbor.index()] = edge;
                heap.push(Reverse((new_cost, neighbor)));
            }
        }
    }

    None
}

fn reconstruct(graph: &NavGraph, prev_edge: &[EdgeId], to: NodeId) -> Vec<NodeId> {
    let mut nodes = vec![to];
    let mut cur = to;
    loop {
        let e = prev_edge[cur.index()];
        if e == EdgeId::INVALID {
            break;
        }
        cur = graph.edge_from[e.index()];
        nodes.push(cur);
    }
    nodes.reverse();
    nodes
}
