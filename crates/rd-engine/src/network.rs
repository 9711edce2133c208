//! Navigation graph representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_to[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! All edge arrays (`edge_from`, `edge_to`, `edge_cost`, `edge_width`) are
//! sorted by source node and indexed by `EdgeId`, so iterating a node's
//! outgoing edges is a contiguous memory scan, which suits Dijkstra's inner
//! loop.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps ground-plane `[x, z]` to the nearest
//! `NodeId`.  Used to snap route start and goal positions onto the graph.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use rd_core::{EdgeId, NodeId, Position};

// ── R-tree node entry ─────────────────────────────────────────────────────────

/// Entry stored in the R-tree spatial index: a 2-D `[x, z]` point with the
/// associated `NodeId`.
#[derive(Clone)]
struct NodeEntry {
    point: [f32; 2], // [x, z]
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.point[0] - point[0];
        let dz = self.point[1] - point[1];
        dx * dx + dz * dz
    }
}

// ── NavGraph ──────────────────────────────────────────────────────────────────

/// Directed navigation graph in CSR format plus a spatial index for node
/// snapping.
///
/// All fields are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`NavGraphBuilder`].
pub struct NavGraph {
    /// World position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<Position>,

    /// CSR row pointer.  Outgoing edges of node `n` are at EdgeIds
    /// `node_out_start[n] .. node_out_start[n+1]`.
    /// Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    /// Source node of each edge.
    pub edge_from: Vec<NodeId>,

    /// Destination node of each edge.
    pub edge_to: Vec<NodeId>,

    /// Traversal cost of each edge (thousandths of a world unit of ground
    /// distance unless the builder was given explicit costs).
    pub edge_cost: Vec<u32>,

    /// Usable width of each edge in world units.
    pub edge_width: Vec<f32>,

    spatial_idx: RTree<NodeEntry>,
}

impl NavGraph {
    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    /// Nearest node to `pos` on the ground plane, or `None` for an empty graph.
    pub fn snap_to_node(&self, pos: Position) -> Option<NodeId> {
        self.spatial_idx
            .nearest_neighbor(&[pos.x, pos.z])
            .map(|e| e.id)
    }
}

// ── NavGraphBuilder ───────────────────────────────────────────────────────────

/// Construct a [`NavGraph`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use rd_core::Position;
/// use rd_engine::NavGraphBuilder;
///
/// let mut b = NavGraphBuilder::new();
/// let a = b.add_node(Position::ground(0.0, 0.0));
/// let c = b.add_node(Position::ground(10.0, 0.0));
/// b.add_road(a, c, 4.0);
/// let graph = b.build();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 2); // bidirectional
/// ```
pub struct NavGraphBuilder {
    nodes:     Vec<Position>,
    raw_edges: Vec<RawEdge>,
}

struct RawEdge {
    from:  NodeId,
    to:    NodeId,
    cost:  u32,
    width: f32,
}

impl NavGraphBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_edges: Vec::new() }
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add a node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, pos: Position) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        id
    }

    /// Add a **directed** edge with an explicit cost.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, cost: u32, width: f32) {
        self.raw_edges.push(RawEdge { from, to, cost, width });
    }

    /// Add edges in both directions costed by ground distance in thousandths of a
    /// world unit.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, width: f32) {
        let cost = self.ground_cost(a, b);
        self.add_directed_edge(a, b, cost, width);
        self.add_directed_edge(b, a, cost, width);
    }

    /// Ground distance between two added nodes in thousandths of a world unit.
    pub fn ground_cost(&self, a: NodeId, b: NodeId) -> u32 {
        let d = self.nodes[a.index()].distance_2d(self.nodes[b.index()]);
        (d * 1000.0).round() as u32
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`NavGraph`].
    ///
    /// Time complexity: O(E log E) for edge sort + O(N log N) for R-tree bulk
    /// load.
    pub fn build(self) -> NavGraph {
        let node_count = self.nodes.len();
        let edge_count = self.raw_edges.len();

        // Stable sort keeps insertion order among a node's edges, which makes
        // Dijkstra tie-breaking reproducible.
        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| e.from.0);

        let edge_from:  Vec<NodeId> = raw.iter().map(|e| e.from).collect();
        let edge_to:    Vec<NodeId> = raw.iter().map(|e| e.to).collect();
        let edge_cost:  Vec<u32>    = raw.iter().map(|e| e.cost).collect();
        let edge_width: Vec<f32>    = raw.iter().map(|e| e.width).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &pos)| NodeEntry {
                point: [pos.x, pos.z],
                id: NodeId(i as u32),
            })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        NavGraph {
            node_pos: self.nodes,
            node_out_start,
            edge_from,
            edge_to,
            edge_cost,
            edge_width,
            spatial_idx,
        }
    }
}

impl Default for NavGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
