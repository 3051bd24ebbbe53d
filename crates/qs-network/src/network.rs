//! Network representation and builder.
//!
//! # Data layout
//!
//! Link attributes are stored column-wise and indexed by `LinkId`, in the
//! order links were added to the builder.  Adjacency is kept in two
//! **Compressed Sparse Row** tables, one for outgoing and one for incoming
//! links:
//!
//! ```text
//! node_out_links[ node_out_start[n] .. node_out_start[n+1] ]
//! node_in_links [ node_in_start[n]  .. node_in_start[n+1]  ]
//! ```
//!
//! Both slices are sorted by ascending `LinkId`.  The node mover relies on
//! this: incoming links are always served in the same order.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps a coordinate to the nearest node.  Used at
//! setup time to place activities that only carry a coordinate.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use qs_core::{Coord, LinkId, NodeId};

use crate::{NetworkError, NetworkResult};

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2],
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── LinkAttrs ─────────────────────────────────────────────────────────────────

/// Static attributes of one directed link.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkAttrs {
    /// Physical length in metres.
    pub length_m: f64,
    /// Free-flow speed in metres per second.
    pub freespeed_mps: f64,
    /// Flow capacity in vehicles per capacity period (normally per hour).
    pub capacity: f64,
    /// Number of lanes.  Scales storage capacity only.
    pub lanes: f64,
}

impl LinkAttrs {
    pub fn new(length_m: f64, freespeed_mps: f64, capacity: f64, lanes: f64) -> Self {
        Self { length_m, freespeed_mps, capacity, lanes }
    }
}

// ── Network ───────────────────────────────────────────────────────────────────

/// Directed network with CSR adjacency and a spatial index.
///
/// Immutable once built; share it behind an `Arc`.  Fields are `pub` for
/// direct indexed access.  Construct through [`NetworkBuilder`].
pub struct Network {
    // ── Node data ─────────────────────────────────────────────────────────
    pub node_coord: Vec<Coord>,

    pub node_out_start: Vec<u32>,
    pub node_out_links: Vec<LinkId>,
    pub node_in_start:  Vec<u32>,
    pub node_in_links:  Vec<LinkId>,

    // ── Link data (indexed by LinkId) ─────────────────────────────────────
    pub link_from:          Vec<NodeId>,
    pub link_to:            Vec<NodeId>,
    pub link_length_m:      Vec<f64>,
    pub link_freespeed_mps: Vec<f64>,
    /// Vehicles per `capacity_period_secs`.
    pub link_capacity:      Vec<f64>,
    pub link_lanes:         Vec<f64>,

    /// Period that `link_capacity` refers to.  Default: 3600 s.
    pub capacity_period_secs: f64,

    spatial_idx: RTree<NodeEntry>,
}

impl Network {
    /// A network without nodes or links.  Useful for teleport-only runs.
    pub fn empty() -> Self {
        Network {
            node_coord:           Vec::new(),
            node_out_start:       vec![0],
            node_out_links:       Vec::new(),
            node_in_start:        vec![0],
            node_in_links:        Vec::new(),
            link_from:            Vec::new(),
            link_to:              Vec::new(),
            link_length_m:        Vec::new(),
            link_freespeed_mps:   Vec::new(),
            link_capacity:        Vec::new(),
            link_lanes:           Vec::new(),
            capacity_period_secs: 3_600.0,
            spatial_idx:          RTree::new(),
        }
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_coord.len()
    }

    pub fn link_count(&self) -> usize {
        self.link_from.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_coord.is_empty()
    }

    #[inline]
    pub fn contains_link(&self, link: LinkId) -> bool {
        link.index() < self.link_count()
    }

    // ── Adjacency ─────────────────────────────────────────────────────────

    /// Outgoing links of `node`, ascending by `LinkId`.
    #[inline]
    pub fn out_links(&self, node: NodeId) -> &[LinkId] {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        &self.node_out_links[start..end]
    }

    /// Incoming links of `node`, ascending by `LinkId`.
    #[inline]
    pub fn in_links(&self, node: NodeId) -> &[LinkId] {
        let start = self.node_in_start[node.index()] as usize;
        let end   = self.node_in_start[node.index() + 1] as usize;
        &self.node_in_links[start..end]
    }

    /// `true` if leaving `from` leads directly onto `to`.
    #[inline]
    pub fn connects(&self, from: LinkId, to: LinkId) -> bool {
        self.link_to[from.index()] == self.link_from[to.index()]
    }

    // ── Link helpers ──────────────────────────────────────────────────────

    /// Free-flow traversal time of `link` in seconds.
    #[inline]
    pub fn free_flow_secs(&self, link: LinkId) -> f64 {
        self.link_length_m[link.index()] / self.link_freespeed_mps[link.index()]
    }

    /// Flow capacity of `link` in vehicles per second.
    #[inline]
    pub fn capacity_per_sec(&self, link: LinkId) -> f64 {
        self.link_capacity[link.index()] / self.capacity_period_secs
    }

    /// Position of the downstream end of `link`.
    #[inline]
    pub fn link_to_coord(&self, link: LinkId) -> Coord {
        self.node_coord[self.link_to[link.index()].index()]
    }

    /// Check that every link in `links` exists and that consecutive links
    /// share a node.
    pub fn check_route(&self, links: &[LinkId]) -> NetworkResult<()> {
        if links.is_empty() {
            return Err(NetworkError::EmptyRoute);
        }
        if let Some(&bad) = links.iter().find(|l| !self.contains_link(**l)) {
            return Err(NetworkError::LinkNotFound(bad));
        }
        for pair in links.windows(2) {
            if !self.connects(pair[0], pair[1]) {
                return Err(NetworkError::Disconnected { from: pair[0], to: pair[1] });
            }
        }
        Ok(())
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// The node nearest to `pos`, or `None` for an empty network.
    pub fn nearest_node(&self, pos: Coord) -> Option<NodeId> {
        self.spatial_idx
            .nearest_neighbor(&[pos.x, pos.y])
            .map(|e| e.id)
    }

    /// The link nearest to `pos` among those touching its nearest node.
    ///
    /// Ties go to the lower `LinkId`.  Returns `None` if the nearest node
    /// has no links at all.
    pub fn nearest_link(&self, pos: Coord) -> Option<LinkId> {
        let node = self.nearest_node(pos)?;
        self.in_links(node)
            .iter()
            .chain(self.out_links(node))
            .copied()
            .map(|link| {
                let a = self.node_coord[self.link_from[link.index()].index()];
                let b = self.node_coord[self.link_to[link.index()].index()];
                (pos.distance_to_segment(a, b), link)
            })
            .min_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)))
            .map(|(_, link)| link)
    }
}

// ── NetworkBuilder ────────────────────────────────────────────────────────────

/// Construct a [`Network`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use qs_core::Coord;
/// use qs_network::{LinkAttrs, NetworkBuilder};
///
/// let mut b = NetworkBuilder::new();
/// let a = b.add_node(Coord::new(0.0, 0.0));
/// let c = b.add_node(Coord::new(1_000.0, 0.0));
/// b.add_road(a, c, LinkAttrs::new(1_000.0, 13.9, 1_800.0, 1.0));
/// let net = b.build().unwrap();
/// assert_eq!(net.link_count(), 2);
/// ```
pub struct NetworkBuilder {
    nodes:                Vec<Coord>,
    links:                Vec<RawLink>,
    capacity_period_secs: f64,
}

struct RawLink {
    from:  NodeId,
    to:    NodeId,
    attrs: LinkAttrs,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self {
            nodes:                Vec::new(),
            links:                Vec::new(),
            capacity_period_secs: 3_600.0,
        }
    }

    pub fn with_capacity(nodes: usize, links: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            links: Vec::with_capacity(links),
            ..Self::new()
        }
    }

    /// Period the link capacities are expressed in.  Default: 3600 s.
    pub fn capacity_period_secs(mut self, secs: f64) -> Self {
        self.capacity_period_secs = secs;
        self
    }

    /// Add a node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, coord: Coord) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(coord);
        id
    }

    /// Add a **directed** link and return its `LinkId` (sequential from 0).
    pub fn add_link(&mut self, from: NodeId, to: NodeId, attrs: LinkAttrs) -> LinkId {
        let id = LinkId(self.links.len() as u32);
        self.links.push(RawLink { from, to, attrs });
        id
    }

    /// Add a link in each direction with identical attributes.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, attrs: LinkAttrs) -> (LinkId, LinkId) {
        (self.add_link(a, b, attrs), self.add_link(b, a, attrs))
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn link_count(&self) -> usize { self.links.len() }

    /// Validate the input and produce a [`Network`].
    ///
    /// Rejects links that reference unknown nodes or carry non-positive
    /// length, speed, capacity, or lane count.
    pub fn build(self) -> NetworkResult<Network> {
        let node_count = self.nodes.len();

        if !(self.capacity_period_secs.is_finite() && self.capacity_period_secs > 0.0) {
            return Err(NetworkError::InvalidLink {
                link:   LinkId::INVALID,
                reason: format!("capacity period {} s", self.capacity_period_secs),
            });
        }

        for (i, raw) in self.links.iter().enumerate() {
            let link = LinkId(i as u32);
            for node in [raw.from, raw.to] {
                if node.index() >= node_count {
                    return Err(NetworkError::NodeNotFound(node));
                }
            }
            let a = raw.attrs;
            for (what, value) in [
                ("length", a.length_m),
                ("freespeed", a.freespeed_mps),
                ("capacity", a.capacity),
                ("lanes", a.lanes),
            ] {
                if !(value.is_finite() && value > 0.0) {
                    return Err(NetworkError::InvalidLink {
                        link,
                        reason: format!("{what} must be positive, got {value}"),
                    });
                }
            }
        }

        // Links are visited in LinkId order, so each CSR row ends up sorted.
        let (node_out_start, node_out_links) = csr(node_count, &self.links, |l| l.from);
        let (node_in_start, node_in_links)   = csr(node_count, &self.links, |l| l.to);

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, c)| NodeEntry { point: [c.x, c.y], id: NodeId(i as u32) })
            .collect();

        Ok(Network {
            node_coord: self.nodes,
            node_out_start,
            node_out_links,
            node_in_start,
            node_in_links,
            link_from:          self.links.iter().map(|l| l.from).collect(),
            link_to:            self.links.iter().map(|l| l.to).collect(),
            link_length_m:      self.links.iter().map(|l| l.attrs.length_m).collect(),
            link_freespeed_mps: self.links.iter().map(|l| l.attrs.freespeed_mps).collect(),
            link_capacity:      self.links.iter().map(|l| l.attrs.capacity).collect(),
            link_lanes:         self.links.iter().map(|l| l.attrs.lanes).collect(),
            capacity_period_secs: self.capacity_period_secs,
            spatial_idx: RTree::bulk_load(entries),
        })
    }
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build one CSR table keyed by `key(link)`.
fn csr(
    node_count: usize,
    links:      &[RawLink],
    key:        impl Fn(&RawLink) -> NodeId,
) -> (Vec<u32>, Vec<LinkId>) {
    let mut start = vec![0u32; node_count + 1];
    for l in links {
        start[key(l).index() + 1] += 1;
    }
    for i in 1..=node_count {
        start[i] += start[i - 1];
    }

    let mut cursor: Vec<u32> = start[..node_count].to_vec();
    let mut out = vec![LinkId::INVALID; links.len()];
    for (i, l) in links.iter().enumerate() {
        let slot = &mut cursor[key(l).index()];
        out[*slot as usize] = LinkId(i as u32);
        *slot += 1;
    }
    (start, out)
}
