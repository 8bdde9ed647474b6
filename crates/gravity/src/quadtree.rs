//! Arena-based Barnes-Hut quadtree.
//!
//! Nodes live contiguously in a `Vec` and reference their children by
//! [`NodeId`]. The tree never owns bodies: leaves store the index of a body
//! in the slice the tree was built from.
//!
//! A tree is built in two phases:
//!
//! - **Insertion** ([`TreeBuilder`]): bodies are inserted one by one. A leaf
//!   receiving a second body either reports a collision (when enabled and the
//!   two bodies touch) or splits into four empty quadrants. At
//!   [`MAX_DEPTH`] a leaf stops splitting and becomes a bucket holding every
//!   body that reaches it.
//! - **Aggregation** ([`TreeBuilder::finish`]): total mass and center of mass
//!   are computed bottom-up, once. The resulting [`QuadTree`] is immutable.
//!
//! # Example
//!
//! ```rust
//! use gravity::body::Body;
//! use gravity::quadtree::{Probe, QuadTree, Square};
//!
//! let bodies = vec![
//!     Body::from_arrays([0.0, 0.0], [0.0, 0.0], 1e16),
//!     Body::from_arrays([200.0, 0.0], [0.0, 57.8], 1e12),
//!     Body::from_arrays([-150.0, 80.0], [0.0, 0.0], 1e12),
//! ];
//!
//! let square = Square::enclosing(&bodies, 50.0).unwrap();
//! let (tree, collisions) = QuadTree::build(&bodies, square, true).unwrap();
//! assert!(collisions.is_empty());
//!
//! // Everything except body 1 itself, as seen from body 1
//! let virtual_bodies = tree.virtual_bodies(&Probe::body(1, bodies[1].position), 0.0);
//! assert_eq!(virtual_bodies.len(), 2);
//! ```

use nalgebra::{Point2, Vector2};
use serde::Serialize;

use crate::collisions::CollisionGroups;
use crate::error::TreeError;

/// Deepest level a split may reach. A square of width `w` is `w / 2^64` wide
/// at this depth, far below `f64` resolution for any realistic extent.
/// Bodies still sharing a leaf here are kept together in a bucket.
pub const MAX_DEPTH: usize = 64;

/// Anything with a position and a mass can be organised in the tree.
///
/// `radius` is only consulted for collision checks during insertion.
pub trait Massive {
    fn position(&self) -> Point2<f64>;

    fn mass(&self) -> f64;

    fn radius(&self) -> f64 {
        0.0
    }
}

/// Axis-aligned square region: bottom-left `origin` and side `width`.
///
/// Containment is closed on the lower bounds and open on the upper ones.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Square {
    pub origin: Point2<f64>,
    pub width: f64,
}

impl Square {
    pub fn new(origin: Point2<f64>, width: f64) -> Self {
        Self { origin, width }
    }

    /// Smallest whole-unit square covering all bodies, padded by `margin`.
    ///
    /// The square is sized to the larger of the x and y extents and the
    /// smaller axis is centred in it. The origin is floored to a whole unit,
    /// so any `margin` above 2 keeps every body strictly inside.
    ///
    /// Returns `None` when there are no bodies.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gravity::body::Body;
    /// use gravity::quadtree::Square;
    ///
    /// let bodies = vec![
    ///     Body::from_arrays([-10.0, 0.0], [0.0, 0.0], 1.0),
    ///     Body::from_arrays([10.0, 4.0], [0.0, 0.0], 1.0),
    /// ];
    ///
    /// let square = Square::enclosing(&bodies, 50.0).unwrap();
    /// assert_eq!(square.width, 70.0);
    /// assert!(bodies.iter().all(|b| square.contains(&b.position)));
    /// ```
    pub fn enclosing<B: Massive>(bodies: &[B], margin: f64) -> Option<Self> {
        if bodies.is_empty() {
            return None;
        }

        let (min, max) = bodies.iter().fold(
            (
                Point2::new(f64::INFINITY, f64::INFINITY),
                Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            ),
            |(min, max), body| {
                let pos = body.position();
                (
                    Point2::new(min.x.min(pos.x), min.y.min(pos.y)),
                    Point2::new(max.x.max(pos.x), max.y.max(pos.y)),
                )
            },
        );

        let delta_x = (max.x - min.x).abs();
        let delta_y = (max.y - min.y).abs();
        let extent = delta_x.max(delta_y);

        let origin = Point2::new(
            (min.x - (extent - delta_x) / 2.0).floor() - 0.5 * margin,
            (min.y - (extent - delta_y) / 2.0).floor() - 0.5 * margin,
        );

        Some(Self {
            origin,
            width: extent.ceil() + margin,
        })
    }

    pub fn contains(&self, point: &Point2<f64>) -> bool {
        point.x >= self.origin.x
            && point.x < self.origin.x + self.width
            && point.y >= self.origin.y
            && point.y < self.origin.y + self.width
    }

    pub fn center(&self) -> Point2<f64> {
        self.origin + Vector2::new(self.width, self.width) / 2.0
    }

    /// Quadrant (0-3) a point falls into.
    ///
    /// ```text
    /// +-------+-------+
    /// |   2   |   3   |
    /// +-------+-------+
    /// |   0   |   1   |
    /// +-------+-------+
    /// origin
    /// ```
    ///
    /// Points outside the square are clamped to the nearest quadrant.
    pub fn quadrant(&self, point: &Point2<f64>) -> usize {
        let center = self.center();
        let x_bit = (point.x >= center.x) as usize;
        let y_bit = (point.y >= center.y) as usize;
        x_bit | (y_bit << 1)
    }

    /// Sub-square for the given quadrant (0-3)
    pub fn child(&self, quadrant: usize) -> Self {
        let half = self.width / 2.0;
        let offset = Vector2::new(
            if quadrant & 1 != 0 { half } else { 0.0 },
            if quadrant & 2 != 0 { half } else { 0.0 },
        );
        Self {
            origin: self.origin + offset,
            width: half,
        }
    }
}

/// Index into the node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    fn new(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize, "NodeId overflow");
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a node holds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeState {
    /// No body, no children
    Empty,

    /// Exactly one body (index into the slice the tree was built from)
    Leaf { body: u32 },

    /// Two or more bodies the tree could not separate within [`MAX_DEPTH`]
    /// levels. `bucket` indexes the tree's bucket list.
    Bucket { bucket: u32 },

    /// Four same-size quadrants: [bottom-left, bottom-right, top-left, top-right]
    Internal { children: [NodeId; 4] },
}

/// A node in the arena: its square, its state and the aggregates computed
/// when the tree was finished.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub square: Square,
    pub state: NodeState,
    total_mass: f64,
    center_of_mass: Option<Point2<f64>>,
}

impl Node {
    fn empty(square: Square) -> Self {
        Self {
            square,
            state: NodeState::Empty,
            total_mass: 0.0,
            center_of_mass: None,
        }
    }

    /// Sum of the masses in this subtree; 0 for an empty node
    pub fn total_mass(&self) -> f64 {
        self.total_mass
    }

    /// Mass-weighted centroid of this subtree; `None` for an empty node
    pub fn center_of_mass(&self) -> Option<Point2<f64>> {
        self.center_of_mass
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.state, NodeState::Empty)
    }

    /// Body index held by a leaf
    pub fn body(&self) -> Option<usize> {
        match self.state {
            NodeState::Leaf { body } => Some(body as usize),
            _ => None,
        }
    }
}

/// Insertion phase of a tree build.
///
/// Borrows the body slice for the duration of the build; the finished
/// [`QuadTree`] keeps only indices into it.
pub struct TreeBuilder<'a, B: Massive> {
    nodes: Vec<Node>,
    buckets: Vec<Vec<u32>>,
    bodies: &'a [B],
    collisions: bool,
}

impl<'a, B: Massive> TreeBuilder<'a, B> {
    /// Starts a tree covering `square` with a single empty root.
    pub fn new(bodies: &'a [B], square: Square, collisions: bool) -> Self {
        let mut nodes = Vec::with_capacity(bodies.len() * 2 + 1);
        nodes.push(Node::empty(square));
        Self {
            nodes,
            buckets: Vec::new(),
            bodies,
            collisions,
        }
    }

    /// Inserts `bodies[index]`.
    ///
    /// Returns `Some(survivor)` when collisions are enabled and the body
    /// touches a body already resident in the leaf it reached. The body is
    /// then *not* placed in the tree; the caller merges it into `survivor`.
    ///
    /// A leaf reached at [`MAX_DEPTH`] is not split further: the body joins
    /// it as a bucket member instead.
    pub fn insert(&mut self, index: usize) -> Option<usize> {
        let position = self.bodies[index].position();
        let mut node = NodeId::ROOT;
        let mut depth = 0;

        loop {
            match self.nodes[node.index()].state {
                NodeState::Empty => {
                    self.nodes[node.index()].state = NodeState::Leaf { body: index as u32 };
                    return None;
                }

                NodeState::Leaf { body } => {
                    let resident = body as usize;
                    if self.collisions && self.touching(index, resident) {
                        return Some(resident);
                    }
                    if depth >= MAX_DEPTH {
                        let bucket = self.buckets.len() as u32;
                        self.buckets.push(vec![body, index as u32]);
                        self.nodes[node.index()].state = NodeState::Bucket { bucket };
                        return None;
                    }

                    // The resident moves down into a fresh, empty quadrant;
                    // the loop then routes the new body from this node again.
                    let children = self.split(node);
                    let square = self.nodes[node.index()].square;
                    let quadrant = square.quadrant(&self.bodies[resident].position());
                    self.nodes[children[quadrant].index()].state = NodeState::Leaf { body };
                }

                NodeState::Bucket { bucket } => {
                    let members = &self.buckets[bucket as usize];
                    if self.collisions
                        && let Some(&resident) =
                            members.iter().find(|&&m| self.touching(index, m as usize))
                    {
                        return Some(resident as usize);
                    }
                    self.buckets[bucket as usize].push(index as u32);
                    return None;
                }

                NodeState::Internal { children } => {
                    let quadrant = self.nodes[node.index()].square.quadrant(&position);
                    node = children[quadrant];
                    depth += 1;
                }
            }
        }
    }

    fn touching(&self, a: usize, b: usize) -> bool {
        let (a, b) = (&self.bodies[a], &self.bodies[b]);
        (a.position() - b.position()).magnitude() <= a.radius() + b.radius()
    }

    fn split(&mut self, node: NodeId) -> [NodeId; 4] {
        let square = self.nodes[node.index()].square;
        let first = self.nodes.len();
        self.nodes
            .extend((0..4).map(|q| Node::empty(square.child(q))));

        let children: [NodeId; 4] = std::array::from_fn(|q| NodeId::new(first + q));
        self.nodes[node.index()].state = NodeState::Internal { children };
        children
    }

    /// Computes the aggregates bottom-up and freezes the tree.
    ///
    /// Children are always pushed after their parent, so walking the arena
    /// backwards visits every child before its parent.
    pub fn finish(mut self) -> Result<QuadTree, TreeError> {
        for i in (0..self.nodes.len()).rev() {
            let (total_mass, center_of_mass) = match self.nodes[i].state {
                NodeState::Empty => (0.0, None),

                NodeState::Leaf { body } => {
                    let body = &self.bodies[body as usize];
                    (body.mass(), Some(body.position()))
                }

                NodeState::Bucket { bucket } => {
                    let (mass, weighted) = self.buckets[bucket as usize]
                        .iter()
                        .map(|&m| &self.bodies[m as usize])
                        .fold((0.0f64, Vector2::zeros()), |(mass, weighted), b| {
                            (mass + b.mass(), weighted + b.position().coords * b.mass())
                        });
                    (mass, Some(Point2::from(weighted / mass)))
                }

                NodeState::Internal { children } => {
                    let (mass, weighted, occupied) = children
                        .iter()
                        .map(|c| &self.nodes[c.index()])
                        .filter_map(|c| c.center_of_mass.map(|com| (c.total_mass, com)))
                        .fold(
                            (0.0f64, Vector2::zeros(), 0usize),
                            |(mass, weighted, occupied), (m, com)| {
                                (mass + m, weighted + com.coords * m, occupied + 1)
                            },
                        );

                    if occupied == 0 {
                        return Err(TreeError::MissingCenterOfMass { node: i });
                    }
                    (mass, Some(Point2::from(weighted / mass)))
                }
            };

            if center_of_mass.is_some() && !(total_mass > 0.0 && total_mass.is_finite()) {
                return Err(TreeError::DegenerateMass {
                    node: i,
                    mass: total_mass,
                });
            }

            let node = &mut self.nodes[i];
            node.total_mass = total_mass;
            node.center_of_mass = center_of_mass;
        }

        let bodies = self.bodies;
        let buckets = self
            .buckets
            .into_iter()
            .map(|members| {
                members
                    .into_iter()
                    .map(|m| BucketMember {
                        body: m,
                        position: bodies[m as usize].position(),
                        mass: bodies[m as usize].mass(),
                    })
                    .collect()
            })
            .collect();

        Ok(QuadTree {
            nodes: self.nodes,
            buckets,
        })
    }
}

/// Where a Barnes-Hut query is evaluated from, and which leaf to ignore.
///
/// For a body living in the tree `skip` is its own index. For a detached
/// copy (trajectory projection) it is the index of the body it was copied
/// from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Probe {
    pub position: Point2<f64>,
    pub skip: Option<usize>,
}

impl Probe {
    pub fn body(index: usize, position: Point2<f64>) -> Self {
        Self {
            position,
            skip: Some(index),
        }
    }

    pub fn free(position: Point2<f64>) -> Self {
        Self {
            position,
            skip: None,
        }
    }
}

/// A single body or an aggregated subtree, as seen from a probe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VirtualBody {
    pub position: Point2<f64>,
    pub mass: f64,
    pub distance: f64,
}

/// A body held in a bucket, copied out of the body slice when the tree is
/// finished.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BucketMember {
    pub body: u32,
    pub position: Point2<f64>,
    pub mass: f64,
}

/// A finished, immutable quadtree.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadTree {
    nodes: Vec<Node>,
    buckets: Vec<Vec<BucketMember>>,
}

impl QuadTree {
    /// Builds a tree over all `bodies`, in slice order.
    ///
    /// Bodies absorbed during insertion are recorded in the returned
    /// [`CollisionGroups`] and are absent from the tree.
    pub fn build<B: Massive>(
        bodies: &[B],
        square: Square,
        collisions: bool,
    ) -> Result<(Self, CollisionGroups), TreeError> {
        let mut builder = TreeBuilder::new(bodies, square, collisions);
        let mut groups = CollisionGroups::default();

        for index in 0..bodies.len() {
            if let Some(survivor) = builder.insert(index) {
                groups.record(survivor, index);
            }
        }

        let tree = builder.finish()?;
        tracing::trace!(
            bodies = bodies.len(),
            nodes = tree.node_count(),
            absorbed = groups.absorbed_count(),
            "built quadtree"
        );
        Ok((tree, groups))
    }

    pub fn root(&self) -> &Node {
        &self.nodes[NodeId::ROOT.index()]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Occupied terminal nodes, buckets included
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.state, NodeState::Leaf { .. } | NodeState::Bucket { .. }))
            .count()
    }

    /// Bodies held by a bucket node; empty for any other node
    pub fn bucket(&self, id: NodeId) -> &[BucketMember] {
        match self.nodes[id.index()].state {
            NodeState::Bucket { bucket } => &self.buckets[bucket as usize],
            _ => &[],
        }
    }

    /// Number of levels below the root
    pub fn depth(&self) -> usize {
        self.depth_from(NodeId::ROOT)
    }

    fn depth_from(&self, id: NodeId) -> usize {
        match self.nodes[id.index()].state {
            NodeState::Internal { children } => {
                1 + children
                    .iter()
                    .map(|&c| self.depth_from(c))
                    .max()
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    pub fn square(&self) -> Square {
        self.root().square
    }

    pub fn total_mass(&self) -> f64 {
        self.root().total_mass
    }

    pub fn center_of_mass(&self) -> Option<Point2<f64>> {
        self.root().center_of_mass
    }

    /// Walks from the root by quadrant containment and returns the first
    /// node that is not internal.
    pub fn locate(&self, position: &Point2<f64>) -> NodeId {
        let mut id = NodeId::ROOT;
        while let NodeState::Internal { children } = self.nodes[id.index()].state {
            id = children[self.nodes[id.index()].square.quadrant(position)];
        }
        id
    }

    /// Collects the virtual bodies acting on `probe`.
    ///
    /// A child whose `width / distance` is at least `theta` is opened and its
    /// children examined; otherwise it is taken as a single virtual body at
    /// its center of mass. `theta = 0` opens everything and yields every
    /// other body individually.
    ///
    /// A bucket is also opened whenever it holds the probe's own body; its
    /// members are then yielded one by one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gravity::body::Body;
    /// use gravity::quadtree::{Probe, QuadTree, Square};
    ///
    /// let bodies: Vec<Body> = (0..8)
    ///     .map(|i| Body::from_arrays([i as f64 * 10.0, (i % 3) as f64 * 7.0], [0.0, 0.0], 1e9))
    ///     .collect();
    ///
    /// let square = Square::enclosing(&bodies, 50.0).unwrap();
    /// let (tree, _) = QuadTree::build(&bodies, square, false).unwrap();
    ///
    /// let probe = Probe::body(0, bodies[0].position);
    /// let exact = tree.virtual_bodies(&probe, 0.0);
    /// let coarse = tree.virtual_bodies(&probe, 2.0);
    /// assert_eq!(exact.len(), 7);
    /// assert!(coarse.len() <= exact.len());
    /// ```
    pub fn virtual_bodies(&self, probe: &Probe, theta: f64) -> Vec<VirtualBody> {
        let mut result = Vec::new();
        let root = self.root();

        match root.state {
            NodeState::Empty => {}

            NodeState::Leaf { body } => {
                if probe.skip != Some(body as usize) {
                    result.push(Self::as_virtual(root, probe));
                }
            }

            NodeState::Bucket { .. } => {
                self.collect_bucket(NodeId::ROOT, probe, &mut result);
            }

            NodeState::Internal { children } => {
                self.collect_recursive(children, probe, theta, &mut result);
            }
        }

        result
    }

    fn collect_recursive(
        &self,
        children: [NodeId; 4],
        probe: &Probe,
        theta: f64,
        result: &mut Vec<VirtualBody>,
    ) {
        for child in children {
            let node = &self.nodes[child.index()];
            let Some(center_of_mass) = node.center_of_mass else {
                continue;
            };
            if probe.skip.is_some() && node.body() == probe.skip {
                continue;
            }

            let distance = (center_of_mass - probe.position).magnitude();
            let local_theta = node.square.width / distance;

            match node.state {
                NodeState::Internal { children } if local_theta >= theta => {
                    self.collect_recursive(children, probe, theta, result);
                }
                NodeState::Bucket { .. }
                    if local_theta >= theta || self.bucket_holds(child, probe.skip) =>
                {
                    self.collect_bucket(child, probe, result);
                }
                _ => result.push(VirtualBody {
                    position: center_of_mass,
                    mass: node.total_mass,
                    distance,
                }),
            }
        }
    }

    /// Every bucket member except the probe's own body, one by one
    fn collect_bucket(&self, id: NodeId, probe: &Probe, result: &mut Vec<VirtualBody>) {
        for member in self.bucket(id) {
            if probe.skip == Some(member.body as usize) {
                continue;
            }
            result.push(VirtualBody {
                position: member.position,
                mass: member.mass,
                distance: (member.position - probe.position).magnitude(),
            });
        }
    }

    fn bucket_holds(&self, id: NodeId, body: Option<usize>) -> bool {
        body.is_some_and(|b| self.bucket(id).iter().any(|m| m.body as usize == b))
    }

    fn as_virtual(node: &Node, probe: &Probe) -> VirtualBody {
        let position = node.center_of_mass.unwrap_or(probe.position);
        VirtualBody {
            position,
            mass: node.total_mass,
            distance: (position - probe.position).magnitude(),
        }
    }

    /// Recursive, serialisable copy of the tree for renderers.
    ///
    /// Leaves carry the body index they were built with, buckets all of
    /// theirs.
    pub fn snapshot(&self) -> TreeSnapshot {
        self.snapshot_with(&|index| index as u32)
    }

    /// Like [`QuadTree::snapshot`], labelling leaves with `label(index)`.
    pub fn snapshot_with(&self, label: &dyn Fn(usize) -> u32) -> TreeSnapshot {
        self.snapshot_recursive(NodeId::ROOT, label)
    }

    fn snapshot_recursive(&self, id: NodeId, label: &dyn Fn(usize) -> u32) -> TreeSnapshot {
        let node = &self.nodes[id.index()];
        let mut bodies = Vec::new();
        let (state, body, children) = match node.state {
            NodeState::Empty => (NodeKind::Empty, None, Vec::new()),
            NodeState::Leaf { body } => (NodeKind::Leaf, Some(label(body as usize)), Vec::new()),
            NodeState::Bucket { .. } => {
                bodies = self
                    .bucket(id)
                    .iter()
                    .map(|m| label(m.body as usize))
                    .collect();
                (NodeKind::Bucket, None, Vec::new())
            }
            NodeState::Internal { children } => (
                NodeKind::Internal,
                None,
                children
                    .iter()
                    .map(|&c| self.snapshot_recursive(c, label))
                    .collect(),
            ),
        };

        TreeSnapshot {
            origin: [node.square.origin.x, node.square.origin.y],
            width: node.square.width,
            state,
            body,
            bodies,
            center_of_mass: node.center_of_mass.map(|c| [c.x, c.y]),
            total_mass: node.total_mass,
            children,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Empty,
    Leaf,
    Bucket,
    Internal,
}

/// Tree shape as handed to a renderer
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSnapshot {
    pub origin: [f64; 2],
    pub width: f64,
    pub state: NodeKind,
    /// Body label for leaves
    pub body: Option<u32>,
    /// Body labels for buckets
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bodies: Vec<u32>,
    pub center_of_mass: Option<[f64; 2]>,
    pub total_mass: f64,
    pub children: Vec<TreeSnapshot>,
}
