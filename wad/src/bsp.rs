use super::errors::{ErrorKind, Result};
use super::gl::{Child, Leaf, Node, Seg, SpatialIndex};
use super::level::LevelMap;
use failchain::bail;
use math::Pnt2f;

/// Receives the tree in depth-first, front-before-back order.
pub trait BspVisitor {
    fn visit_node(&mut self, _index: usize, _node: &Node) -> Result<()> {
        // Default impl is empty to allow visitors to mix and match.
        Ok(())
    }

    fn visit_leaf(&mut self, _index: usize, _leaf: &Leaf) -> Result<()> {
        // Default impl is empty to allow visitors to mix and match.
        Ok(())
    }
}

impl SpatialIndex {
    /// The leaf containing `point`.
    ///
    /// Points on a partition line go to the back child. Returns `None` if the walk reaches a node
    /// or leaf index outside its table, or loops.
    pub fn locate_leaf(&self, point: Pnt2f) -> Option<usize> {
        let mut child = self.root();
        for _ in 0..=self.nodes.len() {
            match child {
                Child::Leaf(index) => {
                    return if index < self.leaves.len() {
                        Some(index)
                    } else {
                        None
                    };
                }
                Child::Node(index) => {
                    let node = self.nodes.get(index)?;
                    child = if node.partition.is_in_front(point) {
                        node.front
                    } else {
                        node.back
                    };
                }
            }
        }
        None
    }

    /// The sector a leaf belongs to: the side of the first seg that lies along a linedef.
    ///
    /// `Ok(None)` if all of the leaf's segs are minisegs.
    pub fn leaf_sector(&self, level: &LevelMap, leaf: usize) -> Result<Option<usize>> {
        match self.leaf_segs(leaf)?.iter().find(|seg| seg.linedef.is_some()) {
            Some(seg) => seg_sector(level, seg).map(Some),
            None => Ok(None),
        }
    }

    /// The sector containing `point`, found through `locate_leaf`.
    pub fn locate_region(&self, level: &LevelMap, point: Pnt2f) -> Option<usize> {
        self.locate_leaf(point)
            .and_then(|leaf| self.leaf_sector(level, leaf).ok())
            .and_then(|sector| sector)
    }

    /// Visits every node and leaf reachable from the root.
    pub fn walk<V: BspVisitor>(&self, visitor: &mut V) -> Result<()> {
        let mut stack = vec![self.root()];
        let mut num_nodes_visited = 0;
        while let Some(child) = stack.pop() {
            match child {
                Child::Leaf(index) => visitor.visit_leaf(index, self.leaf(index)?)?,
                Child::Node(index) => {
                    num_nodes_visited += 1;
                    if num_nodes_visited > self.nodes.len() {
                        bail!(ErrorKind::OutOfRange(
                            "BSP tree contains a cycle".to_owned()
                        ));
                    }
                    let node = self.node(index)?;
                    visitor.visit_node(index, node)?;
                    stack.push(node.back);
                    stack.push(node.front);
                }
            }
        }
        Ok(())
    }

    pub fn leaves_in_order(&self) -> Result<Vec<usize>> {
        struct Collect(Vec<usize>);
        impl BspVisitor for Collect {
            fn visit_leaf(&mut self, index: usize, _leaf: &Leaf) -> Result<()> {
                self.0.push(index);
                Ok(())
            }
        }
        let mut collect = Collect(Vec::with_capacity(self.leaves.len()));
        self.walk(&mut collect)?;
        Ok(collect.0)
    }
}

/// The sector on the side of `seg`'s linedef that the seg runs along.
///
/// Falls back to the front side when a back seg's linedef has no back sidedef.
pub fn seg_sector(level: &LevelMap, seg: &Seg) -> Result<usize> {
    let linedef_index = match seg.linedef {
        Some(index) => index,
        None => bail!(ErrorKind::OutOfRange("miniseg has no sector".to_owned())),
    };
    let linedef = level.linedef(linedef_index)?;
    let side = match (seg.is_back, linedef.back, linedef.front) {
        (true, Some(back), _) => back,
        (_, _, Some(front)) => front,
        (_, Some(back), None) => back,
        (_, None, None) => bail!(ErrorKind::OutOfRange(format!(
            "linedef {} has no sidedefs",
            linedef_index
        ))),
    };
    Ok(level.sidedef(side)?.sector)
}

#[cfg(test)]
mod test {
    use super::super::gl::{Child, Leaf, Node, Seg, SpatialIndex, VertexRef};
    use super::super::level::{BoundingBox, FlatRef, LevelMap, Linedef, Sector, Sidedef};
    use super::super::name::WadName;
    use super::super::types::LINEDEF_TWO_SIDED;
    use super::{BspVisitor, Result};
    use math::{vec2, Line2f, Pnt2f};

    fn leaf(first_seg: usize) -> Leaf {
        Leaf {
            first_seg,
            num_segs: 1,
        }
    }

    fn seg(linedef: Option<usize>, is_back: bool) -> Seg {
        Seg {
            start: VertexRef::Level(0),
            end: VertexRef::Level(1),
            linedef,
            is_back,
            partner: None,
        }
    }

    // Root splits along x = 0 (pointing +Y); the front (x > 0) is leaf 0. The back is split
    // again along y = 0 (pointing +X): front (y < 0) is leaf 1, back is leaf 2.
    fn two_level_index() -> SpatialIndex {
        SpatialIndex {
            vertices: Vec::new(),
            segs: vec![seg(Some(0), false), seg(None, false), seg(Some(0), true)],
            leaves: vec![leaf(0), leaf(1), leaf(2)],
            nodes: vec![
                Node {
                    partition: Line2f::from_origin_and_displace(
                        Pnt2f::new(0.0, 0.0),
                        vec2(64.0, 0.0),
                    ),
                    front: Child::Leaf(1),
                    back: Child::Leaf(2),
                },
                Node {
                    partition: Line2f::from_origin_and_displace(
                        Pnt2f::new(0.0, 0.0),
                        vec2(0.0, 64.0),
                    ),
                    front: Child::Leaf(0),
                    back: Child::Node(0),
                },
            ],
        }
    }

    fn two_sector_level() -> LevelMap {
        let sector = Sector {
            floor: 0.0,
            ceiling: 128.0,
            floor_flat: FlatRef::None,
            ceiling_flat: FlatRef::None,
            light: 1.0,
        };
        let side = |sector| Sidedef {
            offset: vec2(0.0, 0.0),
            upper: None,
            lower: None,
            middle: None,
            sector,
        };
        LevelMap {
            name: WadName::default(),
            vertices: vec![Pnt2f::new(0.0, 0.0), Pnt2f::new(0.0, 64.0)],
            linedefs: vec![Linedef {
                start: 0,
                end: 1,
                flags: LINEDEF_TWO_SIDED,
                front: Some(0),
                back: Some(1),
            }],
            sidedefs: vec![side(0), side(1)],
            sectors: vec![sector, sector],
            things: Vec::new(),
            bounds: BoundingBox {
                min: Pnt2f::new(0.0, 0.0),
                max: Pnt2f::new(0.0, 64.0),
            },
        }
    }

    #[test]
    fn locate_leaf_follows_cross_product() {
        let index = two_level_index();
        assert_eq!(index.locate_leaf(Pnt2f::new(10.0, 5.0)), Some(0));
        assert_eq!(index.locate_leaf(Pnt2f::new(-10.0, -5.0)), Some(1));
        assert_eq!(index.locate_leaf(Pnt2f::new(-10.0, 5.0)), Some(2));
    }

    #[test]
    fn points_on_partition_go_back() {
        let index = two_level_index();
        // On the root line: back, then on the second line: back again.
        for _ in 0..3 {
            assert_eq!(index.locate_leaf(Pnt2f::new(0.0, 0.0)), Some(2));
            assert_eq!(index.locate_leaf(Pnt2f::new(0.0, -7.0)), Some(1));
        }
    }

    #[test]
    fn malformed_trees_are_not_found() {
        let mut index = two_level_index();
        index.nodes[1].front = Child::Leaf(9);
        assert_eq!(index.locate_leaf(Pnt2f::new(10.0, 5.0)), None);
        index.nodes[1].front = Child::Node(9);
        assert_eq!(index.locate_leaf(Pnt2f::new(10.0, 5.0)), None);
        // A cycle: the back child points at the root.
        index.nodes[0].back = Child::Node(1);
        assert_eq!(index.locate_leaf(Pnt2f::new(-10.0, 5.0)), None);
        assert!(index.walk(&mut ()).unwrap_err().kind().is_out_of_range());
    }

    impl BspVisitor for () {}

    #[test]
    fn walk_is_front_then_back() {
        let index = two_level_index();
        assert_eq!(index.leaves_in_order().unwrap(), vec![0, 1, 2]);

        struct Nodes(Vec<usize>);
        impl BspVisitor for Nodes {
            fn visit_node(&mut self, index: usize, _node: &Node) -> Result<()> {
                self.0.push(index);
                Ok(())
            }
        }
        let mut nodes = Nodes(Vec::new());
        index.walk(&mut nodes).unwrap();
        assert_eq!(nodes.0, vec![1, 0]);
    }

    #[test]
    fn single_leaf_tree() {
        let index = SpatialIndex {
            vertices: Vec::new(),
            segs: vec![seg(Some(0), false)],
            leaves: vec![leaf(0)],
            nodes: Vec::new(),
        };
        assert_eq!(index.locate_leaf(Pnt2f::new(1e6, -1e6)), Some(0));
        assert_eq!(index.leaves_in_order().unwrap(), vec![0]);
    }

    #[test]
    fn leaf_sector_uses_seg_side() {
        let index = two_level_index();
        let level = two_sector_level();
        assert_eq!(index.leaf_sector(&level, 0).unwrap(), Some(0));
        assert_eq!(index.leaf_sector(&level, 1).unwrap(), None);
        assert_eq!(index.leaf_sector(&level, 2).unwrap(), Some(1));
        assert_eq!(index.locate_region(&level, Pnt2f::new(-10.0, 5.0)), Some(1));
        assert_eq!(index.locate_region(&level, Pnt2f::new(-10.0, -5.0)), None);
    }
}
