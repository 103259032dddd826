use {
    tech_tree_assets::{NodeDefinition, TreeDefinition},
    tech_tree_events::CursorDirection,
};

/// Depths shown past the first visible one.
pub const VISIBLE_DEPTHS: u32 = 4;
/// Lanes shown past the first visible one.
pub const VISIBLE_LANES: u32 = 2;

/// Cursor over one tree's sparse `(depth, lane)` grid, with a sliding
/// viewport of `[first_visible, first_visible + visible_span]` on both axes.
///
/// Coordinates are 1-based. Moving onto an empty coordinate keeps walking
/// in a per-direction order until a node is found:
///
/// - right: next depth; past the last depth drop one lane down; in the
///   bottom-right corner step back left.
/// - left: previous depth; before the first depth climb one lane up; in the
///   top-left corner step right.
/// - down: next lane; past the last lane step one depth right; in the
///   bottom-right corner climb back up.
/// - up: previous lane; above the first lane step one depth left; in the
///   top-left corner go down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorNavigator {
    pub depth: u32,
    pub lane: u32,
    pub max_depth: u32,
    pub max_lanes: u32,
    pub first_visible_depth: u32,
    pub first_visible_lane: u32,
    pub visible_depths: u32,
    pub visible_lanes: u32,
}

impl CursorNavigator {
    /// Places the cursor on the tree's first listed node with the viewport
    /// starting one step before it. `None` for a tree without nodes.
    pub fn new(tree: &TreeDefinition, visible_depths: u32, visible_lanes: u32) -> Option<Self> {
        let first = tree.nodes.first()?;
        Some(Self {
            depth: first.depth,
            lane: first.lane,
            max_depth: tree.max_depth(),
            max_lanes: tree.max_lanes(),
            first_visible_depth: first.depth.saturating_sub(1).max(1),
            first_visible_lane: first.lane.saturating_sub(1).max(1),
            visible_depths,
            visible_lanes,
        })
    }

    pub fn last_visible_depth(&self) -> u32 {
        self.first_visible_depth + self.visible_depths
    }

    pub fn last_visible_lane(&self) -> u32 {
        self.first_visible_lane + self.visible_lanes
    }

    pub fn is_visible(&self, depth: u32, lane: u32) -> bool {
        (self.first_visible_depth..=self.last_visible_depth()).contains(&depth)
            && (self.first_visible_lane..=self.last_visible_lane()).contains(&lane)
    }

    pub fn selected<'a>(&self, tree: &'a TreeDefinition) -> Option<&'a NodeDefinition> {
        tree.find_node_at(self.depth, self.lane)
    }

    /// Moves one step in `direction`. Returns whether the cursor landed on a
    /// different node; at the grid border or when the walk finds nothing the
    /// cursor stays put.
    pub fn move_cursor(&mut self, tree: &TreeDefinition, direction: CursorDirection) -> bool {
        let Some(start) = self.first_step(direction) else {
            return false;
        };

        // every coordinate of the grid (plus the out-of-range corner steps)
        // can be visited at most once per direction
        let limit = 4 * (self.max_depth as usize + 1) * (self.max_lanes as usize + 1);
        let (mut depth, mut lane, mut direction) = start;
        for _ in 0..limit {
            if tree.find_node_at(depth, lane).is_some() {
                let moved = (depth, lane) != (self.depth, self.lane);
                self.depth = depth;
                self.lane = lane;
                self.ensure_visible();
                return moved;
            }
            (depth, lane, direction) = self.redirect(depth, lane, direction);
        }
        false
    }

    /// Shifts the viewport so the selected coordinate is inside it.
    pub fn ensure_visible(&mut self) {
        if self.lane < self.first_visible_lane {
            self.first_visible_lane = self.lane;
        } else if self.lane > self.last_visible_lane() {
            self.first_visible_lane = self.lane.saturating_sub(self.visible_lanes).max(1);
        }
        if self.depth < self.first_visible_depth {
            self.first_visible_depth = self.depth;
        } else if self.depth > self.last_visible_depth() {
            self.first_visible_depth = self.depth.saturating_sub(self.visible_depths).max(1);
        }
    }

    fn first_step(&self, direction: CursorDirection) -> Option<(u32, u32, CursorDirection)> {
        let (depth, lane) = (self.depth, self.lane);
        match direction {
            CursorDirection::Down if lane < self.max_lanes => Some((depth, lane + 1, direction)),
            CursorDirection::Up if lane > 1 => Some((depth, lane - 1, direction)),
            CursorDirection::Right if depth < self.max_depth => Some((depth + 1, lane, direction)),
            CursorDirection::Left if depth > 1 => Some((depth - 1, lane, direction)),
            _ => None,
        }
    }

    fn redirect(
        &self,
        depth: u32,
        lane: u32,
        direction: CursorDirection,
    ) -> (u32, u32, CursorDirection) {
        use CursorDirection::*;
        let (max_depth, max_lanes) = (self.max_depth, self.max_lanes);
        match direction {
            Right if depth >= max_depth && lane >= max_lanes => (depth.saturating_sub(1), lane, Left),
            Right if depth >= max_depth => (max_depth, lane + 1, Down),
            Right => (depth + 1, lane, Right),
            Left if depth <= 1 && lane <= 1 => (2, 1, Right),
            Left if depth <= 1 => (1, lane - 1, Up),
            Left => (depth - 1, lane, Left),
            Down if depth >= max_depth && lane >= max_lanes => {
                (max_depth, max_lanes.saturating_sub(1), Up)
            }
            Down if lane >= max_lanes => (depth + 1, max_lanes, Right),
            Down => (depth, lane + 1, Down),
            Up if depth <= 1 && lane <= 1 => (1, 2, Down),
            Up if lane <= 1 => (depth.saturating_sub(1), 1, Left),
            Up => (depth, lane - 1, Up),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, tech_tree_assets::NodeDefinition};

    fn grid(cells: &[(u32, u32)]) -> TreeDefinition {
        TreeDefinition {
            uid: "GRID".to_string(),
            nodes: cells
                .iter()
                .map(|&(depth, lane)| NodeDefinition {
                    uid: format!("N{depth}{lane}"),
                    depth,
                    lane,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_right_from_corner_reaches_far_corner() {
        let tree = grid(&[(1, 1), (4, 3)]);
        let mut cursor = CursorNavigator::new(&tree, VISIBLE_DEPTHS, VISIBLE_LANES).unwrap();
        assert_eq!((cursor.max_depth, cursor.max_lanes), (4, 3));

        assert!(cursor.move_cursor(&tree, CursorDirection::Right));
        assert_eq!((cursor.depth, cursor.lane), (4, 3));
        assert_eq!(cursor.selected(&tree).unwrap().uid, "N43");
    }

    #[test]
    fn test_left_walks_back_through_lanes() {
        let tree = grid(&[(4, 3), (1, 1)]);
        let mut cursor = CursorNavigator::new(&tree, VISIBLE_DEPTHS, VISIBLE_LANES).unwrap();
        assert_eq!((cursor.depth, cursor.lane), (4, 3));

        assert!(cursor.move_cursor(&tree, CursorDirection::Left));
        assert_eq!((cursor.depth, cursor.lane), (1, 1));
    }

    #[test]
    fn test_moves_stop_at_the_grid_border() {
        let tree = grid(&[(1, 1), (2, 1)]);
        let mut cursor = CursorNavigator::new(&tree, VISIBLE_DEPTHS, VISIBLE_LANES).unwrap();

        assert!(!cursor.move_cursor(&tree, CursorDirection::Left));
        assert!(!cursor.move_cursor(&tree, CursorDirection::Up));
        assert!(!cursor.move_cursor(&tree, CursorDirection::Down));
        assert_eq!((cursor.depth, cursor.lane), (1, 1));

        assert!(cursor.move_cursor(&tree, CursorDirection::Right));
        assert!(!cursor.move_cursor(&tree, CursorDirection::Right));
        assert_eq!((cursor.depth, cursor.lane), (2, 1));
    }

    #[test]
    fn test_down_steps_right_past_the_last_lane() {
        let tree = grid(&[(1, 1), (1, 2), (3, 3)]);
        let mut cursor = CursorNavigator::new(&tree, VISIBLE_DEPTHS, VISIBLE_LANES).unwrap();

        assert!(cursor.move_cursor(&tree, CursorDirection::Down));
        assert_eq!((cursor.depth, cursor.lane), (1, 2));
        assert!(cursor.move_cursor(&tree, CursorDirection::Down));
        assert_eq!((cursor.depth, cursor.lane), (3, 3));
    }

    #[test]
    fn test_walk_without_other_nodes_terminates() {
        let tree = grid(&[(1, 1), (2, 2)]);
        let mut cursor = CursorNavigator::new(&tree, VISIBLE_DEPTHS, VISIBLE_LANES).unwrap();
        cursor.depth = 2;
        cursor.lane = 2;

        for direction in [
            CursorDirection::Up,
            CursorDirection::Down,
            CursorDirection::Left,
            CursorDirection::Right,
        ] {
            let mut attempt = cursor;
            attempt.move_cursor(&tree, direction);
            assert!(tree.find_node_at(attempt.depth, attempt.lane).is_some());
        }
    }

    #[test]
    fn test_viewport_follows_the_cursor() {
        let cells: Vec<_> = (1..=10).map(|depth| (depth, 1)).collect();
        let tree = grid(&cells);
        let mut cursor = CursorNavigator::new(&tree, 3, 2).unwrap();
        assert_eq!(cursor.first_visible_depth, 1);

        for _ in 0..5 {
            cursor.move_cursor(&tree, CursorDirection::Right);
        }
        assert_eq!(cursor.depth, 6);
        assert_eq!(cursor.first_visible_depth, 3);
        assert!(cursor.is_visible(6, 1));
        assert!(!cursor.is_visible(2, 1));

        for _ in 0..4 {
            cursor.move_cursor(&tree, CursorDirection::Left);
        }
        assert_eq!(cursor.depth, 2);
        assert_eq!(cursor.first_visible_depth, 2);
    }
}
