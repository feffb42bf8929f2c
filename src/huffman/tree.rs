//! Length-limited Huffman tree construction.
//!
//! Depths come from an ordinary Huffman merge over a node arena. When the
//! deepest leaf exceeds the requested limit, every count below a floor is
//! raised to that floor and the tree is rebuilt, doubling the floor each
//! round. Flatter weights give a shallower tree; once the floor passes the
//! largest count all weights are equal and the tree is balanced, with depth
//! `ceil(log2(used))`. That fits any limit with room for the used symbols, so
//! the loop ends after at most `log2(max_count) + 1` rounds.

use crate::error::{try_filled_vec, Result};
use crate::MAX_ALLOWED_CODE_LENGTH;
use std::cmp::Ordering;
use tracing::trace;

/// Arena node: a leaf (`symbol` set) or an internal node (`children` set).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TreeNode {
    weight: u64,
    symbol: Option<usize>,
    /// Pool indices of the two subtrees.
    children: Option<[usize; 2]>,
}

impl TreeNode {
    fn leaf(weight: u64, symbol: usize) -> Self {
        Self {
            weight,
            symbol: Some(symbol),
            children: None,
        }
    }

    fn internal(weight: u64, left: usize, right: usize) -> Self {
        Self {
            weight,
            symbol: None,
            children: Some([left, right]),
        }
    }
}

/// Heavier trees first; equal weights keep the higher symbol first.
fn compare_trees(a: &TreeNode, b: &TreeNode) -> Ordering {
    b.weight
        .cmp(&a.weight)
        .then_with(|| b.symbol.cmp(&a.symbol))
}

/// Node storage for one construction.
///
/// The first `leaves` slots are the frontier: the sorted list of trees still
/// waiting to be merged. The rest is the pool, an append-only store of nodes
/// that were popped from the frontier and are now only referenced as
/// children. A frontier of `n` trees needs at most `2 * (n - 1)` pool slots.
struct TreeArena {
    nodes: Vec<TreeNode>,
    leaves: usize,
}

impl TreeArena {
    fn new(leaves: usize) -> Result<Self> {
        let nodes = try_filled_vec(leaves.saturating_mul(3), TreeNode::default())?;
        Ok(Self { nodes, leaves })
    }

    fn regions(&mut self) -> (&mut [TreeNode], &mut [TreeNode]) {
        self.nodes.split_at_mut(self.leaves)
    }
}

/// Whether the used symbols of `histogram` fit in codes of at most
/// `depth_limit` bits. A `d`-bit code has room for `2^d` leaves.
pub fn fits_depth_limit(histogram: &[u32], depth_limit: u8) -> bool {
    let used = histogram.iter().filter(|&&c| c != 0).count();
    used <= 1usize << depth_limit.min(MAX_ALLOWED_CODE_LENGTH)
}

/// Compute a bit depth per symbol with no depth above `depth_limit`.
///
/// `bit_depths` must be as long as `histogram`. Symbols with a zero count get
/// depth 0. A lone used symbol gets depth 1. If every count is zero all
/// depths are 0 and nothing is allocated.
///
/// # Panics
///
/// Panics if `depth_limit` is outside `1..=MAX_ALLOWED_CODE_LENGTH`, if the
/// lengths differ, or if more than `2^depth_limit` symbols are used.
pub fn generate_bit_depths(
    histogram: &[u32],
    depth_limit: u8,
    bit_depths: &mut [u8],
) -> Result<()> {
    assert!(
        (1..=MAX_ALLOWED_CODE_LENGTH).contains(&depth_limit),
        "depth limit {depth_limit} outside 1..={MAX_ALLOWED_CODE_LENGTH}"
    );
    assert_eq!(
        histogram.len(),
        bit_depths.len(),
        "histogram and bit depth lengths differ"
    );

    bit_depths.fill(0);
    let used = histogram.iter().filter(|&&c| c != 0).count();
    if used == 0 {
        return Ok(());
    }
    assert!(
        used <= 1usize << depth_limit,
        "{used} used symbols cannot fit in {depth_limit}-bit codes"
    );

    let mut arena = TreeArena::new(used)?;
    let mut stack = Vec::new();
    stack
        .try_reserve_exact(used)
        .map_err(|_| crate::Error::allocation::<(TreeNode, usize)>(used))?;

    let mut count_min = 1u64;
    loop {
        let (frontier, pool) = arena.regions();
        fill_leaves(histogram, count_min, frontier);
        frontier.sort_unstable_by(compare_trees);

        if used == 1 {
            // A single-leaf tree still spends one bit per symbol.
            if let Some(symbol) = frontier[0].symbol {
                bit_depths[symbol] = 1;
            }
            return Ok(());
        }

        let root = merge_trees(frontier, pool);
        let max_depth = assign_depths(&root, pool, bit_depths, &mut stack);
        if max_depth <= usize::from(depth_limit) {
            return Ok(());
        }

        trace!(count_min, max_depth, depth_limit, "tree too deep, raising count floor");
        count_min = count_min.saturating_mul(2);
    }
}

/// Build depths into a fresh vector; see [`generate_bit_depths`].
pub fn build_bit_depths(histogram: &[u32], depth_limit: u8) -> Result<Vec<u8>> {
    let mut bit_depths = try_filled_vec(histogram.len(), 0u8)?;
    generate_bit_depths(histogram, depth_limit, &mut bit_depths)?;
    Ok(bit_depths)
}

fn fill_leaves(histogram: &[u32], count_min: u64, frontier: &mut [TreeNode]) {
    let used = histogram
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count != 0);
    for (slot, (symbol, &count)) in frontier.iter_mut().zip(used) {
        *slot = TreeNode::leaf(u64::from(count).max(count_min), symbol);
    }
}

/// Merge the two lightest trees until one remains; returns the root.
///
/// `frontier` is sorted heaviest first, so the two lightest trees sit at its
/// tail. The merged tree goes in front of the first tree that is not heavier
/// than it.
fn merge_trees(frontier: &mut [TreeNode], pool: &mut [TreeNode]) -> TreeNode {
    let mut tree_size = frontier.len();
    let mut pool_size = 0;

    while tree_size > 1 {
        pool[pool_size] = frontier[tree_size - 1];
        pool[pool_size + 1] = frontier[tree_size - 2];
        pool_size += 2;
        tree_size -= 2;

        let weight = pool[pool_size - 1].weight + pool[pool_size - 2].weight;
        let at = frontier[..tree_size]
            .iter()
            .position(|t| t.weight <= weight)
            .unwrap_or(tree_size);
        frontier.copy_within(at..tree_size, at + 1);
        frontier[at] = TreeNode::internal(weight, pool_size - 1, pool_size - 2);
        tree_size += 1;
    }

    frontier[0]
}

/// Walk the tree from `root`, writing leaf depths; returns the deepest one.
///
/// Depths that do not fit in a `u8` are stored saturated; they are far past
/// any legal limit and only ever trigger another round.
fn assign_depths(
    root: &TreeNode,
    pool: &[TreeNode],
    bit_depths: &mut [u8],
    stack: &mut Vec<(TreeNode, usize)>,
) -> usize {
    let mut max_depth = 0;
    stack.clear();
    stack.push((*root, 0));

    while let Some((node, depth)) = stack.pop() {
        match (node.children, node.symbol) {
            (Some([left, right]), _) => {
                stack.push((pool[right], depth + 1));
                stack.push((pool[left], depth + 1));
            }
            (None, Some(symbol)) => {
                bit_depths[symbol] = u8::try_from(depth).unwrap_or(u8::MAX);
                max_depth = max_depth.max(depth);
            }
            (None, None) => unreachable!("arena node without symbol or children"),
        }
    }

    max_depth
}
