use crate::tree::TreeNode;

/// 木の集約統計
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeStats {
    /// ノード総数
    pub node_count: u64,
    /// 葉の数
    pub leaf_count: u64,
    /// 最大深さ（根 = 0）
    pub max_depth: u64,
    /// 最大深さに最初に到達したノードの値（先行順）
    pub deepest_value: u64,
    /// 子の最大数
    pub max_branching: usize,
    /// 深さごとのノード数
    pub depth_histogram: Vec<u64>,
}

impl TreeStats {
    /// 木を一度だけ辿って集計する。深い一本鎖でもスタックを使わない。
    pub fn collect(root: &TreeNode) -> Self {
        let mut stats = TreeStats {
            node_count: 0,
            leaf_count: 0,
            max_depth: 0,
            deepest_value: root.value(),
            max_branching: 0,
            depth_histogram: Vec::new(),
        };

        let mut stack: Vec<(&TreeNode, u64)> = vec![(root, 0)];
        while let Some((node, depth)) = stack.pop() {
            stats.node_count += 1;
            if node.is_leaf() {
                stats.leaf_count += 1;
            }
            if depth > stats.max_depth {
                stats.max_depth = depth;
                stats.deepest_value = node.value();
            }
            stats.max_branching = stats.max_branching.max(node.children().len());

            let d = depth as usize;
            if stats.depth_histogram.len() <= d {
                stats.depth_histogram.resize(d + 1, 0);
            }
            stats.depth_histogram[d] += 1;

            stack.extend(node.children().iter().rev().map(|c| (c, depth + 1)));
        }
        stats
    }
}
