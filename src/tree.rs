use crate::error::TreeError;
use crate::graph::AdjacencyMap;
use crate::layout::Point;

/// 逆コラッツ木の1ノード。
///
/// 子は親が排他的に所有する。width / position はレイアウトの2パスで一度だけ設定される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub(crate) value: u64,
    pub(crate) children: Vec<TreeNode>,
    pub(crate) width: i64,
    pub(crate) position: Point,
}

impl TreeNode {
    /// 未配置のノード
    pub fn new(value: u64, children: Vec<TreeNode>) -> Self {
        TreeNode {
            value,
            children,
            width: 0,
            position: Point::ORIGIN,
        }
    }

    /// 隣接表から value を根とする部分木を構築する。
    /// 子は隣接表の列の順に並ぶ（並べ替えなし）。
    pub fn build(value: u64, map: &AdjacencyMap) -> Result<Self, TreeError> {
        let above = map
            .children(value)
            .ok_or(TreeError::InternalInconsistency { value })?;
        let children = above
            .iter()
            .map(|&v| TreeNode::build(v, map))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TreeNode::new(value, children))
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.value
    }

    #[inline]
    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// 幅パスで計算された部分木の幅
    #[inline]
    pub fn width(&self) -> i64 {
        self.width
    }

    /// 配置パスで計算された座標（根が原点、上方向が負）
    #[inline]
    pub fn position(&self) -> Point {
        self.position
    }

    /// 部分木のノード数
    pub fn subtree_size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// 子孫を先行順で列挙（自身を含む）
    pub fn iter_preorder(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }
}

/// 先行順イテレータ
pub struct PreOrder<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// 隣接表から root_value を根とする木を構築する。
pub fn build_tree(root_value: u64, map: &AdjacencyMap) -> Result<TreeNode, TreeError> {
    TreeNode::build(root_value, map)
}
