//! 2パスの木レイアウト。
//!
//! 1. 幅パス（後行順）: 各部分木の幅 = max(子の幅の和 + 兄弟間隔, 自身のラベル幅)
//! 2. 配置パス（先行順）: 子を親の真下に中央寄せで並べ、1段ごとに y を負方向へ進める
//!
//! 座標は整数で、除算は 0 方向への切り捨て。同じ入力なら常に同じ座標になる。

use rayon::prelude::*;

use crate::error::TreeError;
use crate::tree::TreeNode;

/// 整数座標。根が原点、木は y の負方向へ伸びる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    #[inline]
    pub const fn new(x: i64, y: i64) -> Self {
        Point { x, y }
    }

    #[inline]
    pub const fn offset(self, dx: i64, dy: i64) -> Self {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// レイアウト定数
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// 1桁あたりのラベル幅 (px)
    pub char_width: i64,
    /// 兄弟部分木の間隔、および段間の余白 (px)
    pub spacing: i64,
    /// ノード1段の高さ (px)
    pub node_height: i64,
    /// 接続線の親側の端をラベルから離す量 (px)
    pub parent_clearance: i64,
    /// 接続線の子側の端をラベルから離す量 (px)
    pub child_clearance: i64,
    /// 幅パスを Rayon で部分木ごとに並列化する
    pub parallel: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            char_width: 8,
            spacing: 10,
            node_height: 20,
            parent_clearance: 15,
            child_clearance: 8,
            parallel: false,
        }
    }
}

impl LayoutOptions {
    /// 長さ系の定数の上限 (px)。これを超えると大きな木で i64 の座標が溢れ得る。
    pub const MAX_LENGTH: i64 = 1_000_000;

    /// 長さ系の定数が範囲内か確かめる。
    /// char_width と node_height は 1 以上、それ以外は 0 以上。
    pub fn validate(&self) -> Result<(), TreeError> {
        let checks = [
            ("char-width", self.char_width, 1),
            ("node-height", self.node_height, 1),
            ("spacing", self.spacing, 0),
            ("parent-clearance", self.parent_clearance, 0),
            ("child-clearance", self.child_clearance, 0),
        ];
        for (name, value, min) in checks {
            if !(min..=Self::MAX_LENGTH).contains(&value) {
                return Err(TreeError::InvalidLayout { name, value });
            }
        }
        Ok(())
    }
}

/// 配置パスで到達した範囲。max_x は最も正の x、min_y は最も負の y。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutExtent {
    pub max_x: i64,
    pub min_y: i64,
}

impl LayoutExtent {
    /// 最初の1点（根）から初期化する
    pub fn at(point: Point) -> Self {
        LayoutExtent {
            max_x: point.x,
            min_y: point.y,
        }
    }

    #[inline]
    pub fn include(&mut self, point: Point) {
        self.max_x = self.max_x.max(point.x);
        self.min_y = self.min_y.min(point.y);
    }
}

/// 10進表記の桁数
#[inline]
pub fn decimal_digits(value: u64) -> i64 {
    value.checked_ilog10().map_or(1, |d| d as i64 + 1)
}

impl TreeNode {
    /// ラベル幅 = 1桁の幅 × 桁数
    #[inline]
    pub fn text_width(&self, options: &LayoutOptions) -> i64 {
        options.char_width * decimal_digits(self.value)
    }

    /// 幅パス（逐次版）。部分木の幅を返す。
    pub fn compute_widths(&mut self, options: &LayoutOptions) -> i64 {
        for child in &mut self.children {
            child.compute_widths(options);
        }
        self.width = self.width_from_children(options);
        self.width
    }

    /// 幅パス（並列版）。兄弟部分木は互いに独立なので Rayon で分割する。
    /// 結果は逐次版と完全に一致する。
    pub fn compute_widths_parallel(&mut self, options: &LayoutOptions) -> i64 {
        match self.children.len() {
            0 => {}
            // 一本鎖では分割しても意味がない
            1 => {
                self.children[0].compute_widths_parallel(options);
            }
            _ => {
                self.children.par_iter_mut().for_each(|child| {
                    child.compute_widths_parallel(options);
                });
            }
        }
        self.width = self.width_from_children(options);
        self.width
    }

    fn width_from_children(&self, options: &LayoutOptions) -> i64 {
        let text_width = self.text_width(options);
        if self.children.is_empty() {
            return text_width;
        }
        let gaps = (self.children.len() as i64 - 1) * options.spacing;
        let sum: i64 = self.children.iter().map(|c| c.width).sum();
        (gaps + sum).max(text_width)
    }

    /// 配置パス。幅パスの後に呼ぶこと。
    /// 自身を at に置き、子を中央寄せで1段上（y の負方向）に並べる。
    pub fn assign_positions(
        &mut self,
        at: Point,
        options: &LayoutOptions,
        extent: &mut LayoutExtent,
    ) {
        self.position = at;
        extent.include(at);

        let child_y = at.y - options.spacing - options.node_height;
        let mut offset_x = -self.width / 2;
        for child in &mut self.children {
            let child_x = at.x + offset_x + child.width / 2;
            offset_x += child.width + options.spacing;
            child.assign_positions(Point::new(child_x, child_y), options, extent);
        }
    }
}

/// 幅パス → 配置パス（根を原点に置く）を実行し、到達範囲を返す。
pub fn layout_tree(root: &mut TreeNode, options: &LayoutOptions) -> LayoutExtent {
    if options.parallel {
        root.compute_widths_parallel(options);
    } else {
        root.compute_widths(options);
    }

    let mut extent = LayoutExtent::at(Point::ORIGIN);
    root.assign_positions(Point::ORIGIN, options, &mut extent);
    extent
}
