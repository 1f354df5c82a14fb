use num_integer::Integer;
use num_traits::PrimInt;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::TreeError;

/// コラッツ写像の1ステップ: 偶数なら v/2、奇数なら 3v+1。
/// 3v+1 が型の範囲を超える場合は None。
#[inline]
pub fn collatz_step<T: PrimInt + Integer>(v: T) -> Option<T> {
    let two = T::one() + T::one();
    if v.is_even() {
        Some(v / two)
    } else {
        v.checked_mul(&(two + T::one()))?.checked_add(&T::one())
    }
}

/// 逆コラッツ隣接表。
///
/// キー v に対して step(u) = v となる u の列を発見順に保持する。
/// [1, limit) の全整数と、それらの軌道上で通過した中間値（limit 以上もあり得る）がキーになる。
/// 1 を根とする木構造。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyMap {
    limit: u64,
    nodes: FxHashMap<u64, Vec<u64>>,
}

impl AdjacencyMap {
    /// 構築時の上限 N（排他的）
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// キーの数
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, value: u64) -> bool {
        self.nodes.contains_key(&value)
    }

    /// step(u) = value となる u の列（発見順）
    pub fn children(&self, value: u64) -> Option<&[u64]> {
        self.nodes.get(&value).map(Vec::as_slice)
    }

    /// (キー, 子の列) を任意の順で列挙
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[u64])> + '_ {
        self.nodes.iter().map(|(&k, v)| (k, v.as_slice()))
    }

    /// 昇順に並べたキー
    pub fn sorted_keys(&self) -> Vec<u64> {
        let mut keys: Vec<u64> = self.nodes.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

/// [1, limit) の逆コラッツ隣接表を構築する。
///
/// 各整数を一度だけ解決する（メモ化）。解決は再帰ではなく明示的な経路スタックで行うので、
/// 軌道長に比例した呼び出し深さにならない。
pub fn build_graph(limit: i64) -> Result<AdjacencyMap, TreeError> {
    if limit <= 0 {
        return Err(TreeError::InvalidArgument { limit });
    }
    let limit = limit as u64;

    let mut nodes: FxHashMap<u64, Vec<u64>> = FxHashMap::default();
    // 1 は不動点なので先に登録しておく
    nodes.insert(1, Vec::new());

    let mut path: Vec<u64> = Vec::new();
    for i in 2..limit {
        resolve(&mut nodes, i, &mut path)?;
    }

    debug!(limit, keys = nodes.len(), "adjacency map built");
    Ok(AdjacencyMap { limit, nodes })
}

/// start から既知の値に当たるまで前進し、通過した未知の値を登録する。
/// その後経路を逆順に巻き戻し、各値を後続値の列の末尾に追加する。
fn resolve(
    nodes: &mut FxHashMap<u64, Vec<u64>>,
    start: u64,
    path: &mut Vec<u64>,
) -> Result<(), TreeError> {
    path.clear();
    let mut v = start;
    while !nodes.contains_key(&v) {
        // 前進する前に枠を確保する（処理中の印）
        nodes.insert(v, Vec::new());
        path.push(v);
        v = collatz_step(v).ok_or(TreeError::StepOverflow { value: v })?;
    }

    let mut parent = v;
    for &value in path.iter().rev() {
        nodes
            .get_mut(&parent)
            .ok_or(TreeError::InternalInconsistency { value: parent })?
            .push(value);
        parent = value;
    }
    Ok(())
}
