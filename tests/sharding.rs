use flo_lower::arena::NodeArena;
use flo_lower::config::{CatdPolicy, LoweringConfig};
use flo_lower::node::Node;
use flo_lower::shard::ShardTable;
use quickcheck_macros::quickcheck;
use rstest::rstest;

#[quickcheck]
fn narrow_shard_count_and_widths_are_consistent(width: u32, word: u32) -> bool {
    let width = width % 500 + 1;
    let word = word % 64 + 2;
    let cfg = LoweringConfig::new(word, 256, CatdPolicy::OnChain).unwrap();

    let mut arena = NodeArena::new();
    let mut shards = ShardTable::new();
    let x = arena.insert(Node::wide("x", width, 0, false, false));
    let ns = shards.narrow_shards(&mut arena, x, &cfg).to_vec();

    let expected_k = width.div_ceil(word) as usize;
    let width_sum: u32 = ns.iter().map(|&id| arena.get(id).width()).sum();
    let all_but_last_are_full_word = ns[..ns.len().saturating_sub(1)]
        .iter()
        .all(|&id| arena.get(id).width() == word);

    ns.len() == expected_k && width_sum == width && all_but_last_are_full_word
}

#[quickcheck]
fn narrow_sharding_is_pure(width: u32, word: u32) -> bool {
    let width = width % 500 + 1;
    let word = word % 64 + 2;
    let cfg = LoweringConfig::new(word, 256, CatdPolicy::OnChain).unwrap();

    let mut arena = NodeArena::new();
    let mut shards = ShardTable::new();
    let x = arena.insert(Node::wide("x", width, 0, false, false));
    let first = shards.narrow_shards(&mut arena, x, &cfg).to_vec();
    let second = shards.narrow_shards(&mut arena, x, &cfg).to_vec();
    first == second
}

#[quickcheck]
fn shallow_shard_count_and_depths_are_consistent(depth: u32, max_depth: u32) -> bool {
    let depth = depth % 5000 + 1;
    let max_depth = max_depth % 64 + 2;
    let cfg = LoweringConfig::new(32, max_depth, CatdPolicy::OnChain).unwrap();

    let mut arena = NodeArena::new();
    let mut shards = ShardTable::new();
    let m = arena.insert(Node::narrow("mem", 32, depth, true, false, 32, false).unwrap());
    let ss = shards.shallow_shards(&mut arena, m, &cfg).to_vec();

    let expected_m = depth.div_ceil(max_depth) as usize;
    let depth_sum: u32 = ss.iter().map(|&id| arena.get(id).depth()).sum();
    ss.len() == expected_m && depth_sum == depth
}

#[rstest]
#[case(32, 1)]
#[case(32, 32)]
#[case(32, 33)]
#[case(32, 96)]
fn single_shard_when_width_fits_in_one_word(#[case] word: u32, #[case] width: u32) {
    let cfg = LoweringConfig::new(word, 256, CatdPolicy::OnChain).unwrap();
    let mut arena = NodeArena::new();
    let mut shards = ShardTable::new();
    let x = arena.insert(Node::wide("x", width, 0, false, false));
    let ns = shards.narrow_shards(&mut arena, x, &cfg).to_vec();
    assert_eq!(ns.len(), width.div_ceil(word) as usize);
}

#[test]
fn constant_wider_than_one_word_truncates_to_zero_on_higher_shards() {
    let cfg = LoweringConfig::new(32, 256, CatdPolicy::OnChain).unwrap();
    let mut arena = NodeArena::new();
    let mut shards = ShardTable::new();
    let c = arena.insert(Node::wide("7", 96, 0, false, true));
    let ns = shards.narrow_shards(&mut arena, c, &cfg).to_vec();
    assert_eq!(arena.get(ns[0]).name(), "7");
    for &id in &ns[1..] {
        assert_eq!(arena.get(id).name(), "0");
        assert!(arena.get(id).is_const());
    }
}
