use flo_lower::arena::NodeArena;
use flo_lower::config::{CatdPolicy, LoweringConfig};
use flo_lower::depth::split_mem;
use flo_lower::node::Node;
use flo_lower::op::{Op, Opcode};
use flo_lower::shard::ShardTable;
use flo_lower::temp::TempPool;

fn depth_legal(arena: &NodeArena, ops: &[Op], max_depth: u32) -> bool {
    ops.iter().all(|op| {
        arena.get(op.dest).depth() <= max_depth
            && op.sources.iter().all(|&s| arena.get(s).depth() <= max_depth)
    })
}

#[test]
fn rd_on_a_memory_four_times_deeper_than_d_builds_a_three_stage_mux_chain() {
    // d(8) = RD t(mem, 8 x 1024), u(addr) with D = 256 — 4 sub-memories,
    // 3 mux stages gated on the bank index.
    let cfg = LoweringConfig::new(32, 256, CatdPolicy::OnChainExceptWr).unwrap();
    let mut arena = NodeArena::new();
    let mut shards = ShardTable::new();
    let mut temps = TempPool::new();

    let mem = arena.insert(Node::narrow("mem", 8, 1024, true, false, 32, false).unwrap());
    let addr = arena.insert(Node::narrow("addr", 10, 0, false, false, 32, false).unwrap());
    let d = arena.insert(Node::narrow("d", 8, 0, false, false, 32, false).unwrap());
    let op = Op::new(Opcode::Rd, d, vec![mem, addr]);

    let lowered = split_mem(&mut arena, &mut shards, &mut temps, &cfg, &op).unwrap();
    assert!(depth_legal(&arena, &lowered, 256));
    assert_eq!(lowered.iter().filter(|o| o.opcode == Opcode::Rd).count(), 4);
    assert_eq!(lowered.iter().filter(|o| o.opcode == Opcode::Mux).count(), 3);
    assert_eq!(lowered.last().unwrap().dest, d);
}

#[test]
fn wr_enables_exactly_one_bank_per_address() {
    let cfg = LoweringConfig::new(32, 256, CatdPolicy::OnChainExceptWr).unwrap();
    let mut arena = NodeArena::new();
    let mut shards = ShardTable::new();
    let mut temps = TempPool::new();

    let mem = arena.insert(Node::narrow("mem", 8, 1024, true, false, 32, false).unwrap());
    let addr = arena.insert(Node::narrow("addr", 10, 0, false, false, 32, false).unwrap());
    let value = arena.insert(Node::narrow("value", 8, 0, false, false, 32, false).unwrap());
    let enable = arena.insert(Node::narrow("en", 1, 0, false, false, 32, false).unwrap());
    let op = Op::new(Opcode::Wr, mem, vec![enable, mem, addr, value]);

    let lowered = split_mem(&mut arena, &mut shards, &mut temps, &cfg, &op).unwrap();
    assert!(depth_legal(&arena, &lowered, 256));
    let wr_count = lowered.iter().filter(|o| o.opcode == Opcode::Wr).count();
    assert_eq!(wr_count, 4);
    // Every WR's enable is itself gated by a per-bank match: one AND per WR.
    assert_eq!(lowered.iter().filter(|o| o.opcode == Opcode::And).count(), wr_count);
}

#[test]
fn memory_already_shallow_enough_is_cloned_without_splitting() {
    let cfg = LoweringConfig::new(32, 256, CatdPolicy::OnChainExceptWr).unwrap();
    let mut arena = NodeArena::new();
    let mut shards = ShardTable::new();
    let mut temps = TempPool::new();

    let mem = arena.insert(Node::narrow("mem", 8, 100, true, false, 32, false).unwrap());
    let addr = arena.insert(Node::narrow("addr", 10, 0, false, false, 32, false).unwrap());
    let d = arena.insert(Node::narrow("d", 8, 0, false, false, 32, false).unwrap());
    let op = Op::new(Opcode::Rd, d, vec![mem, addr]);

    let lowered = split_mem(&mut arena, &mut shards, &mut temps, &cfg, &op).unwrap();
    assert_eq!(lowered.len(), 1);
    assert_eq!(lowered[0].opcode, Opcode::Rd);
}

#[test]
fn depth_illegal_opcode_other_than_rd_or_wr_aborts() {
    let cfg = LoweringConfig::new(32, 256, CatdPolicy::OnChainExceptWr).unwrap();
    let mut arena = NodeArena::new();
    let mut shards = ShardTable::new();
    let mut temps = TempPool::new();

    let mem = arena.insert(Node::narrow("mem", 8, 1024, true, false, 32, false).unwrap());
    let other = arena.insert(Node::narrow("other", 8, 1024, true, false, 32, false).unwrap());
    let op = Op::new(Opcode::Mov, mem, vec![other]);

    assert!(split_mem(&mut arena, &mut shards, &mut temps, &cfg, &op).is_err());
}
