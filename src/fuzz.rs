//! Fuzz entrypoints (feature `fuzzing`), driven by `fuzz/fuzz_targets/`.
//!
//! Drives a random sequence of level push/pop operations against
//! [crate::level::LevelLifecycle] and checks the stack-count invariants of
//! §8 hold after every step, the same way the teacher crate's
//! `fuzz_max_nodes_to_store` drives a single randomized parameter through
//! its builder.

use arbitrary::{Arbitrary, Unstructured};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::csr::Csr;
use crate::level::LevelLifecycle;

#[derive(Debug, Arbitrary)]
enum Op {
    Push,
    Pop,
}

/// Replays a random sequence of level pushes/pops derived from `randomness`
/// and asserts the component/levelbase/horizontal/vertical stack counts
/// stay mutually consistent throughout (§8 testable properties).
pub fn fuzz_level_push_pop(randomness: u64) {
    let mut rng = SmallRng::seed_from_u64(randomness);
    let byte_len = 256;
    let bytes: Vec<u8> = (0..byte_len).map(|_| rng.gen()).collect();
    let mut u = Unstructured::new(&bytes);

    let mut lc = LevelLifecycle::new();
    lc.add_root_level();
    let mut depth = 0usize;

    while let Ok(op) = Op::arbitrary(&mut u) {
        match op {
            Op::Push => {
                lc.level_init(8, depth + 1);
                lc.vertical_fill_leaf(depth as crate::primitives::VertexId, &[]).unwrap();
                lc.vertical_close().unwrap();
                lc.horizontal_add(8, depth + 1, &[]).unwrap();
                lc.level_close(Csr::one_node());
                lc.component_init(Csr::one_node());
                depth += 1;
            }
            Op::Pop => {
                if depth == 0 {
                    continue;
                }
                lc.component_remove(false).unwrap();
                lc.level_remove().unwrap();
                depth -= 1;
            }
        }

        assert_eq!(lc.n_component_csrs(), depth + 1);
        assert_eq!(lc.n_levelbase_csrs(), lc.n_horizontal_levels());
    }
}
