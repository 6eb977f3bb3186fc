//! Shared helpers: workload generation and lockstep comparison against the
//! reference interpreter.

#![allow(dead_code)]

use arbor_core::Word;
use arbor_kernel::{build_kernel_with, Kernel, KernelConfig};
use arbor_sim::{build_mem_image, Input, Machine, MemLayout, ReferenceRun, Tree};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A generated problem instance.
pub struct Workload {
    pub tree: Tree,
    pub input: Input,
    pub mem: Vec<Word>,
}

impl Workload {
    pub fn generate(forest_height: usize, batch_size: usize, rounds: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let tree = Tree::generate(forest_height, &mut rng).expect("tree height");
        let input = Input::generate(&tree, batch_size, rounds, &mut rng);
        let mem = build_mem_image(&tree, &input);
        Workload { tree, input, mem }
    }

    pub fn build(&self, config: &KernelConfig) -> Kernel {
        build_kernel_with(
            config,
            self.tree.height,
            self.tree.n_nodes(),
            self.input.batch_size(),
            self.input.rounds,
        )
        .expect("kernel build")
    }
}

/// Run `kernel` over `mem`, asserting the index and value regions match the
/// reference at every pause. Returns the machine after the last pause.
pub fn run_checked(kernel: &Kernel, mem: &[Word]) -> Machine {
    let reference = ReferenceRun::new(mem.to_vec()).expect("valid image");
    let layout: MemLayout = *reference.layout();
    let mut machine = Machine::new(
        mem.to_vec(),
        kernel.program.clone(),
        kernel.debug_info.clone(),
    );

    for (pause, expected) in reference.enumerate() {
        machine.run().expect("machine fault");
        for (region, start) in [
            ("indices", layout.inp_indices_p),
            ("values", layout.inp_values_p),
        ] {
            let end = start + layout.batch_size;
            let got = &machine.mem()[start..end];
            let want = &expected[start..end];
            if let Some(lane) = got.iter().zip(want).position(|(g, w)| g != w) {
                panic!(
                    "{} differ at pause {} lane {}: got {} expected {}",
                    region, pause, lane, got[lane], want[lane]
                );
            }
        }
    }
    machine
}

/// Build with `config`, run, check and return the cycle count.
pub fn cycles_for(workload: &Workload, config: &KernelConfig) -> u64 {
    let kernel = workload.build(config);
    run_checked(&kernel, &workload.mem).cycle()
}
