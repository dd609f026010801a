use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;
use criterion::Throughput;

use riptide::config::NUM_DIMENSIONS;
use riptide::extent::Extent;
use riptide::prelude::Float;
use riptide::prelude::MVec;
use riptide::simulation_box::SimulationBox;
use riptide::tree::BhTree;
use riptide::tree::LeafData;
use riptide::tree::TreeParameters;

const PARTICLES_PER_AXIS: usize = 32;

fn lattice() -> Vec<LeafData> {
    let spacing = 1.0 / PARTICLES_PER_AXIS as Float;
    let mut particles = vec![];
    let mut index = [0usize; NUM_DIMENSIONS];
    'outer: loop {
        let mut pos = MVec::ZERO;
        for d in 0..NUM_DIMENSIONS {
            pos[d] = (index[d] as Float + 0.5) * spacing;
        }
        particles.push(LeafData {
            id: particles.len(),
            pos,
            mass: 1.0,
        });
        let mut d = 0;
        loop {
            index[d] += 1;
            if index[d] < PARTICLES_PER_AXIS {
                break;
            }
            index[d] = 0;
            d += 1;
            if d == NUM_DIMENSIONS {
                break 'outer;
            }
        }
    }
    particles
}

pub fn neighbor_search_benchmark(c: &mut Criterion) {
    let particles = lattice();
    let extent = Extent::cube_from_side_length(1.0).pad();
    let box_ = SimulationBox::cube_from_side_length(1.0);
    let radius = 3.0 / PARTICLES_PER_AXIS as Float;
    let mut group = c.benchmark_group("neighbor_search");
    group.noise_threshold(0.05);
    group.throughput(Throughput::Elements(particles.len() as u64));
    group.bench_function("build", |b| {
        b.iter(|| BhTree::new(&TreeParameters::default(), particles.clone(), &extent))
    });
    let tree = BhTree::new(&TreeParameters::default(), particles.clone(), &extent);
    group.bench_function("query_all", |b| {
        b.iter(|| {
            for particle in particles.iter() {
                let result = tree.search_neighbors(&box_, particle.pos, radius, 256);
                assert!(!result.is_empty());
            }
        })
    });
    group.finish();
}

criterion_group!(benches, neighbor_search_benchmark);
criterion_main!(benches);
