// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use aegis_core::prelude::DayDelta;
use aegis_model::prelude::{GradeIndex, LoadingWindow, Parcel, ParcelIdentifier, VesselConstraints};
use aegis_solver::vessel::groups::enumerate_groups;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;

/// A month of parcels with short, overlapping loading windows.
fn random_parcels(n: usize, seed: u64) -> Vec<Parcel> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let start = rng.random_range(1..28);
            let len = rng.random_range(0..3);
            let window = LoadingWindow::parse(&format!("{}-{} Oct", start, start + len))
                .expect("window ok");
            Parcel::new(
                ParcelIdentifier::new(i as u32 + 1),
                GradeIndex::new(rng.random_range(0..6)),
                rng.random_range(100.0..400.0),
                "Port",
                window,
                DayDelta::new(rng.random_range(1..4)),
            )
        })
        .collect()
}

fn bench_enumerate_groups(c: &mut Criterion) {
    let constraints = VesselConstraints::new(700.0, 650.0, 30);
    let mut group = c.benchmark_group("enumerate_groups");
    for n in [10usize, 25, 50] {
        let parcels = random_parcels(n, 42);
        group.bench_with_input(BenchmarkId::from_parameter(n), &parcels, |b, ps| {
            b.iter(|| black_box(enumerate_groups(black_box(ps), &constraints)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_enumerate_groups);
criterion_main!(benches);
