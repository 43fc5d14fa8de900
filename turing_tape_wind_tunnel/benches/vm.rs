// Copyright 2026 the Turing Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use turing_tape::asm::Asm;
use turing_tape::trace::{TraceEvent, TraceMask, TraceSink};
use turing_tape::vm::{Limits, Machine};

fn bench_vm(c: &mut Criterion) {
    bench_alternating(c);
    bench_alternating_traced_instr(c);
    bench_rightward_writes(c);
    bench_clone_loop(c);
}

/// The alternating-digit machine: two arms matched per move, one write.
fn alternating_program() -> Vec<u8> {
    let mut a = Asm::new();
    let start = a.label();
    let flip = a.label();

    a.begin_state(start).unwrap();
    a.other().write_val(0x30).final_state(flip);

    a.begin_state(flip).unwrap();
    a.compare_val(0x30).right().write_val(0x31).final_state(flip);
    a.compare_val(0x31).right().write_val(0x30).final_state(flip);
    a.halt();

    a.finish(start).unwrap()
}

/// A machine that strides right and writes on every move, forcing steady tape
/// growth.
fn striding_writer_program(stride: u8) -> Vec<u8> {
    let mut a = Asm::new();
    let start = a.label();
    a.begin_state(start).unwrap();
    a.other()
        .write_val(0x58)
        .right_n(stride)
        .final_state(start);
    a.finish(start).unwrap()
}

/// A machine whose single argument is a `width`-child state tree, deep-cloned
/// on every move.
fn clone_loop_program(width: u8) -> Vec<u8> {
    let mut a = Asm::new();
    let start = a.label();
    let leaf = a.label();
    let looper = a.label();

    a.begin_state(leaf).unwrap();
    a.halt();

    a.begin_state(start).unwrap();
    let arm = a.other();
    for _ in 0..width {
        arm.make_state(0, leaf);
    }
    arm.make_state(width, leaf).final_state(looper);

    a.begin_state(looper).unwrap();
    a.other().clone_arg(0).free_arg(0).final_state(looper);

    a.finish(start).unwrap()
}

fn bench_alternating(c: &mut Criterion) {
    let mut group = c.benchmark_group("alternating");
    let bytes = alternating_program();
    for &moves in &[1_000_u64, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(moves), &moves, |b, &moves| {
            b.iter(|| {
                let mut m = Machine::new(&bytes, &[]).unwrap();
                m.run(&Limits { move_budget: moves }).unwrap();
                black_box(m.tape().head());
            });
        });
    }
    group.finish();
}

#[derive(Default)]
struct CountingInstr {
    instrs: u64,
}

impl TraceSink for CountingInstr {
    fn mask(&self) -> TraceMask {
        TraceMask::INSTR
    }

    fn event(&mut self, event: TraceEvent<'_>) {
        if let TraceEvent::Instr { .. } = event {
            self.instrs += 1;
        }
    }
}

fn bench_alternating_traced_instr(c: &mut Criterion) {
    let mut group = c.benchmark_group("alternating_traced_instr");
    let bytes = alternating_program();
    for &moves in &[1_000_u64, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(moves), &moves, |b, &moves| {
            b.iter(|| {
                let mut m = Machine::new(&bytes, &[]).unwrap();
                let mut sink = CountingInstr::default();
                let mask = sink.mask();
                m.run_traced(&Limits { move_budget: moves }, mask, Some(&mut sink))
                    .unwrap();
                black_box(sink.instrs);
            });
        });
    }
    group.finish();
}

fn bench_rightward_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("rightward_writes");
    for &stride in &[1_u8, 16, 250] {
        let bytes = striding_writer_program(stride);
        group.bench_with_input(
            BenchmarkId::from_parameter(stride),
            &bytes,
            |b, bytes| {
                b.iter(|| {
                    let mut m = Machine::new(bytes, &[]).unwrap();
                    m.run(&Limits { move_budget: 10_000 }).unwrap();
                    black_box(m.tape().len());
                });
            },
        );
    }
    group.finish();
}

fn bench_clone_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("clone_loop");
    for &width in &[1_u8, 8, 64] {
        let bytes = clone_loop_program(width);
        group.bench_with_input(
            BenchmarkId::from_parameter(width),
            &bytes,
            |b, bytes| {
                b.iter(|| {
                    let mut m = Machine::new(bytes, &[]).unwrap();
                    m.run(&Limits { move_budget: 10_000 }).unwrap();
                    black_box(m.address());
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_vm);
criterion_main!(benches);
