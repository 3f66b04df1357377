// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use core::hint::black_box;
use core::pin::pin;
use criterion::{Criterion, criterion_group, criterion_main};
use miniasync::busy_poll;
use miniasync::chain::{Chain, ChainEntry};
use miniasync::entries;
use miniasync::runtime::Runtime;
use miniasync_vdm::{MemcpyContext, MemcpyFlags, Mover, PoolConfig, SyncRunner, ThreadPool};

const LEN: usize = 4096;

fn sync_memcpy_4k(c: &mut Criterion) {
    let runner = SyncRunner::new();
    let mover = Mover::new(&runner);

    let src = vec![0xa5_u8; LEN];
    let mut dst = vec![0_u8; LEN];

    c.bench_function("sync_memcpy_4k", |b| {
        b.iter(|| {
            let mut fut = pin!(unsafe {
                mover.memcpy(dst.as_mut_ptr(), src.as_ptr(), LEN, MemcpyFlags::empty())
            });
            busy_poll(fut.as_mut());
        });
    });
    black_box(&dst);
}

fn sync_chain_4k(c: &mut Criterion) {
    let runner = SyncRunner::new();
    let mover = Mover::new(&runner);

    let src = vec![0xa5_u8; LEN];
    let mut tmp = vec![0_u8; LEN];
    let mut dst = vec![0_u8; LEN];

    c.bench_function("sync_chain_4k", |b| {
        b.iter(|| {
            let mut chain = pin!(Chain::new(
                entries![
                    ChainEntry::new(unsafe {
                        mover.memcpy(tmp.as_mut_ptr(), src.as_ptr(), LEN, MemcpyFlags::empty())
                    })
                    .map(|first: &mut MemcpyContext, second: &mut MemcpyContext| {
                        second.data_mut().src = first.output().dest;
                    }),
                    ChainEntry::new(unsafe {
                        mover.memcpy(dst.as_mut_ptr(), core::ptr::null(), LEN, MemcpyFlags::empty())
                    }),
                ],
                (),
            ));
            busy_poll(chain.as_mut());
        });
    });
    black_box(&dst);
}

fn pool_memcpy_4k(c: &mut Criterion) {
    let pool = ThreadPool::new(PoolConfig::default()).unwrap();
    let mover = Mover::new(&pool);
    let runtime = Runtime::new();

    let src = vec![0xa5_u8; LEN];
    let mut dst = vec![0_u8; LEN];

    c.bench_function("pool_memcpy_4k", |b| {
        b.iter(|| {
            let mut fut = pin!(unsafe {
                mover.memcpy(dst.as_mut_ptr(), src.as_ptr(), LEN, MemcpyFlags::empty())
            });
            runtime.wait(fut.as_mut());
        });
    });
    black_box(&dst);
}

criterion_group!(benches, sync_memcpy_4k, sync_chain_4k, pool_memcpy_4k);
criterion_main!(benches);
