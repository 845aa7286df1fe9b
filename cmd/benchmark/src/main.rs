//! Benchmark suite for the taskrt bootstrap layer
//!
//! Measures the post-binding fast paths with wall-clock timing. For
//! statistical runs use the criterion bench in taskrt-runtime instead.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use taskrt::{allocate, free, is_backend_scalable, line_size, BinarySemaphore, Semaphore};

fn main() {
    println!("=== taskrt Benchmarks ===\n");

    // Bind the allocator backend before timing anything
    println!("backend: {}", if is_backend_scalable() { "scalable" } else { "malloc" });
    println!("line size: {} bytes\n", line_size());

    bench_allocate();
    bench_semaphore_uncontended();
    bench_binary_ping_pong();

    println!("\n=== Benchmarks Complete ===");
}

fn bench_allocate() {
    println!("Benchmark: Aligned allocate/free");
    println!("{}", "─".repeat(40));

    let iterations = 100_000;

    let start = Instant::now();
    for _ in 0..iterations {
        let p = allocate(64, 8).unwrap();
        free(p.as_ptr());
    }
    let elapsed = start.elapsed();

    let per_op = elapsed.as_nanos() as f64 / iterations as f64;
    println!("  Iterations:  {}", iterations);
    println!("  Total time:  {:?}", elapsed);
    println!("  Per cycle:   {:.1} ns", per_op);
    println!("  Rate:        {:.0}/sec\n", iterations as f64 / elapsed.as_secs_f64());
}

fn bench_semaphore_uncontended() {
    println!("Benchmark: Semaphore acquire/release (uncontended)");
    println!("{}", "─".repeat(40));

    let iterations = 1_000_000;
    let sem = Semaphore::new(1);

    let start = Instant::now();
    for _ in 0..iterations {
        sem.acquire();
        sem.release();
    }
    let elapsed = start.elapsed();

    let per_op = elapsed.as_nanos() as f64 / iterations as f64;
    println!("  Iterations:  {}", iterations);
    println!("  Total time:  {:?}", elapsed);
    println!("  Per cycle:   {:.1} ns", per_op);
    println!("  Rate:        {:.0}/sec\n", iterations as f64 / elapsed.as_secs_f64());
}

fn bench_binary_ping_pong() {
    println!("Benchmark: BinarySemaphore ping-pong (2 threads)");
    println!("{}", "─".repeat(40));

    let iterations = 50_000;
    let ping = Arc::new(BinarySemaphore::new());
    let pong = Arc::new(BinarySemaphore::new());

    let ping2 = Arc::clone(&ping);
    let pong2 = Arc::clone(&pong);
    let handle = thread::spawn(move || {
        for _ in 0..iterations {
            ping2.acquire();
            pong2.release();
        }
    });

    let start = Instant::now();
    for _ in 0..iterations {
        ping.release();
        pong.acquire();
    }
    let elapsed = start.elapsed();
    handle.join().unwrap();

    let per_rt = elapsed.as_nanos() as f64 / iterations as f64;
    println!("  Round trips: {}", iterations);
    println!("  Total time:  {:?}", elapsed);
    println!("  Per trip:    {:.1} ns", per_rt);
    println!("  Rate:        {:.0}/sec", iterations as f64 / elapsed.as_secs_f64());
}
