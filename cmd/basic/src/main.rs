//! Basic taskrt example
//!
//! Exercises the bootstrap layer end to end: cache-aligned allocation,
//! semaphore handoff between threads, and a provider handshake against
//! a demo threading backend.
//!
//! # Environment Variables
//!
//! - `TRT_FLUSH_EPRINT=1` - Flush debug output immediately
//! - `TRT_LOG_LEVEL=debug` - Set log level (off, error, warn, info, debug, trace)
//! - `TRT_LINE_SIZE=256` - Override the padded-allocation line size

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use taskrt::{
    allocate, free, is_backend_scalable, kinfo, line_size, register_provider, BinarySemaphore,
    FactoryStatus, RtResult, RuntimeClient, RuntimeFactory, RuntimeProvider, RuntimeServer,
    Semaphore, ServerInfo,
};

// TRT_LOG_LEVEL=debug cargo run -p taskrt-basic

/// Demo threading backend: speaks protocol version 2, counts the
/// servers it has created.
struct DemoProvider {
    servers_made: AtomicUsize,
}

struct DemoServer {
    version: u32,
}

impl RuntimeServer for DemoServer {
    fn version(&self) -> u32 {
        self.version
    }
}

struct DemoClient;

impl RuntimeClient for DemoClient {
    fn max_job_count(&self) -> usize {
        thread::available_parallelism().map_or(1, |n| n.get())
    }

    fn min_stack_size(&self) -> usize {
        64 * 1024
    }
}

impl RuntimeProvider for DemoProvider {
    fn flavor(&self) -> &'static str {
        "demo"
    }

    fn open(&self, client_version: u32) -> Result<u32, FactoryStatus> {
        if client_version < 1 {
            return Err(FactoryStatus::IncompatibleVersion);
        }
        Ok(2u32.min(client_version))
    }

    fn close(&self) {
        kinfo!("demo provider released");
    }

    fn make_server(
        &self,
        client: Arc<dyn RuntimeClient>,
    ) -> Result<Box<dyn RuntimeServer>, FactoryStatus> {
        self.servers_made.fetch_add(1, Ordering::SeqCst);
        kinfo!("making server for {} jobs", client.max_job_count());
        Ok(Box::new(DemoServer { version: 2 }))
    }

    fn call_with_server_info(&self, callback: &mut dyn FnMut(&ServerInfo)) {
        callback(&ServerInfo {
            flavor: self.flavor(),
            server_version: 2,
            description: format!(
                "demo backend, {} server(s) created",
                self.servers_made.load(Ordering::SeqCst)
            ),
        });
    }
}

fn main() -> RtResult<()> {
    println!("=== taskrt Basic Example ===\n");

    // Aligned allocation: backend binds itself on this first call
    let block = allocate(1024, 8)?;
    println!(
        "allocated 8 KiB at {:p}, aligned to {} bytes, scalable backend: {}",
        block.as_ptr(),
        line_size(),
        is_backend_scalable()
    );
    free(block.as_ptr());

    // Semaphore: bound 8 threads to 2 concurrent slots
    let permits = Arc::new(Semaphore::new(2));
    let peak = Arc::new(AtomicUsize::new(0));
    let active = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];

    for _ in 0..8 {
        let permits = Arc::clone(&permits);
        let peak = Arc::clone(&peak);
        let active = Arc::clone(&active);
        handles.push(thread::spawn(move || {
            permits.acquire();
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(std::time::Duration::from_millis(10));
            active.fetch_sub(1, Ordering::SeqCst);
            permits.release();
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
    println!(
        "8 threads through 2 permits, peak concurrency: {}",
        peak.load(Ordering::SeqCst)
    );

    // Binary semaphore: handoff with coalesced signals
    let signal = Arc::new(BinarySemaphore::new());
    signal.release();
    signal.release(); // coalesces with the first
    signal.acquire();
    println!("binary semaphore: two releases coalesced into one signal");

    // Provider handshake
    register_provider(Arc::new(DemoProvider {
        servers_made: AtomicUsize::new(0),
    }));

    let mut factory = RuntimeFactory::new("demo");
    factory.open().into_result()?;
    println!("factory open, negotiated server version {}", factory.server_version());

    let server = factory
        .make_server(Arc::new(DemoClient))
        .expect("demo provider never rejects");
    println!("server speaks version {}", server.version());

    factory.call_with_server_info(&mut |info| {
        println!("server info: [{}] {}", info.flavor, info.description);
    });

    factory.close();
    println!("\n=== Done ===");
    Ok(())
}
