use std::sync::Arc;

use async_trait::async_trait;
use crawl_common::CrawlError;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tracing::{debug, warn};

use crate::context::StageContext;
use crate::pool::{Pool, PoolClone, Poolable};
use crate::processor::Processor;

pub type PayloadTx<P> = mpsc::Sender<Box<P>>;
pub type PayloadRx<P> = mpsc::Receiver<Box<P>>;

/// Non-blocking error emission: drop the error if the channel is full. The
/// pipeline already cancels on first error, so anything beyond that is
/// diagnostic, not load-bearing (§4.2).
fn emit_error(error_tx: &mpsc::Sender<CrawlError>, err: CrawlError) {
    if error_tx.try_send(err).is_err() {
        warn!("error channel full or closed, dropping diagnostic error");
    }
}

/// The single contract all stage-runner variants implement: wire an input
/// channel to an output channel via some processor-dispatch strategy,
/// honoring cancellation at every suspension point.
#[async_trait]
pub trait StageRunner<P>: Send + Sync
where
    P: Poolable,
{
    async fn run(
        &self,
        ctx: StageContext,
        input: PayloadRx<P>,
        output: PayloadTx<P>,
        error_tx: mpsc::Sender<CrawlError>,
        pool: Arc<Pool<P>>,
    );
}

/// Sequential (FIFO) stage runner: single consumer, single producer, one
/// processor invocation per payload, payload order preserved.
pub struct Fifo<P> {
    processor: Arc<dyn Processor<P>>,
}

impl<P> Fifo<P> {
    pub fn new(processor: Arc<dyn Processor<P>>) -> Self {
        Self { processor }
    }
}

/// Runs one payload through `processor`, returning:
/// - `Some(true)`  — forward
/// - `Some(false)` — drop, already recycled into `pool`
/// - `None`        — processor errored, emitted to `error_tx`, already
///   recycled into `pool`
async fn drive_one<P: Poolable>(
    ctx: &StageContext,
    processor: &dyn Processor<P>,
    mut payload: Box<P>,
    error_tx: &mpsc::Sender<CrawlError>,
    pool: &Pool<P>,
) -> Option<Box<P>> {
    match processor.process(ctx, &mut payload).await {
        Ok(true) => Some(payload),
        Ok(false) => {
            pool.release(payload);
            None
        }
        Err(e) => {
            // A processor error still recycles its input payload: the
            // universal invariant (§8) requires every payload be recycled
            // exactly once, including the one that triggered cancellation.
            // The reference implementation leaks this particular payload
            // (no MarkAsProcessed on the error path in fifo.Run) — harmless
            // there since the whole process is tearing down, but this
            // implementation closes the gap so the invariant holds exactly.
            pool.release(payload);
            emit_error(error_tx, e);
            None
        }
    }
}

#[async_trait]
impl<P: Poolable> StageRunner<P> for Fifo<P> {
    async fn run(
        &self,
        ctx: StageContext,
        mut input: PayloadRx<P>,
        output: PayloadTx<P>,
        error_tx: mpsc::Sender<CrawlError>,
        pool: Arc<Pool<P>>,
    ) {
        loop {
            let payload = tokio::select! {
                biased;
                _ = ctx.cancelled() => return,
                maybe = input.recv() => match maybe {
                    Some(p) => p,
                    None => return,
                },
            };

            match drive_one(&ctx, self.processor.as_ref(), payload, &error_tx, &pool).await {
                None => continue,
                Some(forwarded) => {
                    tokio::select! {
                        biased;
                        _ = ctx.cancelled() => {
                            pool.release(forwarded);
                            return;
                        }
                        res = output.send(forwarded) => {
                            if res.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Worker pool: N concurrent `Fifo` runners sharing one input and one output
/// channel. The pool exits only once every worker has exited; payload order
/// is not preserved across workers.
pub struct WorkerPool<P> {
    processor: Arc<dyn Processor<P>>,
    workers: usize,
}

impl<P> WorkerPool<P> {
    pub fn new(processor: Arc<dyn Processor<P>>, workers: usize) -> Self {
        assert!(workers > 0, "worker pool requires at least one worker");
        Self { processor, workers }
    }
}

#[async_trait]
impl<P: Poolable> StageRunner<P> for WorkerPool<P> {
    async fn run(
        &self,
        ctx: StageContext,
        input: PayloadRx<P>,
        output: PayloadTx<P>,
        error_tx: mpsc::Sender<CrawlError>,
        pool: Arc<Pool<P>>,
    ) {
        let shared_input = Arc::new(AsyncMutex::new(input));
        let mut handles = Vec::with_capacity(self.workers);

        for _ in 0..self.workers {
            let ctx = ctx.clone();
            let output = output.clone();
            let error_tx = error_tx.clone();
            let pool = Arc::clone(&pool);
            let processor = Arc::clone(&self.processor);
            let shared_input = Arc::clone(&shared_input);

            handles.push(tokio::spawn(async move {
                loop {
                    let payload = {
                        let mut rx = shared_input.lock().await;
                        tokio::select! {
                            biased;
                            _ = ctx.cancelled() => return,
                            maybe = rx.recv() => match maybe {
                                Some(p) => p,
                                None => return,
                            },
                        }
                    };

                    match drive_one(&ctx, processor.as_ref(), payload, &error_tx, &pool).await {
                        None => continue,
                        Some(forwarded) => {
                            tokio::select! {
                                biased;
                                _ = ctx.cancelled() => {
                                    pool.release(forwarded);
                                    return;
                                }
                                res = output.send(forwarded) => {
                                    if res.is_err() {
                                        return;
                                    }
                                }
                            }
                        }
                    }
                }
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }
    }
}

/// Broadcast: fans one input to K leaves, each a sequential runner wrapping
/// its own processor. All leaves merge their outputs onto the shared output
/// channel. The input payload moves (no clone) to leaf 0; leaves 1..K-1 each
/// receive an independent deep clone. Dispatch order is descending (K-1
/// down to 0) so the move happens last, deterministically, without ever
/// holding two owners of the same payload at once.
pub struct Broadcast<P> {
    leaves: Vec<Arc<dyn Processor<P>>>,
}

impl<P> Broadcast<P> {
    pub fn new(leaves: Vec<Arc<dyn Processor<P>>>) -> Self {
        assert!(leaves.len() >= 2, "broadcast requires at least two leaves");
        Self { leaves }
    }
}

#[async_trait]
impl<P: PoolClone> StageRunner<P> for Broadcast<P> {
    async fn run(
        &self,
        ctx: StageContext,
        mut input: PayloadRx<P>,
        output: PayloadTx<P>,
        error_tx: mpsc::Sender<CrawlError>,
        pool: Arc<Pool<P>>,
    ) {
        let k = self.leaves.len();
        let mut leaf_inputs = Vec::with_capacity(k);
        let mut leaf_handles = Vec::with_capacity(k);

        for processor in &self.leaves {
            let (leaf_tx, leaf_rx) = mpsc::channel::<Box<P>>(1);
            leaf_inputs.push(leaf_tx);

            let leaf_fifo = Fifo::new(Arc::clone(processor));
            let ctx = ctx.clone();
            let output = output.clone();
            let error_tx = error_tx.clone();
            let pool = Arc::clone(&pool);

            leaf_handles.push(tokio::spawn(async move {
                leaf_fifo.run(ctx, leaf_rx, output, error_tx, pool).await;
            }));
        }

        'dispatch: loop {
            let original = tokio::select! {
                biased;
                _ = ctx.cancelled() => break 'dispatch,
                maybe = input.recv() => match maybe {
                    Some(p) => p,
                    None => break 'dispatch,
                },
            };

            if !dispatch_to_leaves(&ctx, original, &leaf_inputs, &pool).await {
                debug!("broadcast dispatch interrupted by cancellation");
                break 'dispatch;
            }
        }

        drop(leaf_inputs);
        for handle in leaf_handles {
            let _ = handle.await;
        }
    }
}

/// Sends `original` to every leaf: clones to all but leaf 0, the move to
/// leaf 0, iterating from the last leaf down to the first so the move
/// always happens last. Returns `false` if cancellation interrupted the
/// fan-out partway through, in which case any payload that was already
/// acquired for a not-yet-sent leaf is recycled rather than leaked.
async fn dispatch_to_leaves<P: PoolClone>(
    ctx: &StageContext,
    original: Box<P>,
    leaf_inputs: &[PayloadTx<P>],
    pool: &Pool<P>,
) -> bool {
    let mut original = Some(original);

    for i in (0..leaf_inputs.len()).rev() {
        let payload = if i == 0 {
            original.take().expect("original consumed more than once")
        } else {
            pool.clone_payload(original.as_deref().expect("original dropped early"))
        };

        tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                pool.release(payload);
                if let Some(leftover) = original.take() {
                    pool.release(leftover);
                }
                return false;
            }
            res = leaf_inputs[i].send(payload) => {
                if res.is_err() {
                    if let Some(leftover) = original.take() {
                        pool.release(leftover);
                    }
                    return false;
                }
            }
        }
    }

    true
}
