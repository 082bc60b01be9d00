use std::fmt;
use std::sync::Arc;

use crawl_common::CrawlError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::context::StageContext;
use crate::pool::{Pool, Poolable};
use crate::source_sink::{Sink, Source};
use crate::stage::{PayloadRx, PayloadTx, StageRunner};

/// The pipeline's own error: the concatenation of every error observed
/// during one `process` run (§4.3 step 7). `Display` joins messages with
/// `"; "`, matching the reference's `multierr`-style aggregation.
#[derive(Debug)]
pub struct PipelineError {
    pub errors: Vec<CrawlError>,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{joined}")
    }
}

impl std::error::Error for PipelineError {}

fn emit_error(error_tx: &mpsc::Sender<CrawlError>, err: CrawlError) {
    if error_tx.try_send(err).is_err() {
        tracing::warn!("error channel full or closed, dropping diagnostic error");
    }
}

/// Wires a source, an ordered list of stage runners, and a sink into one
/// executable pipeline. A single instance may be `process`-ed repeatedly
/// (the crawl scheduler runs one pass per tick through the same pipeline).
pub struct Pipeline<P: Poolable> {
    stages: Vec<Arc<dyn StageRunner<P>>>,
}

impl<P: Poolable + 'static> Pipeline<P> {
    pub fn new(stages: Vec<Arc<dyn StageRunner<P>>>) -> Self {
        assert!(!stages.is_empty(), "a pipeline needs at least one stage");
        Self { stages }
    }

    /// Runs one source-to-sink pass to completion. Returns `Ok(())` if no
    /// stage, source, or sink ever emitted an error; otherwise the
    /// aggregated `PipelineError` of everything observed before the error
    /// channel drained.
    pub async fn process(
        &self,
        parent_token: &CancellationToken,
        mut source: Box<dyn Source<P>>,
        sink: Arc<dyn Sink<P>>,
        pool: Arc<Pool<P>>,
    ) -> Result<(), PipelineError> {
        let token = parent_token.child_token();
        let n = self.stages.len();

        // N+1 payload channels. Tokio's mpsc requires capacity >= 1; a
        // buffer of exactly one is the closest native approximation of the
        // reference implementation's unbuffered channels — a sender still
        // blocks as soon as one payload is in flight and unconsumed.
        let mut senders: Vec<Option<PayloadTx<P>>> = Vec::with_capacity(n + 1);
        let mut receivers: Vec<Option<PayloadRx<P>>> = Vec::with_capacity(n + 1);
        for _ in 0..=n {
            let (tx, rx) = mpsc::channel::<Box<P>>(1);
            senders.push(Some(tx));
            receivers.push(Some(rx));
        }

        let (error_tx, mut error_rx) = mpsc::channel::<CrawlError>(n + 2);

        let mut handles = Vec::with_capacity(n + 2);

        for (i, stage) in self.stages.iter().enumerate() {
            let stage = Arc::clone(stage);
            let ctx = StageContext::new(token.clone(), i);
            let input = receivers[i].take().expect("stage input taken twice");
            let output = senders[i + 1].take().expect("stage output taken twice");
            let error_tx = error_tx.clone();
            let pool = Arc::clone(&pool);
            handles.push(tokio::spawn(async move {
                stage.run(ctx, input, output, error_tx, pool).await;
            }));
        }

        let source_output = senders[0].take().expect("source output taken twice");
        let source_ctx = StageContext::new(token.clone(), 0);
        let source_error_tx = error_tx.clone();
        handles.push(tokio::spawn(async move {
            source_worker(source.as_mut(), source_output, source_error_tx, source_ctx).await;
        }));

        let sink_input = receivers[n].take().expect("sink input taken twice");
        let sink_ctx = StageContext::new(token.clone(), n + 1);
        let sink_error_tx = error_tx.clone();
        let sink_pool = Arc::clone(&pool);
        handles.push(tokio::spawn(async move {
            sink_worker(sink.as_ref(), sink_input, sink_error_tx, sink_pool, sink_ctx).await;
        }));

        // Drop the executor's own handle on the error sender so the channel
        // can close once every spawned task has dropped its clone.
        drop(error_tx);

        // Drain the error channel concurrently with the running stages —
        // not after they finish. Cancelling on the first observed error
        // must happen while payloads are still in flight (§4.3 step 7,
        // §5's "every runner must observe this within one receive
        // operation"); joining every stage handle first would only notice
        // the error once the whole pipeline had already run to completion
        // on its own.
        let drain_token = token.clone();
        let drain_handle = tokio::spawn(async move {
            let mut errors = Vec::new();
            while let Some(err) = error_rx.recv().await {
                if errors.is_empty() {
                    drain_token.cancel();
                }
                errors.push(err);
            }
            errors
        });

        for handle in handles {
            let _ = handle.await;
        }

        let errors = drain_handle.await.unwrap_or_default();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PipelineError { errors })
        }
    }
}

async fn source_worker<P: Poolable>(
    source: &mut dyn Source<P>,
    output: PayloadTx<P>,
    error_tx: mpsc::Sender<CrawlError>,
    ctx: StageContext,
) {
    while source.next().await {
        let payload = source.payload();
        tokio::select! {
            biased;
            _ = ctx.cancelled() => return,
            res = output.send(payload) => {
                if res.is_err() {
                    return;
                }
            }
        }
    }

    if let Some(err) = source.error() {
        emit_error(&error_tx, err);
    }
}

async fn sink_worker<P: Poolable>(
    sink: &dyn Sink<P>,
    mut input: PayloadRx<P>,
    error_tx: mpsc::Sender<CrawlError>,
    pool: Arc<Pool<P>>,
    ctx: StageContext,
) {
    loop {
        let mut payload = tokio::select! {
            biased;
            _ = ctx.cancelled() => return,
            maybe = input.recv() => match maybe {
                Some(p) => p,
                None => return,
            },
        };

        // `consume` is a suspension point like any other (§5) — race it
        // against cancellation the same way the fetch processor races its
        // HTTP call, so a slow/blocking `Sink` impl can't keep the pipeline
        // from tearing down once cancelled.
        let result = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                pool.release(payload);
                return;
            }
            res = sink.consume(&ctx, &mut payload) => res,
        };
        // Recycled regardless of outcome: the invariant that every payload
        // is recycled exactly once (§8) must hold even on a consume error,
        // which the reference sinkWorker does not guarantee (it skips
        // MarkAsProcessed on the error path).
        pool.release(payload);

        if let Err(err) = result {
            emit_error(&error_tx, err);
            return;
        }
    }
}
