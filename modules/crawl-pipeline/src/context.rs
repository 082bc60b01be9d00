use tokio_util::sync::CancellationToken;

/// Carried into every stage runner and processor call. Wraps the
/// cooperative-cancellation token that stands in for the reference
/// implementation's `context.Context` + `ctx.Done()` channel-select idiom.
#[derive(Clone)]
pub struct StageContext {
    token: CancellationToken,
    pub stage_index: usize,
}

impl StageContext {
    pub fn new(token: CancellationToken, stage_index: usize) -> Self {
        Self { token, stage_index }
    }

    pub fn cancelled(&self) -> impl std::future::Future<Output = ()> + '_ {
        self.token.cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn with_stage(&self, stage_index: usize) -> Self {
        Self {
            token: self.token.clone(),
            stage_index,
        }
    }
}
