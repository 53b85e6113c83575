//! Instrumented source used by the unit tests.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    cancel::CancellationToken,
    enumerator::Enumerator,
    error::{Error, Result},
    iter::{AsyncIter, IterLogic, Lifecycle},
    outcome::Outcome,
    sequence::Sequence,
};

/// Counters shared by every enumeration of one [`Probe`].
#[derive(Debug, Default)]
pub struct ProbeStats {
    acquired: AtomicUsize,
    released: AtomicUsize,
    pulled: AtomicUsize,
}

impl ProbeStats {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Items handed out so far.
    pub fn pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }
}

/// A source that counts acquisitions, releases and pulls, and can be told to fail or to hang
/// at a given position.
#[derive(Debug, Clone)]
pub struct Probe<T> {
    items: Arc<Vec<T>>,
    fail_at: Option<usize>,
    hang_at: Option<usize>,
    stats: Arc<ProbeStats>,
}

impl<T> Probe<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: Arc::new(items),
            fail_at: None,
            hang_at: None,
            stats: Arc::default(),
        }
    }

    /// Fails the pull for position `at` instead of producing an item.
    pub fn failing_at(mut self, at: usize) -> Self {
        self.fail_at = Some(at);
        self
    }

    /// Never completes the pull for position `at`.
    pub fn hanging_at(mut self, at: usize) -> Self {
        self.hang_at = Some(at);
        self
    }

    pub fn stats(&self) -> Arc<ProbeStats> {
        Arc::clone(&self.stats)
    }
}

impl<T> Sequence for Probe<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;
    type Enumerator = AsyncIter<ProbeLogic<T>>;

    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator {
        AsyncIter::new(ProbeLogic::new(self.clone()), cancel)
    }
}

pub struct ProbeLogic<T> {
    probe: Probe<T>,
    position: usize,
    held: bool,
}

impl<T> ProbeLogic<T> {
    fn new(probe: Probe<T>) -> Self {
        Self {
            probe,
            position: 0,
            held: false,
        }
    }

    fn let_go(&mut self) {
        if std::mem::take(&mut self.held) {
            self.probe.stats.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl<T> IterLogic for ProbeLogic<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;
    const NAME: &'static str = "probe";

    fn acquire(&mut self, _cancel: &CancellationToken) -> Result<()> {
        self.probe.stats.acquired.fetch_add(1, Ordering::SeqCst);
        self.held = true;
        Ok(())
    }

    async fn step(&mut self, _cancel: &CancellationToken) -> Result<Option<T>> {
        let at = self.position;
        if self.probe.hang_at == Some(at) {
            std::future::pending::<()>().await;
        }
        if self.probe.fail_at == Some(at) {
            return Err(Error::failed(format!("probe failure at position {at}")));
        }
        let Some(item) = self.probe.items.get(at).cloned() else {
            return Ok(None);
        };
        self.position += 1;
        self.probe.stats.pulled.fetch_add(1, Ordering::SeqCst);
        Ok(Some(item))
    }

    async fn release(&mut self) {
        self.let_go();
    }

    fn fresh(&self) -> Self {
        Self::new(self.probe.clone())
    }
}

// Dropping an acquired probe without release counts as releasing it.
impl<T> Drop for ProbeLogic<T> {
    fn drop(&mut self) {
        self.let_go();
    }
}

/// A source whose `release` sleeps before letting go. Only releases that run to completion
/// are counted, and dropping the cursor counts nothing.
#[derive(Debug, Clone)]
pub struct SlowRelease<T> {
    items: Arc<Vec<T>>,
    delay: Duration,
    stats: Arc<ProbeStats>,
}

impl<T> SlowRelease<T> {
    pub fn new(items: Vec<T>, delay: Duration) -> Self {
        Self {
            items: Arc::new(items),
            delay,
            stats: Arc::default(),
        }
    }

    pub fn stats(&self) -> Arc<ProbeStats> {
        Arc::clone(&self.stats)
    }
}

impl<T> Sequence for SlowRelease<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;
    type Enumerator = SlowReleaseCursor<T>;

    fn enumerate(&self, _cancel: CancellationToken) -> Self::Enumerator {
        SlowReleaseCursor {
            source: self.clone(),
            position: 0,
            current: None,
            lifecycle: Lifecycle::Fresh,
        }
    }
}

pub struct SlowReleaseCursor<T> {
    source: SlowRelease<T>,
    position: usize,
    current: Option<T>,
    lifecycle: Lifecycle,
}

#[async_trait]
impl<T> Enumerator for SlowReleaseCursor<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;

    async fn advance(&mut self) -> Result<Outcome> {
        match self.lifecycle {
            Lifecycle::Released => return Ok(Outcome::Exhausted),
            Lifecycle::Fresh => {
                self.source.stats.acquired.fetch_add(1, Ordering::SeqCst);
                self.lifecycle = Lifecycle::Active;
            }
            Lifecycle::Active => {}
        }

        self.current = self.source.items.get(self.position).cloned();
        if self.current.is_none() {
            return Ok(Outcome::Exhausted);
        }
        self.position += 1;
        self.source.stats.pulled.fetch_add(1, Ordering::SeqCst);
        Ok(Outcome::Produced)
    }

    fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    fn take_current(&mut self) -> Option<T> {
        self.current.take()
    }

    async fn release(&mut self) {
        self.current = None;
        if self.lifecycle == Lifecycle::Active {
            tokio::time::sleep(self.source.delay).await;
            self.source.stats.released.fetch_add(1, Ordering::SeqCst);
        }
        self.lifecycle = Lifecycle::Released;
    }
}

/// Installs a test subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
