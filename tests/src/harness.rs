//! # Test Harness
//!
//! An engine over in-memory storage, an application recording every block,
//! and generator handlers feeding events epoch by epoch.

use parking_lot::Mutex;
use rand::Rng;
use std::sync::{Arc, Once};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hx_01_flushable_kv::{DbProducer, KeyValueStore, MemoryProducer, MemoryStore};
use hx_02_vector_index::VectorIndex;
use hx_04_abft::{AbftConfig, AbftResult, Block, BlockCallbacks, ConsensusCallbacks, Lachesis};
use shared_testkit::{for_each_rand_fork, EventHandler, MemoryEventSource};
use shared_types::{BaseEvent, Crit, Epoch, EventId, Frame, ValidatorId, Validators};

/// Engine type driven by the tests.
pub type TestLachesis = Lachesis<MemoryEventSource, VectorIndex<MemoryEventSource>>;

/// Decides whether the block ends its epoch, returning the next validators.
pub type SealPolicy = Arc<dyn Fn(Epoch, &Block) -> Option<Validators> + Send + Sync>;

static TRACING: Once = Once::new();

/// Installs a test-friendly subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

/// A block as seen by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedBlock {
    pub epoch: Epoch,
    pub frame: Frame,
    pub atropos: EventId,
    pub cheaters: Vec<ValidatorId>,
    /// Confirmed events in application order.
    pub events: Vec<EventId>,
}

/// Application side of the engine: records blocks, optionally seals epochs.
#[derive(Clone, Default)]
pub struct Application {
    blocks: Arc<Mutex<Vec<AppliedBlock>>>,
    epoch: Arc<Mutex<Epoch>>,
    loaded: Arc<Mutex<Vec<Epoch>>>,
    seal: Option<SealPolicy>,
}

impl Application {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sealing(policy: impl Fn(Epoch, &Block) -> Option<Validators> + Send + Sync + 'static) -> Self {
        Self {
            seal: Some(Arc::new(policy)),
            ..Self::default()
        }
    }

    pub fn callbacks(&self) -> ConsensusCallbacks<BaseEvent> {
        let blocks = self.blocks.clone();
        let epoch = self.epoch.clone();
        let seal = self.seal.clone();
        let loaded_epoch = self.epoch.clone();
        let loaded = self.loaded.clone();

        ConsensusCallbacks {
            begin_block: Some(Box::new(move |block: &Block| {
                let current = *epoch.lock();
                blocks.lock().push(AppliedBlock {
                    epoch: current,
                    frame: block.frame,
                    atropos: block.atropos,
                    cheaters: block.cheaters.clone(),
                    events: Vec::new(),
                });
                let applied = blocks.clone();
                let next = seal.as_ref().and_then(|policy| policy(current, block));
                BlockCallbacks {
                    apply_event: Some(Box::new(move |e: &BaseEvent| {
                        if let Some(last) = applied.lock().last_mut() {
                            last.events.push(e.id);
                        }
                    })),
                    end_block: Some(Box::new(move || next)),
                }
            })),
            epoch_db_loaded: Some(Box::new(move |e: Epoch| {
                *loaded_epoch.lock() = e;
                loaded.lock().push(e);
            })),
        }
    }

    pub fn blocks(&self) -> Vec<AppliedBlock> {
        self.blocks.lock().clone()
    }

    pub fn blocks_of(&self, epoch: Epoch) -> Vec<AppliedBlock> {
        self.blocks
            .lock()
            .iter()
            .filter(|b| b.epoch == epoch)
            .cloned()
            .collect()
    }

    /// Epochs whose database got loaded, in order.
    pub fn loaded_epochs(&self) -> Vec<Epoch> {
        self.loaded.lock().clone()
    }
}

/// Engine plus the event source it reads.
pub struct TestNode {
    pub source: MemoryEventSource,
    pub lachesis: TestLachesis,
    pub app: Application,
    /// Events accepted by `process`, in order.
    pub processed: Vec<BaseEvent>,
}

impl TestNode {
    pub fn new(main: Arc<dyn KeyValueStore>, producer: Arc<dyn DbProducer>, app: Application) -> Self {
        Self::with_source(main, producer, MemoryEventSource::new(), app)
    }

    pub fn with_source(
        main: Arc<dyn KeyValueStore>,
        producer: Arc<dyn DbProducer>,
        source: MemoryEventSource,
        app: Application,
    ) -> Self {
        let lachesis = Lachesis::with_vector_index(
            main,
            producer,
            source.clone(),
            AbftConfig::lite(),
            Crit::default(),
        );
        Self {
            source,
            lachesis,
            app,
            processed: Vec::new(),
        }
    }

    pub fn in_memory(app: Application) -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryProducer::new()),
            app,
        )
    }

    /// In-memory node started at `epoch`.
    pub fn genesis(epoch: Epoch, validators: &Validators, app: Application) -> Self {
        let mut node = Self::in_memory(app);
        node.start_from(epoch, validators)
            .unwrap_or_else(|err| panic!("genesis failed: {err}"));
        node
    }

    pub fn start_from(&mut self, epoch: Epoch, validators: &Validators) -> AbftResult<()> {
        let callbacks = self.app.callbacks();
        self.lachesis.start_from(callbacks, epoch, validators.clone())
    }

    pub fn bootstrap(&mut self) -> AbftResult<()> {
        let callbacks = self.app.callbacks();
        self.lachesis.bootstrap(callbacks)
    }

    pub fn epoch(&self) -> Epoch {
        self.lachesis
            .current_epoch()
            .unwrap_or_else(|err| panic!("no epoch: {err}"))
    }

    pub fn last_decided_frame(&self) -> Frame {
        self.lachesis
            .last_decided_frame()
            .unwrap_or_else(|err| panic!("no last decided state: {err}"))
    }

    /// Makes `e` visible to the engine and processes it.
    pub fn feed(&mut self, e: &BaseEvent) -> AbftResult<()> {
        self.source.insert(e.clone());
        self.lachesis.process(e)?;
        self.processed.push(e.clone());
        Ok(())
    }

    /// Generates and processes events of the current epoch until the
    /// generator stops or the epoch is sealed. Returns the processed events.
    pub fn run_epoch<R: Rng>(
        &mut self,
        nodes: &[ValidatorId],
        cheaters: &[ValidatorId],
        events_per_node: usize,
        parent_count: usize,
        forks_count: usize,
        rng: &mut R,
    ) -> Vec<BaseEvent> {
        let mut driver = EpochDriver {
            epoch: self.epoch(),
            node: self,
            processed: Vec::new(),
        };
        for_each_rand_fork(
            nodes,
            cheaters,
            events_per_node,
            parent_count,
            forks_count,
            rng,
            &mut driver,
        );
        debug!(
            epoch = driver.epoch,
            processed = driver.processed.len(),
            "generated epoch events"
        );
        driver.processed
    }
}

/// Generator handler pinned to one epoch.
struct EpochDriver<'a> {
    node: &'a mut TestNode,
    epoch: Epoch,
    processed: Vec<BaseEvent>,
}

impl EventHandler for EpochDriver<'_> {
    fn build(&mut self, e: &mut BaseEvent, _name: &str) -> bool {
        if self.node.epoch() != self.epoch {
            return false;
        }
        e.epoch = self.epoch;
        self.node.lachesis.build(e).is_ok()
    }

    fn process(&mut self, e: &BaseEvent, name: &str) {
        self.node
            .feed(e)
            .unwrap_or_else(|err| panic!("event {name} rejected: {err}"));
        self.processed.push(e.clone());
    }
}
