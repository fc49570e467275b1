//! # Lachesis Service
//!
//! The orderer: classifies events into frames, feeds roots to the Atropos
//! election and hands every decided frame to the application.
//!
//! ## Lifecycle
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | [`Lachesis::start_from`] | applies genesis, then bootstraps |
//! | [`Lachesis::bootstrap`] | restores the election from the store |
//! | [`Lachesis::reset`] | starts a clean epoch with the given validators |
//! | [`Lachesis::process`] | indexes an event and advances the election |
//! | [`Lachesis::build`] | stamps `frame` / `is_root` without persisting |
//!
//! None of these are safe for concurrent use; callers serialise them per
//! engine instance and deliver events parents-first.

mod consensus;
mod orderer;

use std::sync::Arc;
use tracing::info;

use hx_01_flushable_kv::{DbProducer, KeyValueStore};
use hx_02_vector_index::VectorIndex;
use hx_03_election::Election;
use shared_types::{Crit, Epoch, EventSource, Frame, TypesError, Validators, FIRST_FRAME};

use crate::config::AbftConfig;
use crate::domain::{ConsensusCallbacks, EpochState, LastDecidedState};
use crate::errors::{AbftError, AbftResult};
use crate::ports::outbound::DagIndexer;
use crate::store::Store;

/// aBFT orderer over an event source `S` and a DAG index `D`.
pub struct Lachesis<S: EventSource, D: DagIndexer> {
    config: AbftConfig,
    store: Store,
    input: S,
    dag_index: D,
    /// `None` until bootstrapped.
    election: Option<Election>,
    callbacks: ConsensusCallbacks<S::Event>,
    crit: Crit,
}

impl<S: EventSource, D: DagIndexer> Lachesis<S, D> {
    pub fn new(
        main: Arc<dyn KeyValueStore>,
        producer: Arc<dyn DbProducer>,
        input: S,
        dag_index: D,
        config: AbftConfig,
        crit: Crit,
    ) -> Self {
        let store = Store::new(main, producer, &config.store, crit.clone());
        Self {
            config,
            store,
            input,
            dag_index,
            election: None,
            callbacks: ConsensusCallbacks::default(),
            crit,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn dag_index(&self) -> &D {
        &self.dag_index
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.election.is_some()
    }

    pub fn last_decided_frame(&self) -> AbftResult<Frame> {
        self.store.get_last_decided_frame()
    }

    pub fn current_epoch(&self) -> AbftResult<Epoch> {
        self.store.get_epoch()
    }

    pub fn validators(&self) -> AbftResult<Validators> {
        self.store.get_validators()
    }

    /// Restores the engine from the store and replays the known roots of
    /// undecided frames.
    pub fn bootstrap(&mut self, callbacks: ConsensusCallbacks<S::Event>) -> AbftResult<()> {
        if self.election.is_some() {
            return Err(AbftError::AlreadyBootstrapped);
        }
        let state = self.store.get_epoch_state()?;
        let last_decided = self.store.get_last_decided_frame()?;
        self.callbacks = callbacks;

        self.store.open_epoch_db(state.epoch)?;
        self.dag_index
            .reset(&state.validators, self.store.epoch_vector_table()?)?;
        self.notify_epoch_db_loaded(state.epoch);
        self.election = Some(Election::new(state.validators.clone(), last_decided + 1));

        info!(
            epoch = state.epoch,
            last_decided,
            validators = state.validators.len(),
            "lachesis bootstrapped"
        );
        self.process_known_roots()
    }

    /// Applies genesis (or an imported starting point) and bootstraps.
    pub fn start_from(
        &mut self,
        callbacks: ConsensusCallbacks<S::Event>,
        epoch: Epoch,
        validators: Validators,
    ) -> AbftResult<()> {
        if self.election.is_some() {
            return Err(AbftError::AlreadyBootstrapped);
        }
        self.store.apply_genesis(epoch, &validators)?;
        self.store.reset_epoch_db(epoch)?;
        self.bootstrap(callbacks)
    }

    /// Drops the current epoch and starts `epoch` from frame 1.
    pub fn reset(&mut self, epoch: Epoch, validators: Validators) -> AbftResult<()> {
        if self.election.is_none() {
            return Err(AbftError::NotBootstrapped);
        }
        if validators.is_empty() {
            return Err(TypesError::EmptyValidators.into());
        }
        self.store.set_epoch_state(EpochState {
            epoch,
            validators: validators.clone(),
        })?;
        self.store
            .set_last_decided_state(LastDecidedState::default())?;
        self.start_epoch(epoch, validators)?;
        info!(epoch, "lachesis reset");
        Ok(())
    }

    /// Fresh epoch database, index and election for `epoch`.
    fn start_epoch(&mut self, epoch: Epoch, validators: Validators) -> AbftResult<()> {
        self.store.reset_epoch_db(epoch)?;
        self.dag_index
            .reset(&validators, self.store.epoch_vector_table()?)?;
        self.notify_epoch_db_loaded(epoch);
        self.election_mut()?.reset(validators, FIRST_FRAME);
        Ok(())
    }

    fn notify_epoch_db_loaded(&mut self, epoch: Epoch) {
        if let Some(loaded) = self.callbacks.epoch_db_loaded.as_mut() {
            loaded(epoch);
        }
    }

    fn election_mut(&mut self) -> AbftResult<&mut Election> {
        self.election.as_mut().ok_or(AbftError::NotBootstrapped)
    }
}

impl<S: EventSource + Clone> Lachesis<S, VectorIndex<S>> {
    /// Orderer over the branch-aware vector index.
    pub fn with_vector_index(
        main: Arc<dyn KeyValueStore>,
        producer: Arc<dyn DbProducer>,
        input: S,
        config: AbftConfig,
        crit: Crit,
    ) -> Self {
        let dag_index = VectorIndex::new(input.clone(), &config.vector_index, crit.clone());
        Self::new(main, producer, input, dag_index, config, crit)
    }
}
