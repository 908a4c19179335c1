use substreams_ethereum::pb::eth::v2::{Block, TransactionTraceStatus};
use tracing::{debug, info, warn};

use crate::{
    error::{IndexerError, StoreResult},
    events::{decode_log, EventMeta, EventPosition, StreamEvent},
    handlers::{HandlerContext, HandlerOutcome},
    identity::{to_key, SchemaPolicy},
    params::Params,
    registry::DynamicSourceRegistry,
    schema::Entity,
    store::{BlockBatch, EntityScan, EntityStore},
};

/// Counts and writes of one committed batch of events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockSummary {
    pub block_number: u64,
    pub events: usize,
    pub created: usize,
    pub replaced: usize,
    pub duplicates: usize,
    pub missing_references: usize,
    /// Entities written in this batch, in write order.
    pub writes: Vec<Entity>,
}

impl BlockSummary {
    fn new(block_number: u64) -> Self {
        Self { block_number, ..Default::default() }
    }

    fn record(&mut self, outcome: HandlerOutcome) {
        self.events += 1;
        match outcome {
            HandlerOutcome::Created => self.created += 1,
            HandlerOutcome::Replaced => self.replaced += 1,
            HandlerOutcome::Duplicate => self.duplicates += 1,
            HandlerOutcome::MissingReference => self.missing_references += 1,
        }
    }
}

/// Projects an ordered event log into the entity store.
///
/// One call to [`Indexer::process_block`] is one store transaction: either every write of the
/// block is committed or none is, and sources registered during a failed block are forgotten.
pub struct Indexer<S: EntityStore> {
    store: S,
    registry: DynamicSourceRegistry,
    policy: SchemaPolicy,
    last_position: Option<EventPosition>,
}

impl<S: EntityStore> Indexer<S> {
    pub fn new(store: S, registry: DynamicSourceRegistry, policy: SchemaPolicy) -> Self {
        Self { store, registry, policy, last_position: None }
    }

    pub fn from_params(store: S, params: &Params) -> Self {
        Self::new(
            store,
            DynamicSourceRegistry::with_factories(params.factories.iter().cloned()),
            params.policy(),
        )
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &DynamicSourceRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &SchemaPolicy {
        &self.policy
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Watches again every contract discovered by a previous run over the same store.
    pub fn recover(&mut self) -> StoreResult<usize>
    where
        S: EntityScan,
    {
        let recovered = self
            .registry
            .recover(&self.store, &self.policy)?;
        info!(recovered, "recovered dynamic sources");
        Ok(recovered)
    }

    /// Handles every log of the block's successful transactions in chain order.
    ///
    /// A contract registered by an earlier log of the block is already watched for the later
    /// ones, so an organization deployed and used in the same block is fully indexed.
    pub fn process_block(&mut self, block: &Block) -> Result<BlockSummary, IndexerError> {
        if block.header.is_none() {
            return Err(IndexerError::MissingHeader(block.number));
        }

        let snapshot = self.registry.clone();
        let result = self.apply_block(block, block_timestamp(block));
        match &result {
            Ok(summary) => {
                if summary.events > 0 {
                    info!(
                        block = block.number,
                        events = summary.events,
                        created = summary.created,
                        skipped = summary.missing_references,
                        "indexed block"
                    );
                }
            }
            Err(err) => {
                warn!(block = block.number, %err, "block rolled back");
                self.registry = snapshot;
            }
        }
        result
    }

    fn apply_block(
        &mut self,
        block: &Block,
        block_timestamp: u64,
    ) -> Result<BlockSummary, IndexerError> {
        let mut summary = BlockSummary::new(block.number);
        let mut last_position = self.last_position;
        let mut batch = BlockBatch::new(&mut self.store);
        let mut ctx =
            HandlerContext { store: &mut batch, registry: &mut self.registry, policy: &self.policy };

        for tx in block
            .transaction_traces
            .iter()
            .filter(|tx| tx.status == TransactionTraceStatus::Succeeded as i32)
        {
            let receipt = tx
                .receipt
                .as_ref()
                .ok_or_else(|| IndexerError::MissingReceipt(to_key(&tx.hash)))?;

            for log in receipt.logs.iter() {
                let Some(kind) = ctx.registry.kind_of(&log.address) else {
                    continue;
                };
                let Some(event) = decode_log(kind, log) else {
                    debug!(%kind, log_index = log.block_index, "log not handled");
                    continue;
                };

                let meta = EventMeta {
                    contract: log.address.clone(),
                    tx_hash: tx.hash.clone(),
                    tx_index: tx.index,
                    log_index: log.block_index,
                    block_number: block.number,
                    block_timestamp,
                };
                check_order(&mut last_position, meta.position());
                let outcome = ctx.handle(&meta, event)?;
                summary.record(outcome);
            }
        }

        summary.writes = batch.commit()?;
        self.last_position = last_position;
        Ok(summary)
    }

    /// Handles already decoded events as one batch, sorted into chain order first.
    pub fn process_events(
        &mut self,
        mut events: Vec<(EventMeta, StreamEvent)>,
    ) -> Result<BlockSummary, IndexerError> {
        events.sort_by_key(|(meta, _)| meta.position());

        let snapshot = self.registry.clone();
        let result = self.apply_events(events);
        if result.is_err() {
            self.registry = snapshot;
        }
        result
    }

    fn apply_events(
        &mut self,
        events: Vec<(EventMeta, StreamEvent)>,
    ) -> Result<BlockSummary, IndexerError> {
        let block_number = events
            .last()
            .map(|(meta, _)| meta.block_number)
            .unwrap_or_default();
        let mut summary = BlockSummary::new(block_number);
        let mut last_position = self.last_position;
        let mut batch = BlockBatch::new(&mut self.store);
        let mut ctx =
            HandlerContext { store: &mut batch, registry: &mut self.registry, policy: &self.policy };

        for (meta, event) in events {
            check_order(&mut last_position, meta.position());
            let outcome = ctx.handle(&meta, event)?;
            summary.record(outcome);
        }

        summary.writes = batch.commit()?;
        self.last_position = last_position;
        Ok(summary)
    }
}

/// Header timestamp in seconds. A missing or pre-epoch timestamp reads as zero.
pub(crate) fn block_timestamp(block: &Block) -> u64 {
    block
        .header
        .as_ref()
        .and_then(|header| header.timestamp.as_ref())
        .and_then(|ts| u64::try_from(ts.seconds).ok())
        .unwrap_or_default()
}

/// Replays are expected after a restart, so going backwards is only reported.
fn check_order(last: &mut Option<EventPosition>, position: EventPosition) {
    if let Some(previous) = last {
        if position <= *previous {
            warn!(?previous, ?position, "event delivered out of chain order");
            return;
        }
    }
    *last = Some(position);
}
