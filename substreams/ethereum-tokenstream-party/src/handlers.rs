//! One handler per contract event.
//!
//! Each handler is a guarded transition: it loads what the event refers to, and only writes when
//! the guard passes. A missing parent entity or an already existing target is a no-op, never an
//! error; the only failures that propagate are store failures.

use tracing::debug;

use crate::{
    error::StoreResult,
    events::{EventMeta, StreamAdded, StreamEvent, Transfer},
    identity::{organization_key, to_key, SchemaPolicy, StreamRef},
    registry::{ContractKind, DynamicSourceRegistry},
    schema::{ActivityKind, Organization, Stream, StreamActivity, User},
    store::EntityStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    Created,
    /// A later event of the same transaction overwrote an activity keyed by transaction hash.
    Replaced,
    /// The target entity already exists, e.g. a replayed event.
    Duplicate,
    /// The organization or stream the event refers to is not indexed.
    MissingReference,
}

pub struct HandlerContext<'a, S: EntityStore> {
    pub store: &'a mut S,
    pub registry: &'a mut DynamicSourceRegistry,
    pub policy: &'a SchemaPolicy,
}

impl<S: EntityStore> HandlerContext<'_, S> {
    pub fn handle(&mut self, meta: &EventMeta, event: StreamEvent) -> StoreResult<HandlerOutcome> {
        let event_name = event.name();
        let outcome = match event {
            StreamEvent::OrganizationDeployed { organization, owner, name } => {
                self.handle_organization_deployed(meta, organization, owner, name)?
            }
            StreamEvent::StreamAdded(added) => self.handle_stream_added(meta, added)?,
            StreamEvent::Withdraw(transfer) => {
                self.handle_transfer(meta, ActivityKind::Withdraw, transfer)?
            }
            StreamEvent::Deposit(transfer) => {
                self.handle_transfer(meta, ActivityKind::Deposit, transfer)?
            }
        };
        debug!(
            event = event_name,
            block = meta.block_number,
            log_index = meta.log_index,
            ?outcome,
            "handled event"
        );
        Ok(outcome)
    }

    pub fn handle_organization_deployed(
        &mut self,
        meta: &EventMeta,
        organization: Vec<u8>,
        owner: Vec<u8>,
        name: String,
    ) -> StoreResult<HandlerOutcome> {
        let id = organization_key(&organization);
        if self
            .store
            .load_typed::<Organization>(&id)?
            .is_some()
        {
            self.rewatch(self.policy.organization_source(), &organization);
            return Ok(HandlerOutcome::Duplicate);
        }

        self.store
            .save_typed(Organization { id, created_at: meta.block_timestamp, owner, name })?;
        self.registry
            .register(self.policy.organization_source(), &organization);

        Ok(HandlerOutcome::Created)
    }

    pub fn handle_stream_added(
        &mut self,
        meta: &EventMeta,
        added: StreamAdded,
    ) -> StoreResult<HandlerOutcome> {
        let organization = organization_key(&meta.contract);
        if self
            .store
            .load_typed::<Organization>(&organization)?
            .is_none()
        {
            debug!(%organization, "stream added to unknown organization");
            return Ok(HandlerOutcome::MissingReference);
        }

        let Some(stream_ref) = self.policy.stream_ref(&added) else {
            return Ok(HandlerOutcome::MissingReference);
        };
        let Some(id) = self
            .policy
            .stream_key(&meta.contract, &stream_ref)
        else {
            return Ok(HandlerOutcome::MissingReference);
        };

        let contract = match stream_ref {
            StreamRef::Contract(address) => Some(address),
            _ => None,
        };
        let stream_source = self.policy.stream_source();

        if self
            .store
            .load_typed::<Stream>(&id)?
            .is_some()
        {
            if let (Some(kind), Some(address)) = (stream_source, contract.as_ref()) {
                self.rewatch(kind, address);
            }
            return Ok(HandlerOutcome::Duplicate);
        }

        if let (Some(kind), Some(address)) = (stream_source, contract.as_ref()) {
            self.registry.register(kind, address);
        }
        if let Some(user) = &added.user {
            self.ensure_user(user, meta.block_timestamp)?;
        }

        self.store.save_typed(Stream {
            id,
            organization,
            user: added.user,
            creator: added.creator,
            contract,
            name: added.name,
            created_at: meta.block_timestamp,
        })?;

        Ok(HandlerOutcome::Created)
    }

    /// Records a withdraw or deposit against the stream it references.
    ///
    /// Streams deployed as their own contracts report the organization through the stream
    /// entity; otherwise the emitting contract is the organization.
    pub fn handle_transfer(
        &mut self,
        meta: &EventMeta,
        kind: ActivityKind,
        transfer: Transfer,
    ) -> StoreResult<HandlerOutcome> {
        let Some(key) = self
            .policy
            .stream_key(&meta.contract, &transfer.stream)
        else {
            debug!(stream = ?transfer.stream, "activity reference does not fit the generation");
            return Ok(HandlerOutcome::MissingReference);
        };
        let Some(stream) = self.store.load_typed::<Stream>(&key)? else {
            debug!(stream = %key, "activity for unknown stream");
            return Ok(HandlerOutcome::MissingReference);
        };

        let id = self
            .policy
            .activity_key(&meta.tx_hash, meta.log_index);
        let outcome = match self.store.load_typed::<StreamActivity>(&id)? {
            Some(stored)
                if self
                    .policy
                    .activity_keys
                    .replaces(stored.log_index, meta.log_index) =>
            {
                debug!(%id, stored = stored.log_index, log_index = meta.log_index, "activity superseded");
                HandlerOutcome::Replaced
            }
            Some(_) => return Ok(HandlerOutcome::Duplicate),
            None => HandlerOutcome::Created,
        };

        let user = match kind {
            ActivityKind::Withdraw => Some(to_key(&transfer.counterparty)),
            ActivityKind::Deposit => stream.user.as_deref().map(to_key),
        };

        self.store.save_typed(StreamActivity {
            id,
            kind,
            amount: transfer.amount,
            organization: stream.organization,
            stream: Some(stream.id),
            user,
            actor: transfer.counterparty,
            info: transfer.reason,
            tx_hash: meta.tx_hash.clone(),
            log_index: meta.log_index,
            block_number: meta.block_number,
            created_at: meta.block_timestamp,
        })?;

        Ok(outcome)
    }

    /// Creates the user on its first stream, in any organization.
    fn ensure_user(&mut self, user: &[u8], created_at: u64) -> StoreResult<()> {
        let id = to_key(user);
        if self.store.load_typed::<User>(&id)?.is_none() {
            self.store
                .save_typed(User { id, user: user.to_vec(), created_at })?;
        }
        Ok(())
    }

    /// An entity can be stored while its source is not watched when a store without atomic
    /// `save_all` failed part way through the block that created it.
    fn rewatch(&mut self, kind: ContractKind, address: &[u8]) {
        if self.registry.kind_of(address).is_none() {
            debug!(%kind, address = %hex::encode(address), "watching stored source again");
            self.registry.register(kind, address);
        }
    }
}
