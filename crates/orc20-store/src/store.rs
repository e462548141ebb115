//! Ledger tables and their secondary indices

use orc20_core::{
    Address, Balance, BalanceKey, BalanceStatus, ErrorCode, EventId, EventStatus, EventType,
    InscriptionContent, InscriptionId, InscriptionTransfer, LedgerEvent, TickId, TickMetadata,
};
use std::collections::{BTreeMap, BTreeSet};

/// `(tick key, address)`
type TickAddress = (TickId, Address);

/// In-memory ledger: inputs, derived records and the era B snapshot
#[derive(Debug, Clone, Default)]
pub struct LedgerStore {
    contents: BTreeMap<InscriptionId, InscriptionContent>,
    transfers: Vec<InscriptionTransfer>,

    metadata: BTreeMap<TickId, TickMetadata>,
    metadata_by_number: BTreeMap<(String, i64), TickId>,
    metadata_by_deploy_id: BTreeMap<(String, Option<String>), TickId>,

    balances: BTreeMap<BalanceKey, Balance>,
    balances_by_holder: BTreeMap<TickAddress, BTreeSet<BalanceKey>>,
    balances_by_creator: BTreeMap<TickAddress, BTreeSet<BalanceKey>>,
    balances_by_inscription: BTreeMap<InscriptionId, BalanceKey>,

    events: BTreeMap<EventId, LedgerEvent>,
    events_by_creator: BTreeMap<TickAddress, BTreeSet<EventId>>,
    events_by_receiver: BTreeMap<TickAddress, BTreeSet<EventId>>,
    events_by_inscription: BTreeMap<(InscriptionId, EventType), BTreeSet<EventId>>,

    snapshot: Option<BTreeMap<BalanceKey, Balance>>,
}

fn pair(tick_id: &str, address: &str) -> TickAddress {
    (tick_id.to_string(), address.to_string())
}

fn index_insert<K: Ord, V: Ord>(index: &mut BTreeMap<K, BTreeSet<V>>, key: K, value: V) {
    index.entry(key).or_default().insert(value);
}

fn index_remove<K: Ord, V: Ord>(index: &mut BTreeMap<K, BTreeSet<V>>, key: &K, value: &V) {
    if let Some(values) = index.get_mut(key) {
        values.remove(value);
        if values.is_empty() {
            index.remove(key);
        }
    }
}

impl LedgerStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    // Inputs

    /// Store an inscription content, replacing any previous one with the same id
    pub fn put_content(&mut self, content: InscriptionContent) {
        self.contents
            .insert(content.inscription_id.clone(), content);
    }

    /// Look up a content by inscription id
    pub fn content(&self, inscription_id: &str) -> Option<&InscriptionContent> {
        self.contents.get(inscription_id)
    }

    /// Record the creation height of a content; returns `false` if the
    /// content is unknown
    pub fn backfill_genesis_height(&mut self, inscription_id: &str, height: u64) -> bool {
        match self.contents.get_mut(inscription_id) {
            Some(content) => {
                content.genesis_height = height;
                true
            }
            None => false,
        }
    }

    /// Number of stored contents
    pub fn content_count(&self) -> usize {
        self.contents.len()
    }

    /// Queue a transfer for replay
    pub fn push_transfer(&mut self, transfer: InscriptionTransfer) {
        self.transfers.push(transfer);
    }

    /// Queued transfers in insertion order
    pub fn transfers(&self) -> &[InscriptionTransfer] {
        &self.transfers
    }

    /// Queued transfers in replay order: ascending (block height, tx index),
    /// ties kept in insertion order
    pub fn transfers_in_replay_order(&self) -> Vec<InscriptionTransfer> {
        let mut ordered = self.transfers.clone();
        ordered.sort_by_key(|transfer| (transfer.block_height, transfer.tx_index));
        ordered
    }

    // Tick metadata

    /// Store a metadata record and index it by (tick, number) and
    /// (tick, deploy identity)
    pub fn put_metadata(&mut self, metadata: TickMetadata) {
        if let Some(previous) = self.metadata.remove(&metadata.tick_id) {
            self.metadata_by_number
                .remove(&(previous.tick.clone(), previous.inscription_number));
            self.metadata_by_deploy_id
                .remove(&(previous.tick, previous.deploy_id));
        }
        self.metadata_by_number.insert(
            (metadata.tick.clone(), metadata.inscription_number),
            metadata.tick_id.clone(),
        );
        self.metadata_by_deploy_id.insert(
            (metadata.tick.clone(), metadata.deploy_id.clone()),
            metadata.tick_id.clone(),
        );
        tracing::trace!(tick_id = %metadata.tick_id, tick = %metadata.tick, "metadata stored");
        self.metadata.insert(metadata.tick_id.clone(), metadata);
    }

    /// Look up metadata by its key
    pub fn metadata(&self, tick_id: &str) -> Option<&TickMetadata> {
        self.metadata.get(tick_id)
    }

    /// Look up metadata by tick and deploy inscription number
    pub fn metadata_by_number(&self, tick: &str, inscription_number: i64) -> Option<&TickMetadata> {
        self.metadata_by_number
            .get(&(tick.to_string(), inscription_number))
            .and_then(|tick_id| self.metadata.get(tick_id))
    }

    /// Look up metadata by tick and deploy identity; an absent identity only
    /// matches a deploy that declared none
    pub fn metadata_by_deploy_id(&self, tick: &str, deploy_id: Option<&str>) -> Option<&TickMetadata> {
        self.metadata_by_deploy_id
            .get(&(tick.to_string(), deploy_id.map(str::to_string)))
            .and_then(|tick_id| self.metadata.get(tick_id))
    }

    // Balances

    /// Store a balance under its key, replacing any record already there
    pub fn put_balance(&mut self, balance: Balance) {
        let key = balance.key();
        if let Some(previous) = self.balances.remove(&key) {
            self.unindex_balance(&key, &previous);
        }
        self.index_balance(&key, &balance);
        tracing::trace!(key = %key, status = ?balance.status, op = ?balance.op, "balance stored");
        self.balances.insert(key, balance);
    }

    /// Remove a balance and its index entries
    pub fn remove_balance(&mut self, key: &BalanceKey) -> Option<Balance> {
        let balance = self.balances.remove(key)?;
        self.unindex_balance(key, &balance);
        Some(balance)
    }

    /// Re-key a balance to a new holder; returns the new key
    pub fn move_balance(&mut self, key: &BalanceKey, address: &str) -> Option<BalanceKey> {
        let mut balance = self.remove_balance(key)?;
        balance.address = address.to_string();
        let moved = balance.key();
        tracing::trace!(from = %key, to = %moved, "balance moved");
        self.put_balance(balance);
        Some(moved)
    }

    /// Change the status of a stored balance; returns `false` if absent
    pub fn set_balance_status(&mut self, key: &BalanceKey, status: BalanceStatus) -> bool {
        match self.balances.get_mut(key) {
            Some(balance) => {
                balance.status = status;
                true
            }
            None => false,
        }
    }

    /// Look up a balance by key
    pub fn balance(&self, key: &BalanceKey) -> Option<&Balance> {
        self.balances.get(key)
    }

    /// The balance carried by an inscription, if any
    pub fn balance_by_inscription(&self, inscription_id: &str) -> Option<&Balance> {
        self.balances_by_inscription
            .get(inscription_id)
            .and_then(|key| self.balances.get(key))
    }

    /// The pooled credit balance of `address`, if it exists
    pub fn credit_balance(&self, tick_id: &str, address: &str) -> Option<&Balance> {
        self.balances.get(&BalanceKey::credit(tick_id, address))
    }

    /// All balances currently held by `address`, any status
    pub fn holder_balances(&self, tick_id: &str, address: &str) -> Vec<&Balance> {
        self.lookup_balances(&self.balances_by_holder, &pair(tick_id, address))
    }

    /// All balances whose send was opened by `creator`, any status
    pub fn created_balances(&self, tick_id: &str, creator: &str) -> Vec<&Balance> {
        self.lookup_balances(&self.balances_by_creator, &pair(tick_id, creator))
    }

    /// Every stored balance in key order
    pub fn balances(&self) -> impl Iterator<Item = &Balance> {
        self.balances.values()
    }

    fn lookup_balances(
        &self,
        index: &BTreeMap<TickAddress, BTreeSet<BalanceKey>>,
        key: &TickAddress,
    ) -> Vec<&Balance> {
        index
            .get(key)
            .into_iter()
            .flatten()
            .filter_map(|key| self.balances.get(key))
            .collect()
    }

    fn index_balance(&mut self, key: &BalanceKey, balance: &Balance) {
        index_insert(
            &mut self.balances_by_holder,
            pair(&balance.tick_id, &balance.address),
            key.clone(),
        );
        if let Some(creator) = &balance.creator {
            index_insert(
                &mut self.balances_by_creator,
                pair(&balance.tick_id, creator),
                key.clone(),
            );
        }
        if !balance.inscription_id.is_empty() {
            self.balances_by_inscription
                .insert(balance.inscription_id.clone(), key.clone());
        }
    }

    fn unindex_balance(&mut self, key: &BalanceKey, balance: &Balance) {
        index_remove(
            &mut self.balances_by_holder,
            &pair(&balance.tick_id, &balance.address),
            key,
        );
        if let Some(creator) = &balance.creator {
            index_remove(
                &mut self.balances_by_creator,
                &pair(&balance.tick_id, creator),
                key,
            );
        }
        if self.balances_by_inscription.get(&balance.inscription_id) == Some(key) {
            self.balances_by_inscription.remove(&balance.inscription_id);
        }
    }

    // Events

    /// Whether an event with this key was already recorded
    pub fn contains_event(&self, event_id: &str) -> bool {
        self.events.contains_key(event_id)
    }

    /// Look up an event by key
    pub fn event(&self, event_id: &str) -> Option<&LedgerEvent> {
        self.events.get(event_id)
    }

    /// Record an event, replacing any event with the same key
    pub fn put_event(&mut self, event: LedgerEvent) {
        if let Some(previous) = self.events.remove(&event.event_id) {
            self.unindex_event(&previous);
        }
        self.index_event(&event);
        tracing::trace!(
            event_id = %event.event_id,
            event_type = ?event.event_type,
            status = ?event.status,
            "event stored"
        );
        self.events.insert(event.event_id.clone(), event);
    }

    /// Amend the outcome of a recorded event; returns `false` if absent
    pub fn amend_event(
        &mut self,
        event_id: &str,
        status: EventStatus,
        error_code: Option<ErrorCode>,
    ) -> bool {
        match self.events.get_mut(event_id) {
            Some(event) => {
                event.status = status;
                event.error_code = error_code;
                true
            }
            None => false,
        }
    }

    /// Events of a tick whose send was opened by `creator`
    pub fn events_by_creator(&self, tick_id: &str, creator: &str) -> Vec<&LedgerEvent> {
        self.lookup_events(self.events_by_creator.get(&pair(tick_id, creator)))
    }

    /// Events of a tick received by `address`
    pub fn events_by_receiver(&self, tick_id: &str, address: &str) -> Vec<&LedgerEvent> {
        self.lookup_events(self.events_by_receiver.get(&pair(tick_id, address)))
    }

    /// Events of one type recorded for an inscription
    pub fn events_for_inscription(
        &self,
        inscription_id: &str,
        event_type: EventType,
    ) -> Vec<&LedgerEvent> {
        self.lookup_events(
            self.events_by_inscription
                .get(&(inscription_id.to_string(), event_type)),
        )
    }

    /// Number of recorded events
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    fn lookup_events(&self, ids: Option<&BTreeSet<EventId>>) -> Vec<&LedgerEvent> {
        ids.into_iter()
            .flatten()
            .filter_map(|id| self.events.get(id))
            .collect()
    }

    fn index_event(&mut self, event: &LedgerEvent) {
        let id = event.event_id.clone();
        if let Some(creator) = &event.creator {
            index_insert(
                &mut self.events_by_creator,
                pair(&event.tick_id, creator),
                id.clone(),
            );
        }
        index_insert(
            &mut self.events_by_receiver,
            pair(&event.tick_id, &event.to_address),
            id.clone(),
        );
        index_insert(
            &mut self.events_by_inscription,
            (event.inscription_id.clone(), event.event_type),
            id,
        );
    }

    fn unindex_event(&mut self, event: &LedgerEvent) {
        if let Some(creator) = &event.creator {
            index_remove(
                &mut self.events_by_creator,
                &pair(&event.tick_id, creator),
                &event.event_id,
            );
        }
        index_remove(
            &mut self.events_by_receiver,
            &pair(&event.tick_id, &event.to_address),
            &event.event_id,
        );
        index_remove(
            &mut self.events_by_inscription,
            &(event.inscription_id.clone(), event.event_type),
            &event.event_id,
        );
    }

    // Era B snapshot

    /// Copy every OK balance into the snapshot table. Only the first call
    /// has an effect; returns whether this call took the snapshot.
    pub fn take_snapshot(&mut self) -> bool {
        if self.snapshot.is_some() {
            return false;
        }
        let frozen: BTreeMap<BalanceKey, Balance> = self
            .balances
            .iter()
            .filter(|(_, balance)| balance.is_ok())
            .map(|(key, balance)| (key.clone(), balance.clone()))
            .collect();
        tracing::debug!(balances = frozen.len(), "era B snapshot taken");
        self.snapshot = Some(frozen);
        true
    }

    /// Whether the snapshot was already taken
    pub fn snapshot_taken(&self) -> bool {
        self.snapshot.is_some()
    }

    // Reporting

    /// OK balances ordered by (address, tick key)
    pub fn ok_balances(&self) -> Vec<&Balance> {
        let mut ok: Vec<&Balance> = self.balances.values().filter(|b| b.is_ok()).collect();
        ok.sort_by(|a, b| (&a.address, &a.tick_id).cmp(&(&b.address, &b.tick_id)));
        ok
    }

    /// Snapshot balances ordered by (address, tick key); empty before era B
    pub fn balance_snapshot(&self) -> Vec<&Balance> {
        let mut frozen: Vec<&Balance> = self
            .snapshot
            .iter()
            .flat_map(|snapshot| snapshot.values())
            .collect();
        frozen.sort_by(|a, b| (&a.address, &a.tick_id).cmp(&(&b.address, &b.tick_id)));
        frozen
    }

    /// Metadata records ordered by deploy time
    pub fn metadata_records(&self) -> Vec<&TickMetadata> {
        let mut records: Vec<&TickMetadata> = self.metadata.values().collect();
        records.sort_by_key(|metadata| metadata.deploy_time);
        records
    }

    /// Events ordered by (tick key, block height, tx index)
    pub fn events(&self) -> Vec<&LedgerEvent> {
        let mut events: Vec<&LedgerEvent> = self.events.values().collect();
        events.sort_by(|a, b| {
            (&a.tick_id, a.block_height, a.tx_index).cmp(&(&b.tick_id, b.block_height, b.tx_index))
        });
        events
    }
}
