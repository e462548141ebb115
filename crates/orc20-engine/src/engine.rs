//! Replay driver and operation dispatch

use crate::context::{resolve_tick, Movement};
use crate::outcome::{Applied, ReplayStats, SkipReason};
use crate::{credit, deploy, mint, send, upgrade};
use orc20_core::{BasePayload, InscriptionTransfer, Operation, ProtocolRules, TickMetadata};
use orc20_store::LedgerStore;

/// Handler of a creation that targets an existing tick
type TickHandler =
    fn(&ProtocolRules, &mut LedgerStore, &Movement<'_>, TickMetadata) -> Applied;

/// Applies transfers to a ledger under a fixed set of protocol rules
#[derive(Debug, Clone, Default)]
pub struct LedgerEngine {
    rules: ProtocolRules,
}

impl LedgerEngine {
    /// Create an engine for `rules`
    pub fn new(rules: ProtocolRules) -> Self {
        Self { rules }
    }

    /// Rules this engine applies
    pub fn rules(&self) -> &ProtocolRules {
        &self.rules
    }

    /// Apply every queued transfer of `ledger` in (block height, tx index)
    /// order
    pub fn replay(&self, ledger: &mut LedgerStore) -> ReplayStats {
        let transfers = ledger.transfers_in_replay_order();
        let mut stats = ReplayStats::default();
        for transfer in &transfers {
            let applied = self.apply(ledger, transfer);
            stats.record(&applied);
        }
        tracing::info!(
            processed = stats.processed,
            recorded = stats.recorded,
            skipped = stats.skipped_total(),
            "replay finished"
        );
        stats
    }

    /// Apply one transfer
    ///
    /// Re-applying a transfer whose location already produced an event is a
    /// no-op.
    pub fn apply(&self, ledger: &mut LedgerStore, transfer: &InscriptionTransfer) -> Applied {
        if !ledger.snapshot_taken() && !self.rules.before_era_b(transfer.block_height) {
            ledger.take_snapshot();
            tracing::info!(height = transfer.block_height, "era B balance snapshot created");
        }

        let Some(content) = ledger.content(&transfer.inscription_id).cloned() else {
            tracing::warn!(
                inscription_id = %transfer.inscription_id,
                location = %transfer.to_location,
                "transfer of inscription without content"
            );
            return Applied::Skipped(SkipReason::MissingContent);
        };
        if ledger.contains_event(&transfer.to_location) {
            tracing::debug!(location = %transfer.to_location, "event already processed");
            return Applied::Skipped(SkipReason::DuplicateEvent);
        }

        let movement = Movement::new(transfer, content);
        let Some(base) = BasePayload::decode(movement.body()) else {
            tracing::debug!(inscription_id = %movement.inscription_id(), "not a protocol inscription");
            return Applied::Skipped(SkipReason::NotProtocolPayload);
        };

        let applied = if transfer.is_transfer {
            self.transfer(ledger, &movement, &base)
        } else {
            self.inscribe(ledger, &movement, &base)
        };
        if let Applied::Recorded {
            event_type, status, ..
        } = &applied
        {
            tracing::trace!(
                event_id = %movement.event_id(),
                ?event_type,
                ?status,
                "event recorded"
            );
        }
        applied
    }

    fn inscribe(&self, ledger: &mut LedgerStore, movement: &Movement<'_>, base: &BasePayload) -> Applied {
        match base.op {
            Operation::Deploy => deploy::inscribe(&self.rules, ledger, movement),
            Operation::Mint => self.with_tick(ledger, movement, base, mint::inscribe),
            Operation::Send if self.rules.before_era_b(movement.height()) => {
                self.with_tick(ledger, movement, base, send::inscribe)
            }
            Operation::Send => self.with_tick(ledger, movement, base, credit::withdraw),
            Operation::Cancel => self.with_tick(ledger, movement, base, send::cancel),
            Operation::Upgrade => self.with_tick(ledger, movement, base, upgrade::inscribe),
            Operation::List => Applied::Skipped(SkipReason::UnsupportedOperation),
        }
    }

    fn transfer(&self, ledger: &mut LedgerStore, movement: &Movement<'_>, base: &BasePayload) -> Applied {
        match base.op {
            Operation::Deploy => deploy::transfer(ledger, movement, &base.tick),
            Operation::Mint | Operation::Send if self.deposits(movement) => {
                credit::deposit(ledger, movement)
            }
            Operation::Mint => mint::transfer(ledger, movement),
            Operation::Send => send::transfer(&self.rules, ledger, movement),
            Operation::Cancel => Applied::Skipped(SkipReason::NoTransferEffect),
            Operation::List => Applied::Skipped(SkipReason::UnsupportedOperation),
            Operation::Upgrade => upgrade::transfer(&self.rules, ledger, movement),
        }
    }

    /// Era B transfers to the virtual ATM become credit deposits
    fn deposits(&self, movement: &Movement<'_>) -> bool {
        !self.rules.before_era_b(movement.height())
            && self.rules.is_virtual_atm_address(movement.to())
    }

    fn with_tick(
        &self,
        ledger: &mut LedgerStore,
        movement: &Movement<'_>,
        base: &BasePayload,
        handler: TickHandler,
    ) -> Applied {
        let resolved = resolve_tick(
            &self.rules,
            ledger,
            &base.tick,
            base.id.as_deref(),
            movement.genesis_height(),
        )
        .cloned();
        match resolved {
            Some(metadata) => handler(&self.rules, ledger, movement, metadata),
            None => {
                tracing::debug!(
                    inscription_id = %movement.inscription_id(),
                    tick = %base.tick,
                    id = ?base.id,
                    "no deployed tick matches"
                );
                Applied::Skipped(SkipReason::UnresolvedTick)
            }
        }
    }
}
