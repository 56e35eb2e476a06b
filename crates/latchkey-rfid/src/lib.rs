//! RFID reader device.
//!
//! Every card read is published as a retained `{deviceId, rfidUid}` record,
//! except repeated reads of the same card inside the dedupe window.

use latchkey_core::constants::RFID_DEDUPE_WINDOW_MS;
use latchkey_core::{DeviceIdentity, Timestamp};
use latchkey_fsm::CardDedupe;
use latchkey_hardware::{CardData, CardReader};
use latchkey_network::Device;
use latchkey_protocol::{CardRecord, ChannelRole, InboundMessage, OutboundRecord};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// RFID reader configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RfidConfig {
    /// Window in which a repeated read of the last published card is dropped.
    pub dedupe_window: Duration,
}

impl Default for RfidConfig {
    fn default() -> Self {
        Self {
            dedupe_window: Duration::from_millis(RFID_DEDUPE_WINDOW_MS),
        }
    }
}

impl RfidConfig {
    pub fn with_dedupe_window(mut self, window: Duration) -> Self {
        self.dedupe_window = window;
        self
    }
}

/// RFID reader bound to its card reader hardware.
pub struct RfidStation<R> {
    identity: DeviceIdentity,
    reader: R,
    dedupe: CardDedupe,
    outbox: Vec<OutboundRecord>,
}

impl<R: CardReader> RfidStation<R> {
    pub fn new(identity: DeviceIdentity, config: RfidConfig, reader: R) -> Self {
        Self {
            identity,
            reader,
            dedupe: CardDedupe::with_window(config.dedupe_window),
            outbox: Vec::new(),
        }
    }

    /// Queue a card read at `now` unless it is a duplicate.
    pub fn on_card(&mut self, card: &CardData, now: Timestamp) {
        let uid = card.uid_colon_hex();
        debug!(uid = %uid, card_type = card.card_type.name(), "Card read");

        if !self.dedupe.admit(&card.uid, now) {
            trace!(uid = %uid, "Duplicate read suppressed");
            return;
        }

        info!(reader = %self.identity, uid = %uid, "Card presented");
        self.outbox.push(OutboundRecord::Card(CardRecord {
            device_id: self.identity.clone(),
            rfid_uid: uid,
        }));
    }
}

impl<R: CardReader> Device for RfidStation<R> {
    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    fn subscriptions(&self) -> &[ChannelRole] {
        &[]
    }

    fn sample_inputs(&mut self, now: Timestamp) {
        match self.reader.poll_card() {
            Ok(Some(card)) => self.on_card(&card, now),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Polling card reader failed"),
        }
    }

    fn tick(&mut self, _now: Timestamp) {}

    fn react(&mut self, message: InboundMessage, _now: Timestamp) {
        trace!(channel = %message.role(), "Record not handled by RFID reader");
    }

    fn sync_outputs(&mut self) {}

    fn take_outbox(&mut self) -> Vec<OutboundRecord> {
        std::mem::take(&mut self.outbox)
    }
}
