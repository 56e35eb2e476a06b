//! Mock RFID reader and serial source.

use crate::{
    HardwareError, Result,
    traits::{CardReader, SerialSource},
    types::{CardData, CardType},
};
use tokio::sync::mpsc;

/// Card reader fed by [`MockCardReaderHandle::tap`].
///
/// Every tap produces exactly one read on the next poll.
///
/// # Examples
///
/// ```
/// use latchkey_hardware::CardReader;
/// use latchkey_hardware::mock::MockCardReader;
///
/// let (mut reader, handle) = MockCardReader::new();
/// assert!(reader.poll_card().unwrap().is_none());
///
/// handle.tap(vec![0x04, 0xAB, 0xCD, 0xEF]).unwrap();
/// let card = reader.poll_card().unwrap().unwrap();
/// assert_eq!(card.uid_colon_hex(), "04:AB:CD:EF");
/// ```
#[derive(Debug)]
pub struct MockCardReader {
    card_rx: mpsc::UnboundedReceiver<CardData>,
}

impl MockCardReader {
    pub fn new() -> (Self, MockCardReaderHandle) {
        let (card_tx, card_rx) = mpsc::unbounded_channel();
        (Self { card_rx }, MockCardReaderHandle { card_tx })
    }
}

impl CardReader for MockCardReader {
    fn poll_card(&mut self) -> Result<Option<CardData>> {
        match self.card_rx.try_recv() {
            Ok(card) => Ok(Some(card)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => {
                Err(HardwareError::disconnected("Mock card reader"))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockCardReaderHandle {
    card_tx: mpsc::UnboundedSender<CardData>,
}

impl MockCardReaderHandle {
    /// Present a Mifare Classic card with `uid` to the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the UID length is invalid or the reader was dropped.
    pub fn tap(&self, uid: Vec<u8>) -> Result<()> {
        self.tap_card(CardData::new(uid, CardType::MifareClassic1K)?)
    }

    pub fn tap_card(&self, card: CardData) -> Result<()> {
        self.card_tx
            .send(card)
            .map_err(|_| HardwareError::disconnected("Mock card reader"))
    }
}

/// Serial source returning fixed bytes.
#[derive(Debug, Clone)]
pub struct FixedSerial(pub Vec<u8>);

impl SerialSource for FixedSerial {
    fn serial_number(&self) -> Result<Vec<u8>> {
        if self.0.is_empty() {
            return Err(HardwareError::invalid_data("Serial number is empty"));
        }
        Ok(self.0.clone())
    }
}
