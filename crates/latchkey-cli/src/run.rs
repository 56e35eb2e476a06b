//! Run one device against a real MQTT broker.
//!
//! Physical inputs come from standard input, one line at a time:
//!
//! | device   | line                         | effect                          |
//! |----------|------------------------------|---------------------------------|
//! | keypad   | `1234E`                      | press each key in turn          |
//! | doorlock | `open` / `close`             | release / press the door sensor |
//! | rfid     | `04:AB:CD:EF`                | tap a card with that UID        |
//!
//! LED changes are logged at `info`. The loop stops on ctrl-c.

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use latchkey_core::MonotonicClock;
use latchkey_doorlock::DoorLock;
use latchkey_hardware::mock::{
    MockCardReader, MockCardReaderHandle, MockContactSensor, MockContactSensorHandle,
    MockKeyMatrix, MockKeyMatrixHandle,
};
use latchkey_hardware::{IndicatorPin, KeySymbol};
use latchkey_keypad::Keypad;
use latchkey_network::{Device, DeviceLoop, MqttConfig, MqttTransport};
use latchkey_rfid::RfidStation;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::rig::Rig;
use crate::simulate::parse_uid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceKind {
    Keypad,
    Doorlock,
    Rfid,
}

/// LED that reports its level changes to the log.
#[derive(Debug)]
pub struct LoggedPin {
    name: &'static str,
    lit: bool,
}

impl LoggedPin {
    pub fn new(name: &'static str) -> Self {
        Self { name, lit: false }
    }
}

impl IndicatorPin for LoggedPin {
    fn set_lit(&mut self, lit: bool) -> latchkey_hardware::Result<()> {
        if lit != self.lit {
            info!(led = self.name, lit, "LED");
            self.lit = lit;
        }
        Ok(())
    }
}

/// One input read from the console.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConsoleInput {
    Key(KeySymbol),
    Door { closed: bool },
    Card(Vec<u8>),
}

fn parse_line(kind: DeviceKind, line: &str) -> Result<Vec<ConsoleInput>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Vec::new());
    }

    match kind {
        DeviceKind::Keypad => line
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| {
                KeySymbol::from_char(c.to_ascii_uppercase())
                    .map(ConsoleInput::Key)
                    .with_context(|| format!("no key '{c}' on the keypad"))
            })
            .collect(),
        DeviceKind::Doorlock => match line.to_ascii_lowercase().as_str() {
            "open" => Ok(vec![ConsoleInput::Door { closed: false }]),
            "close" | "closed" => Ok(vec![ConsoleInput::Door { closed: true }]),
            other => bail!("expected 'open' or 'close', got '{other}'"),
        },
        DeviceKind::Rfid => Ok(vec![ConsoleInput::Card(parse_uid(line)?)]),
    }
}

/// Handles through which console input reaches the mock hardware.
enum Inputs {
    Keypad { keys: MockKeyMatrixHandle, hold: Duration },
    Doorlock(MockContactSensorHandle),
    Rfid(MockCardReaderHandle),
}

impl Inputs {
    fn kind(&self) -> DeviceKind {
        match self {
            Inputs::Keypad { .. } => DeviceKind::Keypad,
            Inputs::Doorlock(_) => DeviceKind::Doorlock,
            Inputs::Rfid(_) => DeviceKind::Rfid,
        }
    }

    async fn apply(&self, input: ConsoleInput) -> Result<()> {
        match (self, input) {
            (Inputs::Keypad { keys, hold }, ConsoleInput::Key(key)) => {
                keys.press(key);
                tokio::time::sleep(*hold).await;
                keys.release();
                tokio::time::sleep(*hold).await;
            }
            (Inputs::Doorlock(sensor), ConsoleInput::Door { closed }) => {
                if closed {
                    sensor.press();
                } else {
                    sensor.release();
                }
            }
            (Inputs::Rfid(reader), ConsoleInput::Card(uid)) => {
                reader.tap(uid).context("tapping card")?;
            }
            (_, other) => bail!("{other:?} does not apply to this device"),
        }
        Ok(())
    }
}

/// Feed lines from `reader` to the hardware until end of input.
async fn console<R: AsyncBufRead + Unpin>(reader: R, inputs: Inputs) -> Result<()> {
    let kind = inputs.kind();
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("reading console")? {
        let parsed = match parse_line(kind, &line) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Ignoring console line");
                continue;
            }
        };
        for input in parsed {
            inputs.apply(input).await?;
        }
    }
    info!("Console closed");
    Ok(())
}

async fn drive<D: Device>(device: D, inputs: Inputs, rig: &Rig, mqtt: &MqttConfig) -> Result<()> {
    let client_id = device.identity().to_string();
    let transport = MqttTransport::spawn(&client_id, mqtt);
    let mut device_loop = DeviceLoop::new(
        device,
        transport,
        rig.topics.clone(),
        rig.loop_config.clone(),
    );

    let console = tokio::spawn(console(BufReader::new(tokio::io::stdin()), inputs));
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        info!("Shutting down");
    };

    device_loop.run(&MonotonicClock::new(), shutdown).await;
    console.abort();
    Ok(())
}

/// Run the chosen device until ctrl-c.
pub async fn run(kind: DeviceKind, rig: &Rig, mqtt: &MqttConfig) -> Result<()> {
    info!(device = ?kind, host = %mqtt.host, port = mqtt.port, "Starting device");

    match kind {
        DeviceKind::Keypad => {
            let (matrix, keys) = MockKeyMatrix::new();
            let keypad = Keypad::new(
                rig.keypad_id.clone(),
                rig.keypad.clone(),
                matrix,
                LoggedPin::new("keypad-red"),
                LoggedPin::new("keypad-green"),
            );
            let hold = rig.keypad.debounce_window * 2;
            drive(keypad, Inputs::Keypad { keys, hold }, rig, mqtt).await
        }
        DeviceKind::Doorlock => {
            let (contact, sensor) = MockContactSensor::new();
            // The door starts closed.
            sensor.press();
            let door = DoorLock::new(
                rig.door_id.clone(),
                rig.doorlock.clone(),
                contact,
                LoggedPin::new("door-unlock"),
            );
            drive(door, Inputs::Doorlock(sensor), rig, mqtt).await
        }
        DeviceKind::Rfid => {
            let (card_reader, reader) = MockCardReader::new();
            let station = RfidStation::new(rig.rfid_id.clone(), rig.rfid.clone(), card_reader);
            drive(station, Inputs::Rfid(reader), rig, mqtt).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latchkey_hardware::{CardReader, ContactSensor};
    use rstest::rstest;

    fn key(c: char) -> ConsoleInput {
        ConsoleInput::Key(KeySymbol::from_char(c).unwrap())
    }

    #[rstest]
    #[case("12e", vec![key('1'), key('2'), key('E')])]
    #[case(" 4 2 E ", vec![key('4'), key('2'), key('E')])]
    #[case("", vec![])]
    fn test_parse_keypad_line(#[case] line: &str, #[case] expected: Vec<ConsoleInput>) {
        assert_eq!(parse_line(DeviceKind::Keypad, line).unwrap(), expected);
    }

    #[rstest]
    #[case(DeviceKind::Keypad, "12#")]
    #[case(DeviceKind::Doorlock, "ajar")]
    #[case(DeviceKind::Rfid, "04:ZZ")]
    fn test_parse_rejects(#[case] kind: DeviceKind, #[case] line: &str) {
        assert!(parse_line(kind, line).is_err());
    }

    #[test]
    fn test_parse_door_and_card() {
        assert_eq!(
            parse_line(DeviceKind::Doorlock, "Close").unwrap(),
            vec![ConsoleInput::Door { closed: true }]
        );
        assert_eq!(
            parse_line(DeviceKind::Rfid, "04:AB:CD:EF").unwrap(),
            vec![ConsoleInput::Card(vec![0x04, 0xAB, 0xCD, 0xEF])]
        );
    }

    #[test]
    fn test_logged_pin_tracks_level() {
        let mut pin = LoggedPin::new("test");
        pin.set_lit(true).unwrap();
        pin.set_lit(true).unwrap();
        assert!(pin.lit);
        pin.set_lit(false).unwrap();
        assert!(!pin.lit);
    }

    #[tokio::test]
    async fn test_console_taps_cards() {
        let (mut card_reader, reader) = MockCardReader::new();
        console(&b"04:AB:CD:EF\nnot a uid\n01:02:03:04\n"[..], Inputs::Rfid(reader))
            .await
            .unwrap();

        let first = card_reader.poll_card().unwrap().unwrap();
        let second = card_reader.poll_card().unwrap().unwrap();
        assert_eq!(first.uid_colon_hex(), "04:AB:CD:EF");
        assert_eq!(second.uid_colon_hex(), "01:02:03:04");
        assert!(card_reader.poll_card().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_console_moves_door_sensor() {
        let (mut contact, sensor) = MockContactSensor::new();
        console(&b"close\n"[..], Inputs::Doorlock(sensor.clone()))
            .await
            .unwrap();
        assert!(contact.is_pressed().unwrap());

        console(&b"open\n"[..], Inputs::Doorlock(sensor)).await.unwrap();
        assert!(!contact.is_pressed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_console_releases_every_key() {
        let (_matrix, keys) = MockKeyMatrix::new();
        let inputs = Inputs::Keypad {
            keys: keys.clone(),
            hold: Duration::from_millis(80),
        };
        console(&b"12E\n"[..], inputs).await.unwrap();
        assert_eq!(keys.held(), None);
    }
}
