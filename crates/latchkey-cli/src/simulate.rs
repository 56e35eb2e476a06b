//! Scripted end-to-end run of the rig on the in-memory broker.
//!
//! The keypad, door lock and RFID reader run on mock hardware against a
//! [`ManualClock`]; an [`Authority`] plays the server. Every device loop is
//! stepped once per tick, in a fixed order, so a run is fully deterministic.

use anyhow::{Context, Result, bail};
use latchkey_core::{Clock, ManualClock, Timestamp};
use latchkey_doorlock::DoorLock;
use latchkey_fsm::IndicatorMode;
use latchkey_hardware::KeySymbol;
use latchkey_hardware::mock::{
    MockCardReader, MockCardReaderHandle, MockContactSensor, MockContactSensorHandle,
    MockIndicatorHandle, MockIndicatorPin, MockKeyMatrix, MockKeyMatrixHandle,
};
use latchkey_keypad::Keypad;
use latchkey_network::{DeviceLoop, MemoryBroker, MemoryClient};
use latchkey_rfid::RfidStation;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

use crate::authority::{Authority, Decision};
use crate::rig::Rig;

const TICK: Duration = Duration::from_millis(5);

/// Margin added to every wait so deadlines are strictly passed.
const SLACK: Duration = Duration::from_millis(100);

/// Outcome of a scripted run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub keypad_id: String,
    pub door_id: String,
    pub rfid_id: String,
    pub decisions: Vec<String>,
    pub granted: bool,
    pub unlock_lit: bool,
    pub alarm_raised: bool,
    pub alarm_cleared: bool,
    pub elapsed_ms: u64,
    pub primary: IndicatorMode,
    pub secondary: IndicatorMode,
    pub unlock: IndicatorMode,
    pub broker_publications: u64,
}

type KeypadLoop = DeviceLoop<Keypad<MockKeyMatrix, MockIndicatorPin>, MemoryClient>;
type DoorLoop = DeviceLoop<DoorLock<MockContactSensor, MockIndicatorPin>, MemoryClient>;
type RfidLoop = DeviceLoop<RfidStation<MockCardReader>, MemoryClient>;

struct Simulation {
    clock: ManualClock,
    broker: MemoryBroker,
    keypad: KeypadLoop,
    door: DoorLoop,
    rfid: RfidLoop,
    authority: Authority,
    keys: MockKeyMatrixHandle,
    sensor: MockContactSensorHandle,
    reader: MockCardReaderHandle,
    unlock_led: MockIndicatorHandle,
    key_hold: Duration,
    unlock_lit: bool,
    alarm_raised: bool,
}

impl Simulation {
    fn new(rig: &Rig) -> Result<Self> {
        let broker = MemoryBroker::new();

        let mut authority = Authority::new(
            broker.client("authority"),
            rig.topics.clone(),
            rig.authority_config(),
        );
        authority.connect().context("connecting the authority")?;

        let (matrix, keys) = MockKeyMatrix::new();
        let (red, _) = MockIndicatorPin::new("keypad-red");
        let (green, _) = MockIndicatorPin::new("keypad-green");
        let keypad = DeviceLoop::new(
            Keypad::new(rig.keypad_id.clone(), rig.keypad.clone(), matrix, red, green),
            broker.client(rig.keypad_id.as_str()),
            rig.topics.clone(),
            rig.loop_config.clone(),
        );

        let (contact, sensor) = MockContactSensor::new();
        let (led, unlock_led) = MockIndicatorPin::new("door-unlock");
        let door = DeviceLoop::new(
            DoorLock::new(rig.door_id.clone(), rig.doorlock.clone(), contact, led),
            broker.client(rig.door_id.as_str()),
            rig.topics.clone(),
            rig.loop_config.clone(),
        );

        let (card_reader, reader) = MockCardReader::new();
        let rfid = DeviceLoop::new(
            RfidStation::new(rig.rfid_id.clone(), rig.rfid.clone(), card_reader),
            broker.client(rig.rfid_id.as_str()),
            rig.topics.clone(),
            rig.loop_config.clone(),
        );

        Ok(Self {
            clock: ManualClock::new(),
            broker,
            keypad,
            door,
            rfid,
            authority,
            keys,
            sensor,
            reader,
            unlock_led,
            key_hold: rig.keypad.debounce_window * 2,
            unlock_lit: false,
            alarm_raised: false,
        })
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn run_for(&mut self, span: Duration) {
        let end = self.now() + span;
        while self.now() < end {
            let now = self.now();
            self.rfid.step(now);
            self.keypad.step(now);
            self.door.step(now);
            self.authority.step(now);

            self.unlock_lit |= self.unlock_led.is_lit();
            let core = self.keypad.device().core();
            if core.door().is_watching() && core.primary().is_glowing() && !self.alarm_raised {
                info!(at = %now, "Door left open, alarm raised");
                self.alarm_raised = true;
            }

            self.clock.advance(TICK);
        }
    }

    fn type_key(&mut self, key: KeySymbol) {
        self.keys.press(key);
        self.run_for(self.key_hold);
        self.keys.release();
        self.run_for(self.key_hold);
    }

    fn type_pin(&mut self, pin: &str) -> Result<()> {
        for c in pin.chars() {
            let key = KeySymbol::from_char(c).with_context(|| format!("typing '{c}'"))?;
            self.type_key(key);
        }
        self.type_key(KeySymbol::Enter);
        Ok(())
    }

    fn tap(&mut self, uid: &[u8]) -> Result<()> {
        self.reader.tap(uid.to_vec()).context("tapping card")?;
        self.run_for(SLACK);
        Ok(())
    }

    fn report(&self, rig: &Rig) -> Report {
        let keypad = self.keypad.device().core();
        let decisions = self.authority.decisions();
        Report {
            keypad_id: rig.keypad_id.to_string(),
            door_id: rig.door_id.to_string(),
            rfid_id: rig.rfid_id.to_string(),
            decisions: decisions.iter().map(describe).collect(),
            granted: decisions.contains(&Decision::PinAccepted),
            unlock_lit: self.unlock_lit,
            alarm_raised: self.alarm_raised,
            alarm_cleared: self.alarm_raised
                && !keypad.door().is_watching()
                && !keypad.primary().is_lit(),
            elapsed_ms: self.now().as_millis(),
            primary: keypad.primary().mode(),
            secondary: keypad.secondary().mode(),
            unlock: self.door.device().core().unlock().mode(),
            broker_publications: self.broker.published_count(),
        }
    }
}

fn describe(decision: &Decision) -> String {
    match decision {
        Decision::CardAccepted(uid) => format!("card {uid} accepted"),
        Decision::CardRejected(uid) => format!("card {uid} rejected"),
        Decision::PinAccepted => "pin accepted".to_string(),
        Decision::PinRejected => "pin rejected".to_string(),
        Decision::NoSession => "pin without card".to_string(),
        Decision::SessionExpired => "session expired".to_string(),
    }
}

/// Parse a colon-separated hex UID such as `04:AB:CD:EF`.
pub fn parse_uid(text: &str) -> Result<Vec<u8>> {
    let bytes = text
        .split(':')
        .map(|part| u8::from_str_radix(part, 16))
        .collect::<std::result::Result<Vec<u8>, _>>()
        .with_context(|| format!("invalid card uid '{text}'"))?;
    if bytes.is_empty() {
        bail!("empty card uid");
    }
    Ok(bytes)
}

/// A PIN of the same length that differs from `pin` in every digit.
fn wrong_pin(pin: &str) -> String {
    pin.chars()
        .map(|c| if c == '0' { '1' } else { '0' })
        .collect()
}

/// What the scripted user does.
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Card to tap instead of the first known one.
    pub card: Option<String>,
    /// Enter a wrong PIN first, then tap again once the rejection has played
    /// out.
    pub wrong_first: bool,
}

/// Play the card, PIN, grant, door, alarm, close story.
pub fn run(rig: &Rig, script: &Script) -> Result<Report> {
    let card = match &script.card {
        Some(card) => card,
        None => rig.cards.first().context("rig has no known cards to tap")?,
    };
    let uid = parse_uid(card)?;

    let mut sim = Simulation::new(rig)?;
    let debounce = rig.keypad.debounce_window;

    info!("Closing the door");
    sim.sensor.press();
    sim.run_for(debounce * 2 + SLACK);

    info!(card = %card, "Tapping card");
    sim.tap(&uid)?;

    if script.wrong_first {
        info!("Entering a wrong PIN");
        sim.type_pin(&wrong_pin(&rig.pin))?;
        sim.run_for(rig.state_duration.max(rig.rfid.dedupe_window) + SLACK);

        info!(card = %card, "Tapping card again");
        sim.tap(&uid)?;
    }

    info!("Entering the PIN");
    sim.type_pin(&rig.pin)?;
    sim.run_for(SLACK);

    info!("Opening the door");
    sim.sensor.release();
    sim.run_for(debounce * 2 + rig.keypad.alert_threshold + SLACK);

    info!("Closing the door");
    sim.sensor.press();
    sim.run_for(debounce * 2 + SLACK);

    let report = sim.report(rig);
    info!(
        granted = report.granted,
        alarm_raised = report.alarm_raised,
        alarm_cleared = report.alarm_cleared,
        elapsed_ms = report.elapsed_ms,
        "Simulation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::RigFile;
    use rstest::rstest;

    fn rig() -> Rig {
        RigFile::default().resolve().unwrap()
    }

    #[test]
    fn test_default_story() {
        let report = run(&rig(), &Script::default()).unwrap();

        assert_eq!(report.decisions, vec!["card 04:AB:CD:EF accepted", "pin accepted"]);
        assert!(report.granted);
        assert!(report.unlock_lit);
        assert!(report.alarm_raised);
        assert!(report.alarm_cleared);
        assert_eq!(report.primary, IndicatorMode::Idle);
    }

    #[test]
    fn test_wrong_pin_first() {
        let script = Script {
            wrong_first: true,
            ..Script::default()
        };
        let report = run(&rig(), &script).unwrap();

        assert_eq!(
            report.decisions,
            vec![
                "card 04:AB:CD:EF accepted",
                "pin rejected",
                "card 04:AB:CD:EF accepted",
                "pin accepted",
            ]
        );
        assert!(report.granted);
    }

    #[test]
    fn test_unknown_card_is_never_granted() {
        let script = Script {
            card: Some("DE:AD:BE:EF".to_string()),
            ..Script::default()
        };
        let report = run(&rig(), &script).unwrap();

        assert_eq!(report.decisions, vec!["card DE:AD:BE:EF rejected"]);
        assert!(!report.granted);
        assert!(!report.unlock_lit);
        // The door still opens by hand and is left open too long.
        assert!(report.alarm_raised);
        assert!(report.alarm_cleared);
    }

    #[test]
    fn test_custom_pin_and_card() {
        let file: RigFile =
            serde_json::from_str(r#"{"pin": "2468", "cards": ["01:02:03:04"]}"#).unwrap();
        let report = run(&file.resolve().unwrap(), &Script::default()).unwrap();

        assert_eq!(report.decisions, vec!["card 01:02:03:04 accepted", "pin accepted"]);
        assert!(report.granted);
    }

    #[rstest]
    #[case("04:AB:CD:EF", vec![0x04, 0xAB, 0xCD, 0xEF])]
    #[case("1", vec![0x01])]
    fn test_parse_uid(#[case] text: &str, #[case] expected: Vec<u8>) {
        assert_eq!(parse_uid(text).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("04:GG")]
    #[case("04::EF")]
    fn test_parse_uid_rejects(#[case] text: &str) {
        assert!(parse_uid(text).is_err());
    }

    #[rstest]
    #[case("1234", "0000")]
    #[case("0000", "1111")]
    #[case("9070", "0101")]
    fn test_wrong_pin_differs(#[case] pin: &str, #[case] expected: &str) {
        assert_eq!(wrong_pin(pin), expected);
    }
}
