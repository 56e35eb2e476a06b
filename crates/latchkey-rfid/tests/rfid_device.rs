use latchkey_core::{DeviceIdentity, Timestamp};
use latchkey_hardware::mock::MockCardReader;
use latchkey_network::{DeviceLoop, LoopConfig, MemoryBroker, Transport};
use latchkey_protocol::TopicConfig;
use latchkey_rfid::{RfidConfig, RfidStation};
use rstest::rstest;

#[rstest]
#[case::far_apart(&[0, 2000], 2)]
#[case::held_near_reader(&[0, 300, 600, 900], 1)]
#[case::window_edge(&[0, 1499, 1500], 2)]
fn test_taps_published(#[case] taps: &[u64], #[case] expected: usize) {
    let broker = MemoryBroker::new();
    let (reader, handle) = MockCardReader::new();
    let mut device = DeviceLoop::new(
        RfidStation::new(DeviceIdentity::new("R1").unwrap(), RfidConfig::default(), reader),
        broker.client("R1"),
        TopicConfig::default(),
        LoopConfig::default(),
    );

    for &at in taps {
        handle.tap(vec![0x04, 0xAB, 0xCD, 0xEF]).unwrap();
        device.step(Timestamp::from_millis(at));
    }

    let mut authority = broker.client("authority");
    authority.ensure_connected();
    authority.subscribe("rfid/uid").unwrap();
    let replay = authority.drain();
    assert_eq!(replay.len(), 1);
    assert!(replay[0].retained);

    let value: serde_json::Value = serde_json::from_slice(&replay[0].payload).unwrap();
    assert_eq!(value["deviceId"], "R1");
    assert_eq!(value["rfidUid"], "04:AB:CD:EF");
    assert_eq!(broker.published_count() as usize, expected + 1);
}
