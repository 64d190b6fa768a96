//! 多电机共享总线时的合并发送测试

use proptest::prelude::*;
use rm_can::MockCanAdapter;
use rm_can::BusFrame;
use rm_driver::{CommConfig, DirectDriveBus, DirectDriveMotor, flush_all};
use rm_protocol::Mode;
use rm_protocol::directdrive::{ID_DRIVE_1234, ID_DRIVE_5678, ID_SET_MODE};
use std::sync::Arc;
use std::thread;

fn drive_frames(frames: Vec<BusFrame>) -> Vec<BusFrame> {
    frames.into_iter().filter(|f| f.id != ID_SET_MODE).collect()
}

#[test]
fn only_touched_half_is_sent() {
    let tx = MockCanAdapter::new();
    let sent = tx.sent();
    let bus = Arc::new(DirectDriveBus::new("can0", tx));
    let mut motor = DirectDriveMotor::new(bus.clone(), 3).unwrap();

    motor.set(1.0).unwrap();
    assert_eq!(bus.flush().unwrap(), 1);
    assert_eq!(bus.flush().unwrap(), 0);

    let ids: Vec<u32> = sent.take().iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![ID_SET_MODE, ID_DRIVE_1234]);
}

#[test]
fn eight_motors_two_frames() {
    let tx = MockCanAdapter::new();
    let sent = tx.sent();
    let bus = Arc::new(DirectDriveBus::new("can0", tx));
    let mut motors: Vec<_> = (1..=8)
        .map(|id| DirectDriveMotor::new(bus.clone(), id).unwrap())
        .collect();

    for (i, motor) in motors.iter_mut().enumerate() {
        motor.set((i + 1) as f32).unwrap();
    }
    assert_eq!(bus.flush().unwrap(), 2);

    let frames = drive_frames(sent.take());
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].id, ID_DRIVE_1234);
    assert_eq!(frames[1].id, ID_DRIVE_5678);
    // 7 号电机：7.0 A * 100 = 700 → 0x02BC
    assert_eq!(&frames[1].data[4..6], &[0x02, 0xBC]);
}

#[test]
fn flush_all_iterates_every_bus() {
    let tx0 = MockCanAdapter::new();
    let tx1 = MockCanAdapter::new();
    let (sent0, sent1) = (tx0.sent(), tx1.sent());
    let bus0 = Arc::new(DirectDriveBus::new("can0", tx0));
    let bus1 = Arc::new(DirectDriveBus::new("can1", tx1));

    let mut a = DirectDriveMotor::new(bus0.clone(), 1).unwrap();
    let mut b = DirectDriveMotor::new(bus1.clone(), 8).unwrap();
    a.set(1.0).unwrap();
    b.set_with_mode(10.0, Mode::Speed).unwrap();

    assert_eq!(flush_all([bus0.as_ref(), bus1.as_ref()]).unwrap(), 2);
    // 每条总线各一帧模式切换 + 一帧驱动指令
    assert_eq!(sent0.len(), 2);
    assert_eq!(sent1.len(), 2);
}

#[test]
fn shared_bus_across_threads() {
    let tx = MockCanAdapter::new();
    let sent = tx.sent();
    let bus = Arc::new(DirectDriveBus::new("can0", tx));

    let handles: Vec<_> = (1..=4u8)
        .map(|id| {
            let bus = bus.clone();
            thread::spawn(move || {
                let mut motor = DirectDriveMotor::new(bus, id).unwrap();
                for _ in 0..100 {
                    motor.set(id as f32).unwrap();
                }
                motor
            })
        })
        .collect();
    let _motors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    bus.flush().unwrap();
    let frames = drive_frames(sent.take());
    assert_eq!(frames.len(), 1);
    assert_eq!(
        frames[0].data,
        [0x00, 0x64, 0x00, 0xC8, 0x01, 0x2C, 0x01, 0x90]
    );
}

#[test]
fn motors_built_from_config() {
    let config = CommConfig::from_toml_str(
        r#"
[[direct_drive]]
bus = "can0"
id = 2

[[direct_drive]]
bus = "can1"
id = 6
mode = "position"

[quantization.current]
limit = 10.0
scale = 100.0
"#,
    )
    .unwrap();

    let tx0 = MockCanAdapter::new();
    let tx1 = MockCanAdapter::new();
    let (sent0, sent1) = (tx0.sent(), tx1.sent());
    let buses = [
        Arc::new(DirectDriveBus::new("can0", tx0)),
        Arc::new(DirectDriveBus::new("can1", tx1)),
    ];

    let mut motors = config.direct_drive_motors(&buses).unwrap();
    assert_eq!(motors[0].mode(), Some(Mode::Current));
    assert_eq!(motors[1].mode(), Some(Mode::Position));
    assert_eq!(sent0.take()[0].data[1], u8::from(Mode::Current));
    assert_eq!(sent1.take()[0].data[5], u8::from(Mode::Position));

    // 电流覆盖项：限幅 10 A
    motors[0].set(25.0).unwrap();
    flush_all(buses.iter().map(|bus| bus.as_ref())).unwrap();
    let frames = sent0.take();
    assert_eq!(frames.len(), 1);
    assert_eq!(&frames[0].data[2..4], &1000i16.to_be_bytes());

    // 同一序号不能重复创建
    assert!(config.direct_drive_motors(&buses).is_err());
    drop(motors);

    let missing = CommConfig::from_toml_str("[[direct_drive]]\nbus = \"can2\"\nid = 1\n").unwrap();
    assert!(matches!(
        missing.direct_drive_motors(&buses),
        Err(rm_driver::DriverError::Config(rm_driver::ConfigError::UnknownBus { .. }))
    ));
}

proptest! {
    /// 测试任意一组电机写入后，flush 帧数等于被触及的半区数，且第二次 flush 不发帧
    #[test]
    fn flush_writes_one_frame_per_touched_half(
        ids in prop::collection::btree_set(1u8..=8, 0..=8),
        value in -75.0f32..75.0,
    ) {
        let tx = MockCanAdapter::new();
        let sent = tx.sent();
        let bus = Arc::new(DirectDriveBus::new("can0", tx));

        for &id in &ids {
            bus.stage(id, (value * 100.0) as i16).unwrap();
        }
        let low = ids.iter().any(|&id| id <= 4);
        let high = ids.iter().any(|&id| id > 4);
        let expected = low as usize + high as usize;

        prop_assert_eq!(bus.flush().unwrap(), expected);
        prop_assert_eq!(sent.len(), expected);
        prop_assert_eq!(bus.flush().unwrap(), 0);
        prop_assert_eq!(sent.len(), expected);
    }
}
