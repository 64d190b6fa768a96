//! 本末电机总线演示（内存适配器，无需硬件）
//!
//! ```bash
//! cargo run -p rm-sdk --features mock --example bus_demo
//! ```

use rm_sdk::can::MockCanAdapter;
use rm_sdk::prelude::*;
use std::sync::Arc;

const CONFIG: &str = r#"
[[direct_drive]]
bus = "can0"
id = 1

[[direct_drive]]
bus = "can0"
id = 2

[[direct_drive]]
bus = "can0"
id = 3

[[direct_drive]]
bus = "can0"
id = 4

[[direct_drive]]
bus = "can0"
id = 5
mode = "speed"

[quantization.current]
limit = 20.0
scale = 100.0
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    rm_sdk::init_logger();

    let config = CommConfig::from_toml_str(CONFIG)?;
    let adapter = MockCanAdapter::new();
    let sent = adapter.sent();
    let mut rx = adapter.clone();
    let bus = Arc::new(DirectDriveBus::new("can0", adapter));

    let mut motors = config.direct_drive_motors(std::slice::from_ref(&bus))?;
    for motor in motors.iter_mut().take(4) {
        motor.enable(true)?;
    }

    for cycle in 0..3 {
        for (i, wheel) in motors.iter_mut().take(4).enumerate() {
            wheel.set(cycle as f32 + i as f32 * 0.5)?;
        }
        // 云台只在第一个周期给定，之后不再发送 0x33
        if cycle == 0 {
            motors[4].set(30.0)?;
        }
        let written = bus.flush()?;
        println!("cycle {}: {} drive frame(s)", cycle, written);
    }

    // 模拟 1 号电机和一个未挂载地址的反馈
    rx.queue_frame(BusFrame::new_standard(0x51, &[0x01, 0xF4, 0x00, 0x64, 0x10, 0x00, 0x00, 0xF0]));
    rx.queue_frame(BusFrame::new_standard(0x58, &[0; 8]));
    let claimed = dispatch_feedback(&mut rx, &mut motors)?;
    println!(
        "{} feedback frame(s) claimed; wheel 1: {:.1} rpm, {:.2} A, encoder {}, {:.1} V",
        claimed,
        motors[0].rpm(),
        motors[0].iq(),
        motors[0].encoder(),
        motors[0].bus_voltage()
    );

    for frame in sent.take() {
        println!("0x{:03X} {:02X?}", frame.id, frame.data_slice());
    }
    Ok(())
}
