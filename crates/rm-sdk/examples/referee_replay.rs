//! 裁判系统抓包回放
//!
//! 把十六进制格式的串口抓包逐字节喂给裁判系统链路，打印解码结果和链路指标。
//!
//! ```bash
//! cargo run -p rm-sdk --example referee_replay -- capture.hex --revision v1.6.4
//! # 不给出文件时回放内置的演示数据，--noise 在帧之间插入随机字节
//! RUST_LOG=debug cargo run -p rm-sdk --example referee_replay -- --noise 16
//! ```

use clap::Parser;
use rand::Rng;
use rm_sdk::prelude::*;
use rm_sdk::protocol::referee::{cmd, encode_frame};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "referee_replay", about = "回放裁判系统串口抓包")]
struct Args {
    /// 十六进制抓包文件（忽略空白和换行）
    input: Option<PathBuf>,

    /// 协议版本：v1.6.4 或 v1.7.0
    #[arg(long, default_value = "v1.7.0")]
    revision: RefereeRevision,

    /// 通信配置文件（给出时以其中的协议版本为准）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 每帧之前插入的随机噪声字节数
    #[arg(long, default_value_t = 0)]
    noise: usize,
}

/// 内置演示数据：比赛状态、机器人状态、功率热量各一帧
fn demo_frames() -> Result<Vec<Vec<u8>>, ProtocolError> {
    let mut status = [0u8; 11];
    status[0] = 0x41;
    status[1..3].copy_from_slice(&180u16.to_le_bytes());

    let mut robot = [0u8; 13];
    robot[0] = 3;
    robot[1] = 2;
    robot[2..4].copy_from_slice(&350u16.to_le_bytes());
    robot[4..6].copy_from_slice(&400u16.to_le_bytes());

    let mut power = [0u8; 16];
    power[0..2].copy_from_slice(&24_000u16.to_le_bytes());
    power[4..8].copy_from_slice(&45.5f32.to_le_bytes());
    power[8..10].copy_from_slice(&60u16.to_le_bytes());

    Ok(vec![
        encode_frame(0, cmd::GAME_STATUS, &status)?,
        encode_frame(1, cmd::ROBOT_STATUS, &robot)?,
        encode_frame(2, cmd::POWER_HEAT_DATA, &power)?,
    ])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    rm_sdk::init_logger();
    let args = Args::parse();

    let revision = match &args.config {
        Some(path) => CommConfig::load(path)?.referee.revision,
        None => args.revision,
    };

    let frames = match &args.input {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let compact: String = text.split_whitespace().collect();
            vec![hex::decode(compact)?]
        },
        None => demo_frames()?,
    };

    let mut link = AnyRefereeLink::new(revision);
    let last = Arc::new(rm_sdk::driver::LastFrame::default());
    link.add_hook(last.clone());

    let mut rng = rand::thread_rng();
    for frame in &frames {
        let noise: Vec<u8> = (0..args.noise).map(|_| rng.r#gen()).collect();
        link.feed(&noise);
        link.feed(frame);
    }

    println!("Revision: {}", revision.name());
    println!("Last frame: {:?}", last.get());
    println!("Game status: {:?}", link.game_status());
    println!("Robot status: {:?}", link.robot_status());
    println!("Power/heat: {:?}", link.power_heat_data());

    let metrics = link.metrics().snapshot();
    println!("Metrics: {:?}", metrics);
    println!("Drop rate: {:.1}%", metrics.drop_rate());
    Ok(())
}
