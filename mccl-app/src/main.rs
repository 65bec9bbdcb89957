//! MCCL (MicroController Command Link) Demo Application
//!
//! Wires print-handlers to the command dispatcher and drives an
//! encoded command script through an in-memory loopback link.

use clap::Parser;

use mccl_core::utils::bytes_to_hex;
use mccl_core::{Command, Payload};
use mccl_link::{send_command, CommandDispatcher, DropReason, FrameListener, MemoryChannel};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Speed value carried by the SetSpeed command
    #[arg(short, long, default_value_t = 0x2A)]
    speed: u8,

    /// Number of times the command script is replayed
    #[arg(short, long, default_value_t = 1)]
    count: u32,

    /// Enable verbose output (wire bytes per frame)
    #[arg(short, long)]
    verbose: bool,

    /// Print final link statistics as JSON
    #[arg(long)]
    stats_json: bool,
}

fn on_start(_payload: &Payload) {
    println!("motor: start");
}

fn on_stop(_payload: &Payload) {
    println!("motor: stop");
}

fn on_reverse(_payload: &Payload) {
    println!("motor: reverse");
}

fn on_set_speed(payload: &Payload) {
    if let Some(speed) = payload.as_byte() {
        println!("motor: speed = 0x{speed:02X}");
    }
}

fn on_frame_drop(reason: DropReason) {
    println!("link: frame dropped ({reason:?})");
}

fn main() {
    let args = Args::parse();

    println!("MCCL (MicroController Command Link) Demo");
    println!("========================================");

    // 装配：显式注册表，启动时构造一次
    let mut dispatcher = CommandDispatcher::new();
    dispatcher.register(Command::Start, on_start);
    dispatcher.register(Command::Stop, on_stop);
    dispatcher.register(Command::Reverse, on_reverse);
    dispatcher.register(Command::SetSpeed, on_set_speed);

    let mut listener = FrameListener::new();
    listener.set_drop_callback(on_frame_drop);

    let mut channel = MemoryChannel::new();

    // 命令脚本：启动 → 调速 → 反转 → 停止
    let script = [
        (Command::Start, Payload::None),
        (Command::SetSpeed, Payload::Byte(args.speed)),
        (Command::Reverse, Payload::None),
        (Command::Stop, Payload::None),
    ];

    for round in 0..args.count {
        if args.count > 1 {
            println!("--- round {} ---", round + 1);
        }

        for (cmd, payload) in &script {
            if let Err(err) = send_command(&mut channel, *cmd, payload) {
                eprintln!("send failed: {err}");
                std::process::exit(1);
            }
        }

        // 回环：发送端写出的字节就是接收端的输入
        let wire_bytes = channel.take_sent();
        if args.verbose {
            println!("wire: {}", bytes_to_hex(&wire_bytes));
        }
        if channel.feed(&wire_bytes).is_err() {
            eprintln!("loopback feed failed: channel full");
            std::process::exit(1);
        }

        let frames = listener.pump(&mut channel, &dispatcher);
        if args.verbose {
            println!("frames dispatched: {frames}");
        }
    }

    let stats = listener.stats();
    if args.stats_json {
        match serde_json::to_string_pretty(stats) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("stats serialization failed: {err}"),
        }
    } else {
        println!("link stats: {stats:?}");
    }
}
