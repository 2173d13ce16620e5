//! Stream synthetic gaze samples tracing a circle on a 1920x1080 screen.
//!
//! Usage: cargo run --example send [host:port] [hz]

use gazelink::{GazeSample, GazeSender};
use std::net::SocketAddr;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const SCREEN_W: f32 = 1920.0;
const SCREEN_H: f32 = 1080.0;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let target: SocketAddr = args
        .next()
        .and_then(|a| a.parse().ok())
        .unwrap_or_else(|| "127.0.0.1:5005".parse().unwrap());
    let hz: u32 = args.next().and_then(|a| a.parse().ok()).unwrap_or(120);

    let sender = match GazeSender::new(target) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to create sender: {}", e);
            std::process::exit(1);
        }
    };

    println!("Sending {} Hz to {} (Ctrl+C to stop)...", hz, target);

    let period = Duration::from_secs(1) / hz.max(1);
    let start = Instant::now();
    let mut sent: u64 = 0;

    loop {
        let t = start.elapsed().as_secs_f32();
        let gaze_x = 0.5 + 0.3 * t.cos();
        let gaze_y = 0.5 + 0.3 * t.sin();
        let timestamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as f64)
            .unwrap_or(0.0);

        let sample = GazeSample::new(
            timestamp_ns,
            gaze_x,
            gaze_y,
            gaze_x * SCREEN_W,
            gaze_y * SCREEN_H,
        );
        if let Err(e) = sender.send(&sample) {
            eprintln!("Send error: {}", e);
        }

        sent += 1;
        if sent % u64::from(hz.max(1)) == 0 {
            println!("sent {} samples", sent);
        }
        std::thread::sleep(period);
    }
}
