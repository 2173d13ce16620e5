//! Print gaze samples arriving on UDP.
//!
//! Usage: cargo run --example listen [port]
//! Press Ctrl+C to stop.

use std::time::{Duration, Instant};

fn main() {
    env_logger::init();

    let port = std::env::args()
        .nth(1)
        .and_then(|p| p.parse().ok())
        .unwrap_or(gazelink::protocol::DEFAULT_PORT);

    let listener = gazelink::GazeListener::new(gazelink::ListenerConfig::with_port(port));
    let samples = listener.subscribe_channel(256);

    if let Err(e) = listener.start() {
        eprintln!("Failed to start listener on port {}: {}", port, e);
        std::process::exit(1);
    }

    println!(
        "Listening for gaze datagrams on {} (Ctrl+C to stop)...",
        listener.local_addr().map(|a| a.to_string()).unwrap_or_default()
    );

    let start = Instant::now();
    let mut count: u64 = 0;
    let mut last_report = Instant::now();

    loop {
        match samples.recv_timeout(Duration::from_secs(2)) {
            Ok(sample) => {
                count += 1;

                // Print every ~30th sample to avoid flooding the terminal
                if count % 30 == 1 {
                    println!(
                        "ts={:<16.3}  gaze=[{:.3}, {:.3}]  screen=[{:7.1}, {:7.1}]",
                        sample.timestamp,
                        sample.gaze_x,
                        sample.gaze_y,
                        sample.screen_x,
                        sample.screen_y,
                    );
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                eprintln!("No gaze datagram for 2s");
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }

        let now = Instant::now();
        if now.duration_since(last_report) >= Duration::from_secs(3) {
            let elapsed = start.elapsed().as_secs_f64();
            let stats = listener.stats();
            println!(
                "--- {} samples in {:.1}s ({:.1} Hz), {} rejected, {} io errors ---",
                count,
                elapsed,
                count as f64 / elapsed,
                stats.rejected,
                stats.io_errors,
            );
            last_report = now;
        }
    }

    listener.stop();
}
