// Keyboard teleop: WASD move, Z/X rotate, R/F speed, G field-relative, C calibrate, Q quit
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::{Duration, Instant};
use tracing::info;

use omni_motion::config::{TOPIC_CMD_BASE, TOPIC_CMD_CALIBRATE};
use omni_motion::messages::BaseCommand;

const SPEEDS: [f64; 3] = [0.05, 0.15, 0.3]; // m/s
const THETA_SPEEDS: [f64; 3] = [0.25, 0.75, 1.5]; // rad/s
const INPUT_TIMEOUT_MS: u64 = 100; // Reset velocities after this much time with no input

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let pub_cmd = session.declare_publisher(TOPIC_CMD_BASE).await?;
    let pub_calibrate = session.declare_publisher(TOPIC_CMD_CALIBRATE).await?;

    info!("Controls: WASD=move, Z/X=rotate, R/F=speed, G=field-relative, C=calibrate, Q=quit");
    info!("Speed: LOW");

    enable_raw_mode()?;
    let result = run_teleop(&pub_cmd, &pub_calibrate).await;
    disable_raw_mode()?;

    result
}

/// Direction and magnitude of a planar velocity, angle in degrees
fn polar(x_vel: f64, y_vel: f64) -> (f64, f64) {
    let speed = x_vel.hypot(y_vel);
    if speed == 0.0 {
        (0.0, 0.0)
    } else {
        (speed, y_vel.atan2(x_vel).to_degrees())
    }
}

async fn run_teleop(
    pub_cmd: &zenoh::pubsub::Publisher<'_>,
    pub_calibrate: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), BoxError> {
    let mut speed_idx: usize = 0;
    let mut relative = false;

    let mut x_vel = 0.0;
    let mut y_vel = 0.0;
    let mut theta_vel = 0.0;
    let mut last_movement_input = Instant::now();

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    KeyCode::Char('w') if pressed => {
                        x_vel = SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('s') if pressed => {
                        x_vel = -SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('a') if pressed => {
                        y_vel = SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('d') if pressed => {
                        y_vel = -SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }

                    KeyCode::Char('z') if pressed => {
                        theta_vel = THETA_SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('x') if pressed => {
                        theta_vel = -THETA_SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }

                    KeyCode::Char('r') if pressed => {
                        speed_idx = (speed_idx + 1).min(2);
                        print_speed(speed_idx);
                    }
                    KeyCode::Char('f') if pressed => {
                        speed_idx = speed_idx.saturating_sub(1);
                        print_speed(speed_idx);
                    }

                    KeyCode::Char('g') if kind == KeyEventKind::Press => {
                        relative = !relative;
                        info!("Field-relative: {}", relative);
                    }
                    KeyCode::Char('c') if kind == KeyEventKind::Press => {
                        pub_calibrate.put("").await?;
                        info!("Calibration requested");
                    }

                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                    _ => {}
                }
            }
        }

        if last_movement_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            x_vel = 0.0;
            y_vel = 0.0;
            theta_vel = 0.0;
        }

        // Always publish at ~50Hz so the runtime watchdog stays fed
        let (speed, angle) = polar(x_vel, y_vel);
        let cmd = BaseCommand {
            speed,
            angle,
            angular_speed: theta_vel,
            relative,
            sync_head: false,
            speed_k: 1.0,
        };
        pub_cmd.put(serde_json::to_string(&cmd)?).await?;
    }

    Ok(())
}

fn print_speed(idx: usize) {
    let label = ["LOW", "MED", "HIGH"][idx];
    info!("Speed: {}", label);
}
