// Keyboard "gamepad": WASD left stick, IJKL right stick, R/F sensitivity,
// 0/1/2 disabled/teleop/autonomous, Q quit
//
// Usage: cargo run --example gamepad_publisher
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use drive_subsystem::config::{hid_topic, TOPIC_MODE};
use drive_subsystem::drive::teleop::gamepad;
use drive_subsystem::messages::{HidState, RobotMode};
use std::time::{Duration, Instant};
use tracing::info;

const DEFLECTIONS: [f64; 3] = [0.3, 0.6, 1.0]; // stick deflection per level
const INPUT_TIMEOUT_MS: u64 = 100; // Center sticks after this much time with no input
const AXIS_COUNT: usize = 6;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let pub_hid = session.declare_publisher(hid_topic(0)).await?;
    let pub_mode = session.declare_publisher(TOPIC_MODE).await?;

    info!("Controls: WASD=left stick, IJKL=right stick, R/F=sensitivity, 0/1/2=mode, Q=quit");
    info!("Sensitivity: LOW");

    enable_raw_mode()?;
    let result = run_gamepad(&pub_hid, &pub_mode).await;
    disable_raw_mode()?;

    result
}

async fn run_gamepad(
    pub_hid: &zenoh::pubsub::Publisher<'_>,
    pub_mode: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut level: usize = 0;
    let mut axes = [0.0f64; AXIS_COUNT];
    let mut last_stick_input = Instant::now();

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                let deflection = DEFLECTIONS[level];

                // Stick keys: (axis, value)
                let stick = match code {
                    KeyCode::Char('w') => Some((gamepad::AXIS_LEFT_Y, deflection)),
                    KeyCode::Char('s') => Some((gamepad::AXIS_LEFT_Y, -deflection)),
                    KeyCode::Char('a') => Some((gamepad::AXIS_LEFT_X, -deflection)),
                    KeyCode::Char('d') => Some((gamepad::AXIS_LEFT_X, deflection)),
                    KeyCode::Char('i') => Some((gamepad::AXIS_RIGHT_Y, deflection)),
                    KeyCode::Char('k') => Some((gamepad::AXIS_RIGHT_Y, -deflection)),
                    KeyCode::Char('j') => Some((gamepad::AXIS_RIGHT_X, -deflection)),
                    KeyCode::Char('l') => Some((gamepad::AXIS_RIGHT_X, deflection)),
                    _ => None,
                };

                if let (Some((axis, value)), true) = (stick, pressed) {
                    axes[axis] = value;
                    last_stick_input = Instant::now();
                }

                match code {
                    KeyCode::Char('r') if pressed => {
                        level = (level + 1).min(DEFLECTIONS.len() - 1);
                        print_level(level);
                    }
                    KeyCode::Char('f') if pressed => {
                        level = level.saturating_sub(1);
                        print_level(level);
                    }

                    // Mode
                    KeyCode::Char('0') if pressed => publish_mode(pub_mode, RobotMode::Disabled).await?,
                    KeyCode::Char('1') if pressed => publish_mode(pub_mode, RobotMode::Teleop).await?,
                    KeyCode::Char('2') if pressed => publish_mode(pub_mode, RobotMode::Autonomous).await?,

                    // Quit
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                    _ => {}
                }
            }
        }

        // Center sticks if no stick input for INPUT_TIMEOUT_MS
        if last_stick_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            axes = [0.0; AXIS_COUNT];
        }

        // Always publish at ~50Hz
        let state = HidState { axes: axes.to_vec() };
        pub_hid.put(serde_json::to_string(&state)?).await?;
    }

    publish_mode(pub_mode, RobotMode::Disabled).await
}

async fn publish_mode(
    publisher: &zenoh::pubsub::Publisher<'_>,
    mode: RobotMode,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Mode: {:?}", mode);
    publisher.put(serde_json::to_string(&mode)?).await?;
    Ok(())
}

fn print_level(idx: usize) {
    let label = ["LOW", "MED", "HIGH"][idx];
    info!("Sensitivity: {}", label);
}
