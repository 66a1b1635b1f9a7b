//! Scripted sender used by `dashframe demo`. Exercises every action
//! through the same client API a real script would use.

use std::thread;
use std::time::Duration;

use dashframe_client::{Client, dash_eprintln, dash_println, make_text};
use dashframe_proto::{Align, ChartSpec, GraphType, MarkerType, TextOptions};
use tracing::info;

use crate::terminal::error::CliError;

const DEADLINE: i64 = 1_700_000_000;

// The script installs the process-wide output capture.
#[cfg(test)]
pub(crate) static SCRIPT_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

pub fn run_script(client: &Client, step: Duration) -> Result<(), CliError> {
    let pause = || {
        if !step.is_zero() {
            thread::sleep(step);
        }
    };
    info!(target: "dashframe::demo", session = client.session_id(), "demo script started");

    client.big("title", "dashframe", &TextOptions::default().with_color("cyan"))?;
    client.text_with(
        "status",
        "warming up",
        &TextOptions::default().with_align(Align::Left),
    )?;
    pause();

    {
        let _capture = client.capture_output()?;
        dash_println!("demo: captured stdout lands in the console");
        dash_eprintln!("demo: so does stderr");
    }
    pause();

    client.color_text(
        "legend",
        vec![
            make_text("bold", true, false, false, false),
            make_text("underlined", false, true, false, false),
            make_text("italic", false, false, true, false),
            make_text("crossed out", false, false, false, true),
        ],
        &TextOptions::default().with_color("yellow"),
    )?;
    pause();

    let wave: Vec<(f64, f64)> = (0..=40)
        .map(|step| {
            let x = f64::from(step) / 4.0;
            (x, 5.0 + 4.0 * (x * 1.3).sin())
        })
        .collect();
    client.chart(
        "wave",
        ChartSpec::new(wave)
            .titled("sin", "a sine wave")
            .graph(GraphType::Line, MarkerType::Braille)
            .color("green")
            .x_axis("t", (0.0, 10.0), Vec::new())
            .y_axis("value", (0.0, 10.0), Vec::new()),
    )?;
    client.image("logo", "assets/logo.png")?;
    pause();

    client.todo_add("t1", "Buy milk", "alice", DEADLINE)?;
    client.todo_add("t2", "Call Bob", "bob", DEADLINE + 100_000)?;
    client.todo_add("t3", "Ship it", "carol", 0)?;
    pause();
    client.todo_done(0)?;
    pause();
    client.todo_del(1)?;
    client.text("status", "all steps sent")?;
    client.print("demo: done")?;
    pause();

    client.exit()?;
    Ok(())
}
