use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;

pub fn run(seconds: u64, stall: Option<&str>) -> Result<()> {
    println!();
    println!(
        "{}",
        format!("🖥  {} simulator ({seconds}s)", platform::config::APP_NAME)
            .cyan()
            .bold()
    );
    if let Some(task) = stall {
        println!(
            "   {}",
            format!("{task} task will stall after 2s; expect a watchdog reset").dimmed()
        );
    }
    println!();

    let mut cmd = Command::new("cargo");
    cmd.args([
        "run",
        "-p",
        "firmware",
        "--example",
        "simulator",
        "--features",
        "emulator",
        "--",
        "--seconds",
    ])
    .arg(seconds.to_string());
    if let Some(task) = stall {
        cmd.args(["--stall", task]);
    }

    let status = cmd.status().context("Failed to start the simulator")?;
    if !status.success() {
        anyhow::bail!("Simulator exited with {status}");
    }
    Ok(())
}
