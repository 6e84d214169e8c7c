use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// Cortex-M3 target of the LM3S8962.
const TARGET: &str = "thumbv7m-none-eabi";

struct Step {
    label: &'static str,
    args: &'static [&'static str],
    /// A failing fatal step aborts the run; others only warn.
    fatal: bool,
    hint: Option<&'static str>,
}

const STEPS: &[Step] = &[
    Step {
        label: "platform crate (no_std, target)",
        args: &["check", "-p", "platform", "--target", TARGET, "--no-default-features"],
        fatal: true,
        hint: None,
    },
    Step {
        label: "firmware core (no_std, target, defmt)",
        args: &["check", "-p", "firmware", "--target", TARGET, "--features", "defmt"],
        fatal: true,
        hint: None,
    },
    Step {
        label: "simulator (host)",
        args: &["check", "-p", "firmware", "--features", "emulator", "--examples"],
        fatal: true,
        hint: None,
    },
    Step {
        label: "clippy lints",
        args: &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        fatal: false,
        hint: None,
    },
    Step {
        label: "code formatting",
        args: &["fmt", "--all", "--check"],
        fatal: false,
        hint: Some("Run 'cargo fmt --all' to fix"),
    },
];

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking builds...".cyan().bold());
    println!();

    let total_start = Instant::now();
    let mut warnings = 0usize;

    for step in STEPS {
        println!("{}", format!("  Checking {}...", step.label).cyan());
        let start = Instant::now();

        let output = Command::new("cargo")
            .args(step.args)
            .output()
            .with_context(|| format!("Failed to run cargo for {}", step.label))?;

        if output.status.success() {
            println!(
                "{}",
                format!(
                    "  ✓ {} passed in {:.2}s",
                    step.label,
                    start.elapsed().as_secs_f64()
                )
                .green()
            );
        } else if step.fatal {
            eprintln!("{}", format!("  ✗ {} failed", step.label).red().bold());
            eprintln!();
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            anyhow::bail!("{} failed", step.label);
        } else {
            warnings = warnings.saturating_add(1);
            eprintln!("{}", format!("  ⚠ {} reported issues", step.label).yellow().bold());
            match step.hint {
                Some(hint) => eprintln!("     {hint}"),
                None => eprintln!("{}", String::from_utf8_lossy(&output.stderr)),
            }
        }
        println!();
    }

    let summary = format!(
        "✓ All checks completed in {:.2}s ({} with warnings)",
        total_start.elapsed().as_secs_f64(),
        warnings
    );
    println!("{}", summary.green().bold());
    println!();

    Ok(())
}
