use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;

/// Library crates with API docs. xtask itself is left out.
const DOC_CRATES: &[&str] = &["platform", "firmware"];

/// `std` brings in `platform::mocks` and the tracing backend, so the host
/// test doubles are documented alongside the traits they implement.
const DOC_FEATURES: &str = "platform/std,firmware/std";

pub fn run(open: bool, private: bool) -> Result<()> {
    println!();
    println!("{}", "📚 Building API docs...".cyan().bold());
    println!();

    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.args(["doc", "--no-deps", "--features", DOC_FEATURES]);
    for krate in DOC_CRATES {
        cmd.args(["-p", krate]);
    }
    if private {
        cmd.arg("--document-private-items");
    }
    if open {
        cmd.arg("--open");
    }

    let output = cmd.output().context("Failed to run cargo doc")?;
    if !output.status.success() {
        eprintln!("{}", "  ✗ cargo doc failed".red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        anyhow::bail!("Documentation build failed");
    }

    // rustdoc reports broken intra-doc links as warnings; surface them.
    let warnings = String::from_utf8_lossy(&output.stderr)
        .lines()
        .filter(|l| l.starts_with("warning:") && !l.contains("generated"))
        .count();

    println!(
        "{}",
        format!("  ✓ Docs built in {:.2}s", start.elapsed().as_secs_f64()).green()
    );
    if warnings > 0 {
        eprintln!(
            "{}",
            format!("  ⚠ {warnings} rustdoc warnings, rerun 'cargo doc' to see them")
                .yellow()
        );
    }
    println!();

    let doc_root = target_dir().join("doc");
    for krate in DOC_CRATES {
        let index = doc_root.join(krate).join("index.html");
        if index.is_file() {
            println!("   {krate:<9} {}", index.display().to_string().dimmed());
        } else {
            eprintln!("   {krate:<9} {}", "index.html missing".red());
        }
    }
    println!();

    Ok(())
}

fn target_dir() -> PathBuf {
    std::env::var_os("CARGO_TARGET_DIR").map_or_else(|| PathBuf::from("target"), PathBuf::from)
}
