//! Environment readiness check: can this machine run a scrape?
//!
//! Reports the Chromium binary a run would use, whether it starts headless,
//! where run artifacts go, and the resolved configuration.

use crate::cli::output::{self, Styled};
use crate::config::{harvest_home, ScrapeConfig};
use crate::renderer::chromium::find_chromium;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Run the doctor. Returns whether a live scrape can run.
pub fn run(config: &ScrapeConfig, json: bool) -> Result<bool> {
    let chromium_path = find_chromium(config.chromium_path.as_ref());
    let chromium_version = chromium_path.as_deref().and_then(get_chromium_version);
    let home = harvest_home();

    if json {
        output::print_json(&serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "chromium_path": chromium_path.as_ref().map(|p| p.display().to_string()),
            "chromium_version": chromium_version,
            "harvest_home": home.display().to_string(),
            "base_url": config.base_url,
            "concurrency": config.concurrency,
            "nav_timeout_ms": config.nav_timeout_ms,
            "settle_ms": config.settle_ms,
            "ordinals": config.ordinals,
        }));
        return Ok(chromium_path.is_some());
    }

    let s = Styled::new();
    let mut ready = true;
    output::print_header(&s);

    output::print_section(&s, "Browser");
    match &chromium_path {
        Some(path) => {
            let version = chromium_version.as_deref().unwrap_or("unknown version");
            output::print_check(
                s.ok_sym(),
                "Chromium:",
                &format!("{version} at {}", path.display()),
            );
            match test_headless_launch(path, config) {
                Ok(ms) => output::print_check(
                    s.ok_sym(),
                    "Headless test:",
                    &format!("launched and closed in {ms}ms"),
                ),
                Err(e) => {
                    output::print_check(s.fail_sym(), "Headless test:", &format!("FAILED: {e}"));
                    if e.to_string().contains("libnss") {
                        output::print_detail(
                            "Fix (Ubuntu/Debian): sudo apt install libnss3 libatk1.0-0 libatk-bridge2.0-0",
                        );
                    }
                    ready = false;
                }
            }
        }
        None => {
            output::print_check(s.fail_sym(), "Chromium:", "not found");
            output::print_detail("Install Chrome/Chromium or set FAQ_HARVEST_CHROMIUM_PATH.");
            output::print_detail("Offline replays (scrape --snapshots DIR) need no browser.");
            ready = false;
        }
    }
    eprintln!();

    output::print_section(&s, "Configuration");
    output::print_check(s.ok_sym(), "Base URL:", &config.base_url);
    output::print_check(s.ok_sym(), "Entry page:", &config.entry_url());
    output::print_check(
        s.ok_sym(),
        "Concurrency:",
        &format!("{} page(s)", config.concurrency),
    );
    output::print_check(
        s.ok_sym(),
        "Timeouts:",
        &format!(
            "navigation {}ms, ready {}ms, settle {}ms",
            config.nav_timeout_ms, config.ready_timeout_ms, config.settle_ms
        ),
    );
    output::print_check(s.ok_sym(), "Ordinals:", &config.ordinals.to_string());
    let home_sym = if is_writable_dir(&home) {
        s.ok_sym()
    } else {
        s.warn_sym()
    };
    output::print_check(home_sym, "Home:", &home.display().to_string());

    if ready {
        output::print_status(&s, &s.green("READY"), "live scrapes can run");
    } else {
        output::print_status(&s, &s.red("NOT READY"), "see failures above");
    }
    Ok(ready)
}

/// Get Chromium version string.
fn get_chromium_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("--version").output().ok()?;
    if output.status.success() {
        let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Some(raw.replace("Google Chrome ", "").replace("Chromium ", ""))
    } else {
        None
    }
}

/// Launch Chromium headless with the configured flags and close it.
fn test_headless_launch(chromium_path: &PathBuf, config: &ScrapeConfig) -> Result<u64> {
    let start = std::time::Instant::now();
    let output = Command::new(chromium_path)
        .args(["--headless", "--dump-dom", "about:blank"])
        .args(&config.chromium_args)
        .output()
        .map_err(|e| anyhow::anyhow!("failed to launch: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow::anyhow!(
            "{}",
            stderr.lines().next().unwrap_or("unknown error")
        ));
    }

    Ok(start.elapsed().as_millis() as u64)
}

/// Whether `dir` exists (or can be created) and accepts files.
fn is_writable_dir(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(".doctor-probe");
    let ok = std::fs::write(&probe, b"ok").is_ok();
    let _ = std::fs::remove_file(&probe);
    ok
}
