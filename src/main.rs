//! impact-rollback: headless demo runner
//!
//! Drives the target gallery at the fixed tick rate and fires shots whose
//! detection arrives `--latency-ms` late. Each shot is resolved by rollback
//! and compared against a naive check on the live state.
//!
//! Usage:
//!   impact-rollback --seed 12345 --frames 1200 --latency-ms 120
//!   impact-rollback --config rollback.json --shot-every 15 --policy reject

use std::env;

use anyhow::{Context, Result};
use serde::Serialize;

use impact_rollback::config::RollbackConfig;
use impact_rollback::rollback::{DiagnosticCode, PendingHit, RollbackManager};
use impact_rollback::sim::{GalleryStepper, GameState, TickInput, apply_hit, check_hit};

#[derive(Debug, Default, Serialize)]
struct RunReport {
    seed: u64,
    frames: u64,
    latency_ms: f64,
    shots: u32,
    rollback_hits: u32,
    naive_hits: u32,
    stale: u32,
    failed: u32,
    frames_replayed: u64,
    effects_delivered: usize,
    effects_suppressed: usize,
    final_score: u64,
    history: Option<impact_rollback::rollback::HistoryStats>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let frames = parse_arg(&args, "--frames", 1200u64);
    let latency_ms = parse_arg(&args, "--latency-ms", 120.0f64);
    let shot_every = parse_arg(&args, "--shot-every", 20u64).max(1);
    let config_path = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].as_str());

    let mut config = match config_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {path}"))?;
            RollbackConfig::from_json_str(&json)?
        }
        None => RollbackConfig::default(),
    };
    if let Some(policy) = args.windows(2).find(|w| w[0] == "--policy") {
        config.concurrent_policy = policy[1].parse()?;
    }

    let mut mgr = RollbackManager::new(config, GalleryStepper, GameState::new(seed))?;
    let mut report = RunReport {
        seed,
        frames,
        latency_ms,
        ..Default::default()
    };

    for _ in 0..frames {
        let input = TickInput {
            spawn_burst: mgr.frame() % 600 == 0,
            ..Default::default()
        };
        mgr.advance_fixed(input)?;

        if mgr.frame() % shot_every != 0 {
            continue;
        }

        // The projectile struck where a target was `latency_ms` ago
        let now = mgr.sim_time();
        let shot = PendingHit::new(0.0, 0.0, now, latency_ms);
        let Some(aim) = mgr
            .history()
            .find_at_or_before(shot.adjusted_time())
            .and_then(|s| s.state().targets.first().map(|t| t.pos))
        else {
            continue;
        };
        let shot = PendingHit {
            x: aim.x,
            y: aim.y,
            ..shot
        };

        report.shots += 1;
        if check_hit(mgr.live_state(), aim).hit {
            report.naive_hits += 1;
        }

        if let Err(e) = mgr.submit(shot) {
            log::warn!("Shot dropped: {e}");
            continue;
        }
        for result in mgr.process_pending(apply_hit) {
            report.frames_replayed += u64::from(result.frames_replayed);
            report.effects_suppressed += result.effects_suppressed;
            match result.hit_outcome.diagnostic {
                DiagnosticCode::ConfirmedHit if result.success => report.rollback_hits += 1,
                DiagnosticCode::StaleEvent => report.stale += 1,
                _ if !result.success => report.failed += 1,
                _ => {}
            }
            log::debug!("{}", serde_json::to_string(&result)?);
        }

        report.effects_delivered += mgr.drain_effects().len();
    }

    report.effects_delivered += mgr.drain_effects().len();
    report.final_score = mgr.live_state().score;
    report.history = Some(mgr.get_history_stats());

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
