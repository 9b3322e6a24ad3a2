use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::{GamesConfig, RuntimeConfig};
use crate::engine;
use crate::engine::rng::ChaChaSource;
use crate::persistence::{self, PlayerProfile};
use crate::server::{self, ServerState, protocol::SessionSnapshot};
use crate::session::{
    CareActionKind, Difficulty, Direction, GameKind, GameSession, Mode, SessionEvent,
    SessionPhase,
};

/// Run the session server: tick loop, WebSocket streaming, profile saves.
pub async fn run_server(config: &RuntimeConfig, games: &GamesConfig) -> Result<(), String> {
    let profile_dir = Path::new(&config.profile_directory);
    let mut profile = persistence::load_or_default(profile_dir);
    eprintln!(
        "Profile loaded: {} session(s) on record",
        profile.games_played()
    );

    let default_game = GameKind::from_slug(&config.default_game)
        .ok_or_else(|| format!("Unknown default game '{}'", config.default_game))?;
    let mut session = GameSession::new(default_game, Mode::default(), Difficulty::default());
    let mut rng = match config.seed {
        Some(seed) => ChaChaSource::seeded(seed),
        None => ChaChaSource::from_entropy(),
    };

    // 1. Initial frame and server state
    let snapshot_json = frame_json(&session, games);
    let (state, mut input_rx) = ServerState::new(snapshot_json);
    let state = Arc::new(state);

    // 2. Start WebSocket server in background
    let addr: SocketAddr = format!("{}:{}", config.websocket_bind, config.websocket_port)
        .parse()
        .map_err(|e| format!("Invalid bind address: {}", e))?;
    let server_state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = server::start_server(server_state, addr).await {
            eprintln!("Server error: {}", e);
        }
    });

    // 3. Set up shutdown signal
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    // 4. Run the session loop
    let tick_interval_ms = (1000.0 / config.tick_rate_hz) as u64;
    let tps = config.ticks_per_second();
    eprintln!(
        "Session loop running ({}Hz, default game {})",
        config.tick_rate_hz,
        default_game.slug()
    );

    loop {
        let tick_start = std::time::Instant::now();

        // Apply queued inputs before this tick's movement
        while let Ok(event) = input_rx.try_recv() {
            match engine::apply_event(&mut session, games, event, &mut rng) {
                Ok(Some(_)) => record_terminal(&mut profile, &session, profile_dir, config),
                Ok(None) => {}
                Err(e) => {
                    info!(error = %e, "Action rejected");
                    let notice = serde_json::json!({
                        "message_type": "Notice",
                        "text": e.to_string(),
                    });
                    let _ = state.frame_sender.send(notice.to_string());
                }
            }
        }

        let params = games.params(session.game);
        let result = engine::execute_tick(&mut session, params, tps, &mut rng);
        if result.completed.is_some() {
            record_terminal(&mut profile, &session, profile_dir, config);
        }

        let tick_ms = tick_start.elapsed().as_secs_f32() * 1000.0;
        state
            .on_tick(
                frame_json(&session, games),
                &result.statistics,
                session.game.slug(),
                &session.id.to_string(),
                profile.games_played(),
                tick_ms,
            )
            .await;

        // Rate limiting: sleep remaining time to hit the target tick rate
        let elapsed = tick_start.elapsed();
        let target = std::time::Duration::from_millis(tick_interval_ms);
        if elapsed < target {
            tokio::select! {
                _ = tokio::time::sleep(target - elapsed) => {}
                _ = &mut shutdown => {
                    eprintln!("\nShutdown signal received");
                    break;
                }
            }
        } else {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    eprintln!("\nShutdown signal received");
                    break;
                }
                else => {}
            }
        }
    }

    // Graceful shutdown: save the profile
    match persistence::save_profile(&profile, profile_dir) {
        Ok(path) => eprintln!("Profile saved: {}", path.display()),
        Err(e) => eprintln!("Warning: profile save failed: {}", e),
    }
    Ok(())
}

fn frame_json(session: &GameSession, games: &GamesConfig) -> String {
    serde_json::to_string(&SessionSnapshot::from_session(
        session,
        games.params(session.game),
    ))
    .unwrap_or_else(|_| "{}".to_string())
}

fn record_terminal(
    profile: &mut PlayerProfile,
    session: &GameSession,
    profile_dir: &Path,
    config: &RuntimeConfig,
) {
    profile.record_session(session);
    match persistence::save_profile(profile, profile_dir) {
        Ok(_) => {
            if let Err(e) =
                persistence::prune_profiles(profile_dir, config.max_profiles as usize)
            {
                eprintln!("Warning: profile pruning failed: {}", e);
            }
        }
        Err(e) => eprintln!("Warning: profile save failed: {}", e),
    }
}

/// Run one session headlessly with an autoplay policy and print a summary.
/// Deterministic for a fixed seed.
pub fn simulate(
    config: &RuntimeConfig,
    games: &GamesConfig,
    slug: &str,
    seed: Option<u64>,
    max_ticks: u64,
    policy: &str,
) -> Result<(), String> {
    let game = GameKind::from_slug(slug).ok_or_else(|| {
        format!(
            "Unknown game '{}'. Valid games: {}",
            slug,
            GameKind::all()
                .iter()
                .map(|k| k.slug())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })?;
    if !matches!(policy, "greedy" | "idle") {
        return Err(format!(
            "Unknown policy '{}'. Valid policies: greedy, idle",
            policy
        ));
    }

    let seed = seed.or(config.seed).unwrap_or(42);
    let mut rng = ChaChaSource::seeded(seed);
    let mut session = GameSession::new(game, Mode::default(), Difficulty::default());
    let params = games.params(game);
    engine::start_session(&mut session, params, &mut rng);
    let tps = config.ticks_per_second();

    println!(
        "Simulating {} (seed {}, policy {}, up to {} ticks)",
        game.slug(),
        seed,
        policy,
        max_ticks
    );

    let mut outcome = None;
    let mut actions_taken = 0u64;
    'run: for _ in 0..max_ticks {
        if policy == "greedy" {
            for event in greedy_policy(&session, games) {
                actions_taken += 1;
                match engine::apply_event(&mut session, games, event, &mut rng) {
                    Ok(Some(o)) => {
                        outcome = Some(o);
                        break 'run;
                    }
                    Ok(None) => {}
                    Err(_) => {} // rejected actions just cost the attempt
                }
            }
        }
        let result = engine::execute_tick(&mut session, params, tps, &mut rng);
        if let Some(o) = result.completed {
            outcome = Some(o);
            break;
        }
    }

    println!();
    println!("=== Session summary ===");
    println!(
        "Outcome: {}",
        outcome.map_or("still running".to_string(), |o| format!("{:?}", o))
    );
    println!("Score: {}", session.score);
    println!("Best streak: {}", session.best_streak);
    println!("Ticks: {}", session.tick_count);
    println!("Level: {}", session.level);
    println!("Items resolved: {}", session.items_resolved);
    println!("Actions taken: {}", actions_taken);
    if let Some(care) = &session.care {
        println!(
            "Plant: health {:.0}, stage {}, day {}",
            care.health, care.stage, care.day
        );
    }
    Ok(())
}

/// Trivial autoplay: take the locally best obvious action each tick.
fn greedy_policy(session: &GameSession, games: &GamesConfig) -> Vec<SessionEvent> {
    if session.phase != SessionPhase::Active {
        return Vec::new();
    }
    let params = games.params(session.game);
    let mut events = Vec::new();

    match session.game {
        GameKind::BalloonPop => {
            // Pop the biggest positive-scoring entity on the field
            let best = session
                .live_entities()
                .filter(|e| params.kinds[e.kind].points > 0)
                .max_by(|a, b| a.size.partial_cmp(&b.size).unwrap_or(std::cmp::Ordering::Equal));
            if let Some(e) = best {
                events.push(SessionEvent::ActivateEntity { id: e.id });
            }
        }
        GameKind::PurifierCatch => {
            // Chase the lowest positive item, flee from negative ones below it
            let target = session
                .live_entities()
                .filter(|e| params.kinds[e.kind].points > 0)
                .max_by(|a, b| a.pos.y.partial_cmp(&b.pos.y).unwrap_or(std::cmp::Ordering::Equal));
            if let Some(e) = target {
                let center = session.collector_pos + params.collector_width / 2.0;
                if e.pos.x < center - params.collector_step / 2.0 {
                    events.push(SessionEvent::MoveCollector {
                        direction: Direction::Left,
                    });
                } else if e.pos.x > center + params.collector_step / 2.0 {
                    events.push(SessionEvent::MoveCollector {
                        direction: Direction::Right,
                    });
                }
            }
        }
        GameKind::RiverCleanup => {
            if let Some(e) = session.live_entities().next() {
                if let Some(bin) = params.kinds[e.kind].bin {
                    events.push(SessionEvent::SortEntity {
                        id: Some(e.id),
                        bin,
                    });
                }
            }
        }
        GameKind::WasteSort => {
            if let Some(e) = session.current_item() {
                if let Some(bin) = params.kinds[e.kind].bin {
                    events.push(SessionEvent::SortEntity { id: None, bin });
                }
            }
        }
        GameKind::PlantCare => {
            if let (Some(care), Some(cp)) = (&session.care, &params.care) {
                if care.has_pests && session.score >= cp.pest_cost {
                    events.push(SessionEvent::Care {
                        action: CareActionKind::PestControl,
                    });
                } else if care.has_weeds && session.score >= cp.weed_cost {
                    events.push(SessionEvent::Care {
                        action: CareActionKind::RemoveWeeds,
                    });
                } else if care.soil < 40.0 && session.score >= cp.fertilize_cost {
                    events.push(SessionEvent::Care {
                        action: CareActionKind::Fertilize,
                    });
                } else if care.water <= care.sunlight && care.water < 70.0 {
                    events.push(SessionEvent::Care {
                        action: CareActionKind::Water,
                    });
                } else if care.sunlight < 70.0 {
                    events.push(SessionEvent::Care {
                        action: CareActionKind::Sunlight,
                    });
                }
            }
        }
        GameKind::AirMonitor => {
            if session.actions_remaining != Some(0) {
                let worst = session
                    .live_entities()
                    .filter(|e| !params.kinds[e.kind].safe && e.value > params.target_level)
                    .max_by(|a, b| {
                        a.value.partial_cmp(&b.value).unwrap_or(std::cmp::Ordering::Equal)
                    });
                if let Some(e) = worst {
                    events.push(SessionEvent::ActivateEntity { id: e.id });
                }
            }
        }
    }

    events
}

/// Print the persisted profile, or clear it with `--reset`.
pub fn stats(config: &RuntimeConfig, reset: bool) -> Result<(), String> {
    let dir = Path::new(&config.profile_directory);

    if reset {
        let profiles = persistence::list_profiles(dir)
            .map_err(|e| format!("Failed to list profiles: {}", e))?;
        for meta in &profiles {
            std::fs::remove_file(&meta.path)
                .map_err(|e| format!("Cannot remove {}: {}", meta.path.display(), e))?;
        }
        println!("Removed {} profile file(s)", profiles.len());
        return Ok(());
    }

    let profile = persistence::load_or_default(dir);
    if profile.records.is_empty() {
        println!("No sessions on record. Play one with: enviroquest run");
        return Ok(());
    }

    println!(
        "{:<16} {:>7} {:>10} {:>7} {:>6} {:>7}",
        "Game", "Played", "High", "Streak", "Wins", "Losses"
    );
    println!("{}", "-".repeat(58));
    for (slug, record) in &profile.records {
        println!(
            "{:<16} {:>7} {:>10} {:>7} {:>6} {:>7}",
            slug,
            record.games_played,
            record.high_score,
            record.best_streak,
            record.wins,
            record.losses
        );
    }
    println!("\n{} session(s) total", profile.total_sessions);
    Ok(())
}

/// List the game roster and the key numbers of each parameter table.
pub fn games_list(games: &GamesConfig) {
    println!(
        "{:<16} {:>6} {:>7} {:>6} {:>9} {:<8}",
        "Game", "Kinds", "Timer", "Win", "Spawn", "Extras"
    );
    println!("{}", "-".repeat(58));
    for &kind in GameKind::all() {
        let params = games.params(kind);
        let timer = params
            .initial_time
            .map_or("-".to_string(), |t| format!("{}s", t));
        let win = params
            .win_score
            .map_or("-".to_string(), |w| w.to_string());
        let extras = if params.care.is_some() {
            "care"
        } else if params.action_budget.is_some() {
            "budget"
        } else if params.auto_advance_levels {
            "levels"
        } else {
            ""
        };
        println!(
            "{:<16} {:>6} {:>7} {:>6} {:>9} {:<8}",
            kind.slug(),
            params.kinds.len(),
            timer,
            win,
            params.spawn.mode,
            extras
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GamesConfig;
    use crate::engine::rng::ScriptedSource;

    fn started(game: GameKind) -> (GameSession, GamesConfig) {
        let games = GamesConfig::builtin();
        let mut session = GameSession::new(game, Mode::Classic, Difficulty::Mixed);
        let mut rng = ScriptedSource::new(vec![0.5]);
        engine::start_session(&mut session, games.params(game), &mut rng);
        (session, games)
    }

    #[test]
    fn greedy_balloon_picks_largest_positive() {
        let (mut session, games) = started(GameKind::BalloonPop);
        // Force known sizes and kinds
        for (i, e) in session.entities.iter_mut().enumerate() {
            e.kind = if i % 2 == 0 { 0 } else { 1 };
            e.size = 30.0 + i as f64;
        }
        let events = greedy_policy(&session, &games);
        assert_eq!(events.len(), 1);
        let SessionEvent::ActivateEntity { id } = events[0] else {
            panic!("expected activation");
        };
        let picked = session.entities.iter().find(|e| e.id == id).unwrap();
        assert_eq!(picked.kind, 0);
        // Largest balloon has the highest even index
        assert_eq!(picked.size, 48.0);
    }

    #[test]
    fn greedy_waste_sort_always_correct() {
        let (mut session, games) = started(GameKind::WasteSort);
        let params = games.params(GameKind::WasteSort);
        let mut rng = ScriptedSource::new(vec![0.5]);

        while session.phase == SessionPhase::Active {
            let events = greedy_policy(&session, &games);
            if events.is_empty() {
                break;
            }
            for event in events {
                let _ = engine::apply_event(&mut session, &games, event, &mut rng);
            }
        }
        assert_eq!(session.wrong_count, 0);
        assert_eq!(session.correct_count, params.spawn.count);
        assert!(session.phase.is_terminal());
    }

    #[test]
    fn greedy_policy_is_quiet_when_not_active() {
        let (mut session, games) = started(GameKind::BalloonPop);
        session.phase = SessionPhase::Completed(crate::session::Outcome::TimeUp);
        assert!(greedy_policy(&session, &games).is_empty());
    }

    #[test]
    fn simulate_rejects_unknown_game_and_policy() {
        let config = RuntimeConfig::default();
        let games = GamesConfig::builtin();
        assert!(simulate(&config, &games, "tetris", None, 10, "greedy")
            .unwrap_err()
            .contains("Unknown game"));
        assert!(simulate(&config, &games, "waste-sort", None, 10, "random")
            .unwrap_err()
            .contains("Unknown policy"));
    }

    #[test]
    fn simulate_runs_to_completion() {
        let config = RuntimeConfig::default();
        let games = GamesConfig::builtin();
        // Greedy waste-sort finishes the queue well within the tick budget
        simulate(&config, &games, "waste-sort", Some(7), 100, "greedy").unwrap();
    }
}
