use crate::app_state::AppState;
use crate::boss::{Boss, MANUAL_PREFIX, group_by_zone};
use crate::catalog::CatalogEntry;
use crate::tracker::TrackerUpdate;
use crate::watcher::{self, start_watch};
use std::io::Write;
use std::path::PathBuf;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub async fn watch(path: &str, state: &AppState) {
    let save_path = PathBuf::from(path);
    stop_watch(state).await;

    match start_watch(state.tracker.clone(), save_path.clone(), state.updates.clone()).await {
        Ok(handle) => {
            *state.watch.lock().await = Some(handle);
            let mut config = state.config.write().await;
            config.last_save_path = Some(save_path.to_string_lossy().to_string());
            if let Err(e) = config.save() {
                tracing::warn!(error = %e, "Could not remember save path");
            }
        }
        Err(e) => println!("Failed to watch {}: {}", save_path.display(), e),
    }
}

pub async fn unwatch(state: &AppState) {
    if !stop_watch(state).await {
        println!("Not watching any save");
    }
}

async fn stop_watch(state: &AppState) -> bool {
    let handle = state.watch.lock().await.take();
    match handle {
        Some(handle) => {
            println!("Stopped watching {}", handle.save_path().display());
            handle.stop().await;
            true
        }
        None => false,
    }
}

pub async fn refresh(state: &AppState) {
    if !watcher::refresh(&state.tracker, &state.updates).await {
        println!("Not watching any save");
    }
}

pub async fn list(state: &AppState, zone: Option<&str>) {
    let tracker = state.tracker.lock().await;
    let bosses = tracker.bosses();
    if bosses.is_empty() {
        println!("No bosses to show");
        return;
    }

    for group in group_by_zone(bosses) {
        if zone.is_some_and(|z| !group.zone.eq_ignore_ascii_case(z)) {
            continue;
        }
        println!("{} ({}/{})", group.zone, group.killed, group.total);
        for boss in &group.bosses {
            println!("  {} {}", marker(boss), describe(boss));
        }
    }
}

pub async fn zones(state: &AppState) {
    let tracker = state.tracker.lock().await;
    let groups = group_by_zone(tracker.bosses());

    println!("{:<40} {:>8} {:>12} {:>8}", "Zone", "Killed", "Encountered", "Total");
    println!("{}", "-".repeat(72));
    for group in &groups {
        println!(
            "{:<40} {:>8} {:>12} {:>8}",
            group.zone, group.killed, group.encountered, group.total
        );
    }
    let killed: usize = groups.iter().map(|g| g.killed).sum();
    let total: usize = groups.iter().map(|g| g.total).sum();
    println!("\nTotal: {killed}/{total} killed");
}

pub async fn mark(state: &AppState, raw_identifier: &str, killed: bool) {
    let result = state
        .tracker
        .lock()
        .await
        .set_manual_state(raw_identifier, killed);
    match result {
        Ok(()) => refresh(state).await,
        Err(e) => println!("Failed to save manual state: {e}"),
    }
}

pub async fn clear_overrides(state: &AppState) {
    let result = state.tracker.lock().await.clear_manual_states();
    match result {
        Ok(removed) => {
            if !removed {
                println!("No manual states to clear");
            }
            refresh(state).await;
        }
        Err(e) => println!("Failed to clear manual states: {e}"),
    }
}

pub async fn add_boss(
    state: &AppState,
    name: &str,
    category: &str,
    zone: &str,
    raw_identifier: Option<&str>,
) {
    let raw_identifier = raw_identifier
        .map(str::to_string)
        .unwrap_or_else(new_manual_identifier);
    let entry = CatalogEntry {
        raw_identifier: raw_identifier.clone(),
        display_name: name.to_string(),
        category: category.to_string(),
        zone: zone.to_string(),
    };

    let result = state.tracker.lock().await.upsert_catalog_entry(entry);
    match result {
        Ok(outcome) => {
            println!("{outcome:?}: {name} ({raw_identifier}) in {zone}");
            refresh(state).await;
        }
        Err(e) => println!("Failed to save boss info: {e}"),
    }
}

/// `MANUAL_<unix millis>`
fn new_manual_identifier() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("{MANUAL_PREFIX}{millis}")
}

pub async fn settings(state: &AppState, manual_edit: Option<bool>, boss_editing: Option<bool>) {
    let mut config = state.config.write().await;
    {
        let mut tracker = state.tracker.lock().await;
        if let Some(allowed) = manual_edit {
            config.allow_manual_edit_auto_detected = allowed;
            tracker.set_manual_edit_allowed(allowed);
        }
        if let Some(allowed) = boss_editing {
            config.allow_boss_editing = allowed;
            tracker.set_boss_editing_allowed(allowed);
        }
    }
    if let Err(e) = config.save() {
        println!("Failed to save config: {e}");
    }
    println!(
        "manual edit of detected bosses: {}, boss editing: {}",
        config.allow_manual_edit_auto_detected, config.allow_boss_editing
    );
}

pub async fn status(state: &AppState) {
    let tracker = state.tracker.lock().await;
    println!("State: {:?}", tracker.state());
    println!(
        "Save: {}",
        tracker
            .save_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "N/A".to_string())
    );
    println!(
        "Catalog: {} entries in {} zones",
        tracker.catalog().len(),
        tracker.catalog().zones().len()
    );
    println!(
        "Cached snapshot: {}",
        tracker
            .cache()
            .cached_at()
            .and_then(|t| t.format(&Rfc3339).ok())
            .unwrap_or_else(|| "N/A".to_string())
    );
    println!(
        "Converter: {} ({})",
        tracker.converter().tool_path().display(),
        if tracker.converter().is_available() {
            "found"
        } else {
            "missing"
        }
    );
}

pub async fn show_config(state: &AppState) {
    let config = state.config.read().await;
    println!("{config:#?}");
}

/// Presentation boundary: report one tracker update.
pub fn print_update(update: &TrackerUpdate) {
    let killed = update.bosses.iter().filter(|b| b.killed).count();
    println!(
        "[{:?}] {} bosses, {} killed",
        update.kind,
        update.bosses.len(),
        killed
    );
    for boss in update.newly_killed.iter().flatten() {
        match &boss.zone {
            Some(zone) => println!("Boss defeated: {} ({})", boss.name, zone),
            None => println!("Boss defeated: {}", boss.name),
        }
    }
    for boss in update.unknown.iter().flatten() {
        println!(
            "Needs info: {}",
            boss.raw_identifier.as_deref().unwrap_or(&boss.name)
        );
    }
}

pub fn exit() {
    write!(std::io::stdout(), "quitting...").ok();
    std::io::stdout().flush().ok();
}

fn marker(boss: &Boss) -> &'static str {
    match (boss.encountered, boss.killed) {
        (_, true) => "[x]",
        (true, false) => "[ ]",
        (false, false) => "[?]",
    }
}

fn describe(boss: &Boss) -> String {
    let mut line = boss.name.clone();
    if let Some(category) = boss.category.as_deref().filter(|c| !c.is_empty()) {
        line.push_str(&format!(" <{category}>"));
    }
    if let Some(id) = &boss.raw_identifier {
        line.push_str(&format!("  {id}"));
    }
    if boss.is_user_authored() {
        line.push_str("  (manual)");
    }
    line
}
