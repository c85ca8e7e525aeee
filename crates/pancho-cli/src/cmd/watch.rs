use crate::output::{format_ts, next_step};
use anyhow::{anyhow, bail, Context};
use pancho_client::RefreshEvent;
use pancho_core::ttl::now_ts;
use pancho_core::{Action, ClientConfig};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

pub fn run(
    config: &ClientConfig,
    action_ids: &[String],
    interval_ms: Option<u64>,
    ticks: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let period = interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.refresh_interval());
    if period.is_zero() {
        bail!("poll interval must be greater than 0");
    }

    let ctl = super::controller(config)?;
    super::runtime()?.block_on(async {
        let mut last: HashMap<String, Action> = HashMap::new();
        for id in action_ids {
            let action = ctl
                .track(id)
                .await
                .with_context(|| format!("failed to fetch action '{id}'"))?;
            report(&action, None, json)?;
            last.insert(id.clone(), action);
        }
        if settled(&last) {
            info!("every watched action is already final");
            return Ok(());
        }

        let task = ctl.start_refresh(period);
        let mut events = task.subscribe();
        info!(
            count = action_ids.len(),
            interval_ms = period.as_millis() as u64,
            "watching actions"
        );

        let outcome = loop {
            let event = tokio::select! {
                ev = events.recv() => ev,
                _ = tokio::signal::ctrl_c() => break Ok(()),
            };
            match event {
                Ok(RefreshEvent::Refreshed(action)) => {
                    let prev = last
                        .get(&action.action_id)
                        .map(|a| a.status_text().to_string());
                    if prev.as_deref() != Some(action.status_text()) {
                        report(&action, prev.as_deref(), json)?;
                    }
                    last.insert(action.action_id.clone(), action);
                    if settled(&last) {
                        info!("every watched action reached a final status");
                        break Ok(());
                    }
                }
                // Already logged by the refresh task.
                Ok(RefreshEvent::Failed { .. }) => {}
                Ok(RefreshEvent::TickCompleted { tick, .. }) => {
                    if ticks.is_some_and(|limit| tick >= limit) {
                        break Ok(());
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "watch fell behind"),
                Err(RecvError::Closed) => break Err(anyhow!("refresh task ended unexpectedly")),
            }
        };

        task.stop().await;
        outcome
    })
}

/// Nothing more can happen service-side to any watched action.
fn settled(last: &HashMap<String, Action>) -> bool {
    last.values().all(|a| a.status.is_terminal())
}

fn report(action: &Action, prev: Option<&str>, json: bool) -> anyhow::Result<()> {
    let now = now_ts();
    if json {
        let line = serde_json::json!({
            "at": now,
            "action_id": action.action_id,
            "previous": prev,
            "status": action.status_text(),
            "next": next_step(action, now),
            "ttl": action.action_ttl(now).secs(),
            "approval_ttl": action.approval_ttl(now).secs(),
        });
        println!("{}", serde_json::to_string(&line)?);
        return Ok(());
    }

    let transition = match prev {
        Some(prev) => format!("{prev} -> {}", action.status_text()),
        None => action.status_text().to_string(),
    };
    println!(
        "{}  {}  {}  (ttl {}, approval {}, next {})",
        format_ts(now),
        action.action_id,
        transition,
        action.action_ttl(now),
        action.approval_ttl(now),
        next_step(action, now)
    );
    Ok(())
}
