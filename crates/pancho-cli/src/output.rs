use pancho_core::{Action, AuditEntry};
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    // Calculate column widths
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  ").trim_end());

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

const ACTION_HEADERS: [&str; 7] = ["ID", "TOOL", "STATUS", "TTL", "APPROVAL", "NEXT", "PREVIEW"];

/// The step a user can still take on this action, if any. Stale actions
/// get `-` even when their cached status would otherwise allow a step.
pub fn next_step(action: &Action, now: i64) -> &'static str {
    if action.can_offer_approval(now) {
        "approve"
    } else if action.can_offer_execute(now) {
        "execute"
    } else {
        "-"
    }
}

fn action_row(action: &Action, now: i64) -> Vec<String> {
    vec![
        action.action_id.clone(),
        action.label().to_string(),
        action.status_text().to_string(),
        action.action_ttl(now).to_string(),
        action.approval_ttl(now).to_string(),
        next_step(action, now).to_string(),
        action.preview.clone().unwrap_or_default(),
    ]
}

pub fn print_actions(actions: &[Action], now: i64) {
    if actions.is_empty() {
        println!("No actions.");
        return;
    }
    let rows = actions.iter().map(|a| action_row(a, now)).collect();
    print_table(&ACTION_HEADERS, rows);
}

/// Multi-line detail view, audit trail included.
pub fn print_action(action: &Action, now: i64) {
    println!("Action:    {}", action.action_id);
    println!("Tool:      {}", action.label());
    println!("Status:    {}", action.status_text());
    println!("TTL:       {}", action.action_ttl(now));
    println!("Approval:  {}", action.approval_ttl(now));
    println!("Next:      {}", next_step(action, now));
    if let Some(preview) = &action.preview {
        println!("Preview:   {preview}");
    }
    if let Some(hash) = &action.action_hash {
        println!("Hash:      {hash}");
    }
    if let Some(payload) = &action.action_payload {
        println!("Author:    {}", payload.pubkey);
        println!("Content:   {}", payload.content);
    }
    println!();
    print_audit(&action.audit);
}

pub fn print_audit(entries: &[AuditEntry]) {
    if entries.is_empty() {
        println!("No audit entries.");
        return;
    }
    let rows = entries
        .iter()
        .map(|e| {
            vec![
                e.created_at.map(format_ts).unwrap_or_else(|| "-".into()),
                e.event_type.clone(),
            ]
        })
        .collect();
    print_table(&["WHEN", "EVENT"], rows);
}

pub fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}
