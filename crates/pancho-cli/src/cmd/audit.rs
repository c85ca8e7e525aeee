use crate::output::{print_audit, print_json};
use anyhow::Context;
use pancho_core::ClientConfig;

pub fn run(config: &ClientConfig, action_id: &str, json: bool) -> anyhow::Result<()> {
    let ctl = super::controller(config)?;
    let entries = super::runtime()?
        .block_on(ctl.audit(action_id))
        .with_context(|| format!("failed to fetch audit trail for '{action_id}'"))?;

    if json {
        print_json(&serde_json::json!({ "entries": entries }))?;
    } else {
        print_audit(&entries);
    }
    Ok(())
}
