use crate::output::{print_action, print_json};
use anyhow::Context;
use pancho_core::ttl::now_ts;
use pancho_core::ClientConfig;

pub fn run(config: &ClientConfig, action_id: &str, json: bool) -> anyhow::Result<()> {
    let ctl = super::controller(config)?;
    let action = super::runtime()?.block_on(async {
        ctl.track(action_id)
            .await
            .with_context(|| format!("failed to fetch action '{action_id}'"))?;
        ctl.execute(action_id)
            .await
            .with_context(|| format!("execute '{action_id}' failed"))
    })?;

    if json {
        print_json(&action)?;
    } else {
        println!("Executed '{action_id}' -> {}", action.status_text());
        print_action(&action, now_ts());
    }
    Ok(())
}
