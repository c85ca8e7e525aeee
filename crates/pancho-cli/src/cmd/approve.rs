use crate::output::{print_action, print_json};
use anyhow::Context;
use pancho_core::ttl::now_ts;
use pancho_core::ClientConfig;

pub fn run(config: &ClientConfig, action_id: &str, sign: bool, json: bool) -> anyhow::Result<()> {
    let ctl = super::controller(config)?;
    let action = super::runtime()?.block_on(async {
        // A fresh process knows no actions; seed the store first.
        ctl.track(action_id)
            .await
            .with_context(|| format!("failed to fetch action '{action_id}'"))?;
        let approved = if sign {
            ctl.approve_with_consent(action_id).await
        } else {
            ctl.authorize(action_id).await
        };
        approved.with_context(|| format!("approve '{action_id}' failed"))
    })?;

    if json {
        print_json(&action)?;
    } else {
        println!("Approved '{action_id}' -> {}", action.status_text());
        print_action(&action, now_ts());
    }
    Ok(())
}
