use crate::output::{print_actions, print_json};
use anyhow::Context;
use pancho_core::ttl::now_ts;
use pancho_core::ClientConfig;

pub fn run(config: &ClientConfig, goal: &str, json: bool) -> anyhow::Result<()> {
    let ctl = super::controller(config)?;
    let outcome = super::runtime()?
        .block_on(ctl.plan(goal))
        .context("plan request failed")?;

    if json {
        print_json(&serde_json::json!({
            "plan_summary": outcome.summary,
            "actions": outcome.actions,
        }))?;
        return Ok(());
    }

    if !outcome.summary.is_empty() {
        println!("{}", outcome.summary);
        println!();
    }
    print_actions(&outcome.actions, now_ts());
    Ok(())
}
