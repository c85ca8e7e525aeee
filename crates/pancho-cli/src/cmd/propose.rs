use crate::output::{print_action, print_json};
use anyhow::{bail, Context};
use pancho_client::ConsentSigner;
use pancho_core::event::parse_tag;
use pancho_core::ttl::now_ts;
use pancho_core::ClientConfig;

pub fn run(
    config: &ClientConfig,
    content: &str,
    pubkey: Option<String>,
    tags: &[String],
    relays: Vec<String>,
    json: bool,
) -> anyhow::Result<()> {
    let tags = tags
        .iter()
        .map(|t| parse_tag(t))
        .collect::<Result<Vec<_>, _>>()
        .context("invalid --tag")?;
    let relays = if relays.is_empty() { None } else { Some(relays) };

    let ctl = super::controller(config)?;
    let rt = super::runtime()?;

    let pubkey = match pubkey {
        Some(pk) => pk,
        None => match ctl.consent().signer() {
            Some(signer) => rt
                .block_on(signer.public_key())
                .context("failed to read public key from signer")?,
            None => bail!("no --pubkey given and no signer configured to supply one"),
        },
    };

    let action = rt
        .block_on(ctl.propose_single(content, &pubkey, tags, relays))
        .context("propose request failed")?;

    if json {
        print_json(&action)?;
    } else {
        print_action(&action, now_ts());
    }
    Ok(())
}
