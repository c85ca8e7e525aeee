pub mod approve;
pub mod audit;
pub mod config;
pub mod execute;
pub mod plan;
pub mod propose;
pub mod show;
pub mod watch;

use anyhow::Context;
use pancho_client::LifecycleController;
use pancho_core::ClientConfig;

pub(crate) fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start async runtime")
}

pub(crate) fn controller(config: &ClientConfig) -> anyhow::Result<LifecycleController> {
    LifecycleController::from_config(config).context("failed to build action service client")
}
