pub mod animate;
pub mod archive;
pub mod catalog;
pub mod download;
pub mod process;
pub mod refresh;
pub mod run;

use std::{path::Path, sync::Arc};

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use tokio::task;

use crate::{
    config::Config,
    feed::RunDate,
    imaging::{ImageTool, Magick},
    ledger::SwitchLedger,
};

pub use animate::animate;
pub use archive::archive;
pub use catalog::catalog;
pub use download::download;
pub use process::process;
pub use refresh::refresh;
pub use run::run;

/// Everything a command needs: the validated configuration and the run date.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub date: RunDate,
}

impl Context {
    pub fn load(config: Option<&Path>, date: Option<NaiveDate>) -> Result<Self> {
        let config = Config::load(config).context("Failed to load configuration")?;
        let date = date.map(RunDate::new).unwrap_or_else(RunDate::today);

        Ok(Context { config, date })
    }

    pub fn image_tool(&self) -> Magick {
        Magick::new(&self.config.campaign.convert_binary)
    }

    pub fn load_ledger(&self) -> Result<SwitchLedger> {
        let path = self.config.paths.ledger();
        SwitchLedger::load(&path)
            .with_context(|| format!("Failed to read switch ledger `{}`", path.display()))
    }
}

/// Runs a synchronous image stage on Tokio's blocking pool.
pub async fn on_blocking_pool<T, R, S>(ctx: &Context, tool: Arc<T>, stage: S) -> Result<R>
where
    T: ImageTool + Send + Sync + 'static,
    R: Send + 'static,
    S: FnOnce(&Context, &T) -> Result<R> + Send + 'static,
{
    let ctx = ctx.clone();
    task::spawn_blocking(move || stage(&ctx, &*tool))
        .await
        .context("Image stage did not complete")?
}


// -- Tests -------------------------------------------------------------------
