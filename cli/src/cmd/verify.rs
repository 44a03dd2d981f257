use std::path::PathBuf;

use anyhow::ensure;
use ppv_core::action;

use crate::util;

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Problem package dir (defaults to the current dir)
    #[arg()] // positional argument
    pub package_dir: Option<PathBuf>,
}

pub async fn exec(args: &Args, _global_args: &GlobalArgs) -> SubcmdResult {
    let dir = args.package_dir.clone().unwrap_or_else(util::current_dir);

    let findings = action::verify_package(&dir).await?;
    ensure!(
        findings.is_clean(),
        "Package verification failed with {} finding(s)",
        findings.num_failed()
    );
    Ok(())
}
