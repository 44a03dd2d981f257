use std::path::PathBuf;

use anyhow::{ensure, Context as _};
use ppv_core::{package::PackageLayout, Config};

use crate::util;

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Dir to set up as a problem package (defaults to the current dir)
    #[arg()] // positional argument
    pub dir: Option<PathBuf>,
}

pub fn exec(args: &Args, _global_args: &GlobalArgs) -> SubcmdResult {
    let dir = args.dir.clone().unwrap_or_else(util::current_dir);
    let layout = PackageLayout::new(&dir);

    let config_path = layout.config_filepath();
    ensure!(
        !config_path.exists(),
        "Already a problem package: {:?} exists",
        config_path
    );

    fsutil::write_with_mkdir(&config_path, Config::example_toml())
        .context("Failed to write example config")?;
    fsutil::mkdir_all(layout.tests_dir())?;
    fsutil::mkdir_all(layout.submissions_dir())?;

    println!(
        "Initialized problem package at {}",
        dir.to_string_lossy()
    );
    Ok(())
}
