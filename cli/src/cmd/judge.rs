use std::path::{Path, PathBuf};

use ppv_core::{action, Config};

use crate::util;

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Solution source file to compile and judge
    #[arg()] // positional argument
    pub source_file: PathBuf,

    /// Problem package dir (default: nearest ancestor dir with a problem.toml)
    #[arg(short = 'p', long)]
    pub package_dir: Option<PathBuf>,

    /// Also write the verdict as JSON to this path
    #[arg(long)]
    pub json: Option<PathBuf>,
}

pub async fn exec(args: &Args, _global_args: &GlobalArgs) -> SubcmdResult {
    let package_dir = match &args.package_dir {
        Some(dir) => dir.clone(),
        None => {
            let config_path = Config::find_file_in_ancestors(util::current_dir())?;
            config_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(util::current_dir)
        }
    };

    let _ = action::do_judge(&package_dir, &args.source_file, args.json.as_deref()).await?;
    Ok(())
}
