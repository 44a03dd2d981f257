use std::{
    collections::HashMap,
    ffi::OsStr,
    path::Path,
};

use anyhow::{bail, Context as _};
use tokio::process::Command;

use crate::config::CompileConfig;
use crate::str_interp::interp;

/// Compiler collaborator: turns a source file into an executable using the
/// shell command template configured for the file name.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'a> {
    cfg: &'a CompileConfig,
}

impl<'a> Compiler<'a> {
    pub fn new(cfg: &'a CompileConfig) -> Self {
        Self { cfg }
    }

    /// Resolve the compile command for `source_path`, with `#{...}`
    /// placeholders expanded.
    pub fn command_for(&self, source_path: &Path, exec_path: &Path) -> anyhow::Result<String> {
        let filename = source_path
            .file_name()
            .with_context(|| format!("Not a file path: {:?}", source_path))?
            .to_string_lossy()
            .into_owned();

        let template = self.cfg.find_command_for_filename(&filename).with_context(|| {
            format!(
                "Unconfigured compile command for filename '{}' (No entry matched glob in `compile.command[]`)",
                filename
            )
        })?;

        let vars = make_interp_vars(source_path, exec_path);
        interp(template, &vars).map_err(Into::into)
    }

    pub async fn compile(&self, source_path: &Path, exec_path: &Path) -> anyhow::Result<()> {
        let cmd = self.command_for(source_path, exec_path)?;
        log::info!("Compiling {}", source_path.to_string_lossy());
        log::info!("{}", cmd);

        let status = Command::new(&self.cfg.shell)
            .args(["-c", &cmd])
            .status()
            .await
            .with_context(|| {
                format!(
                    "Failed to spawn '{} -c {}'",
                    self.cfg.shell.to_string_lossy(),
                    cmd
                )
            })?;

        match status.code() {
            Some(0) => Ok(()),
            Some(code) => bail!("Compile error: exitcode={}", code),
            None => bail!("Failed to compile: process terminated by signal"),
        }
    }
}

fn make_interp_vars<'p>(source_path: &'p Path, exec_path: &'p Path) -> HashMap<&'static str, &'p OsStr> {
    let mut m: HashMap<_, &OsStr> = HashMap::new();
    m.insert("filePath", source_path.as_os_str());
    m.insert("fileName", source_path.file_name().unwrap_or(OsStr::new("")));
    m.insert(
        "fileDir",
        source_path.parent().unwrap_or(Path::new(".")).as_os_str(),
    );
    m.insert(
        "fileStem",
        source_path.file_stem().unwrap_or(OsStr::new("")),
    );
    m.insert(
        "fileExt",
        source_path.extension().unwrap_or(OsStr::new("")),
    );
    m.insert("execPath", exec_path.as_os_str());
    m
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;

    fn compile_config(toml_commands: &str) -> CompileConfig {
        let toml = format!(
            r#"
            [problem]
            score = 100

            [limits]
            time_secs = 1

            [compile]
            shell = "/bin/sh"

            {}

            [[subtasks]]
            id = 1
            regex = "^01"
            score = 100
            "#,
            toml_commands
        );
        Config::from_toml(&toml).unwrap().compile
    }

    #[test]
    fn command_template_is_expanded_for_the_matching_glob() {
        let cfg = compile_config(
            r#"
            [[compile.command]]
            pattern = "*.cpp"
            command = "g++ #{filePath} -o #{execPath}"
            "#,
        );
        let compiler = Compiler::new(&cfg);

        let cmd = compiler
            .command_for(Path::new("submissions/brute.cpp"), Path::new("/tmp/s/brute"))
            .unwrap();
        assert_eq!(cmd, "g++ submissions/brute.cpp -o /tmp/s/brute");

        let err = compiler
            .command_for(Path::new("submissions/brute.py"), Path::new("/tmp/s/brute"))
            .unwrap_err();
        assert!(err.to_string().contains("Unconfigured compile command"));
    }

    #[tokio::test]
    async fn compile_runs_the_shell_command() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("main.cpp");
        std::fs::write(&source, "not really c++\n").unwrap();
        let exec_path = dir.path().join("main");

        // Stands in for a real compiler; copies source to the target.
        let cfg = compile_config(
            r#"
            [[compile.command]]
            pattern = "*.cpp"
            command = "cp #{filePath} #{execPath}"
            "#,
        );
        Compiler::new(&cfg).compile(&source, &exec_path).await.unwrap();
        assert!(exec_path.is_file());
    }

    #[tokio::test]
    async fn failing_compile_command_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("main.cpp");
        std::fs::write(&source, "").unwrap();

        let cfg = compile_config(
            r#"
            [[compile.command]]
            pattern = "*.cpp"
            command = "exit 1"
            "#,
        );
        let err = Compiler::new(&cfg)
            .compile(&source, &dir.path().join("main"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exitcode=1"));
    }
}
