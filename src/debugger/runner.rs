use indexmap::IndexMap;
use std::cell::RefCell;
use std::path::PathBuf;

/// Build pipeline the inferior program was produced by.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    pub src_dir: PathBuf,
    pub build_dir: PathBuf,
    /// Target triplet of the build, `None` for native builds.
    pub host_triplet: Option<String>,
}

/// Program that is going to be run by a runner.
#[derive(Clone, Debug, Default)]
pub struct RunCommand {
    pub id: String,
    pub argv: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Source language of the build target, if known.
    pub language: Option<String>,
}

impl RunCommand {
    pub fn new(id: impl Into<String>, argv: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            id: id.into(),
            argv: argv.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Command line and environment of a process that is about to be spawned. Debugger
/// backends rewrite it in [`crate::debugger::backend::DebuggerBackend::prepare_for_run`],
/// for example to put a debugger in front of the program.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunContext {
    pub argv: Vec<String>,
    pub env: IndexMap<String, String>,
    pub cwd: Option<PathBuf>,
}

impl RunContext {
    pub fn new(argv: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn setenv(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.insert(key.into(), value.into());
    }

    pub fn getenv(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// Insert arguments before the current command line.
    pub fn prepend_args(&mut self, args: impl IntoIterator<Item = impl Into<String>>) {
        let mut argv: Vec<String> = args.into_iter().map(Into::into).collect();
        argv.append(&mut self.argv);
        self.argv = argv;
    }
}

/// Runs the inferior program. The runner owner reports process lifecycle to the debug
/// manager (`runner_spawned`, `runner_exited`).
pub trait Runner {
    fn pipeline(&self) -> &Pipeline;

    fn run_command(&self) -> &RunCommand;

    fn run_context(&self) -> &RefCell<RunContext>;

    /// Kill the running process.
    fn force_quit(&self);

    /// Mark the run as failed for UI visibility.
    fn set_failed(&self, failed: bool);
}
