use crate::debugger::error::Error;
use crate::debugger::runner::RunContext;
use crate::{muted_error, weak_error};
use log::error;
use serde::Deserialize;
use std::fs::read_to_string;

/// Debug session settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Make GLib warnings fatal, so the inferior stops on the first warning.
    pub insert_breakpoint_at_warnings: bool,
    /// Make GLib criticals fatal, so the inferior stops on the first critical.
    pub insert_breakpoint_at_criticals: bool,
}

impl DebugConfig {
    const DEFAULT_PATH: &'static str = ".config/ide-debugger/debug.toml";

    /// Parse settings from a TOML document.
    pub fn parse(data: &str) -> Result<Self, Error> {
        Ok(toml::de::from_str(data)?)
    }

    /// Load settings from file, default path is used if `path` is `None`.
    /// Return [`None`] on errors.
    pub fn from_file(path: Option<&str>) -> Option<Self> {
        let data = match path {
            None => {
                let path = home::home_dir()?;
                let path = path.join(Self::DEFAULT_PATH);
                muted_error!(read_to_string(path))?
            }
            Some(path) => match read_to_string(path) {
                Ok(data) => data,
                Err(err) => {
                    error!("Error while load debug settings file: {err}");
                    return None;
                }
            },
        };

        weak_error!(Self::parse(&data))
    }

    /// Value of the `G_DEBUG` environment variable for the inferior, warnings win over
    /// criticals.
    pub fn g_debug(&self) -> Option<&'static str> {
        if self.insert_breakpoint_at_warnings {
            Some("fatal-warnings")
        } else if self.insert_breakpoint_at_criticals {
            Some("fatal-criticals")
        } else {
            None
        }
    }

    pub(crate) fn apply(&self, run_context: &mut RunContext) {
        if let Some(value) = self.g_debug() {
            run_context.setenv("G_DEBUG", value);
        }
    }
}
