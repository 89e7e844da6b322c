use crate::debugger::address::Address;
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Stack frame of a thread.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub address: Address,
    pub file: Option<PathBuf>,
    pub function: Option<String>,
    pub library: Option<String>,
    /// Rendered function arguments.
    pub args: Vec<String>,
    /// Frame number, zero is the innermost frame.
    pub depth: u32,
    /// 1-based source line, zero if unknown.
    pub line: u32,
}

impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} in {} ({})",
            self.depth,
            self.address,
            self.function.as_deref().unwrap_or("??"),
            self.args.iter().join(", ")
        )?;
        match (&self.file, &self.library) {
            (Some(file), _) => write!(f, " at {}:{}", file.display(), self.line),
            (None, Some(library)) => write!(f, " from {library}"),
            (None, None) => Ok(()),
        }
    }
}
