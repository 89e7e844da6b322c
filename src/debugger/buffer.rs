use async_trait::async_trait;
use std::path::Path;
use std::rc::Rc;

/// Name of a text tag that highlights the line where the inferior is stopped.
pub const CURRENT_BREAKPOINT_TAG: &str = "current-breakpoint";

/// Open editor document.
pub trait Buffer {
    fn path(&self) -> &Path;

    /// Apply a named tag on a zero-based line.
    fn apply_tag(&self, name: &str, line: u32);

    /// Remove a named tag from the whole buffer.
    fn remove_tag(&self, name: &str);

    /// Breakpoint state of some lines changed, gutter must be redrawn.
    fn line_flags_changed(&self);
}

/// Set of open documents.
#[async_trait(?Send)]
pub trait BufferManager {
    /// Return a buffer for the file, open it if necessary.
    async fn load_file(&self, path: &Path) -> anyhow::Result<Rc<dyn Buffer>>;

    /// Return a buffer for the file if it is already open.
    fn find_buffer(&self, path: &Path) -> Option<Rc<dyn Buffer>>;
}
