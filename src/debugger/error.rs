#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- generic errors --------------------------------------------
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("operation cancelled")]
    Cancelled,

    // --------------------------------- capability errors -----------------------------------------
    #[error("operation `{0}` is not supported by the debugger")]
    NotSupported(&'static str),
    #[error("no suitable debugger found for the run command")]
    NoSuitableDebugger,

    // --------------------------------- config errors ---------------------------------------------
    #[error("debug settings: {0}")]
    Config(#[from] toml::de::Error),

    // --------------------------------- third party errors ----------------------------------------
    #[error("backend: {0:#}")]
    Backend(anyhow::Error),
}

impl Error {
    /// Return true if the error means a missing capability rather than a failure.
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Error::NotSupported(_) | Error::NoSuitableDebugger)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Backend(e)
    }
}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "debugger", "{:#}", e);
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "debugger", concat!($msg, " {:#}"), e);
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!(log::warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(log::debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::debug, $res, $msg)
    };
}
