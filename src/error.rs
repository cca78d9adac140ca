use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing command line input, found before any socket is created.
    #[error("usage error: {0}")]
    Usage(String),

    #[error("socket setup failed at {phase}: {source}")]
    Setup {
        phase: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("transfer failed at {op}: {source}")]
    Transfer {
        op: &'static str,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn setup(phase: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Error::Setup { phase, source }
    }

    pub(crate) fn transfer(op: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Error::Transfer { op, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_name_the_failed_phase() {
        let err = Error::setup("bind")(io::Error::from(io::ErrorKind::AddrInUse));
        assert!(err.to_string().starts_with("socket setup failed at bind"));

        let err = Error::transfer("send")(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(err.to_string().starts_with("transfer failed at send"));

        let err = Error::Usage("port 0 out of range".into());
        assert_eq!(err.to_string(), "usage error: port 0 out of range");
    }
}
