use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),

    #[error("config write error: {0}")]
    WriteError(String),
}

/// Failures on the session transport and the processes behind it.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("session is closed")]
    Closed,

    #[error("invalid session key: {0:?}")]
    InvalidKey(String),

    #[error("unknown session: {0}")]
    UnknownSession(String),

    #[error("failed to spawn process: {0}")]
    Spawn(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PanesError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("terminal error: {0}")]
    Terminal(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("server.port = 0 is out of range".into());
        assert_eq!(
            err.to_string(),
            "config validation error: server.port = 0 is out of range"
        );

        let err = ConfigError::WriteError("read-only filesystem".into());
        assert_eq!(err.to_string(), "config write error: read-only filesystem");
    }

    #[test]
    fn session_error_display() {
        let err = SessionError::Connection("connection refused".into());
        assert_eq!(err.to_string(), "connection error: connection refused");

        let err = SessionError::Closed;
        assert_eq!(err.to_string(), "session is closed");

        let err = SessionError::InvalidKey("a/b".into());
        assert_eq!(err.to_string(), "invalid session key: \"a/b\"");

        let err = SessionError::UnknownSession("qa".into());
        assert_eq!(err.to_string(), "unknown session: qa");

        let err = SessionError::Spawn("no such file".into());
        assert_eq!(err.to_string(), "failed to spawn process: no such file");
    }

    #[test]
    fn panes_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let err: PanesError = config_err.into();
        assert!(matches!(err, PanesError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn panes_error_from_session() {
        let err: PanesError = SessionError::Connection("reset by peer".into()).into();
        assert!(matches!(err, PanesError::Session(_)));
        assert!(err.to_string().contains("reset by peer"));
    }

    #[test]
    fn panes_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: PanesError = io_err.into();
        assert!(matches!(err, PanesError::Io(_)));
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn panes_error_other_variants() {
        let err = PanesError::Terminal("surface disposed".into());
        assert_eq!(err.to_string(), "terminal error: surface disposed");

        let err = PanesError::Other("something went wrong".into());
        assert_eq!(err.to_string(), "something went wrong");
    }
}
