use std::process::ExitStatus;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("desktop notifications are not supported on {os}")]
    UnsupportedPlatform { os: &'static str },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("write notification icon: {0}")]
    Icon(#[source] std::io::Error),

    #[error("prepare notification command: {0}")]
    Prepare(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;
