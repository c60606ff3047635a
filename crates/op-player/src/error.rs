use op_formats::FormatError;

/// Error returned by [`crate::Player::new`].
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("display setup failed: {0}")]
    Display(#[from] DisplayError),
    #[error("palette count must be at least 1")]
    NoPalettes,
}

/// Error returned by [`crate::Player::load`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("{len} bytes staged, buffer holds {capacity}")]
    TooLarge { len: usize, capacity: usize },
    #[error("invalid track: {0}")]
    Parse(#[from] FormatError),
}

/// Error reported by a [`crate::Display`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("display unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
