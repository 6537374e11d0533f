use thiserror::Error;

/// Library error type for carousel operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The container has no slide track to position.
    #[error("carousel container {0:?} has no slide track")]
    MissingTrack(String),

    /// The container's slide collection is empty.
    #[error("carousel container {0:?} has no slides")]
    NoSlides(String),

    /// No carousel with this id is attached to the page.
    #[error("no carousel attached with id {0:?}")]
    UnknownCarousel(String),

    /// The controller task has exited (destroyed or cancelled).
    #[error("carousel controller is no longer running")]
    Detached,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_carousel() {
        assert_eq!(
            Error::MissingTrack("hero".into()).to_string(),
            "carousel container \"hero\" has no slide track"
        );
        assert_eq!(
            Error::UnknownCarousel("gone".into()).to_string(),
            "no carousel attached with id \"gone\""
        );
        assert_eq!(
            Error::Detached.to_string(),
            "carousel controller is no longer running"
        );
    }
}
