use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    /// The requested heading is the reverse of the current one.
    #[error("cannot reverse the snake onto itself")]
    IllegalDirectionChange,
    #[error("no free cell left to place food")]
    NoSpaceAvailable,
    /// The operation is not valid in the session's current state.
    #[error("operation not valid in the current game state")]
    InvalidTransition,
}
