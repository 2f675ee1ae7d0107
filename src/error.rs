use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The FEN string could not be turned into a legal position
    #[error("invalid position \"{fen}\": {reason}")]
    InvalidPosition { fen: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
