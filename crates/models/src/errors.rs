use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("database error: {0}")]
    Db(String),
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl From<sea_orm::DbErr> for ModelError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Db(e.to_string())
    }
}
