use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Invalid actor number: {0}")]
    InvalidActorNumber(String),

    #[error("Invalid grid area: {0}")]
    InvalidGridArea(String),

    #[error("Delegation lookup failed: {0}")]
    DelegationLookupFailed(#[source] anyhow::Error),

    #[error("An open bundle already exists for key: {0}")]
    BundleAlreadyOpen(String),

    #[error("Document rendering failed for bundle {0}")]
    DocumentRenderFailed(String),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
