use async_trait::async_trait;

use crate::bundle::Bundle;
use crate::error::DomainResult;
use crate::outgoing_message::OutgoingMessage;
use crate::types::DocumentFormat;

/// Turns a sealed bundle's messages into a concrete wire-format byte stream.
/// Implemented by the document writers (CIM-XML, CIM-JSON, ebIX) outside this
/// crate. Rendering must be deterministic for a given sealed bundle so that
/// concurrent renders of the same bundle produce interchangeable artifacts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentFactory: Send + Sync {
    async fn render(
        &self,
        bundle: Bundle,
        messages: Vec<OutgoingMessage>,
        format: DocumentFormat,
    ) -> DomainResult<Vec<u8>>;
}
