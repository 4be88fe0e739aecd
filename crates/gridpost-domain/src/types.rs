use std::fmt;
use std::str::FromStr;

use crate::error::{DomainError, DomainResult};

/// Identification of a market actor: a 13-digit GLN or a 16-character EIC code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorNumber(String);

impl ActorNumber {
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        let is_gln = value.len() == 13 && value.chars().all(|c| c.is_ascii_digit());
        let is_eic = value.len() == 16
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if is_gln || is_eic {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidActorNumber(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role under which an actor participates in the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorRole {
    EnergySupplier,
    GridAccessProvider,
    MeteredDataResponsible,
    BalanceResponsibleParty,
    SystemOperator,
    Delegated,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::EnergySupplier => "energy_supplier",
            ActorRole::GridAccessProvider => "grid_access_provider",
            ActorRole::MeteredDataResponsible => "metered_data_responsible",
            ActorRole::BalanceResponsibleParty => "balance_responsible_party",
            ActorRole::SystemOperator => "system_operator",
            ActorRole::Delegated => "delegated",
        }
    }
}

impl FromStr for ActorRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "energy_supplier" => Ok(ActorRole::EnergySupplier),
            "grid_access_provider" => Ok(ActorRole::GridAccessProvider),
            "metered_data_responsible" => Ok(ActorRole::MeteredDataResponsible),
            "balance_responsible_party" => Ok(ActorRole::BalanceResponsibleParty),
            "system_operator" => Ok(ActorRole::SystemOperator),
            "delegated" => Ok(ActorRole::Delegated),
            other => Err(DomainError::InvalidMessage(format!(
                "unknown actor role: {other}"
            ))),
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A market actor addressed by number and role. Two actors with the same
/// number but different roles own separate message queues.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarketActor {
    pub actor_number: ActorNumber,
    pub role: ActorRole,
}

impl MarketActor {
    pub fn new(actor_number: ActorNumber, role: ActorRole) -> Self {
        Self { actor_number, role }
    }
}

impl fmt::Display for MarketActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.actor_number, self.role)
    }
}

pub type Receiver = MarketActor;
pub type Sender = MarketActor;

/// Three-digit grid-area code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridArea(String);

impl GridArea {
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        if value.len() == 3 && value.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidGridArea(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GridArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of market document an outgoing message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    NotifyValidatedMeasureData,
    RejectRequestMeasureData,
    NotifyAggregatedMeasureData,
    RejectRequestAggregatedMeasureData,
    NotifyWholesaleServices,
    Acknowledgement,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::NotifyValidatedMeasureData => "notify_validated_measure_data",
            DocumentType::RejectRequestMeasureData => "reject_request_measure_data",
            DocumentType::NotifyAggregatedMeasureData => "notify_aggregated_measure_data",
            DocumentType::RejectRequestAggregatedMeasureData => {
                "reject_request_aggregated_measure_data"
            }
            DocumentType::NotifyWholesaleServices => "notify_wholesale_services",
            DocumentType::Acknowledgement => "acknowledgement",
        }
    }
}

impl FromStr for DocumentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notify_validated_measure_data" => Ok(DocumentType::NotifyValidatedMeasureData),
            "reject_request_measure_data" => Ok(DocumentType::RejectRequestMeasureData),
            "notify_aggregated_measure_data" => Ok(DocumentType::NotifyAggregatedMeasureData),
            "reject_request_aggregated_measure_data" => {
                Ok(DocumentType::RejectRequestAggregatedMeasureData)
            }
            "notify_wholesale_services" => Ok(DocumentType::NotifyWholesaleServices),
            "acknowledgement" => Ok(DocumentType::Acknowledgement),
            other => Err(DomainError::InvalidMessage(format!(
                "unknown document type: {other}"
            ))),
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse partition of document types sharing a bundling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageCategory {
    /// High-volume metering series; bundled over a time/size window and
    /// sealed by the bundling scheduler.
    MeasureData,
    /// Settlement and aggregation results; one bundle per enqueue session,
    /// sealed at first peek.
    Aggregations,
    /// Everything else (acknowledgements, rejections); sealed at first peek.
    MarketTransactions,
}

impl MessageCategory {
    pub const ALL: [MessageCategory; 3] = [
        MessageCategory::MeasureData,
        MessageCategory::Aggregations,
        MessageCategory::MarketTransactions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageCategory::MeasureData => "measure_data",
            MessageCategory::Aggregations => "aggregations",
            MessageCategory::MarketTransactions => "market_transactions",
        }
    }
}

impl FromStr for MessageCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "measure_data" => Ok(MessageCategory::MeasureData),
            "aggregations" => Ok(MessageCategory::Aggregations),
            "market_transactions" => Ok(MessageCategory::MarketTransactions),
            other => Err(DomainError::InvalidMessage(format!(
                "unknown message category: {other}"
            ))),
        }
    }
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market process that produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusinessReason {
    PeriodicMetering,
    PeriodicFlexMetering,
    BalanceFixing,
    WholesaleFixing,
    MoveIn,
    IncorrectProcess,
}

impl BusinessReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessReason::PeriodicMetering => "periodic_metering",
            BusinessReason::PeriodicFlexMetering => "periodic_flex_metering",
            BusinessReason::BalanceFixing => "balance_fixing",
            BusinessReason::WholesaleFixing => "wholesale_fixing",
            BusinessReason::MoveIn => "move_in",
            BusinessReason::IncorrectProcess => "incorrect_process",
        }
    }

    /// The delegation-relevant process this reason originates from, when the
    /// market rules allow documents of that process to be delegated at all.
    pub fn delegated_process(&self) -> Option<DelegatedProcess> {
        match self {
            BusinessReason::PeriodicMetering | BusinessReason::PeriodicFlexMetering => {
                Some(DelegatedProcess::ReceiveMeteringPointData)
            }
            BusinessReason::BalanceFixing => Some(DelegatedProcess::ReceiveEnergyResults),
            BusinessReason::WholesaleFixing => Some(DelegatedProcess::ReceiveWholesaleResults),
            BusinessReason::MoveIn | BusinessReason::IncorrectProcess => None,
        }
    }
}

impl FromStr for BusinessReason {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "periodic_metering" => Ok(BusinessReason::PeriodicMetering),
            "periodic_flex_metering" => Ok(BusinessReason::PeriodicFlexMetering),
            "balance_fixing" => Ok(BusinessReason::BalanceFixing),
            "wholesale_fixing" => Ok(BusinessReason::WholesaleFixing),
            "move_in" => Ok(BusinessReason::MoveIn),
            "incorrect_process" => Ok(BusinessReason::IncorrectProcess),
            other => Err(DomainError::InvalidMessage(format!(
                "unknown business reason: {other}"
            ))),
        }
    }
}

impl fmt::Display for BusinessReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire format an actor requests a document in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    CimXml,
    CimJson,
    Ebix,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::CimXml => "cim_xml",
            DocumentFormat::CimJson => "cim_json",
            DocumentFormat::Ebix => "ebix",
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cim_xml" => Ok(DocumentFormat::CimXml),
            "cim_json" => Ok(DocumentFormat::CimJson),
            "ebix" => Ok(DocumentFormat::Ebix),
            other => Err(DomainError::InvalidMessage(format!(
                "unknown document format: {other}"
            ))),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process scope a delegation relationship is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelegatedProcess {
    ReceiveMeteringPointData,
    ReceiveEnergyResults,
    ReceiveWholesaleResults,
}
