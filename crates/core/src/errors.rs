use thiserror::Error;

use crate::domain::proposal::LineItemId;
use crate::response::ParseError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("validity period must be at least one day")]
    InvalidValidityPeriod,
    #[error("line item `{0}` must have a quantity greater than zero")]
    NonPositiveQuantity(LineItemId),
    #[error("line item `{0}` must not have a negative unit price")]
    NegativeUnitPrice(LineItemId),
    #[error("line item `{0}` pushes the proposal amount out of the supported range")]
    AmountOutOfRange(LineItemId),
    #[error("line item `{0}` was not found")]
    LineItemNotFound(LineItemId),
    #[error("line item id `{0}` is used more than once")]
    DuplicateLineItem(LineItemId),
    #[error("unsupported tone `{0}` (expected formal|modern|persuasive)")]
    UnknownTone(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error(transparent)]
    InvalidInput(#[from] DomainError),
    #[error("a proposal generation is already in progress")]
    AlreadyGenerating,
    #[error("generation service failure{}: {message}", status_suffix(.status))]
    Service { status: Option<u16>, message: String },
    #[error("generation service returned no content")]
    EmptyResponse,
    #[error(transparent)]
    Parse(#[from] ParseError),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" (status {code})")).unwrap_or_default()
}

impl GenerationError {
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service { status: None, message: message.into() }
    }

    /// Stable label for logs and API payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::InvalidInput(_) => "invalid_input",
            Self::AlreadyGenerating => "already_generating",
            Self::Service { .. } => "service",
            Self::EmptyResponse => "empty_response",
            Self::Parse(_) => "parse",
        }
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Conflict { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { kind: &'static str, message: String, correlation_id: String },
    #[error("conflict: {message}")]
    Conflict { kind: &'static str, message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { kind: &'static str, message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { kind: &'static str, message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "Os dados da proposta estão incompletos ou inválidos. Revise o formulário."
            }
            Self::Conflict { .. } => {
                "Uma proposta já está sendo gerada. Aguarde a conclusão antes de tentar novamente."
            }
            Self::ServiceUnavailable { .. } => {
                "Ocorreu um erro ao gerar a proposta. Verifique sua conexão e tente novamente."
            }
            Self::Internal { kind: "configuration", .. } => {
                "Erro de configuração: a chave de acesso não foi encontrada."
            }
            Self::Internal { .. } => "Erro interno ao montar a proposta. Tente novamente.",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest { kind, .. }
            | Self::Conflict { kind, .. }
            | Self::ServiceUnavailable { kind, .. }
            | Self::Internal { kind, .. } => *kind,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::Conflict { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl From<GenerationError> for InterfaceError {
    fn from(value: GenerationError) -> Self {
        let kind = value.kind();
        let message = value.to_string();
        let correlation_id = "unassigned".to_owned();
        match value {
            GenerationError::InvalidInput(_) => Self::BadRequest { kind, message, correlation_id },
            GenerationError::AlreadyGenerating => Self::Conflict { kind, message, correlation_id },
            GenerationError::Service { .. }
            | GenerationError::EmptyResponse
            | GenerationError::Parse(_) => {
                Self::ServiceUnavailable { kind, message, correlation_id }
            }
            GenerationError::Configuration(_) => Self::Internal { kind, message, correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::proposal::LineItemId;
    use crate::errors::{DomainError, GenerationError, InterfaceError};
    use crate::response::ParseError;

    #[test]
    fn invalid_input_maps_to_bad_request() {
        let interface = GenerationError::from(DomainError::NonPositiveQuantity(LineItemId(
            "item-1".to_owned(),
        )))
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest { ref correlation_id, kind: "invalid_input", .. }
                if correlation_id == "req-1"
        ));
    }

    #[test]
    fn concurrent_request_maps_to_conflict() {
        let interface = GenerationError::AlreadyGenerating.into_interface("req-2");
        assert!(matches!(interface, InterfaceError::Conflict { .. }));
        assert_eq!(interface.correlation_id(), "req-2");
    }

    #[test]
    fn service_side_failures_share_one_retry_message() {
        let failures = [
            GenerationError::Service { status: Some(503), message: "overloaded".to_owned() },
            GenerationError::EmptyResponse,
            GenerationError::Parse(ParseError::MissingField("closing")),
        ];

        for failure in failures {
            let kind = failure.kind();
            let interface = failure.into_interface("req-3");
            assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
            assert_eq!(interface.kind(), kind);
            assert_eq!(
                interface.user_message(),
                "Ocorreu um erro ao gerar a proposta. Verifique sua conexão e tente novamente."
            );
        }
    }

    #[test]
    fn missing_credentials_map_to_internal() {
        let interface = GenerationError::Configuration("llm.api_key is not set".to_owned())
            .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { kind: "configuration", .. }));
        assert_eq!(
            interface.user_message(),
            "Erro de configuração: a chave de acesso não foi encontrada."
        );
    }

    #[test]
    fn error_kinds_stay_distinguishable() {
        assert_eq!(GenerationError::Configuration(String::new()).kind(), "configuration");
        assert_eq!(GenerationError::service("down").kind(), "service");
        assert_eq!(GenerationError::EmptyResponse.kind(), "empty_response");
        assert_eq!(GenerationError::Parse(ParseError::Empty).kind(), "parse");
    }

    #[test]
    fn service_error_message_includes_status_when_known() {
        let with_status =
            GenerationError::Service { status: Some(429), message: "quota".to_owned() };
        assert_eq!(with_status.to_string(), "generation service failure (status 429): quota");
        assert_eq!(
            GenerationError::service("connection refused").to_string(),
            "generation service failure: connection refused"
        );
    }
}
