use serde_json::Value;
use thiserror::Error;

use crate::domain::proposal::ProposalOutput;
use crate::schema::OutputSchema;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("generation payload is empty")]
    Empty,
    #[error("generation payload is not valid JSON: {0}")]
    Syntax(String),
    #[error("generation payload must be a JSON object")]
    NotAnObject,
    #[error("generation payload is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` must be {expected}")]
    WrongType { field: &'static str, expected: &'static str },
}

/// Parses the raw service payload into a fully populated [`ProposalOutput`].
///
/// The payload must be a bare JSON object carrying every schema field with the
/// declared shape. Nothing is coerced or defaulted and text is passed through
/// verbatim. Keys outside the schema are ignored.
pub fn parse_proposal_output(raw: &str) -> Result<ProposalOutput, ParseError> {
    parse_with_schema(raw, &OutputSchema::proposal())
}

pub fn parse_with_schema(raw: &str, schema: &OutputSchema) -> Result<ProposalOutput, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let value: Value =
        serde_json::from_str(raw).map_err(|error| ParseError::Syntax(error.to_string()))?;
    validate_shape(&value, schema)?;

    serde_json::from_value(value).map_err(|error| ParseError::Syntax(error.to_string()))
}

fn validate_shape(value: &Value, schema: &OutputSchema) -> Result<(), ParseError> {
    let object = value.as_object().ok_or(ParseError::NotAnObject)?;

    for field in &schema.fields {
        let entry = object.get(field.name).ok_or(ParseError::MissingField(field.name))?;
        if entry.is_null() {
            return Err(ParseError::MissingField(field.name));
        }
        if !field.kind.matches(entry) {
            return Err(ParseError::WrongType {
                field: field.name,
                expected: field.kind.describe(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{parse_proposal_output, ParseError};

    fn full_payload() -> Value {
        json!({
            "title": "Proposta de Redesenho",
            "introduction": "Prezado Bruno,\n\nAgradecemos a oportunidade.",
            "objective": "Modernizar o site.",
            "methodology": ["Descoberta", "Design", "Implantação"],
            "timeline": "Seis semanas.",
            "investmentText": "Um investimento que se paga.",
            "termsAndConditions": ["Validade de 15 dias", "Pagamento em 2 parcelas"],
            "closing": "Ficamos à disposição."
        })
    }

    #[test]
    fn accepts_complete_payload_verbatim() {
        let raw = full_payload().to_string();
        let output = parse_proposal_output(&raw).expect("complete payload parses");

        assert_eq!(output.title, "Proposta de Redesenho");
        assert_eq!(output.introduction, "Prezado Bruno,\n\nAgradecemos a oportunidade.");
        assert_eq!(output.methodology, vec!["Descoberta", "Design", "Implantação"]);
        assert_eq!(output.investment_text, "Um investimento que se paga.");
        assert_eq!(output.terms_and_conditions.len(), 2);
        assert_eq!(output.closing, "Ficamos à disposição.");
    }

    #[test]
    fn rejects_empty_and_blank_payloads() {
        assert_eq!(parse_proposal_output(""), Err(ParseError::Empty));
        assert_eq!(parse_proposal_output("  \n"), Err(ParseError::Empty));
    }

    #[test]
    fn rejects_non_json_text() {
        let error = parse_proposal_output("Aqui está a sua proposta!").expect_err("prose");
        assert!(matches!(error, ParseError::Syntax(_)));
    }

    #[test]
    fn rejects_markdown_fenced_json() {
        let raw = format!("```json\n{}\n```", full_payload());
        assert!(matches!(parse_proposal_output(&raw), Err(ParseError::Syntax(_))));
    }

    #[test]
    fn rejects_non_object_json() {
        assert_eq!(parse_proposal_output("[1, 2]"), Err(ParseError::NotAnObject));
    }

    #[test]
    fn title_only_payload_is_missing_fields() {
        assert_eq!(
            parse_proposal_output(r#"{"title":"X"}"#),
            Err(ParseError::MissingField("introduction"))
        );
    }

    #[test]
    fn each_missing_field_is_rejected() {
        for key in [
            "title",
            "introduction",
            "objective",
            "methodology",
            "timeline",
            "investmentText",
            "termsAndConditions",
            "closing",
        ] {
            let mut payload = full_payload();
            payload.as_object_mut().expect("object").remove(key);

            assert_eq!(
                parse_proposal_output(&payload.to_string()),
                Err(ParseError::MissingField(key)),
                "missing `{key}` should be rejected"
            );
        }
    }

    #[test]
    fn null_fields_count_as_missing() {
        let mut payload = full_payload();
        payload["timeline"] = Value::Null;

        assert_eq!(
            parse_proposal_output(&payload.to_string()),
            Err(ParseError::MissingField("timeline"))
        );
    }

    #[test]
    fn scalar_lists_are_rejected_not_coerced() {
        let mut payload = full_payload();
        payload["methodology"] = json!("Descoberta, Design e Implantação");
        assert_eq!(
            parse_proposal_output(&payload.to_string()),
            Err(ParseError::WrongType { field: "methodology", expected: "array of strings" })
        );

        let mut payload = full_payload();
        payload["termsAndConditions"] = json!("Validade de 15 dias");
        assert!(matches!(
            parse_proposal_output(&payload.to_string()),
            Err(ParseError::WrongType { field: "termsAndConditions", .. })
        ));
    }

    #[test]
    fn list_entries_must_be_text() {
        let mut payload = full_payload();
        payload["methodology"] = json!(["Descoberta", 2]);
        assert!(matches!(
            parse_proposal_output(&payload.to_string()),
            Err(ParseError::WrongType { field: "methodology", .. })
        ));
    }

    #[test]
    fn scalar_fields_must_be_text() {
        let mut payload = full_payload();
        payload["title"] = json!(["Proposta"]);
        assert_eq!(
            parse_proposal_output(&payload.to_string()),
            Err(ParseError::WrongType { field: "title", expected: "string" })
        );
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut payload = full_payload();
        payload["notes"] = json!("extra");
        assert!(parse_proposal_output(&payload.to_string()).is_ok());
    }
}
