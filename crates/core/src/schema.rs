//! Output contract shared by the prompt compiler and the response validator.
//!
//! The descriptor sent to the generation service and the gate that checks its
//! answer are both derived from [`OutputSchema::proposal`], so the two sides
//! cannot drift apart.

use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextList,
}

impl FieldKind {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::TextList => "array of strings",
        }
    }

    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Text => value.is_string(),
            Self::TextList => value
                .as_array()
                .map(|entries| entries.iter().all(Value::is_string))
                .unwrap_or(false),
        }
    }

    fn descriptor(self, description: &str) -> Value {
        match self {
            Self::Text => json!({ "type": "STRING", "description": description }),
            Self::TextList => json!({
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": description,
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SchemaField {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutputSchema {
    pub fields: Vec<SchemaField>,
}

impl OutputSchema {
    /// The eight proposal sections, in document order. All are required.
    pub fn proposal() -> Self {
        let field = |name, kind, description| SchemaField { name, kind, description };
        Self {
            fields: vec![
                field("title", FieldKind::Text, "Um título atraente para a proposta"),
                field(
                    "introduction",
                    FieldKind::Text,
                    "Texto introdutório cumprimentando o cliente e contextualizando",
                ),
                field(
                    "objective",
                    FieldKind::Text,
                    "Resumo claro do objetivo da proposta e problemas resolvidos",
                ),
                field(
                    "methodology",
                    FieldKind::TextList,
                    "Lista de passos ou pontos sobre como o trabalho será entregue",
                ),
                field(
                    "timeline",
                    FieldKind::Text,
                    "Descrição textual da estimativa de tempo de execução",
                ),
                field(
                    "investmentText",
                    FieldKind::Text,
                    "Um texto persuasivo justificando o investimento (não apenas a tabela de preços)",
                ),
                field(
                    "termsAndConditions",
                    FieldKind::TextList,
                    "Lista de termos essenciais, incluindo validade e condições gerais",
                ),
                field(
                    "closing",
                    FieldKind::Text,
                    "Texto de fechamento convidando para assinatura ou próxima reunião",
                ),
            ],
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }

    /// Schema descriptor in the shape the generation service accepts for
    /// schema-guided output.
    pub fn to_descriptor(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            properties.insert(field.name.to_string(), field.kind.descriptor(field.description));
        }
        let names: Vec<&str> = self.field_names().collect();

        json!({
            "type": "OBJECT",
            "properties": properties,
            "required": names,
            "propertyOrdering": names,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{FieldKind, OutputSchema};

    #[test]
    fn proposal_schema_lists_eight_required_fields_in_order() {
        let schema = OutputSchema::proposal();
        let names: Vec<_> = schema.field_names().collect();
        assert_eq!(
            names,
            vec![
                "title",
                "introduction",
                "objective",
                "methodology",
                "timeline",
                "investmentText",
                "termsAndConditions",
                "closing",
            ]
        );

        let descriptor = schema.to_descriptor();
        assert_eq!(descriptor["type"], "OBJECT");
        assert_eq!(descriptor["required"].as_array().map(Vec::len), Some(8));
        assert_eq!(descriptor["required"], descriptor["propertyOrdering"]);
    }

    #[test]
    fn list_fields_are_described_as_string_arrays() {
        let descriptor = OutputSchema::proposal().to_descriptor();

        assert_eq!(descriptor["properties"]["methodology"]["type"], "ARRAY");
        assert_eq!(descriptor["properties"]["methodology"]["items"], json!({ "type": "STRING" }));
        assert_eq!(descriptor["properties"]["termsAndConditions"]["type"], "ARRAY");
        assert_eq!(descriptor["properties"]["closing"]["type"], "STRING");
    }

    #[test]
    fn field_kinds_check_value_shapes() {
        assert!(FieldKind::Text.matches(&json!("ok")));
        assert!(!FieldKind::Text.matches(&json!(["ok"])));
        assert!(!FieldKind::Text.matches(&json!(null)));
        assert!(FieldKind::TextList.matches(&json!([])));
        assert!(FieldKind::TextList.matches(&json!(["a", "b"])));
        assert!(!FieldKind::TextList.matches(&json!("a")));
        assert!(!FieldKind::TextList.matches(&json!(["a", 2])));
    }
}
