//! Printable proposal document.
//!
//! Renders the validated generation output together with the user's own
//! pricing data into a single HTML page meant for the browser's print dialog.
//! Every amount shown is computed here from the line items, never taken from
//! generated text.

use std::collections::HashMap;
use std::error::Error as _;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use proposta_core::config::RenderConfig;
use proposta_core::pricing::round_money;
use proposta_core::{line_total, proposal_total, ClientInfo, CompanyInfo};
use proposta_core::{ProposalInput, ProposalOutput};
use rust_decimal::Decimal;
use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;
use tracing::info;

pub const PROPOSAL_TEMPLATE: &str = "proposal.html";

const MONTHS_PT_BR: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to load proposal templates: {0}")]
    Load(String),
    #[error("failed to render proposal document: {0}")]
    Render(String),
}

/// Register the filters used by proposal templates.
///
/// - `brl`: formats an amount as Brazilian Real, e.g. `total | brl` -> `R$ 1.234,56`
pub fn register_template_filters(tera: &mut Tera) {
    tera.register_filter("brl", brl_filter);
}

fn brl_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let amount = match value {
        tera::Value::String(text) => text.parse::<Decimal>().ok(),
        tera::Value::Number(number) => number.to_string().parse::<Decimal>().ok(),
        tera::Value::Null => Some(Decimal::ZERO),
        _ => None,
    };
    let amount = amount.ok_or_else(|| {
        tera::Error::msg(format!("brl filter expects a numeric amount, got {value}"))
    })?;

    Ok(tera::Value::String(format_brl(amount)))
}

/// `R$ 1.234,56`: dot thousands separator, comma decimal separator, two places.
pub fn format_brl(amount: Decimal) -> String {
    let rounded = round_money(amount);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let digits = format!("{:.2}", rounded.abs());
    let (integer, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("{sign}R$ {grouped},{cents}")
}

pub fn format_quantity(quantity: Decimal) -> String {
    quantity.normalize().to_string().replace('.', ",")
}

/// `16 de outubro de 2026`
pub fn format_long_date(date: NaiveDate) -> String {
    format!("{} de {} de {}", date.day(), MONTHS_PT_BR[date.month0() as usize], date.year())
}

#[derive(Debug, Serialize)]
struct DocumentRow<'a> {
    description: &'a str,
    quantity: String,
    unit_price: Decimal,
    line_total: Decimal,
}

#[derive(Debug, Serialize)]
struct DocumentContext<'a> {
    sender: &'a CompanyInfo,
    client: &'a ClientInfo,
    validity_days: u32,
    issued_on: String,
    proposal: &'a ProposalOutput,
    rows: Vec<DocumentRow<'a>>,
    total: Decimal,
}

#[derive(Clone, Debug)]
pub struct ProposalRenderer {
    tera: Tera,
}

impl ProposalRenderer {
    /// Renderer backed by the template compiled into the binary.
    pub fn embedded() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        register_template_filters(&mut tera);
        tera.add_raw_template(
            PROPOSAL_TEMPLATE,
            include_str!("../../../templates/proposals/proposal.html"),
        )
        .map_err(|error| RenderError::Load(describe(&error)))?;

        Ok(Self { tera })
    }

    /// Renderer backed by `<dir>/proposal.html` (and anything it includes).
    pub fn from_dir(dir: &Path) -> Result<Self, RenderError> {
        if !dir.is_dir() {
            return Err(RenderError::Load(format!(
                "template directory `{}` does not exist",
                dir.display()
            )));
        }

        let mut tera = Tera::new(&format!("{}/**/*", dir.display()))
            .map_err(|error| RenderError::Load(describe(&error)))?;
        register_template_filters(&mut tera);

        if !tera.get_template_names().any(|name| name == PROPOSAL_TEMPLATE) {
            return Err(RenderError::Load(format!(
                "template directory `{}` has no `{PROPOSAL_TEMPLATE}`",
                dir.display()
            )));
        }

        Ok(Self { tera })
    }

    pub fn from_config(config: &RenderConfig) -> Result<Self, RenderError> {
        match &config.template_dir {
            Some(dir) => {
                let renderer = Self::from_dir(dir)?;
                info!(
                    event_name = "system.render.templates_loaded",
                    correlation_id = "bootstrap",
                    template_dir = %dir.display(),
                    "proposal templates loaded from filesystem"
                );
                Ok(renderer)
            }
            None => Self::embedded(),
        }
    }

    pub fn render(
        &self,
        input: &ProposalInput,
        proposal: &ProposalOutput,
        issued_on: NaiveDate,
    ) -> Result<String, RenderError> {
        let rows = input
            .items
            .iter()
            .map(|item| DocumentRow {
                description: &item.description,
                quantity: format_quantity(item.quantity),
                unit_price: item.unit_price,
                line_total: line_total(item),
            })
            .collect();

        let document = DocumentContext {
            sender: &input.sender,
            client: &input.client,
            validity_days: input.validity_days,
            issued_on: format_long_date(issued_on),
            proposal,
            rows,
            total: proposal_total(&input.items),
        };

        let context = Context::from_serialize(&document)
            .map_err(|error| RenderError::Render(describe(&error)))?;
        self.tera
            .render(PROPOSAL_TEMPLATE, &context)
            .map_err(|error| RenderError::Render(describe(&error)))
    }
}

/// Tera keeps the useful part of a failure in the source chain.
fn describe(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::NaiveDate;
    use proposta_core::config::RenderConfig;
    use proposta_core::{ClientInfo, CompanyInfo, LineItem, LineItemId, ProposalInput};
    use proposta_core::{compile_prompt, proposal_total, ProposalOutput, Tone};
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{
        brl_filter, format_brl, format_long_date, format_quantity, ProposalRenderer, RenderError,
    };

    fn input() -> ProposalInput {
        ProposalInput {
            sender: CompanyInfo {
                name: "Acme Digital".to_string(),
                contact_name: "Ana Souza".to_string(),
                email: "ana@acme.com.br".to_string(),
                phone: "(11) 4000-0000".to_string(),
                address: String::new(),
            },
            client: ClientInfo {
                name: "Beta Comércio".to_string(),
                contact_name: "Bruno Lima".to_string(),
                project_title: "Novo Portal".to_string(),
            },
            project_description: "Portal de autoatendimento.".to_string(),
            items: vec![
                LineItem {
                    id: LineItemId("a".to_string()),
                    description: "Design".to_string(),
                    quantity: Decimal::new(2, 0),
                    unit_price: Decimal::new(5000, 2),
                },
                LineItem {
                    id: LineItemId("b".to_string()),
                    description: "Desenvolvimento".to_string(),
                    quantity: Decimal::new(1, 0),
                    unit_price: Decimal::new(10_000, 2),
                },
            ],
            validity_days: 15,
            tone: Tone::Formal,
        }
    }

    fn output() -> ProposalOutput {
        ProposalOutput {
            title: "Proposta Comercial: Novo Portal".to_string(),
            introduction: "Prezado Bruno,\n\nÉ um prazer apresentar esta proposta.".to_string(),
            objective: "Entregar um portal moderno.".to_string(),
            methodology: vec!["Imersão".to_string(), "Entrega".to_string()],
            timeline: "Oito semanas.".to_string(),
            investment_text: "Investimento alinhado ao escopo.".to_string(),
            terms_and_conditions: vec!["Pagamento em 30 dias.".to_string()],
            closing: "Aguardamos seu retorno.".to_string(),
        }
    }

    fn issued_on() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date")
    }

    #[test]
    fn brl_formatting_groups_thousands_and_uses_comma_decimals() {
        assert_eq!(format_brl(Decimal::new(200, 0)), "R$ 200,00");
        assert_eq!(format_brl(Decimal::new(123_456, 2)), "R$ 1.234,56");
        assert_eq!(format_brl(Decimal::new(1_234_567_891, 3)), "R$ 1.234.567,89");
        assert_eq!(format_brl(Decimal::ZERO), "R$ 0,00");
        assert_eq!(format_brl(Decimal::new(-55, 1)), "-R$ 5,50");
    }

    #[test]
    fn brl_filter_accepts_decimal_strings_and_numbers() {
        let args = HashMap::new();
        assert_eq!(brl_filter(&json!("200.00"), &args).expect("string"), json!("R$ 200,00"));
        assert_eq!(brl_filter(&json!(1234.5), &args).expect("number"), json!("R$ 1.234,50"));
        assert!(brl_filter(&json!("dez reais"), &args).is_err());
        assert!(brl_filter(&json!([1, 2]), &args).is_err());
    }

    #[test]
    fn dates_and_quantities_use_brazilian_conventions() {
        assert_eq!(format_long_date(issued_on()), "16 de outubro de 2026");
        assert_eq!(
            format_long_date(NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date")),
            "1 de março de 2025"
        );
        assert_eq!(format_quantity(Decimal::new(2, 0)), "2");
        assert_eq!(format_quantity(Decimal::new(150, 2)), "1,5");
    }

    #[test]
    fn document_shows_locally_computed_totals() {
        let renderer = ProposalRenderer::embedded().expect("embedded template loads");
        let html = renderer.render(&input(), &output(), issued_on()).expect("renders");

        assert!(html.contains("Proposta Comercial: Novo Portal"));
        assert!(html.contains("Data: 16 de outubro de 2026"));
        assert!(html.contains("Validade: 15 dias"));
        assert!(html.contains("R$ 50,00"));
        assert!(html.contains("R$ 100,00"));
        assert!(html.contains("R$ 200,00"));
        assert!(html.contains("<li>Imersão</li>"));
        assert!(html.contains("A/C: Bruno Lima"));
        assert!(html.contains("Proposta gerada automaticamente por Acme Digital."));
    }

    #[test]
    fn generated_text_is_escaped() {
        let renderer = ProposalRenderer::embedded().expect("embedded template loads");
        let mut proposal = output();
        proposal.introduction = "<script>alert('x')</script>".to_string();

        let html = renderer.render(&input(), &proposal, issued_on()).expect("renders");
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn prompt_and_document_show_the_same_rounded_total() {
        let renderer = ProposalRenderer::embedded().expect("embedded template loads");
        let cases = [
            (Decimal::new(3, 0), Decimal::new(3335, 3)),
            (Decimal::ONE, Decimal::new(5, 3)),
            (Decimal::ONE, Decimal::new(12_345_649, 4)),
            (Decimal::new(2, 0), Decimal::new(13_375, 4)),
        ];

        for (quantity, unit_price) in cases {
            let mut data = input();
            data.items = vec![LineItem {
                id: LineItemId("x".to_string()),
                description: "Serviço".to_string(),
                quantity,
                unit_price,
            }];

            let prompt = compile_prompt(&data).instructions;
            let prompt_total = prompt
                .split("<<<VALOR TOTAL>>>\n")
                .nth(1)
                .and_then(|rest| rest.split(" (BRL)").next())
                .and_then(|amount| amount.parse::<Decimal>().ok())
                .expect("prompt carries a numeric total");
            let html = renderer.render(&data, &output(), issued_on()).expect("renders");

            let shown = format_brl(proposal_total(&data.items));
            assert_eq!(format_brl(prompt_total), shown);
            assert!(html.contains(&shown), "document should show {shown}");
        }
    }

    #[test]
    fn sub_cent_total_rounds_up_at_the_midpoint() {
        let renderer = ProposalRenderer::embedded().expect("embedded template loads");
        let mut data = input();
        data.items = vec![LineItem {
            id: LineItemId("x".to_string()),
            description: "Horas".to_string(),
            quantity: Decimal::new(3, 0),
            unit_price: Decimal::new(3335, 3),
        }];

        let html = renderer.render(&data, &output(), issued_on()).expect("renders");
        assert!(html.contains("R$ 10,01"));
        assert!(compile_prompt(&data).instructions.contains("10.01 (BRL)"));
    }

    #[test]
    fn empty_item_list_renders_zero_total() {
        let renderer = ProposalRenderer::embedded().expect("embedded template loads");
        let mut data = input();
        data.items.clear();

        let html = renderer.render(&data, &output(), issued_on()).expect("renders");
        assert!(html.contains("R$ 0,00"));
    }

    #[test]
    fn template_dir_overrides_embedded_template() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("proposal.html"),
            "<p>{{ proposal.title }} | {{ total | brl }} | {{ issued_on }}</p>",
        )
        .expect("write template");

        let renderer = ProposalRenderer::from_config(&RenderConfig {
            template_dir: Some(dir.path().to_path_buf()),
        })
        .expect("filesystem template loads");
        let html = renderer.render(&input(), &output(), issued_on()).expect("renders");

        assert_eq!(
            html,
            "<p>Proposta Comercial: Novo Portal | R$ 200,00 | 16 de outubro de 2026</p>"
        );
    }

    #[test]
    fn template_dir_without_proposal_template_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("other.html"), "<p></p>").expect("write template");

        let result = ProposalRenderer::from_dir(dir.path());
        assert!(matches!(
            result,
            Err(RenderError::Load(message)) if message.contains("proposal.html")
        ));

        let missing = ProposalRenderer::from_dir(&dir.path().join("missing"));
        assert!(matches!(missing, Err(RenderError::Load(_))));
    }
}
