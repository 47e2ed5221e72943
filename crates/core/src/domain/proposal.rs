use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;
use crate::pricing::checked_proposal_total;

pub const DEFAULT_VALIDITY_DAYS: u32 = 15;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(pub String);

impl LineItemId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

impl std::fmt::Display for LineItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl LineItem {
    /// A fresh row as the form creates it: one unit, no price yet.
    pub fn blank() -> Self {
        Self {
            id: LineItemId::generate(),
            description: String::new(),
            quantity: Decimal::ONE,
            unit_price: Decimal::ZERO,
        }
    }
}

/// Field edits applied in place to an existing line item.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemPatch {
    pub description: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyInfo {
    pub name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientInfo {
    pub name: String,
    pub contact_name: String,
    pub project_title: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Formal,
    Modern,
    Persuasive,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Formal => "formal",
            Self::Modern => "modern",
            Self::Persuasive => "persuasive",
        }
    }
}

impl std::str::FromStr for Tone {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "formal" => Ok(Self::Formal),
            "modern" => Ok(Self::Modern),
            "persuasive" => Ok(Self::Persuasive),
            other => Err(DomainError::UnknownTone(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalInput {
    pub sender: CompanyInfo,
    pub client: ClientInfo,
    pub project_description: String,
    pub items: Vec<LineItem>,
    pub validity_days: u32,
    pub tone: Tone,
}

impl Default for ProposalInput {
    fn default() -> Self {
        Self {
            sender: CompanyInfo::default(),
            client: ClientInfo::default(),
            project_description: String::new(),
            items: Vec::new(),
            validity_days: DEFAULT_VALIDITY_DAYS,
            tone: Tone::Formal,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreflightWarning {
    EmptyLineItems,
}

impl PreflightWarning {
    pub fn message(self) -> &'static str {
        match self {
            Self::EmptyLineItems => "no priced line items were added to the proposal",
        }
    }
}

impl ProposalInput {
    pub fn add_item(&mut self) -> LineItemId {
        let item = LineItem::blank();
        let id = item.id.clone();
        self.items.push(item);
        id
    }

    pub fn update_item(
        &mut self,
        id: &LineItemId,
        patch: LineItemPatch,
    ) -> Result<(), DomainError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or_else(|| DomainError::LineItemNotFound(id.clone()))?;

        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(quantity) = patch.quantity {
            item.quantity = quantity;
        }
        if let Some(unit_price) = patch.unit_price {
            item.unit_price = unit_price;
        }
        Ok(())
    }

    pub fn remove_item(&mut self, id: &LineItemId) -> Result<LineItem, DomainError> {
        let position = self
            .items
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| DomainError::LineItemNotFound(id.clone()))?;
        Ok(self.items.remove(position))
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.validity_days == 0 {
            return Err(DomainError::InvalidValidityPeriod);
        }

        let mut seen = BTreeSet::new();
        for item in &self.items {
            if !seen.insert(&item.id) {
                return Err(DomainError::DuplicateLineItem(item.id.clone()));
            }
            if item.quantity <= Decimal::ZERO {
                return Err(DomainError::NonPositiveQuantity(item.id.clone()));
            }
            if item.unit_price < Decimal::ZERO {
                return Err(DomainError::NegativeUnitPrice(item.id.clone()));
            }
        }
        checked_proposal_total(&self.items)?;

        Ok(())
    }

    pub fn preflight_warnings(&self) -> Vec<PreflightWarning> {
        let mut warnings = Vec::new();
        if self.items.is_empty() {
            warnings.push(PreflightWarning::EmptyLineItems);
        }
        warnings
    }
}

/// Content returned by the generation service. Every field is required; a
/// value only exists once the raw payload passed schema validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalOutput {
    pub title: String,
    pub introduction: String,
    pub objective: String,
    pub methodology: Vec<String>,
    pub timeline: String,
    pub investment_text: String,
    pub terms_and_conditions: Vec<String>,
    pub closing: String,
}
