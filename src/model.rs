use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FormattingError;

/// Date format used for every date field, both when editing and rendering.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Mxn,
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Mxn, Currency::Eur];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Mxn => "MXN",
            Currency::Eur => "EUR",
        }
    }

    /// Prefix used in front of the amount, following en-US conventions.
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Mxn => "MX$",
            Currency::Eur => "€",
        }
    }

    /// Label shown in currency selectors, e.g. `MXN ($)`.
    pub fn selector_label(self) -> &'static str {
        match self {
            Currency::Usd => "USD ($)",
            Currency::Mxn => "MXN ($)",
            Currency::Eur => "EUR (€)",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = FormattingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| FormattingError::UnsupportedCurrency(code.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InvoiceMeta {
    pub number: String,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub currency: Currency,
    pub tax_rate_percent: f64,
    pub notes: String,
    pub payment_method: String,
    pub bank_details: String,
}

const DEFAULT_NOTES: &str = "Gracias por confiar en mi trabajo. El pago debe realizarse \
    dentro de los 15 días posteriores a la recepción de esta factura.";

impl Default for InvoiceMeta {
    fn default() -> Self {
        InvoiceMeta {
            number: "001".to_string(),
            issue_date: Some(Local::now().date_naive()),
            due_date: None,
            currency: Currency::Usd,
            tax_rate_percent: 16.0,
            notes: DEFAULT_NOTES.to_string(),
            payment_method: "Transferencia Bancaria".to_string(),
            bank_details: String::new(),
        }
    }
}

/// Sender or client identity. Both sides of the invoice share this shape.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Party {
    pub name: String,
    pub email: String,
    pub address: String,
    pub tax_id: String,
}

impl Party {
    pub fn field(&self, field: PartyField) -> &str {
        match field {
            PartyField::Name => &self.name,
            PartyField::Email => &self.email,
            PartyField::Address => &self.address,
            PartyField::TaxId => &self.tax_id,
        }
    }

    pub fn field_mut(&mut self, field: PartyField) -> &mut String {
        match field {
            PartyField::Name => &mut self.name,
            PartyField::Email => &mut self.email,
            PartyField::Address => &mut self.address,
            PartyField::TaxId => &mut self.tax_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(pub u64);

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LineItem {
    pub id: LineItemId,
    pub description: String,
    pub quantity: i64,
    pub unit_price: f64,
}

impl LineItem {
    pub fn new(
        id: LineItemId,
        description: impl Into<String>,
        quantity: i64,
        unit_price: f64,
    ) -> Self {
        LineItem {
            id,
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    /// Row appended by "add item": empty description, one unit, zero price.
    pub fn blank(id: LineItemId) -> Self {
        LineItem::new(id, "", 1, 0.0)
    }
}

/// Everything the editor holds for one invoice.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InvoiceDocument {
    pub meta: InvoiceMeta,
    pub sender: Party,
    pub client: Party,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaField {
    Number,
    IssueDate,
    DueDate,
    Currency,
    TaxRatePercent,
    Notes,
    PaymentMethod,
    BankDetails,
}

impl MetaField {
    pub const ALL: [MetaField; 8] = [
        MetaField::Number,
        MetaField::IssueDate,
        MetaField::DueDate,
        MetaField::Currency,
        MetaField::TaxRatePercent,
        MetaField::PaymentMethod,
        MetaField::BankDetails,
        MetaField::Notes,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MetaField::Number => "Invoice number",
            MetaField::IssueDate => "Issue date",
            MetaField::DueDate => "Due date",
            MetaField::Currency => "Currency",
            MetaField::TaxRatePercent => "Tax rate (%)",
            MetaField::Notes => "Notes",
            MetaField::PaymentMethod => "Payment method",
            MetaField::BankDetails => "Bank details",
        }
    }
}

impl fmt::Display for MetaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyRole {
    Sender,
    Client,
}

impl fmt::Display for PartyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartyRole::Sender => f.write_str("Sender"),
            PartyRole::Client => f.write_str("Client"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyField {
    Name,
    Email,
    Address,
    TaxId,
}

impl PartyField {
    pub const ALL: [PartyField; 4] = [
        PartyField::Name,
        PartyField::TaxId,
        PartyField::Email,
        PartyField::Address,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PartyField::Name => "Name",
            PartyField::Email => "Email",
            PartyField::Address => "Address",
            PartyField::TaxId => "Tax ID",
        }
    }
}

impl fmt::Display for PartyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineItemField {
    Description,
    Quantity,
    UnitPrice,
}

impl LineItemField {
    pub const ALL: [LineItemField; 3] = [
        LineItemField::Description,
        LineItemField::Quantity,
        LineItemField::UnitPrice,
    ];
}

impl fmt::Display for LineItemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineItemField::Description => f.write_str("Description"),
            LineItemField::Quantity => f.write_str("Quantity"),
            LineItemField::UnitPrice => f.write_str("Unit price"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_codes_parse_case_insensitively() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(" MXN ".parse::<Currency>().unwrap(), Currency::Mxn);
        assert_eq!("Eur".parse::<Currency>().unwrap(), Currency::Eur);
    }

    #[test]
    fn unknown_currency_code_is_rejected() {
        let err = "GBP".parse::<Currency>().unwrap_err();
        assert!(matches!(err, FormattingError::UnsupportedCurrency(ref code) if code == "GBP"));
    }

    #[test]
    fn currency_serializes_as_code() {
        let json = serde_json::to_string(&Currency::Mxn).unwrap();
        assert_eq!(json, "\"MXN\"");
    }

    #[test]
    fn blank_line_item_has_one_unit_and_no_price() {
        let item = LineItem::blank(LineItemId(7));
        assert_eq!(item.description, "");
        assert_eq!(item.quantity, 1);
        assert_eq!(item.unit_price, 0.0);
    }
}
