//! Read-only view of an invoice and the surfaces that draw it.
//!
//! [`InvoiceView`] pairs a document snapshot with its derived totals and every
//! string the preview shows. The terminal table and the Typst document are both
//! rendered from it.

use comfy_table::{Attribute, Cell, CellAlignment, Table};
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera, Value};

use crate::error::PrintError;
use crate::model::{Currency, DATE_FORMAT, InvoiceDocument, Party};
use crate::totals::{Totals, compute_totals, line_amount};

pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/invoice.typ.tera");

const TEMPLATE_NAME: &str = "invoice.typ";

const SENDER_PLACEHOLDER: &str = "Sender name";
const CLIENT_PLACEHOLDER: &str = "Client name";
const DESCRIPTION_PLACEHOLDER: &str = "Description...";

#[derive(Debug, Clone, Serialize)]
pub struct PartyView {
    pub name: String,
    pub email: String,
    pub address: String,
    pub tax_id: String,
}

impl PartyView {
    fn new(party: &Party, placeholder: &str) -> Self {
        PartyView {
            name: non_empty_or(&party.name, placeholder),
            email: party.email.clone(),
            address: party.address.clone(),
            tax_id: party.tax_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LineView {
    pub description: String,
    pub quantity: i64,
    pub unit_price: String,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsView {
    pub subtotal: String,
    pub tax_label: String,
    pub tax_amount: String,
    pub total: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceView {
    pub document: InvoiceDocument,
    pub totals: Totals,
    pub number: String,
    pub issue_date: String,
    pub due_date: String,
    pub currency: Currency,
    pub sender: PartyView,
    pub client: PartyView,
    pub lines: Vec<LineView>,
    pub formatted: TotalsView,
    pub payment_method: String,
    pub bank_details: String,
    pub notes: String,
}

impl InvoiceView {
    pub fn build(document: InvoiceDocument) -> Self {
        let meta = &document.meta;
        let currency = meta.currency;
        let totals = compute_totals(&document.items, meta.tax_rate_percent);

        let lines = document
            .items
            .iter()
            .map(|item| LineView {
                description: non_empty_or(&item.description, DESCRIPTION_PLACEHOLDER),
                quantity: item.quantity,
                unit_price: currency.format(item.unit_price),
                amount: currency.format(line_amount(item)),
            })
            .collect();

        let formatted = TotalsView {
            subtotal: currency.format(totals.subtotal),
            tax_label: format!("Tax ({}%)", meta.tax_rate_percent),
            tax_amount: currency.format(totals.tax_amount),
            total: currency.format(totals.total),
        };

        InvoiceView {
            number: meta.number.clone(),
            issue_date: format_date(meta.issue_date),
            due_date: format_date(meta.due_date),
            currency,
            sender: PartyView::new(&document.sender, SENDER_PLACEHOLDER),
            client: PartyView::new(&document.client, CLIENT_PLACEHOLDER),
            lines,
            formatted,
            payment_method: meta.payment_method.clone(),
            bank_details: meta.bank_details.clone(),
            notes: meta.notes.clone(),
            totals,
            document,
        }
    }

    /// Plain-text rendition for the terminal editor.
    pub fn to_table(&self) -> String {
        let mut header = Table::new();
        header.set_header(vec![
            Cell::new(format!("INVOICE #{}", self.number)).add_attribute(Attribute::Bold),
            Cell::new("From"),
            Cell::new("Bill to"),
        ]);
        header.add_row(vec![
            Cell::new(format!(
                "Date: {}\nDue: {}\nMethod: {}",
                self.issue_date, self.due_date, self.payment_method
            )),
            Cell::new(party_block(&self.sender)),
            Cell::new(party_block(&self.client)),
        ]);

        let mut table = Table::new();
        table.set_header(vec![
            Cell::new("Service"),
            Cell::new("Qty"),
            Cell::new("Price"),
            Cell::new("Total"),
        ]);
        for line in &self.lines {
            table.add_row(vec![
                Cell::new(&line.description),
                Cell::new(line.quantity).set_alignment(CellAlignment::Center),
                Cell::new(&line.unit_price).set_alignment(CellAlignment::Right),
                Cell::new(&line.amount)
                    .set_alignment(CellAlignment::Right)
                    .add_attribute(Attribute::Bold),
            ]);
        }
        table.add_row(vec![
            Cell::new(""),
            Cell::new(""),
            Cell::new("Subtotal"),
            Cell::new(&self.formatted.subtotal).set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(""),
            Cell::new(""),
            Cell::new(&self.formatted.tax_label),
            Cell::new(&self.formatted.tax_amount).set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(""),
            Cell::new(""),
            Cell::new("Total").add_attribute(Attribute::Bold),
            Cell::new(&self.formatted.total)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold),
        ]);

        let mut out = format!("{header}\n{table}\n");
        if !self.bank_details.is_empty() {
            out.push_str(&format!("Bank details: {}\n", self.bank_details));
        }
        if !self.notes.is_empty() {
            out.push_str(&format!("{}\n", self.notes));
        }
        out
    }
}

/// Renders invoice views to Typst source.
pub struct TypstRenderer {
    tera: Tera,
}

impl TypstRenderer {
    pub fn new() -> Result<Self, PrintError> {
        TypstRenderer::with_template(DEFAULT_TEMPLATE)
    }

    pub fn with_template(source: &str) -> Result<Self, PrintError> {
        let mut tera = Tera::default();
        tera.register_filter("typst_str", typst_str_filter);
        tera.add_raw_template(TEMPLATE_NAME, source)?;
        Ok(TypstRenderer { tera })
    }

    pub fn render(&self, view: &InvoiceView) -> Result<String, PrintError> {
        let context = Context::from_serialize(view)?;
        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }
}

/// Quotes a value as a Typst string literal so user text never reaches markup.
pub fn typst_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn typst_str_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    Ok(Value::String(typst_string(&raw)))
}

fn party_block(party: &PartyView) -> String {
    [&party.name, &party.tax_id, &party.email, &party.address]
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

fn non_empty_or(value: &str, placeholder: &str) -> String {
    if value.trim().is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

fn format_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}
