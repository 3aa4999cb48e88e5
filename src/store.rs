//! The document state store.
//!
//! All invoice state lives in one [`InvoiceStore`] and changes only through the
//! named operations below. Every operation is total: bad input is coerced, an
//! unknown id or a forbidden removal is ignored.

use chrono::{NaiveDate, Utc};
use std::collections::HashSet;

use crate::coerce;
use crate::model::{
    Currency, DATE_FORMAT, InvoiceDocument, InvoiceMeta, LineItem, LineItemField, LineItemId,
    MetaField, Party, PartyField, PartyRole,
};

/// Issues line item ids from the wall clock in milliseconds, bumping past the
/// last issued value so two ids taken in the same millisecond still differ.
#[derive(Debug, Default)]
pub struct IdSource {
    last: u64,
}

impl IdSource {
    pub fn starting_after(last: u64) -> Self {
        IdSource { last }
    }

    /// `None` once `u64::MAX` has been issued.
    pub fn next_id(&mut self) -> Option<LineItemId> {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        self.last = now.max(self.last.checked_add(1)?);
        Some(LineItemId(self.last))
    }
}

#[derive(Debug)]
pub struct InvoiceStore {
    doc: InvoiceDocument,
    ids: IdSource,
    revision: u64,
}

impl Default for InvoiceStore {
    fn default() -> Self {
        InvoiceStore::seeded(InvoiceMeta::default(), Party::default())
    }
}

impl InvoiceStore {
    /// Starts a session with the given metadata and sender profile, an empty
    /// client and the two sample rows.
    pub fn seeded(meta: InvoiceMeta, sender: Party) -> Self {
        let items = vec![
            LineItem::new(LineItemId(1), "Diseño de Identidad Visual", 1, 500.0),
            LineItem::new(LineItemId(2), "Desarrollo Web One-Page", 1, 800.0),
        ];
        InvoiceStore::from_document(InvoiceDocument {
            meta,
            sender,
            client: Party::default(),
            items,
        })
    }

    /// Wraps an existing document. An empty item list gets one blank row so the
    /// store starts in a state it could have reached through its own operations.
    pub fn from_document(doc: InvoiceDocument) -> Self {
        let last = doc.items.iter().map(|i| i.id.0).max().unwrap_or(0);
        let mut store = InvoiceStore {
            doc,
            ids: IdSource::starting_after(last),
            revision: 0,
        };
        if store.doc.items.is_empty() {
            let id = store.fresh_id();
            store.doc.items.push(LineItem::blank(id));
        }
        store
    }

    /// Owned copy of the current state, detached from further edits.
    pub fn snapshot(&self) -> InvoiceDocument {
        self.doc.clone()
    }

    pub fn meta(&self) -> &InvoiceMeta {
        &self.doc.meta
    }

    pub fn party(&self, role: PartyRole) -> &Party {
        match role {
            PartyRole::Sender => &self.doc.sender,
            PartyRole::Client => &self.doc.client,
        }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.doc.items
    }

    pub fn item(&self, id: LineItemId) -> Option<&LineItem> {
        self.doc.items.iter().find(|i| i.id == id)
    }

    /// Number of mutations applied since the store was created.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn update_meta(&mut self, field: MetaField, value: &str) {
        let meta = &mut self.doc.meta;
        match field {
            MetaField::Number => meta.number = value.to_string(),
            MetaField::IssueDate => meta.issue_date = parse_date(value),
            MetaField::DueDate => meta.due_date = parse_date(value),
            MetaField::Currency => match value.parse::<Currency>() {
                Ok(currency) => meta.currency = currency,
                Err(e) => {
                    tracing::warn!("Ignoring currency change: {}", e);
                    return;
                }
            },
            MetaField::TaxRatePercent => meta.tax_rate_percent = coerce::float(value),
            MetaField::Notes => meta.notes = value.to_string(),
            MetaField::PaymentMethod => meta.payment_method = value.to_string(),
            MetaField::BankDetails => meta.bank_details = value.to_string(),
        }
        tracing::debug!(?field, "Updated invoice field");
        self.revision += 1;
    }

    pub fn update_party(&mut self, role: PartyRole, field: PartyField, value: &str) {
        let party = match role {
            PartyRole::Sender => &mut self.doc.sender,
            PartyRole::Client => &mut self.doc.client,
        };
        *party.field_mut(field) = value.to_string();
        tracing::debug!(?role, ?field, "Updated party field");
        self.revision += 1;
    }

    pub fn update_line_item(&mut self, id: LineItemId, field: LineItemField, value: &str) {
        let Some(item) = self.doc.items.iter_mut().find(|i| i.id == id) else {
            tracing::debug!(%id, "No line item to update");
            return;
        };
        match field {
            LineItemField::Description => item.description = value.to_string(),
            LineItemField::Quantity => item.quantity = coerce::integer(value),
            LineItemField::UnitPrice => item.unit_price = coerce::float(value),
        }
        tracing::debug!(%id, ?field, "Updated line item");
        self.revision += 1;
    }

    pub fn add_line_item(&mut self) -> LineItemId {
        let id = self.fresh_id();
        self.doc.items.push(LineItem::blank(id));
        tracing::debug!(%id, count = self.doc.items.len(), "Added line item");
        self.revision += 1;
        id
    }

    /// Next clock id, or the lowest id no row uses once the clock ids run out.
    fn fresh_id(&mut self) -> LineItemId {
        if let Some(id) = self.ids.next_id() {
            return id;
        }
        let taken: HashSet<u64> = self.doc.items.iter().map(|i| i.id.0).collect();
        let free = (1..=u64::MAX).find(|n| !taken.contains(n)).unwrap_or(0);
        tracing::debug!(id = free, "Clock ids exhausted, reusing a free id");
        LineItemId(free)
    }

    /// Removes the row unless it is the only one left.
    pub fn remove_line_item(&mut self, id: LineItemId) {
        if self.doc.items.len() <= 1 {
            tracing::debug!(%id, "Keeping the last line item");
            return;
        }
        let before = self.doc.items.len();
        self.doc.items.retain(|i| i.id != id);
        if self.doc.items.len() != before {
            tracing::debug!(%id, count = self.doc.items.len(), "Removed line item");
            self.revision += 1;
        }
    }
}

/// Empty or unparsable text clears the date.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> InvoiceStore {
        InvoiceStore::default()
    }

    #[test]
    fn seeded_store_has_two_sample_rows() {
        let store = store();
        let items = store.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, LineItemId(1));
        assert_eq!(items[0].unit_price, 500.0);
        assert_eq!(items[1].id, LineItemId(2));
        assert_eq!(items[1].unit_price, 800.0);
        assert_eq!(store.party(PartyRole::Client), &Party::default());
    }

    #[test]
    fn tax_rate_coerces_garbage_to_zero() {
        let mut store = store();
        store.update_meta(MetaField::TaxRatePercent, "8.875");
        assert_eq!(store.meta().tax_rate_percent, 8.875);
        store.update_meta(MetaField::TaxRatePercent, "abc");
        assert_eq!(store.meta().tax_rate_percent, 0.0);
        store.update_meta(MetaField::TaxRatePercent, "");
        assert_eq!(store.meta().tax_rate_percent, 0.0);
    }

    #[test]
    fn text_meta_fields_are_replaced() {
        let mut store = store();
        store.update_meta(MetaField::Number, "A-17");
        store.update_meta(MetaField::Notes, "Net 30");
        store.update_meta(MetaField::PaymentMethod, "PayPal");
        store.update_meta(MetaField::BankDetails, "CLABE 0123");
        let meta = store.meta();
        assert_eq!(meta.number, "A-17");
        assert_eq!(meta.notes, "Net 30");
        assert_eq!(meta.payment_method, "PayPal");
        assert_eq!(meta.bank_details, "CLABE 0123");
    }

    #[test]
    fn dates_parse_or_clear() {
        let mut store = store();
        store.update_meta(MetaField::DueDate, "2025-03-31");
        assert_eq!(store.meta().due_date, NaiveDate::from_ymd_opt(2025, 3, 31));
        store.update_meta(MetaField::DueDate, "soon");
        assert_eq!(store.meta().due_date, None);
        store.update_meta(MetaField::IssueDate, "");
        assert_eq!(store.meta().issue_date, None);
    }

    #[test]
    fn currency_accepts_known_codes_only() {
        let mut store = store();
        store.update_meta(MetaField::Currency, "eur");
        assert_eq!(store.meta().currency, Currency::Eur);
        let revision = store.revision();
        store.update_meta(MetaField::Currency, "BTC");
        assert_eq!(store.meta().currency, Currency::Eur);
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn parties_update_independently() {
        let mut store = store();
        store.update_party(PartyRole::Sender, PartyField::Name, "nd. studio");
        store.update_party(PartyRole::Client, PartyField::TaxId, "XAXX010101000");
        store.update_party(PartyRole::Client, PartyField::Address, "Calle 1, CDMX");
        assert_eq!(store.party(PartyRole::Sender).name, "nd. studio");
        assert_eq!(store.party(PartyRole::Sender).tax_id, "");
        assert_eq!(store.party(PartyRole::Client).tax_id, "XAXX010101000");
        assert_eq!(store.party(PartyRole::Client).address, "Calle 1, CDMX");
        assert_eq!(store.party(PartyRole::Client).name, "");
    }

    #[test]
    fn quantity_garbage_becomes_zero() {
        let mut store = store();
        let id = store.items()[0].id;
        store.update_line_item(id, LineItemField::Quantity, "5");
        assert_eq!(store.item(id).unwrap().quantity, 5);
        store.update_line_item(id, LineItemField::Quantity, "abc");
        assert_eq!(store.item(id).unwrap().quantity, 0);
    }

    #[test]
    fn price_garbage_becomes_zero() {
        let mut store = store();
        let id = store.items()[1].id;
        store.update_line_item(id, LineItemField::UnitPrice, "12.75");
        assert_eq!(store.item(id).unwrap().unit_price, 12.75);
        store.update_line_item(id, LineItemField::UnitPrice, "n/a");
        assert_eq!(store.item(id).unwrap().unit_price, 0.0);
    }

    #[test]
    fn updating_unknown_item_changes_nothing() {
        let mut store = store();
        let before = store.snapshot();
        store.update_line_item(LineItemId(999), LineItemField::Description, "ghost");
        assert_eq!(store.snapshot(), before);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn added_item_is_blank_and_last() {
        let mut store = store();
        let id = store.add_line_item();
        let last = store.items().last().unwrap();
        assert_eq!(last, &LineItem::blank(id));
        assert_eq!(store.items().len(), 3);
    }

    #[test]
    fn immediate_adds_get_distinct_ids() {
        let mut store = store();
        let a = store.add_line_item();
        let b = store.add_line_item();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn last_item_cannot_be_removed() {
        let mut store = store();
        let first = store.items()[0].id;
        let second = store.items()[1].id;
        store.remove_line_item(first);
        assert_eq!(store.items().len(), 1);
        for _ in 0..3 {
            store.remove_line_item(second);
            assert_eq!(store.items().len(), 1);
        }
        assert_eq!(store.items()[0].id, second);
    }

    #[test]
    fn removing_all_but_one_keeps_the_newest() {
        let mut store = store();
        let mut newest = None;
        for _ in 0..5 {
            newest = Some(store.add_line_item());
        }
        let newest = newest.unwrap();
        let others: Vec<_> = store
            .items()
            .iter()
            .map(|i| i.id)
            .filter(|id| *id != newest)
            .collect();
        for id in others {
            store.remove_line_item(id);
        }
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].id, newest);
    }

    #[test]
    fn removing_unknown_id_is_ignored() {
        let mut store = store();
        store.remove_line_item(LineItemId(42));
        assert_eq!(store.items().len(), 2);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn empty_document_gets_a_blank_row() {
        let doc = InvoiceDocument {
            meta: InvoiceMeta::default(),
            sender: Party::default(),
            client: Party::default(),
            items: Vec::new(),
        };
        let store = InvoiceStore::from_document(doc);
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].quantity, 1);
    }

    #[test]
    fn snapshot_is_detached_from_later_edits() {
        let mut store = store();
        let snapshot = store.snapshot();
        store.update_meta(MetaField::Number, "002");
        assert_eq!(snapshot.meta.number, "001");
        assert_eq!(store.meta().number, "002");
    }

    #[test]
    fn id_source_never_repeats() {
        let mut ids = IdSource::starting_after(u64::MAX - 10);
        let a = ids.next_id().unwrap();
        let b = ids.next_id().unwrap();
        assert_eq!(b.0, a.0 + 1);
    }

    #[test]
    fn id_source_runs_out_at_the_top() {
        let mut ids = IdSource::starting_after(u64::MAX - 1);
        assert_eq!(ids.next_id(), Some(LineItemId(u64::MAX)));
        assert_eq!(ids.next_id(), None);
    }

    #[test]
    fn adding_after_the_highest_id_reuses_a_free_one() {
        let mut doc = store().snapshot();
        doc.items[0].id = LineItemId(u64::MAX);
        let mut store = InvoiceStore::from_document(doc);

        let first = store.add_line_item();
        assert_eq!(first, LineItemId(1));
        let second = store.add_line_item();
        assert_eq!(second, LineItemId(3));
        assert_eq!(store.items().len(), 4);
    }
}
