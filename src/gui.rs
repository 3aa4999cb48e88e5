//! Desktop editor: form on the left, live invoice preview on the right.
//!
//! Narrow windows show one pane at a time behind Edit / Preview tabs.

use eframe::egui::{self, Color32, RichText, Ui};
use std::collections::HashMap;
use std::time::Duration;

use invoice_editor::model::DATE_FORMAT;
use invoice_editor::render::InvoiceView;
use invoice_editor::{
    ActiveView, Currency, EditorSession, LineItemField, LineItemId, MetaField, PartyField,
    PartyRole, PrintJob,
};

/// Below this width the editor and preview no longer fit side by side.
const WIDE_LAYOUT_MIN_WIDTH: f32 = 900.0;

const ACCENT: Color32 = Color32::from_rgb(255, 77, 0);

pub struct EditorApp {
    session: EditorSession,
    /// Raw text of numeric and date fields while they are being typed.
    drafts: HashMap<String, String>,
    jobs: Vec<PrintJob>,
    status: Option<String>,
}

impl EditorApp {
    pub fn new(session: EditorSession) -> Self {
        EditorApp {
            session,
            drafts: HashMap::new(),
            jobs: Vec::new(),
            status: None,
        }
    }

    fn poll_jobs(&mut self) {
        let (done, pending): (Vec<_>, Vec<_>) =
            self.jobs.drain(..).partition(PrintJob::is_finished);
        self.jobs = pending;
        for job in done {
            self.status = Some(match job.wait() {
                Ok(path) => format!("Saved {}", path.display()),
                Err(e) => format!("Print failed: {e}"),
            });
        }
    }

    fn toolbar(&mut self, ui: &mut Ui, wide: bool) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("nd.").strong().color(ACCENT));
            ui.label(RichText::new("factura").strong());

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("🖨 Print / PDF").clicked() {
                    self.jobs.push(self.session.print());
                    self.status = Some("Preparing invoice...".to_string());
                }
                if !wide {
                    let mut view = self.session.active_view();
                    ui.selectable_value(&mut view, ActiveView::Preview, "Preview");
                    ui.selectable_value(&mut view, ActiveView::Edit, "Edit");
                    if view != self.session.active_view() {
                        self.session.show(view);
                    }
                }
                if let Some(status) = &self.status {
                    ui.label(RichText::new(status).weak());
                }
            });
        });
    }

    fn editor(&mut self, ui: &mut Ui) {
        egui::ScrollArea::vertical()
            .id_salt("editor")
            .show(ui, |ui| {
                self.party_section(ui, PartyRole::Sender, "👤 Your details (sender)");
                ui.add_space(12.0);
                self.party_section(ui, PartyRole::Client, "💼 Client");
                ui.add_space(12.0);
                self.details_section(ui);
                ui.add_space(12.0);
                self.items_section(ui);
                ui.add_space(12.0);
                self.payment_section(ui);
            });
    }

    fn party_section(&mut self, ui: &mut Ui, role: PartyRole, title: &str) {
        section(ui, title, |ui| {
            egui::Grid::new(format!("party-{role}"))
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    for field in PartyField::ALL {
                        ui.label(field.label());
                        let current = self.session.store().party(role).field(field).to_string();
                        if let Some(value) = text_input(ui, &current) {
                            self.session.update_party(role, field, &value);
                        }
                        ui.end_row();
                    }
                });
        });
    }

    fn details_section(&mut self, ui: &mut Ui) {
        section(ui, "📅 Invoice details", |ui| {
            egui::Grid::new("details")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    let meta = self.session.store().meta().clone();

                    ui.label(MetaField::Number.label());
                    if let Some(value) = text_input(ui, &meta.number) {
                        self.session.update_meta(MetaField::Number, &value);
                    }
                    ui.end_row();

                    ui.label(MetaField::Currency.label());
                    let mut currency = meta.currency;
                    egui::ComboBox::from_id_salt("currency")
                        .selected_text(currency.selector_label())
                        .show_ui(ui, |ui| {
                            for option in Currency::ALL {
                                ui.selectable_value(&mut currency, option, option.selector_label());
                            }
                        });
                    if currency != meta.currency {
                        self.session.update_meta(MetaField::Currency, currency.code());
                    }
                    ui.end_row();

                    for (field, date) in [
                        (MetaField::IssueDate, meta.issue_date),
                        (MetaField::DueDate, meta.due_date),
                    ] {
                        ui.label(field.label());
                        let current = date
                            .map(|d| d.format(DATE_FORMAT).to_string())
                            .unwrap_or_default();
                        let key = format!("{field:?}");
                        if let Some(value) = self.draft_input(ui, key, current, 120.0) {
                            self.session.update_meta(field, &value);
                        }
                        ui.end_row();
                    }

                    ui.label(MetaField::TaxRatePercent.label());
                    let current = meta.tax_rate_percent.to_string();
                    if let Some(value) = self.draft_input(ui, "tax".to_string(), current, 80.0) {
                        self.session.update_meta(MetaField::TaxRatePercent, &value);
                    }
                    ui.end_row();
                });
        });
    }

    fn items_section(&mut self, ui: &mut Ui) {
        section(ui, "🧾 Line items", |ui| {
            let items = self.session.store().items().to_vec();
            let mut remove: Option<LineItemId> = None;

            egui::Grid::new("items")
                .num_columns(4)
                .spacing([8.0, 6.0])
                .show(ui, |ui| {
                    ui.label(RichText::new("Description").small().weak());
                    ui.label(RichText::new("Qty").small().weak());
                    ui.label(RichText::new("Price").small().weak());
                    ui.label("");
                    ui.end_row();

                    for item in &items {
                        let mut description = item.description.clone();
                        let response = ui.add(
                            egui::TextEdit::singleline(&mut description)
                                .hint_text("Service description...")
                                .desired_width(240.0),
                        );
                        if response.changed() {
                            self.session.update_line_item(
                                item.id,
                                LineItemField::Description,
                                &description,
                            );
                        }

                        let key = format!("qty-{}", item.id);
                        let current = item.quantity.to_string();
                        if let Some(value) = self.draft_input(ui, key, current, 48.0) {
                            self.session
                                .update_line_item(item.id, LineItemField::Quantity, &value);
                        }

                        let key = format!("price-{}", item.id);
                        let current = item.unit_price.to_string();
                        if let Some(value) = self.draft_input(ui, key, current, 80.0) {
                            self.session
                                .update_line_item(item.id, LineItemField::UnitPrice, &value);
                        }

                        let can_remove = items.len() > 1;
                        if ui
                            .add_enabled(can_remove, egui::Button::new("🗑"))
                            .on_hover_text("Remove line item")
                            .clicked()
                        {
                            remove = Some(item.id);
                        }
                        ui.end_row();
                    }
                });

            if let Some(id) = remove {
                self.session.remove_line_item(id);
                let suffix = format!("-{id}");
                self.drafts.retain(|key, _| !key.ends_with(&suffix));
            }

            if ui
                .button(RichText::new("➕ Add line item").color(ACCENT))
                .clicked()
            {
                self.session.add_line_item();
            }
        });
    }

    fn payment_section(&mut self, ui: &mut Ui) {
        section(ui, "💳 Terms & payment", |ui| {
            let meta = self.session.store().meta().clone();
            for field in [MetaField::PaymentMethod, MetaField::BankDetails] {
                ui.label(RichText::new(field.label()).small().weak());
                let current = match field {
                    MetaField::PaymentMethod => &meta.payment_method,
                    _ => &meta.bank_details,
                };
                if let Some(value) = text_input(ui, current) {
                    self.session.update_meta(field, &value);
                }
            }
            ui.label(RichText::new(MetaField::Notes.label()).small().weak());
            let mut notes = meta.notes.clone();
            if ui
                .add(
                    egui::TextEdit::multiline(&mut notes)
                        .desired_rows(3)
                        .desired_width(f32::INFINITY),
                )
                .changed()
            {
                self.session.update_meta(MetaField::Notes, &notes);
            }
        });
    }

    /// Text box backed by a draft so partial input like `12.` survives the
    /// store's coercion while the field has focus.
    fn draft_input(
        &mut self,
        ui: &mut Ui,
        key: String,
        current: String,
        width: f32,
    ) -> Option<String> {
        let draft = self.drafts.entry(key).or_insert_with(|| current.clone());
        let response = ui.add(egui::TextEdit::singleline(draft).desired_width(width));
        if response.changed() {
            return Some(draft.clone());
        }
        if !response.has_focus() && *draft != current {
            *draft = current;
        }
        None
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_jobs();

        let mut wide = true;
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            wide = ui.available_width() >= WIDE_LAYOUT_MIN_WIDTH;
            self.toolbar(ui, wide);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if wide {
                ui.columns(2, |columns| {
                    let (left, right) = columns.split_at_mut(1);
                    self.editor(&mut left[0]);
                    preview(&mut right[0], &self.session.preview());
                });
            } else {
                match self.session.active_view() {
                    ActiveView::Edit => self.editor(ui),
                    ActiveView::Preview => preview(ui, &self.session.preview()),
                }
            }
        });

        if !self.jobs.is_empty() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

impl Drop for EditorApp {
    /// eframe drops the app when the window closes. Prints still inside their
    /// delay are finished before the process exits.
    fn drop(&mut self) {
        if self.jobs.is_empty() {
            return;
        }
        tracing::info!("Waiting for {} pending print(s)", self.jobs.len());
        for result in PrintJob::wait_all(self.jobs.drain(..)) {
            match result {
                Ok(path) => tracing::info!("Saved {:?}", path),
                Err(e) => tracing::error!("Print failed: {}", e),
            }
        }
    }
}

fn section(ui: &mut Ui, title: &str, body: impl FnOnce(&mut Ui)) {
    egui::Frame::group(ui.style())
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(title).strong());
            ui.add_space(6.0);
            body(ui);
        });
}

fn text_input(ui: &mut Ui, current: &str) -> Option<String> {
    let mut value = current.to_string();
    let response = ui.add(egui::TextEdit::singleline(&mut value).desired_width(260.0));
    response.changed().then_some(value)
}

fn ink(text: impl Into<String>) -> RichText {
    RichText::new(text).color(Color32::BLACK)
}

fn faint(text: impl Into<String>) -> RichText {
    RichText::new(text).color(Color32::GRAY)
}

/// Draws the paper invoice. Only the document itself is drawn here.
fn preview(ui: &mut Ui, view: &InvoiceView) {
    egui::ScrollArea::vertical()
        .id_salt("preview")
        .show(ui, |ui| {
            egui::Frame::new()
                .fill(Color32::WHITE)
                .inner_margin(28.0)
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    preview_header(ui, view);
                    ui.separator();
                    preview_lines(ui, view);
                    ui.separator();
                    preview_totals(ui, view);
                    ui.add_space(16.0);
                    if !view.bank_details.is_empty() {
                        let bank = format!("Bank details: {}", view.bank_details);
                        ui.label(ink(bank).small().monospace());
                    }
                    ui.label(faint(&view.notes).small().italics());
                });
        });
}

fn preview_header(ui: &mut Ui, view: &InvoiceView) {
    ui.columns(2, |columns| {
        columns[0].label(ink("INVOICE").size(26.0).strong());
        columns[0].label(faint(format!("#{}", view.number)).monospace());
        columns[0].add_space(12.0);
        columns[0].label(faint("BILL TO").small().strong());
        columns[0].label(ink(&view.client.name).strong());
        columns[0].label(faint(&view.client.tax_id).small());
        columns[0].label(faint(&view.client.address).small());

        columns[1].with_layout(egui::Layout::top_down(egui::Align::Max), |ui| {
            ui.label(ink(&view.sender.name).size(16.0).strong());
            ui.label(faint(&view.sender.email).small());
            ui.label(faint(&view.sender.tax_id).small());
            ui.add_space(12.0);
            ui.label(faint("DATE").small().strong());
            ui.label(ink(&view.issue_date).small());
            if !view.due_date.is_empty() {
                ui.label(faint("DUE").small().strong());
                ui.label(ink(&view.due_date).small());
            }
            ui.label(faint("METHOD").small().strong());
            ui.label(ink(&view.payment_method).small());
        });
    });
}

fn preview_lines(ui: &mut Ui, view: &InvoiceView) {
    egui::Grid::new("preview-lines")
        .num_columns(4)
        .spacing([16.0, 8.0])
        .show(ui, |ui| {
            for header in ["SERVICE", "QTY", "PRICE", "TOTAL"] {
                ui.label(ink(header).small().strong());
            }
            ui.end_row();
            for line in &view.lines {
                ui.label(ink(&line.description));
                ui.label(faint(line.quantity.to_string()));
                ui.label(faint(&line.unit_price));
                ui.label(ink(&line.amount).strong());
                ui.end_row();
            }
        });
}

fn preview_totals(ui: &mut Ui, view: &InvoiceView) {
    ui.with_layout(egui::Layout::top_down(egui::Align::Max), |ui| {
        egui::Grid::new("preview-totals")
            .num_columns(2)
            .spacing([24.0, 4.0])
            .show(ui, |ui| {
                ui.label(faint("Subtotal"));
                ui.label(faint(&view.formatted.subtotal));
                ui.end_row();
                ui.label(faint(&view.formatted.tax_label));
                ui.label(faint(&view.formatted.tax_amount));
                ui.end_row();
                ui.label(ink("Total").size(16.0).strong());
                ui.label(ink(&view.formatted.total).size(16.0).strong());
                ui.end_row();
            });
    });
}
