use anyhow::Result;
use chrono::Local;
use inquire::error::InquireResult;
use inquire::{DateSelect, InquireError, Select, Text};
use std::fmt;

use invoice_editor::model::DATE_FORMAT;
use invoice_editor::{
    ActiveView, Currency, EditorSession, LineItemField, LineItemId, MetaField, PartyField,
    PartyRole, PrintJob,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    EditSender,
    EditClient,
    EditDetails,
    AddItem,
    EditItem,
    RemoveItem,
    TogglePreview,
    Print,
    Quit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::EditSender => "👤 Your details (sender)",
            Action::EditClient => "💼 Client",
            Action::EditDetails => "📅 Invoice details & payment",
            Action::AddItem => "➕ Add line item",
            Action::EditItem => "✏️  Edit line item",
            Action::RemoveItem => "🗑  Remove line item",
            Action::TogglePreview => "👁  Toggle preview",
            Action::Print => "🖨  Print / PDF",
            Action::Quit => "🚪 Quit",
        };
        f.write_str(label)
    }
}

const ACTIONS: [Action; 9] = [
    Action::EditSender,
    Action::EditClient,
    Action::EditDetails,
    Action::AddItem,
    Action::EditItem,
    Action::RemoveItem,
    Action::TogglePreview,
    Action::Print,
    Action::Quit,
];

struct ItemChoice {
    id: LineItemId,
    label: String,
}

impl fmt::Display for ItemChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Runs the terminal editor until the user quits, then waits for pending prints.
pub fn run(mut session: EditorSession) -> Result<()> {
    let mut jobs: Vec<PrintJob> = Vec::new();
    let outcome = edit_loop(&mut session, &mut jobs);

    for result in PrintJob::wait_all(jobs) {
        match result {
            Ok(path) => println!("✅ PDF Generated: {:?}", path),
            Err(e) => println!("❌ {}", e),
        }
    }
    outcome
}

fn edit_loop(session: &mut EditorSession, jobs: &mut Vec<PrintJob>) -> Result<()> {
    loop {
        if session.active_view() == ActiveView::Preview {
            println!("\n{}", session.preview().to_table());
        } else {
            let view = session.preview();
            println!(
                "\n#{} · {} item(s) · Total {}",
                view.number,
                view.lines.len(),
                view.formatted.total
            );
        }

        let picked = Select::new("What next?", ACTIONS.to_vec())
            .with_page_size(ACTIONS.len())
            .prompt();
        let action = match picked {
            Ok(action) => action,
            Err(e) if is_cancel(&e) => Action::Quit,
            Err(e) => return Err(e.into()),
        };
        if action == Action::Quit {
            return Ok(());
        }

        back_to_menu(apply(session, jobs, action))?;
    }
}

fn apply(
    session: &mut EditorSession,
    jobs: &mut Vec<PrintJob>,
    action: Action,
) -> InquireResult<()> {
    match action {
        Action::EditSender => edit_party(session, PartyRole::Sender)?,
        Action::EditClient => edit_party(session, PartyRole::Client)?,
        Action::EditDetails => edit_details(session)?,
        Action::AddItem => {
            let id = session.add_line_item();
            for field in LineItemField::ALL {
                edit_item_field(session, id, field)?;
            }
        }
        Action::EditItem => {
            if let Some(id) = pick_item(session, "Select line item:")? {
                let field = Select::new("Field:", LineItemField::ALL.to_vec()).prompt()?;
                edit_item_field(session, id, field)?;
            }
        }
        Action::RemoveItem => {
            if session.store().items().len() <= 1 {
                println!("⚠️  The invoice needs at least one line item.");
            } else if let Some(id) = pick_item(session, "Select line item to remove:")? {
                session.remove_line_item(id);
            }
        }
        Action::TogglePreview => {
            let next = match session.active_view() {
                ActiveView::Edit => ActiveView::Preview,
                ActiveView::Preview => ActiveView::Edit,
            };
            session.show(next);
        }
        Action::Print => {
            println!("🔨 Preparing invoice...");
            jobs.push(session.print());
        }
        Action::Quit => {}
    }
    Ok(())
}

fn is_cancel(e: &InquireError) -> bool {
    matches!(
        e,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

/// Esc or Ctrl-C inside a sub-prompt drops that edit and returns to the menu.
fn back_to_menu(result: InquireResult<()>) -> InquireResult<()> {
    match result {
        Err(e) if is_cancel(&e) => {
            tracing::debug!("Prompt cancelled, back to the menu");
            Ok(())
        }
        other => other,
    }
}

fn edit_party(session: &mut EditorSession, role: PartyRole) -> InquireResult<()> {
    let field = Select::new(&format!("{} field:", role), PartyField::ALL.to_vec()).prompt()?;
    let current = session.store().party(role).field(field).to_string();
    let value = Text::new(&format!("{}:", field.label()))
        .with_initial_value(&current)
        .prompt()?;
    session.update_party(role, field, &value);
    Ok(())
}

fn edit_details(session: &mut EditorSession) -> InquireResult<()> {
    let field = Select::new("Field:", MetaField::ALL.to_vec()).prompt()?;
    let meta = session.store().meta().clone();

    let value = match field {
        MetaField::Currency => {
            let start = Currency::ALL
                .iter()
                .position(|c| *c == meta.currency)
                .unwrap_or(0);
            Select::new("Currency:", Currency::ALL.to_vec())
                .with_starting_cursor(start)
                .prompt()?
                .code()
                .to_string()
        }
        MetaField::IssueDate | MetaField::DueDate => {
            let current = if field == MetaField::IssueDate {
                meta.issue_date
            } else {
                meta.due_date
            };
            DateSelect::new(&format!("{}:", field.label()))
                .with_default(current.unwrap_or_else(|| Local::now().date_naive()))
                .prompt_skippable()?
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default()
        }
        _ => {
            let current = match field {
                MetaField::Number => meta.number,
                MetaField::TaxRatePercent => meta.tax_rate_percent.to_string(),
                MetaField::Notes => meta.notes,
                MetaField::PaymentMethod => meta.payment_method,
                MetaField::BankDetails => meta.bank_details,
                _ => String::new(),
            };
            Text::new(&format!("{}:", field.label()))
                .with_initial_value(&current)
                .prompt()?
        }
    };

    session.update_meta(field, &value);
    Ok(())
}

fn edit_item_field(
    session: &mut EditorSession,
    id: LineItemId,
    field: LineItemField,
) -> InquireResult<()> {
    let Some(item) = session.store().item(id) else {
        return Ok(());
    };
    let current = match field {
        LineItemField::Description => item.description.clone(),
        LineItemField::Quantity => item.quantity.to_string(),
        LineItemField::UnitPrice => item.unit_price.to_string(),
    };
    let value = Text::new(&format!("{}:", field))
        .with_initial_value(&current)
        .prompt()?;
    session.update_line_item(id, field, &value);
    Ok(())
}

fn pick_item(session: &EditorSession, message: &str) -> InquireResult<Option<LineItemId>> {
    let currency = session.store().meta().currency;
    let options: Vec<ItemChoice> = session
        .store()
        .items()
        .iter()
        .map(|item| ItemChoice {
            id: item.id,
            label: format!(
                "{} · {} × {}",
                if item.description.is_empty() {
                    "(no description)"
                } else {
                    item.description.as_str()
                },
                item.quantity,
                currency.format(item.unit_price)
            ),
        })
        .collect();
    Ok(Select::new(message, options)
        .prompt_skippable()?
        .map(|choice| choice.id))
}
