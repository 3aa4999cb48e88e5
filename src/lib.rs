//! Invoice editor core.
//!
//! Holds the invoice being edited, derives its totals, formats money and
//! renders the printable document. The terminal and desktop front ends in the
//! binary drive this library.

pub mod coerce;
pub mod currency;
pub mod error;
pub mod model;
pub mod print;
pub mod render;
pub mod session;
pub mod settings;
pub mod store;
pub mod totals;

pub use currency::format_currency;
pub use error::{FormattingError, PrintError, SettingsError};
pub use model::{
    Currency, InvoiceDocument, InvoiceMeta, LineItem, LineItemField, LineItemId, MetaField, Party,
    PartyField, PartyRole,
};
pub use print::{PrintJob, PrintSurface, PrintTrigger, TypstPrinter};
pub use render::{InvoiceView, TypstRenderer};
pub use session::{ActiveView, EditorSession};
pub use store::InvoiceStore;
pub use totals::{Totals, compute_totals};
