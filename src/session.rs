use std::sync::Arc;
use std::time::Duration;

use crate::model::{LineItemField, LineItemId, MetaField, PartyField, PartyRole};
use crate::print::{PrintJob, PrintSurface, PrintTrigger};
use crate::render::InvoiceView;
use crate::settings::Settings;
use crate::store::InvoiceStore;

/// Which pane is showing when the layout can only show one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Edit,
    Preview,
}

/// One editing session: the store, the visible pane and the print trigger.
pub struct EditorSession {
    store: InvoiceStore,
    view: ActiveView,
    trigger: PrintTrigger,
}

impl EditorSession {
    pub fn new(store: InvoiceStore, surface: Arc<dyn PrintSurface>, print_delay: Duration) -> Self {
        EditorSession {
            store,
            view: ActiveView::Edit,
            trigger: PrintTrigger::new(surface, print_delay),
        }
    }

    /// Seeds the store from the settings' invoice defaults and sender profile.
    pub fn from_settings(settings: &Settings, surface: Arc<dyn PrintSurface>) -> Self {
        EditorSession::new(settings.starting_store(), surface, settings.print.delay())
    }

    pub fn store(&self) -> &InvoiceStore {
        &self.store
    }

    pub fn active_view(&self) -> ActiveView {
        self.view
    }

    pub fn show(&mut self, view: ActiveView) {
        self.view = view;
    }

    /// Preview of the current state.
    pub fn preview(&self) -> InvoiceView {
        InvoiceView::build(self.store.snapshot())
    }

    pub fn update_meta(&mut self, field: MetaField, value: &str) {
        self.store.update_meta(field, value);
    }

    pub fn update_party(&mut self, role: PartyRole, field: PartyField, value: &str) {
        self.store.update_party(role, field, value);
    }

    pub fn update_line_item(&mut self, id: LineItemId, field: LineItemField, value: &str) {
        self.store.update_line_item(id, field, value);
    }

    pub fn add_line_item(&mut self) -> LineItemId {
        self.store.add_line_item()
    }

    pub fn remove_line_item(&mut self, id: LineItemId) {
        self.store.remove_line_item(id);
    }

    /// Switches to the preview, then prints it once the trigger's delay has passed.
    ///
    /// The preview is captured now, so edits made while the delay runs do not
    /// reach this print.
    pub fn print(&mut self) -> PrintJob {
        self.view = ActiveView::Preview;
        self.trigger.schedule(self.preview())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrintError;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        numbers: Mutex<Vec<String>>,
    }

    impl PrintSurface for Recorder {
        fn print(&self, view: &InvoiceView) -> Result<PathBuf, PrintError> {
            self.numbers.lock().unwrap().push(view.number.clone());
            Ok(PathBuf::new())
        }
    }

    fn session(recorder: Arc<Recorder>) -> EditorSession {
        EditorSession::new(InvoiceStore::default(), recorder, Duration::from_millis(10))
    }

    #[test]
    fn print_switches_to_preview() {
        let recorder = Arc::new(Recorder::default());
        let mut session = session(recorder.clone());
        assert_eq!(session.active_view(), ActiveView::Edit);
        let job = session.print();
        assert_eq!(session.active_view(), ActiveView::Preview);
        job.wait().unwrap();
        assert_eq!(*recorder.numbers.lock().unwrap(), vec!["001".to_string()]);
    }

    #[test]
    fn print_captures_state_at_trigger_time() {
        let recorder = Arc::new(Recorder::default());
        let mut session = session(recorder.clone());
        let job = session.print();
        session.update_meta(MetaField::Number, "002");
        job.wait().unwrap();
        assert_eq!(*recorder.numbers.lock().unwrap(), vec!["001".to_string()]);
    }

    #[test]
    fn session_seeds_from_settings() {
        let mut settings = Settings::default();
        settings.invoice.number = "A-1".to_string();
        settings.sender.name = "nd. studio".to_string();
        settings.print.delay_ms = 0;
        let session = EditorSession::from_settings(&settings, Arc::new(Recorder::default()));
        let preview = session.preview();
        assert_eq!(preview.number, "A-1");
        assert_eq!(preview.sender.name, "nd. studio");
        assert_eq!(preview.lines.len(), 2);
    }

    #[test]
    fn edits_flow_into_the_preview() {
        let mut session = session(Arc::new(Recorder::default()));
        let id = session.add_line_item();
        session.update_line_item(id, LineItemField::Quantity, "2");
        session.update_line_item(id, LineItemField::UnitPrice, "100");
        session.update_meta(MetaField::TaxRatePercent, "10");
        let preview = session.preview();
        assert_eq!(preview.totals.subtotal, 1500.0);
        assert_eq!(preview.formatted.total, "$1,650.00");
    }
}
