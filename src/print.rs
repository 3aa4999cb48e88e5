use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use slug::slugify;

use crate::error::PrintError;
use crate::render::{InvoiceView, TypstRenderer};

/// Pause between switching to the preview and handing it to the print surface.
pub const DEFAULT_PRINT_DELAY: Duration = Duration::from_millis(300);

/// Something that can turn a rendered invoice into a printed or exported document.
pub trait PrintSurface: Send + Sync {
    /// Prints `view` and returns where the output went.
    fn print(&self, view: &InvoiceView) -> Result<PathBuf, PrintError>;
}

/// Compiles the invoice to PDF with the `typst` CLI.
pub struct TypstPrinter {
    renderer: TypstRenderer,
    output_dir: PathBuf,
    open_after_print: bool,
}

impl TypstPrinter {
    pub fn new(renderer: TypstRenderer, output_dir: impl Into<PathBuf>) -> Self {
        TypstPrinter {
            renderer,
            output_dir: output_dir.into(),
            open_after_print: false,
        }
    }

    pub fn open_after_print(mut self, open: bool) -> Self {
        self.open_after_print = open;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File stem for an invoice, e.g. `001_empresa-s-a`.
    pub fn file_stem(view: &InvoiceView) -> String {
        let number = slugify(&view.number);
        let number = if number.is_empty() { "invoice".to_string() } else { number };
        let client = slugify(&view.document.client.name);
        if client.is_empty() {
            number
        } else {
            format!("{number}_{client}")
        }
    }

    /// Renders the Typst source and writes it to the output directory.
    pub fn write_source(&self, view: &InvoiceView) -> Result<PathBuf, PrintError> {
        let source = self.renderer.render(view)?;
        fs::create_dir_all(&self.output_dir).map_err(|source| PrintError::Write {
            path: self.output_dir.clone(),
            source,
        })?;
        let typ_path = self
            .output_dir
            .join(format!("{}.typ", TypstPrinter::file_stem(view)));
        fs::write(&typ_path, source).map_err(|source| PrintError::Write {
            path: typ_path.clone(),
            source,
        })?;
        Ok(typ_path)
    }
}

impl PrintSurface for TypstPrinter {
    fn print(&self, view: &InvoiceView) -> Result<PathBuf, PrintError> {
        if Command::new("typst").arg("--version").output().is_err() {
            return Err(PrintError::TypstMissing);
        }

        let typ_path = self.write_source(view)?;
        let pdf_path = typ_path.with_extension("pdf");

        tracing::info!("Compiling {:?}", typ_path);
        let output = Command::new("typst")
            .arg("compile")
            .arg(&typ_path)
            .arg(&pdf_path)
            .output()
            .map_err(|e| PrintError::Compile(e.to_string()))?;
        if !output.status.success() {
            return Err(PrintError::Compile(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        if self.open_after_print {
            open_and_reveal(&pdf_path);
        }
        Ok(pdf_path)
    }
}

/// Handle to a deferred print. Dropping it leaves the print running.
pub struct PrintJob {
    handle: JoinHandle<Result<PathBuf, PrintError>>,
}

impl PrintJob {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the print has run.
    pub fn wait(self) -> Result<PathBuf, PrintError> {
        match self.handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Waits for every job, in order. Front ends call this before exiting so a
    /// print still inside its delay is not cut off with the process.
    pub fn wait_all(
        jobs: impl IntoIterator<Item = PrintJob>,
    ) -> Vec<Result<PathBuf, PrintError>> {
        jobs.into_iter().map(PrintJob::wait).collect()
    }
}

/// Fires a print after a fixed delay. Every call schedules its own print;
/// nothing is debounced or cancelled.
#[derive(Clone)]
pub struct PrintTrigger {
    surface: Arc<dyn PrintSurface>,
    delay: Duration,
}

impl PrintTrigger {
    pub fn new(surface: Arc<dyn PrintSurface>, delay: Duration) -> Self {
        PrintTrigger { surface, delay }
    }

    pub fn schedule(&self, view: InvoiceView) -> PrintJob {
        let surface = Arc::clone(&self.surface);
        let delay = self.delay;
        tracing::debug!(?delay, number = %view.number, "Scheduling print");
        let handle = thread::spawn(move || {
            thread::sleep(delay);
            let result = surface.print(&view);
            match &result {
                Ok(path) => tracing::info!("Printed invoice {} to {:?}", view.number, path),
                Err(e) => tracing::error!("Failed to print invoice {}: {}", view.number, e),
            }
            result
        });
        PrintJob { handle }
    }
}

#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(target_os = "windows")]
const OPENER: &str = "explorer";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const OPENER: &str = "xdg-open";

fn launch<I, S>(args: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    if let Err(e) = Command::new(OPENER).args(args).spawn() {
        tracing::warn!("Could not run {}: {}", OPENER, e);
    }
}

/// Opens `path` with the platform viewer. On macOS and Windows the file is also
/// selected in the file manager.
pub fn open_and_reveal(path: &Path) {
    #[cfg(target_os = "macos")]
    launch([OsStr::new("-R"), path.as_os_str()]);
    #[cfg(target_os = "windows")]
    launch([format!("/select,{}", path.display())]);

    launch([path]);
}

/// Opens a folder in the platform file manager.
pub fn open_folder(path: &Path) {
    launch([path]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PartyField, PartyRole};
    use crate::store::InvoiceStore;
    use std::sync::Mutex;
    use std::time::Instant;

    #[derive(Default)]
    struct RecordingSurface {
        printed: Mutex<Vec<String>>,
    }

    impl PrintSurface for RecordingSurface {
        fn print(&self, view: &InvoiceView) -> Result<PathBuf, PrintError> {
            self.printed.lock().unwrap().push(view.formatted.total.clone());
            Ok(PathBuf::from(format!("{}.pdf", view.number)))
        }
    }

    fn view() -> InvoiceView {
        InvoiceView::build(InvoiceStore::default().snapshot())
    }

    #[test]
    fn print_runs_after_the_delay() {
        let surface = Arc::new(RecordingSurface::default());
        let trigger = PrintTrigger::new(surface.clone(), Duration::from_millis(50));
        let started = Instant::now();
        let path = trigger.schedule(view()).wait().unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(path, PathBuf::from("001.pdf"));
        assert_eq!(*surface.printed.lock().unwrap(), vec!["$1,508.00".to_string()]);
    }

    #[test]
    fn two_triggers_print_twice() {
        let surface = Arc::new(RecordingSurface::default());
        let trigger = PrintTrigger::new(surface.clone(), Duration::ZERO);
        let first = trigger.schedule(view());
        let second = trigger.schedule(view());
        first.wait().unwrap();
        second.wait().unwrap();
        assert_eq!(surface.printed.lock().unwrap().len(), 2);
    }

    #[test]
    fn wait_all_lets_delayed_prints_finish() {
        let surface = Arc::new(RecordingSurface::default());
        let trigger = PrintTrigger::new(surface.clone(), Duration::from_millis(30));
        let jobs = vec![trigger.schedule(view()), trigger.schedule(view())];

        let results = PrintJob::wait_all(jobs);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(Result::is_ok));
        assert_eq!(surface.printed.lock().unwrap().len(), 2);
    }

    #[test]
    fn file_stem_combines_number_and_client() {
        let mut store = InvoiceStore::default();
        assert_eq!(TypstPrinter::file_stem(&InvoiceView::build(store.snapshot())), "001");
        store.update_party(PartyRole::Client, PartyField::Name, "Empresa S.A. de C.V.");
        assert_eq!(
            TypstPrinter::file_stem(&InvoiceView::build(store.snapshot())),
            "001_empresa-s-a-de-c-v"
        );
    }

    #[test]
    fn write_source_creates_typ_file() {
        let dir = tempfile::tempdir().unwrap();
        let printer = TypstPrinter::new(TypstRenderer::new().unwrap(), dir.path().join("out"));
        let path = printer.write_source(&view()).unwrap();
        assert_eq!(path, dir.path().join("out").join("001.typ"));
        let source = fs::read_to_string(path).unwrap();
        assert!(source.contains("INVOICE"));
        assert!(source.contains(r#""$1,508.00""#));
    }
}
