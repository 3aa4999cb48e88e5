mod gui;
mod prompt;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eframe::egui;
use inquire::{Confirm, Select, Text};
use std::fs;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use invoice_editor::print::open_folder;
use invoice_editor::settings::{self, Settings};
use invoice_editor::{
    Currency, EditorSession, InvoiceView, PrintSurface, TypstPrinter, TypstRenderer,
};

#[derive(Parser)]
#[command(name = "invoice-editor", about = "Edit an invoice and print it to PDF")]
struct Cli {
    /// Increase log output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit an invoice in the terminal (default)
    Edit,
    /// Edit an invoice in a desktop window with live preview
    Gui,
    /// Show the starting invoice built from the current settings
    Preview {
        /// Print the invoice view as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Configure invoice defaults, sender profile and output folder
    Config,
    /// Open the PDF output folder
    Open,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = settings::load_settings();

    match cli.command.unwrap_or(Commands::Edit) {
        Commands::Edit => {
            let session = EditorSession::from_settings(&settings, print_surface(&settings)?);
            prompt::run(session)?;
        }
        Commands::Gui => {
            let session = EditorSession::from_settings(&settings, print_surface(&settings)?);
            run_gui(session)?;
        }
        Commands::Preview { json } => {
            let view = starting_view(&settings);
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("{}", view.to_table());
            }
        }
        Commands::Config => {
            setup_config_wizard(settings)?;
        }
        Commands::Open => {
            let dir = settings.print.resolved_output_dir();
            if !dir.exists() {
                println!("❌ No output directory found at {:?}. Print an invoice first.", dir);
                return Ok(());
            }
            println!("🚀 Opening: {:?}", dir);
            open_folder(&dir);
        }
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// The invoice a new session would start with. Needs no print surface, so a
/// broken template setting does not block it.
fn starting_view(settings: &Settings) -> InvoiceView {
    InvoiceView::build(settings.starting_store().snapshot())
}

fn print_surface(settings: &Settings) -> Result<Arc<dyn PrintSurface>> {
    let renderer = match &settings.print.template {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read invoice template {:?}", path))?;
            TypstRenderer::with_template(&source)?
        }
        None => TypstRenderer::new()?,
    };
    let printer = TypstPrinter::new(renderer, settings.print.resolved_output_dir())
        .open_after_print(settings.print.open_after_print);
    tracing::debug!("Printing to {:?}", printer.output_dir());
    Ok(Arc::new(printer))
}

fn run_gui(session: EditorSession) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Invoice Editor")
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([420.0, 520.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Invoice Editor",
        options,
        Box::new(move |_cc| Ok(Box::new(gui::EditorApp::new(session)))),
    )
    .map_err(|e| anyhow::anyhow!("desktop editor failed: {e}"))
}

fn setup_config_wizard(mut settings: Settings) -> Result<()> {
    println!("\n⚙️  --- Configuration Setup ---");

    println!("\n--- Invoice Defaults ---");
    settings.invoice.number = Text::new("Starting invoice number:")
        .with_default(&settings.invoice.number)
        .prompt()?;
    let start = Currency::ALL
        .iter()
        .position(|c| *c == settings.invoice.currency)
        .unwrap_or(0);
    settings.invoice.currency = Select::new("Default currency:", Currency::ALL.to_vec())
        .with_starting_cursor(start)
        .prompt()?;
    let rate = Text::new("Tax Rate % (e.g. 16):")
        .with_default(&settings.invoice.tax_rate_percent.to_string())
        .prompt()?;
    settings.invoice.tax_rate_percent = invoice_editor::coerce::float(&rate);
    settings.invoice.payment_method = Text::new("Payment method:")
        .with_default(&settings.invoice.payment_method)
        .prompt()?;
    settings.invoice.bank_details = Text::new("Bank details (Optional):")
        .with_default(&settings.invoice.bank_details)
        .prompt()?;

    println!("\n--- Your Details (Sender) ---");
    settings.sender.name = Text::new("Name / Studio:")
        .with_default(&settings.sender.name)
        .prompt()?;
    settings.sender.tax_id = Text::new("Tax ID (Optional):")
        .with_default(&settings.sender.tax_id)
        .prompt()?;
    settings.sender.email = Text::new("Email (Optional):")
        .with_default(&settings.sender.email)
        .prompt()?;
    settings.sender.address = Text::new("Address (Optional):")
        .with_default(&settings.sender.address)
        .prompt()?;

    println!("\n--- Output ---");
    let pick = Confirm::new("Choose the PDF output folder with a folder picker?")
        .with_default(true)
        .prompt()?;
    let picked = if pick {
        println!("📂 Opening folder picker...");
        rfd::FileDialog::new()
            .set_title("Select Invoice Output Directory")
            .pick_folder()
    } else {
        None
    };
    settings.print.output_dir = Some(match picked {
        Some(path) => path.to_string_lossy().to_string(),
        None => {
            let current = settings.print.resolved_output_dir();
            Text::new("Output directory:")
                .with_default(&current.to_string_lossy())
                .prompt()?
        }
    });
    settings.print.open_after_print = Confirm::new("Open the PDF after printing?")
        .with_default(settings.print.open_after_print)
        .prompt()?;

    let path = settings::save_settings(&settings)?;
    println!("✅ Settings saved to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn preview_ignores_a_missing_template() {
        let mut settings = Settings::default();
        settings.print.template = Some(PathBuf::from("/nonexistent/invoice.typ.tera"));
        assert!(print_surface(&settings).is_err());

        let view = starting_view(&settings);
        assert_eq!(view.number, settings.invoice.number);
        assert_eq!(view.lines.len(), 2);
    }
}
