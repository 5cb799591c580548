//! Command-line front end. This is the presentation layer: it parses
//! arguments, fills the entry form from saved defaults, asks for confirmation
//! before destructive actions and turns library errors into messages. All
//! record rules live in the store and the ADIF codec.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};

use crate::adif;
use crate::config::{AppPaths, Settings};
use crate::db::{default_backup_name, Store};
use crate::models::{now_stamp, NewQso, Qso, QsoField, SearchField};
use crate::stats::{count_by_mode, mode_shares};

/// Width of the longest bar in the mode breakdown.
const CHART_WIDTH: usize = 40;

/// HamLog - amateur radio contact log.
#[derive(Parser, Debug)]
#[command(name = "hamlog", version, about)]
pub struct Cli {
    /// Directory holding hamlog.db and config.json (default: ~/.hamlog).
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log debug detail to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log a new contact. Omitted fields fall back to saved defaults.
    Add(AddArgs),
    /// List contacts, optionally filtered by a keyword.
    Search {
        /// Substring to look for; omit to list everything.
        keyword: Option<String>,
        /// Column to match: call, freq, power or time.
        #[arg(long, default_value = "call", value_parser = parse_search_field)]
        by: SearchField,
    },
    /// Change one field of a contact.
    Update {
        id: i64,
        /// Field identifier (e.g. rst_sent) or its display label.
        field: String,
        value: String,
    },
    /// Permanently delete a contact.
    Delete {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Import contacts from an ADIF (.adi) file.
    Import { file: PathBuf },
    /// Export every contact to an ADIF (.adi) file.
    Export { file: PathBuf },
    /// Show how many contacts were made in each mode.
    Stats,
    /// Copy the database file to a backup location.
    Backup {
        /// Target file (default: hamlog_backup_<timestamp>.db here).
        destination: Option<PathBuf>,
    },
    /// Replace the database with a backup copy.
    Restore {
        source: PathBuf,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Save a default value for the add form (empty value clears it).
    SetDefault { field: String, value: String },
    /// Save the presentation theme name.
    Theme { name: String },
}

#[derive(Args, Debug, Default)]
pub struct AddArgs {
    #[arg(long)]
    pub call: Option<String>,
    #[arg(long)]
    pub mode: Option<String>,
    /// Frequency in MHz.
    #[arg(long)]
    pub freq: Option<String>,
    /// Power in Watts.
    #[arg(long)]
    pub power: Option<String>,
    /// Contact time (default: now, YYYY-MM-DD HH:MM).
    #[arg(long)]
    pub datetime: Option<String>,
    #[arg(long)]
    pub qth_prov: Option<String>,
    #[arg(long)]
    pub qth_city: Option<String>,
    #[arg(long)]
    pub rst_sent: Option<String>,
    #[arg(long)]
    pub rst_recv: Option<String>,
    #[arg(long)]
    pub content: Option<String>,
    #[arg(long)]
    pub device: Option<String>,
}

impl AddArgs {
    fn get(&self, field: QsoField) -> Option<&str> {
        let value = match field {
            QsoField::Call => &self.call,
            QsoField::Mode => &self.mode,
            QsoField::Freq => &self.freq,
            QsoField::Power => &self.power,
            QsoField::Datetime => &self.datetime,
            QsoField::QthProv => &self.qth_prov,
            QsoField::QthCity => &self.qth_city,
            QsoField::RstSent => &self.rst_sent,
            QsoField::RstRecv => &self.rst_recv,
            QsoField::Content => &self.content,
            QsoField::Device => &self.device,
        };
        value.as_deref()
    }
}

fn parse_search_field(raw: &str) -> std::result::Result<SearchField, String> {
    raw.parse().map_err(|err: crate::LogError| err.to_string())
}

/// Resolve paths, make sure the log exists, and run one command.
pub fn run(cli: Cli) -> Result<()> {
    let paths = AppPaths::resolve(cli.data_dir.as_deref());
    let store = Store::new(&paths.database);
    store
        .initialize()
        .context("failed to initialize the contact log")?;

    match cli.command {
        Command::Add(args) => add(&store, &paths, &args),
        Command::Search { keyword, by } => search(&store, keyword.as_deref().unwrap_or(""), by),
        Command::Update { id, field, value } => update(&store, id, &field, &value),
        Command::Delete { id, yes } => delete(&store, id, yes),
        Command::Import { file } => import(&store, &file),
        Command::Export { file } => export(&store, &file),
        Command::Stats => stats(&store),
        Command::Backup { destination } => backup(&store, destination),
        Command::Restore { source, yes } => restore(&store, &source, yes),
        Command::SetDefault { field, value } => set_default(&paths, &field, &value),
        Command::Theme { name } => {
            let mut settings = Settings::load(&paths.settings);
            settings.set_theme(&name);
            settings.save(&paths.settings).context("failed to save theme")?;
            println!("Theme saved; restart the front end to apply it.");
            Ok(())
        }
    }
}

/// Fill the entry form: explicit flag, then saved default, then (for the
/// contact time only) the current local time. Numeric fields are checked here,
/// before anything reaches the store.
pub fn build_new_qso(args: &AddArgs, settings: &Settings) -> crate::Result<NewQso> {
    let mut qso = NewQso::default();
    for field in QsoField::ALL {
        let value = args
            .get(field)
            .or_else(|| settings.default_for(field))
            .map(str::to_string)
            .or_else(|| (field == QsoField::Datetime).then(now_stamp))
            .unwrap_or_default();
        qso.set(field, &value)?;
    }
    Ok(qso)
}

fn add(store: &Store, paths: &AppPaths, args: &AddArgs) -> Result<()> {
    let settings = Settings::load(&paths.settings);
    let qso = build_new_qso(args, &settings).context("add failed")?;
    let id = store.insert(&qso).context("add failed")?;
    println!("Saved QSO #{id} with {}", qso.call.to_uppercase());
    Ok(())
}

fn search(store: &Store, keyword: &str, by: SearchField) -> Result<()> {
    let rows = store.search(keyword, by).context("search failed")?;
    if rows.is_empty() {
        println!("No matching contacts.");
        return Ok(());
    }
    println!(
        "{:>5}  {:<10} {:<6} {:>9} {:>6}  {:<16} {:<8} {:<8} {:<4} {:<4} {:<10} {}",
        "ID", "CALL", "MODE", "FREQ", "POWER", "TIME", "PROV", "CITY", "SENT", "RECV", "DEVICE",
        "CONTENT"
    );
    for qso in &rows {
        println!("{}", table_row(qso));
    }
    println!("{} contact(s)", rows.len());
    Ok(())
}

fn table_row(qso: &Qso) -> String {
    format!(
        "{:>5}  {:<10} {:<6} {:>9} {:>6}  {:<16} {:<8} {:<8} {:<4} {:<4} {:<10} {}",
        qso.id,
        qso.call,
        qso.mode,
        qso.value(QsoField::Freq),
        qso.value(QsoField::Power),
        qso.datetime,
        qso.qth_prov,
        qso.qth_city,
        qso.rst_sent,
        qso.rst_recv,
        qso.device,
        qso.content.replace('\n', " ")
    )
}

fn update(store: &Store, id: i64, field: &str, value: &str) -> Result<()> {
    let changed = match field_from_label(field) {
        Some(field) => store.update(id, field, value),
        None => store.update_field(id, field, value),
    }
    .with_context(|| format!("update of QSO #{id} failed"))?;

    if changed {
        println!("Updated QSO #{id}.");
    } else {
        println!("No QSO #{id}; nothing changed.");
    }
    Ok(())
}

fn delete(store: &Store, id: i64, yes: bool) -> Result<()> {
    let Some(qso) = store.get(id).context("delete failed")? else {
        println!("No QSO #{id}; nothing deleted.");
        return Ok(());
    };

    if !yes && !confirm(&format!("Delete QSO #{id} with {}?", qso.call))? {
        println!("Cancelled.");
        return Ok(());
    }

    store.delete_by_id(id).context("delete failed")?;
    println!("Deleted QSO #{id}.");
    Ok(())
}

fn import(store: &Store, file: &std::path::Path) -> Result<()> {
    let import = adif::import_file(file).context("import failed")?;
    if import.is_empty() {
        println!("No importable contacts found in {}.", file.display());
        return Ok(());
    }

    let inserted = store
        .insert_batch(&import.candidates)
        .context("import failed")?;
    println!(
        "Imported {inserted} / {} contacts ({} skipped).",
        import.candidates.len(),
        import.dropped
    );
    Ok(())
}

fn export(store: &Store, file: &std::path::Path) -> Result<()> {
    let records = store.fetch_all().context("export failed")?;
    let written = adif::export_to(&records, file).context("export failed")?;
    println!("Exported {written} contacts to {}.", file.display());
    Ok(())
}

fn stats(store: &Store) -> Result<()> {
    let records = store.fetch_all().context("statistics failed")?;
    let shares = mode_shares(&count_by_mode(&records));
    if shares.is_empty() {
        println!("No data available.");
        return Ok(());
    }

    let widest = shares.iter().map(|s| s.count).max().unwrap_or(1).max(1);
    println!("QSOs by mode");
    for share in &shares {
        let bar = "#".repeat(share.count * CHART_WIDTH / widest);
        println!(
            "{:<8} {:>5} {:>5.1}% {}",
            share.mode, share.count, share.percent, bar
        );
    }
    Ok(())
}

fn backup(store: &Store, destination: Option<PathBuf>) -> Result<()> {
    let destination =
        destination.unwrap_or_else(|| PathBuf::from(default_backup_name(&Local::now())));
    store.backup_to(&destination).context("backup failed")?;
    println!("Database backed up to {}.", destination.display());
    Ok(())
}

fn restore(store: &Store, source: &std::path::Path, yes: bool) -> Result<()> {
    let prompt = format!(
        "Overwrite the current log with {}? Anything not backed up will be lost.",
        source.display()
    );
    if !yes && !confirm(&prompt)? {
        println!("Cancelled.");
        return Ok(());
    }

    store.restore_from(source).context("restore failed")?;
    println!("Database restored. Restart any running front end to load it.");
    Ok(())
}

fn set_default(paths: &AppPaths, field: &str, value: &str) -> Result<()> {
    let field = field_from_label(field)
        .map(|f| f.as_str().to_string())
        .unwrap_or_else(|| field.to_string());

    let mut settings = Settings::load(&paths.settings);
    settings
        .set_default(&field, value)
        .context("failed to set default")?;
    settings
        .save(&paths.settings)
        .context("failed to save defaults")?;
    println!("Default for {field} saved.");
    Ok(())
}

/// Ask a yes/no question on the terminal. Only `y`/`yes` confirms.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush().context("failed to write prompt")?;

    let mut answer = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    if read == 0 {
        bail!("no confirmation received; pass --yes to skip the prompt");
    }
    Ok(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Map a display label (English, or the column headings of the
/// Chinese-language interface) to its field identifier.
pub fn field_from_label(label: &str) -> Option<QsoField> {
    let field = match label.trim() {
        "Call sign" | "Call" | "呼号" => QsoField::Call,
        "Mode" | "模式" => QsoField::Mode,
        "Frequency" | "频率" => QsoField::Freq,
        "Power" | "功率" => QsoField::Power,
        "Time" | "时间" => QsoField::Datetime,
        "QTH (province)" | "QTH（省）" => QsoField::QthProv,
        "QTH (city)" | "QTH（市）" => QsoField::QthCity,
        "RST sent" | "rst发" => QsoField::RstSent,
        "RST received" | "rst收" => QsoField::RstRecv,
        "Content" | "内容" => QsoField::Content,
        "Device" | "设备" => QsoField::Device,
        _ => return None,
    };
    Some(field)
}
