mod book;
mod codec;
mod config;
mod contact;
mod directory;
mod error;
mod import;
mod name;
mod phone;
mod search;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use codec::{Format, Warning};
use config::Config;
use contact::Contact;
use directory::Directory;
use phone::PhoneType;
use search::{Query, Scope, Visibility};

#[derive(Parser, Debug)]
#[command(name = "phonebooker", version, about = "Manage and convert phone books")]
struct Cli {
    /// Configuration file (defaults to <config dir>/phonebooker/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every contact, in display order
    List(BookArgs),
    /// List, add or remove groups
    Groups(GroupsArgs),
    /// Add a contact
    Add(AddArgs),
    /// Change fields of the contact at INDEX (as printed by `list`)
    Edit(EditArgs),
    /// Remove the contact at INDEX (as printed by `list`)
    Remove(RemoveArgs),
    /// Import contacts from a CSV export, skipping known phone numbers
    Import(ImportArgs),
    /// Search contacts
    Query(QueryArgs),
    /// Convert a phone book between XML and vCard
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
struct BookArgs {
    /// Phone book file (defaults to `book` from the configuration)
    #[arg(long, value_name = "PATH")]
    book: Option<PathBuf>,

    /// Phone book format (inferred from the extension when omitted)
    #[arg(long, value_enum)]
    format: Option<Format>,
}

#[derive(Args, Debug)]
struct GroupsArgs {
    #[command(flatten)]
    book: BookArgs,

    #[command(subcommand)]
    action: Option<GroupAction>,
}

#[derive(Subcommand, Debug)]
enum GroupAction {
    /// Create a group
    Add { name: String },
    /// Delete a group and every membership in it
    Remove { name: String },
}

#[derive(Args, Debug)]
struct AddArgs {
    #[command(flatten)]
    book: BookArgs,

    #[arg(long, default_value = "")]
    first: String,

    #[arg(long, default_value = "")]
    last: String,

    #[arg(long)]
    phone: String,

    /// Home, Work, Mobile or any other label
    #[arg(long = "type", default_value = "Mobile")]
    phone_type: String,

    /// Group membership, repeatable
    #[arg(long = "group", value_name = "NAME")]
    groups: Vec<String>,

    #[arg(long, default_value = "")]
    company: String,
}

#[derive(Args, Debug)]
struct EditArgs {
    #[command(flatten)]
    book: BookArgs,

    index: usize,

    #[arg(long)]
    first: Option<String>,

    #[arg(long)]
    last: Option<String>,

    #[arg(long)]
    phone: Option<String>,

    #[arg(long = "type")]
    phone_type: Option<String>,

    /// Replaces every membership; repeatable
    #[arg(long = "group", value_name = "NAME")]
    groups: Vec<String>,

    /// Drop every group membership
    #[arg(long, default_value_t = false, conflicts_with = "groups")]
    clear_groups: bool,

    #[arg(long)]
    company: Option<String>,
}

#[derive(Args, Debug)]
struct RemoveArgs {
    #[command(flatten)]
    book: BookArgs,

    index: usize,
}

#[derive(Args, Debug)]
struct ImportArgs {
    #[command(flatten)]
    book: BookArgs,

    /// Group assigned to imported contacts (overrides the configuration)
    #[arg(long)]
    group: Option<String>,

    #[arg(value_name = "CSV")]
    input: PathBuf,
}

#[derive(Args, Debug)]
struct QueryArgs {
    #[command(flatten)]
    book: BookArgs,

    #[arg(long, value_enum, default_value_t = Scope::All)]
    scope: Scope,

    #[arg(long, default_value_t = false)]
    case_sensitive: bool,

    #[arg(long, default_value_t = false)]
    exact: bool,

    /// Print the visibility mask as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Search text; empty lists everyone
    #[arg(default_value = "")]
    text: String,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    #[arg(long, value_enum)]
    from: Option<Format>,

    #[arg(long, value_enum)]
    to: Option<Format>,

    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    #[arg(value_name = "DEST")]
    dest: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config::load(cli.config.as_deref())?;
    if let Some(path) = &config.config_path {
        debug!(path = %path.display(), "loaded configuration");
    }

    match cli.command {
        Command::List(args) => handle_list(&args, &config),
        Command::Groups(args) => handle_groups(args, &config),
        Command::Add(args) => handle_add(args, &config),
        Command::Edit(args) => handle_edit(args, &config),
        Command::Remove(args) => handle_remove(&args, &config),
        Command::Import(args) => handle_import(args, &config),
        Command::Query(args) => handle_query(args, &config),
        Command::Convert(args) => handle_convert(&args, &config),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("phonebooker=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("phonebooker=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// =============================================================================
// Book resolution
// =============================================================================

struct BookFile {
    path: PathBuf,
    format: Format,
}

impl BookFile {
    fn resolve(args: &BookArgs, config: &Config) -> Result<Self> {
        let path = args
            .book
            .clone()
            .or_else(|| config.book.clone())
            .ok_or_else(|| {
                anyhow!("no phone book given; pass --book or set `book` in the configuration")
            })?;
        let format = args
            .format
            .or_else(|| Format::from_path(&path))
            .unwrap_or(Format::Xml);
        Ok(Self { path, format })
    }

    fn load(&self, config: &Config) -> Result<Directory> {
        let decoded = book::open(&self.path, self.format, &config.template())
            .with_context(|| format!("failed to open phone book {}", self.path.display()))?;
        report_warnings(&self.path, &decoded.warnings);
        Ok(decoded.value)
    }

    /// Like `load`, but a file that does not exist yet is a fresh directory.
    fn load_or_new(&self, config: &Config) -> Result<Directory> {
        if self.path.exists() {
            self.load(config)
        } else {
            Ok(config.template())
        }
    }

    fn save(&self, directory: &Directory) -> Result<()> {
        book::save(directory, &self.path, self.format)
            .with_context(|| format!("failed to save phone book {}", self.path.display()))
    }
}

fn report_warnings(path: &Path, warnings: &[Warning]) {
    for warning in warnings {
        eprintln!("warning: {}: {warning}", path.display());
    }
}

fn format_for(explicit: Option<Format>, path: &Path) -> Result<Format> {
    explicit
        .or_else(|| Format::from_path(path))
        .ok_or_else(|| {
            anyhow!(
                "cannot infer the format of {}; pass it explicitly",
                path.display()
            )
        })
}

fn print_contact(index: usize, contact: &Contact) {
    println!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        index,
        contact.full_name(),
        contact.phone_type,
        contact.phone_number,
        contact.formatted_groups(),
        contact.company
    );
}

// =============================================================================
// Commands
// =============================================================================

fn handle_list(args: &BookArgs, config: &Config) -> Result<()> {
    let book = BookFile::resolve(args, config)?;
    let directory = book.load(config)?;
    if directory.is_empty() {
        eprintln!("No contacts in {}.", book.path.display());
    }
    for (index, contact) in directory.contacts().iter().enumerate() {
        print_contact(index, contact);
    }
    Ok(())
}

fn handle_groups(args: GroupsArgs, config: &Config) -> Result<()> {
    let book = BookFile::resolve(&args.book, config)?;

    match args.action {
        None => {
            let directory = book.load(config)?;
            for group in directory.groups() {
                println!("{}\t{}", group.id, group.name);
            }
        }
        Some(_) if book.format == Format::Vcard => {
            bail!(
                "vCard books carry no group table, so group changes to {} would be lost; \
                 list extra groups under `extra_groups` in the configuration instead",
                book.path.display()
            );
        }
        Some(GroupAction::Add { name }) => {
            let name = name.trim();
            if name.is_empty() {
                bail!("group name must not be empty");
            }
            let mut directory = book.load_or_new(config)?;
            let id = directory.add_group(name);
            book.save(&directory)?;
            println!("Group {} has id {}.", name, id);
        }
        Some(GroupAction::Remove { name }) => {
            let mut directory = book.load(config)?;
            directory.remove_group(&name)?;
            book.save(&directory)?;
            println!("Removed group {}.", name);
        }
    }
    Ok(())
}

fn handle_add(args: AddArgs, config: &Config) -> Result<()> {
    if args.first.trim().is_empty() && args.last.trim().is_empty() {
        bail!("a contact needs a first or last name");
    }

    let book = BookFile::resolve(&args.book, config)?;
    let mut directory = book.load_or_new(config)?;

    let contact = Contact {
        first_name: args.first,
        last_name: args.last,
        phone_type: PhoneType::parse(&args.phone_type),
        phone_number: args.phone,
        groups: args.groups,
        company: args.company,
    };
    let display = contact.full_name();
    directory.add_contact(contact)?;
    book.save(&directory)?;

    println!("Added {}.", display);
    Ok(())
}

fn handle_edit(args: EditArgs, config: &Config) -> Result<()> {
    let book = BookFile::resolve(&args.book, config)?;
    let mut directory = book.load(config)?;

    let mut contact = directory
        .contacts()
        .get(args.index)
        .cloned()
        .ok_or_else(|| anyhow!("no contact at index {}", args.index))?;

    if let Some(first) = args.first {
        contact.first_name = first;
    }
    if let Some(last) = args.last {
        contact.last_name = last;
    }
    if let Some(phone) = args.phone {
        contact.phone_number = phone;
    }
    if let Some(phone_type) = args.phone_type {
        contact.phone_type = PhoneType::parse(&phone_type);
    }
    if args.clear_groups {
        contact.groups.clear();
    } else if !args.groups.is_empty() {
        contact.groups = args.groups;
    }
    if let Some(company) = args.company {
        contact.company = company;
    }

    let display = contact.full_name();
    directory.replace_contact(args.index, contact)?;
    book.save(&directory)?;

    println!("Updated {}.", display);
    Ok(())
}

fn handle_remove(args: &RemoveArgs, config: &Config) -> Result<()> {
    let book = BookFile::resolve(&args.book, config)?;
    let mut directory = book.load(config)?;

    let removed = directory
        .remove_contact(args.index)
        .ok_or_else(|| anyhow!("no contact at index {}", args.index))?;
    book.save(&directory)?;

    println!("Removed {}.", removed.full_name());
    Ok(())
}

fn handle_import(args: ImportArgs, config: &Config) -> Result<()> {
    let book = BookFile::resolve(&args.book, config)?;
    let mut directory = book.load_or_new(config)?;

    let mut options = config.import.clone();
    if let Some(group) = args.group {
        options.group = group;
    }

    let summary = book::import_csv(&mut directory, &args.input, &options)
        .with_context(|| format!("failed to import {}", args.input.display()))?;
    book.save(&directory)?;

    println!("Imported {} contacts.", summary.added);
    println!("Skipped {} duplicates.", summary.duplicates);
    Ok(())
}

fn handle_query(args: QueryArgs, config: &Config) -> Result<()> {
    let book = BookFile::resolve(&args.book, config)?;
    let directory = book.load(config)?;

    let query = Query {
        text: args.text,
        scope: args.scope,
        case_sensitive: args.case_sensitive,
        exact: args.exact,
    };

    // The engine has no implicit "show all" for empty text; this is it.
    let mask: Vec<Visibility> = if query.text.is_empty() {
        (0..directory.len())
            .map(|index| Visibility {
                index,
                visible: true,
            })
            .collect()
    } else {
        book::query(&directory, &query)
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&mask)?);
        return Ok(());
    }

    let contacts = directory.contacts();
    for entry in mask.iter().filter(|entry| entry.visible) {
        print_contact(entry.index, &contacts[entry.index]);
    }
    Ok(())
}

fn handle_convert(args: &ConvertArgs, config: &Config) -> Result<()> {
    let from = format_for(args.from, &args.source)?;
    let to = format_for(args.to, &args.dest)?;

    // vCard categories only resolve against groups that already exist, so
    // the transient directory starts from the full group list.
    let decoded = book::convert(&args.source, from, &args.dest, to, &config.template())
        .with_context(|| {
            format!(
                "failed to convert {} to {}",
                args.source.display(),
                args.dest.display()
            )
        })?;
    report_warnings(&args.source, &decoded.warnings);

    println!(
        "Converted {} contacts from {} to {}.",
        decoded.value.len(),
        from,
        to
    );
    Ok(())
}
