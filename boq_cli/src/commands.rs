use std::borrow::Cow;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use tracing::{info, warn};
use uuid::Uuid;

use boq_core::catalog::Catalog;
use boq_core::columns::{ColumnConfig, ColumnKey};
use boq_core::export::{export_csv, ExportLayout};
use boq_core::file_io::{load_project, save_project, write_export, FileLock};
use boq_core::format::format_currency;
use boq_core::history::{QuoteHistory, QuoteStatus};
use boq_core::line_item::{ItemField, ItemKind};
use boq_core::master::{load_master_data, MasterData};
use boq_core::pricing::{price_project, PricedLine};
use boq_core::project::Project;
use boq_core::rollup::{
    division_codes, division_items, division_subtotal, priced_item_count, total_item_count, untagged_items,
};
use boq_core::store::{DirectoryStore, ProjectStore};

use crate::cli::{
    AddGroupArgs, AddItemArgs, ArchiveArgs, CatalogArgs, Command, ExportArgs, GroupRefArgs, ItemRefArgs, MasterArgs,
    NewArgs, PickArgs, QuotesArgs, SetArgs, SettingsArgs, ShowArgs, StatusArg,
};

/// Dispatch one parsed subcommand.
pub fn run(command: &Command) -> Result<()> {
    match command {
        Command::New(args) => run_new(args),
        Command::AddGroup(args) => run_add_group(args),
        Command::AddItem(args) => run_add_item(args),
        Command::Pick(args) => run_pick(args),
        Command::Set(args) => run_set(args),
        Command::Delete(args) => run_delete(args),
        Command::DeleteGroup(args) => run_delete_group(args),
        Command::Toggle(args) => run_toggle(args),
        Command::Settings(args) => run_settings(args),
        Command::Show(args) => run_show(args),
        Command::Export(args) => run_export(args),
        Command::Catalog(args) => run_catalog(args),
        Command::Units(args) => run_units(args),
        Command::Divisions(args) => run_divisions(args),
        Command::Archive(args) => run_archive(args),
        Command::Quotes(args) => run_quotes(args),
    }
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "boq".to_string())
}

/// Lock, load, apply `edit`, save. The lock is released on return.
fn edit_project<T>(path: &Path, edit: impl FnOnce(&mut Project) -> Result<T>) -> Result<T> {
    let _lock = FileLock::acquire(path, current_user()).with_context(|| format!("lock {}", path.display()))?;
    let mut project = load_project(path).with_context(|| format!("load {}", path.display()))?;
    let result = edit(&mut project)?;
    save_project(&project, path).with_context(|| format!("save {}", path.display()))?;
    Ok(result)
}

/// Group by id or by code.
fn resolve_group(project: &Project, reference: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(reference) {
        if project.grouping(&id).is_some() {
            return Ok(id);
        }
    }
    project
        .grouping_by_code(reference)
        .map(|g| g.id)
        .ok_or_else(|| anyhow!("no division '{}'", reference))
}

/// Item by id, by `GROUP/CODE`, or by code in the loose list.
fn resolve_item(project: &Project, reference: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(reference) {
        if project.find_item(&id).is_some() {
            return Ok(id);
        }
    }
    let found = match reference.split_once('/') {
        Some((group, code)) => {
            let gid = resolve_group(project, group)?;
            project
                .grouping(&gid)
                .and_then(|g| g.items.iter().find(|item| item.code == code))
        }
        None => project.items.iter().find(|item| item.code == reference),
    };
    found.map(|item| item.id).ok_or_else(|| anyhow!("no line item '{}'", reference))
}

fn load_master(path: Option<&Path>) -> Result<Cow<'static, MasterData>> {
    match path {
        Some(path) => Ok(Cow::Owned(load_master_data(path)?)),
        None => Ok(Cow::Borrowed(MasterData::standard())),
    }
}

fn load_catalog(path: Option<&Path>) -> Result<Cow<'static, Catalog>> {
    match path {
        Some(path) => Ok(Cow::Owned(Catalog::load(path)?)),
        None => Ok(Cow::Borrowed(Catalog::standard())),
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn money(amount: f64) -> Cell {
    Cell::new(format_currency(amount, "")).set_alignment(CellAlignment::Right)
}

pub fn run_new(args: &NewArgs) -> Result<()> {
    let path = &args.project.file;
    if path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let mut project = Project::new(args.title.as_str(), args.client.as_str());
    if let Some(symbol) = &args.currency {
        project.set_currency_symbol(symbol);
    }
    save_project(&project, path)?;
    println!("{}", project.id());
    Ok(())
}

pub fn run_add_group(args: &AddGroupArgs) -> Result<()> {
    let division = match &args.division {
        Some(code) => {
            let master = load_master(args.master.as_deref())?;
            let division = master
                .division(code)
                .cloned()
                .ok_or_else(|| anyhow!("no division with code '{}' in master data", code))?;
            Some(division)
        }
        None => None,
    };
    let (id, code) = edit_project(&args.project.file, |project| {
        let id = match &division {
            Some(division) => project.add_division(division),
            None => project.add_grouping(args.name.clone().unwrap_or_default()),
        };
        let code = project.grouping(&id).map(|g| g.code.clone()).unwrap_or_default();
        Ok((id, code))
    })?;
    println!("{}\t{}", code, id);
    Ok(())
}

pub fn run_add_item(args: &AddItemArgs) -> Result<()> {
    let kind: ItemKind = args.kind.parse()?;
    let (id, code) = edit_project(&args.project.file, |project| {
        let group = args.group.as_deref().map(|g| resolve_group(project, g)).transpose()?;
        let id = project
            .add_item(group, kind)
            .ok_or_else(|| anyhow!("could not add item"))?;
        if let Some(description) = &args.description {
            project.update_field(&id, ItemField::Description, description);
        }
        let code = project.find_item(&id).map(|item| item.code.clone()).unwrap_or_default();
        Ok((id, code))
    })?;
    println!("{}\t{}", code, id);
    Ok(())
}

pub fn run_pick(args: &PickArgs) -> Result<()> {
    let catalog = load_catalog(args.catalog.as_deref())?;
    let entry = catalog
        .get(&args.entry)
        .ok_or_else(|| anyhow!("no catalog entry '{}'", args.entry))?;
    let (id, code) = edit_project(&args.project.file, |project| {
        let group = args.group.as_deref().map(|g| resolve_group(project, g)).transpose()?;
        let id = project
            .add_from_catalog(group, entry)
            .ok_or_else(|| anyhow!("could not add item"))?;
        let code = project.find_item(&id).map(|item| item.code.clone()).unwrap_or_default();
        Ok((id, code))
    })?;
    info!(entry = %entry.id, item_id = %id, "picked catalog entry");
    println!("{}\t{}", code, id);
    Ok(())
}

pub fn run_set(args: &SetArgs) -> Result<()> {
    let field: ItemField = args.field.parse()?;
    edit_project(&args.project.file, |project| {
        let id = resolve_item(project, &args.item)?;
        project.update_field(&id, field, &args.value);
        if field == ItemField::Unit && !MasterData::standard().is_known_unit(args.value.trim()) {
            warn!(unit = %args.value, "unit is not in the standard unit list");
        }
        Ok(())
    })
}

pub fn run_delete(args: &ItemRefArgs) -> Result<()> {
    edit_project(&args.project.file, |project| {
        let id = resolve_item(project, &args.item)?;
        project.delete_item(&id);
        Ok(())
    })
}

pub fn run_delete_group(args: &GroupRefArgs) -> Result<()> {
    edit_project(&args.project.file, |project| {
        let id = resolve_group(project, &args.group)?;
        project.delete_grouping(&id);
        Ok(())
    })
}

pub fn run_toggle(args: &GroupRefArgs) -> Result<()> {
    let collapsed = edit_project(&args.project.file, |project| {
        let id = resolve_group(project, &args.group)?;
        Ok(project.toggle_grouping(&id).unwrap_or(false))
    })?;
    println!("{}", if collapsed { "collapsed" } else { "expanded" });
    Ok(())
}

pub fn run_settings(args: &SettingsArgs) -> Result<()> {
    edit_project(&args.project.file, |project| {
        if let Some(title) = &args.title {
            project.set_title(title);
        }
        if let Some(client) = &args.client {
            project.set_client_name(client);
        }
        if let Some(symbol) = &args.currency {
            project.set_currency_symbol(symbol);
        }
        if let Some(markup) = &args.markup {
            project.set_markup_percent(markup);
        }
        if let Some(factor) = &args.multiplier {
            project.set_site_multiplier(factor);
        }
        if let Some(label) = &args.label {
            if !project.set_multiplier_label(label) {
                warn!("--label only applies to multiplier pricing; pass --multiplier to switch");
            }
        }
        if let Some(tax) = &args.tax {
            project.set_tax_percent(tax);
        }
        if let Some(status) = args.status {
            project.set_status(match status {
                StatusArg::Draft => QuoteStatus::Draft,
                StatusArg::Sent => QuoteStatus::Sent,
            });
        }
        Ok(())
    })
}

fn push_line(table: &mut Table, line: &PricedLine<'_>) {
    let item = line.item;
    match &line.cost {
        Some(cost) => {
            table.add_row(vec![
                Cell::new(&item.code),
                Cell::new(&item.description),
                Cell::new(&item.unit),
                Cell::new(item.quantity).set_alignment(CellAlignment::Right),
                money(cost.rate),
                money(cost.amount),
            ]);
        }
        None => {
            table.add_row(vec![Cell::new(&item.code), Cell::new(item.description.to_uppercase())]);
        }
    }
}

fn subtotal_row(table: &mut Table, code: &str, name: &str, subtotal: f64) {
    table.add_row(vec![
        Cell::new(code),
        Cell::new(name),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        money(subtotal),
    ]);
}

/// Division name for a loose-item tag: a grouping with that code first, then the taxonomy.
fn division_name(project: &Project, master: &MasterData, code: &str) -> String {
    project
        .grouping_by_code(code)
        .map(|g| g.name.clone())
        .or_else(|| master.division(code).map(|d| d.name.clone()))
        .unwrap_or_else(|| code.to_string())
}

/// Tagged loose items under one subtotal row per division, then untagged items.
fn push_loose(table: &mut Table, project: &Project, master: &MasterData) {
    for code in division_codes(project) {
        subtotal_row(table, code, &division_name(project, master, code), division_subtotal(project, code));
        for item in division_items(project, code) {
            push_line(table, &PricedLine::new(item));
        }
    }
    for item in untagged_items(project) {
        push_line(table, &PricedLine::new(item));
    }
}

pub fn run_show(args: &ShowArgs) -> Result<()> {
    let project = load_project(&args.project.file)?;
    let master = load_master(args.master.as_deref())?;
    let priced = price_project(&project);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&priced)?);
        return Ok(());
    }

    let mut table = new_table(vec!["Code", "Description", "Unit", "Qty", "Rate", "Amount"]);
    for group in &priced.groups {
        let marker = if group.grouping.collapsed { "+" } else { "-" };
        subtotal_row(
            &mut table,
            &format!("{} {}", marker, group.grouping.code),
            &group.grouping.name,
            group.subtotal,
        );
        if !group.grouping.collapsed {
            for line in &group.lines {
                push_line(&mut table, line);
            }
        }
    }
    push_loose(&mut table, &project, &master);

    let symbol = &project.settings.currency_symbol;
    let totals = &priced.totals;
    println!("{} - {}", project.meta.title, project.meta.client_name);
    println!("{table}");
    println!(
        "{} items ({} priced)",
        total_item_count(&project),
        priced_item_count(&project)
    );
    if !project.settings.pricing.is_identity() {
        println!("Subtotal: {}", format_currency(totals.cost_base, symbol));
        println!(
            "{}: {}",
            project.settings.pricing.adjustment_label(),
            format_currency(totals.adjustment, symbol)
        );
    }
    println!("Grand total: {}", format_currency(totals.grand_total, symbol));
    if totals.tax_percent != 0.0 {
        println!("Tax ({}%): {}", totals.tax_percent, format_currency(totals.tax, symbol));
        println!("Total due: {}", format_currency(totals.total_due, symbol));
    }
    Ok(())
}

fn export_columns(layout: ExportLayout, args: &ExportArgs) -> Result<ColumnConfig> {
    let mut columns = layout.default_columns();
    for key in &args.show {
        columns.set_visible(key.parse::<ColumnKey>()?, true);
    }
    for key in &args.hide {
        columns.set_visible(key.parse::<ColumnKey>()?, false);
    }
    for rename in &args.rename {
        let (key, label) = rename
            .split_once('=')
            .ok_or_else(|| anyhow!("expected COLUMN=LABEL, got '{}'", rename))?;
        columns.set_label(key.parse::<ColumnKey>()?, label);
    }
    Ok(columns)
}

pub fn run_export(args: &ExportArgs) -> Result<()> {
    let project = load_project(&args.project.file)?;
    let layout: ExportLayout = args.layout.parse()?;
    let columns = export_columns(layout, args)?;
    let csv = export_csv(&project, &columns, layout)?;
    if args.stdout {
        print!("{csv}");
        return Ok(());
    }
    let dir = args.out.as_deref().unwrap_or_else(|| Path::new("."));
    let path = write_export(dir, &project.meta.title, &csv)?;
    println!("{}", path.display());
    Ok(())
}

pub fn run_catalog(args: &CatalogArgs) -> Result<()> {
    let catalog = load_catalog(args.catalog.as_deref())?;
    let mut entries = catalog.search(args.query.as_deref().unwrap_or(""));
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }
    let mut table = new_table(vec!["ID", "Name", "Category", "Unit", "Cost", "Fills"]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.id),
            Cell::new(&entry.name),
            Cell::new(&entry.category),
            Cell::new(&entry.unit),
            money(entry.cost),
            Cell::new(format!("{:?}", entry.component)),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_units(args: &MasterArgs) -> Result<()> {
    let master = load_master(args.master.as_deref())?;
    for unit in &master.units {
        println!("{unit}");
    }
    Ok(())
}

pub fn run_divisions(args: &MasterArgs) -> Result<()> {
    let master = load_master(args.master.as_deref())?;
    let mut table = new_table(vec!["Code", "Division"]);
    for division in &master.divisions {
        table.add_row(vec![division.code.as_str(), division.name.as_str()]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_archive(args: &ArchiveArgs) -> Result<()> {
    let project = load_project(&args.project.file)?;
    let mut store = DirectoryStore::open(&args.store)?;
    store.save(&project)?;
    println!("{}", store.path_for(&project.id()).display());
    Ok(())
}

pub fn run_quotes(args: &QuotesArgs) -> Result<()> {
    let store = DirectoryStore::open(&args.store)?;
    let mut projects = Vec::new();
    for id in store.ids()? {
        match store.load(&id) {
            Ok(project) => projects.push(project),
            Err(error) => warn!(project_id = %id, %error, "skipping unreadable project"),
        }
    }
    let history = QuoteHistory::from_projects(projects);

    let mut table = new_table(vec!["Client", "Title", "Total", "Status", "Date"]);
    for quote in history.entries() {
        table.add_row(vec![
            Cell::new(&quote.client),
            Cell::new(&quote.title),
            money(quote.total),
            Cell::new(quote.status),
            Cell::new(quote.date),
        ]);
    }
    println!("{table}");
    println!("{} quotes", history.entries().len());
    for status in QuoteStatus::ALL {
        println!(
            "{}: {} ({})",
            status,
            history.count_with_status(status),
            format_currency(history.total_with_status(status), "")
        );
    }
    Ok(())
}
