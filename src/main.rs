use anyhow::{anyhow, bail, Context, Result};
use crossterm::style::Stylize;
use reedline::{
    default_emacs_keybindings, ColumnarMenu, Emacs, FileBackedHistory, KeyCode, KeyModifiers,
    MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus, Reedline,
    ReedlineEvent, ReedlineMenu, Signal,
};
use std::borrow::Cow;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

mod completer;
mod table_display;

use completer::{CommandCompleter, SharedColumns};
use table_display::{display_table, export_to_csv};
use table_views::config::Config;
use table_views::controllers::{init_tables, FilterConfig, MenuEvent, PageBindings, TableBindings};
use table_views::dom::loaders::{load_csv_document, load_json_document};
use table_views::dom::{Document, Table, TableBuilder, ToggleButton};
use table_views::dom::geometry::Rect;
use table_views::logging::{init_tracing, LogRingBuffer};
use table_views::preferences::{JsonFileStore, MemoryStore, PreferenceStore};
use table_views::state::SortDirection;
use table_views::utils::app_paths::AppPaths;

struct ViewPrompt {
    label: String,
}

impl Prompt for ViewPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{}> ", self.label))
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        match edit_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => "".into(),
            PromptEditMode::Vi(vi_mode) => match vi_mode {
                reedline::PromptViMode::Normal => "N ".into(),
                reedline::PromptViMode::Insert => "I ".into(),
            },
            PromptEditMode::Custom(str) => format!("{str} ").into(),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse search: {})",
            prefix, history_search.term
        ))
    }
}

fn print_help() {
    println!("{}", "table-views - sort, filter and page through tables".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  table-views [OPTIONS] [FILE.csv|FILE.json]");
    println!();
    println!("{}", "Options:".yellow());
    println!("  {}     - Rows per page (saved for next time)", "--per-page N".green());
    println!("  {} - Build value filters for these columns", "--filter COL,...".green());
    println!("  {} - Generate config file with defaults", "--generate-config".green());
    println!();
    println!("{}", "Commands (columns by header text or 1-based number):".yellow());
    println!("  {} - Sort a column", "sort <col> [asc|desc]".green());
    println!("  {}            - Header click (toggles direction)", "click <col>".green());
    println!("  {}                - List filter buttons", "filters".green());
    println!("  {}           - Toggle filter button n", "filter <n>".green());
    println!("  {}  - Page navigation", "page <n> | next | prev".green());
    println!("  {}           - Change the page size", "per-page <n>".green());
    println!("  {}  - Column visibility", "hide <col> | show <col>".green());
    println!("  {}  - Column menu / show all columns", "columns | reset-columns".green());
    println!("  {}      - List tables / switch table", "tables | use <n>".green());
    println!("  {} - Export filtered rows to CSV", "\\export <file.csv>".green());
    println!("  {}  - Recent log messages", "\\logs".green());
    println!("  {}  - Show this help", "\\help".green());
    println!("  {} - Clear screen", "\\clear".green());
    println!("  {}  - Exit", "\\quit".green());
    println!();
}

#[derive(Debug, Default)]
struct CliArgs {
    file: Option<String>,
    per_page: Option<usize>,
    filter_columns: Vec<String>,
    generate_config: bool,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut cli = CliArgs::default();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--per-page" => {
                let value = iter.next().ok_or_else(|| anyhow!("--per-page needs a value"))?;
                cli.per_page = Some(value.parse().with_context(|| format!("Bad page size '{}'", value))?);
            }
            "--filter" => {
                let value = iter.next().ok_or_else(|| anyhow!("--filter needs column names"))?;
                cli.filter_columns = value
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "--generate-config" => cli.generate_config = true,
            "--help" | "-h" => cli.help = true,
            other if other.starts_with("--") => bail!("Unknown option '{}'", other),
            file => cli.file = Some(file.to_string()),
        }
    }
    Ok(cli)
}

/// Sample table used when no file is given
fn demo_document() -> Document {
    let mut builder = TableBuilder::new(&["Order", "Customer", "Status", "Total", "Placed"])
        .id("orders")
        .heading("Recent orders")
        .sortable()
        .paginate();
    let rows = [
        ["A-1007", "Émile", "Paid", "120,50", "03.02.2024 14:05"],
        ["A-1002", "bob", "Open", "15", "2024-01-12"],
        ["A-1011", "Chloé", "Paid", "1 200", "01/20/2024"],
        ["A-1001", "alice", "Refunded", "n/a", "2024-01-03 09:30"],
        ["A-1004", "Dmitri", "Open", "88.8", "2024-01-15"],
        ["A-1009", "zoe", "Paid", "42", "2024-02-10"],
        ["A-1003", "Bob", "Paid", "15", "2024-01-12"],
        ["A-1012", "Yusuf", "Open", "310", "2024-03-01"],
        ["A-1005", "Émile", "Refunded", "64", "2024-01-20"],
        ["A-1010", "item10", "Paid", "7", "2024-02-14"],
        ["A-1006", "item2", "Open", "19.99", "2024-01-28"],
        ["A-1008", "Maya", "Paid", "250", "2024-02-02"],
    ];
    for row in &rows {
        builder = builder.row(row);
    }

    let mut document = Document::new();
    document.add_table(builder.build());
    document.add_toggle(ToggleButton {
        target: "#orders".to_string(),
        anchor: Rect::new(1100.0, 40.0, 120.0, 28.0),
    });
    document
}

fn load_document(file: Option<&str>) -> Result<Document> {
    match file {
        Some(path) if path.ends_with(".json") => load_json_document(path),
        Some(path) => load_csv_document(path),
        None => Ok(demo_document()),
    }
}

fn open_store(config: &Config) -> Rc<dyn PreferenceStore> {
    if let Some(path) = &config.storage.preferences_file {
        return Rc::new(JsonFileStore::new(path));
    }
    match JsonFileStore::open_default() {
        Ok(store) => Rc::new(store),
        Err(e) => {
            eprintln!("{}", format!("Preferences will not be saved: {:#}", e).yellow());
            Rc::new(MemoryStore::new())
        }
    }
}

/// Column by header text, else by 1-based number
fn resolve_column(table: &Table, spec: &str) -> Result<usize> {
    let element = table.element();
    if let Some(index) = element.column_index(spec) {
        return Ok(index);
    }
    if let Some(index) = element
        .header
        .iter()
        .position(|h| h.text.trim().eq_ignore_ascii_case(spec.trim()))
    {
        return Ok(index);
    }
    match spec.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= element.column_count() => Ok(n - 1),
        _ => bail!("Unknown column '{}'", spec),
    }
}

fn parse_number(arg: Option<&str>, usage: &str) -> Result<usize> {
    arg.and_then(|a| a.trim().parse().ok())
        .ok_or_else(|| anyhow!("Usage: {}", usage))
}

fn column_names(bindings: &TableBindings) -> Vec<String> {
    bindings
        .table
        .element()
        .header
        .iter()
        .map(|h| h.text.trim().to_string())
        .collect()
}

struct Session {
    document: Document,
    bindings: PageBindings,
    current: usize,
    log_buffer: LogRingBuffer,
    /// Column names offered by tab completion
    columns: SharedColumns,
}

impl Session {
    fn active(&self) -> Result<&TableBindings> {
        self.bindings
            .get(self.current)
            .ok_or_else(|| anyhow!("No table loaded"))
    }

    fn active_mut(&mut self) -> Result<&mut TableBindings> {
        self.bindings
            .get_mut(self.current)
            .ok_or_else(|| anyhow!("No table loaded"))
    }

    fn label(&self) -> String {
        self.active()
            .ok()
            .and_then(|b| {
                let element = b.table.element();
                element
                    .id()
                    .map(str::to_string)
                    .or_else(|| element.heading.clone())
            })
            .unwrap_or_else(|| "table".to_string())
    }

    /// Point tab completion at the active table's columns
    fn sync_columns(&self) -> Result<()> {
        let names = column_names(self.active()?);
        *self.columns.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = names;
        Ok(())
    }

    /// Run one command; returns false when the session should end
    fn execute(&mut self, line: &str) -> Result<bool> {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        let arg = Some(rest).filter(|r| !r.is_empty());

        match command {
            "\\quit" | "\\q" | "exit" => return Ok(false),
            "\\help" => {
                print_help();
                return Ok(true);
            }
            "\\clear" => {
                print!("{esc}[2J{esc}[1;1H", esc = 27 as char);
                return Ok(true);
            }
            "\\logs" => {
                for entry in self.log_buffer.get_recent(50) {
                    println!("{}", entry.format_for_display().dark_grey());
                }
                return Ok(true);
            }
            "\\export" => {
                let file = arg.ok_or_else(|| anyhow!("Usage: \\export <file.csv>"))?;
                export_to_csv(self.active()?, file)?;
                return Ok(true);
            }
            "tables" => {
                for (i, bindings) in self.bindings.tables().iter().enumerate() {
                    let element = bindings.table.element();
                    println!(
                        "  {} {} ({} rows){}",
                        i + 1,
                        element.heading.as_deref().or(element.id()).unwrap_or("<untitled>"),
                        element.row_count(),
                        if i == self.current { " *" } else { "" }
                    );
                }
                return Ok(true);
            }
            "use" => {
                let n = parse_number(arg, "use <n>")?;
                if n == 0 || n > self.bindings.tables().len() {
                    bail!("No table {}", n);
                }
                self.current = n - 1;
                self.sync_columns()?;
            }
            "sort" => {
                let rest = arg.ok_or_else(|| anyhow!("Usage: sort <col> [asc|desc]"))?;
                let (column, direction) = rest
                    .rsplit_once(char::is_whitespace)
                    .and_then(|(column, dir)| SortDirection::parse(dir).map(|d| (column.trim(), d)))
                    .unwrap_or((rest, SortDirection::Asc));
                let bindings = self.active()?;
                let column = resolve_column(&bindings.table, column)?;
                let sorter = bindings
                    .sorter
                    .clone()
                    .ok_or_else(|| anyhow!("This table is not sortable"))?;
                sorter.borrow_mut().sort_by(column, direction)?;
            }
            "click" => {
                let bindings = self.active()?;
                let column = resolve_column(&bindings.table, arg.unwrap_or(""))?;
                let sorter = bindings
                    .sorter
                    .clone()
                    .ok_or_else(|| anyhow!("This table is not sortable"))?;
                if !sorter.borrow_mut().click_header(column)? {
                    println!("{}", "That column is not sortable.".yellow());
                }
            }
            "filters" => {
                match &self.active()?.filters {
                    Some(filters) if !filters.buttons().is_empty() => {
                        for (i, button) in filters.buttons().iter().enumerate() {
                            let line = format!("  {:>3} [{}] {}", i + 1, button.title, button.label);
                            if button.active {
                                println!("{}", line.magenta().bold());
                            } else {
                                println!("{}", line);
                            }
                        }
                    }
                    _ => println!("{}", "No filters (start with --filter COL,...)".yellow()),
                }
                return Ok(true);
            }
            "filter" => {
                let n = parse_number(arg, "filter <n>")?;
                if n == 0 {
                    bail!("Filter buttons are numbered from 1");
                }
                let filters = self
                    .bindings
                    .get_mut(self.current)
                    .and_then(|b| b.filters.as_mut())
                    .ok_or_else(|| anyhow!("No filters (start with --filter COL,...)"))?;
                filters.click(&mut self.document, n - 1)?;
            }
            "page" | "next" | "prev" | "per-page" => {
                let pager = self
                    .active()?
                    .pager
                    .clone()
                    .ok_or_else(|| anyhow!("This table is not paginated"))?;
                let mut pager = pager.borrow_mut();
                match command {
                    "page" => pager.go_to_page(parse_number(arg, "page <n>")?),
                    "next" => pager.next(),
                    "prev" => pager.prev(),
                    _ => pager.set_per_page(parse_number(arg, "per-page <n>")?)?,
                }
            }
            "hide" | "show" => {
                let usage = format!("{} <col>", command);
                let spec = arg.ok_or_else(|| anyhow!("Usage: {}", usage))?;
                let bindings = self.active_mut()?;
                let column = resolve_column(&bindings.table, spec)?;
                let visibility = bindings
                    .visibility
                    .as_mut()
                    .ok_or_else(|| anyhow!("This table has no column menu"))?;
                visibility.set_column_visible(column, command == "show")?;
            }
            "columns" => {
                let viewport = self.document.viewport();
                let visibility = self
                    .active_mut()?
                    .visibility
                    .as_mut()
                    .ok_or_else(|| anyhow!("This table has no column menu"))?;
                let position = visibility.open_menu(viewport);
                println!(
                    "{}",
                    format!("Columns (menu at {:.0},{:.0}):", position.x, position.y).yellow()
                );
                for item in visibility.menu_items() {
                    println!(
                        "  [{}] {} {}",
                        if item.checked { "x" } else { " " },
                        item.column + 1,
                        item.label
                    );
                }
                visibility.handle(MenuEvent::OutsideClick);
                return Ok(true);
            }
            "reset-columns" => {
                self.active_mut()?
                    .visibility
                    .as_mut()
                    .ok_or_else(|| anyhow!("This table has no column menu"))?
                    .reset();
            }
            "show-table" | "" => {}
            other => bail!("Unknown command '{}' (try \\help)", other),
        }

        display_table(self.active()?);
        Ok(true)
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}", format!("Error: {:#}", e).red());
            print_help();
            std::process::exit(2);
        }
    };

    if cli.help {
        print_help();
        return Ok(());
    }

    if cli.generate_config {
        let path = Config::get_config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Error creating config directory {}", parent.display()))?;
        }
        std::fs::write(&path, Config::create_default_with_comments())
            .with_context(|| format!("Error writing config file {}", path.display()))?;
        println!("Configuration file created at: {:?}", path);
        return Ok(());
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format!("Using default config: {:#}", e).yellow());
            Config::default()
        }
    };
    let log_buffer = init_tracing(&config.logging.filter);

    let mut document = load_document(cli.file.as_deref())?;
    let store = open_store(&config);
    let mut bindings = init_tables(&document, &config, store);
    if bindings.tables().is_empty() {
        bail!("The document contains no tables");
    }

    if !cli.filter_columns.is_empty() {
        let filter_config = FilterConfig::new("table", cli.filter_columns.as_slice())
            .debug(config.logging.filter.contains("debug"));
        if let Err(e) = bindings.init_value_filters(&mut document, filter_config) {
            eprintln!("{}", format!("Filters unavailable: {:#}", e).yellow());
        }
    }

    if let Some(per_page) = cli.per_page {
        if let Some(pager) = bindings.get(0).and_then(|b| b.pager.clone()) {
            pager.borrow_mut().set_per_page(per_page)?;
        }
    }

    let columns: SharedColumns = Arc::new(Mutex::new(Vec::new()));
    let mut session = Session {
        document,
        bindings,
        current: 0,
        log_buffer,
        columns: columns.clone(),
    };
    session.sync_columns()?;

    let history_file = AppPaths::history_file()?;
    let history = Box::new(
        FileBackedHistory::with_file(100, history_file)
            .map_err(|e| anyhow!("Error configuring history: {}", e))?,
    );

    let completer = Box::new(CommandCompleter::new(columns));
    let completion_menu = Box::new(
        ColumnarMenu::default()
            .with_name("command_completion")
            .with_columns(1)
            .with_column_width(None)
            .with_column_padding(2),
    );

    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::Menu("command_completion".to_string()),
    );

    let mut line_editor = Reedline::create()
        .with_completer(completer)
        .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
        .with_history(history)
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    println!("{}", "Type \\help for commands.".dark_grey());
    display_table(session.active()?);

    loop {
        let prompt = ViewPrompt {
            label: session.label(),
        };
        match line_editor.read_line(&prompt)? {
            Signal::Success(buffer) => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match session.execute(trimmed) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => eprintln!("{}", format!("Error: {:#}", e).red()),
                }
            }
            Signal::CtrlD | Signal::CtrlC => break,
        }
    }

    println!("\nGoodbye!");
    Ok(())
}
