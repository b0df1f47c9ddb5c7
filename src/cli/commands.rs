use crate::core::indicators::{adverse_events, all_indicators, monthly_indicators, top_activities};
use crate::core::{MonthlyIndicators, Normalizer};
use crate::error::{StatError, StatResult};
use crate::excel::GridImporter;
use crate::report;
use crate::types::{Month, NormalizedTable, Section, Subgroup};
use crate::writer::{self, OutputFormat};
use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

const TOP_ACTIVITIES: usize = 10;

/// Format a ratio for display, removing unnecessary decimal places
fn format_number(n: f64) -> String {
    let rounded = (n * 100.0).round() / 100.0;
    format!("{:.2}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Load and normalize, printing progress when verbose
fn load_table(input: &Path, verbose: bool) -> StatResult<NormalizedTable> {
    if verbose {
        println!("{}", "📖 Reading spreadsheet...".cyan());
    }
    let grid = GridImporter::new(input).import()?;

    if verbose {
        println!("   {} rows x {} columns", grid.len(), grid.width());
        println!("{}", "🧮 Normalizing sections...".cyan());
    }
    Normalizer::new()?.normalize(&grid)
}

fn print_table_summary(table: &NormalizedTable) {
    println!("   Records: {}", table.len().to_string().bold());
    for subgroup in [
        Subgroup::GeneralStatistics,
        Subgroup::SessionsPerformed,
        Subgroup::Production,
    ] {
        let count = table.for_subgroup(subgroup).count();
        println!("      {} {}", subgroup.label().bright_blue(), count);
    }
    let months: Vec<&str> = table.months().iter().map(|m| m.code()).collect();
    println!("   Months: {}", months.join(" ").cyan());
}

/// Execute the normalize command
pub fn normalize(
    input: PathBuf,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
    verbose: bool,
) -> StatResult<()> {
    println!("{}", "🏥 oncostat - Normalizing spreadsheet".bold().green());
    println!("   Input:  {}", input.display());
    if let Some(ref out) = output {
        println!("   Output: {}", out.display());
    }
    println!();

    let table = load_table(&input, verbose)?;

    println!("{}", "✅ Normalization complete".bold().green());
    print_table_summary(&table);
    println!();

    match output {
        Some(out) => {
            let format = match format {
                Some(f) => f,
                None => OutputFormat::from_path(&out)?,
            };
            if verbose {
                println!("{}", format!("💾 Writing {:?}...", format).cyan());
            }
            writer::write_table(&table, &out, format)?;
            println!("   Written: {}", out.display().to_string().bright_blue());
        }
        None => {
            if let Some(format) = format {
                // No output file: print text formats to stdout
                match format {
                    OutputFormat::Csv => {
                        let bytes = writer::to_csv(&table)?;
                        println!("{}", String::from_utf8_lossy(&bytes));
                    }
                    OutputFormat::Json => println!("{}", writer::to_json(&table)?),
                    OutputFormat::Yaml => println!("{}", writer::to_yaml(&table)?),
                    OutputFormat::Xlsx => {
                        return Err(StatError::Validation(
                            "xlsx output needs --output <file>".to_string(),
                        ))
                    }
                }
            }
        }
    }

    Ok(())
}

/// Execute the inspect command - show where each block was found
pub fn inspect(input: PathBuf) -> StatResult<()> {
    println!("{}", "🔍 oncostat - Section Layout".bold().green());
    println!("   File: {}\n", input.display());

    let grid = GridImporter::new(&input).import()?;
    let normalizer = Normalizer::new()?;
    let index = normalizer.locate(&grid);

    println!(
        "   Grid: {} rows x {} columns",
        grid.len(),
        grid.width()
    );
    println!();
    println!("{}", "📋 Sections:".bold().cyan());
    for section in Section::ALL {
        match index.row(section) {
            Some(row) => println!(
                "   {} row {:>4}  {}",
                section.to_string().bright_blue().bold(),
                row + 1,
                section.title()
            ),
            None => println!(
                "   {} {}  {}",
                section.to_string().red().bold(),
                "missing ".red(),
                section.title()
            ),
        }
    }
    match index.footer_row() {
        Some(row) => println!("   Footer row {:>4}  {}", row + 1, grid.label(row).trim()),
        None => println!("   Footer {}", "not found (last block runs to end of sheet)".yellow()),
    }
    println!();

    let spans = index.spans()?;
    println!("{}", "📐 Spans:".bold().cyan());
    for span in &spans {
        let records = normalizer.extract_span(&grid, span);
        println!(
            "   {} rows {}..{} ({} data rows) → {} records",
            span.section.to_string().bright_blue(),
            span.start_row + 1,
            span.end_row,
            span.len(),
            records.len()
        );
    }

    Ok(())
}

fn print_indicators(ind: &MonthlyIndicators) {
    println!("   📅 {}", ind.month.code().bright_blue().bold());
    println!("      Pacientes           {}", ind.patients);
    println!("      Pacientes novos     {}", ind.new_patients);
    println!("      Produção            {}", ind.production);
    let events = if ind.adverse_events > 0 {
        ind.adverse_events.to_string().red().bold()
    } else {
        ind.adverse_events.to_string().green()
    };
    println!("      Intercorrências     {}", events);
    println!("      Complexidade        {:+.1}%", ind.complexity_change);
    println!("      Eventos / 1k proc.  {}", format_number(ind.event_rate));
    println!("      Ações por paciente  {}", format_number(ind.intensity));
    println!("      Previsão de agulhas {}", ind.supply_forecast);
}

/// Execute the indicators command
pub fn indicators(input: PathBuf, month: Option<Month>) -> StatResult<()> {
    println!("{}", "📈 oncostat - Monthly Indicators".bold().green());
    println!("   File: {}\n", input.display());

    let table = load_table(&input, false)?;

    match month {
        Some(month) => {
            let ind = monthly_indicators(&table, month).ok_or_else(|| {
                StatError::Validation(format!("No records for month {}", month))
            })?;
            print_indicators(&ind);

            println!("\n   {}", "Top atividades:".bold());
            for record in top_activities(&table, month, TOP_ACTIVITIES) {
                println!(
                    "      {:>6}  {} ({})",
                    record.quantity,
                    record.short_procedure,
                    record.professional
                );
            }

            let events = adverse_events(&table, month);
            if events.is_empty() {
                println!("\n   {}", "Operação 100% segura no período analisado.".green());
            } else {
                println!("\n   {}", format!("⚠️  Eventos adversos em {}", month).red().bold());
                for record in events {
                    println!(
                        "      {:>6}  {} ({})",
                        record.quantity, record.original_procedure, record.professional
                    );
                }
            }
        }
        None => {
            for ind in all_indicators(&table) {
                print_indicators(&ind);
                println!();
            }
        }
    }

    Ok(())
}

/// Execute the report command
pub fn report(input: PathBuf, month: Month, output: Option<PathBuf>) -> StatResult<()> {
    let table = load_table(&input, false)?;
    let text = report::render(&table, month)?;

    match output {
        Some(path) => {
            fs::write(&path, &text)?;
            println!("{}", "✅ Report written".bold().green());
            println!("   {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

/// Execute the watch command
pub fn watch(input: PathBuf, verbose: bool) -> StatResult<()> {
    println!("{}", "👁️  oncostat - Watch Mode".bold().green());
    println!("   Watching: {}", input.display());
    println!("   Press {} to stop\n", "Ctrl+C".bold().yellow());

    if !input.exists() {
        return Err(StatError::Validation(format!(
            "File not found: {}",
            input.display()
        )));
    }

    let canonical_path = input.canonicalize()?;
    let parent_dir = canonical_path
        .parent()
        .ok_or_else(|| StatError::Validation("Cannot determine parent directory".to_string()))?;

    let (tx, rx) = channel();

    // Debounce so a spreadsheet save (temp file + rename) triggers one run
    let mut debouncer = new_debouncer(Duration::from_millis(300), tx)
        .map_err(|e| StatError::Validation(format!("Failed to create file watcher: {}", e)))?;

    debouncer
        .watcher()
        .watch(parent_dir, RecursiveMode::NonRecursive)
        .map_err(|e| StatError::Validation(format!("Failed to watch directory: {}", e)))?;

    if verbose {
        println!("   {} {}", "Watching directory:".cyan(), parent_dir.display());
    }

    println!("{}", "🔄 Initial run...".cyan());
    run_watch_action(&input, verbose);
    println!();

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|event| {
                    event.kind == DebouncedEventKind::Any
                        && is_same_file(&event.path, &canonical_path)
                });

                if relevant {
                    println!(
                        "\n{} {}",
                        "🔄 Change detected at".cyan(),
                        chrono::Local::now().format("%H:%M:%S").to_string().cyan()
                    );
                    run_watch_action(&input, verbose);
                    println!();
                }
            }
            Ok(Err(error)) => {
                eprintln!("{} Watch error: {}", "❌".red(), error);
            }
            Err(e) => {
                eprintln!("{} Channel error: {}", "❌".red(), e);
                break;
            }
        }
    }

    Ok(())
}

fn is_same_file(event_path: &Path, watched: &Path) -> bool {
    if let Ok(event_canonical) = event_path.canonicalize() {
        if event_canonical == watched {
            return true;
        }
    }
    event_path.file_name().is_some() && event_path.file_name() == watched.file_name()
}

/// Each change is a full, independent run
fn run_watch_action(input: &Path, verbose: bool) {
    match load_table(input, verbose) {
        Ok(table) => {
            println!("{}", "✅ Normalization complete".bold().green());
            print_table_summary(&table);
        }
        Err(e) => println!("{} {}", "❌ Normalization failed:".bold().red(), e),
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
