use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;
use uuid::Uuid;

use crate::application::{
    BudgetReport, BudgetService, ExpenseChart, NewGoal, NewTransaction, truncate_description,
};
use crate::domain::{DEFAULT_CURRENCY, FALLBACK_CATEGORY, format_money, format_signed_money};
use crate::storage::SqliteBlobStore;

type Service = BudgetService<SqliteBlobStore>;

/// Width of the longest bar in `budget chart`
const CHART_WIDTH: usize = 40;

/// Budget tracker - income, expenses, categories and savings goals
#[derive(Parser)]
#[command(name = "budget")]
#[command(about = "A local-first personal budget tracker")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "BUDGET_DB", default_value = "budget.db")]
    pub database: String,

    /// Currency symbol used when printing amounts
    #[arg(long, env = "BUDGET_CURRENCY", default_value = DEFAULT_CURRENCY, global = true)]
    pub currency: String,

    /// Logging verbosity: off, error, warn, info, debug, trace (RUST_LOG overrides)
    #[arg(long, default_value_t = LevelFilter::WARN, global = true)]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Record a transaction (positive = income, negative = expense)
    Add {
        /// Amount (e.g., "1000", "-12.50")
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// What the money was for
        #[arg(short, long)]
        description: String,

        /// Category name (case-insensitive)
        #[arg(short, long, default_value = "Other")]
        category: String,

        /// Date of the transaction (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Record the amount as an expense even if typed without a minus sign
        #[arg(short = 'x', long)]
        expense: bool,
    },

    /// Remove a transaction by ID
    Remove {
        /// Transaction ID
        id: String,
    },

    /// List transactions, newest first
    List {
        /// Only show this category
        #[arg(short, long)]
        category: Option<String>,

        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show balance, income and expense totals
    Summary,

    /// Expense totals by category
    Breakdown {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Bar chart of expenses by category
    Chart,

    /// Budget report: summary, category shares and recent transactions
    Report {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Savings goal commands
    #[command(subcommand)]
    Goal(GoalCommands),

    /// Export data to CSV or JSON
    Export {
        /// What to export: transactions, goals, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format for transactions: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,
    },

    /// Import data from CSV or JSON
    Import {
        /// What to import: transactions (CSV), full (JSON snapshot)
        import_type: String,

        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,

        /// Create categories that don't exist
        #[arg(long)]
        create_categories: bool,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List categories
    List,

    /// Add a category
    Add {
        /// Category name (must be unique, case-insensitive)
        name: String,
    },

    /// Delete a category; its transactions move to "Other"
    Delete {
        /// Category name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a savings goal
    Add {
        /// Goal name
        name: String,

        /// Target amount (e.g., "5000")
        #[arg(short, long)]
        target: String,

        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Amount already saved
        #[arg(short, long)]
        initial: Option<String>,
    },

    /// List goals with their progress
    List,

    /// Delete a goal
    Delete {
        /// Goal ID
        id: String,
    },

    /// Overwrite the amount saved so far
    Set {
        /// Goal ID
        id: String,

        /// New saved amount
        amount: String,
    },

    /// Add funds to a goal
    Contribute {
        /// Goal ID
        id: String,

        /// Amount to add
        amount: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let currency = self.currency.as_str();

        match self.command {
            Commands::Init => {
                Service::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Add {
                amount,
                description,
                category,
                date,
                expense,
            } => {
                let mut service = open_service(&self.database).await?;
                let amount = if expense && !amount.trim_start().starts_with('-') {
                    format!("-{}", expense_magnitude(&amount))
                } else {
                    amount
                };
                let date = date.unwrap_or_else(|| today().format("%Y-%m-%d").to_string());

                let transaction = service
                    .add_transaction(NewTransaction {
                        description,
                        amount,
                        category,
                        date,
                    })
                    .await?;

                println!(
                    "Recorded: {} {} [{}] ({})",
                    format_signed_money(currency, transaction.amount_cents),
                    transaction.description,
                    transaction.category,
                    transaction.id
                );
            }

            Commands::Remove { id } => {
                let mut service = open_service(&self.database).await?;
                let id = parse_id(&id)?;
                if service.remove_transaction(id).await? {
                    println!("Removed transaction {}", id);
                } else {
                    println!("No transaction with ID {}", id);
                }
            }

            Commands::List { category, limit } => {
                let service = open_service(&self.database).await?;
                run_list_command(&service, currency, category, limit);
            }

            Commands::Summary => {
                let service = open_service(&self.database).await?;
                let summary = service.summary();
                println!("Balance:  {}", format_money(currency, summary.balance));
                println!("Income:   {}", format_signed_money(currency, summary.income));
                println!("Expense:  {}", format_signed_money(currency, -summary.expense));
            }

            Commands::Breakdown { format } => {
                let service = open_service(&self.database).await?;
                run_breakdown_command(&service, currency, &format)?;
            }

            Commands::Chart => {
                let service = open_service(&self.database).await?;
                match service.expense_chart() {
                    Some(chart) => print_chart(&chart, currency),
                    None => println!("No expense data to display"),
                }
            }

            Commands::Report { format, output } => {
                let service = open_service(&self.database).await?;
                let report = service.report(today());
                let text = match format.as_str() {
                    "json" => serde_json::to_string_pretty(&report)?,
                    "table" => render_report(&report, currency),
                    _ => anyhow::bail!("Invalid report format '{}'. Valid: table, json", format),
                };
                match output {
                    Some(path) => {
                        std::fs::write(&path, text)
                            .with_context(|| format!("Failed to write report: {}", path))?;
                        eprintln!("Report written to {}", path);
                    }
                    None => println!("{}", text),
                }
            }

            Commands::Category(cmd) => {
                let mut service = open_service(&self.database).await?;
                run_category_command(&mut service, cmd).await?;
            }

            Commands::Goal(cmd) => {
                let mut service = open_service(&self.database).await?;
                run_goal_command(&mut service, currency, cmd).await?;
            }

            Commands::Export {
                export_type,
                output,
                format,
            } => {
                let service = open_service(&self.database).await?;
                run_export_command(&service, &export_type, output.as_deref(), &format)?;
            }

            Commands::Import {
                import_type,
                input,
                dry_run,
                create_categories,
            } => {
                let mut service = open_service(&self.database).await?;
                run_import_command(
                    &mut service,
                    &import_type,
                    input.as_deref(),
                    dry_run,
                    create_categories,
                )
                .await?;
            }
        }

        Ok(())
    }
}

async fn open_service(database: &str) -> Result<Service> {
    Service::connect(database)
        .await
        .with_context(|| format!("Could not open '{}'. Run 'budget init' first", database))
}

fn run_list_command(
    service: &Service,
    currency: &str,
    category: Option<String>,
    limit: Option<usize>,
) {
    let mut transactions: Vec<_> = service
        .transactions()
        .iter()
        .rev()
        .filter(|t| match &category {
            Some(c) => t.category.eq_ignore_ascii_case(c.trim()),
            None => true,
        })
        .collect();
    transactions.sort_by(|a, b| b.date.cmp(&a.date));
    if let Some(limit) = limit {
        transactions.truncate(limit);
    }

    if transactions.is_empty() {
        println!("No transactions found.");
        return;
    }

    println!(
        "{:<12} {:<25} {:<15} {:>14}  ID",
        "DATE", "DESCRIPTION", "CATEGORY", "AMOUNT"
    );
    println!("{}", "-".repeat(106));
    for t in transactions {
        println!(
            "{:<12} {:<25} {:<15} {:>14}  {}",
            t.date.format("%Y-%m-%d"),
            truncate_description(&t.description),
            t.category,
            format_signed_money(currency, t.amount_cents),
            t.id
        );
    }
}

fn run_breakdown_command(service: &Service, currency: &str, format: &str) -> Result<()> {
    let summary = service.summary();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summary.categories)?),
        "csv" => {
            println!("category,total_cents");
            for c in &summary.categories {
                println!("{},{}", c.category, c.total);
            }
        }
        "table" => {
            if summary.categories.is_empty() {
                println!("No expense data to display");
                return Ok(());
            }
            println!("{:<20} {:>14}", "CATEGORY", "SPENT");
            println!("{}", "-".repeat(35));
            for c in &summary.categories {
                println!("{:<20} {:>14}", c.category, format_money(currency, c.total));
            }
            println!("{}", "-".repeat(35));
            println!("{:<20} {:>14}", "TOTAL", format_money(currency, summary.expense));
        }
        _ => anyhow::bail!("Invalid format '{}'. Valid: table, json, csv", format),
    }
    Ok(())
}

fn print_chart(chart: &ExpenseChart, currency: &str) {
    let ticks: Vec<String> = chart
        .ticks
        .iter()
        .map(|t| format_money(currency, *t))
        .collect();
    println!("Scale: {}", ticks.join(" | "));
    println!();
    for bar in &chart.bars {
        let width = (bar.height_percent / 100.0 * CHART_WIDTH as f64).round() as usize;
        println!(
            "{:<16} {:<width$} {}",
            bar.category,
            "#".repeat(width.max(1)),
            format_money(currency, bar.amount),
            width = CHART_WIDTH
        );
    }
}

fn render_report(report: &BudgetReport, currency: &str) -> String {
    let mut out = String::new();
    out.push_str("BUDGET REPORT\n");
    out.push_str(&format!(
        "Generated on {}\n\n",
        report.generated_on.format("%B %-d, %Y")
    ));

    out.push_str("Financial Summary\n");
    out.push_str(&format!(
        "  Total income:   {}\n",
        format_money(currency, report.total_income)
    ));
    out.push_str(&format!(
        "  Total expenses: {}\n",
        format_money(currency, report.total_expense)
    ));
    out.push_str(&format!(
        "  Net balance:    {}\n\n",
        format_money(currency, report.balance)
    ));

    out.push_str("Expense Breakdown by Category\n");
    if report.categories.is_empty() {
        out.push_str("  No expenses recorded\n");
    }
    for share in &report.categories {
        out.push_str(&format!(
            "  {:<20} {:>14} ({}%)\n",
            share.category,
            format_money(currency, share.total),
            share.percentage
        ));
    }

    if !report.recent.is_empty() {
        out.push_str("\nRecent Transactions\n");
        for t in &report.recent {
            out.push_str(&format!(
                "  {:<8} {:<25} {:<15} {:>14}\n",
                t.date.format("%b %-d"),
                truncate_description(&t.description),
                t.category,
                format_signed_money(currency, t.amount_cents)
            ));
        }
    }
    out
}

async fn run_category_command(service: &mut Service, cmd: CategoryCommands) -> Result<()> {
    match cmd {
        CategoryCommands::List => {
            for name in service.categories().names() {
                println!("{}", name);
            }
        }

        CategoryCommands::Add { name } => {
            let name = service.add_category(&name).await?;
            println!("Added category: {}", name);
        }

        CategoryCommands::Delete { name } => {
            let deletion = service.delete_category(&name).await?;
            println!("Deleted category: {}", deletion.category);
            if deletion.reassigned > 0 {
                println!(
                    "  {} transaction(s) moved to {}",
                    deletion.reassigned, FALLBACK_CATEGORY
                );
            }
        }
    }
    Ok(())
}

async fn run_goal_command(service: &mut Service, currency: &str, cmd: GoalCommands) -> Result<()> {
    match cmd {
        GoalCommands::Add {
            name,
            target,
            date,
            initial,
        } => {
            let goal = service
                .add_goal(NewGoal {
                    name,
                    target_amount: target,
                    target_date: date,
                    initial_amount: initial,
                })
                .await?;
            println!(
                "Created goal: {} ({} by {}) ({})",
                goal.name,
                format_money(currency, goal.target_cents),
                goal.target_date.format("%b %-d, %Y"),
                goal.id
            );
        }

        GoalCommands::List => {
            let statuses = service.goal_statuses(today());
            if statuses.is_empty() {
                println!("No savings goals yet. Add one with 'budget goal add'.");
            }
            for status in statuses {
                let goal = &status.goal;
                let progress = &status.progress;
                println!("{} ({})", goal.name, goal.id);
                println!(
                    "  Target: {} | Saved: {} | Remaining: {}",
                    format_money(currency, goal.target_cents),
                    format_money(currency, goal.current_cents),
                    format_money(currency, progress.remaining)
                );
                println!(
                    "  Target date: {} | {:.1}% complete",
                    goal.target_date.format("%b %-d, %Y"),
                    progress.percent_complete
                );
                match progress.daily_needed {
                    _ if goal.is_reached() => println!("  Goal reached!"),
                    Some(daily) => println!(
                        "  {} days remaining, need {}/day",
                        progress.days_left,
                        format_money(currency, daily)
                    ),
                    None => println!("  Goal date passed"),
                }
            }
        }

        GoalCommands::Delete { id } => {
            let goal = service.delete_goal(parse_id(&id)?).await?;
            println!("Deleted goal: {}", goal.name);
        }

        GoalCommands::Set { id, amount } => {
            let goal = service.set_goal_amount(parse_id(&id)?, &amount).await?;
            println!(
                "{}: saved {}",
                goal.name,
                format_money(currency, goal.current_cents)
            );
        }

        GoalCommands::Contribute { id, amount } => {
            let goal = service.contribute_to_goal(parse_id(&id)?, &amount).await?;
            println!(
                "{}: saved {} of {}",
                goal.name,
                format_money(currency, goal.current_cents),
                format_money(currency, goal.target_cents)
            );
        }
    }
    Ok(())
}

fn run_export_command(
    service: &Service,
    export_type: &str,
    output: Option<&str>,
    format: &str,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match (export_type, format) {
        ("transactions", "csv") => {
            let count = exporter.export_transactions_csv(writer)?;
            if output.is_some() {
                eprintln!("Exported {} transactions", count);
            }
        }
        ("transactions", "json") => {
            let count = exporter.export_transactions_json(writer)?;
            if output.is_some() {
                eprintln!("Exported {} transactions", count);
            }
        }
        ("goals", _) => {
            let count = exporter.export_goals_csv(writer)?;
            if output.is_some() {
                eprintln!("Exported {} goals", count);
            }
        }
        ("full", _) => {
            let snapshot = exporter.export_full_json(writer)?;
            if output.is_some() {
                eprintln!(
                    "Exported {} transactions, {} categories, {} goals",
                    snapshot.transactions.len(),
                    snapshot.categories.len(),
                    snapshot.goals.len()
                );
            }
        }
        ("transactions", other) => {
            anyhow::bail!("Invalid format '{}'. Valid formats: csv, json", other);
        }
        (other, _) => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: transactions, goals, full",
                other
            );
        }
    }

    Ok(())
}

async fn run_import_command(
    service: &mut Service,
    import_type: &str,
    input: Option<&str>,
    dry_run: bool,
    create_categories: bool,
) -> Result<()> {
    use crate::io::{ImportOptions, Importer};
    use std::fs::File;
    use std::io::{Read, stdin};

    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let options = ImportOptions {
        dry_run,
        create_missing_categories: create_categories,
    };

    let mut importer = Importer::new(service);
    let result = match import_type {
        "transactions" => importer.import_transactions_csv(reader, options).await?,
        "full" => importer.import_full_json(reader, options).await?,
        _ => {
            anyhow::bail!(
                "Invalid import type '{}'. Valid types: transactions, full",
                import_type
            );
        }
    };

    if dry_run {
        println!("Validation complete (nothing stored)");
    } else {
        println!("Import complete");
    }
    println!("  Imported:   {}", result.imported);
    if result.reassigned > 0 {
        println!("  Reassigned: {}", result.reassigned);
    }
    println!("  Errors:     {}", result.errors.len());

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for error in result.errors.iter().take(10) {
            println!("  Line {}: {}", error.line, error.error);
        }
        if result.errors.len() > 10 {
            println!("  ... and {} more errors", result.errors.len() - 10);
        }
    }

    Ok(())
}

/// The typed amount without surrounding space or a leading `+`.
fn expense_magnitude(amount: &str) -> &str {
    let amount = amount.trim();
    amount.strip_prefix('+').unwrap_or(amount)
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).with_context(|| format!("Invalid ID '{}'", id))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
