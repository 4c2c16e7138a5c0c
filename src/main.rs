use clap::{Parser, Subcommand};
use gradesheet::cli::{self, GenerateArgs, ImportArgs};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gradesheet")]
#[command(about = "Per-group grading spreadsheets from a roster export, and back again.")]
#[command(long_about = "Gradesheet - per-group grading spreadsheets

COMMANDS:
  generate  - Roster → one .xlsx per group (members in B4, score cell B11 blank)
  import    - Graded group sheets → roster grade column (roster overwritten)

WORKFLOW:
  1. Export the roster from your LMS (.csv or .xlsx)
  2. gradesheet generate roster.csv groups/ --group-col Team
  3. Graders type the total into the score cell, e.g. \"11 / 15\"
  4. gradesheet import roster.csv groups/

Cells, column names and the grade column can also come from a YAML file
passed with --config (or GRADESHEET_CONFIG).")]
#[command(version)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Generate one grading sheet per group from a roster.

Groups come from --group-col when the roster has that column; otherwise
every person gets a sheet named after --name-cols (or their email).

The member emails are written comma-separated into --member-cell and the
--grade-cell is left blank for the grader. With --template the template's
sheets are copied first and --sheet-name picks the sheet to fill in.

EXAMPLES:
  gradesheet generate roster.csv groups/ --group-col \"Group Name\"
  gradesheet generate roster.xlsx sheets/ --name-cols \"Last Name\" \"First Name\"
  gradesheet generate roster.csv groups/ --template rubric.xlsx --overwrite")]
    /// Generate one grading sheet per group
    Generate(GenerateArgs),

    #[command(long_about = "Import graded totals from group sheets into the roster.

Every .xlsx in the group folder is read (not recursive). The members cell
is split on commas; the first number in the grade cell (\"11 / 15.0\" → 11)
is written to each member's grade column. The roster is overwritten.

Sheets that cannot be read or whose score is not a number are skipped with
a warning. Emails missing from the roster are reported and ignored.

GRADE COLUMN:
  --grade-column G          column letter, used when given
  --grade-column-name Grade header name, appended if missing (default)

EXAMPLES:
  gradesheet import roster.xlsx groups/
  gradesheet import roster.csv groups/ --grade-column G --duplicates reject")]
    /// Import graded totals back into the roster
    Import(ImportArgs),
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "gradesheet=debug"
    } else {
        "gradesheet=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate(args) => cli::generate(args)?,
        Commands::Import(args) => cli::import(args)?,
    }

    Ok(())
}
