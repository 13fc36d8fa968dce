use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;
use docx_comments::report::writer::{
    OutputFormat, WriterOptions, write_report_to_path, write_text_report,
};
use docx_comments::{AnchorScope, CommentParts, Error, ReportOptions, Result, build_report};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "docx-comments",
    version,
    about = "Extract threaded review comments from a .docx into a reply-grouped report"
)]
pub struct Cli {
    /// The .docx file to read.
    pub input: PathBuf,

    /// Output path (defaults to the input file stem with the format's extension).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (defaults to the output extension, then xlsx).
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Which runs count as a comment's anchored text.
    #[arg(long, value_enum, default_value_t = AnchorScope::Sibling)]
    pub anchor_scope: AnchorScope,

    /// Add an "Initials" column after "Author".
    #[arg(long)]
    pub include_initials: bool,

    /// Prefix delimited output with a UTF-8 byte order mark.
    #[arg(long)]
    pub bom: bool,

    /// Also write the three raw comment parts into this directory.
    #[arg(long, value_name = "DIR")]
    pub dump_parts: Option<PathBuf>,

    /// Print the report to standard output instead of a file (text formats only).
    #[arg(long, conflicts_with = "output")]
    pub stdout: bool,
}

impl Cli {
    fn resolved_format(&self) -> OutputFormat {
        self.format
            .or_else(|| self.output.as_deref().and_then(OutputFormat::from_path))
            .unwrap_or(if self.stdout {
                OutputFormat::Csv
            } else {
                OutputFormat::Xlsx
            })
    }

    fn output_path(&self, format: OutputFormat) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.input, format))
    }
}

/// The input path with its extension swapped for the format's.
fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    input.with_extension(format.extension())
}

pub fn run(cli: Cli) -> Result<()> {
    let format = cli.resolved_format();
    let options = ReportOptions::new()
        .with_anchor_scope(cli.anchor_scope)
        .with_initials(cli.include_initials);
    let writer_options = WriterOptions::new(format).with_bom(cli.bom);

    let parts = CommentParts::from_path(&cli.input)?;
    if let Some(dir) = &cli.dump_parts {
        parts.dump_to_dir(dir)?;
        info!(dir = %dir.display(), "raw comment parts written");
    }

    let report = build_report(&parts, &options)?;
    if !report.diagnostics().is_clean() {
        warn!(diagnostics = %report.diagnostics(), "document needed repairs");
    }

    if cli.stdout {
        if !format.is_text() {
            return Err(Error::Write(format!(
                "{} output cannot be printed, choose a text format",
                format.extension()
            )));
        }
        let mut stdout = std::io::stdout().lock();
        write_text_report(&report, &mut stdout, &writer_options)?;
        stdout.flush()?;
        return Ok(());
    }

    let output = cli.output_path(format);
    write_report_to_path(&report, &output, &writer_options)?;
    info!(
        input = %cli.input.display(),
        output = %output.display(),
        rows = report.len(),
        "comments exported"
    );
    Ok(())
}
