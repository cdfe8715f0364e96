//! Terminal output for a completed run.

use std::io::{self, Write};

use postjoin_config::OutputFormat;
use postjoin_engine::RunOutput;

/// Write `output` in the requested format, followed by a newline.
pub fn render(out: &mut impl Write, output: &RunOutput, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &output.posts)?;
            writeln!(out)
        }
        OutputFormat::Summary => render_summary(out, output),
    }
}

fn render_summary(out: &mut impl Write, output: &RunOutput) -> io::Result<()> {
    for entry in &output.posts {
        writeln!(
            out,
            "#{:<4} {:>3} comment(s)  {}",
            entry.id(),
            entry.comments.len(),
            entry.post.title
        )?;
    }
    let report = &output.report;
    writeln!(
        out,
        "{} post(s), {} comment(s) via {} (limit {}) in {} ms",
        report.posts,
        report.comments,
        report.strategy,
        report.limit,
        report.elapsed.as_millis()
    )
}
