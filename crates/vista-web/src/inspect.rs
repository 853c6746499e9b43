//! Plain-text rendering of a [`ReportView`] for `vista inspect`.

use colored::{ColoredString, Colorize};
use std::io::{self, Write};
use vista_core::{AttachmentRowState, PanelState, Preview, ReportView, StepRow};
use vista_proto::{Outcome, TestStatus, TextSpan};

/// Lines of preview text printed per attachment.
const PREVIEW_LINES: usize = 10;

fn paint(text: &str, use_colors: bool, style: impl FnOnce(&str) -> ColoredString) -> String {
    if use_colors {
        style(text).to_string()
    } else {
        text.to_string()
    }
}

fn outcome_color(outcome: Outcome, text: &str, use_colors: bool) -> String {
    paint(text, use_colors, |t| match outcome {
        Outcome::Expected => t.green(),
        Outcome::Unexpected => t.red(),
        Outcome::Flaky => t.yellow(),
        Outcome::Skipped => t.dimmed(),
    })
}

fn status_color(status: TestStatus, text: &str, use_colors: bool) -> String {
    paint(text, use_colors, |t| match status {
        TestStatus::Passed => t.green(),
        TestStatus::Failed | TestStatus::TimedOut => t.red(),
        TestStatus::Interrupted => t.yellow(),
        TestStatus::Skipped => t.dimmed(),
    })
}

/// Writes `view` as indented text.
pub fn write_view<W: Write>(writer: &mut W, view: &ReportView, use_colors: bool) -> io::Result<()> {
    writeln!(writer, "{}", paint(&view.page.title, use_colors, |t| t.bold()))?;

    let Some(header) = &view.header else {
        if !view.project_names.is_empty() {
            writeln!(writer, "Projects: {}", view.project_names.join(", "))?;
        }
        return Ok(());
    };

    writeln!(writer, "{}", header.full_title)?;
    writeln!(
        writer,
        "{} · {} · {} · {}ms",
        header.project_name,
        header.location,
        outcome_color(header.outcome, header.outcome.as_str(), use_colors),
        header.duration
    )?;
    if !header.tags.is_empty() {
        writeln!(writer, "Tags: {}", header.tags.join(" "))?;
    }

    if let Some(annotations) = &view.annotations {
        let state = match annotations.state {
            PanelState::Collapsed => "collapsed",
            PanelState::Expanded => "expanded",
        };
        writeln!(writer)?;
        writeln!(
            writer,
            "{} ({}) [{}]",
            paint("Annotations", use_colors, |t| t.bold()),
            annotations.count,
            state
        )?;
        if let Some(preview) = &annotations.preview {
            writeln!(writer, "  {}", preview)?;
        }
        for item in &annotations.items {
            let text: String = item
                .spans
                .iter()
                .map(|span| match span {
                    TextSpan::Text { text } => text.clone(),
                    TextSpan::Link { text, .. } => {
                        paint(text, use_colors, |t| t.cyan().underline())
                    }
                })
                .collect();
            writeln!(writer, "  {}: {}", item.kind, text)?;
        }
    }

    if !view.results.is_empty() {
        writeln!(writer)?;
        let tabs: Vec<String> = view
            .results
            .iter()
            .map(|tab| {
                let label = format!(
                    "#{} {} {}ms",
                    tab.retry,
                    status_color(tab.status, tab.status.as_str(), use_colors),
                    tab.duration
                );
                if tab.selected {
                    format!("[{}]", label)
                } else {
                    label
                }
            })
            .collect();
        writeln!(
            writer,
            "{} {}",
            paint("Results:", use_colors, |t| t.bold()),
            tabs.join("  ")
        )?;
    }

    if !view.errors.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "{}", paint("Errors:", use_colors, |t| t.red().bold()))?;
        for error in &view.errors {
            for line in error.lines() {
                writeln!(writer, "  {}", paint(line, use_colors, |t| t.red()))?;
            }
        }
    }

    if !view.steps.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "{}", paint("Steps:", use_colors, |t| t.bold()))?;
        for row in &view.steps {
            write_step(writer, row, use_colors)?;
        }
    }

    if !view.attachments.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "{}", paint("Attachments:", use_colors, |t| t.bold()))?;
        for row in &view.attachments {
            writeln!(
                writer,
                "  [{}] {} ({}) {}",
                row.index,
                row.name,
                row.content_type,
                paint(&row.download.href, use_colors, |t| t.dimmed())
            )?;
            match &row.state {
                AttachmentRowState::Hidden => {}
                AttachmentRowState::Loading => writeln!(writer, "      loading...")?,
                AttachmentRowState::Ready {
                    preview,
                    placeholder,
                    ..
                } => match preview {
                    Preview::Text { text, truncated } => {
                        for line in text.lines().take(PREVIEW_LINES) {
                            writeln!(writer, "      {}", line)?;
                        }
                        if *truncated || text.lines().count() > PREVIEW_LINES {
                            writeln!(writer, "      {}", paint("...", use_colors, |t| t.dimmed()))?;
                        }
                    }
                    Preview::Unavailable => writeln!(
                        writer,
                        "      {}",
                        paint(placeholder.as_deref().unwrap_or_default(), use_colors, |t| {
                            t.dimmed()
                        })
                    )?,
                },
                AttachmentRowState::Unavailable { reason } => writeln!(
                    writer,
                    "      {}",
                    paint(reason, use_colors, |t| t.yellow())
                )?,
            }
        }
    }

    Ok(())
}

fn write_step<W: Write>(writer: &mut W, row: &StepRow, use_colors: bool) -> io::Result<()> {
    let marker = if row.leaf {
        " "
    } else if row.expanded {
        "▾"
    } else {
        "▸"
    };
    let mut line = format!("{}{} {}", "  ".repeat(row.depth + 1), marker, row.title);
    if row.count > 1 {
        line.push_str(&format!(" ×{}", row.count));
    }
    if let Some(location) = &row.location {
        line.push_str(&format!("  {}", paint(location, use_colors, |t| t.dimmed())));
    }
    line.push_str(&format!("  {}ms", row.duration));
    writeln!(writer, "{}", line)?;

    if let Some(error) = &row.error {
        let indent = "  ".repeat(row.depth + 2);
        for error_line in error.lines() {
            writeln!(writer, "{}{}", indent, paint(error_line, use_colors, |t| t.red()))?;
        }
    }
    Ok(())
}
