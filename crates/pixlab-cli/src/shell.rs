//! Line-oriented command interpreter over one editing session
//!
//! Every line is parsed with clap into a [`ShellCommand`] and dispatched to
//! the matching [`EditorSession`] operation. Keyboard chords (`key ctrl+z`)
//! resolve through the shortcut table to the same operations.

use crate::files;
use crate::viewport::Viewport;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pixlab_core::{Command, EditorError, EditorSession, Shortcut, Tool};
use pixlab_remote::{BatchOperation, ExportFormat, OperationId, Parameters, DEFAULT_QUALITY};
use std::io::Write;
use std::path::{Path, PathBuf};

/// What the read loop does after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Parser)]
#[command(name = "pixlab", no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Debug, Subcommand)]
enum ShellCommand {
    /// Load an image file as the new document
    Open { path: PathBuf },

    /// Select a processing tool (`select` for none), with key=value parameters
    Tool { name: String, params: Vec<String> },

    /// Set key=value parameters on the selected tool
    Set {
        #[arg(required = true)]
        params: Vec<String>,
    },

    /// Apply an operation, or the selected tool when none is named
    Apply { args: Vec<String> },

    /// Step back in history
    Undo,

    /// Step forward in history
    Redo,

    /// Jump to a history entry
    Goto { index: usize },

    /// Show the history timeline
    History,

    /// Clear the history timeline
    Clear,

    /// Preview an operation (or the selected tool) side by side
    Compare { args: Vec<String> },

    /// Leave comparison mode
    ExitCompare,

    /// Manage and run the batch queue
    #[command(subcommand)]
    Batch(BatchCommand),

    /// Export the current image through the service
    Export {
        /// png, jpg or pdf
        format: String,
        #[arg(long, default_value_t = DEFAULT_QUALITY)]
        quality: u8,
        /// Target file (defaults to the suggested name)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Export the current image as a PDF report page
    ExportPdf {
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Write the current image as-is
    Save { path: PathBuf },

    /// Request a processing report for the session
    Report,

    /// Ask the service for the original's dimensions
    Inspect,

    /// Change the view zoom
    Zoom { step: ZoomStep },

    /// Press a keyboard shortcut, e.g. ctrl+shift+z
    Key { chord: String },

    /// Summarize the session
    Status,

    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Subcommand)]
enum BatchCommand {
    /// Queue image files or directories
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Drop one queued file
    Remove { index: usize },
    /// Drop every queued file
    Clear,
    /// List queued files
    List,
    /// Run one operation over the queue
    Run {
        operation: String,
        params: Vec<String>,
    },
    /// Write the last batch result into a directory
    Save { dir: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ZoomStep {
    In,
    Out,
    Fit,
}

/// Split `[operation] key=value...` arguments
fn split_operation(args: &[String]) -> Result<(Option<OperationId>, Parameters)> {
    let (operation, rest) = match args.split_first() {
        Some((first, rest)) if !first.contains('=') => (Some(first.parse::<OperationId>()?), rest),
        _ => (None, args),
    };
    let params = Parameters::parse_pairs(rest.iter().map(String::as_str))?;
    Ok((operation, params))
}

pub(crate) struct Shell<W> {
    session: EditorSession,
    viewport: Viewport,
    out: W,
}

impl<W: Write> Shell<W> {
    pub(crate) fn new(session: EditorSession, out: W) -> Self {
        Self {
            session,
            viewport: Viewport::new(),
            out,
        }
    }

    #[cfg(test)]
    pub(crate) fn session(&self) -> &EditorSession {
        &self.session
    }

    #[cfg(test)]
    pub(crate) fn output(&self) -> &W {
        &self.out
    }

    /// Parse and run one input line, then print queued notifications
    ///
    /// Command failures are reported on the output and never end the loop.
    ///
    /// # Errors
    /// Only when writing to the output fails
    pub(crate) async fn execute(&mut self, line: &str) -> Result<Flow> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(Flow::Continue);
        }
        let parsed = match Line::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => parsed,
            Err(err) => {
                write!(self.out, "{err}")?;
                return Ok(Flow::Continue);
            }
        };

        let outcome = self.run(parsed.command).await;
        let shown = self.flush_notifications()?;
        match outcome {
            Ok(flow) => Ok(flow),
            Err(err) => {
                // Local rejections already surfaced as a notification
                let covered = shown > 0
                    && err
                        .downcast_ref::<EditorError>()
                        .is_some_and(|e| !e.is_remote());
                if !covered {
                    writeln!(self.out, "error: {err:#}")?;
                }
                Ok(Flow::Continue)
            }
        }
    }

    fn flush_notifications(&mut self) -> Result<usize> {
        let notifications = self.session.drain_notifications();
        for notification in &notifications {
            writeln!(self.out, "{notification}")?;
        }
        Ok(notifications.len())
    }

    async fn run(&mut self, command: ShellCommand) -> Result<Flow> {
        match command {
            ShellCommand::Open { path } => self.open(&path)?,
            ShellCommand::Tool { name, params } => {
                let tool = if name.eq_ignore_ascii_case("select") {
                    Tool::Select
                } else {
                    let params = Parameters::parse_pairs(params.iter().map(String::as_str))?;
                    Tool::with_parameters(name.parse()?, params)
                };
                self.session.select_tool(tool.clone())?;
                writeln!(self.out, "tool: {tool}")?;
            }
            ShellCommand::Set { params } => {
                if self.session.tool() == Tool::Select {
                    bail!("select a processing tool first");
                }
                let params = Parameters::parse_pairs(params.iter().map(String::as_str))?;
                self.merge_into_tool(&params)?;
            }
            ShellCommand::Apply { args } => {
                let (operation, params) = split_operation(&args)?;
                let entry = match operation {
                    Some(id) => self.session.apply(id, &params).await?,
                    None => {
                        self.merge_into_tool(&params)?;
                        self.session.apply_selected().await?
                    }
                };
                tracing::debug!(label = entry.label(), "applied");
            }
            ShellCommand::Undo => self.dispatch(Command::Undo)?,
            ShellCommand::Redo => self.dispatch(Command::Redo)?,
            ShellCommand::Goto { index } => {
                self.session.goto(index)?;
                self.print_history()?;
            }
            ShellCommand::History => self.print_history()?,
            ShellCommand::Clear => {
                self.session.clear_history()?;
                writeln!(self.out, "history cleared")?;
            }
            ShellCommand::Compare { args } => {
                let (operation, params) = split_operation(&args)?;
                let snapshot = match operation {
                    Some(id) => self.session.enter_comparison(id, &params).await?,
                    None => {
                        self.merge_into_tool(&params)?;
                        self.session.enter_comparison_selected().await?
                    }
                };
                writeln!(
                    self.out,
                    "left: {} ({})  right: {} ({})",
                    snapshot.original_ref.name(),
                    snapshot.original_ref.hash().short(),
                    snapshot.label,
                    snapshot.processed_ref.hash().short(),
                )?;
            }
            ShellCommand::ExitCompare => {
                if !self.session.exit_comparison()? {
                    writeln!(self.out, "not comparing")?;
                }
            }
            ShellCommand::Batch(command) => self.batch(command).await?,
            ShellCommand::Export {
                format,
                quality,
                out,
            } => {
                let format: ExportFormat = format.parse()?;
                let exported = self.session.export(format, quality).await?;
                let target = out.unwrap_or_else(|| PathBuf::from(exported.filename()));
                self.write_file(&target, &exported.file)?;
            }
            ShellCommand::ExportPdf { out } => {
                let exported = self.session.export_pdf().await?;
                let target = out.unwrap_or_else(|| PathBuf::from(exported.filename()));
                self.write_file(&target, &exported.file)?;
            }
            ShellCommand::Save { path } => {
                let current = self.session.current().ok_or(EditorError::NoDocument)?;
                self.write_file(&path, &current)?;
            }
            ShellCommand::Report => {
                let report = self.session.report().await?;
                writeln!(self.out, "file:        {}", report.original_filename)?;
                writeln!(self.out, "dimensions:  {}", report.original_dimensions)?;
                writeln!(self.out, "created:     {}", report.timestamp)?;
                writeln!(self.out, "operations:  {}", report.operations_applied)?;
                for operation in &report.operations {
                    writeln!(self.out, "  - {operation}")?;
                }
            }
            ShellCommand::Inspect => {
                let info = self.session.inspect().await?;
                let name = self
                    .session
                    .original()
                    .map(|o| o.name().to_string())
                    .unwrap_or_default();
                writeln!(self.out, "{name}: {info}")?;
            }
            ShellCommand::Zoom { step } => {
                let command = match step {
                    ZoomStep::In => Command::ZoomIn,
                    ZoomStep::Out => Command::ZoomOut,
                    ZoomStep::Fit => Command::ZoomFit,
                };
                self.dispatch(command)?;
            }
            ShellCommand::Key { chord } => {
                let shortcut = Shortcut::parse(&chord)?;
                let command = shortcut
                    .command()
                    .with_context(|| format!("nothing bound to {shortcut}"))?;
                self.dispatch(command)?;
            }
            ShellCommand::Status => self.print_status()?,
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Run a shortcut command through the same operations as typed commands
    fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Undo => {
                self.session.undo()?;
                self.print_history()?;
            }
            Command::Redo => {
                self.session.redo()?;
                self.print_history()?;
            }
            Command::Open => writeln!(self.out, "usage: open <path>")?,
            Command::ZoomIn | Command::ZoomOut | Command::ZoomFit => {
                self.viewport.handle(command);
                writeln!(self.out, "zoom: {}%", self.viewport.percent())?;
            }
        }
        Ok(())
    }

    fn merge_into_tool(&self, params: &Parameters) -> Result<()> {
        for (key, value) in params.iter() {
            self.session.set_tool_parameter(key, value)?;
        }
        Ok(())
    }

    fn open(&mut self, path: &Path) -> Result<()> {
        let image = files::read_image(path)?;
        let (name, len) = (image.name().to_string(), image.len());
        self.session.load(name.clone(), image.bytes().to_vec())?;
        self.viewport.fit();
        writeln!(self.out, "loaded {name} ({len} bytes)")?;
        Ok(())
    }

    async fn batch(&mut self, command: BatchCommand) -> Result<()> {
        match command {
            BatchCommand::Add { paths } => {
                let images = files::collect_images(&paths)?
                    .iter()
                    .map(|p| files::read_image(p))
                    .collect::<Result<Vec<_>>>()?;
                if images.is_empty() {
                    bail!("no image files found");
                }
                let outcome = self.session.submit_batch(images)?;
                for name in &outcome.rejected {
                    writeln!(self.out, "not queued: {name}")?;
                }
                writeln!(self.out, "queued {} file(s)", outcome.accepted)?;
            }
            BatchCommand::Remove { index } => {
                let removed = self.session.remove_pending(index)?;
                writeln!(self.out, "removed {}", removed.name())?;
            }
            BatchCommand::Clear => {
                self.session.clear_pending()?;
                writeln!(self.out, "queue cleared")?;
            }
            BatchCommand::List => {
                let pending = self.session.view().pending_batch;
                if pending.is_empty() {
                    writeln!(self.out, "queue empty")?;
                }
                for (index, name) in pending.iter().enumerate() {
                    writeln!(self.out, "{index:>2}  {name}")?;
                }
            }
            BatchCommand::Run { operation, params } => {
                let operation: BatchOperation = operation.parse()?;
                let params = Parameters::parse_pairs(params.iter().map(String::as_str))?;
                let result = self.session.run_batch(operation, &params).await?;
                writeln!(self.out, "{} ({operation})", result.job_id)?;
                for (filename, image) in result.per_file() {
                    writeln!(self.out, "  {filename}  {} bytes", image.len())?;
                }
            }
            BatchCommand::Save { dir } => {
                let result = self
                    .session
                    .batch_result()
                    .context("no batch result to save")?;
                let written = result
                    .write_to_dir(&dir)
                    .with_context(|| format!("cannot write batch into {}", dir.display()))?;
                writeln!(self.out, "wrote {} file(s) to {}", written.len(), dir.display())?;
            }
        }
        Ok(())
    }

    fn write_file(&mut self, path: &Path, payload: &pixlab_document::BinaryRef) -> Result<()> {
        files::write_payload(path, payload)?;
        writeln!(self.out, "wrote {} ({} bytes)", path.display(), payload.len())?;
        Ok(())
    }

    fn print_history(&mut self) -> Result<()> {
        let view = self.session.view();
        if view.labels.is_empty() {
            writeln!(self.out, "(history empty)")?;
        }
        for (index, label) in view.labels.iter().enumerate() {
            let marker = if view.active == Some(index) { '*' } else { ' ' };
            writeln!(self.out, "{marker} {index:>2}  {label}")?;
        }
        Ok(())
    }

    fn print_status(&mut self) -> Result<()> {
        let view = self.session.view();
        writeln!(
            self.out,
            "document:   {}",
            view.document_name.as_deref().unwrap_or("(none)")
        )?;
        writeln!(self.out, "active:     {}", view.active_label().unwrap_or("-"))?;
        writeln!(self.out, "tool:       {}", view.tool)?;
        writeln!(self.out, "zoom:       {}%", self.viewport.percent())?;
        writeln!(self.out, "comparing:  {}", view.is_comparing())?;
        writeln!(self.out, "queued:     {}", view.pending_batch.len())?;
        if let Some(summary) = &view.batch_result {
            writeln!(
                self.out,
                "last batch: {} {} x{}",
                summary.job_id, summary.operation, summary.count
            )?;
        }
        Ok(())
    }
}
