//! Line-oriented terminal front ends for the chat and document sessions.
//!
//! Both loops read commands from any async line source and write to any
//! `Write`, so they run the same against stdin/stdout and in tests.

use std::io::Write;
use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use quill_chat::ChatSession;
use quill_core::error::QuillError;
use quill_docs::{DocumentSession, IngestReport};

const QUIT: &str = "/quit";
const HISTORY: &str = "/history";
const LOAD: &str = "/load";

/// Run the chat loop until `/quit` or end of input.
pub async fn run_chat<R, W>(
    session: &mut ChatSession,
    input: R,
    out: &mut W,
) -> Result<(), QuillError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    for turn in session.history() {
        writeln!(out, "{}> {}", turn.role, turn.text)?;
    }

    let mut lines = input.lines();
    loop {
        write!(out, "user> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            QUIT => break,
            HISTORY => {
                for turn in session.history() {
                    writeln!(out, "{}> {}", turn.role, turn.text)?;
                }
            }
            _ => match session.send(&line).await {
                Ok(Some(reply)) => writeln!(out, "assistant> {}", reply)?,
                Ok(None) => {}
                Err(e) => writeln!(out, "error: {}", e)?,
            },
        }
    }
    debug!(turns = session.history().len(), "Chat loop finished");
    Ok(())
}

/// Run the document question loop until `/quit` or end of input.
///
/// `/load PATH` ingests a PDF; any other non-empty line is a question, which
/// is refused until at least one document has been ingested.
pub async fn run_docs<R, W>(
    session: &mut DocumentSession,
    input: R,
    out: &mut W,
) -> Result<(), QuillError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(
        out,
        "Load a PDF with `{} PATH`, then ask questions about it. `{}` exits.",
        LOAD, QUIT
    )?;

    let mut lines = input.lines();
    loop {
        write!(out, "query> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == QUIT {
            break;
        }

        let (command, argument) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        if command == LOAD {
            let path = argument.trim();
            if path.is_empty() {
                writeln!(out, "usage: {} PATH", LOAD)?;
                continue;
            }
            match ingest_file(session, Path::new(path)).await {
                Ok(report) => print_report(out, &report)?,
                Err(e) => writeln!(out, "error: {}", e)?,
            }
            continue;
        }

        if session.documents_ingested() == 0 {
            writeln!(out, "No document loaded yet. Use `{} PATH` first.", LOAD)?;
            continue;
        }

        match session.ask(line).await {
            Ok(Some(answer)) => {
                writeln!(out, "assistant> {}", answer.text)?;
                for source in &answer.sources {
                    writeln!(
                        out,
                        "  [{} page {} @{}]",
                        source.source_document_id,
                        source.page + 1,
                        source.source_offset
                    )?;
                }
            }
            Ok(None) => {}
            Err(e) => writeln!(out, "error: {}", e)?,
        }
    }
    Ok(())
}

/// Read a file from disk and ingest it under its own file name.
pub async fn ingest_file(
    session: &mut DocumentSession,
    path: &Path,
) -> Result<IngestReport, QuillError> {
    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    session.ingest(&bytes, &filename).await
}

pub fn print_report<W: Write>(out: &mut W, report: &IngestReport) -> Result<(), QuillError> {
    writeln!(
        out,
        "Indexed {}: {} pages, {} segments",
        report.document_id, report.pages, report.segments
    )?;
    Ok(())
}
