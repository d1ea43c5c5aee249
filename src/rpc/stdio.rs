//! Stdio transport: request lines on stdin, response lines on stdout.

use super::Dispatcher;
use std::io::{self, BufRead, Write};
use tracing::{debug, info};

/// Serve requests from `reader` until end of input.
///
/// Blank lines are skipped. Every other line gets exactly one response line.
pub fn serve<R: BufRead, W: Write>(dispatcher: &Dispatcher, reader: R, mut writer: W) -> io::Result<()> {
    let mut handled = 0usize;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = dispatcher.handle_line(&line);
        writeln!(writer, "{response}")?;
        writer.flush()?;
        handled += 1;
        debug!(handled, "stdio call answered");
    }

    info!(handled, "stdin closed, leaving stdio mode");
    Ok(())
}

/// Serve the process's own stdin/stdout.
pub fn run(dispatcher: &Dispatcher) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(dispatcher, stdin.lock(), stdout.lock())
}
