use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use colored::Colorize;
use tmerge_merge::{
    channel, read_replacement, ChannelResolver, Choice, ConflictRequest, ConflictResolver,
    MergeConfig, MergeError, Resolution,
};
use tracing::{debug, warn};

/// Asks for conflict decisions on a text terminal.
///
/// Both sides of each region are printed with the four options. An answer
/// that is not one of them is reported and asked again. End of input counts
/// as abandoning the merge.
pub struct TerminalResolver<R, W> {
    input: R,
    output: W,
    sentinel: String,
}

impl<R: BufRead, W: Write> TerminalResolver<R, W> {
    pub fn new(input: R, output: W, sentinel: impl Into<String>) -> Self {
        Self {
            input,
            output,
            sentinel: sentinel.into(),
        }
    }

    fn show(&mut self, request: &ConflictRequest) -> io::Result<()> {
        let out = &mut self.output;
        writeln!(out)?;
        writeln!(out, "{}", format!("Conflict {}", request.region + 1).yellow().bold())?;
        writeln!(out, "{}", "LOCAL version:".red().bold())?;
        write_side(out, &request.local)?;
        writeln!(out, "{}", "NEW version:".green().bold())?;
        write_side(out, &request.new)?;
        Ok(())
    }

    fn ask(&mut self) -> io::Result<Option<String>> {
        writeln!(self.output, "Options:")?;
        for choice in Choice::ALL {
            writeln!(self.output, "  {choice}")?;
        }
        write!(self.output, "Choose [1-4]: ")?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Ok(None);
        }
        Ok(Some(answer))
    }
}

fn write_side<W: Write>(out: &mut W, lines: &[String]) -> io::Result<()> {
    if lines.is_empty() {
        return writeln!(out, "  {}", "(no lines)".dimmed());
    }
    for line in lines {
        writeln!(out, "  {line}")?;
    }
    Ok(())
}

impl<R: BufRead, W: Write> ConflictResolver for TerminalResolver<R, W> {
    fn resolve(&mut self, request: &ConflictRequest) -> Result<Resolution, MergeError> {
        let region = request.region;
        self.show(request)?;

        loop {
            let Some(answer) = self.ask()? else {
                return Err(MergeError::ResolutionAbandoned { region });
            };
            match Choice::parse(&answer) {
                Some(Choice::Edit) => {
                    writeln!(
                        self.output,
                        "Enter the replacement, then a line containing only {}:",
                        self.sentinel.bold()
                    )?;
                    return match read_replacement(&mut self.input, &self.sentinel)? {
                        Some(lines) => Ok(Resolution::Replace(lines)),
                        None => Err(MergeError::ResolutionAbandoned { region }),
                    };
                }
                Some(choice) => return Ok(choice.into_resolution(Vec::new())),
                None => {
                    warn!(region, answer = answer.trim(), "invalid conflict choice");
                    writeln!(self.output, "{} {:?} is not one of 1-4", "Invalid choice:".red(), answer.trim())?;
                }
            }
        }
    }
}

/// A resolver reading decisions from stdin and prompting on stderr.
///
/// With a configured timeout the prompt runs on its own thread behind a
/// resolution channel, so a silent terminal aborts the merge.
pub fn terminal_resolver(config: &MergeConfig) -> Box<dyn ConflictResolver> {
    let sentinel = config.end_sentinel.clone();
    match config.resolution_timeout() {
        Some(timeout) => Box::new(spawn_stdin_resolver(sentinel, timeout)),
        None => Box::new(TerminalResolver::new(io::stdin().lock(), io::stderr(), sentinel)),
    }
}

fn spawn_stdin_resolver(sentinel: String, timeout: Duration) -> ChannelResolver {
    let (resolver, handle) = channel(Some(timeout));
    thread::spawn(move || {
        let mut terminal = TerminalResolver::new(io::stdin().lock(), io::stderr(), sentinel);
        while let Some(request) = handle.next_request() {
            match terminal.resolve(&request) {
                Ok(resolution) => {
                    if !handle.respond(resolution) {
                        break;
                    }
                }
                Err(err) => {
                    debug!(error = %err, "terminal prompt stopped");
                    break;
                }
            }
        }
    });
    resolver
}
