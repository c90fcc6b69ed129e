//! Output rendering abstraction for chatwire.
//!
//! Defines the [`Renderer`] trait that decouples the streaming session from
//! the display layer. [`StdoutRenderer`] prints tokens directly to the
//! terminal as they arrive.

use colored::Colorize;
use std::io::{self, IsTerminal, Write};

use crate::message::ToolCallRequest;

/// Receives incremental display updates from a running turn.
pub trait Renderer {
    /// Starts a new, empty assistant message.
    fn begin_message(&mut self);

    /// Render a text fragment as it arrives.
    fn render_token(&mut self, token: &str);

    /// Overwrites the in-progress assistant message, e.g. with an error.
    fn replace_message(&mut self, text: &str);

    /// Shows a tool call that is waiting for approval.
    fn tool_request(&mut self, call: &ToolCallRequest);

    /// Shows the result that will be sent back for a tool call.
    fn tool_result(&mut self, call: &ToolCallRequest, result: &str);

    /// Called when the turn's final message is complete.
    fn render_done(&mut self);
}

/// Renders streaming output directly to stdout.
///
/// Each token is printed immediately with an explicit flush so the user
/// sees a "typing" effect. The raw text of the current message is buffered
/// so it can be erased when the message is replaced.
pub struct StdoutRenderer {
    buffer: String,
    interactive: bool,
}

impl StdoutRenderer {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            interactive: io::stdout().is_terminal(),
        }
    }

    /// Calculates how many terminal rows the buffered text occupies.
    ///
    /// Accounts for terminal line wrapping by using the actual terminal width.
    pub fn visual_line_count(&self) -> usize {
        let width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80)
            .max(1); // prevent division by zero

        self.buffer
            .split('\n')
            .map(|line| {
                let len = line.chars().count();
                if len == 0 {
                    1
                } else {
                    len.div_ceil(width)
                }
            })
            .sum()
    }

    /// Moves the cursor back to where the current message started and
    /// clears everything below it.
    fn erase(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        if self.interactive {
            let up = self.visual_line_count().saturating_sub(1);
            if up > 0 {
                print!("\x1b[{}A", up);
            }
            print!("\r\x1b[J");
        } else {
            println!();
        }
        self.buffer.clear();
    }

    /// Ends the current line if a message is partially printed.
    fn settle(&mut self) {
        if !self.buffer.is_empty() {
            println!();
            self.buffer.clear();
        }
    }
}

impl Default for StdoutRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for StdoutRenderer {
    fn begin_message(&mut self) {
        self.settle();
    }

    fn render_token(&mut self, token: &str) {
        self.buffer.push_str(token);
        print!("{}", token);
        // Flush immediately so each token appears as it arrives
        io::stdout().flush().ok();
    }

    fn replace_message(&mut self, text: &str) {
        self.erase();
        println!("{}", text.red());
    }

    fn tool_request(&mut self, call: &ToolCallRequest) {
        self.settle();
        println!(
            "{} {}",
            "tool request:".yellow().bold(),
            call.function_name.bold()
        );
    }

    fn tool_result(&mut self, call: &ToolCallRequest, result: &str) {
        println!(
            "{} {}",
            "tool response:".blue().bold(),
            call.function_name.bold()
        );
        println!("{}", result.dimmed());
        println!();
    }

    fn render_done(&mut self) {
        self.settle();
    }
}
