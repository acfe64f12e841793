use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;

use crate::lsp::protocol::InboundMessage;

/// Writes the exerciser's progress lines to stdout.
///
/// Labels are colored only when stdout is a color-capable terminal, so piped
/// output (and the integration tests) see plain text.
#[derive(Clone, Copy, Debug)]
pub struct Printer {
    color: bool,
}

impl Printer {
    pub fn detect() -> Self {
        Self { color: supports_color::on(supports_color::Stream::Stdout).is_some() }
    }

    #[cfg(test)]
    pub fn plain() -> Self {
        Self { color: false }
    }

    fn label(&self, label: &str) -> String {
        if self.color {
            label.green().bold().to_string()
        } else {
            label.to_string()
        }
    }

    pub fn format_result(&self, label: &str, value: &Value) -> String {
        format!("{} {value}", self.label(label))
    }

    pub fn format_serialized<T: Serialize>(&self, label: &str, value: &T) -> String {
        let body = serde_json::to_string(value).unwrap_or_else(|e| format!("<unprintable: {e}>"));
        format!("{} {body}", self.label(label))
    }

    pub fn format_inbound(&self, message: &InboundMessage) -> String {
        let kind = if message.is_notification() { "notification" } else { "request" };
        let label = if self.color {
            format!("inbound {kind}:").cyan().bold().to_string()
        } else {
            format!("inbound {kind}:")
        };
        format!("{label} {}", message.raw)
    }

    pub fn result(&self, label: &str, value: &Value) {
        println!("{}", self.format_result(label, value));
    }

    pub fn serialized<T: Serialize>(&self, label: &str, value: &T) {
        println!("{}", self.format_serialized(label, value));
    }

    pub fn inbound(&self, message: &InboundMessage) {
        println!("{}", self.format_inbound(message));
    }

    pub fn status(&self, text: &str) {
        if self.color {
            println!("{}", text.dimmed());
        } else {
            println!("{text}");
        }
    }
}
