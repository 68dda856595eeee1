//! Terminal rendering of tree items.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;

use kntree_core::{ContextType, TreeItem};

use crate::cli::ColorMode;

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// One rendered line: indentation, label, then the dimmed description.
pub fn tree_line(item: &TreeItem, context: Option<ContextType>, depth: usize, color: bool) -> String {
    let indent = "  ".repeat(depth);
    let label = if color {
        match context {
            Some(ContextType::Placeholder) => item.label.dimmed().italic().to_string(),
            Some(ContextType::ServiceModified) => item.label.yellow().bold().to_string(),
            Some(
                ContextType::BrokerFolder
                | ContextType::ChannelFolder
                | ContextType::SubscriptionFolder,
            ) => item.label.bold().to_string(),
            Some(ContextType::Service | ContextType::Subscription) => {
                item.label.cyan().to_string()
            }
            _ => item.label.clone(),
        }
    } else {
        item.label.clone()
    };

    if item.description.is_empty() {
        format!("{indent}{label}")
    } else if color {
        format!("{indent}{label}  {}", item.description.dimmed())
    } else {
        format!("{indent}{label}  {}", item.description)
    }
}

/// Heading printed above each domain when more than one is rendered.
pub fn heading(title: &str, color: bool) -> String {
    if color {
        title.bold().underline().to_string()
    } else {
        title.to_owned()
    }
}

/// Confirmation for a completed mutation.
pub fn done(message: &str, color: bool) -> String {
    if color {
        format!("{} {message}", "✓".green())
    } else {
        message.to_owned()
    }
}

/// Print the rendered output to stdout.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

#[cfg(test)]
mod tests {
    use kntree_core::Collapsible;

    use super::*;

    fn item(label: &str, description: &str) -> TreeItem {
        TreeItem {
            label: label.into(),
            description: description.into(),
            tooltip: None,
            icon: None,
            collapsible: Collapsible::None,
            command: None,
            context_value: None,
        }
    }

    #[test]
    fn plain_line_indents_by_depth() {
        let line = tree_line(
            &item("hello-00001 (100%)", "latest"),
            Some(ContextType::Revision),
            1,
            false,
        );
        assert_eq!(line, "  hello-00001 (100%)  latest");
    }

    #[test]
    fn empty_description_is_omitted() {
        let line = tree_line(&item("Brokers", ""), Some(ContextType::BrokerFolder), 0, false);
        assert_eq!(line, "Brokers");
    }

    #[test]
    fn colored_line_keeps_text() {
        let line = tree_line(&item("hello", "modified"), Some(ContextType::ServiceModified), 0, true);
        assert!(line.contains("hello"));
        assert!(line.contains("modified"));
        assert!(line.contains('\u{1b}'));
    }
}
