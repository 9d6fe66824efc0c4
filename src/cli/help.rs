//! Help and documentation text

use clap::Arg;

use super::command::{FlagSet, Info};

fn visible_flags(flags: &FlagSet) -> Vec<&Arg> {
    flags
        .get_arguments()
        .filter(|arg| !arg.is_hide_set() && !arg.is_positional())
        .collect()
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn flag_names(arg: &Arg) -> String {
    let mut names = Vec::new();
    if let Some(short) = arg.get_short() {
        names.push(format!("-{}", short));
    }
    if let Some(long) = arg.get_long() {
        names.push(format!("--{}", long));
    }
    names.join(", ")
}

fn flag_default(arg: &Arg) -> Option<String> {
    if !arg.get_action().takes_values() {
        return None;
    }
    let defaults: Vec<String> = arg
        .get_default_values()
        .iter()
        .map(|value| value.to_string_lossy().into_owned())
        .collect();
    if defaults.is_empty() {
        None
    } else {
        Some(defaults.join(","))
    }
}

/// Renders the `--help` text for a command.
///
/// ```text
/// Usage: juju jujutest defenestrate [flags] <something>
///
/// Summary:
/// defenestrate the juju
///
/// Flags:
/// --option (= "")
///     option doc
///
/// Details:
/// defenestrate-doc
///
/// Aliases: defen
/// ```
pub fn render(usage_name: &str, info: &Info, flags: &FlagSet) -> String {
    let known_as = info.flag_known_as();
    let visible = visible_flags(flags);

    let mut out = format!("Usage: {}", usage_name);
    if !visible.is_empty() {
        out.push_str(&format!(" [{}s]", known_as));
    }
    if !info.args.is_empty() {
        out.push(' ');
        out.push_str(&info.args);
    }
    out.push('\n');

    if !info.purpose.is_empty() {
        out.push_str(&format!("\nSummary:\n{}\n", info.purpose));
    }

    if !visible.is_empty() {
        out.push_str(&format!("\n{}s:\n", capitalized(known_as)));
        for arg in &visible {
            out.push_str(&flag_names(arg));
            if let Some(default) = flag_default(arg) {
                out.push_str(&format!(" (= {:?})", default));
            }
            out.push('\n');
            if let Some(help) = arg.get_help() {
                out.push_str(&format!("    {}\n", help));
            }
        }
    }

    if !info.doc.is_empty() {
        out.push_str(&format!("\nDetails:\n{}\n", info.doc));
    }

    if !info.aliases.is_empty() {
        out.push_str(&format!("\nAliases: {}\n", info.aliases.join(", ")));
    }

    out
}

/// Renders a command as a Markdown section for the `documentation` command
pub fn markdown(usage_name: &str, info: &Info, flags: &FlagSet) -> String {
    let known_as = info.flag_known_as();
    let visible = visible_flags(flags);

    let mut out = format!("# {}\n\n", usage_name);
    if !info.purpose.is_empty() {
        out.push_str(&format!("## Summary\n{}\n\n", info.purpose));
    }

    out.push_str("## Usage\n```");
    out.push_str(usage_name);
    if !visible.is_empty() {
        out.push_str(&format!(" [{}s]", known_as));
    }
    if !info.args.is_empty() {
        out.push(' ');
        out.push_str(&info.args);
    }
    out.push_str("```\n\n");

    if !visible.is_empty() {
        out.push_str(&format!("### {}s\n", capitalized(known_as)));
        out.push_str(&format!("| {} | Default | Usage |\n| --- | --- | --- |\n", capitalized(known_as)));
        for arg in &visible {
            let help = arg
                .get_help()
                .map(|h| h.to_string().replace('\n', " "))
                .unwrap_or_default();
            out.push_str(&format!(
                "| `{}` | {} | {} |\n",
                flag_names(arg),
                flag_default(arg).unwrap_or_default(),
                help
            ));
        }
        out.push('\n');
    }

    if !info.aliases.is_empty() {
        out.push_str(&format!("## Aliases\n{}\n\n", info.aliases.join(", ")));
    }

    if !info.doc.is_empty() {
        out.push_str(&format!("## Details\n{}\n\n", info.doc));
    }

    out.push_str("---\n\n");
    out
}
