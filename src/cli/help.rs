//! CLI help layout and command-path helpers.

use clap::ArgMatches;

/// Help layout shared by every leaf command.
pub const LEAF_HELP_TEMPLATE: &str = "\
NAME:
    {name} - {about}

USAGE:
    {usage}

DESCRIPTION:
    {about}

OPTIONS:
{options}
";

/// Walk to the deepest selected subcommand: its path from the root and its matches.
pub fn leaf_matches(matches: &ArgMatches) -> (Vec<&str>, &ArgMatches) {
    let mut path = Vec::new();
    let mut current = matches;
    while let Some((name, sub)) = current.subcommand() {
        path.push(name);
        current = sub;
    }
    (path, current)
}

/// Dotted command name for logs (e.g. "files.container.get").
pub fn command_name(matches: &ArgMatches) -> String {
    leaf_matches(matches).0.join(".")
}
