//! Command palette entries and their autocomplete ranking.

/// What a palette command does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  /// Reset the view stack to the task list
  Tasks,
  /// Open the create form
  New,
  /// Refetch every loaded page
  Refresh,
  Quit,
}

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub action: Action,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "tasks",
    action: Action::Tasks,
    aliases: &["t", "task", "list"],
    description: "Back to the task list",
  },
  Command {
    name: "new",
    action: Action::New,
    aliases: &["n", "add", "create"],
    description: "Create a task",
  },
  Command {
    name: "refresh",
    action: Action::Refresh,
    aliases: &["r", "reload"],
    description: "Reload loaded pages",
  },
  Command {
    name: "quit",
    action: Action::Quit,
    aliases: &["q", "exit"],
    description: "Exit taskdeck",
  },
];

impl Command {
  fn any_alias(&self, f: impl Fn(&str) -> bool) -> bool {
    self.aliases.iter().any(|a| f(a))
  }

  /// Match quality against lowercased input, lower is better
  fn rank(&self, input: &str) -> Option<u8> {
    if self.name == input {
      Some(0)
    } else if self.any_alias(|a| a == input) {
      Some(1)
    } else if self.name.starts_with(input) {
      Some(2)
    } else if self.any_alias(|a| a.starts_with(input)) {
      Some(3)
    } else if self.name.contains(input) {
      Some(4)
    } else if self.any_alias(|a| a.contains(input)) {
      Some(5)
    } else {
      None
    }
  }
}

/// Palette suggestions for `input`, best match first
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input = input.to_lowercase();
  if input.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut ranked: Vec<_> = COMMANDS
    .iter()
    .filter_map(|cmd| cmd.rank(&input).map(|rank| (rank, cmd)))
    .collect();
  // Stable, so ties keep declaration order
  ranked.sort_by_key(|(rank, _)| *rank);
  ranked.into_iter().map(|(_, cmd)| cmd).collect()
}
