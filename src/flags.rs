//! Command flags: a closed set of flag kinds and the parsed per-command flag context.
//!
//! Commands declare their flags as [`FlagSpec`] values. The CLI layer turns each spec into a
//! clap argument and, after parsing, collects the supplied values into a [`FlagContext`].
//! Every conversion matches exhaustively on [`FlagKind`].

use crate::error::ValidationError;
use clap::{Arg, ArgAction, ArgMatches};
use std::collections::BTreeMap;

/// The kinds of flag a command may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    String,
    Int,
    Bool,
    StringList,
}

/// A flag declared by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub kind: FlagKind,
}

impl FlagSpec {
    pub const fn string(name: &'static str, usage: &'static str) -> Self {
        Self {
            name,
            usage,
            kind: FlagKind::String,
        }
    }

    pub const fn int(name: &'static str, usage: &'static str) -> Self {
        Self {
            name,
            usage,
            kind: FlagKind::Int,
        }
    }

    pub const fn bool(name: &'static str, usage: &'static str) -> Self {
        Self {
            name,
            usage,
            kind: FlagKind::Bool,
        }
    }

    pub const fn string_list(name: &'static str, usage: &'static str) -> Self {
        Self {
            name,
            usage,
            kind: FlagKind::StringList,
        }
    }

    /// Build the clap argument for this flag.
    pub fn to_arg(&self) -> Arg {
        let arg = Arg::new(self.name).long(self.name).help(self.usage);
        match self.kind {
            FlagKind::String => arg.value_name("STRING").action(ArgAction::Set),
            FlagKind::Int => arg
                .value_name("INT")
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(i64)),
            FlagKind::Bool => arg.action(ArgAction::SetTrue),
            FlagKind::StringList => arg
                .value_name("VALUE[,VALUE...]")
                .action(ArgAction::Append)
                .value_delimiter(','),
        }
    }
}

/// A supplied flag value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    String(String),
    Int(i64),
    Bool(bool),
    StringList(Vec<String>),
}

impl FlagValue {
    /// Render the value as it would appear on a command line.
    pub fn display(&self) -> String {
        match self {
            FlagValue::String(s) => s.clone(),
            FlagValue::Int(i) => i.to_string(),
            FlagValue::Bool(b) => b.to_string(),
            FlagValue::StringList(items) => items.join(","),
        }
    }
}

/// The flags supplied for one command invocation, keyed by flag name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagContext {
    values: BTreeMap<String, FlagValue>,
}

impl FlagContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the declared flags that were actually supplied in `matches`.
    pub fn from_matches(specs: &[FlagSpec], matches: &ArgMatches) -> Self {
        let mut ctx = Self::new();
        for spec in specs {
            let value = match spec.kind {
                FlagKind::String => matches
                    .get_one::<String>(spec.name)
                    .map(|s| FlagValue::String(s.clone())),
                FlagKind::Int => matches.get_one::<i64>(spec.name).map(|i| FlagValue::Int(*i)),
                FlagKind::Bool => matches
                    .get_flag(spec.name)
                    .then_some(FlagValue::Bool(true)),
                FlagKind::StringList => matches
                    .get_many::<String>(spec.name)
                    .map(|vals| FlagValue::StringList(vals.cloned().collect())),
            };
            if let Some(value) = value {
                ctx.values.insert(spec.name.to_string(), value);
            }
        }
        ctx
    }

    pub fn with(mut self, name: &str, value: FlagValue) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FlagValue> {
        self.values.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(FlagValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(FlagValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(FlagValue::Bool(true)))
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        match self.values.get(name) {
            Some(FlagValue::StringList(items)) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Required string flag; the validator normally catches its absence first.
    pub fn require_string(&self, name: &str) -> Result<&str, ValidationError> {
        self.string(name)
            .ok_or_else(|| ValidationError::MissingFlags(vec![name.to_string()]))
    }
}
