//! Patient dispatcher built on [`RbTree`].
//!
//! Waiting patients are ordered by severity, highest first, with earlier
//! arrivals ahead of later ones at equal severity. A name index maps each
//! waiting patient to the ticket stored in the tree so that re-triage and
//! discharge can delete that exact ticket.
//!
//! # Script format
//!
//! Whitespace-separated tokens: an operation count followed by that many
//! operations.
//!
//! - `0 NAME SEVERITY` admits a patient
//! - `1 NAME DELTA` adds `DELTA` to a waiting patient's severity
//! - `2 NAME` discharges a waiting patient
//! - `3` reports the next patient, or `The clinic is empty`

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::rbtree::RbTree;

/// Reply to a query on an empty clinic.
pub const EMPTY_CLINIC: &str = "The clinic is empty";

/// A waiting patient's position in the queue.
///
/// `arrival` is unique per admission, so two tickets are equal only if they
/// are the same admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub severity: i64,
    pub arrival: usize,
}

type TicketOrder = fn(&Ticket, &Ticket) -> Ordering;

/// Higher severity first, then earlier arrival.
#[must_use]
pub fn triage_order(a: &Ticket, b: &Ticket) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| a.arrival.cmp(&b.arrival))
}

/// One dispatcher operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Admit { name: String, severity: i64 },
    Retriage { name: String, delta: i64 },
    Discharge { name: String },
    Next,
}

/// Priority queue of waiting patients addressable by name.
pub struct Dispatcher {
    queue: RbTree<Ticket, TicketOrder>,
    waiting: HashMap<String, Ticket>,
    // Name of every admission, indexed by arrival.
    names: Vec<String>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: RbTree::new(triage_order as TicketOrder),
            waiting: HashMap::new(),
            names: Vec::new(),
        }
    }

    /// Number of waiting patients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    /// The ticket of a waiting patient.
    #[must_use]
    pub fn ticket(&self, name: &str) -> Option<Ticket> {
        self.waiting.get(name).copied()
    }

    /// Admit `name` with `severity`.
    ///
    /// A patient already waiting under the same name is replaced, taking a
    /// fresh arrival number.
    pub fn admit(&mut self, name: &str, severity: i64) {
        if let Some(previous) = self.waiting.remove(name) {
            self.queue.delete(&previous);
            tracing::debug!(name, "replacing waiting patient");
        }

        let ticket = Ticket {
            severity,
            arrival: self.names.len(),
        };
        self.names.push(name.to_string());
        self.waiting.insert(name.to_string(), ticket);
        self.queue.insert(ticket);
    }

    /// Raise (or lower) a waiting patient's severity by `delta`.
    ///
    /// The patient keeps their arrival number. Returns `false` if `name` is
    /// not waiting.
    pub fn retriage(&mut self, name: &str, delta: i64) -> bool {
        let Some(ticket) = self.waiting.get_mut(name) else {
            return false;
        };
        self.queue.delete(ticket);
        ticket.severity = ticket.severity.saturating_add(delta);
        self.queue.insert(*ticket);
        true
    }

    /// Remove a waiting patient. Returns `false` if `name` is not waiting.
    pub fn discharge(&mut self, name: &str) -> bool {
        let Some(ticket) = self.waiting.remove(name) else {
            return false;
        };
        self.queue.delete(&ticket);
        true
    }

    /// Name of the patient to be seen next.
    #[must_use]
    pub fn next(&self) -> Option<&str> {
        let ticket = self.queue.min()?;
        self.names.get(ticket.arrival).map(String::as_str)
    }

    /// Apply one command, returning the line it prints, if any.
    pub fn apply(&mut self, command: &Command) -> Option<String> {
        match command {
            Command::Admit { name, severity } => {
                self.admit(name, *severity);
                None
            }
            Command::Retriage { name, delta } => {
                if !self.retriage(name, *delta) {
                    tracing::debug!(name = name.as_str(), "retriage of unknown patient ignored");
                }
                None
            }
            Command::Discharge { name } => {
                if !self.discharge(name) {
                    tracing::debug!(name = name.as_str(), "discharge of unknown patient ignored");
                }
                None
            }
            Command::Next => Some(self.next().unwrap_or(EMPTY_CLINIC).to_string()),
        }
    }
}

/// Error returned when a script cannot be parsed.
///
/// `op` is the 1-based index of the operation being read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// The input has no operation count.
    MissingCount,
    /// The operation count is not a non-negative integer.
    InvalidCount(String),
    /// The input ended inside or before an operation.
    UnexpectedEnd { op: usize },
    /// The command code is not 0, 1, 2 or 3.
    UnknownCommand { op: usize, token: String },
    /// A severity or delta is not an integer.
    InvalidNumber { op: usize, token: String },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCount => write!(f, "script is empty, expected an operation count"),
            Self::InvalidCount(token) => write!(f, "invalid operation count '{token}'"),
            Self::UnexpectedEnd { op } => write!(f, "operation {op}: unexpected end of input"),
            Self::UnknownCommand { op, token } => {
                write!(f, "operation {op}: unknown command '{token}'")
            }
            Self::InvalidNumber { op, token } => {
                write!(f, "operation {op}: '{token}' is not an integer")
            }
        }
    }
}

impl std::error::Error for ScriptError {}

/// Parse a whole script.
pub fn parse_script(input: &str) -> Result<Vec<Command>, ScriptError> {
    let mut tokens = input.split_whitespace();
    let count_token = tokens.next().ok_or(ScriptError::MissingCount)?;
    let count: usize = count_token
        .parse()
        .map_err(|_| ScriptError::InvalidCount(count_token.to_string()))?;

    let mut commands = Vec::new();
    for op in 1..=count {
        let mut next = || tokens.next().ok_or(ScriptError::UnexpectedEnd { op });
        let number = |token: &str| {
            token.parse::<i64>().map_err(|_| ScriptError::InvalidNumber {
                op,
                token: token.to_string(),
            })
        };

        let command = match next()? {
            "0" => Command::Admit {
                name: next()?.to_string(),
                severity: number(next()?)?,
            },
            "1" => Command::Retriage {
                name: next()?.to_string(),
                delta: number(next()?)?,
            },
            "2" => Command::Discharge {
                name: next()?.to_string(),
            },
            "3" => Command::Next,
            other => {
                return Err(ScriptError::UnknownCommand {
                    op,
                    token: other.to_string(),
                });
            }
        };
        commands.push(command);
    }
    Ok(commands)
}

/// Run a script against a fresh dispatcher and collect the printed lines.
///
/// The whole script is parsed before any command runs, so a malformed script
/// produces no output.
pub fn run_script(input: &str) -> Result<Vec<String>, ScriptError> {
    let commands = parse_script(input)?;
    tracing::debug!(operations = commands.len(), "running dispatcher script");

    let mut dispatcher = Dispatcher::new();
    Ok(commands
        .iter()
        .filter_map(|command| dispatcher.apply(command))
        .collect())
}
