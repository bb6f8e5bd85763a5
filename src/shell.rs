//! In-process command host.
//!
//! [`CommandTable`] stands in for the EPICS shell when running without it:
//! it owns registered [`Command`]s, splits a command line the way iocsh
//! does, fills the argument slots from the descriptor's tags and dispatches.

use std::ffi::CString;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{ArgBuf, ArgSlot, ArgType, CallOutcome, Command, Console};

/// Characters that separate words outside quotes.
const SEPARATORS: &[char] = &[' ', '\t', '\r', '\n', '(', ')', ','];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    #[error("command '{name}' not found")]
    UnknownCommand { name: String },

    #[error("argument {index}: illegal integer '{token}'")]
    BadInteger { index: usize, token: String },

    #[error("argument {index}: illegal double '{token}'")]
    BadDouble { index: usize, token: String },

    #[error("argument {index}: string contains a nul byte")]
    InteriorNul { index: usize },

    #[error("unbalanced quote")]
    UnbalancedQuote,
}

/// Registered commands, looked up by name.
#[derive(Debug, Default)]
pub struct CommandTable {
    commands: FxHashMap<String, Command>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `command`, returning any command it replaced.
    pub fn register(&mut self, command: Command) -> Option<Command> {
        let name = command.name().to_owned();
        let previous = self.commands.insert(name.clone(), command);
        if previous.is_some() {
            tracing::debug!(target: "iocsh_wrap", command = %name, "replaced registered command");
        } else {
            tracing::debug!(target: "iocsh_wrap", command = %name, "registered command");
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Call `name` with already-typed slots.
    pub fn call(
        &self,
        name: &str,
        slots: &[ArgSlot<'_>],
        console: &mut dyn Console,
    ) -> Result<CallOutcome, ShellError> {
        let command = self.lookup(name)?;
        Ok(command.call(&ArgBuf::new(slots), console))
    }

    /// Parse and run one command line.
    ///
    /// Blank lines and comments yield `Ok(None)`. Arguments missing from
    /// the line are passed as `0`, `0.0` or a null string; surplus words
    /// are ignored.
    pub fn execute(&self, line: &str, console: &mut dyn Console) -> Result<Option<CallOutcome>, ShellError> {
        let words = tokenize(line)?;
        let Some((name, words)) = words.split_first() else {
            return Ok(None);
        };
        let command = self.lookup(name)?;
        if words.len() > command.descriptor().arity() {
            tracing::debug!(
                target: "iocsh_wrap",
                command = %name,
                surplus = words.len() - command.descriptor().arity(),
                "ignoring surplus words"
            );
        }

        let values = command
            .descriptor()
            .arg_types()
            .enumerate()
            .map(|(index, arg_type)| parse_value(index, arg_type, words.get(index).map(String::as_str)))
            .collect::<Result<Vec<_>, _>>()?;
        let slots: Vec<ArgSlot<'_>> = values.iter().map(ParsedValue::slot).collect();
        Ok(Some(command.call(&ArgBuf::new(&slots), console)))
    }

    fn lookup(&self, name: &str) -> Result<&Command, ShellError> {
        self.commands.get(name).ok_or_else(|| ShellError::UnknownCommand { name: name.to_owned() })
    }
}

enum ParsedValue {
    Int(i32),
    Double(f64),
    String(Option<CString>),
}

impl ParsedValue {
    fn slot(&self) -> ArgSlot<'_> {
        match self {
            ParsedValue::Int(value) => ArgSlot::Int(*value),
            ParsedValue::Double(value) => ArgSlot::Double(*value),
            ParsedValue::String(value) => ArgSlot::String(value.as_deref()),
        }
    }
}

fn parse_value(index: usize, arg_type: ArgType, word: Option<&str>) -> Result<ParsedValue, ShellError> {
    let Some(word) = word else {
        return Ok(match arg_type {
            ArgType::Int => ParsedValue::Int(0),
            ArgType::Double => ParsedValue::Double(0.0),
            ArgType::String => ParsedValue::String(None),
        });
    };
    match arg_type {
        ArgType::Int => parse_int(word).map(ParsedValue::Int).ok_or_else(|| ShellError::BadInteger {
            index,
            token: word.to_owned(),
        }),
        ArgType::Double => word
            .trim()
            .parse()
            .map(ParsedValue::Double)
            .map_err(|_| ShellError::BadDouble {
                index,
                token: word.to_owned(),
            }),
        ArgType::String => CString::new(word)
            .map(|s| ParsedValue::String(Some(s)))
            .map_err(|_| ShellError::InteriorNul { index }),
    }
}

/// Integer with C base prefixes (`0x` hex, leading `0` octal).
///
/// Values outside `i32` keep their low 32 bits, so `0xffffffff` is `-1`.
pub fn parse_int(word: &str) -> Option<i32> {
    let word = word.trim();
    let (negative, digits) = match word.as_bytes().first()? {
        b'-' => (true, &word[1..]),
        b'+' => (false, &word[1..]),
        _ => (false, word),
    };
    let (radix, digits) = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    let value = if negative { magnitude.wrapping_neg() } else { magnitude };
    Some(value as i32)
}

/// Split a command line into words.
///
/// Words are separated by whitespace, commas and parentheses. Single or
/// double quotes group a word, a backslash escapes the next character, and
/// `#` at the start of a word ends the line.
pub fn tokenize(line: &str) -> Result<Vec<String>, ShellError> {
    let mut words = Vec::new();
    let mut current: Option<String> = None;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            let escaped = chars.next().unwrap_or('\\');
            current.get_or_insert_with(String::new).push(escaped);
            continue;
        }
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => current.get_or_insert_with(String::new).push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                current.get_or_insert_with(String::new);
            }
            None if SEPARATORS.contains(&c) => {
                if let Some(word) = current.take() {
                    words.push(word);
                }
            }
            None if c == '#' && current.is_none() => break,
            None => current.get_or_insert_with(String::new).push(c),
        }
    }

    if quote.is_some() {
        return Err(ShellError::UnbalancedQuote);
    }
    words.extend(current);
    Ok(words)
}
