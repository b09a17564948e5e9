//! Line-oriented command surface.
//!
//! ```text
//! get <key>            print the value, or None
//! get *                print every pair in ascending key order
//! put <key> <value>    insert or overwrite (value is a single token)
//! exit | quit          stop
//! ```

use crate::storage::{Key, Store, StoreError};

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get(Key),
    GetAll,
    Put(Key, String),
    Exit,
}

/// Why a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Blank line.
    Empty,
    /// Unrecognized command word.
    Unknown(String),
    /// Key is not a non-negative integer.
    InvalidKey(String),
    /// A required argument is missing.
    MissingArgument(&'static str),
    /// More arguments than the command takes.
    UnexpectedArgument(String),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::Unknown(word) => write!(f, "unknown command '{word}'"),
            Self::InvalidKey(key) => write!(f, "'{key}' is not a non-negative integer key"),
            Self::MissingArgument(name) => write!(f, "missing {name}"),
            Self::UnexpectedArgument(arg) => write!(f, "unexpected argument '{arg}'"),
        }
    }
}

impl std::error::Error for CommandError {}

/// Result of running a command against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Value(Option<String>),
    Entries(Vec<(Key, String)>),
    Stored,
    Exit,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(Some(value)) => write!(f, "{value}"),
            Self::Value(None) => write!(f, "None"),
            Self::Entries(entries) => {
                write!(f, "[")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "({key}, '{value}')")?;
                }
                write!(f, "]")
            }
            Self::Stored | Self::Exit => Ok(()),
        }
    }
}

impl Command {
    /// Parse one input line.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or(CommandError::Empty)?;

        let parsed = match command {
            "exit" | "quit" => Self::Exit,
            "get" => match words.next().ok_or(CommandError::MissingArgument("key"))? {
                "*" => Self::GetAll,
                key => Self::Get(parse_key(key)?),
            },
            "put" => {
                let key = parse_key(words.next().ok_or(CommandError::MissingArgument("key"))?)?;
                let value = words.next().ok_or(CommandError::MissingArgument("value"))?;
                Self::Put(key, value.to_string())
            }
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        if let Some(extra) = words.next() {
            return Err(CommandError::UnexpectedArgument(extra.to_string()));
        }
        Ok(parsed)
    }

    /// Run the command against `store`.
    pub fn execute(self, store: &mut Store) -> Result<Outcome, StoreError> {
        match self {
            Self::Get(key) => store.get(key).map(Outcome::Value),
            Self::GetAll => store.get_all().map(Outcome::Entries),
            Self::Put(key, value) => store.put(key, &value).map(|()| Outcome::Stored),
            Self::Exit => Ok(Outcome::Exit),
        }
    }
}

fn parse_key(word: &str) -> Result<Key, CommandError> {
    word.parse::<Key>()
        .map_err(|_| CommandError::InvalidKey(word.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::new_test_store;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("get 5"), Ok(Command::Get(5)));
        assert_eq!(Command::parse("  get   *  "), Ok(Command::GetAll));
        assert_eq!(
            Command::parse("put 3 hello"),
            Ok(Command::Put(3, "hello".to_string()))
        );
        assert_eq!(Command::parse("exit"), Ok(Command::Exit));
        assert_eq!(Command::parse("quit"), Ok(Command::Exit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse(""), Err(CommandError::Empty));
        assert_eq!(
            Command::parse("delete 5"),
            Err(CommandError::Unknown("delete".to_string()))
        );
        assert_eq!(
            Command::parse("get -1"),
            Err(CommandError::InvalidKey("-1".to_string()))
        );
        assert_eq!(
            Command::parse("get"),
            Err(CommandError::MissingArgument("key"))
        );
        assert_eq!(
            Command::parse("put 5"),
            Err(CommandError::MissingArgument("value"))
        );
        assert_eq!(
            Command::parse("put 5 two words"),
            Err(CommandError::UnexpectedArgument("words".to_string()))
        );
    }

    #[test]
    fn test_execute_session() {
        let (_dir, mut store) = new_test_store();

        for line in ["put 5 a", "put 3 b", "put 8 c", "put 3 z"] {
            let outcome = Command::parse(line)
                .expect("parse")
                .execute(&mut store)
                .expect("execute");
            assert_eq!(outcome, Outcome::Stored);
        }

        let all = Command::GetAll.execute(&mut store).expect("get all");
        assert_eq!(all.to_string(), "[(3, 'z'), (5, 'a'), (8, 'c')]");

        let hit = Command::Get(3).execute(&mut store).expect("get");
        assert_eq!(hit.to_string(), "z");

        let miss = Command::Get(9).execute(&mut store).expect("get");
        assert_eq!(miss, Outcome::Value(None));
        assert_eq!(miss.to_string(), "None");
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let (_dir, mut store) = new_test_store();
        let all = Command::GetAll.execute(&mut store).expect("get all");
        assert_eq!(all.to_string(), "[]");
    }
}
