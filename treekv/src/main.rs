#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code to prevent panics from corrupt data.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::io::{BufRead, Write};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use treekv::{Command, CommandError, Outcome, Store, StoreConfig};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "treekv=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration from environment variables
    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::debug!(
        "index file: {}, data file: {}",
        config.index_path().display(),
        config.heap_path().display()
    );

    let mut store = match Store::open(&config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open store: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&mut store, std::io::stdin().lock(), std::io::stdout().lock()) {
        tracing::error!("I/O error on console: {e}");
        std::process::exit(1);
    }
}

/// Read commands until `exit`, `quit` or end of input.
fn run(store: &mut Store, input: impl BufRead, mut output: impl Write) -> std::io::Result<()> {
    writeln!(output, "Welcome to the treekv REPL")?;
    let mut lines = input.lines();

    loop {
        write!(output, "db>")?;
        output.flush()?;

        let Some(line) = lines.next().transpose()? else {
            writeln!(output)?;
            return Ok(());
        };

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(e) => {
                writeln!(output, "Invalid command: {e}")?;
                continue;
            }
        };

        match command.execute(store) {
            Ok(Outcome::Exit) => return Ok(()),
            Ok(Outcome::Stored) => {}
            Ok(outcome) => writeln!(output, "{outcome}")?,
            Err(e) => {
                tracing::warn!("command failed: {e}");
                writeln!(output, "error: {e}")?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(input: &str) -> String {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut store = Store::open_in(dir.path()).expect("open store");
        let mut output = Vec::new();
        run(&mut store, input.as_bytes(), &mut output).expect("run");
        String::from_utf8(output).expect("utf-8 output")
    }

    #[test]
    fn test_session_transcript() {
        let output = session("put 5 a\nput 3 b\nget 3\nget *\nget 9\nexit\nget 5\n");
        assert_eq!(
            output,
            "Welcome to the treekv REPL\n\
             db>db>db>b\n\
             db>[(3, 'b'), (5, 'a')]\n\
             db>None\n\
             db>"
        );
    }

    #[test]
    fn test_invalid_commands_continue() {
        let output = session("hello\nput 1\n\nget 1\n");
        assert!(output.contains("Invalid command: unknown command 'hello'"));
        assert!(output.contains("Invalid command: missing value"));
        assert!(output.ends_with("db>None\ndb>\n"));
    }

    #[test]
    fn test_storage_errors_are_reported() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut store = Store::open_in(dir.path()).expect("open store");
        store.put(1, "hello").expect("put");
        drop(store);
        std::fs::write(dir.path().join("data.txt"), b"").expect("truncate heap");

        let mut store = Store::open_in(dir.path()).expect("open store");
        let mut output = Vec::new();
        run(&mut store, "get 1\nquit\n".as_bytes(), &mut output).expect("run");
        let output = String::from_utf8(output).expect("utf-8 output");
        assert!(output.contains("error: decode error"));
    }
}
