//! Purpose: Hold top-level CLI command dispatch for `cypherset`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Only the cells a command prints are materialized.
//! Invariants: Library errors pass through unchanged so exit codes keep their kind.

use super::*;

pub(super) fn dispatch_command(
    command: Command,
    input: Option<PathBuf>,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "cypherset", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Columns => {
            let result = load_result(input.as_deref())?;
            emit_json(&json!(result.columns()))?;
            Ok(RunOutcome::ok())
        }
        Command::Count => {
            let result = load_result(input.as_deref())?;
            emit_json(&json!({ "count": result.len() }))?;
            Ok(RunOutcome::ok())
        }
        Command::Row { index, column } => {
            let result = load_result(input.as_deref())?;
            let row = result.get(index)?;
            let value = match column.as_deref() {
                Some(column) => row.get(column_key(column))?.to_json()?,
                None => row.to_json()?,
            };
            emit_json(&value)?;
            Ok(RunOutcome::ok())
        }
        Command::Rows { format } => {
            let result = load_result(input.as_deref())?;
            match format {
                RowsFormat::Json => emit_json(&result.to_json()?)?,
                RowsFormat::Jsonl => {
                    for row in &result {
                        let line = serde_json::to_string(&row.to_json()?).map_err(|err| {
                            Error::new(ErrorKind::Internal)
                                .with_message("json encode failed")
                                .with_source(err)
                        })?;
                        emit_line(&line)?;
                    }
                }
            }
            Ok(RunOutcome::ok())
        }
    }
}
