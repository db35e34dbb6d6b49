use std::io::Write;

use serde_json::Value;

use crate::error::CliError;

pub fn render(body: &Value, pretty: bool) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    write_json(&mut stdout, body, pretty)
}

fn write_json(writer: &mut impl Write, body: &Value, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, body)?;
    } else {
        serde_json::to_writer(&mut *writer, body)?;
    }
    writeln!(writer)?;
    Ok(())
}
