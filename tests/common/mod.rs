use std::io::Write;
use tempfile::NamedTempFile;

pub const HEADER: &str = "op, account, counterparty, amount, name, credential";

/// Writes a temporary command file with the standard header plus the given
/// rows.
pub fn command_file(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
}
