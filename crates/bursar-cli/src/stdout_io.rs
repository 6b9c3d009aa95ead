use std::io::{self, Write};

/// Writes a line to stdout, treating a broken pipe (e.g. `bursar ... | head`)
/// as success so piping never turns into an error exit.
pub fn write_stdout_line(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    match stdout.write_all(text.as_bytes()).and_then(|()| {
        stdout.write_all(b"\n")?;
        stdout.flush()
    }) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(error) => Err(error),
    }
}
