//! Reads the files an embedded cluster leaves behind after bootstrap.

use super::BoxError;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use postgresql_embedded::Settings;

/// Line of `postmaster.pid` that carries the listening port.
const PID_FILE_PORT_LINE: usize = 3;

fn open_ambient_dir(path: &Utf8Path) -> Result<Dir, BoxError> {
    Dir::open_ambient_dir(path, ambient_authority()).map_err(|err| Box::new(err) as BoxError)
}

fn open_parent_dir(path: &Utf8Path) -> Result<(Dir, &str), BoxError> {
    let file_name = path.file_name().ok_or_else(|| {
        Box::new(std::io::Error::other(format!("{path} has no file name"))) as BoxError
    })?;
    let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    Ok((open_ambient_dir(parent)?, file_name))
}

/// Reads a file, treating a missing file as `None`.
fn read_optional(dir: &Dir, name: &str) -> Result<Option<String>, BoxError> {
    match dir.read_to_string(name) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Box::new(err) as BoxError),
    }
}

/// Copies a generated superuser password into `settings`.
pub(super) fn sync_password_from_file(settings: &mut Settings) -> Result<(), BoxError> {
    let password_file = settings.password_file.to_string_lossy().into_owned();
    let (dir, file_name) = open_parent_dir(Utf8Path::new(&password_file))?;
    if let Some(contents) = read_optional(&dir, file_name)? {
        let password = contents.trim_end();
        if !password.is_empty() {
            password.clone_into(&mut settings.password);
        }
    }
    Ok(())
}

/// Picks up the port the postmaster actually bound.
pub(super) fn sync_port_from_pid(settings: &mut Settings) -> Result<(), BoxError> {
    let data_dir = settings.data_dir.to_string_lossy().into_owned();
    let dir = open_ambient_dir(Utf8Path::new(&data_dir))?;
    let Some(contents) = read_optional(&dir, "postmaster.pid")? else {
        return Ok(());
    };
    let port = contents
        .lines()
        .nth(PID_FILE_PORT_LINE)
        .and_then(|line| line.trim().parse::<u16>().ok());
    if let Some(bound) = port {
        settings.port = bound;
    }
    Ok(())
}
