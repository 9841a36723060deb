//! Environment handling for the test cluster.

use super::BoxError;
use pg_embedded_setup_unpriv::{ExecutionPrivileges, detect_execution_privileges};
use std::ffi::OsString;
use std::net::TcpListener;

/// Server URL that replaces the embedded cluster when set.
pub(super) const DATABASE_URL_VAR: &str = "TASKDESK_TEST_DATABASE_URL";

const WORKER_VAR: &str = "PG_EMBEDDED_WORKER";
const WORKER_BINARY: &str = "pg_worker";

/// Returns the external server URL, if one is configured.
pub(super) fn external_server_url() -> Option<String> {
    std::env::var(DATABASE_URL_VAR)
        .ok()
        .filter(|url| !url.trim().is_empty())
}

/// Rewrites the database segment of a libpq URL, keeping any query string.
pub(super) fn with_database(url: &str, database: &str) -> String {
    let (base, query) = url
        .split_once('?')
        .map_or((url, None), |(head, tail)| (head, Some(tail)));
    let (scheme, rest) = base.split_once("://").unwrap_or(("postgres", base));
    let authority = rest.split_once('/').map_or(rest, |(host, _)| host);
    match query {
        Some(params) => format!("{scheme}://{authority}/{database}?{params}"),
        None => format!("{scheme}://{authority}/{database}"),
    }
}

pub(super) fn env_vars_to_os(
    env_vars: &[(String, Option<String>)],
) -> Vec<(OsString, Option<OsString>)> {
    env_vars
        .iter()
        .map(|(key, value)| (OsString::from(key), value.as_ref().map(OsString::from)))
        .collect()
}

/// Variables the bootstrap needs: a free port and, as root, a worker binary.
pub(super) fn worker_env_changes() -> Result<Vec<(OsString, Option<OsString>)>, BoxError> {
    let mut changes = Vec::new();
    if let Some(port) = resolve_pg_port()? {
        changes.push((OsString::from("PG_PORT"), Some(port)));
    }

    if matches!(detect_execution_privileges(), ExecutionPrivileges::Root)
        && std::env::var_os(WORKER_VAR).is_none()
    {
        let worker = locate_pg_worker().ok_or_else(|| {
            Box::new(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!(
                    "running as root needs {WORKER_VAR} or a {WORKER_BINARY} binary on PATH; \
                     alternatively set {DATABASE_URL_VAR}"
                ),
            )) as BoxError
        })?;
        changes.push((OsString::from(WORKER_VAR), Some(worker)));
    }
    Ok(changes)
}

fn resolve_pg_port() -> Result<Option<OsString>, BoxError> {
    if std::env::var_os("PG_PORT").is_some() {
        return Ok(None);
    }
    let listener = TcpListener::bind(("127.0.0.1", 0)).map_err(|err| Box::new(err) as BoxError)?;
    let port = listener
        .local_addr()
        .map(|addr| addr.port())
        .map_err(|err| Box::new(err) as BoxError)?;
    drop(listener);
    Ok(Some(OsString::from(port.to_string())))
}

fn locate_pg_worker() -> Option<OsString> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(WORKER_BINARY))
        .find(|candidate| candidate.is_file())
        .map(std::path::PathBuf::into_os_string)
}

#[cfg(test)]
mod tests {
    use super::with_database;
    use rstest::rstest;

    #[rstest]
    #[case("postgres://ada:pw@db:5432/postgres", "postgres://ada:pw@db:5432/scratch")]
    #[case("postgres://db:5432", "postgres://db:5432/scratch")]
    #[case(
        "postgresql://db/postgres?sslmode=disable",
        "postgresql://db/scratch?sslmode=disable"
    )]
    fn database_segment_is_replaced(#[case] server: &str, #[case] expected: &str) {
        assert_eq!(with_database(server, "scratch"), expected);
    }
}
