pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;
use tracing::debug;

/// Typed input from `--input`, else piped stdin; `None` when neither is given.
pub fn load<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        debug!(path, "reading input file");
        return Ok(Some(file::read_input(path)?));
    }
    match stdin::read_stdin()? {
        Some(data) => {
            debug!("using piped stdin input");
            Ok(Some(serde_json::from_value(data)?))
        }
        None => Ok(None),
    }
}
