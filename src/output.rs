use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;

pub fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let bytes = std::fs::read(path).with_context(|| format!("read: {path}"))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse json: {path}"))
}

/// Writes `contents` to `path`, refusing to replace an existing file unless
/// `force` is set.
pub fn write_output(path: &str, contents: &str, force: bool) -> anyhow::Result<()> {
    if Path::new(path).exists() && !force {
        anyhow::bail!("output already exists: {path}");
    }
    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir: {}", parent.display()))?;
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("open output: {path}"))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("write output: {path}"))?;
    file.flush()
        .with_context(|| format!("flush output: {path}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_output_respects_force() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nested").join("out.json");
        let path = path.to_str().unwrap();

        write_output(path, "[]", false).unwrap();
        let err = write_output(path, "[1]", false).unwrap_err().to_string();
        assert!(err.contains("output already exists"));

        write_output(path, "[2]", true).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "[2]");
    }
}
