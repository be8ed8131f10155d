use crate::utils::Result;

/// Builds `<prefix>.<suffix>` and hands it to the writer constructor `f`.
pub fn create_writer<T, F>(output_prefix: &str, output_suffix: &str, f: F) -> Result<T>
where
    F: FnOnce(&str) -> Result<T>,
{
    let output_path = format!("{}.{}", output_prefix, output_suffix);
    log::debug!("Writing {}", output_path);
    f(&output_path).map_err(|e| format!("Cannot create {}: {}", output_path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_prefix_and_suffix() {
        let path = create_writer("sample", "bootstrap.tsv", |path| Ok(path.to_string())).unwrap();
        assert_eq!(path, "sample.bootstrap.tsv");

        let err = create_writer("sample", "tsv", |_| Err::<(), _>("denied".to_string()));
        assert_eq!(err.err().unwrap(), "Cannot create sample.tsv: denied");
    }
}
