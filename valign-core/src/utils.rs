use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::errors::Result;
use flate2::read::MultiGzDecoder;

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path)?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

/// Strip a trailing `.gz` (if any) and return the remaining extension in
/// lowercase. Used for file-kind detection on paths like `cohort.pvar.gz`.
pub fn effective_extension(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let name = name.strip_suffix(".gz").unwrap_or(name);
    let ext = Path::new(name).extension()?.to_str()?;
    Some(ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("cohort.pvar", Some("pvar"))]
    #[case("cohort.pvar.gz", Some("pvar"))]
    #[case("stats.SSF", Some("ssf"))]
    #[case("plain", None)]
    fn test_effective_extension(#[case] name: &str, #[case] expected: Option<&str>) {
        let got = effective_extension(Path::new(name));
        assert_eq!(got.as_deref(), expected);
    }
}
