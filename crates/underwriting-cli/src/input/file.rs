use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Input file encodings, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Format::Yaml
            }
            _ => Format::Json,
        }
    }
}

/// Read a JSON or YAML file and deserialise into a typed struct.
pub fn read_input<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;

    let value = match Format::from_path(&canonical) {
        Format::Json => serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?,
        Format::Yaml => serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?,
    };
    Ok(value)
}

fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.is_file() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use underwriting_core::real_assets::loan_sizing::LoanSizingInput;

    const LOAN_YAML: &str = "\
max_ltv: \"0.70\"
min_dscr: \"1.25\"
amortization: 30
term: 10
io_period: 2
rate: \"0.045\"
property_value: \"6500000\"
noi: \"387500\"
requested_loan_amount: \"5000000\"
loan_origination_fees: \"0.01\"
";

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("uw-{}-{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("deal.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("deal.YML")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("deal.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("deal")), Format::Json);
    }

    #[test]
    fn test_read_yaml_loan() {
        let path = write_temp("loan.yaml", LOAN_YAML);
        let input: LoanSizingInput = read_input(path.to_str().unwrap()).unwrap();
        assert_eq!(input.max_ltv, dec!(0.70));
        assert_eq!(input.io_period, 2);
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file() {
        let err = read_input::<LoanSizingInput>("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
