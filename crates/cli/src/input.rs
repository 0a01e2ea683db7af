//! Assembling raw parameters from defaults, a file, and `--set` overrides.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use heatopt_furnace::{InvalidParameterError, RawParameters};

/// Parses a `NAME=VALUE` override.
pub fn parse_override(arg: &str) -> Result<(String, String), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{arg}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in `{arg}`"));
    }
    Ok((name.to_owned(), value.to_owned()))
}

/// Reads a parameter file as a map from parameter name to value.
///
/// Files ending in `.json` are read as JSON; anything else as TOML. A file
/// may set any subset of the parameters.
pub fn read_file(path: &Path) -> Result<BTreeMap<String, f64>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read parameter file {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {} as JSON", path.display()))
    } else {
        toml::from_str(&text).with_context(|| format!("failed to parse {} as TOML", path.display()))
    }
}

/// Builds raw parameters: defaults, then `file`, then `overrides`.
pub fn resolve(file: Option<&Path>, overrides: &[(String, String)]) -> Result<RawParameters> {
    let mut raw = RawParameters::default();

    if let Some(path) = file {
        for (name, value) in read_file(path)? {
            raw.set(&name, value)
                .with_context(|| format!("in parameter file {}", path.display()))?;
        }
    }

    for (name, value) in overrides {
        let parsed = value
            .trim()
            .parse::<f64>()
            .map_err(|_| InvalidParameterError::Unparsable {
                name: name.clone(),
                value: value.clone(),
            })?;
        raw.set(name, parsed)?;
    }

    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use tempfile::NamedTempFile;

    fn file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_overrides() {
        assert_eq!(
            parse_override("R_max=12.5"),
            Ok(("R_max".to_owned(), "12.5".to_owned()))
        );
        assert!(parse_override("R_max").is_err());
        assert!(parse_override("=1").is_err());
    }

    #[test]
    fn overrides_win_over_file_over_defaults() {
        let toml = file(".toml", "P_max = 4000\nR_max = 8.0\n\"β\" = 4.0\n");
        let overrides = vec![("R_max".to_owned(), "6".to_owned())];

        let raw = resolve(Some(toml.path()), &overrides).unwrap();

        assert_eq!(raw.power_max, 4000.0);
        assert_eq!(raw.max_heating_rate, 6.0);
        assert_eq!(raw.beta, 4.0);
        assert_eq!(raw.power_min, RawParameters::default().power_min);
    }

    #[test]
    fn reads_json_by_extension() {
        let json = file(".json", r#"{ "T_target": 750, "d0": 0.2 }"#);

        let raw = resolve(Some(json.path()), &[]).unwrap();

        assert_eq!(raw.target_temperature, 750.0);
        assert_eq!(raw.reference_thickness, 0.2);
    }

    #[test]
    fn rejects_unknown_names_and_bad_values() {
        let toml = file(".toml", "gamma = 1.0\n");
        let error = resolve(Some(toml.path()), &[]).unwrap_err();
        assert!(format!("{error:#}").contains("unknown parameter `gamma`"));

        let overrides = vec![("m".to_owned(), "heavy".to_owned())];
        let error = resolve(None, &overrides).unwrap_err();
        assert!(error.to_string().contains("unparsable value `heavy`"));
    }
}
