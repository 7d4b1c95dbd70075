use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Deserialize YAML with the offending key path in error messages.
pub fn from_yaml_with_path<T: DeserializeOwned>(src: &str) -> Result<T> {
    let de = serde_yaml::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        Error::Config(format!("at `{path}` → {}", err.into_inner()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Outer {
        items: Vec<Inner>,
    }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Inner {
        limit: u32,
    }

    #[test]
    fn error_names_the_nested_key() {
        let err = from_yaml_with_path::<Outer>("items:\n  - limit: 1\n  - limit: lots\n").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("items[1].limit"), "{text}");
    }
}
