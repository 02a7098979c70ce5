use std::collections::HashMap;

pub const UNSORTED_BUNDLE: &str = "99_unsorted.json";

/// Filename → bundle table with lowercased keys.
#[derive(Debug, Clone, Default)]
pub struct BundleMap {
    by_name: HashMap<String, String>,
}

impl BundleMap {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        BundleMap {
            by_name: entries
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Directory-independent: only the bare filename is looked up.
pub fn find_bundle<'a>(filename: &str, map: &'a BundleMap) -> &'a str {
    map.by_name
        .get(&filename.to_lowercase())
        .map(String::as_str)
        .unwrap_or(UNSORTED_BUNDLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let map = BundleMap::new([("Main.py", "01_main.json"), ("readme.md", "30_docs.json")]);
        assert_eq!(find_bundle("main.py", &map), "01_main.json");
        assert_eq!(find_bundle("MAIN.PY", &map), "01_main.json");
        assert_eq!(find_bundle("README.md", &map), "30_docs.json");
    }

    #[test]
    fn unknown_names_fall_back_to_unsorted() {
        let map = BundleMap::new([("main.py", "01_main.json")]);
        assert_eq!(find_bundle("random_util.py", &map), UNSORTED_BUNDLE);
        assert_eq!(find_bundle("", &map), UNSORTED_BUNDLE);
        assert_eq!(find_bundle("x", &BundleMap::default()), UNSORTED_BUNDLE);
    }
}
