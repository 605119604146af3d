use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

/// Licenses recognised in README text. Longer and more specific names come
/// first so that e.g. "BSD-3-Clause-Clear" wins over "BSD-3-Clause".
const KNOWN_LICENSES: &[&str] = &[
    "GNU Affero General Public License v3.0",
    "GNU Lesser General Public License v2.1",
    "GNU Lesser General Public License v3.0",
    "GNU General Public License v2.0",
    "GNU General Public License v3.0",
    "Apache License 2.0",
    "MIT License",
    "BSD 3-clause Clear License",
    "BSD 3-clause New or Revised License",
    "BSD 2-clause Simplified License",
    "BSD Zero Clause License",
    "Boost Software License 1.0",
    "Mozilla Public License 2.0",
    "Eclipse Public License 2.0",
    "Eclipse Public License 1.0",
    "Creative Commons Zero v1.0 Universal",
    "The Unlicense",
    "ISC License",
    "zLib License",
    "AGPL-3.0",
    "LGPL-2.1",
    "LGPL-3.0",
    "GPL-2.0",
    "GPL-3.0",
    "Apache-2.0",
    "BSD-3-Clause-Clear",
    "BSD-3-Clause",
    "BSD-2-Clause",
    "0BSD",
    "BSL-1.0",
    "MPL-2.0",
    "EPL-2.0",
    "EPL-1.0",
    "CC0-1.0",
    "Unlicense",
    "ISC",
    "MIT",
];

fn patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        KNOWN_LICENSES
            .iter()
            .filter_map(|name| {
                let pattern = format!(r"\b{}\b", regex::escape(name));
                RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .ok()
                    .map(|re| (re, *name))
            })
            .collect()
    })
}

/// First known license mentioned in `text`, in table order.
pub fn detect_license(text: &str) -> Option<&'static str> {
    patterns()
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_detected() {
        assert_eq!(detect_license("Released under the MIT License."), Some("MIT License"));
    }

    #[test]
    fn test_case_insensitive_spdx() {
        assert_eq!(detect_license("## License\napache-2.0"), Some("Apache-2.0"));
    }

    #[test]
    fn test_specific_before_general() {
        assert_eq!(detect_license("Licensed BSD-3-Clause-Clear"), Some("BSD-3-Clause-Clear"));
        assert_eq!(detect_license("This is LGPL-2.1 software"), Some("LGPL-2.1"));
    }

    #[test]
    fn test_no_partial_word_match() {
        assert_eq!(detect_license("Submitted by a vomitting admin"), None);
        assert_eq!(detect_license("nothing here"), None);
    }
}
