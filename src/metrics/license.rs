use tracing::{debug, info};

use crate::repo_details::RepoDetails;

/// Compatibility with an LGPL-2.1-licensed consumer, by SPDX code and full name.
const LICENSE_SCORES: &[(&str, f64)] = &[
    ("AFL-3.0", 0.0),
    ("Academic Free License v3.0", 0.0),
    ("Apache-2.0", 0.5),
    ("Apache License 2.0", 0.5),
    ("Artistic-2.0", 1.0),
    ("Artistic License 2.0", 1.0),
    ("BSL-1.0", 1.0),
    ("Boost Software License 1.0", 1.0),
    ("BSD-2-Clause", 1.0),
    ("BSD 2-clause Simplified License", 1.0),
    ("BSD-3-Clause", 1.0),
    ("BSD 3-clause New or Revised License", 1.0),
    ("BSD-3-Clause-Clear", 1.0),
    ("BSD 3-clause Clear License", 1.0),
    ("BSD-4-Clause", 0.0),
    ("BSD 4-clause Original or Old License", 0.0),
    ("0BSD", 1.0),
    ("BSD Zero Clause License", 1.0),
    ("CC", 0.0),
    ("Creative Commons License Family", 0.0),
    ("CC0-1.0", 0.0),
    ("Creative Commons Zero v1.0 Universal", 0.0),
    ("CC-BY-4.0", 0.0),
    ("Creative Commons Attribution 4.0", 0.0),
    ("CC-BY-SA-4.0", 0.0),
    ("Creative Commons Attribution ShareAlike 4.0", 0.0),
    ("WTFPL", 0.5),
    ("Do What The F*ck You Want To Public License", 0.5),
    ("ECL-2.0", 0.0),
    ("Educational Community License v2.0", 0.0),
    ("EPL-1.0", 0.0),
    ("Eclipse Public License 1.0", 0.0),
    ("EPL-2.0", 0.0),
    ("Eclipse Public License 2.0", 0.0),
    ("EUPL-1.1", 0.0),
    ("European Union Public License 1.1", 0.0),
    ("AGPL-3.0", 0.0),
    ("GNU Affero General Public License v3.0", 0.0),
    ("GPL", 0.0),
    ("GPL-2.0", 0.0),
    ("GPL-3.0", 0.0),
    ("GNU General Public License family", 0.0),
    ("GNU General Public License v2.0", 0.0),
    ("GNU General Public License v3.0", 0.0),
    ("LGPL", 0.0),
    ("LGPL-2.1", 1.0),
    ("LGPL-3.0", 0.0),
    ("GNU Lesser General Public License family", 0.0),
    ("GNU Lesser General Public License v2.1", 1.0),
    ("GNU Lesser General Public License v3.0", 0.0),
    ("ISC", 1.0),
    ("ISC License", 1.0),
    ("LPPL-1.3c", 0.0),
    ("LaTeX Project Public License v1.3c", 0.0),
    ("MS-PL", 0.0),
    ("Microsoft Public License", 0.0),
    ("MIT", 1.0),
    ("MIT License", 1.0),
    ("MPL-2.0", 0.0),
    ("Mozilla Public License 2.0", 0.0),
    ("OSL-3.0", 0.0),
    ("Open Software License 3.0", 0.0),
    ("PostgreSQL", 1.0),
    ("PostgreSQL License", 1.0),
    ("OFL-1.1", 0.0),
    ("SIL Open Font License 1.1", 0.0),
    ("NCSA", 1.0),
    ("University of Illinois/NCSA Open Source License", 1.0),
    ("Unlicense", 1.0),
    ("The Unlicense", 1.0),
    ("Zlib", 1.0),
    ("zLib License", 1.0),
];

/// Exact, case-sensitive lookup; `None` for licenses not in the table.
pub fn license_score(license: &str) -> Option<f64> {
    LICENSE_SCORES
        .iter()
        .find(|(name, _)| *name == license)
        .map(|(_, score)| *score)
}

pub fn calculate_license_compatibility(details: &RepoDetails) -> f64 {
    info!("Calculating license compatibility for {}/{}", details.owner, details.repo);
    match license_score(&details.license) {
        Some(score) => score,
        None => {
            debug!("License {:?} is not in the compatibility table", details.license);
            0.0
        }
    }
}
