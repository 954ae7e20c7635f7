//! Combine the federal and state rosters into one result
//!
//! Federal entries come first. Every state office index is shifted by the
//! number of federal officials so indices stay valid in the combined list.

use crate::models::{ResolutionResult, Roster};

pub fn merge(federal: Roster, state: Roster, normalized_address: Option<String>) -> ResolutionResult {
    let offset = federal.officials.len();

    let mut officials = federal.officials;
    officials.extend(state.officials);

    let mut offices = federal.offices;
    offices.extend(state.offices.into_iter().map(|mut office| {
        for index in office.official_indices.iter_mut() {
            *index += offset;
        }
        office
    }));

    ResolutionResult {
        officials,
        offices,
        normalized_address,
    }
}
