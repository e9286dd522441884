pub mod selector;

pub use selector::{
    calculate_dividend_selection, select_dividend, select_dividend_detailed, select_for_snapshot,
    DividendSelection, DividendSelectionInput, DividendSelectionReport, RejectedCandidate,
};
