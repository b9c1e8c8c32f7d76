pub mod aggregator;
pub mod comparator;
pub mod ledger;

pub use aggregator::{compute_max_values, has_valid_data, MaxValues};
pub use comparator::{beaten_records, candidates, metrics_for, HistoricalRecords};
pub use ledger::{ReconcileOutcome, SessionPrLedger};
