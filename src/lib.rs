// Fraud analytics dashboard core: record loading, chart aggregation, table
// filtering, CSV export and the boundary to the remote prediction service.
pub mod aggregator;
pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod notify;
pub mod record;
pub mod view;


pub use aggregator::{
    compute_amount_range_breakdown, compute_fraud_distribution, compute_sequential_breakdown,
    compute_type_breakdown, ChartSet,
};
pub use filter::{apply_filters, FraudFilter, TableWindow};
pub use record::{FieldValue, Transaction};
pub use view::{DashboardView, LoadOutcome};
