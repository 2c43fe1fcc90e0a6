pub mod tables;

pub use tables::{
    extract_suppliers, filter_indian_manufacturers, has_m_or_cm, infer_columns,
    locate_candidate_table,
};
