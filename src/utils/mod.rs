pub mod manager_cache;
pub mod manager_filter;
