pub mod catalog;
pub mod hierarchy;
pub mod ledger;
pub mod org_tree;
pub mod standard;

#[cfg(test)]
pub mod testing;
