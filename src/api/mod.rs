pub mod employee;
pub mod ledger;
pub mod organization;
pub mod pay_item;
pub mod position;
pub mod standard;
