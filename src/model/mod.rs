pub mod employee;
pub mod organization;
pub mod pay_item;
pub mod payment_line;
pub mod position;
pub mod review_state;
pub mod role;
pub mod standard;
