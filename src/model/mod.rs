pub mod booking;
pub mod employee;
