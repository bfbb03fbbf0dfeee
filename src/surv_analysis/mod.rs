pub mod interval;
pub mod kaplan_meier;
pub mod observation;
