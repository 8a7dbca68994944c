pub mod add;
pub mod browse;
pub mod calendar;
pub mod gate;
pub mod report;
