pub mod day_schedule;
pub mod forecast;
pub mod remaining;
pub mod symbol;
