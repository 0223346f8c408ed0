pub mod calculator;
pub mod entities;
pub mod slug;
pub mod use_cases;
